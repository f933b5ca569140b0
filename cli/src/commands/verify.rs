use anyhow::{anyhow, Context, Result};
use log::info;
use vmprov_client::{
    provision::Plan,
    verify::{all_passed, verify},
    Client,
};

use crate::printer::Printer;

pub fn run(client: &Client, plan: &Plan, printer: &Printer) -> Result<()> {
    let checks = verify(client, plan).context("Could not read back the provisioned resources.")?;
    printer.print_resources(&checks)?;

    if all_passed(&checks) {
        info!("All {} checks passed", checks.len());
        Ok(())
    } else {
        let failed = checks.iter().filter(|check| !check.passed).count();
        Err(anyhow!("{} of {} checks failed.", failed, checks.len()))
    }
}
