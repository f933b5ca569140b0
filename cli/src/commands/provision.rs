use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use prettytable::{row, Row};
use serde::Serialize;
use vmprov_client::{
    provision::{provision, Plan, Provisioned, Step},
    Client, ProvisioningState, ResourceId,
};

use crate::{
    printer::{DisplayTable, Printer},
    progress::StepProgress,
};

/// One created resource, as reported by Azure.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSummary {
    pub step: Step,
    pub name: String,
    pub provisioning_state: Option<ProvisioningState>,
    pub id: ResourceId,
    /// The most useful property of the resource, if any (address, size...).
    pub detail: Option<String>,
}

impl DisplayTable for ResourceSummary {
    fn to_table_headers() -> Row {
        row![bFg => "Kind", "Name", "State", "Detail", "Resource ID"]
    }

    fn to_table_row(&self) -> Row {
        row![
            self.step,
            self.name,
            match &self.provisioning_state {
                Some(state) => state.to_string().normal(),
                None => "unknown".dimmed(),
            },
            match &self.detail {
                Some(detail) => detail.as_str().normal(),
                None => "-".dimmed(),
            },
            self.id
        ]
    }
}

pub fn summarise(provisioned: &Provisioned) -> Vec<ResourceSummary> {
    provisioned
        .resources()
        .into_iter()
        .map(|(step, resource)| {
            let detail = match step {
                Step::ResourceGroup => Some(provisioned.resource_group.location.clone()),
                Step::VirtualNetwork => {
                    Some(provisioned.virtual_network.address_prefixes().join(", "))
                        .filter(|prefixes| !prefixes.is_empty())
                }
                Step::Subnet => provisioned.subnet.address_prefix().map(str::to_owned),
                Step::PublicIpAddress => provisioned
                    .public_ip_address
                    .ip_address()
                    .map(str::to_owned),
                Step::NetworkInterface => provisioned
                    .network_interface
                    .private_ip_address()
                    .map(str::to_owned),
                Step::VirtualMachine => provisioned.virtual_machine.vm_size().map(str::to_owned),
            };
            ResourceSummary {
                step,
                name: resource.name().to_owned(),
                provisioning_state: resource.provisioning_state().cloned(),
                id: resource.id().clone(),
                detail,
            }
        })
        .collect()
}

pub fn run(client: &Client, plan: &Plan, printer: &Printer) -> Result<()> {
    info!(
        "Provisioning into subscription {} at {}",
        client.subscription_id(),
        client.base_url()
    );
    let progress = StepProgress::new();
    let provisioned = provision(client, plan, &progress).context("Provisioning failed.")?;
    drop(progress);

    printer.print_resources(&summarise(&provisioned))
}
