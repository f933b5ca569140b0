use anyhow::{anyhow, Error, Result};
use std::{path::PathBuf, str::FromStr};
use structopt::StructOpt;
use url::Url;

use crate::printer::OutputFormat;

/// vmprov provisions a Linux virtual machine, together with the network it needs, on Azure.
#[derive(Debug, StructOpt)]
#[structopt(
    global_settings = &[
        structopt::clap::AppSettings::ColoredHelp,
        structopt::clap::AppSettings::InferSubcommands,
    ]
)]
pub struct Args {
    #[structopt(long = "config-file", parse(from_os_str))]
    /// Path to the configuration file. Typically defaults to ~/.config/vmprov/config.json on
    /// Linux.
    pub config: Option<PathBuf>,

    #[structopt(short = "v", long = "verbose")]
    /// Enable more verbose logging.
    pub verbose: bool,

    #[structopt(long = "endpoint", parse(try_from_str))]
    /// Azure Resource Manager endpoint to use. Overrides the one from the configuration file,
    /// if any.
    pub endpoint: Option<Url>,

    #[structopt(long = "subscription")]
    /// Subscription to provision into. Defaults to $AZURE_SUBSCRIPTION_ID, then to the one
    /// from the configuration file.
    pub subscription: Option<String>,

    #[structopt(long = "token")]
    /// Access token to use instead of asking the Azure CLI for one.
    pub token: Option<String>,

    #[structopt(short = "k", long = "accept-invalid-certificates", parse(try_from_str))]
    /// Whether to accept invalid TLS certificates.
    pub accept_invalid_certificates: Option<bool>,

    #[structopt(long = "proxy", parse(try_from_str))]
    /// URL of an HTTP(S) proxy to use.
    pub proxy: Option<Url>,

    #[structopt(long = "poll-interval")]
    /// Seconds to wait between polls of a long running operation, unless Azure asks for a
    /// different delay.
    pub poll_interval: Option<u64>,

    #[structopt(short = "o", long = "output", default_value = "table")]
    /// Output format. One of: table, json
    pub output: OutputFormat,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(name = "completion")]
    /// Output shell completion code for the specified shell (bash or zsh)
    Completion { shell: Shell },

    #[structopt(name = "plan")]
    /// Show the resources that would be provisioned, without contacting Azure
    Plan,

    #[structopt(name = "provision")]
    /// Provision the resource group, network and virtual machine
    Provision,

    #[structopt(name = "verify")]
    /// Check that every provisioned resource exists and is wired up correctly
    Verify,
}

#[derive(Debug)]
pub enum Shell {
    Bash,
    Zsh,
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        match string {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            _ => Err(anyhow!("unknown shell: '{}'", string)),
        }
    }
}
