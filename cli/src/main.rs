#![deny(clippy::all)]
mod args;
mod commands;
mod config;
mod printer;
mod progress;
mod utils;

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, error, warn};
use std::{env, io, path::PathBuf, process, time::Duration};
use structopt::{clap::Shell as ClapShell, StructOpt};
use vmprov_client::{
    credential::scope_for_endpoint,
    provision::{Plan, DEFAULT_SUBSCRIPTION_ID},
    AzureCliCredential, Client, Config, StaticTokenCredential, SubscriptionId, Token,
    TokenCredential, DEFAULT_ENDPOINT, DEFAULT_POLL_INTERVAL,
};

use crate::{
    args::{Args, Command, Shell},
    commands::{plan, provision, verify},
    config::VmprovConfig,
    printer::Printer,
    utils::init_env_logger,
};

const SUBSCRIPTION_ENV_VARIABLE_NAME: &str = "AZURE_SUBSCRIPTION_ID";
const TOKEN_ENV_VARIABLE_NAME: &str = "AZURE_ACCESS_TOKEN";

fn run(args: Args) -> Result<()> {
    let config_path = find_configuration(&args)?;
    let cli_config = config::read_vmprov_config(&config_path)?;
    let printer = Printer::new(args.output);
    let plan = Plan::default();

    match &args.command {
        Command::Completion { shell } => {
            let mut app = Args::clap();
            let clap_shell = match shell {
                Shell::Zsh => ClapShell::Zsh,
                Shell::Bash => ClapShell::Bash,
            };
            app.gen_completions_to("vmprov", clap_shell, &mut io::stdout());
            Ok(())
        }
        Command::Plan => plan::run(
            &plan,
            &subscription_from_args(&args, &cli_config),
            &printer,
        ),
        Command::Provision => {
            provision::run(&client_from_args(&args, &cli_config)?, &plan, &printer)
        }
        Command::Verify => verify::run(&client_from_args(&args, &cli_config)?, &plan, &printer),
    }
}

fn subscription_from_args(args: &Args, config: &VmprovConfig) -> SubscriptionId {
    SubscriptionId(
        args.subscription
            .clone()
            .or_else(|| {
                env::var(SUBSCRIPTION_ENV_VARIABLE_NAME)
                    .ok()
                    .filter(|subscription| !subscription.is_empty())
            })
            .or_else(|| config.subscription_id.clone())
            .unwrap_or_else(|| DEFAULT_SUBSCRIPTION_ID.to_owned()),
    )
}

fn client_from_args(args: &Args, config: &VmprovConfig) -> Result<Client> {
    let endpoint = args
        .endpoint
        .clone()
        .or_else(|| config.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.clone());

    let subscription_id = subscription_from_args(args, config);
    debug!("Using subscription {}", subscription_id);

    let scope = scope_for_endpoint(&endpoint);
    let token = match args
        .token
        .clone()
        .or_else(|| env::var(TOKEN_ENV_VARIABLE_NAME).ok())
    {
        Some(token) => StaticTokenCredential::new(token).get_token(&scope)?,
        None => AzureCliCredential::new()
            .get_token(&scope)
            .context("Could not get an access token from the Azure CLI.")?,
    };
    if let Some(expires_on) = token.expires_on {
        debug!(
            "Access token expires at {}",
            expires_on.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
    }

    let accept_invalid_certificates = args
        .accept_invalid_certificates
        .or(config.accept_invalid_certificates)
        .unwrap_or(false);

    if accept_invalid_certificates {
        warn!(concat!(
            "TLS certificate verification is disabled. ",
            "Do NOT use this over an insecure network."
        ));
    }

    let poll_interval = args
        .poll_interval
        .or(config.poll_interval_seconds)
        .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs);

    Client::new(Config {
        endpoint,
        token: Token(token.token),
        subscription_id,
        accept_invalid_certificates,
        proxy: args.proxy.clone().or_else(|| config.proxy.clone()),
        retry_config: Some(config.retry_config()?),
        poll_interval,
    })
    .context("Failed to initialise the HTTP client.")
}

fn find_configuration(args: &Args) -> Result<PathBuf> {
    let config_path = if let Some(config_path) = args.config.clone() {
        if !config_path.exists() {
            warn!(
                "Configuration file `{}` doesn't exist.",
                config_path.display()
            );
        }
        config_path
    } else {
        let mut config_path =
            dirs::config_dir().context("Could not get path to the user's config directory")?;
        config_path.push("vmprov");
        config_path.push("config.json");
        config_path
    };
    Ok(config_path)
}

fn main() {
    let args = Args::from_args();
    init_env_logger(args.verbose);

    if let Err(error) = run(args) {
        error!("An error occurred:");
        for cause in error.chain() {
            error!(" |- {cause}");
        }

        #[cfg(feature = "backtrace")]
        {
            error!("{}", error.backtrace());
        }

        process::exit(1);
    }
}
