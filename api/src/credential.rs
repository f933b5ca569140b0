//! Access tokens for the management API.
//!
//! Authentication is delegated to a logged in Azure CLI session (`az login`): the CLI is asked
//! for a token scoped to the management endpoint and the token is sent as a bearer token.
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use log::debug;
use serde::Deserialize;
use std::{ffi::OsString, process::Command};
use url::Url;

use crate::error::{Error, Result};

/// A bearer token and, when known, its expiry time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

pub trait TokenCredential {
    /// Get a token valid for `scope`, e.g. `https://management.azure.com/.default`.
    fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// The `.default` scope of a management endpoint.
pub fn scope_for_endpoint(endpoint: &Url) -> String {
    format!("{}/.default", endpoint.origin().ascii_serialization())
}

/// Gets tokens from the Azure CLI.
#[derive(Clone, Debug)]
pub struct AzureCliCredential {
    program: OsString,
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self {
            program: OsString::from(if cfg!(windows) { "az.cmd" } else { "az" }),
        }
    }
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `az` executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl TokenCredential for AzureCliCredential {
    fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let resource = scope.strip_suffix("/.default").unwrap_or(scope);
        debug!("Requesting a token for `{}` from the Azure CLI", resource);

        let output = Command::new(&self.program)
            .args([
                "account",
                "get-access-token",
                "--output",
                "json",
                "--resource",
                resource,
            ])
            .output()
            .map_err(|error| Error::Credential {
                message: format!(
                    "could not run `{}` ({error}); is the Azure CLI installed?",
                    self.program.to_string_lossy()
                ),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Credential {
                message: format!(
                    "`az account get-access-token` failed ({}): {}; run `az login` first",
                    output.status,
                    stderr.trim()
                ),
            });
        }

        parse_cli_token(&String::from_utf8_lossy(&output.stdout))
    }
}

/// A token that was obtained out of band.
#[derive(Clone, Debug)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenCredential for StaticTokenCredential {
    fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: None,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenResponse {
    access_token: String,
    // Local time without an offset, e.g. "2026-10-16 14:32:11.000000".
    #[serde(default)]
    expires_on: Option<String>,
    // Unix timestamp; only printed by newer versions of the CLI.
    #[serde(default, rename = "expires_on")]
    expires_on_timestamp: Option<i64>,
}

fn parse_cli_token(output: &str) -> Result<AccessToken> {
    let response: CliTokenResponse =
        serde_json::from_str(output).map_err(|error| Error::Credential {
            message: format!("unexpected output from `az account get-access-token`: {error}"),
        })?;

    let expires_on = match (response.expires_on_timestamp, &response.expires_on) {
        (Some(timestamp), _) => Utc.timestamp_opt(timestamp, 0).single(),
        (None, Some(local)) => NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S%.f")
            .ok()
            .and_then(|naive| Local.from_local_datetime(&naive).single())
            .map(|local| local.with_timezone(&Utc)),
        (None, None) => None,
    };

    Ok(AccessToken {
        token: response.access_token,
        expires_on,
    })
}
