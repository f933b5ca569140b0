use reqwest::StatusCode;
use url::Url;

use crate::resources::ProvisioningState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API request failed with {}: {} {}", status_code, code, message)]
    Api {
        status_code: StatusCode,
        code: String,
        message: String,
    },

    #[error(
        "Operation on `{}` finished in state {}: {} {}",
        resource,
        status,
        code,
        message
    )]
    OperationFailed {
        resource: String,
        status: ProvisioningState,
        code: String,
        message: String,
    },

    #[error("Could not acquire an access token: {}", message)]
    Credential { message: String },

    #[error("Expected /subscriptions/<id>/resourceGroups/<name>/..., got: {}", identifier)]
    BadResourceId { identifier: String },

    #[error("Invalid endpoint `{}`", endpoint)]
    BadEndpoint { endpoint: Url },

    #[error("Bad token ({} characters): not a valid header value", length)]
    BadToken { length: usize },

    #[error("Could not parse JSON response.")]
    BadJsonResponse(#[source] reqwest::Error),

    #[error("Could not parse `{}` response header: {}", header, value)]
    BadResponseHeader { header: String, value: String },

    #[error("Failed to initialise the HTTP client")]
    BuildHttpClient(#[source] reqwest::Error),

    #[error("HTTP request error: {}", message)]
    ReqwestError {
        message: String,
        source: reqwest::Error,
    },
}

impl Error {
    /// Whether this is an API error reporting that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Api { status_code, .. } if *status_code == StatusCode::NOT_FOUND
        )
    }
}
