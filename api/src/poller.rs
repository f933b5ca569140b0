//! Waiting on ARM long-running operations.
//!
//! A create-or-update call on most network and compute resources returns before the resource is
//! ready. The initial response tells the client how to track the operation:
//!
//! - an `Azure-AsyncOperation` header pointing at an operation status resource,
//! - a `Location` header on a `202 Accepted` response, polled until it stops returning 202,
//! - or neither, in which case the resource's own `provisioningState` is polled.
//!
//! Once the operation succeeds the resource is read back with a final GET.
use http::{
    header::{HeaderName, LOCATION},
    StatusCode,
};
use log::debug;
use reqwest::blocking::Response;
use serde::Deserialize;
use std::{marker::PhantomData, thread, time::Duration};
use url::Url;

use crate::{
    error::{Error, Result},
    resources::{AsyncOperationStatus, ErrorDetail, ProvisioningState, ProvisioningStateEnvelope},
    retry::retry_after,
    Client,
};

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";

#[derive(Debug, Clone, PartialEq, Eq)]
enum PollingMethod {
    AsyncOperation(Url),
    Location(Url),
    ProvisioningState,
    Finished(ProvisioningState),
}

/// Handle on an in-flight create-or-update operation.
///
/// Nothing is polled until [`Poller::wait`] is called, which blocks the calling thread until the
/// operation reaches a terminal state.
#[must_use = "the operation is only awaited by calling `wait`"]
#[derive(Debug)]
pub struct Poller<'client, ResourceT> {
    client: &'client Client,
    resource_url: Url,
    method: PollingMethod,
    retry_after: Option<Duration>,
    _resource: PhantomData<ResourceT>,
}

impl<'client, ResourceT> Poller<'client, ResourceT>
where
    for<'de> ResourceT: Deserialize<'de>,
{
    pub(crate) fn from_initial_response(
        client: &'client Client,
        resource_url: Url,
        response: Response,
    ) -> Result<Self> {
        let status = response.status();
        let retry_after = retry_after(&response);
        let async_operation = header_url(&response, HeaderName::from_static(AZURE_ASYNC_OPERATION))?;
        let location = header_url(&response, LOCATION)?;

        let body = response.text().map_err(|source| Error::ReqwestError {
            source,
            message: "Could not read the initial operation response.".to_owned(),
        })?;
        let initial_state = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<ProvisioningStateEnvelope>(&body)
                .ok()
                .and_then(ProvisioningStateEnvelope::into_state)
        };

        let method = match (async_operation, location) {
            (Some(url), _) => PollingMethod::AsyncOperation(url),
            (None, Some(url)) if status == StatusCode::ACCEPTED => PollingMethod::Location(url),
            _ => match initial_state {
                Some(state) if state.is_terminal() => PollingMethod::Finished(state),
                Some(_) => PollingMethod::ProvisioningState,
                // No state and nothing to poll means the resource was created synchronously.
                None => PollingMethod::Finished(ProvisioningState::Succeeded),
            },
        };
        debug!("Tracking operation on `{}` with {:?}", resource_url, method);

        Ok(Self {
            client,
            resource_url,
            method,
            retry_after,
            _resource: PhantomData,
        })
    }

    /// The resource being created or updated.
    pub fn resource_url(&self) -> &Url {
        &self.resource_url
    }

    /// Block until the operation is finished and return the resulting resource.
    pub fn wait(self) -> Result<ResourceT> {
        let mut delay = self.retry_after;
        match &self.method {
            PollingMethod::AsyncOperation(status_url) => loop {
                self.sleep(delay);
                let response = self.client.get_response(status_url.clone())?;
                delay = retry_after(&response);
                let operation = response
                    .json::<AsyncOperationStatus>()
                    .map_err(Error::BadJsonResponse)?;
                debug!("Operation on `{}` is {}", self.resource_url, operation.status);
                match operation.status {
                    ProvisioningState::Succeeded => break,
                    status if status.is_terminal() => {
                        return Err(self.failed(status, operation.error.unwrap_or_default()))
                    }
                    _ => {}
                }
            },
            PollingMethod::Location(location_url) => loop {
                self.sleep(delay);
                let response = self.client.get_response(location_url.clone())?;
                delay = retry_after(&response);
                debug!("Operation on `{}` returned {}", self.resource_url, response.status());
                if response.status() != StatusCode::ACCEPTED {
                    break;
                }
            },
            PollingMethod::ProvisioningState => loop {
                self.sleep(delay);
                let response = self.client.get_response(self.resource_url.clone())?;
                delay = retry_after(&response);
                let state = response
                    .json::<ProvisioningStateEnvelope>()
                    .map_err(Error::BadJsonResponse)?
                    .into_state();
                debug!("Resource `{}` is {:?}", self.resource_url, state);
                match state {
                    None | Some(ProvisioningState::Succeeded) => break,
                    Some(state) if state.is_terminal() => {
                        return Err(self.failed(state, ErrorDetail::default()))
                    }
                    Some(_) => {}
                }
            },
            PollingMethod::Finished(ProvisioningState::Succeeded) => {}
            PollingMethod::Finished(state) => {
                return Err(self.failed(state.clone(), ErrorDetail::default()))
            }
        }

        self.client.get(self.resource_url.clone())
    }

    fn sleep(&self, retry_after: Option<Duration>) {
        let duration = retry_after.unwrap_or_else(|| self.client.poll_interval());
        if !duration.is_zero() {
            debug!("Waiting {:?} before polling `{}`", duration, self.resource_url);
            thread::sleep(duration);
        }
    }

    fn failed(&self, status: ProvisioningState, error: ErrorDetail) -> Error {
        Error::OperationFailed {
            resource: self.resource_url.path().to_owned(),
            status,
            code: error.code.unwrap_or_default(),
            message: error.message.unwrap_or_default(),
        }
    }
}

fn header_url(response: &Response, header: HeaderName) -> Result<Option<Url>> {
    let Some(value) = response.headers().get(&header) else {
        return Ok(None);
    };
    let bad_header = || Error::BadResponseHeader {
        header: header.to_string(),
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    };
    let value = value.to_str().map_err(|_| bad_header())?;
    Url::parse(value).map(Some).map_err(|_| bad_header())
}
