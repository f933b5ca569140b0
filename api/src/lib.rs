#![deny(clippy::all)]
mod error;
pub mod credential;
pub mod poller;
pub mod provision;
pub mod resources;
pub mod retry;
pub mod verify;

use http::Method;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::{
    blocking::{Client as HttpClient, Response as HttpResponse},
    header::{self, HeaderMap, HeaderValue},
    Proxy, Result as ReqwestResult,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::{
    resources::api_error_from_body,
    retry::{Retrier, RetryConfig},
};

pub use crate::{
    credential::{AccessToken, AzureCliCredential, StaticTokenCredential, TokenCredential},
    error::{Error, Result},
    poller::Poller,
    resources::{
        network_interface::{
            IpConfiguration, NetworkInterface, NewIpConfiguration, NewIpConfigurationProperties,
            NewNetworkInterface, NewNetworkInterfaceProperties, NewSubResource,
        },
        public_ip_address::{
            NewPublicIpAddress, NewPublicIpAddressProperties, NewSku, PublicIpAddress, Sku,
        },
        resource_group::{NewResourceGroup, ResourceGroup},
        subnet::{NewSubnet, NewSubnetProperties, Subnet},
        virtual_machine::{
            ImageReference, LinuxConfiguration, NewHardwareProfile, NewNetworkInterfaceReference,
            NewNetworkInterfaceReferenceProperties, NewNetworkProfile, NewOsProfile,
            NewStorageProfile, NewVirtualMachine, NewVirtualMachineProperties, SshConfiguration,
            SshPublicKey, VirtualMachine,
        },
        virtual_network::{
            AddressSpace, NewAddressSpace, NewVirtualNetwork, NewVirtualNetworkProperties,
            VirtualNetwork,
        },
        ArmResource, ProvisioningState, ResourceId, SubResource, SubscriptionId,
    },
    retry::RetryStrategy,
};

pub const RESOURCES_API_VERSION: &str = "2021-04-01";
pub const NETWORK_API_VERSION: &str = "2023-09-01";
pub const COMPUTE_API_VERSION: &str = "2023-09-01";

const NETWORK_PROVIDER: &str = "Microsoft.Network";
const COMPUTE_PROVIDER: &str = "Microsoft.Compute";

/// Interval between polls of a long running operation when the service doesn't suggest one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(pub String);

pub struct Config {
    pub endpoint: Url,
    pub token: Token,
    pub subscription_id: SubscriptionId,
    pub accept_invalid_certificates: bool,
    pub proxy: Option<Url>,
    /// Retry settings to use, if any. Every request made by the client is a GET or a PUT, both
    /// of which are idempotent in ARM, so retries apply to all of them.
    pub retry_config: Option<RetryConfig>,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.clone(),
            token: Token("".to_owned()),
            subscription_id: SubscriptionId("".to_owned()),
            accept_invalid_certificates: false,
            proxy: None,
            retry_config: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[derive(Debug)]
pub struct Client {
    endpoints: Endpoints,
    http_client: HttpClient,
    headers: HeaderMap,
    retrier: Option<Retrier>,
    poll_interval: Duration,
}

impl Client {
    /// Create a new API client.
    pub fn new(config: Config) -> Result<Client> {
        let http_client = build_http_client(&config)?;
        let headers = build_headers(&config)?;
        let endpoints = Endpoints::new(config.endpoint, config.subscription_id)?;
        let retrier = config.retry_config.map(Retrier::new);
        Ok(Client {
            endpoints,
            http_client,
            headers,
            retrier,
            poll_interval: config.poll_interval,
        })
    }

    /// Get the base url for the client
    pub fn base_url(&self) -> &Url {
        &self.endpoints.base
    }

    pub fn subscription_id(&self) -> &SubscriptionId {
        &self.endpoints.subscription_id
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Create or update a resource group. This completes synchronously.
    pub fn create_or_update_resource_group(
        &self,
        resource_group: &str,
        options: NewResourceGroup<'_>,
    ) -> Result<ResourceGroup> {
        self.put(self.endpoints.resource_group(resource_group)?, options)
    }

    pub fn get_resource_group(&self, resource_group: &str) -> Result<ResourceGroup> {
        self.get(self.endpoints.resource_group(resource_group)?)
    }

    /// Start creating or updating a virtual network.
    pub fn begin_create_or_update_virtual_network(
        &self,
        resource_group: &str,
        virtual_network: &str,
        options: NewVirtualNetwork<'_>,
    ) -> Result<Poller<'_, VirtualNetwork>> {
        self.begin_put(
            self.endpoints
                .virtual_network(resource_group, virtual_network)?,
            options,
        )
    }

    pub fn get_virtual_network(
        &self,
        resource_group: &str,
        virtual_network: &str,
    ) -> Result<VirtualNetwork> {
        self.get(
            self.endpoints
                .virtual_network(resource_group, virtual_network)?,
        )
    }

    /// Start creating or updating a subnet inside an existing virtual network.
    pub fn begin_create_or_update_subnet(
        &self,
        resource_group: &str,
        virtual_network: &str,
        subnet: &str,
        options: NewSubnet<'_>,
    ) -> Result<Poller<'_, Subnet>> {
        self.begin_put(
            self.endpoints
                .subnet(resource_group, virtual_network, subnet)?,
            options,
        )
    }

    pub fn get_subnet(
        &self,
        resource_group: &str,
        virtual_network: &str,
        subnet: &str,
    ) -> Result<Subnet> {
        self.get(
            self.endpoints
                .subnet(resource_group, virtual_network, subnet)?,
        )
    }

    /// Start creating or updating a public IP address.
    pub fn begin_create_or_update_public_ip_address(
        &self,
        resource_group: &str,
        public_ip_address: &str,
        options: NewPublicIpAddress<'_>,
    ) -> Result<Poller<'_, PublicIpAddress>> {
        self.begin_put(
            self.endpoints
                .public_ip_address(resource_group, public_ip_address)?,
            options,
        )
    }

    pub fn get_public_ip_address(
        &self,
        resource_group: &str,
        public_ip_address: &str,
    ) -> Result<PublicIpAddress> {
        self.get(
            self.endpoints
                .public_ip_address(resource_group, public_ip_address)?,
        )
    }

    /// Start creating or updating a network interface.
    pub fn begin_create_or_update_network_interface(
        &self,
        resource_group: &str,
        network_interface: &str,
        options: NewNetworkInterface<'_>,
    ) -> Result<Poller<'_, NetworkInterface>> {
        self.begin_put(
            self.endpoints
                .network_interface(resource_group, network_interface)?,
            options,
        )
    }

    pub fn get_network_interface(
        &self,
        resource_group: &str,
        network_interface: &str,
    ) -> Result<NetworkInterface> {
        self.get(
            self.endpoints
                .network_interface(resource_group, network_interface)?,
        )
    }

    /// Start creating or updating a virtual machine.
    pub fn begin_create_or_update_virtual_machine(
        &self,
        resource_group: &str,
        virtual_machine: &str,
        options: NewVirtualMachine<'_>,
    ) -> Result<Poller<'_, VirtualMachine>> {
        self.begin_put(
            self.endpoints
                .virtual_machine(resource_group, virtual_machine)?,
            options,
        )
    }

    pub fn get_virtual_machine(
        &self,
        resource_group: &str,
        virtual_machine: &str,
    ) -> Result<VirtualMachine> {
        self.get(
            self.endpoints
                .virtual_machine(resource_group, virtual_machine)?,
        )
    }

    pub(crate) fn get<SuccessT>(&self, url: Url) -> Result<SuccessT>
    where
        for<'de> SuccessT: Deserialize<'de>,
    {
        self.get_response(url)?
            .json::<SuccessT>()
            .map_err(Error::BadJsonResponse)
    }

    /// GET a url, failing on any non-success status.
    pub(crate) fn get_response(&self, url: Url) -> Result<HttpResponse> {
        debug!("Attempting GET `{}`", url);
        check_status(self.raw_request(&Method::GET, &url, &None::<()>)?)
    }

    fn put<RequestT, SuccessT>(&self, url: Url, request: RequestT) -> Result<SuccessT>
    where
        RequestT: Serialize,
        for<'de> SuccessT: Deserialize<'de>,
    {
        debug!("Attempting PUT `{}`", url);
        check_status(self.raw_request(&Method::PUT, &url, &Some(request))?)?
            .json::<SuccessT>()
            .map_err(Error::BadJsonResponse)
    }

    fn begin_put<RequestT, ResourceT>(
        &self,
        url: Url,
        request: RequestT,
    ) -> Result<Poller<'_, ResourceT>>
    where
        RequestT: Serialize,
        for<'de> ResourceT: Deserialize<'de>,
    {
        debug!("Attempting PUT `{}`", url);
        let response = check_status(self.raw_request(&Method::PUT, &url, &Some(request))?)?;
        Poller::from_initial_response(self, url, response)
    }

    fn raw_request<RequestT>(
        &self,
        method: &Method,
        url: &Url,
        body: &Option<RequestT>,
    ) -> Result<HttpResponse>
    where
        RequestT: Serialize,
    {
        let do_request = || {
            let request = self
                .http_client
                .request(method.clone(), url.clone())
                .headers(self.headers.clone());
            let request = match &body {
                Some(body) => request.json(body),
                None => request,
            };
            request.send()
        };

        self.with_retries(do_request)
            .map_err(|source| Error::ReqwestError {
                source,
                message: format!("{method} operation failed."),
            })
    }

    fn with_retries(
        &self,
        send_request: impl Fn() -> ReqwestResult<HttpResponse>,
    ) -> ReqwestResult<HttpResponse> {
        match &self.retrier {
            Some(retrier) => retrier.with_retries(send_request),
            None => send_request(),
        }
    }
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().unwrap_or_default();
        Err(api_error_from_body(status, &body))
    }
}

#[derive(Debug)]
struct Endpoints {
    base: Url,
    subscription_id: SubscriptionId,
}

fn construct_endpoint(base: &Url, segments: &[&str], api_version: &str) -> Result<Url> {
    let mut endpoint = base.clone();

    let mut endpoint_segments = endpoint
        .path_segments_mut()
        .map_err(|_| Error::BadEndpoint {
            endpoint: base.clone(),
        })?;

    endpoint_segments.pop_if_empty();
    for segment in segments {
        endpoint_segments.push(segment);
    }

    drop(endpoint_segments);

    endpoint
        .query_pairs_mut()
        .append_pair("api-version", api_version);

    Ok(endpoint)
}

impl Endpoints {
    pub fn new(base: Url, subscription_id: SubscriptionId) -> Result<Self> {
        if base.cannot_be_a_base() {
            return Err(Error::BadEndpoint { endpoint: base });
        }
        Ok(Endpoints {
            base,
            subscription_id,
        })
    }

    fn resource_group(&self, resource_group: &str) -> Result<Url> {
        construct_endpoint(
            &self.base,
            &[
                "subscriptions",
                self.subscription_id.0.as_str(),
                "resourceGroups",
                resource_group,
            ],
            RESOURCES_API_VERSION,
        )
    }

    fn provider_resource(
        &self,
        resource_group: &str,
        provider: &str,
        types: &[&str],
        api_version: &str,
    ) -> Result<Url> {
        let mut segments: Vec<&str> = vec![
            "subscriptions",
            self.subscription_id.0.as_str(),
            "resourceGroups",
            resource_group,
            "providers",
            provider,
        ];
        segments.extend_from_slice(types);
        construct_endpoint(&self.base, &segments, api_version)
    }

    fn virtual_network(&self, resource_group: &str, virtual_network: &str) -> Result<Url> {
        self.provider_resource(
            resource_group,
            NETWORK_PROVIDER,
            &["virtualNetworks", virtual_network],
            NETWORK_API_VERSION,
        )
    }

    fn subnet(&self, resource_group: &str, virtual_network: &str, subnet: &str) -> Result<Url> {
        self.provider_resource(
            resource_group,
            NETWORK_PROVIDER,
            &["virtualNetworks", virtual_network, "subnets", subnet],
            NETWORK_API_VERSION,
        )
    }

    fn public_ip_address(&self, resource_group: &str, public_ip_address: &str) -> Result<Url> {
        self.provider_resource(
            resource_group,
            NETWORK_PROVIDER,
            &["publicIPAddresses", public_ip_address],
            NETWORK_API_VERSION,
        )
    }

    fn network_interface(&self, resource_group: &str, network_interface: &str) -> Result<Url> {
        self.provider_resource(
            resource_group,
            NETWORK_PROVIDER,
            &["networkInterfaces", network_interface],
            NETWORK_API_VERSION,
        )
    }

    fn virtual_machine(&self, resource_group: &str, virtual_machine: &str) -> Result<Url> {
        self.provider_resource(
            resource_group,
            COMPUTE_PROVIDER,
            &["virtualMachines", virtual_machine],
            COMPUTE_API_VERSION,
        )
    }
}

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 120;

fn build_http_client(config: &Config) -> Result<HttpClient> {
    let mut builder = HttpClient::builder()
        .gzip(true)
        .danger_accept_invalid_certs(config.accept_invalid_certificates)
        .timeout(Some(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS)));

    if let Some(proxy) = config.proxy.clone() {
        builder = builder.proxy(Proxy::all(proxy).map_err(Error::BuildHttpClient)?);
    }
    builder.build().map_err(Error::BuildHttpClient)
}

fn build_headers(config: &Config) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", &config.token.0)).map_err(|_| {
            Error::BadToken {
                length: config.token.0.chars().count(),
            }
        })?,
    );
    Ok(headers)
}

pub static DEFAULT_ENDPOINT: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://management.azure.com").expect("Default URL is well-formed")
});

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use mockito::{server_url, Matcher};

    pub const SUBSCRIPTION: &str = "sub";

    /// Client pointed at the mock server, polling without delay.
    pub fn test_client() -> Client {
        Client::new(Config {
            endpoint: Url::parse(&server_url()).unwrap(),
            token: Token("secret".to_owned()),
            subscription_id: SubscriptionId(SUBSCRIPTION.to_owned()),
            poll_interval: Duration::ZERO,
            ..Default::default()
        })
        .unwrap()
    }

    /// Match a request path regardless of its query string.
    pub fn arm_path(path: &str) -> Matcher {
        Matcher::Regex(format!("^{}(\\?|$)", path.replace('.', "\\.")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{arm_path, test_client};
    use mockito::{mock, Matcher};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    #[test]
    fn test_construct_endpoint() {
        let url = construct_endpoint(
            &Url::parse("https://management.azure.com").unwrap(),
            &["subscriptions", "sub", "resourceGroups", "scriptGroup"],
            RESOURCES_API_VERSION,
        )
        .unwrap();

        assert_eq!(
            url.to_string(),
            "https://management.azure.com/subscriptions/sub/resourceGroups/scriptGroup?api-version=2021-04-01"
        )
    }

    #[test]
    fn test_construct_endpoint_keeps_base_path() {
        let url = construct_endpoint(
            &Url::parse("https://proxy.example.com/arm").unwrap(),
            &["subscriptions", "sub"],
            RESOURCES_API_VERSION,
        )
        .unwrap();

        assert_eq!(
            url.to_string(),
            "https://proxy.example.com/arm/subscriptions/sub?api-version=2021-04-01"
        )
    }

    #[test]
    fn test_endpoints() {
        let endpoints = Endpoints::new(
            DEFAULT_ENDPOINT.clone(),
            SubscriptionId("1196ed17-0b51-48be-bd51-ed701b1c95e0".to_owned()),
        )
        .unwrap();

        assert_eq!(
            endpoints
                .subnet("scriptGroup", "scriptNet", "scriptSnet")
                .unwrap()
                .as_str(),
            "https://management.azure.com/subscriptions/1196ed17-0b51-48be-bd51-ed701b1c95e0/resourceGroups/scriptGroup/providers/Microsoft.Network/virtualNetworks/scriptNet/subnets/scriptSnet?api-version=2023-09-01"
        );
        assert_eq!(
            endpoints
                .public_ip_address("scriptGroup", "scriptIp")
                .unwrap()
                .path(),
            "/subscriptions/1196ed17-0b51-48be-bd51-ed701b1c95e0/resourceGroups/scriptGroup/providers/Microsoft.Network/publicIPAddresses/scriptIp"
        );
        assert_eq!(
            endpoints
                .virtual_machine("scriptGroup", "scriptVM")
                .unwrap()
                .as_str(),
            "https://management.azure.com/subscriptions/1196ed17-0b51-48be-bd51-ed701b1c95e0/resourceGroups/scriptGroup/providers/Microsoft.Compute/virtualMachines/scriptVM?api-version=2023-09-01"
        );
    }

    #[test]
    fn test_bad_token() {
        let result = Client::new(Config {
            token: Token("line\nbreak".to_owned()),
            ..Default::default()
        });
        let error = result.unwrap_err();
        assert!(matches!(error, Error::BadToken { length: 10 }));
        assert!(!error.to_string().contains("line"), "{error}");
    }

    #[test]
    fn test_create_resource_group() {
        let client = test_client();

        let put = mock("PUT", arm_path("/subscriptions/sub/resourceGroups/scriptGroup"))
            .match_query(Matcher::UrlEncoded(
                "api-version".to_owned(),
                RESOURCES_API_VERSION.to_owned(),
            ))
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::Json(serde_json::json!({"location": "westeurope"})))
            .with_status(201)
            .with_body(
                r#"{
                    "id": "/subscriptions/sub/resourceGroups/scriptGroup",
                    "name": "scriptGroup",
                    "type": "Microsoft.Resources/resourceGroups",
                    "location": "westeurope",
                    "properties": {"provisioningState": "Succeeded"}
                }"#,
            )
            .create();

        let group = client
            .create_or_update_resource_group(
                "scriptGroup",
                NewResourceGroup {
                    location: "westeurope",
                },
            )
            .unwrap();

        assert_eq!(group.name, "scriptGroup");
        assert_eq!(group.location, "westeurope");
        assert_eq!(
            group.id,
            ResourceId::resource_group(&SubscriptionId("sub".to_owned()), "scriptGroup")
        );
        assert_eq!(group.provisioning_state(), Some(&ProvisioningState::Succeeded));
        put.assert();
    }

    #[test]
    fn test_api_error() {
        let client = test_client();

        let _get = mock("GET", arm_path("/subscriptions/sub/resourceGroups/missing"))
            .with_status(404)
            .with_body(
                r#"{"error": {"code": "ResourceGroupNotFound", "message": "Resource group 'missing' could not be found."}}"#,
            )
            .create();

        let error = client.get_resource_group("missing").unwrap_err();
        assert!(error.is_not_found());
        match error {
            Error::Api {
                status_code,
                code,
                message,
            } => {
                assert_eq!(status_code, StatusCode::NOT_FOUND);
                assert_eq!(code, "ResourceGroupNotFound");
                assert_eq!(message, "Resource group 'missing' could not be found.");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
