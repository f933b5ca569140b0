pub mod network_interface;
pub mod public_ip_address;
pub mod resource_group;
pub mod subnet;
pub mod virtual_machine;
pub mod virtual_network;

use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub String);

impl Display for SubscriptionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A fully qualified ARM resource id.
///
/// Ids have the form
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`, where the
/// `{type}/{name}` pair repeats for child resources (e.g. a subnet inside a virtual network).
/// A resource group's own id stops after `{rg}`.
///
/// ARM is not consistent about the casing of the `resourceGroups` and `providers` keywords, so
/// these are matched case-insensitively and always displayed in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    subscription_id: SubscriptionId,
    resource_group: String,
    provider: Option<String>,
    types: Vec<(String, String)>,
}

impl ResourceId {
    pub fn resource_group(subscription_id: &SubscriptionId, resource_group: &str) -> Self {
        Self {
            subscription_id: subscription_id.clone(),
            resource_group: resource_group.to_owned(),
            provider: None,
            types: Vec::new(),
        }
    }

    pub fn new(
        subscription_id: &SubscriptionId,
        resource_group: &str,
        provider: &str,
        types: &[(&str, &str)],
    ) -> Self {
        Self {
            subscription_id: subscription_id.clone(),
            resource_group: resource_group.to_owned(),
            provider: Some(provider.to_owned()),
            types: types
                .iter()
                .map(|(kind, name)| ((*kind).to_owned(), (*name).to_owned()))
                .collect(),
        }
    }

    pub fn subscription_id(&self) -> &SubscriptionId {
        &self.subscription_id
    }

    pub fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// The full resource type, e.g. `Microsoft.Network/virtualNetworks/subnets`.
    pub fn resource_type(&self) -> String {
        match &self.provider {
            Some(provider) => std::iter::once(provider.as_str())
                .chain(self.types.iter().map(|(kind, _)| kind.as_str()))
                .collect::<Vec<_>>()
                .join("/"),
            None => "Microsoft.Resources/resourceGroups".to_owned(),
        }
    }

    /// The name of the innermost resource.
    pub fn name(&self) -> &str {
        self.types
            .last()
            .map_or(self.resource_group.as_str(), |(_, name)| name.as_str())
    }

    pub fn parent(&self) -> Option<ResourceId> {
        match self.types.len() {
            0 => None,
            1 => Some(ResourceId::resource_group(
                &self.subscription_id,
                &self.resource_group,
            )),
            len => Some(ResourceId {
                types: self.types[..len - 1].to_vec(),
                ..self.clone()
            }),
        }
    }

    /// ARM treats ids as case-insensitive.
    pub fn eq_ignore_case(&self, other: &ResourceId) -> bool {
        self.to_string().eq_ignore_ascii_case(&other.to_string())
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        let bad_id = || Error::BadResourceId {
            identifier: string.to_owned(),
        };

        let segments = string
            .strip_prefix('/')
            .ok_or_else(bad_id)?
            .trim_end_matches('/')
            .split('/')
            .collect::<Vec<_>>();

        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(bad_id());
        }

        match segments.as_slice() {
            [subscriptions, subscription_id, resource_groups, resource_group]
                if subscriptions.eq_ignore_ascii_case("subscriptions")
                    && resource_groups.eq_ignore_ascii_case("resourceGroups") =>
            {
                Ok(ResourceId::resource_group(
                    &SubscriptionId((*subscription_id).to_owned()),
                    resource_group,
                ))
            }
            [subscriptions, subscription_id, resource_groups, resource_group, providers, provider, rest @ ..]
                if subscriptions.eq_ignore_ascii_case("subscriptions")
                    && resource_groups.eq_ignore_ascii_case("resourceGroups")
                    && providers.eq_ignore_ascii_case("providers")
                    && !rest.is_empty()
                    && rest.len() % 2 == 0 =>
            {
                Ok(ResourceId {
                    subscription_id: SubscriptionId((*subscription_id).to_owned()),
                    resource_group: (*resource_group).to_owned(),
                    provider: Some((*provider).to_owned()),
                    types: rest
                        .chunks(2)
                        .map(|pair| (pair[0].to_owned(), pair[1].to_owned()))
                        .collect(),
                })
            }
            _ => Err(bad_id()),
        }
    }
}

impl TryFrom<String> for ResourceId {
    type Error = Error;

    fn try_from(string: String) -> Result<Self> {
        string.parse()
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}

impl Display for ResourceId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )?;
        if let Some(provider) = &self.provider {
            write!(formatter, "/providers/{provider}")?;
            for (kind, name) in &self.types {
                write!(formatter, "/{kind}/{name}")?;
            }
        }
        Ok(())
    }
}

/// Provisioning state of a resource or status of an asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ProvisioningState {
    Succeeded,
    Failed,
    Canceled,
    Accepted,
    Creating,
    Updating,
    Deleting,
    InProgress,
    Other(String),
}

impl ProvisioningState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisioningState::Succeeded | ProvisioningState::Failed | ProvisioningState::Canceled
        )
    }
}

impl From<String> for ProvisioningState {
    fn from(string: String) -> Self {
        match string.to_ascii_lowercase().as_str() {
            "succeeded" => ProvisioningState::Succeeded,
            "failed" => ProvisioningState::Failed,
            "canceled" | "cancelled" => ProvisioningState::Canceled,
            "accepted" => ProvisioningState::Accepted,
            "creating" => ProvisioningState::Creating,
            "updating" => ProvisioningState::Updating,
            "deleting" => ProvisioningState::Deleting,
            "inprogress" => ProvisioningState::InProgress,
            _ => ProvisioningState::Other(string),
        }
    }
}

impl From<ProvisioningState> for String {
    fn from(state: ProvisioningState) -> Self {
        state.to_string()
    }
}

impl Display for ProvisioningState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            ProvisioningState::Succeeded => "Succeeded",
            ProvisioningState::Failed => "Failed",
            ProvisioningState::Canceled => "Canceled",
            ProvisioningState::Accepted => "Accepted",
            ProvisioningState::Creating => "Creating",
            ProvisioningState::Updating => "Updating",
            ProvisioningState::Deleting => "Deleting",
            ProvisioningState::InProgress => "InProgress",
            ProvisioningState::Other(other) => other.as_str(),
        })
    }
}

/// Reference to another resource by id.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubResource {
    pub id: ResourceId,
}

/// Common accessors over the resources returned by ARM.
pub trait ArmResource {
    fn id(&self) -> &ResourceId;

    fn name(&self) -> &str;

    fn provisioning_state(&self) -> Option<&ProvisioningState>;
}

/// Just enough of a resource body to read its provisioning state.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProvisioningStateEnvelope {
    #[serde(default)]
    pub properties: Option<ProvisioningStateProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProvisioningStateProperties {
    #[serde(default)]
    pub provisioning_state: Option<ProvisioningState>,
}

impl ProvisioningStateEnvelope {
    pub fn into_state(self) -> Option<ProvisioningState> {
        self.properties
            .and_then(|properties| properties.provisioning_state)
    }
}

/// Body returned when polling an `Azure-AsyncOperation` url.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AsyncOperationStatus {
    pub status: ProvisioningState,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorDetail {
    pub fn into_error(self, status_code: StatusCode) -> Error {
        Error::Api {
            status_code,
            code: self.code.unwrap_or_default(),
            message: self.message.unwrap_or_default(),
        }
    }
}

/// Turn the body of a failed response into an [`Error::Api`].
pub(crate) fn api_error_from_body(status_code: StatusCode, body: &str) -> Error {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(response) => response.error.into_error(status_code),
        Err(_) => Error::Api {
            status_code,
            code: String::new(),
            message: body.trim().to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SUBNET_ID: &str = "/subscriptions/1196ed17-0b51-48be-bd51-ed701b1c95e0/resourceGroups/scriptGroup/providers/Microsoft.Network/virtualNetworks/scriptNet/subnets/scriptSnet";

    #[test]
    fn test_parse_child_resource_id() {
        let id: ResourceId = SUBNET_ID.parse().unwrap();
        assert_eq!(
            id.subscription_id(),
            &SubscriptionId("1196ed17-0b51-48be-bd51-ed701b1c95e0".to_owned())
        );
        assert_eq!(id.resource_group_name(), "scriptGroup");
        assert_eq!(id.provider(), Some("Microsoft.Network"));
        assert_eq!(
            id.resource_type(),
            "Microsoft.Network/virtualNetworks/subnets"
        );
        assert_eq!(id.name(), "scriptSnet");
        assert_eq!(id.to_string(), SUBNET_ID);

        let parent = id.parent().unwrap();
        assert_eq!(parent.name(), "scriptNet");
        assert_eq!(parent.resource_type(), "Microsoft.Network/virtualNetworks");
        assert_eq!(parent.parent().unwrap().name(), "scriptGroup");
        assert_eq!(parent.parent().unwrap().parent(), None);
    }

    #[test]
    fn test_parse_resource_group_id_normalises_keywords() {
        let id: ResourceId = "/subscriptions/abc/resourcegroups/scriptGroup/".parse().unwrap();
        assert_eq!(id, ResourceId::resource_group(&SubscriptionId("abc".into()), "scriptGroup"));
        assert_eq!(id.to_string(), "/subscriptions/abc/resourceGroups/scriptGroup");
        assert_eq!(id.resource_type(), "Microsoft.Resources/resourceGroups");
    }

    #[test]
    fn test_parse_bad_resource_ids() {
        for bad in [
            "",
            "subscriptions/abc/resourceGroups/rg",
            "/subscriptions/abc",
            "/subscriptions/abc/resourceGroups/rg/providers/Microsoft.Network",
            "/subscriptions/abc/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks",
            "/subscriptions/abc/resourceGroups/rg/ providers/Microsoft.Network/networkInterfaces/nic",
            "/subscriptions//resourceGroups/rg",
        ] {
            assert!(
                matches!(bad.parse::<ResourceId>(), Err(Error::BadResourceId { .. })),
                "`{bad}` should not parse"
            );
        }
    }

    #[test]
    fn test_resource_id_case_insensitive_comparison() {
        let lower: ResourceId = SUBNET_ID.to_lowercase().parse().unwrap();
        let canonical: ResourceId = SUBNET_ID.parse().unwrap();
        assert_ne!(lower, canonical);
        assert!(lower.eq_ignore_case(&canonical));
    }

    #[test]
    fn test_provisioning_state_serde() {
        let states: Vec<ProvisioningState> =
            serde_json::from_str(r#"["Succeeded", "inProgress", "Canceled", "Migrating"]"#)
                .unwrap();
        assert_eq!(
            states,
            vec![
                ProvisioningState::Succeeded,
                ProvisioningState::InProgress,
                ProvisioningState::Canceled,
                ProvisioningState::Other("Migrating".to_owned()),
            ]
        );
        assert!(states[0].is_terminal());
        assert!(!states[1].is_terminal());
        assert!(!states[3].is_terminal());
        assert_eq!(
            serde_json::to_string(&states[3]).unwrap(),
            r#""Migrating""#
        );
    }

    #[test]
    fn test_api_error_from_body() {
        let error = api_error_from_body(
            StatusCode::CONFLICT,
            r#"{"error": {"code": "InUseSubnetCannotBeDeleted", "message": "Subnet is in use."}}"#,
        );
        match error {
            Error::Api {
                status_code,
                code,
                message,
            } => {
                assert_eq!(status_code, StatusCode::CONFLICT);
                assert_eq!(code, "InUseSubnetCannotBeDeleted");
                assert_eq!(message, "Subnet is in use.");
            }
            other => panic!("unexpected error {other:?}"),
        }

        match api_error_from_body(StatusCode::BAD_GATEWAY, "upstream unavailable\n") {
            Error::Api { code, message, .. } => {
                assert_eq!(code, "");
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
