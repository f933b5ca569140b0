use serde::{Deserialize, Serialize};

use crate::resources::{ArmResource, ProvisioningState, ResourceId, SubResource};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkInterface {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: NetworkInterfaceProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    #[serde(default)]
    pub ip_configurations: Vec<IpConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct IpConfiguration {
    pub name: String,
    #[serde(default)]
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,

    #[serde(
        default,
        rename = "publicIPAddress",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_address: Option<SubResource>,

    #[serde(
        default,
        rename = "privateIPAddress",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_ip_address: Option<String>,
}

impl NetworkInterface {
    pub fn private_ip_address(&self) -> Option<&str> {
        self.properties
            .ip_configurations
            .iter()
            .find_map(|configuration| configuration.properties.private_ip_address.as_deref())
    }
}

impl ArmResource for NetworkInterface {
    fn id(&self) -> &ResourceId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn provisioning_state(&self) -> Option<&ProvisioningState> {
        self.properties.provisioning_state.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewNetworkInterface<'request> {
    pub location: &'request str,
    pub properties: NewNetworkInterfaceProperties<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewNetworkInterfaceProperties<'request> {
    pub ip_configurations: Vec<NewIpConfiguration<'request>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewIpConfiguration<'request> {
    pub name: &'request str,
    pub properties: NewIpConfigurationProperties<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewIpConfigurationProperties<'request> {
    pub subnet: NewSubResource<'request>,

    #[serde(rename = "publicIPAddress")]
    pub public_ip_address: NewSubResource<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewSubResource<'request> {
    pub id: &'request ResourceId,
}
