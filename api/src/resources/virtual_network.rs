use serde::{Deserialize, Serialize};

use crate::resources::{subnet::Subnet, ArmResource, ProvisioningState, ResourceId};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VirtualNetwork {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: VirtualNetworkProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(default)]
    pub address_space: AddressSpace,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_timeout_in_minutes: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<Subnet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

impl VirtualNetwork {
    pub fn address_prefixes(&self) -> &[String] {
        &self.properties.address_space.address_prefixes
    }
}

impl ArmResource for VirtualNetwork {
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
pub struct NewVirtualNetwork<'request> {
    pub location: &'request str,
    pub properties: NewVirtualNetworkProperties<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewVirtualNetworkProperties<'request> {
    pub address_space: NewAddressSpace<'request>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_timeout_in_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewAddressSpace<'request> {
    pub address_prefixes: &'request [&'request str],
}
