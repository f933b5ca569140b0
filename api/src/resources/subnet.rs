use serde::{Deserialize, Serialize};

use crate::resources::{ArmResource, ProvisioningState, ResourceId};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Subnet {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub properties: SubnetProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

impl Subnet {
    pub fn address_prefix(&self) -> Option<&str> {
        self.properties.address_prefix.as_deref()
    }
}

impl ArmResource for Subnet {
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
pub struct NewSubnet<'request> {
    pub properties: NewSubnetProperties<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewSubnetProperties<'request> {
    pub address_prefix: &'request str,
}
