use serde::{Deserialize, Serialize};

use crate::resources::{ArmResource, ProvisioningState, ResourceId};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Sku {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicIpAddress {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub sku: Option<Sku>,
    #[serde(default)]
    pub properties: PublicIpAddressProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    #[serde(
        default,
        rename = "publicIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_allocation_method: Option<String>,

    #[serde(
        default,
        rename = "publicIPAddressVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_address_version: Option<String>,

    /// Only known once the address has been allocated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

impl PublicIpAddress {
    pub fn ip_address(&self) -> Option<&str> {
        self.properties.ip_address.as_deref()
    }
}

impl ArmResource for PublicIpAddress {
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
pub struct NewPublicIpAddress<'request> {
    pub location: &'request str,
    pub sku: NewSku<'request>,
    pub properties: NewPublicIpAddressProperties<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewSku<'request> {
    pub name: &'request str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewPublicIpAddressProperties<'request> {
    #[serde(rename = "publicIPAllocationMethod")]
    pub public_ip_allocation_method: &'request str,

    #[serde(rename = "publicIPAddressVersion")]
    pub public_ip_address_version: &'request str,
}
