use serde::{Deserialize, Serialize};

use crate::resources::{ArmResource, ProvisioningState, ResourceId};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VirtualMachine {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: VirtualMachineProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,

    #[serde(default)]
    pub network_profile: NetworkProfile,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterfaceReference>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkInterfaceReference {
    pub id: ResourceId,
    #[serde(default)]
    pub properties: NetworkInterfaceReferenceProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NetworkInterfaceReferenceProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

impl VirtualMachine {
    pub fn vm_size(&self) -> Option<&str> {
        self.properties
            .hardware_profile
            .as_ref()
            .map(|profile| profile.vm_size.as_str())
    }

    /// The primary network interface, or the only one if none is marked primary.
    pub fn primary_network_interface(&self) -> Option<&ResourceId> {
        let interfaces = &self.properties.network_profile.network_interfaces;
        interfaces
            .iter()
            .find(|interface| interface.properties.primary == Some(true))
            .or_else(|| match interfaces.as_slice() {
                [only] => Some(only),
                _ => None,
            })
            .map(|interface| &interface.id)
    }
}

impl ArmResource for VirtualMachine {
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
pub struct NewVirtualMachine<'request> {
    pub location: &'request str,
    pub properties: NewVirtualMachineProperties<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewVirtualMachineProperties<'request> {
    pub hardware_profile: NewHardwareProfile<'request>,
    pub storage_profile: NewStorageProfile<'request>,
    pub os_profile: NewOsProfile<'request>,
    pub network_profile: NewNetworkProfile<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewHardwareProfile<'request> {
    pub vm_size: &'request str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewStorageProfile<'request> {
    pub image_reference: ImageReference<'request>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ImageReference<'request> {
    pub publisher: &'request str,
    pub offer: &'request str,
    pub sku: &'request str,
    pub version: &'request str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewOsProfile<'request> {
    pub computer_name: &'request str,
    pub admin_username: &'request str,
    pub linux_configuration: LinuxConfiguration<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinuxConfiguration<'request> {
    pub disable_password_authentication: bool,
    pub ssh: SshConfiguration<'request>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SshConfiguration<'request> {
    pub public_keys: Vec<SshPublicKey<'request>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKey<'request> {
    pub path: String,
    pub key_data: &'request str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewNetworkProfile<'request> {
    pub network_interfaces: Vec<NewNetworkInterfaceReference<'request>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewNetworkInterfaceReference<'request> {
    pub id: &'request ResourceId,
    pub properties: NewNetworkInterfaceReferenceProperties,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewNetworkInterfaceReferenceProperties {
    pub primary: bool,
}
