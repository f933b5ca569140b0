use serde::{Deserialize, Serialize};

use crate::resources::{ArmResource, ProvisioningState, ResourceId};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResourceGroup {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: ResourceGroupProperties,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
}

impl ArmResource for ResourceGroup {
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
pub struct NewResourceGroup<'request> {
    pub location: &'request str,
}
