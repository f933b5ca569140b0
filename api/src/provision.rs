//! The fixed provisioning sequence.
//!
//! Six resources are created strictly one after the other. Each step blocks until ARM reports the
//! resource as provisioned, and any reference to an earlier resource is taken from the id ARM
//! returned for it rather than computed up front.
use log::info;
use serde::Serialize;
use std::fmt::{self, Display};

use crate::{
    error::{Error, Result},
    resources::{
        network_interface::{
            NetworkInterface, NewIpConfiguration, NewIpConfigurationProperties,
            NewNetworkInterface, NewNetworkInterfaceProperties, NewSubResource,
        },
        public_ip_address::{
            NewPublicIpAddress, NewPublicIpAddressProperties, NewSku, PublicIpAddress,
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
            NewAddressSpace, NewVirtualNetwork, NewVirtualNetworkProperties, VirtualNetwork,
        },
        ArmResource, ResourceId, SubscriptionId,
    },
    Client,
};

pub const DEFAULT_SUBSCRIPTION_ID: &str = "1196ed17-0b51-48be-bd51-ed701b1c95e0";

pub const RESOURCE_GROUP_NAME: &str = "scriptGroup";
pub const LOCATION: &str = "westeurope";
pub const VIRTUAL_NETWORK_NAME: &str = "scriptNet";
pub const VIRTUAL_NETWORK_ADDRESS_PREFIXES: &[&str] = &["10.0.0.0/16"];
pub const VIRTUAL_NETWORK_FLOW_TIMEOUT_MINUTES: u32 = 10;
pub const SUBNET_NAME: &str = "scriptSnet";
// Same range as the whole virtual network, so the subnet leaves no room for another one.
pub const SUBNET_ADDRESS_PREFIX: &str = "10.0.0.0/16";
pub const PUBLIC_IP_NAME: &str = "scriptIp";
pub const PUBLIC_IP_SKU: &str = "Standard";
pub const PUBLIC_IP_ALLOCATION_METHOD: &str = "Static";
pub const PUBLIC_IP_VERSION: &str = "IPv4";
pub const IP_CONFIG_NAME: &str = "ipconfig1";
pub const NETWORK_INTERFACE_NAME: &str = "scriptNic";
pub const VIRTUAL_MACHINE_NAME: &str = "scriptVM";
pub const VIRTUAL_MACHINE_SIZE: &str = "Standard_D1_v2";
pub const ADMIN_USERNAME: &str = "ben";
pub const IMAGE: ImageReference<'static> = ImageReference {
    publisher: "Canonical",
    offer: "UbuntuServer",
    sku: "16.04-LTS",
    version: "latest",
};
pub const SSH_PUBLIC_KEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABgQDFADdQcHQDdoXF9Wk7UnFO9KO9ecxjjG/WqseFxtFay+3IbaJCiwHRJVW9Rj+nj3IMJWbJkGfSEkp9BdKrMYv07EkOQtz8+Sn7f1/l3XnO/3gBdj7OqksYil+J8WpZrNc60yzxczLJCQK5+pJUNKIrNIJtewoWy9I0neKkl4XrETn1SguqCeoMksOzkYqk4CRXbNlX7CGw9XoosvA+KFtk1im429QswYM5voPlKJqsOo6lVvO9KhYAJpxkgxzEVolC31N2pvPtKmqhBS98Ut/AXloB90jXSnJ/9tibnliKwqecnaHpyyG3MsdtKVeG+aQGQGM2mRUpXB5T/yeALa5lxxuCSPrOI6e9sYwHWPfkVB6m0IbGngOcU9oaQNPQJoWVUDTTIC8nlx3JT3ZmpD/zkUf4NE6Jcc848/YORifzVUbNE85T3d1ayuFGdcCScnPFHMvX7SpRYUDCm0iqiFOrCQzg4VK6GupqfU5+z8LOHyFsXz1Yeo1rzjoKU9EcNgU= bendavcorr@instance-1";

/// Names and payload values of everything that gets provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub resource_group: &'static str,
    pub location: &'static str,
    pub virtual_network: &'static str,
    pub address_prefixes: &'static [&'static str],
    pub flow_timeout_in_minutes: u32,
    pub subnet: &'static str,
    pub subnet_address_prefix: &'static str,
    pub public_ip_address: &'static str,
    pub ip_configuration: &'static str,
    pub network_interface: &'static str,
    pub virtual_machine: &'static str,
    pub vm_size: &'static str,
    pub image: ImageReference<'static>,
    pub admin_username: &'static str,
    pub ssh_public_key: &'static str,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            resource_group: RESOURCE_GROUP_NAME,
            location: LOCATION,
            virtual_network: VIRTUAL_NETWORK_NAME,
            address_prefixes: VIRTUAL_NETWORK_ADDRESS_PREFIXES,
            flow_timeout_in_minutes: VIRTUAL_NETWORK_FLOW_TIMEOUT_MINUTES,
            subnet: SUBNET_NAME,
            subnet_address_prefix: SUBNET_ADDRESS_PREFIX,
            public_ip_address: PUBLIC_IP_NAME,
            ip_configuration: IP_CONFIG_NAME,
            network_interface: NETWORK_INTERFACE_NAME,
            virtual_machine: VIRTUAL_MACHINE_NAME,
            vm_size: VIRTUAL_MACHINE_SIZE,
            image: IMAGE,
            admin_username: ADMIN_USERNAME,
            ssh_public_key: SSH_PUBLIC_KEY,
        }
    }
}

impl Plan {
    pub fn new_resource_group(&self) -> NewResourceGroup<'_> {
        NewResourceGroup {
            location: self.location,
        }
    }

    pub fn new_virtual_network(&self) -> NewVirtualNetwork<'_> {
        NewVirtualNetwork {
            location: self.location,
            properties: NewVirtualNetworkProperties {
                address_space: NewAddressSpace {
                    address_prefixes: self.address_prefixes,
                },
                flow_timeout_in_minutes: Some(self.flow_timeout_in_minutes),
            },
        }
    }

    pub fn new_subnet(&self) -> NewSubnet<'_> {
        NewSubnet {
            properties: NewSubnetProperties {
                address_prefix: self.subnet_address_prefix,
            },
        }
    }

    pub fn new_public_ip_address(&self) -> NewPublicIpAddress<'_> {
        NewPublicIpAddress {
            location: self.location,
            sku: NewSku {
                name: PUBLIC_IP_SKU,
            },
            properties: NewPublicIpAddressProperties {
                public_ip_allocation_method: PUBLIC_IP_ALLOCATION_METHOD,
                public_ip_address_version: PUBLIC_IP_VERSION,
            },
        }
    }

    pub fn new_network_interface<'request>(
        &'request self,
        subnet: &'request ResourceId,
        public_ip_address: &'request ResourceId,
    ) -> NewNetworkInterface<'request> {
        NewNetworkInterface {
            location: self.location,
            properties: NewNetworkInterfaceProperties {
                ip_configurations: vec![NewIpConfiguration {
                    name: self.ip_configuration,
                    properties: NewIpConfigurationProperties {
                        subnet: NewSubResource { id: subnet },
                        public_ip_address: NewSubResource {
                            id: public_ip_address,
                        },
                    },
                }],
            },
        }
    }

    pub fn new_virtual_machine<'request>(
        &'request self,
        network_interface: &'request ResourceId,
    ) -> NewVirtualMachine<'request> {
        NewVirtualMachine {
            location: self.location,
            properties: NewVirtualMachineProperties {
                hardware_profile: NewHardwareProfile {
                    vm_size: self.vm_size,
                },
                storage_profile: NewStorageProfile {
                    image_reference: self.image,
                },
                os_profile: NewOsProfile {
                    computer_name: self.virtual_machine,
                    admin_username: self.admin_username,
                    linux_configuration: LinuxConfiguration {
                        disable_password_authentication: true,
                        ssh: SshConfiguration {
                            public_keys: vec![SshPublicKey {
                                path: format!("/home/{}/.ssh/authorized_keys", self.admin_username),
                                key_data: self.ssh_public_key,
                            }],
                        },
                    },
                },
                network_profile: NewNetworkProfile {
                    network_interfaces: vec![NewNetworkInterfaceReference {
                        id: network_interface,
                        properties: NewNetworkInterfaceReferenceProperties { primary: true },
                    }],
                },
            },
        }
    }
}

/// One resource-creating step of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    ResourceGroup,
    VirtualNetwork,
    Subnet,
    PublicIpAddress,
    NetworkInterface,
    VirtualMachine,
}

impl Step {
    /// The order steps are run in. Every step comes after the steps it depends on.
    pub const ORDER: [Step; 6] = [
        Step::ResourceGroup,
        Step::VirtualNetwork,
        Step::Subnet,
        Step::PublicIpAddress,
        Step::NetworkInterface,
        Step::VirtualMachine,
    ];

    pub fn depends_on(self) -> &'static [Step] {
        match self {
            Step::ResourceGroup => &[],
            Step::VirtualNetwork => &[Step::ResourceGroup],
            Step::Subnet => &[Step::VirtualNetwork],
            Step::PublicIpAddress => &[Step::ResourceGroup],
            Step::NetworkInterface => &[Step::Subnet, Step::PublicIpAddress],
            Step::VirtualMachine => &[Step::NetworkInterface],
        }
    }

    pub fn resource_name(self, plan: &Plan) -> &'static str {
        match self {
            Step::ResourceGroup => plan.resource_group,
            Step::VirtualNetwork => plan.virtual_network,
            Step::Subnet => plan.subnet,
            Step::PublicIpAddress => plan.public_ip_address,
            Step::NetworkInterface => plan.network_interface,
            Step::VirtualMachine => plan.virtual_machine,
        }
    }

    /// The id the resource is expected to get. Only for display: requests always reference the
    /// ids returned by ARM.
    pub fn expected_id(self, plan: &Plan, subscription_id: &SubscriptionId) -> ResourceId {
        let network = |types: &[(&str, &str)]| {
            ResourceId::new(subscription_id, plan.resource_group, "Microsoft.Network", types)
        };
        match self {
            Step::ResourceGroup => ResourceId::resource_group(subscription_id, plan.resource_group),
            Step::VirtualNetwork => network(&[("virtualNetworks", plan.virtual_network)]),
            Step::Subnet => network(&[
                ("virtualNetworks", plan.virtual_network),
                ("subnets", plan.subnet),
            ]),
            Step::PublicIpAddress => network(&[("publicIPAddresses", plan.public_ip_address)]),
            Step::NetworkInterface => network(&[("networkInterfaces", plan.network_interface)]),
            Step::VirtualMachine => ResourceId::new(
                subscription_id,
                plan.resource_group,
                "Microsoft.Compute",
                &[("virtualMachines", plan.virtual_machine)],
            ),
        }
    }
}

impl Display for Step {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Step::ResourceGroup => "resource group",
            Step::VirtualNetwork => "virtual network",
            Step::Subnet => "subnet",
            Step::PublicIpAddress => "public IP address",
            Step::NetworkInterface => "network interface",
            Step::VirtualMachine => "virtual machine",
        })
    }
}

/// Notified as the sequence makes progress.
pub trait Observer {
    fn started(&self, _step: Step, _name: &str) {}

    fn finished(&self, _step: Step, _resource: &dyn ArmResource) {}

    fn failed(&self, _step: Step, _error: &Error) {}
}

impl Observer for () {}

/// Everything the sequence created, as reported by ARM.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Provisioned {
    pub resource_group: ResourceGroup,
    pub virtual_network: VirtualNetwork,
    pub subnet: Subnet,
    pub public_ip_address: PublicIpAddress,
    pub network_interface: NetworkInterface,
    pub virtual_machine: VirtualMachine,
}

impl Provisioned {
    pub fn resources(&self) -> [(Step, &dyn ArmResource); 6] {
        [
            (Step::ResourceGroup, &self.resource_group),
            (Step::VirtualNetwork, &self.virtual_network),
            (Step::Subnet, &self.subnet),
            (Step::PublicIpAddress, &self.public_ip_address),
            (Step::NetworkInterface, &self.network_interface),
            (Step::VirtualMachine, &self.virtual_machine),
        ]
    }
}

fn run_step<ResourceT: ArmResource>(
    observer: &dyn Observer,
    step: Step,
    name: &str,
    create: impl FnOnce() -> Result<ResourceT>,
) -> Result<ResourceT> {
    observer.started(step, name);
    match create() {
        Ok(resource) => {
            observer.finished(step, &resource);
            Ok(resource)
        }
        Err(error) => {
            observer.failed(step, &error);
            Err(error)
        }
    }
}

/// Provision every resource in `plan`, in [`Step::ORDER`].
///
/// The first failure aborts the run. Resources created by earlier steps are left in place.
pub fn provision(client: &Client, plan: &Plan, observer: &dyn Observer) -> Result<Provisioned> {
    let resource_group = run_step(observer, Step::ResourceGroup, plan.resource_group, || {
        client.create_or_update_resource_group(plan.resource_group, plan.new_resource_group())
    })?;
    info!(
        "Provisioned resource group {} in the {} region",
        resource_group.name, resource_group.location
    );

    let virtual_network = run_step(observer, Step::VirtualNetwork, plan.virtual_network, || {
        client
            .begin_create_or_update_virtual_network(
                &resource_group.name,
                plan.virtual_network,
                plan.new_virtual_network(),
            )?
            .wait()
    })?;
    info!(
        "Provisioned virtual network {} with address prefixes {:?}",
        virtual_network.name,
        virtual_network.address_prefixes()
    );

    let subnet = run_step(observer, Step::Subnet, plan.subnet, || {
        client
            .begin_create_or_update_subnet(
                &resource_group.name,
                &virtual_network.name,
                plan.subnet,
                plan.new_subnet(),
            )?
            .wait()
    })?;
    info!(
        "Provisioned virtual subnet {} with address prefix {}",
        subnet.name,
        subnet.address_prefix().unwrap_or("<unknown>")
    );

    let public_ip_address = run_step(observer, Step::PublicIpAddress, plan.public_ip_address, || {
        client
            .begin_create_or_update_public_ip_address(
                &resource_group.name,
                plan.public_ip_address,
                plan.new_public_ip_address(),
            )?
            .wait()
    })?;
    info!("Provisioned public IP address {}", public_ip_address.name);

    let network_interface =
        run_step(observer, Step::NetworkInterface, plan.network_interface, || {
            client
                .begin_create_or_update_network_interface(
                    &resource_group.name,
                    plan.network_interface,
                    plan.new_network_interface(&subnet.id, &public_ip_address.id),
                )?
                .wait()
        })?;
    info!(
        "Provisioned network interface client {}",
        network_interface.name
    );

    info!(
        "Provisioning virtual machine {}; this operation might take a few minutes.",
        plan.virtual_machine
    );
    let virtual_machine = run_step(observer, Step::VirtualMachine, plan.virtual_machine, || {
        client
            .begin_create_or_update_virtual_machine(
                &resource_group.name,
                plan.virtual_machine,
                plan.new_virtual_machine(&network_interface.id),
            )?
            .wait()
    })?;
    info!("Provisioned virtual machine {}", virtual_machine.name);

    Ok(Provisioned {
        resource_group,
        virtual_network,
        subnet,
        public_ip_address,
        network_interface,
        virtual_machine,
    })
}
