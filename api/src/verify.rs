//! Read back a provisioned plan and check it matches what was requested.
use log::debug;
use serde::Serialize;

use crate::{
    error::Result,
    provision::{Plan, Step},
    resources::ArmResource,
    Client,
};

/// The outcome of one check.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Check {
    pub step: Step,
    pub description: String,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    fn new(
        step: Step,
        description: impl Into<String>,
        passed: bool,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            step,
            description: description.into(),
            passed,
            detail: detail.into(),
        }
    }
}

/// Whether every check passed.
pub fn all_passed(checks: &[Check]) -> bool {
    checks.iter().all(|check| check.passed)
}

// A missing resource is a failed check, not an error.
fn found<ResourceT>(result: Result<ResourceT>) -> Result<Option<ResourceT>> {
    match result {
        Ok(resource) => Ok(Some(resource)),
        Err(error) if error.is_not_found() => Ok(None),
        Err(error) => Err(error),
    }
}

fn check_resource<ResourceT: ArmResource>(
    checks: &mut Vec<Check>,
    step: Step,
    expected_name: &str,
    resource: Option<&ResourceT>,
) {
    let Some(resource) = resource else {
        checks.push(Check::new(
            step,
            format!("{step} {expected_name} exists"),
            false,
            "not found",
        ));
        return;
    };
    debug!("Found {} `{}`", step, resource.id());

    checks.push(Check::new(
        step,
        format!("{step} {expected_name} exists"),
        true,
        resource.id().to_string(),
    ));
    // ARM names are case-insensitive.
    checks.push(Check::new(
        step,
        format!("{step} is named {expected_name}"),
        resource.name().eq_ignore_ascii_case(expected_name),
        resource.name(),
    ));
}

/// Check every resource of `plan` exists with the expected name and that the resources reference
/// each other.
///
/// Only failures to talk to ARM are returned as errors; everything else is reported as a failed
/// [`Check`].
pub fn verify(client: &Client, plan: &Plan) -> Result<Vec<Check>> {
    let mut checks = Vec::new();

    let resource_group = found(client.get_resource_group(plan.resource_group))?;
    check_resource(
        &mut checks,
        Step::ResourceGroup,
        plan.resource_group,
        resource_group.as_ref(),
    );
    if resource_group.is_none() {
        // Nothing else can exist without the group.
        return Ok(checks);
    }

    let virtual_network =
        found(client.get_virtual_network(plan.resource_group, plan.virtual_network))?;
    check_resource(
        &mut checks,
        Step::VirtualNetwork,
        plan.virtual_network,
        virtual_network.as_ref(),
    );

    let subnet = if virtual_network.is_some() {
        found(client.get_subnet(plan.resource_group, plan.virtual_network, plan.subnet))?
    } else {
        None
    };
    check_resource(&mut checks, Step::Subnet, plan.subnet, subnet.as_ref());

    let public_ip_address =
        found(client.get_public_ip_address(plan.resource_group, plan.public_ip_address))?;
    check_resource(
        &mut checks,
        Step::PublicIpAddress,
        plan.public_ip_address,
        public_ip_address.as_ref(),
    );

    let network_interface =
        found(client.get_network_interface(plan.resource_group, plan.network_interface))?;
    check_resource(
        &mut checks,
        Step::NetworkInterface,
        plan.network_interface,
        network_interface.as_ref(),
    );

    let virtual_machine =
        found(client.get_virtual_machine(plan.resource_group, plan.virtual_machine))?;
    check_resource(
        &mut checks,
        Step::VirtualMachine,
        plan.virtual_machine,
        virtual_machine.as_ref(),
    );

    if let Some(network_interface) = &network_interface {
        let configuration = network_interface
            .properties
            .ip_configurations
            .iter()
            .find(|configuration| configuration.name == plan.ip_configuration);

        if let Some(subnet) = &subnet {
            let referenced = configuration
                .and_then(|configuration| configuration.properties.subnet.as_ref());
            checks.push(Check::new(
                Step::NetworkInterface,
                format!("{} uses subnet {}", network_interface.name, subnet.name),
                referenced.is_some_and(|reference| reference.id.eq_ignore_case(&subnet.id)),
                referenced.map_or_else(|| "none".to_owned(), |reference| reference.id.to_string()),
            ));
        }

        if let Some(public_ip_address) = &public_ip_address {
            let referenced = configuration
                .and_then(|configuration| configuration.properties.public_ip_address.as_ref());
            checks.push(Check::new(
                Step::NetworkInterface,
                format!(
                    "{} uses public IP address {}",
                    network_interface.name, public_ip_address.name
                ),
                referenced.is_some_and(|reference| {
                    reference.id.eq_ignore_case(&public_ip_address.id)
                }),
                referenced.map_or_else(|| "none".to_owned(), |reference| reference.id.to_string()),
            ));
        }

        if let Some(virtual_machine) = &virtual_machine {
            let primary = virtual_machine.primary_network_interface();
            checks.push(Check::new(
                Step::VirtualMachine,
                format!(
                    "{} is attached to {}",
                    virtual_machine.name, network_interface.name
                ),
                primary.is_some_and(|id| id.eq_ignore_case(&network_interface.id)),
                primary.map_or_else(|| "none".to_owned(), ToString::to_string),
            ));
        }
    }

    Ok(checks)
}
