use anyhow::Result;
use colored::Colorize;
use prettytable::{row, Row};
use serde::Serialize;
use vmprov_client::{
    provision::{Plan, Step},
    ResourceId, SubscriptionId,
};

use crate::printer::{DisplayTable, Printer};

#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub order: usize,
    pub step: Step,
    pub name: &'static str,
    pub depends_on: &'static [Step],
    pub id: ResourceId,
}

impl DisplayTable for PlannedStep {
    fn to_table_headers() -> Row {
        row![bFg => "#", "Kind", "Name", "Depends On", "Resource ID"]
    }

    fn to_table_row(&self) -> Row {
        let depends_on = self
            .depends_on
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        row![
            self.order,
            self.step,
            self.name,
            if depends_on.is_empty() {
                "-".dimmed()
            } else {
                depends_on.as_str().normal()
            },
            self.id
        ]
    }
}

pub fn planned_steps(plan: &Plan, subscription_id: &SubscriptionId) -> Vec<PlannedStep> {
    Step::ORDER
        .iter()
        .enumerate()
        .map(|(index, step)| PlannedStep {
            order: index + 1,
            step: *step,
            name: step.resource_name(plan),
            depends_on: step.depends_on(),
            id: step.expected_id(plan, subscription_id),
        })
        .collect()
}

pub fn run(plan: &Plan, subscription_id: &SubscriptionId, printer: &Printer) -> Result<()> {
    printer.print_resources(&planned_steps(plan, subscription_id))
}
