use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::{cell::RefCell, ops::Deref, time::Duration};
use vmprov_client::{
    provision::{Observer, Step},
    ArmResource, Error,
};

use crate::utils::LOG_PREFIX_INFO;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Shows a spinner on stderr while a provisioning step is running.
///
/// The spinner ticks on its own thread, so it keeps moving while the main thread is blocked
/// waiting on Azure.
#[derive(Default)]
pub struct StepProgress {
    current: RefCell<Option<ProgressBar>>,
}

impl StepProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&self) {
        if let Some(progress_bar) = self.current.borrow_mut().take() {
            progress_bar.finish_and_clear();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    let template = format!(
        "{} {{spinner:.green}} [{{elapsed_precise}}] {{msg}}",
        LOG_PREFIX_INFO.deref()
    );
    ProgressStyle::default_spinner()
        .template(&template)
        .unwrap_or_else(|error| {
            debug!("Invalid progress template: {}", error);
            ProgressStyle::default_spinner()
        })
}

impl Observer for StepProgress {
    fn started(&self, step: Step, name: &str) {
        self.clear();
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(spinner_style());
        progress_bar.set_message(format!("Provisioning {step} {name}"));
        progress_bar.enable_steady_tick(TICK_INTERVAL);
        *self.current.borrow_mut() = Some(progress_bar);
    }

    fn finished(&self, _step: Step, _resource: &dyn ArmResource) {
        self.clear();
    }

    fn failed(&self, _step: Step, _error: &Error) {
        self.clear();
    }
}

impl Drop for StepProgress {
    fn drop(&mut self) {
        self.clear();
    }
}
