use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::checker::{AvailabilityChecker, CheckerView};
use super::domain::{CheckState, CheckerConfig};

/// Composition options covering both the accordion and the embedded layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetOptions {
    #[serde(default)]
    pub initially_expanded: bool,
    #[serde(default = "default_collapsible")]
    pub collapsible: bool,
}

fn default_collapsible() -> bool {
    true
}

impl WidgetOptions {
    /// Collapsed accordion with a header toggle.
    pub const fn accordion() -> Self {
        Self {
            initially_expanded: false,
            collapsible: true,
        }
    }

    /// Always-open panel without collapse chrome.
    pub const fn embedded() -> Self {
        Self {
            initially_expanded: true,
            collapsible: false,
        }
    }
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self::accordion()
    }
}

/// Visibility layered over an [`AvailabilityChecker`].
#[derive(Debug, Clone)]
pub struct IntakeWidget {
    options: WidgetOptions,
    expanded: bool,
    checker: AvailabilityChecker,
}

impl IntakeWidget {
    pub fn new(options: WidgetOptions, config: CheckerConfig) -> Self {
        Self {
            options,
            expanded: options.initially_expanded || !options.collapsible,
            checker: AvailabilityChecker::new(config),
        }
    }

    pub fn options(&self) -> WidgetOptions {
        self.options
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn checker(&self) -> &AvailabilityChecker {
        &self.checker
    }

    pub fn checker_mut(&mut self) -> &mut AvailabilityChecker {
        &mut self.checker
    }

    /// Header click. Settled results are discarded so the widget reopens on
    /// the address step; a running check keeps going while hidden.
    pub fn toggle(&mut self) -> bool {
        if !self.options.collapsible {
            return self.expanded;
        }

        if self.checker.state().is_settled() {
            if let Err(err) = self.checker.reset() {
                warn!(error = %err, "reset on toggle failed");
            }
        }
        self.expanded = !self.expanded;
        debug!(
            expanded = self.expanded,
            state = self.checker.state().label(),
            "widget toggled"
        );
        self.expanded
    }

    pub fn view(&self) -> WidgetView {
        WidgetView {
            options: self.options,
            expanded: self.expanded,
            checker: self.checker.view(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetView {
    pub options: WidgetOptions,
    pub expanded: bool,
    #[serde(flatten)]
    pub checker: CheckerView,
}

impl WidgetView {
    pub fn state(&self) -> CheckState {
        self.checker.state
    }
}
