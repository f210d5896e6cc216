//! End-of-run status message.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::NotifyConfig;

/// How the status message should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing exceeds its limit.
    Success,
    /// At least one layer exceeds its limit.
    Warning,
}

/// The single message shown to the user after a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusMessage {
    /// Message text.
    pub text: String,
    /// Requested display duration.
    pub timeout: Duration,
    /// Severity of the outcome.
    pub severity: Severity,
}

/// Build the status message for `flagged` over-limit layers.
pub fn status_message(flagged: usize, notify: &NotifyConfig) -> StatusMessage {
    if flagged == 0 {
        return StatusMessage {
            text: "Great! No layers exceed their character count.".to_string(),
            timeout: notify.short(),
            severity: Severity::Success,
        };
    }

    let text = if flagged == 1 {
        "1 layer exceeds its character limit. \
         Scroll to the top of your layer list for location."
            .to_string()
    } else {
        format!(
            "{flagged} layers exceed their character limits. \
             Scroll to the top of your layer list for location."
        )
    };
    StatusMessage {
        text,
        timeout: notify.long(),
        severity: Severity::Warning,
    }
}
