//! Per-layer character limit check.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::{Config, CountMode, UntaggedPolicy};
use crate::error::{CheckResult, HostResult};
use crate::host::{Host, NodeId};
use crate::limit::LimitPattern;
use crate::registry::{FlagRegistry, MarkerChange};

/// Result of checking one text layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The layer name carries no limit tag.
    Untagged {
        /// Whether a leftover marker was removed.
        cleared: bool,
    },
    /// The content fits the declared limit.
    WithinLimit {
        /// Declared limit.
        limit: usize,
        /// Measured content length.
        length: usize,
        /// Whether a marker from an earlier run was removed.
        cleared: bool,
    },
    /// The content is longer than the declared limit.
    OverLimit {
        /// Declared limit.
        limit: usize,
        /// Measured content length.
        length: usize,
        /// `length - limit`, always positive.
        excess: usize,
        /// The marker now flagging the layer.
        marker: NodeId,
        /// Whether the marker was created by this check.
        created: bool,
    },
}

impl CheckOutcome {
    /// Returns `true` if the layer is flagged after the check.
    pub const fn is_flagged(&self) -> bool {
        matches!(self, Self::OverLimit { .. })
    }
}

/// Tally of outcomes across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CheckTally {
    /// Text layers visited.
    pub checked: usize,
    /// Text layers carrying a limit tag.
    pub tagged: usize,
    /// Text layers over their limit.
    pub flagged: usize,
    /// Markers created during the run.
    pub created: usize,
    /// Markers removed during the run.
    pub cleared: usize,
}

impl CheckTally {
    /// Fold one outcome into the tally.
    pub fn record(&mut self, outcome: &CheckOutcome) {
        self.checked += 1;
        match outcome {
            CheckOutcome::Untagged { cleared } => {
                if *cleared {
                    self.cleared += 1;
                }
            }
            CheckOutcome::WithinLimit { cleared, .. } => {
                self.tagged += 1;
                if *cleared {
                    self.cleared += 1;
                }
            }
            CheckOutcome::OverLimit { created, .. } => {
                self.tagged += 1;
                self.flagged += 1;
                if *created {
                    self.created += 1;
                }
            }
        }
    }
}

/// Compares text layers against their declared limits and reconciles markers.
#[derive(Debug, Clone)]
pub struct Checker<'a> {
    pattern: LimitPattern,
    registry: FlagRegistry<'a>,
    untagged: UntaggedPolicy,
    count_mode: CountMode,
}

impl<'a> Checker<'a> {
    /// Build a checker from `config`.
    pub fn new(config: &'a Config) -> CheckResult<Self> {
        config.validate()?;
        Ok(Self {
            pattern: LimitPattern::new(&config.limit)?,
            registry: FlagRegistry::new(&config.flag),
            untagged: config.untagged,
            count_mode: config.count_mode,
        })
    }

    /// Check a single text layer and bring its marker up to date.
    #[tracing::instrument(level = "debug", skip_all, fields(text = %text))]
    pub fn check<H: Host + ?Sized>(
        &self,
        host: &mut H,
        text: &NodeId,
    ) -> HostResult<CheckOutcome> {
        let name = host.name(text)?;
        let Some(limit) = self.pattern.parse(&name) else {
            return self.check_untagged(host, text);
        };

        let length = self.count_mode.measure(&host.characters(text)?);
        if length <= limit {
            let cleared = self.registry.unflag(host, text)?;
            tracing::debug!(limit, length, cleared, "within limit");
            return Ok(CheckOutcome::WithinLimit {
                limit,
                length,
                cleared,
            });
        }

        let excess = length - limit;
        let change = self.registry.flag(host, text, excess)?;
        tracing::debug!(limit, length, excess, "over limit");
        let created = matches!(change, MarkerChange::Created(_));
        let (MarkerChange::Created(marker) | MarkerChange::Reused(marker)) = change;
        Ok(CheckOutcome::OverLimit {
            limit,
            length,
            excess,
            marker,
            created,
        })
    }

    fn check_untagged<H: Host + ?Sized>(
        &self,
        host: &mut H,
        text: &NodeId,
    ) -> HostResult<CheckOutcome> {
        if self.untagged == UntaggedPolicy::Keep {
            return Ok(CheckOutcome::Untagged { cleared: false });
        }
        // Only layers that were flagged before carry a back-reference; leave
        // the data of every other untagged layer untouched.
        if host.plugin_data(text, self.registry.data_key())?.is_empty() {
            return Ok(CheckOutcome::Untagged { cleared: false });
        }
        let cleared = self.registry.unflag(host, text)?;
        tracing::debug!(cleared, "limit tag removed, marker cleared");
        Ok(CheckOutcome::Untagged { cleared })
    }
}
