//! Run controller: the single entry point of a check.
//!
//! A run checks every text layer under the current selection, or the whole
//! current page when nothing is selected, then shows one status message.
//! [`execute`] is what a host calls; it owns the failure boundary and the
//! close signal. [`run`] is the same work without either.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::check::{CheckTally, Checker};
use crate::config::Config;
use crate::error::CheckResult;
use crate::host::{Host, NodeId};
use crate::status::{StatusMessage, status_message};
use crate::walk::walk_text_nodes;

/// Where a run started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The selected layers and their descendants.
    Selection,
    /// The entire current page.
    Page,
}

/// Aggregate outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    /// Whether the selection or the whole page was checked.
    pub scope: Scope,
    /// Number of traversal roots.
    pub roots: usize,
    /// Per-outcome counts.
    pub tally: CheckTally,
    /// The message shown to the user.
    pub status: StatusMessage,
}

impl RunReport {
    /// Text layers over their limit at the end of the run.
    pub const fn flagged(&self) -> usize {
        self.tally.flagged
    }
}

/// Check the selection (or the page) and notify the user of the result.
///
/// Mutations made before an error stay in place; nothing is rolled back.
#[tracing::instrument(skip_all)]
pub fn run<H: Host + ?Sized>(host: &mut H, config: &Config) -> CheckResult<RunReport> {
    let checker = Checker::new(config)?;

    let selection = host.selection();
    let (scope, roots) = if selection.is_empty() {
        (Scope::Page, vec![host.current_page()])
    } else {
        (Scope::Selection, selection)
    };
    tracing::debug!(?scope, roots = roots.len(), "starting run");

    let mut tally = CheckTally::default();
    for root in &roots {
        // A selected marker can be removed by the check of an earlier root.
        if host.node_by_id(root.as_str()).is_none() {
            tracing::debug!(root = %root, "selected node no longer exists, skipping");
            continue;
        }
        check_subtree(host, &checker, root.clone(), &mut tally)?;
    }

    let status = status_message(tally.flagged, &config.notify);
    host.notify(&status.text, status.timeout);
    tracing::info!(
        checked = tally.checked,
        tagged = tally.tagged,
        flagged = tally.flagged,
        created = tally.created,
        cleared = tally.cleared,
        "run complete"
    );

    Ok(RunReport {
        scope,
        roots: roots.len(),
        tally,
        status,
    })
}

fn check_subtree<H: Host + ?Sized>(
    host: &mut H,
    checker: &Checker<'_>,
    root: NodeId,
    tally: &mut CheckTally,
) -> CheckResult<()> {
    walk_text_nodes(host, root, |host, text| -> CheckResult<()> {
        let outcome = checker.check(host, text)?;
        tally.record(&outcome);
        Ok(())
    })?;
    Ok(())
}

/// Host entry point: [`run`], then close, whatever happened.
///
/// A failure is logged to the diagnostic channel and returned; the user sees
/// no status message for a failed run.
pub fn execute<H: Host + ?Sized>(host: &mut H, config: &Config) -> CheckResult<RunReport> {
    let result = run(host, config);
    if let Err(ref err) = result {
        tracing::error!(error = %err, "check run failed");
    }
    host.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CheckError, HostError};
    use crate::host::Bounds;
    use crate::memory::MemoryDocument;

    #[test]
    fn empty_page_reports_success() {
        let mut doc = MemoryDocument::new();

        let report = execute(&mut doc, &Config::default()).unwrap();

        assert_eq!(report.scope, Scope::Page);
        assert_eq!(report.roots, 1);
        assert_eq!(report.flagged(), 0);
        assert_eq!(doc.notifications().len(), 1);
        assert_eq!(doc.close_count(), 1);
    }

    #[test]
    fn selection_limits_the_walk() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let left = doc.add_frame(&page, "left", Bounds::default());
        let right = doc.add_frame(&page, "right", Bounds::default());
        doc.add_text(&left, "a [CC:1]", "too long", Bounds::default());
        doc.add_text(&right, "b [CC:1]", "too long", Bounds::default());
        doc.select([left]);

        let report = execute(&mut doc, &Config::default()).unwrap();

        assert_eq!(report.scope, Scope::Selection);
        assert_eq!(report.tally.checked, 1);
        assert_eq!(report.flagged(), 1);
    }

    #[test]
    fn each_selected_root_is_walked() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let roots: Vec<_> = (0..5)
            .map(|i| {
                let frame = doc.add_frame(&page, &format!("f{i}"), Bounds::default());
                doc.add_text(&frame, "t [CC:2]", "abc", Bounds::default());
                frame
            })
            .collect();
        doc.select(roots);

        let report = execute(&mut doc, &Config::default()).unwrap();

        assert_eq!(report.roots, 5);
        assert_eq!(report.flagged(), 5);
    }

    #[test]
    fn selected_marker_removed_mid_run_is_skipped() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let text = doc.add_text(&page, "t [CC:3]", "too long", Bounds::default());
        execute(&mut doc, &Config::default()).unwrap();
        let marker = doc.markers(&Config::default().flag.name_prefix).remove(0);

        doc.set_characters(&text, "ok");
        doc.select([text, marker.clone()]);
        let report = execute(&mut doc, &Config::default()).unwrap();

        assert_eq!(report.roots, 2);
        assert_eq!(report.tally.checked, 1);
        assert_eq!(report.tally.cleared, 1);
        assert!(doc.node(&marker).is_none());
        assert_eq!(doc.close_count(), 2);
    }

    #[test]
    fn failure_closes_without_status() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        let text = doc.add_text(&page, "t [CC:1]", "too long", Bounds::default());
        doc.make_read_only(&text);

        let err = execute(&mut doc, &Config::default()).unwrap_err();

        assert!(matches!(err, CheckError::Host(HostError::Rejected { .. })));
        assert!(doc.notifications().is_empty());
        assert_eq!(doc.close_count(), 1);
    }

    #[test]
    fn invalid_config_fails_before_touching_the_document() {
        let mut doc = MemoryDocument::new();
        let page = doc.page();
        doc.add_text(&page, "t [CC:1]", "too long", Bounds::default());
        let mut config = Config::default();
        config.limit.keyword = String::new();

        let err = execute(&mut doc, &config).unwrap_err();

        assert!(matches!(err, CheckError::Config(_)));
        assert!(doc.markers(&config.flag.name_prefix).is_empty());
        assert_eq!(doc.close_count(), 1);
    }
}
