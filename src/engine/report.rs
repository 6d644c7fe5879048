// src/engine/report.rs

//! Human-readable summary of a runner invocation.

use std::fmt;

use crate::graph::{GroupOutcome, NodeOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub key: String,
    pub status: &'static str,
    pub detail: Option<String>,
    /// Whether the node ran as a post-run dependent.
    pub post_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub root: String,
    pub success: bool,
    pub faulted: bool,
    pub lines: Vec<ReportLine>,
}

impl RunReport {
    pub fn from_outcome(outcome: &GroupOutcome) -> Self {
        let mut lines = Vec::new();
        collect_lines(outcome, false, &mut lines);
        Self {
            root: outcome.root_key.clone(),
            success: outcome.is_success(),
            faulted: outcome.faulted,
            lines,
        }
    }

    pub fn line(&self, key: &str) -> Option<&ReportLine> {
        self.lines.iter().find(|l| l.key == key)
    }
}

fn collect_lines(outcome: &GroupOutcome, post_run: bool, lines: &mut Vec<ReportLine>) {
    // Dispatch order first, then whatever did not run.
    let mut keys: Vec<&String> = outcome.dispatch_order.iter().collect();
    for key in outcome.nodes.keys() {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    for key in keys {
        let Some(node) = outcome.nodes.get(key) else {
            continue;
        };
        let (status, detail) = match node {
            NodeOutcome::Completed { reused: false, .. } => ("completed", None),
            NodeOutcome::Completed { reused: true, .. } => ("reused", None),
            NodeOutcome::Faulted(err) => ("faulted", Some(err.to_string())),
            NodeOutcome::Skipped { dependency } => {
                ("skipped", Some(format!("dependency '{dependency}' faulted")))
            }
        };
        if lines.iter().any(|l| &l.key == key) {
            continue;
        }
        lines.push(ReportLine {
            key: key.clone(),
            status,
            detail,
            post_run,
        });
    }

    for nested in outcome.post_run.iter().flatten() {
        collect_lines(nested, true, lines);
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "root '{}': {}",
            self.root,
            if self.success { "succeeded" } else { "failed" }
        )?;
        for line in &self.lines {
            let marker = if line.post_run { " (post-run)" } else { "" };
            match &line.detail {
                Some(detail) => writeln!(f, "  - {}{}: {} ({})", line.key, marker, line.status, detail)?,
                None => writeln!(f, "  - {}{}: {}", line.key, marker, line.status)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::errors::GraphError;
    use crate::indexable::{IndexableRef, TaskOutput};

    fn completed(key: &str) -> NodeOutcome {
        let output: TaskOutput = Arc::new(IndexableRef::new(key));
        NodeOutcome::Completed {
            output,
            reused: false,
        }
    }

    #[test]
    fn lists_dispatched_nodes_first_then_skipped_ones() {
        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), completed("a"));
        nodes.insert(
            "b".to_string(),
            NodeOutcome::Skipped {
                dependency: "z".to_string(),
            },
        );
        nodes.insert(
            "z".to_string(),
            NodeOutcome::Faulted(Arc::new(std::io::Error::other("boom"))),
        );
        let outcome = GroupOutcome {
            root_key: "b".to_string(),
            root: Err(GraphError::DependencyFaulted {
                key: "b".to_string(),
                dependency: "z".to_string(),
            }),
            nodes,
            dispatch_order: vec!["z".to_string(), "a".to_string()],
            faulted: true,
            post_run: Vec::new(),
            hook_failures: Vec::new(),
        };

        let report = RunReport::from_outcome(&outcome);

        let keys: Vec<&str> = report.lines.iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "b"]);
        assert!(!report.success);
        assert_eq!(report.line("z").and_then(|l| l.detail.as_deref()), Some("boom"));

        let text = report.to_string();
        assert!(text.starts_with("root 'b': failed"));
        assert!(text.contains("  - b: skipped (dependency 'z' faulted)"));
    }
}
