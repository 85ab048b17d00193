use colored::Colorize;
use config_tree_core::TreePath;
use serde::Serialize;

use crate::context::ChangeKind;
use crate::store::{StoreCall, StoreOp};

/// Outcome of replaying one canonical element.
#[derive(Debug, Clone, Serialize)]
pub struct ElementOutcome {
    pub path: TreePath,
    /// `None` when neither tree carries the element.
    pub change: Option<ChangeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ElementOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything an `apply` run did, in issue order.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub profile: String,
    pub profile_source: String,
    pub elements: Vec<ElementOutcome>,
    pub calls: Vec<StoreCall>,
}

impl ApplyReport {
    pub fn failures(&self) -> usize {
        self.elements.iter().filter(|e| !e.is_ok()).count()
    }

    pub fn mutations(&self) -> usize {
        self.calls.iter().filter(|c| c.op.is_mutation()).count()
    }
}

/// One line per store call. Reads are shown only when `with_reads` is set.
pub fn render_journal(calls: &[StoreCall], with_reads: bool) -> String {
    let mut out = Vec::new();
    for call in calls {
        if call.op == StoreOp::Read && !with_reads {
            continue;
        }
        let op = format!("{:<11}", call.op.as_str());
        let op = match call.op {
            StoreOp::Read => op.dimmed(),
            StoreOp::Put | StoreOp::Merge => op.green(),
            StoreOp::SafeMerge => op.yellow(),
            StoreOp::Delete | StoreOp::SafeDelete => op.red(),
        };
        out.push(format!("{op} {}", call.path));
    }
    out.join("\n")
}

pub fn render_outcomes(elements: &[ElementOutcome]) -> String {
    let mut out = Vec::new();
    for element in elements {
        let change = element
            .change
            .map(|kind| format!("{kind:?}").to_lowercase())
            .unwrap_or_else(|| "none".to_string());
        match &element.error {
            None => out.push(format!("{} {change} {}", "OK".green(), element.path)),
            Some(err) => out.push(format!(
                "{} {change} {}: {err}",
                "FAILED".red().bold(),
                element.path
            )),
        }
    }
    out.join("\n")
}

pub fn render_summary(report: &ApplyReport) -> String {
    format!(
        "profile={} ({}) elements={} failed={} mutations={}",
        report.profile,
        report.profile_source,
        report.elements.len(),
        report.failures(),
        report.mutations()
    )
    .cyan()
    .to_string()
}

#[cfg(test)]
mod tests {
    use config_tree_core::{ConfigNode, TreePath};

    use super::{render_journal, render_outcomes, ApplyReport, ElementOutcome};
    use crate::context::ChangeKind;
    use crate::store::{StoreCall, StoreOp};

    fn calls() -> Vec<StoreCall> {
        let path: TreePath = "/bgp/instance[instance-name=default]".parse().expect("path");
        vec![
            StoreCall {
                op: StoreOp::Read,
                path: path.clone(),
                node: None,
            },
            StoreCall {
                op: StoreOp::Merge,
                path,
                node: Some(ConfigNode::new("instance")),
            },
        ]
    }

    #[test]
    fn journal_hides_reads_unless_asked() {
        colored::control::set_override(false);
        let quiet = render_journal(&calls(), false);
        assert_eq!(quiet.lines().count(), 1);
        assert!(quiet.starts_with("merge"));
        assert_eq!(render_journal(&calls(), true).lines().count(), 2);
    }

    #[test]
    fn report_serializes_paths_as_strings() {
        let report = ApplyReport {
            profile: "xr6".to_string(),
            profile_source: "embedded".to_string(),
            elements: vec![ElementOutcome {
                path: "/network-instances/network-instance[name=default]"
                    .parse()
                    .expect("path"),
                change: Some(ChangeKind::Create),
                error: None,
            }],
            calls: calls(),
        };
        assert_eq!(report.mutations(), 1);
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(
            json["elements"][0]["path"],
            "/network-instances/network-instance[name=default]"
        );
        assert_eq!(json["elements"][0]["change"], "create");
        assert_eq!(json["calls"][1]["op"], "merge");
        assert!(json["calls"][0].get("node").is_none());
    }

    #[test]
    fn failed_elements_are_flagged() {
        colored::control::set_override(false);
        let text = render_outcomes(&[ElementOutcome {
            path: TreePath::root().child("x"),
            change: Some(ChangeKind::Delete),
            error: Some("boom".to_string()),
        }]);
        assert_eq!(text, "FAILED delete /x: boom");
    }
}
