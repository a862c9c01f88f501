//! CI decision policy.
//!
//! The policy is an ordered list of rules. The first rule that matches decides
//! the verdict and supplies the only reason; later rules are never consulted.
//! A report no rule matches passes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::Report;

/// CI verdict for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Promote the change.
    Pass,
    /// Promote the change, but flag it.
    Warn,
    /// Block the change.
    Fail,
}

impl Verdict {
    /// Upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the reason that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    verdict: Verdict,
    reasons: Vec<String>,
}

impl Decision {
    fn new(verdict: Verdict, reason: String) -> Self {
        Self {
            verdict,
            reasons: vec![reason],
        }
    }

    /// The verdict.
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Reasons for the verdict, in order.
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Process exit code when exit-code reporting is requested.
    ///
    /// Only `FAIL` maps to a failing code; `WARN` is treated as success.
    pub fn exit_code(&self) -> u8 {
        match self.verdict {
            Verdict::Fail => 1,
            Verdict::Pass | Verdict::Warn => 0,
        }
    }
}

struct DecisionRule {
    name: &'static str,
    evaluate: fn(&Report) -> Option<(Verdict, String)>,
}

const RULES: [DecisionRule; 3] = [
    DecisionRule {
        name: "quality_gate",
        evaluate: quality_gate_rule,
    },
    DecisionRule {
        name: "blocker_issues",
        evaluate: blocker_rule,
    },
    DecisionRule {
        name: "critical_issues",
        evaluate: critical_rule,
    },
];

fn quality_gate_rule(report: &Report) -> Option<(Verdict, String)> {
    let status = report.quality_gate();
    (!status.is_passing())
        .then(|| (Verdict::Fail, format!("quality gate failed (status: {status})")))
}

fn blocker_rule(report: &Report) -> Option<(Verdict, String)> {
    let count = report.blocker_count();
    (count > 0).then(|| (Verdict::Fail, format!("{count} blocker issue(s) found")))
}

fn critical_rule(report: &Report) -> Option<(Verdict, String)> {
    let count = report.critical_count();
    (count > 0).then(|| (Verdict::Warn, format!("{count} critical issue(s) found")))
}

fn default_pass() -> (Verdict, String) {
    (Verdict::Pass, "no blocking issues found".to_string())
}

/// Apply the decision policy to a report.
pub fn decide(report: &Report) -> Decision {
    for rule in &RULES {
        if let Some((verdict, reason)) = (rule.evaluate)(report) {
            log::debug!("decision rule {} matched: {verdict}", rule.name);
            return Decision::new(verdict, reason);
        }
    }
    let (verdict, reason) = default_pass();
    log::debug!("no decision rule matched: {verdict}");
    Decision::new(verdict, reason)
}

/// Boolean CI flags for structured output.
///
/// These are derived directly from the report rather than from the verdict:
/// `should_fail` ignores critical issues, so a `WARN` verdict reports
/// `should_fail == false` and `is_passing == true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiFlags {
    /// Gate is not OK or blockers exist.
    pub should_fail: bool,
    /// Critical issues exist.
    pub has_warnings: bool,
    /// Gate is OK and no blockers exist.
    pub is_passing: bool,
}

impl CiFlags {
    /// Compute the flags for a report.
    pub fn from_report(report: &Report) -> Self {
        let gate_ok = report.quality_gate().is_passing();
        let blockers = report.blocker_count();
        Self {
            should_fail: !gate_ok || blockers > 0,
            has_warnings: report.critical_count() > 0,
            is_passing: gate_ok && blockers == 0,
        }
    }
}
