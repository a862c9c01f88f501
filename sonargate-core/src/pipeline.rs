//! End-to-end evaluation of raw payloads.

use std::fmt;

use crate::aggregate::{Report, ReportContext};
use crate::decision::{Decision, decide};
use crate::parser::{parse_issues, parse_metrics, parse_quality_gate};

/// The three payloads fetched from the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// `measures/component`.
    Metrics,
    /// `issues/search`.
    Issues,
    /// `qualitygates/project_status`.
    QualityGate,
}

impl PayloadKind {
    /// Every payload kind, in fetch order.
    pub const ALL: [PayloadKind; 3] = [
        PayloadKind::Metrics,
        PayloadKind::Issues,
        PayloadKind::QualityGate,
    ];
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Metrics => "metrics",
            Self::Issues => "issues",
            Self::QualityGate => "quality gate",
        };
        f.write_str(label)
    }
}

/// Raw response bodies. `None` means the fetch failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPayloads {
    /// Metrics response body.
    pub metrics: Option<String>,
    /// Issues response body.
    pub issues: Option<String>,
    /// Quality gate response body.
    pub quality_gate: Option<String>,
}

impl RawPayloads {
    /// Store the body for one payload kind.
    pub fn set(&mut self, kind: PayloadKind, body: Option<String>) {
        match kind {
            PayloadKind::Metrics => self.metrics = body,
            PayloadKind::Issues => self.issues = body,
            PayloadKind::QualityGate => self.quality_gate = body,
        }
    }
}

/// A report and the decision derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The aggregated report.
    pub report: Report,
    /// The CI decision for the report.
    pub decision: Decision,
}

/// Parse, aggregate and decide over a set of raw payloads.
pub fn evaluate(context: ReportContext, payloads: &RawPayloads) -> Evaluation {
    let metrics = parse_metrics(payloads.metrics.as_deref());
    let issues = parse_issues(payloads.issues.as_deref());
    let quality_gate = parse_quality_gate(payloads.quality_gate.as_deref());

    let report = Report::aggregate(context, metrics, &issues, quality_gate);
    let decision = decide(&report);
    log::info!(
        "{}: quality gate {}, {} issue(s), verdict {}",
        report.context().project_key(),
        report.quality_gate(),
        report.issues().total(),
        decision.verdict()
    );
    Evaluation { report, decision }
}
