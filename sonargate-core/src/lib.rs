#![deny(missing_docs)]
//! SonarGate core library.
//!
//! Turns raw analysis-service payloads into a normalized [`Report`], applies
//! the CI decision policy, and renders the result for build pipelines.

pub mod aggregate;
pub mod decision;
pub mod domain;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod render;

pub use aggregate::{IssueDetail, IssueSummary, Report, ReportContext, categorize};
pub use decision::{CiFlags, Decision, Verdict, decide};
pub use domain::{
    Issue, IssueType, MetricKey, MetricValue, Metrics, QualityCategory, QualityGateStatus,
    Severity, UNAVAILABLE,
};
pub use error::{Result, SonarGateError};
pub use parser::{parse_issues, parse_metrics, parse_quality_gate};
pub use pipeline::{Evaluation, PayloadKind, RawPayloads, evaluate};
pub use render::{rating_letter, render_json, render_markdown, render_text};
