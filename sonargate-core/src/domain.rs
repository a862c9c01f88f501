//! Domain entities for SonarGate.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder rendered for metrics the analysis service did not report.
pub const UNAVAILABLE: &str = "N/A";

static UNAVAILABLE_VALUE: MetricValue = MetricValue::Unavailable;

/// Metrics requested from the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    /// Non-comment lines of code.
    Ncloc,
    /// Number of bugs.
    Bugs,
    /// Number of vulnerabilities.
    Vulnerabilities,
    /// Number of code smells.
    CodeSmells,
    /// Maintainability rating (1.0 to 5.0).
    SqaleRating,
    /// Reliability rating (1.0 to 5.0).
    ReliabilityRating,
    /// Security rating (1.0 to 5.0).
    SecurityRating,
    /// Line coverage percentage.
    Coverage,
    /// Duplicated lines percentage.
    DuplicatedLinesDensity,
}

impl MetricKey {
    /// Every recognized metric key, in request order.
    pub const ALL: [MetricKey; 9] = [
        MetricKey::Ncloc,
        MetricKey::Bugs,
        MetricKey::Vulnerabilities,
        MetricKey::CodeSmells,
        MetricKey::SqaleRating,
        MetricKey::ReliabilityRating,
        MetricKey::SecurityRating,
        MetricKey::Coverage,
        MetricKey::DuplicatedLinesDensity,
    ];

    /// Wire name of the metric.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ncloc => "ncloc",
            Self::Bugs => "bugs",
            Self::Vulnerabilities => "vulnerabilities",
            Self::CodeSmells => "code_smells",
            Self::SqaleRating => "sqale_rating",
            Self::ReliabilityRating => "reliability_rating",
            Self::SecurityRating => "security_rating",
            Self::Coverage => "coverage",
            Self::DuplicatedLinesDensity => "duplicated_lines_density",
        }
    }

    /// Resolve a wire name to a recognized metric key.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    /// Comma-separated list of every recognized key, as sent in `metricKeys`.
    pub fn query_list() -> String {
        Self::ALL
            .iter()
            .map(MetricKey::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Value of a single metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricValue {
    /// The service reported this value.
    Available(String),
    /// The value was missing, malformed, or never fetched.
    Unavailable,
}

impl MetricValue {
    /// String form of the value, `N/A` when unavailable.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available(value) => value,
            Self::Unavailable => UNAVAILABLE,
        }
    }

    /// Whether the service reported this value.
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full set of recognized metrics. Every key is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    values: BTreeMap<MetricKey, MetricValue>,
}

impl Metrics {
    /// A metric set where every value is unavailable.
    pub fn unavailable() -> Self {
        let values = MetricKey::ALL
            .into_iter()
            .map(|key| (key, MetricValue::Unavailable))
            .collect();
        Self { values }
    }

    /// Record a reported value for a key.
    pub fn with_value(mut self, key: MetricKey, value: impl Into<String>) -> Self {
        self.values.insert(key, MetricValue::Available(value.into()));
        self
    }

    /// Look up a metric value.
    pub fn get(&self, key: MetricKey) -> &MetricValue {
        self.values.get(&key).unwrap_or(&UNAVAILABLE_VALUE)
    }

    /// Iterate metrics in key order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, &MetricValue)> {
        self.values.iter().map(|(key, value)| (*key, value))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// Issue severity, most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Must be fixed before release.
    Blocker,
    /// High impact finding.
    Critical,
    /// Moderate impact finding.
    Major,
    /// Low impact finding.
    Minor,
    /// Informational finding.
    Info,
}

impl Severity {
    /// Every severity, most severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Blocker,
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
        Severity::Info,
    ];

    /// Wire name of the severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocker => "BLOCKER",
            Self::Critical => "CRITICAL",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Info => "INFO",
        }
    }

    /// Exact match on the wire name.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|severity| severity.as_str() == value)
    }
}

/// Finding type, orthogonal to severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// Incorrect behaviour.
    Bug,
    /// Security weakness.
    Vulnerability,
    /// Maintainability problem.
    CodeSmell,
}

impl IssueType {
    /// Every issue type.
    pub const ALL: [IssueType; 3] = [
        IssueType::Bug,
        IssueType::Vulnerability,
        IssueType::CodeSmell,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "BUG",
            Self::Vulnerability => "VULNERABILITY",
            Self::CodeSmell => "CODE_SMELL",
        }
    }

    /// Exact match on the wire name.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

/// Quality dimension an issue affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityCategory {
    /// Bugs, crashes, exceptions.
    Reliability,
    /// Vulnerabilities, leaked secrets.
    Security,
    /// Code smells, complexity.
    Maintainability,
}

impl QualityCategory {
    /// Every category.
    pub const ALL: [QualityCategory; 3] = [
        QualityCategory::Reliability,
        QualityCategory::Security,
        QualityCategory::Maintainability,
    ];

    /// Display name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reliability => "RELIABILITY",
            Self::Security => "SECURITY",
            Self::Maintainability => "MAINTAINABILITY",
        }
    }
}

/// Quality gate verdict reported by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityGateStatus {
    /// The gate passed.
    Ok,
    /// The gate failed.
    Error,
    /// The status could not be determined.
    Unknown,
}

impl QualityGateStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Map a reported status string. Anything unrecognized is `Unknown`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "OK" => Self::Ok,
            "ERROR" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Only `OK` passes.
    pub fn is_passing(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for QualityGateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open issue as reported by the analysis service.
///
/// `severity` and `issue_type` are `None` when the payload carried a value
/// outside the recognized set, or when the entry could not be decoded at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issue {
    /// Recognized severity, if any.
    pub severity: Option<Severity>,
    /// Recognized type, if any.
    pub issue_type: Option<IssueType>,
    /// Rule key that raised the issue.
    pub rule: String,
    /// Human-readable message.
    pub message: String,
    /// Component key (`project:path/to/file`).
    pub component: String,
    /// Line number, when the issue is attached to one.
    pub line: Option<u64>,
    /// Whether the issue was introduced in the new code period.
    pub is_new: bool,
}

impl Issue {
    /// Create a classified issue with no detail fields.
    pub fn new(severity: Severity, issue_type: IssueType) -> Self {
        Self {
            severity: Some(severity),
            issue_type: Some(issue_type),
            ..Self::default()
        }
    }

    /// File portion of the component key.
    pub fn file_name(&self) -> &str {
        self.component.rsplit(':').next().unwrap_or_default()
    }
}
