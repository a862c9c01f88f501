//! Aggregation of parsed payloads into a single report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::{Issue, IssueType, Metrics, QualityCategory, QualityGateStatus, Severity};
use crate::error::{Result, SonarGateError};

const SECURITY_PATTERNS: [&str; 6] = [
    "hardcoded",
    "password",
    "secret",
    "credential",
    "token",
    "key",
];
const RELIABILITY_PATTERNS: [&str; 5] = ["null", "npe", "exception", "crash", "fail"];

/// Identifies the project a report describes and when it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    project_key: String,
    server_url: String,
    generated_at: DateTime<Utc>,
}

impl ReportContext {
    /// Build a context, trimming inputs and rejecting blank values.
    pub fn new(
        project_key: &str,
        server_url: &str,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let project_key = project_key.trim();
        if project_key.is_empty() {
            return Err(SonarGateError::Config("project key is required".to_string()));
        }
        let server_url = server_url.trim().trim_end_matches('/');
        if server_url.is_empty() {
            return Err(SonarGateError::Config("server url is required".to_string()));
        }
        Ok(Self {
            project_key: project_key.to_string(),
            server_url: server_url.to_string(),
            generated_at,
        })
    }

    /// Project key on the analysis service.
    pub fn project_key(&self) -> &str {
        &self.project_key
    }

    /// Base URL of the analysis service, without trailing slash.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Time the report was generated.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// The same project and server, stamped with a new generation time.
    pub fn with_generated_at(self, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            ..self
        }
    }

    /// Link to the project dashboard.
    pub fn dashboard_url(&self) -> String {
        format!("{}/dashboard?id={}", self.server_url, self.project_key)
    }
}

/// Detail of a blocker or critical issue, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDetail {
    /// Blocker or critical.
    pub severity: Severity,
    /// Rule key.
    pub rule: String,
    /// Issue message.
    pub message: String,
    /// File path without the project prefix.
    pub file: String,
    /// Line number, if known.
    pub line: Option<u64>,
}

/// Issue counts for a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSummary {
    total: usize,
    new_issues: usize,
    by_severity: BTreeMap<Severity, usize>,
    by_type: BTreeMap<IssueType, usize>,
    by_category: BTreeMap<QualityCategory, usize>,
    critical_issues: Vec<IssueDetail>,
}

impl IssueSummary {
    /// Count issues by severity, type and quality category.
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.into_iter().map(|severity| (severity, 0)).collect();
        let mut by_type: BTreeMap<IssueType, usize> =
            IssueType::ALL.into_iter().map(|kind| (kind, 0)).collect();
        let mut by_category: BTreeMap<QualityCategory, usize> = QualityCategory::ALL
            .into_iter()
            .map(|category| (category, 0))
            .collect();
        let mut new_issues = 0usize;
        let mut critical_issues = Vec::new();

        for issue in issues {
            if let Some(severity) = issue.severity {
                *by_severity.entry(severity).or_insert(0) += 1;
            }
            if let Some(kind) = issue.issue_type {
                *by_type.entry(kind).or_insert(0) += 1;
            }
            *by_category.entry(categorize(issue)).or_insert(0) += 1;
            if issue.is_new {
                new_issues += 1;
            }
            if let Some(severity @ (Severity::Blocker | Severity::Critical)) = issue.severity {
                critical_issues.push(IssueDetail {
                    severity,
                    rule: issue.rule.clone(),
                    message: issue.message.clone(),
                    file: issue.file_name().to_string(),
                    line: issue.line,
                });
            }
        }

        Self {
            total: issues.len(),
            new_issues,
            by_severity,
            by_type,
            by_category,
            critical_issues,
        }
    }

    /// Number of issues in the payload, classified or not.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of issues flagged as new code.
    pub fn new_issues(&self) -> usize {
        self.new_issues
    }

    /// Count for a single severity.
    pub fn severity_count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    /// Count for a single issue type.
    pub fn type_count(&self, kind: IssueType) -> usize {
        self.by_type.get(&kind).copied().unwrap_or(0)
    }

    /// Count for a single quality category.
    pub fn category_count(&self, category: QualityCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }

    /// All severity buckets, most severe first.
    pub fn by_severity(&self) -> &BTreeMap<Severity, usize> {
        &self.by_severity
    }

    /// All type buckets.
    pub fn by_type(&self) -> &BTreeMap<IssueType, usize> {
        &self.by_type
    }

    /// All category buckets.
    pub fn by_category(&self) -> &BTreeMap<QualityCategory, usize> {
        &self.by_category
    }

    /// Blocker and critical issues in payload order.
    pub fn critical_issues(&self) -> &[IssueDetail] {
        &self.critical_issues
    }
}

/// Normalized point-in-time view of one project's analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    context: ReportContext,
    metrics: Metrics,
    issues: IssueSummary,
    quality_gate: QualityGateStatus,
}

impl Report {
    /// Combine parsed inputs into a report.
    pub fn aggregate(
        context: ReportContext,
        metrics: Metrics,
        issues: &[Issue],
        quality_gate: QualityGateStatus,
    ) -> Self {
        Self {
            context,
            metrics,
            issues: IssueSummary::from_issues(issues),
            quality_gate,
        }
    }

    /// Project and timestamp information.
    pub fn context(&self) -> &ReportContext {
        &self.context
    }

    /// Recognized metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Issue counts.
    pub fn issues(&self) -> &IssueSummary {
        &self.issues
    }

    /// Quality gate status.
    pub fn quality_gate(&self) -> QualityGateStatus {
        self.quality_gate
    }

    /// Number of blocker issues.
    pub fn blocker_count(&self) -> usize {
        self.issues.severity_count(Severity::Blocker)
    }

    /// Number of critical issues.
    pub fn critical_count(&self) -> usize {
        self.issues.severity_count(Severity::Critical)
    }
}

/// Assign an issue to a quality category.
///
/// The type decides when it is recognized; otherwise the rule key and message
/// are matched against security, then reliability keywords.
pub fn categorize(issue: &Issue) -> QualityCategory {
    match issue.issue_type {
        Some(IssueType::Bug) => return QualityCategory::Reliability,
        Some(IssueType::Vulnerability) => return QualityCategory::Security,
        Some(IssueType::CodeSmell) => return QualityCategory::Maintainability,
        None => {}
    }

    let rule = issue.rule.to_lowercase();
    let message = issue.message.to_lowercase();
    let mentions = |pattern: &&str| rule.contains(*pattern) || message.contains(*pattern);

    if SECURITY_PATTERNS.iter().any(mentions) {
        QualityCategory::Security
    } else if RELIABILITY_PATTERNS.iter().any(mentions) {
        QualityCategory::Reliability
    } else {
        QualityCategory::Maintainability
    }
}
