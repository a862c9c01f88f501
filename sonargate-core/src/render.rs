//! Report formatting utilities for SonarGate outputs.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::aggregate::{IssueDetail, Report};
use crate::decision::{CiFlags, Decision, Verdict};
use crate::domain::{IssueType, MetricKey, QualityCategory, Severity, UNAVAILABLE};
use crate::error::Result;

const RULE_WIDTH: usize = 64;
const MAX_LISTED_CRITICAL: usize = 5;

/// Map a numeric rating (`"1.0"` to `"5.0"`) to its letter grade.
///
/// Values outside the exact set are returned unchanged.
pub fn rating_letter(rating: &str) -> &str {
    match rating {
        "1.0" => "A",
        "2.0" => "B",
        "3.0" => "C",
        "4.0" => "D",
        "5.0" => "E",
        other => other,
    }
}

/// Render a report as a fixed-layout plain-text summary for CI logs.
pub fn render_text(report: &Report, decision: &Decision) -> String {
    let context = report.context();
    let metrics = report.metrics();
    let issues = report.issues();
    let gate = report.quality_gate();
    let rule = "=".repeat(RULE_WIDTH);

    let mut output = String::new();
    let _ = writeln!(output, "{rule}");
    let _ = writeln!(
        output,
        "{:^width$}",
        "SONARQUBE CI ANALYSIS SUMMARY",
        width = RULE_WIDTH
    );
    let _ = writeln!(output, "{rule}");
    let _ = writeln!(
        output,
        "Analysis Time: {}",
        context.generated_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(output, "Project: {}", context.project_key());
    let _ = writeln!(
        output,
        "Quality Gate: {gate} ({})",
        if gate.is_passing() { "passed" } else { "failed" }
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "CODE METRICS:");
    let _ = writeln!(
        output,
        "|-- Lines of Code: {}",
        metrics.get(MetricKey::Ncloc)
    );
    let _ = writeln!(
        output,
        "|-- Coverage: {}",
        percent(metrics.get(MetricKey::Coverage).as_str())
    );
    let _ = writeln!(
        output,
        "|-- Duplicated Lines: {}",
        percent(metrics.get(MetricKey::DuplicatedLinesDensity).as_str())
    );
    let _ = writeln!(output, "`-- Quality Ratings:");
    let _ = writeln!(
        output,
        "    |-- Maintainability: {}",
        rating_letter(metrics.get(MetricKey::SqaleRating).as_str())
    );
    let _ = writeln!(
        output,
        "    |-- Reliability: {}",
        rating_letter(metrics.get(MetricKey::ReliabilityRating).as_str())
    );
    let _ = writeln!(
        output,
        "    `-- Security: {}",
        rating_letter(metrics.get(MetricKey::SecurityRating).as_str())
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "ISSUES SUMMARY:");
    let _ = writeln!(output, "|-- Total Issues: {}", issues.total());
    let _ = writeln!(output, "|-- New Issues: {}", issues.new_issues());
    let _ = writeln!(output, "|-- By Quality Category:");
    append_buckets(
        &mut output,
        "|   ",
        QualityCategory::ALL.map(|category| (category.as_str(), issues.category_count(category))),
    );
    let _ = writeln!(output, "|-- By Severity:");
    append_buckets(
        &mut output,
        "|   ",
        Severity::ALL.map(|severity| (severity.as_str(), issues.severity_count(severity))),
    );
    let _ = writeln!(output, "`-- By Type:");
    append_buckets(
        &mut output,
        "    ",
        IssueType::ALL.map(|kind| (kind.as_str(), issues.type_count(kind))),
    );

    append_critical_issues(&mut output, issues.critical_issues());

    let _ = writeln!(output);
    let _ = writeln!(output, "CI/CD DECISION:");
    let _ = writeln!(output, "{}", decision_line(decision));
    let _ = writeln!(output);
    let _ = writeln!(output, "Dashboard: {}", context.dashboard_url());
    let _ = writeln!(output, "{rule}");
    output
}

/// Render a report as Markdown for merge request comments.
pub fn render_markdown(report: &Report, decision: &Decision) -> String {
    let context = report.context();
    let metrics = report.metrics();
    let issues = report.issues();

    let mut output = String::new();
    let _ = writeln!(output, "## SonarQube Analysis Report\n");
    let _ = writeln!(output, "### Quality Gate: {}\n", report.quality_gate());
    let _ = writeln!(output, "| Metric | Value |");
    let _ = writeln!(output, "|--------|-------|");
    let rows = [
        ("Lines of Code", metrics.get(MetricKey::Ncloc).as_str().to_string()),
        ("Coverage", percent(metrics.get(MetricKey::Coverage).as_str())),
        (
            "Duplicated Lines",
            percent(metrics.get(MetricKey::DuplicatedLinesDensity).as_str()),
        ),
        (
            "Maintainability",
            rating_letter(metrics.get(MetricKey::SqaleRating).as_str()).to_string(),
        ),
        (
            "Reliability",
            rating_letter(metrics.get(MetricKey::ReliabilityRating).as_str()).to_string(),
        ),
        (
            "Security",
            rating_letter(metrics.get(MetricKey::SecurityRating).as_str()).to_string(),
        ),
    ];
    for (label, value) in rows {
        let _ = writeln!(output, "| {label} | {value} |");
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "### Issues Summary\n");
    let _ = writeln!(output, "| Severity | Count |");
    let _ = writeln!(output, "|----------|-------|");
    for severity in Severity::ALL {
        let _ = writeln!(
            output,
            "| {} | {} |",
            severity.as_str(),
            issues.severity_count(severity)
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "**Total Issues:** {} | **New Issues:** {}\n",
        issues.total(),
        issues.new_issues()
    );
    let _ = writeln!(output, "**CI Decision:** {}\n", decision_line(decision));
    let _ = writeln!(output, "[View Full Report]({})", context.dashboard_url());
    output
}

/// Render a report as pretty-printed JSON.
pub fn render_json(report: &Report, decision: &Decision) -> Result<String> {
    let payload = JsonReport::new(report, decision);
    Ok(serde_json::to_string_pretty(&payload)?)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    timestamp: String,
    project: &'a str,
    quality_gate: JsonQualityGate,
    metrics: BTreeMap<&'static str, &'a str>,
    issues: JsonIssues<'a>,
    ci_decision: JsonDecision<'a>,
    dashboard_url: String,
}

#[derive(Serialize)]
struct JsonQualityGate {
    status: &'static str,
    passed: bool,
}

#[derive(Serialize)]
struct JsonIssues<'a> {
    total: usize,
    new: usize,
    by_severity: &'a BTreeMap<Severity, usize>,
    by_type: &'a BTreeMap<IssueType, usize>,
    by_category: &'a BTreeMap<QualityCategory, usize>,
}

#[derive(Serialize)]
struct JsonDecision<'a> {
    verdict: Verdict,
    reasons: &'a [String],
    #[serde(flatten)]
    flags: CiFlags,
}

impl<'a> JsonReport<'a> {
    fn new(report: &'a Report, decision: &'a Decision) -> Self {
        let context = report.context();
        let issues = report.issues();
        let gate = report.quality_gate();
        Self {
            timestamp: context.generated_at().to_rfc3339(),
            project: context.project_key(),
            quality_gate: JsonQualityGate {
                status: gate.as_str(),
                passed: gate.is_passing(),
            },
            metrics: report
                .metrics()
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect(),
            issues: JsonIssues {
                total: issues.total(),
                new: issues.new_issues(),
                by_severity: issues.by_severity(),
                by_type: issues.by_type(),
                by_category: issues.by_category(),
            },
            ci_decision: JsonDecision {
                verdict: decision.verdict(),
                reasons: decision.reasons(),
                flags: CiFlags::from_report(report),
            },
            dashboard_url: context.dashboard_url(),
        }
    }
}

fn percent(value: &str) -> String {
    match value {
        UNAVAILABLE => value.to_string(),
        _ => format!("{value}%"),
    }
}

fn decision_line(decision: &Decision) -> String {
    let summary = decision.reasons().join("; ");
    match decision.verdict() {
        Verdict::Pass => format!("PASS - {summary}"),
        Verdict::Warn => format!("WARNING - {summary}"),
        Verdict::Fail => format!("FAIL - {summary}"),
    }
}

fn append_buckets<const N: usize>(output: &mut String, indent: &str, buckets: [(&str, usize); N]) {
    for (index, (label, count)) in buckets.iter().enumerate() {
        let branch = if index + 1 == N { "`--" } else { "|--" };
        let _ = writeln!(output, "{indent}{branch} {label}: {count}");
    }
}

fn append_critical_issues(output: &mut String, details: &[IssueDetail]) {
    if details.is_empty() {
        return;
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "CRITICAL ISSUES (BLOCKING):");
    for (index, detail) in details.iter().take(MAX_LISTED_CRITICAL).enumerate() {
        let line = detail
            .line
            .map(|line| line.to_string())
            .unwrap_or_else(|| "?".to_string());
        let _ = writeln!(
            output,
            "  {}. [{}] {}:{}",
            index + 1,
            detail.severity.as_str(),
            detail.file,
            line
        );
        let _ = writeln!(output, "     {}", detail.message);
    }
    if details.len() > MAX_LISTED_CRITICAL {
        let _ = writeln!(
            output,
            "     ... and {} more critical issues",
            details.len() - MAX_LISTED_CRITICAL
        );
    }
}
