#![deny(missing_docs)]
//! SonarGate command-line interface.
//!
//! Fetches analysis results for one project, prints a summary, and optionally
//! reports the CI decision through the process exit code.

mod client;

use chrono::Utc;
use clap::{Args, Parser, ValueEnum};
use client::{ServiceTarget, SonarClient, fetch_payloads};
use sonargate_core::{
    Evaluation, ReportContext, SonarGateError, evaluate, render_json, render_markdown,
    render_text,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const DEFAULT_SERVER_URL: &str = "http://localhost:9999";
const DEFAULT_PAGE_SIZE: u32 = 500;
/// Exit code for configuration and output failures.
#[cfg_attr(test, allow(dead_code))]
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "sonargate",
    version,
    about = "Summarize SonarQube analysis results for CI pipelines"
)]
struct Cli {
    /// Base URL of the analysis server.
    #[arg(long, env = "SONAR_HOST_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    /// Authentication token.
    #[arg(long, env = "SONAR_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Project key to report on.
    #[arg(long, env = "SONAR_PROJECT_KEY")]
    project_key: Option<String>,
    #[command(flatten)]
    output: OutputArgs,
    /// Seconds to wait before querying, so the server can finish processing.
    #[arg(long, env = "SONARGATE_WAIT_SECS", default_value_t = 0)]
    wait_for_analysis: u64,
    /// Set the exit code from the CI decision.
    #[arg(long, env = "SONARGATE_EXIT_CODE")]
    exit_code: bool,
    /// Maximum number of issues fetched.
    #[arg(long, env = "SONARGATE_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Output format for the summary.
    #[arg(long, value_enum, env = "SONARGATE_FORMAT", default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the summary to a file instead of stdout.
    #[arg(long, env = "SONARGATE_OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

/// Validated settings for one run.
#[derive(Debug)]
struct Config {
    context: ReportContext,
    target: ServiceTarget,
    output: OutputArgs,
    wait: Duration,
    exit_code: bool,
}

impl Config {
    /// Validate CLI input. Runs before any network activity.
    fn from_cli(cli: Cli) -> CliResult<Self> {
        let token = required(cli.token, "token is required (--token or SONAR_TOKEN)")?;
        let project_key = required(
            cli.project_key,
            "project key is required (--project-key or SONAR_PROJECT_KEY)",
        )?;
        if cli.page_size == 0 {
            return Err(config_error("page size must be greater than zero"));
        }
        let context = ReportContext::new(&project_key, &cli.server_url, Utc::now())?;
        Ok(Self {
            target: ServiceTarget {
                server_url: context.server_url().to_string(),
                token,
                project_key: context.project_key().to_string(),
                page_size: cli.page_size,
            },
            context,
            output: cli.output,
            wait: Duration::from_secs(cli.wait_for_analysis),
            exit_code: cli.exit_code,
        })
    }
}

fn config_error(message: &str) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(SonarGateError::Config(message.to_string()))
}

fn required(value: Option<String>, message: &str) -> CliResult<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(config_error(message)),
    }
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => std::process::ExitCode::from(code),
        Err(err) => {
            eprintln!("sonargate: {err}");
            std::process::ExitCode::from(EXIT_USAGE)
        }
    }
}

#[cfg(test)]
fn main() {}

#[cfg_attr(test, allow(dead_code))]
async fn run(cli: Cli) -> CliResult<u8> {
    let config = Config::from_cli(cli)?;
    let client = client::ReqwestSonarClient::new()?;
    run_with(config, &client, &TokioSleeper).await
}

/// Run the fetch, evaluate, emit pipeline and return the process exit code.
async fn run_with<C: SonarClient, S: Sleeper>(
    config: Config,
    client: &C,
    sleeper: &S,
) -> CliResult<u8> {
    wait_for_analysis(sleeper, config.wait).await;

    log::info!(
        "Fetching analysis data for {} from {}",
        config.target.project_key,
        config.target.server_url
    );
    let payloads = fetch_payloads(client, &config.target).await;
    let evaluation = evaluate(config.context.with_generated_at(Utc::now()), &payloads);

    let contents = render_evaluation(&evaluation, config.output.format)?;
    emit_output(config.output.output.as_deref(), contents).await?;

    if !config.exit_code {
        return Ok(0);
    }
    let code = evaluation.decision.exit_code();
    log::info!("Exit code: {code}");
    Ok(code)
}

/// Async sleep abstraction for the pre-fetch wait.
trait Sleeper {
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Tokio-backed sleeper used in production.
#[cfg_attr(test, allow(dead_code))]
struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

async fn wait_for_analysis<S: Sleeper>(sleeper: &S, wait: Duration) {
    if wait.is_zero() {
        return;
    }
    log::info!(
        "Waiting {} seconds for analysis to complete...",
        wait.as_secs()
    );
    sleeper.sleep(wait).await;
}

fn render_evaluation(evaluation: &Evaluation, format: OutputFormat) -> CliResult<String> {
    let Evaluation { report, decision } = evaluation;
    let contents = match format {
        OutputFormat::Text => render_text(report, decision),
        OutputFormat::Markdown => render_markdown(report, decision),
        OutputFormat::Json => {
            let mut json = render_json(report, decision)?;
            json.push('\n');
            json
        }
    };
    Ok(contents)
}

async fn emit_output(path: Option<&Path>, contents: String) -> CliResult<()> {
    if let Some(path) = path {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
        log::info!("Summary written to {}", path.display());
    } else {
        print!("{contents}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonargate_core::PayloadKind;
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock")
    }

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let prev = std::env::var(key).ok();
            match value {
                Some(value) => unsafe { std::env::set_var(key, value) },
                None => unsafe { std::env::remove_var(key) },
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(prev) = self.prev.take() {
                unsafe { std::env::set_var(self.key, prev) };
            } else {
                unsafe { std::env::remove_var(self.key) };
            }
        }
    }

    fn clear_env() -> Vec<EnvGuard> {
        [
            "SONAR_HOST_URL",
            "SONAR_TOKEN",
            "SONAR_PROJECT_KEY",
            "SONARGATE_FORMAT",
            "SONARGATE_OUTPUT",
            "SONARGATE_WAIT_SECS",
            "SONARGATE_EXIT_CODE",
            "SONARGATE_PAGE_SIZE",
        ]
        .into_iter()
        .map(|key| EnvGuard::set(key, None))
        .collect()
    }

    struct CannedClient {
        bodies: HashMap<&'static str, &'static str>,
        calls: Mutex<usize>,
    }

    impl CannedClient {
        fn new(metrics: &'static str, issues: &'static str, gate: &'static str) -> Self {
            let bodies = HashMap::from([
                ("metrics", metrics),
                ("issues", issues),
                ("quality gate", gate),
            ]);
            Self {
                bodies,
                calls: Mutex::new(0),
            }
        }

        fn unreachable() -> Self {
            Self {
                bodies: HashMap::new(),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().expect("calls")
        }
    }

    impl SonarClient for CannedClient {
        fn fetch_payload<'a>(
            &'a self,
            _target: &'a ServiceTarget,
            kind: PayloadKind,
        ) -> Pin<Box<dyn Future<Output = CliResult<String>> + Send + 'a>> {
            *self.calls.lock().expect("calls") += 1;
            let result: CliResult<String> = match self.bodies.get(kind.to_string().as_str()) {
                Some(body) => Ok(body.to_string()),
                None => Err(format!("{kind} unreachable").into()),
            };
            Box::pin(async move { result })
        }
    }

    struct RecordingSleeper {
        durations: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn new() -> Self {
            Self {
                durations: Mutex::new(Vec::new()),
            }
        }

        fn durations(&self) -> Vec<Duration> {
            self.durations.lock().expect("durations").clone()
        }
    }

    impl Sleeper for RecordingSleeper {
        fn sleep<'a>(
            &'a self,
            duration: Duration,
        ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async move {
                self.durations.lock().expect("durations").push(duration);
            })
        }
    }

    static UNIQUE_COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        let counter = UNIQUE_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        PathBuf::from(format!("sonargate_cli_test_{nanos}_{counter}"))
    }

    const METRICS: &str = r#"{"component":{"measures":[{"metric":"ncloc","value":"500"}]}}"#;
    const GATE_OK: &str = r#"{"projectStatus":{"status":"OK"}}"#;
    const NO_ISSUES: &str = r#"{"issues":[]}"#;
    const BLOCKER: &str = r#"{"issues":[{"severity":"BLOCKER","type":"BUG"}]}"#;
    const CRITICAL: &str = r#"{"issues":[{"severity":"CRITICAL","type":"CODE_SMELL"}]}"#;

    fn config(format: OutputFormat, output: Option<PathBuf>, exit_code: bool) -> Config {
        Config {
            context: ReportContext::new("demo", "http://localhost:9999", Utc::now())
                .expect("context"),
            target: ServiceTarget {
                server_url: "http://localhost:9999".to_string(),
                token: "token".to_string(),
                project_key: "demo".to_string(),
                page_size: 500,
            },
            output: OutputArgs { format, output },
            wait: Duration::ZERO,
            exit_code,
        }
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sonargate").chain(args.iter().copied()))
            .expect("parse args")
    }

    #[test]
    fn cli_parses_flags_and_defaults() {
        let _lock = env_lock();
        let _env = clear_env();
        let cli = parse(&["--token", "t", "--project-key", "demo"]);
        assert_eq!(cli.server_url, DEFAULT_SERVER_URL);
        assert_eq!(cli.output.format, OutputFormat::Text);
        assert_eq!(cli.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cli.wait_for_analysis, 0);
        assert!(!cli.exit_code);

        let cli = parse(&[
            "--token",
            "t",
            "--project-key",
            "demo",
            "--format",
            "json",
            "--output",
            "out/report.json",
            "--wait-for-analysis",
            "10",
            "--exit-code",
        ]);
        assert_eq!(cli.output.format, OutputFormat::Json);
        assert_eq!(cli.output.output, Some(PathBuf::from("out/report.json")));
        assert_eq!(cli.wait_for_analysis, 10);
        assert!(cli.exit_code);
    }

    #[test]
    fn cli_reads_environment_variables() {
        let _lock = env_lock();
        let _env = clear_env();
        let _url = EnvGuard::set("SONAR_HOST_URL", Some("https://sonar.example.com/"));
        let _token = EnvGuard::set("SONAR_TOKEN", Some("env-token"));
        let _key = EnvGuard::set("SONAR_PROJECT_KEY", Some("env-project"));
        let _format = EnvGuard::set("SONARGATE_FORMAT", Some("markdown"));
        let _exit = EnvGuard::set("SONARGATE_EXIT_CODE", Some("true"));

        let config = Config::from_cli(parse(&[])).expect("config");
        assert_eq!(config.target.server_url, "https://sonar.example.com");
        assert_eq!(config.target.token, "env-token");
        assert_eq!(config.target.project_key, "env-project");
        assert_eq!(
            config.context.dashboard_url(),
            "https://sonar.example.com/dashboard?id=env-project"
        );
        assert_eq!(config.output.format, OutputFormat::Markdown);
        assert!(config.exit_code);
    }

    #[test]
    fn config_rejects_missing_or_blank_values() {
        let _lock = env_lock();
        let _env = clear_env();

        let err = Config::from_cli(parse(&["--project-key", "demo"])).unwrap_err();
        assert!(err.to_string().contains("token is required"));

        let err = Config::from_cli(parse(&["--token", "  ", "--project-key", "demo"])).unwrap_err();
        assert!(err.to_string().contains("token is required"));

        let err = Config::from_cli(parse(&["--token", "t"])).unwrap_err();
        assert!(err.to_string().contains("project key is required"));

        let err = Config::from_cli(parse(&[
            "--token",
            "t",
            "--project-key",
            "demo",
            "--server-url",
            " ",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("server url is required"));

        let err = Config::from_cli(parse(&[
            "--token",
            "t",
            "--project-key",
            "demo",
            "--page-size",
            "0",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("page size"));
    }

    #[tokio::test]
    async fn wait_for_analysis_sleeps_only_when_requested() {
        let sleeper = RecordingSleeper::new();
        wait_for_analysis(&sleeper, Duration::ZERO).await;
        assert!(sleeper.durations().is_empty());

        wait_for_analysis(&sleeper, Duration::from_secs(15)).await;
        assert_eq!(sleeper.durations(), vec![Duration::from_secs(15)]);
    }

    #[tokio::test]
    async fn run_with_reports_blockers_through_exit_code() {
        let root = std::env::temp_dir().join(unique_dir_name());
        let path = root.join("out/report.json");
        let client = CannedClient::new(METRICS, BLOCKER, GATE_OK);
        let sleeper = RecordingSleeper::new();

        let code = run_with(
            config(OutputFormat::Json, Some(path.clone()), true),
            &client,
            &sleeper,
        )
        .await
        .expect("run");
        assert_eq!(code, 1);
        assert_eq!(client.calls(), 3);

        let contents = std::fs::read_to_string(&path).expect("read json");
        let parsed: serde_json::Value = serde_json::from_str(&contents).expect("parse");
        assert_eq!(parsed["ci_decision"]["should_fail"], true);
        assert_eq!(parsed["metrics"]["ncloc"], "500");
        assert!(contents.ends_with('\n'));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn run_with_ignores_decision_without_exit_code_flag() {
        let client = CannedClient::new(METRICS, BLOCKER, GATE_OK);
        let code = run_with(
            config(OutputFormat::Text, None, false),
            &client,
            &RecordingSleeper::new(),
        )
        .await
        .expect("run");
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn run_with_maps_warn_and_pass_to_success() {
        let root = std::env::temp_dir().join(unique_dir_name());

        let path = root.join("warn.md");
        let client = CannedClient::new(METRICS, CRITICAL, GATE_OK);
        let code = run_with(
            config(OutputFormat::Markdown, Some(path.clone()), true),
            &client,
            &RecordingSleeper::new(),
        )
        .await
        .expect("run");
        assert_eq!(code, 0);
        let contents = std::fs::read_to_string(&path).expect("read markdown");
        assert!(contents.contains("WARNING - 1 critical issue(s) found"));

        let path = root.join("pass.txt");
        let client = CannedClient::new(METRICS, NO_ISSUES, GATE_OK);
        let code = run_with(
            config(OutputFormat::Text, Some(path.clone()), true),
            &client,
            &RecordingSleeper::new(),
        )
        .await
        .expect("run");
        assert_eq!(code, 0);
        let contents = std::fs::read_to_string(&path).expect("read text");
        assert!(contents.contains("PASS - no blocking issues found"));
        assert!(contents.contains("Lines of Code: 500"));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[tokio::test]
    async fn run_with_fails_safe_when_service_unreachable() {
        let root = std::env::temp_dir().join(unique_dir_name());
        let path = root.join("report.txt");
        let client = CannedClient::unreachable();
        let mut config = config(OutputFormat::Text, Some(path.clone()), true);
        config.wait = Duration::from_secs(5);
        let sleeper = RecordingSleeper::new();

        let code = run_with(config, &client, &sleeper).await.expect("run");
        assert_eq!(code, 1);
        assert_eq!(client.calls(), 3);
        assert_eq!(sleeper.durations(), vec![Duration::from_secs(5)]);

        let contents = std::fs::read_to_string(&path).expect("read text");
        assert!(contents.contains("Quality Gate: UNKNOWN (failed)"));
        assert!(contents.contains("Coverage: N/A"));
        assert!(contents.contains("Total Issues: 0"));

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn render_evaluation_supports_all_formats() {
        let context = ReportContext::new("demo", "http://localhost:9999", Utc::now())
            .expect("context");
        let evaluation = evaluate(context, &sonargate_core::RawPayloads::default());
        let text = render_evaluation(&evaluation, OutputFormat::Text).expect("text");
        assert!(text.contains("SONARQUBE CI ANALYSIS SUMMARY"));
        let markdown = render_evaluation(&evaluation, OutputFormat::Markdown).expect("markdown");
        assert!(markdown.starts_with("## SonarQube Analysis Report"));
        let json = render_evaluation(&evaluation, OutputFormat::Json).expect("json");
        assert!(json.trim_start().starts_with('{'));
    }
}
