//! git-mirror - mirror a branch of one git repository onto another
//!
//! Usage:
//!   git-mirror                          # read INPUT_* variables (GitHub Actions)
//!   git-mirror --config mirror.toml     # read inputs from a TOML file
//!   git-mirror --original-url ... --mirror-url ... --dry-run

mod actions;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use mirror_core::config::{
    DEFAULT_WORK_DIR, EnvInputs, FileInputs, InputKey, LayeredInputs, MapInputs, RunConfiguration,
};
use mirror_core::credentials::TokenEncoding;
use mirror_core::error::{ErrorCategory, MirrorError};
use mirror_core::git::ProcessRunner;
use mirror_core::pipeline::{MirrorPipeline, PlannedCommand, RunReport};
use mirror_core::secrets::SecretRegistry;

#[derive(Parser)]
#[command(name = "git-mirror")]
#[command(about = "Mirror a branch of one git repository onto another", long_about = None)]
struct Cli {
    /// Original repository url (https only)
    #[arg(long)]
    original_url: Option<String>,

    /// Branch of the original repository to mirror [default: master]
    #[arg(long)]
    original_branch: Option<String>,

    /// Mirror repository url (https only)
    #[arg(long)]
    mirror_url: Option<String>,

    /// Branch to create on the mirror [default: mirror]
    #[arg(long)]
    mirror_branch: Option<String>,

    /// Personal access token (prefer the INPUT_PAT environment variable)
    #[arg(long)]
    token: Option<String>,

    /// How the token is encoded [default: base64]
    #[arg(long, value_enum)]
    token_encoding: Option<EncodingArg>,

    /// Push with --force (`=false` overrides the file and environment)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    force: Option<bool>,

    /// Log every git command before it runs (`=false` overrides the file and environment)
    #[arg(short, long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    verbose: Option<bool>,

    /// Push tags along with the branch (`=false` overrides the file and environment)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    tags: Option<bool>,

    /// Append .git to repository urls that lack it (`=false` overrides the file and environment)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    append_git_suffix: Option<bool>,

    /// TOML file with inputs (flags take precedence, environment is the fallback)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory for the local repository, relative to the current directory
    #[arg(long, default_value = DEFAULT_WORK_DIR)]
    work_dir: PathBuf,

    /// Print the git commands without running them
    #[arg(long)]
    dry_run: bool,

    /// Output format
    ///
    /// Under GitHub Actions, `::add-mask::` commands share stdout with the
    /// JSON document; use --output to get the document on its own.
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Write the plan or JSON report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    Base64,
    Plain,
}

impl From<EncodingArg> for TokenEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Base64 => TokenEncoding::Base64,
            EncodingArg::Plain => TokenEncoding::Plain,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq, Debug)]
enum OutputFormat {
    /// Human-readable log lines
    #[default]
    Text,
    /// Machine-readable JSON report on stdout
    Json,
}

impl Cli {
    /// Inputs given as command-line flags. Unset flags are left out so lower
    /// layers can supply them; `--flag=false` is kept so it wins over them.
    fn flag_inputs(&self) -> MapInputs {
        let mut inputs = MapInputs::new();
        let text = [
            (InputKey::OriginalUrl, &self.original_url),
            (InputKey::OriginalBranch, &self.original_branch),
            (InputKey::MirrorUrl, &self.mirror_url),
            (InputKey::MirrorBranch, &self.mirror_branch),
            (InputKey::Token, &self.token),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                inputs.insert(key, value.clone());
            }
        }

        if let Some(encoding) = self.token_encoding {
            inputs.insert(InputKey::TokenEncoding, TokenEncoding::from(encoding).as_str());
        }

        let flags = [
            (InputKey::Force, self.force),
            (InputKey::Verbose, self.verbose),
            (InputKey::Tags, self.tags),
            (InputKey::AppendGitSuffix, self.append_git_suffix),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                inputs.insert(key, value.to_string());
            }
        }
        inputs
    }

    fn inputs(&self) -> Result<LayeredInputs> {
        let mut inputs = LayeredInputs::new().layer(self.flag_inputs());
        if let Some(path) = &self.config {
            let file = FileInputs::load(path).map_err(anyhow::Error::msg)?;
            inputs = inputs.layer(file);
        }
        Ok(inputs.layer(EnvInputs::from_env()))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let secrets = if actions::is_github_actions() {
        SecretRegistry::with_hook(actions::add_mask)
    } else {
        SecretRegistry::new()
    };

    if let Err(err) = logging::init(&secrets) {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli, &secrets) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err, &secrets);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, secrets: &SecretRegistry) -> Result<()> {
    let inputs = cli.inputs()?;
    let config = RunConfiguration::from_inputs(&inputs, secrets)?;
    let verbose = config.use_verbose;
    let config = config.authenticate()?;

    let work_dir = std::env::current_dir()
        .context("failed to resolve current directory")?
        .join(&cli.work_dir);
    let runner = ProcessRunner::new(secrets.clone()).with_verbose(verbose);
    let mut pipeline = MirrorPipeline::new(config, runner, work_dir, secrets.clone());
    info!("working directory: {}", pipeline.work_dir().display());

    if cli.dry_run {
        let body = render_plan(&pipeline.plan(), cli.format)?;
        return write_output(cli.output.as_deref(), &body);
    }

    let report = pipeline.run()?;
    match cli.format {
        OutputFormat::Text => info!(
            steps = report.steps.len(),
            duration_ms = report.total_duration_ms(),
            "mirror complete"
        ),
        OutputFormat::Json => write_output(cli.output.as_deref(), &render_report(&report)?)?,
    }
    Ok(())
}

fn render_plan(plan: &[PlannedCommand], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => plan
            .iter()
            .map(|planned| format!("git {}", planned.command))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(plan)?,
    })
}

fn render_report(report: &RunReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn write_output(path: Option<&Path>, body: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{body}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{body}");
            Ok(())
        }
    }
}

fn report_failure(err: &anyhow::Error, secrets: &SecretRegistry) {
    let (output, message) = failure_message(err, secrets);
    if let Some(output) = output {
        info!("Output: {output}");
    }
    error!("{message}");
    if actions::is_github_actions() {
        actions::error(&message);
    }
}

/// Captured git output worth showing, and the masked fatal message.
fn failure_message(err: &anyhow::Error, secrets: &SecretRegistry) -> (Option<String>, String) {
    let Some(failure) = err.downcast_ref::<MirrorError>() else {
        return (None, secrets.mask(&format!("{err:#}")));
    };

    let output = failure
        .output()
        .filter(|output| !output.is_empty())
        .map(|output| secrets.mask(output));
    let prefix = match failure.category() {
        ErrorCategory::Configuration => "configuration error",
        ErrorCategory::Url => "invalid repository url",
        ErrorCategory::Process => "mirror failed",
    };
    (output, secrets.mask(&format!("{prefix}: {failure}")))
}

#[cfg(test)]
mod tests {
    use super::{Cli, OutputFormat, failure_message, render_plan, write_output};
    use clap::Parser;
    use mirror_core::config::{EnvInputs, InputKey, InputSource, LayeredInputs};
    use mirror_core::error::MirrorError;
    use mirror_core::pipeline::{PlannedCommand, Step};
    use mirror_core::secrets::SecretRegistry;

    #[test]
    fn parses_with_no_arguments() {
        let cli = Cli::try_parse_from(["git-mirror"]).unwrap();
        assert_eq!(cli.work_dir, std::path::PathBuf::from("tmp"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.dry_run);
        assert!(cli.flag_inputs().is_empty());
    }

    #[test]
    fn flags_become_inputs() {
        let cli = Cli::try_parse_from([
            "git-mirror",
            "--original-url",
            "https://example.com/org/repo.git",
            "--mirror-branch",
            "backup",
            "--token-encoding",
            "plain",
            "--force",
            "--tags",
        ])
        .unwrap();
        let inputs = cli.flag_inputs();

        assert_eq!(
            inputs.get(InputKey::OriginalUrl).as_deref(),
            Some("https://example.com/org/repo.git")
        );
        assert_eq!(inputs.get(InputKey::MirrorBranch).as_deref(), Some("backup"));
        assert_eq!(inputs.get(InputKey::TokenEncoding).as_deref(), Some("plain"));
        assert_eq!(inputs.get(InputKey::Force).as_deref(), Some("true"));
        assert_eq!(inputs.get(InputKey::Tags).as_deref(), Some("true"));
        assert_eq!(inputs.get(InputKey::Verbose), None);
        assert_eq!(inputs.get(InputKey::MirrorUrl), None);
    }

    #[test]
    fn json_format_and_dry_run_parse() {
        let cli =
            Cli::try_parse_from(["git-mirror", "--dry-run", "--format", "json", "-v"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, Some(true));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn rejects_unknown_token_encoding() {
        assert!(Cli::try_parse_from(["git-mirror", "--token-encoding", "hex"]).is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["git-mirror", "--config", "/nonexistent/mirror.toml"])
            .unwrap();
        assert!(cli.inputs().is_err());
    }

    #[test]
    fn explicit_false_overrides_lower_layers() {
        let cli = Cli::try_parse_from(["git-mirror", "--force=false", "--tags"]).unwrap();
        assert_eq!(cli.force, Some(false));
        assert_eq!(cli.tags, Some(true));

        let env = EnvInputs::from_vars([("INPUT_FORCE", "true"), ("INPUT_VERBOSE", "true")]);
        let inputs = LayeredInputs::new().layer(cli.flag_inputs()).layer(env);
        assert_eq!(inputs.get(InputKey::Force).as_deref(), Some("false"));
        assert_eq!(inputs.get(InputKey::Verbose).as_deref(), Some("true"));
    }

    #[test]
    fn flag_value_needs_equals_sign() {
        assert!(Cli::try_parse_from(["git-mirror", "--force", "false"]).is_err());
    }

    // =====================================================================
    // Failure reporting
    // =====================================================================

    #[test]
    fn command_failure_carries_output_and_process_prefix() {
        let err = anyhow::Error::new(MirrorError::CommandFailed {
            command: "checkout upstream/main".to_string(),
            status: Some(1),
            output: "error: pathspec 'upstream/main' did not match".to_string(),
        });
        let (output, message) = failure_message(&err, &SecretRegistry::new());

        assert_eq!(
            output.as_deref(),
            Some("error: pathspec 'upstream/main' did not match")
        );
        assert_eq!(
            message,
            "mirror failed: git checkout upstream/main failed (exit status 1)"
        );
    }

    #[test]
    fn empty_command_output_is_not_shown() {
        let err = anyhow::Error::new(MirrorError::CommandFailed {
            command: "init".to_string(),
            status: None,
            output: String::new(),
        });
        let (output, _) = failure_message(&err, &SecretRegistry::new());
        assert_eq!(output, None);
    }

    #[test]
    fn missing_input_is_a_configuration_error() {
        let err = anyhow::Error::new(MirrorError::MissingInput(InputKey::MirrorUrl));
        let (output, message) = failure_message(&err, &SecretRegistry::new());

        assert_eq!(output, None);
        assert!(message.starts_with("configuration error: "), "{message}");
        assert!(message.contains("mirrorURL"), "{message}");
    }

    #[test]
    fn other_errors_are_masked() {
        let secrets = SecretRegistry::new();
        secrets.register("abc123");
        let err = anyhow::anyhow!("failed to read https://abc123@example.com/config.toml");

        let (output, message) = failure_message(&err, &secrets);
        assert_eq!(output, None);
        assert_eq!(message, "failed to read https://***@example.com/config.toml");
    }

    #[test]
    fn command_output_is_masked() {
        let secrets = SecretRegistry::new();
        secrets.register("abc123");
        let err = anyhow::Error::new(MirrorError::CommandFailed {
            command: "pull upstream main".to_string(),
            status: Some(128),
            output: "fatal: could not read abc123".to_string(),
        });

        let (output, _) = failure_message(&err, &secrets);
        assert_eq!(output.as_deref(), Some("fatal: could not read ***"));
    }

    // =====================================================================
    // Output
    // =====================================================================

    fn plan() -> Vec<PlannedCommand> {
        vec![
            PlannedCommand {
                step: Step::Init,
                command: "init".to_string(),
            },
            PlannedCommand {
                step: Step::Push,
                command: "push --set-upstream mirror mirror".to_string(),
            },
        ]
    }

    #[test]
    fn text_plan_lists_git_commands() {
        let body = render_plan(&plan(), OutputFormat::Text).unwrap();
        assert_eq!(body, "git init\ngit push --set-upstream mirror mirror");
    }

    #[test]
    fn json_plan_is_a_standalone_document() {
        let body = render_plan(&plan(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value[1]["step"], "push");
        assert_eq!(value[0]["command"], "init");
    }

    #[test]
    fn output_file_receives_the_body() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plan.json");

        write_output(Some(&path), "[]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
    }

    #[test]
    fn output_flag_parses() {
        let cli = Cli::try_parse_from(["git-mirror", "-o", "report.json"]).unwrap();
        assert_eq!(cli.output, Some(std::path::PathBuf::from("report.json")));
    }
}
