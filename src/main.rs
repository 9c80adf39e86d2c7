//! Ruleset Governance CLI - Command-line interface for governance ruleset validation
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to engine operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and validation logic

use clap::{Parser, Subcommand, ValueEnum};
use ruleset_governance::{
    create_engine, load_ruleset, EngineConfig, GovernanceResult, OutputFormat, ReportFormatter,
    ReportOptions, RuleSeverity, Ruleset, ScanOptions, TargetScanner, ValidationEngine,
};
use std::path::PathBuf;
use std::process;

/// Ruleset Governance - validate rulesets and check documents against them
#[derive(Parser)]
#[command(name = "ruleset-governance")]
#[command(version = "0.1.0")]
#[command(about = "Validate governance rulesets and check target documents against them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a ruleset is well formed
    ValidateRuleset {
        /// Ruleset file (YAML)
        ruleset: PathBuf,

        /// Ruleset name used in messages (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,

        /// Ruleset identifier (defaults to the file stem)
        #[arg(long)]
        id: Option<String>,
    },

    /// List the rules declared in a ruleset
    Rules {
        /// Ruleset file (YAML)
        ruleset: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: RulesFormatArg,

        /// Print each rule's YAML content
        #[arg(long)]
        show_content: bool,
    },

    /// Validate target documents against a ruleset
    Check {
        /// Ruleset file (YAML)
        #[arg(short, long)]
        ruleset: PathBuf,

        /// Target documents or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Ruleset identifier attached to violations (defaults to the file stem)
        #[arg(long)]
        id: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Minimum severity that fails the check
        #[arg(long, value_enum)]
        fail_on: Option<SeverityArg>,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Stop at the first target that cannot be validated
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum RulesFormatArg {
    Human,
    Json,
}

impl From<RulesFormatArg> for OutputFormat {
    fn from(arg: RulesFormatArg) -> Self {
        match arg {
            RulesFormatArg::Human => OutputFormat::Human,
            RulesFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum SeverityArg {
    Info,
    Warn,
    Error,
}

impl From<SeverityArg> for RuleSeverity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => RuleSeverity::Info,
            SeverityArg::Warn => RuleSeverity::Warn,
            SeverityArg::Error => RuleSeverity::Error,
        }
    }
}

/// Arguments of the `check` command
struct CheckArgs {
    ruleset: PathBuf,
    paths: Vec<PathBuf>,
    id: Option<String>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    fail_on: Option<SeverityArg>,
    max_violations: Option<usize>,
    no_parallel: bool,
    fail_fast: bool,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_command(cli: Cli) -> GovernanceResult<i32> {
    let use_colors = !cli.no_color;

    match cli.command {
        Commands::ValidateRuleset { ruleset, name, id } => {
            run_validate_ruleset(&load_config(cli.config)?, ruleset, name, id)
        }
        Commands::Rules {
            ruleset,
            format,
            show_content,
        } => run_rules(&load_config(cli.config)?, ruleset, format, show_content, use_colors),
        Commands::Check {
            ruleset,
            paths,
            id,
            format,
            severity,
            fail_on,
            max_violations,
            no_parallel,
            fail_fast,
        } => run_check(
            &load_config(cli.config)?,
            CheckArgs {
                ruleset,
                paths,
                id,
                format,
                severity,
                fail_on,
                max_violations,
                no_parallel,
                fail_fast,
            },
            use_colors,
        ),
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
    }
}

fn load_config(config_path: Option<PathBuf>) -> GovernanceResult<EngineConfig> {
    match config_path {
        Some(path) => EngineConfig::load_from_file(path),
        None => EngineConfig::discover("."),
    }
}

fn load_named_ruleset(
    path: PathBuf,
    name: Option<String>,
    id: Option<String>,
) -> GovernanceResult<Ruleset> {
    let loaded = load_ruleset(&path)?;
    if name.is_none() && id.is_none() {
        return Ok(loaded);
    }

    let id = id.unwrap_or_else(|| loaded.id().to_string());
    let name = name.unwrap_or_else(|| loaded.name().to_string());
    Ok(Ruleset::new(id, name, loaded.content().clone()))
}

fn run_validate_ruleset(
    config: &EngineConfig,
    path: PathBuf,
    name: Option<String>,
    id: Option<String>,
) -> GovernanceResult<i32> {
    let ruleset = load_named_ruleset(path, name, id)?;
    let engine = create_engine(config);

    match engine.validate_ruleset_content(&ruleset) {
        Ok(()) => {
            println!("✅ Ruleset '{}' is well formed", ruleset.name());
            Ok(0)
        }
        Err(e) if e.is_input_error() => {
            eprintln!("❌ {e}");
            Ok(1)
        }
        Err(e) => Err(e),
    }
}

fn run_rules(
    config: &EngineConfig,
    path: PathBuf,
    format: RulesFormatArg,
    show_content: bool,
    use_colors: bool,
) -> GovernanceResult<i32> {
    let ruleset = load_ruleset(&path)?;
    let engine = create_engine(config);

    let rules = match engine.extract_rules_from_ruleset(&ruleset) {
        Ok(rules) => rules,
        Err(e) if e.is_input_error() => {
            eprintln!("❌ {e}");
            return Ok(1);
        }
        Err(e) => return Err(e),
    };

    let formatter = ReportFormatter::new(ReportOptions {
        use_colors,
        ..Default::default()
    });
    println!("{}", formatter.format_rules(&rules, format.into(), show_content)?);

    Ok(0)
}

fn run_check(config: &EngineConfig, args: CheckArgs, use_colors: bool) -> GovernanceResult<i32> {
    let ruleset = load_named_ruleset(args.ruleset, None, args.id)?;
    let engine = create_engine(config);
    let scanner = TargetScanner::new(config.scan.extensions.clone());

    let options = ScanOptions {
        parallel: config.scan.parallel && !args.no_parallel,
        fail_fast: config.scan.fail_fast || args.fail_fast,
        max_targets: None,
    };

    let report = scanner.scan(&engine, &args.paths, &ruleset, &options)?;

    let formatter = ReportFormatter::new(ReportOptions {
        use_colors,
        max_violations: args.max_violations.or(config.report.max_violations),
        min_severity: args.severity.map(Into::into),
    });
    println!("{}", formatter.format_report(&report, args.format.into())?);

    let fail_on = args
        .fail_on
        .map(RuleSeverity::from)
        .unwrap_or(config.report.fail_on);

    if report.is_blocking(fail_on) || report.has_failures() {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn run_validate_config(config_path: Option<PathBuf>) -> GovernanceResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("ruleset_governance.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match EngineConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("📊 Configuration summary:");
            println!(
                "  Evaluator: {} {}",
                config.evaluator.command,
                config.evaluator.args.join(" ")
            );
            println!("  Target extensions: {}", config.scan.extensions.join(", "));
            println!("  Fails on: {}", config.report.fail_on);
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleset_governance::ConfigBuilder;
    use std::fs;
    use tempfile::TempDir;

    const RULESET: &str = "rules:\n  info-contact:\n    description: Contact required\n    severity: warn\n";

    fn shell_config(script: &str) -> EngineConfig {
        ConfigBuilder::new()
            .evaluator(
                "sh",
                vec!["-c".to_string(), script.to_string(), "evaluator".to_string()],
            )
            .build()
            .unwrap()
    }

    fn check_args(ruleset: PathBuf, paths: Vec<PathBuf>) -> CheckArgs {
        CheckArgs {
            ruleset,
            paths,
            id: None,
            format: OutputFormatArg::Json,
            severity: None,
            fail_on: None,
            max_violations: None,
            no_parallel: false,
            fail_fast: false,
        }
    }

    #[test]
    fn test_rules_command() {
        let temp_dir = TempDir::new().unwrap();
        let ruleset = temp_dir.path().join("rules.yaml");
        fs::write(&ruleset, RULESET).unwrap();

        let config = EngineConfig::default();
        assert_eq!(run_rules(&config, ruleset.clone(), RulesFormatArg::Json, false, false).unwrap(), 0);

        fs::write(&ruleset, "rules:\n  r1:\n    severity: CRITICAL\n").unwrap();
        assert_eq!(run_rules(&config, ruleset, RulesFormatArg::Human, true, false).unwrap(), 1);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.yaml");

        fs::write(&config_file, EngineConfig::default().to_yaml().unwrap()).unwrap();
        assert_eq!(run_validate_config(Some(config_file.clone())).unwrap(), 0);

        fs::write(&config_file, "version: \"9\"\n").unwrap();
        assert_eq!(run_validate_config(Some(config_file)).unwrap(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_ruleset_command() {
        let temp_dir = TempDir::new().unwrap();
        let ruleset = temp_dir.path().join("rules.yaml");
        fs::write(&ruleset, RULESET).unwrap();

        let passing = shell_config("cat > /dev/null; echo '{\"passed\": true}'");
        assert_eq!(run_validate_ruleset(&passing, ruleset.clone(), None, None).unwrap(), 0);

        let failing = shell_config(
            "cat > /dev/null; echo '{\"passed\": false, \"message\": \"severity is required\"}'",
        );
        assert_eq!(run_validate_ruleset(&failing, ruleset.clone(), None, None).unwrap(), 1);

        let crashing = shell_config("cat > /dev/null; exit 9");
        assert!(run_validate_ruleset(&crashing, ruleset, None, None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_check_command() {
        let temp_dir = TempDir::new().unwrap();
        let ruleset = temp_dir.path().join("rules.yaml");
        let target = temp_dir.path().join("petstore.yaml");
        fs::write(&ruleset, RULESET).unwrap();
        fs::write(&target, "openapi: 3.0.0\n").unwrap();

        let clean = shell_config("cat > /dev/null; echo '[]'");
        let args = check_args(ruleset.clone(), vec![target.clone()]);
        assert_eq!(run_check(&clean, args, false).unwrap(), 0);

        let warning = shell_config(
            "cat > /dev/null; echo '[{\"ruleName\":\"info-contact\",\"path\":\"$.info\",\"message\":\"Contact required\",\"severity\":\"WARN\"}]'",
        );
        let args = check_args(ruleset.clone(), vec![target.clone()]);
        assert_eq!(run_check(&warning, args, false).unwrap(), 0);

        let mut args = check_args(ruleset, vec![target]);
        args.fail_on = Some(SeverityArg::Warn);
        assert_eq!(run_check(&warning, args, false).unwrap(), 1);
    }
}
