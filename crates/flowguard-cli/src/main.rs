use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use flowguard_core::{AssetPolicy, Config, Report, RulesConfig, Severity};
use flowguard_engine::{collect_groups, AssetUrlProcessor, FlowCheck, GroupRuleValidator, GroupSummary, RuleWarning};
use flowguard_graph::ContainerExtractor;

/// Flowguard - checks and prepares flow diagrams for publishing
#[derive(Parser)]
#[command(name = "flowguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: flowguard.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the active document of a diagram source
    Extract {
        /// Diagram JSON (container, bare document, or selector graph)
        input: PathBuf,
    },

    /// Produce the render-ready document
    Render {
        /// Diagram JSON
        input: PathBuf,

        /// Deployment base path for /assets/ URLs
        #[arg(long)]
        base_url: Option<String>,

        /// What to do with local file:/blob: URLs (degrade or strict)
        #[arg(long)]
        policy: Option<AssetPolicy>,

        /// Padding between the origin and the diagram's bounding box
        #[arg(long)]
        padding: Option<f64>,

        /// Skip viewport normalization
        #[arg(long)]
        no_normalize: bool,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check asset URLs and group rules
    Check {
        /// Diagram JSON
        input: PathBuf,

        /// Deployment base path for /assets/ URLs
        #[arg(long)]
        base_url: Option<String>,

        /// Rule set file (.json or .toml)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,
    },

    /// Show computed groups and their rule warnings
    Rules {
        /// Diagram JSON
        input: PathBuf,

        /// Rule set file (.json or .toml)
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if Path::new("flowguard.toml").exists() {
        Config::from_file(Path::new("flowguard.toml")).context("Failed to load flowguard.toml")?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    match cli.command {
        Commands::Extract { input } => extract_command(&input),
        Commands::Render {
            input,
            base_url,
            policy,
            padding,
            no_normalize,
            output,
        } => {
            let mut config = config;
            if let Some(base_url) = base_url {
                config.assets.base_url = base_url;
            }
            if let Some(policy) = policy {
                config.assets.policy = policy;
            }
            if let Some(padding) = padding {
                config.preview.padding = padding;
            }
            config.validate()?;
            render_command(&config, &input, !no_normalize, output.as_deref(), cli.verbose)
        }
        Commands::Check {
            input,
            base_url,
            rules,
            output,
            markdown,
        } => {
            let mut config = config;
            if let Some(base_url) = base_url {
                config.assets.base_url = base_url;
            }
            if let Some(rules) = rules {
                config.rules = load_rules(&rules)?;
            }
            check_command(&config, &input, &output, markdown.as_deref(), cli.verbose)
        }
        Commands::Rules { input, rules } => {
            let rules = match rules {
                Some(path) => load_rules(&path)?,
                None => config.rules,
            };
            rules_command(&rules, &input)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn read_input(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn load_rules(path: &Path) -> Result<RulesConfig> {
    RulesConfig::from_file(path).with_context(|| format!("Failed to load rules from {}", path.display()))
}

/// Extract command - print the canonical document
fn extract_command(input: &Path) -> Result<()> {
    let source = read_input(input)?;
    let document = ContainerExtractor::extract(&source);

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Render command - rewrite asset URLs and frame the diagram
fn render_command(
    config: &Config,
    input: &Path,
    normalize: bool,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let source = read_input(input)?;
    let pipeline = FlowCheck::new(config);

    let document = if normalize {
        pipeline.prepare_for_render(&source)
    } else {
        let document = ContainerExtractor::extract(&source);
        AssetUrlProcessor::new(&config.assets.base_url)
            .rewrite_document(&document, config.assets.policy)
    };

    if verbose {
        eprintln!(
            "{} {} nodes with base {} ({})",
            "Rendered".cyan(),
            document.nodes.len(),
            config.assets.base_url,
            config.assets.policy
        );
    }

    let json = serde_json::to_string_pretty(&document)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} {}", "Document written to:".green(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Check command - diagnose asset URLs and group rules
fn check_command(
    config: &Config,
    input: &Path,
    output: &Path,
    markdown: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("{} {}", "Checking".cyan(), input.display());
    }

    let source = read_input(input)?;
    let report = FlowCheck::new(config).check(&source);

    report
        .save_to_file(output)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
        println!("{} {}", "Markdown report written to:".green(), md_path.display());
    }

    print!("{}", format_report_summary(&report));
    println!("{} {}", "Report written to:".green(), output.display());

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Rules command - list groups and what the rule set says about them
fn rules_command(rules: &RulesConfig, input: &Path) -> Result<()> {
    let source = read_input(input)?;
    let document = ContainerExtractor::extract(&source);
    let groups = collect_groups(&document);
    let warnings = GroupRuleValidator::new(rules).evaluate(&groups);

    print!("{}", format_group_listing(rules.version, &groups, &warnings));
    Ok(())
}

fn format_group_listing(rules_version: u32, groups: &[GroupSummary], warnings: &[RuleWarning]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{} (rules v{})\n", "Groups:".bold(), rules_version));

    if groups.is_empty() {
        out.push_str(&format!("  {}\n", "No grouped selectors found".yellow()));
        return out;
    }

    for group in groups {
        out.push('\n');
        out.push_str(&format!("  {} {}\n", "●".bright_blue(), group.group_id.bold()));
        out.push_str(&format!("    Nodes:     {}\n", group.node_ids.join(", ")));
        out.push_str(&format!("    Shikigami: {}\n", group.shikigami.join(", ")));
        out.push_str(&format!("    Yuhun:     {}\n", group.yuhun.join(", ")));

        let mut clean = true;
        for warning in warnings.iter().filter(|w| w.group_id == group.group_id) {
            clean = false;
            out.push_str(&format!("    [{}] {}\n", warning.code.as_str().yellow().bold(), warning.message));
        }
        if clean {
            out.push_str(&format!("    {}\n", "✓ No rule warnings".green()));
        }
    }

    out.push('\n');
    out
}

fn format_report_summary(report: &Report) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "=".repeat(60).bright_blue()));
    out.push_str(&format!("{}\n", "Flow Diagram Check Report".bold().bright_blue()));
    out.push_str(&format!("{}\n", "=".repeat(60).bright_blue()));
    out.push('\n');

    out.push_str(&format!("Version: {}\n", report.version));
    out.push_str(&format!("Timestamp: {}\n", report.timestamp));
    out.push('\n');

    out.push_str(&format!("{}\n", "Summary:".bold()));
    out.push_str(&format!("  Nodes checked:  {}\n", report.summary.nodes_checked));
    out.push_str(&format!("  Groups checked: {}\n", report.summary.groups_checked));
    out.push_str(&format!("  Total diagnostics: {}\n", report.summary.total));

    if report.summary.errors > 0 {
        out.push_str(&format!("  Errors:   {}\n", format!("{}", report.summary.errors).red().bold()));
    } else {
        out.push_str(&format!("  Errors:   {}\n", format!("{}", report.summary.errors).green()));
    }

    if report.summary.warnings > 0 {
        out.push_str(&format!("  Warnings: {}\n", format!("{}", report.summary.warnings).yellow()));
    } else {
        out.push_str(&format!("  Warnings: {}\n", format!("{}", report.summary.warnings).green()));
    }

    out.push_str(&format!("  Info:     {}\n", report.summary.info));
    out.push('\n');

    if report.diagnostics.is_empty() {
        out.push_str(&format!("{}\n", "✓ No issues found!".green().bold()));
    } else {
        out.push_str(&format!("{}\n", "Diagnostics:".bold()));
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            out.push_str(&format!("  [{}] {}: {}\n", severity_str, diag.code, diag.message));

            if let Some(url) = &diag.url {
                out.push_str(&format!("    URL: {}\n", url));
            }

            if let Some(group_id) = &diag.group_id {
                out.push_str(&format!("    Group: {} ({} nodes)\n", group_id, diag.node_ids.len()));
                for node_id in &diag.node_ids {
                    out.push_str(&format!("      - {}\n", node_id));
                }
            }
        }
    }

    out.push('\n');
    out.push_str(&format!("{}\n", "=".repeat(60).bright_blue()));
    out
}

fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Flow Diagram Check Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- Nodes checked: {}\n", report.summary.nodes_checked));
    md.push_str(&format!("- Groups checked: {}\n", report.summary.groups_checked));
    md.push_str(&format!("- Total diagnostics: {}\n", report.summary.total));
    md.push_str(&format!("- Errors: {}\n", report.summary.errors));
    md.push_str(&format!("- Warnings: {}\n", report.summary.warnings));
    md.push_str(&format!("- Info: {}\n", report.summary.info));
    md.push('\n');

    if report.diagnostics.is_empty() {
        md.push_str("✅ **No issues found!**\n");
        return md;
    }

    md.push_str("## Diagnostics\n\n");

    for diag in &report.diagnostics {
        let severity_emoji = match diag.severity {
            Severity::Error => "❌",
            Severity::Warn => "⚠️",
            Severity::Info => "ℹ️",
        };

        md.push_str(&format!("### {} {} - {}\n\n", severity_emoji, diag.severity, diag.code));
        md.push_str(&format!("{}\n\n", diag.message));

        if let Some(url) = &diag.url {
            md.push_str(&format!("**URL:** `{}`\n\n", url));
        }

        if let Some(group_id) = &diag.group_id {
            md.push_str(&format!("**Group:** {}\n\n", group_id));
            for node_id in &diag.node_ids {
                md.push_str(&format!("- {}\n", node_id));
            }
            md.push('\n');
        }
    }

    md
}
