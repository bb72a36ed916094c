use clap::{Parser, Subcommand};
use miette::Report;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokens_core::api::BuildSummary;
use tokens_core::config::DEFAULT_CONFIG_FILE;
use tokens_core::store::SourceCache;
use tokens_core::watch::DEFAULT_DEBOUNCE;
use tokens_core::{watch, BuildOptions, BuildTarget, Project, TokenError};

/// Builds design-token sources into CSS, SCSS, TypeScript, JSON, Markdown
/// and Figma outputs.
#[derive(Parser, Debug)]
#[command(name = "tokens", version, about)]
struct Cli {
    /// Path to the build configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build every configured format.
    Build {
        /// Write outputs even when validation finds errors.
        #[arg(long)]
        skip_validation: bool,
    },
    /// Build CSS, TypeScript and JSON under a custom prefix.
    BuildCustom {
        /// Overrides the prefix from the custom config file.
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Build one output set per brand.
    BuildBrands {
        /// Only build these brands.
        #[arg(long = "brand")]
        brands: Vec<String>,
    },
    /// Validate token sources.
    Validate,
    /// Report token paths defined in more than one file.
    Collisions,
    /// Rebuild whenever a source file changes.
    Watch {
        /// Quiet period before a rebuild, in milliseconds.
        #[arg(long, default_value_t = DEFAULT_DEBOUNCE.as_millis() as u64)]
        debounce_ms: u64,
        /// Also rebuild every brand.
        #[arg(long)]
        brands: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", Report::new(err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), TokenError> {
    let project = Project::open(&cli.config)?;
    let mut cache = SourceCache::new();

    match cli.command {
        Command::Build { skip_validation } => {
            let options = BuildOptions { skip_validation };
            let summary = project.build(&BuildTarget::Default, &options, &mut cache)?;
            log_summary(&summary);
        }
        Command::BuildCustom { prefix } => {
            let target = BuildTarget::Custom { prefix };
            let summary = project.build(&target, &BuildOptions::default(), &mut cache)?;
            log_summary(&summary);
        }
        Command::BuildBrands { brands } => {
            for summary in project.build_brands(&brands, &BuildOptions::default(), &mut cache)? {
                log_summary(&summary);
            }
        }
        Command::Validate => {
            let analysis = project.analyze_all(&mut cache)?;
            let issues = analysis.issues();
            for issue in &issues {
                eprintln!("{:?}", Report::new(issue.clone()));
            }
            let errors = issues.iter().filter(|i| i.is_error()).count();
            log::info!(
                "{} token(s) checked across {} target(s): {} error(s), {} warning(s)",
                analysis.token_count(),
                analysis.targets.len(),
                errors,
                issues.len() - errors
            );
            analysis.gate()?;
        }
        Command::Collisions => {
            let analysis = project.analyze_all(&mut cache)?;
            for (target, target_analysis) in &analysis.targets {
                for collision in &target_analysis.collisions.collisions {
                    let files: Vec<&str> = collision
                        .entries
                        .iter()
                        .map(|e| e.source_file.as_str())
                        .collect();
                    log::info!(
                        "{target}: {} ({:?}): {}",
                        collision.path,
                        collision.kind,
                        files.join(", ")
                    );
                }
            }
            analysis.check_collisions()?;
        }
        Command::Watch {
            debounce_ms,
            brands,
        } => {
            let mut targets = vec![BuildTarget::Default];
            if brands {
                targets.extend(project.brand_names()?.into_iter().map(BuildTarget::Brand));
            }
            watch::watch(&project, &targets, Duration::from_millis(debounce_ms))?;
        }
    }
    Ok(())
}

fn log_summary(summary: &BuildSummary) {
    log::info!(
        "{} build: {} file(s), {} warning(s), {} unresolved token(s)",
        summary.target,
        summary.written.len(),
        summary.warnings,
        summary.unresolved
    );
}
