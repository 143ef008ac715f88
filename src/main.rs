//! treesum CLI - checksum manifests for directory trees

use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing_subscriber::EnvFilter;
use treesum::config::{ChecksumConfig, CliArgs, Mode, SummaryFormat};
use treesum::core::{CreateOrUpdateEngine, VerifyEngine};
use treesum::error::{ChecksumError, IoResultExt, Result};
use treesum::hash::{AlgorithmRegistry, HashAlgorithm};
use treesum::manifest::PreviousManifest;

fn main() {
    let args = CliArgs::parse();

    // Logs go to stderr so a manifest written to stdout stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!args.no_color)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns false when verification found failures
fn run(args: CliArgs) -> Result<bool> {
    let registry = AlgorithmRegistry::standard();
    let config = ChecksumConfig::from_cli(&args);
    config.validate()?;
    let algorithm = config.resolve_algorithm(&registry)?;

    tracing::debug!(
        mode = %config.mode,
        manifest = %config.manifest.display(),
        base = %config.base_path.display(),
        threads = config.threads,
        "Configuration"
    );

    match config.mode {
        Mode::Verify => cmd_verify(&config, algorithm, &registry),
        Mode::Create | Mode::Update => {
            let algorithm = algorithm.unwrap_or_else(|| registry.default_algorithm());
            cmd_create_or_update(&config, algorithm)?;
            Ok(true)
        }
    }
}

fn cmd_verify(
    config: &ChecksumConfig,
    algorithm: Option<HashAlgorithm>,
    registry: &AlgorithmRegistry,
) -> Result<bool> {
    let engine = VerifyEngine::new(&config.base_path)
        .with_algorithm(algorithm)
        .with_seed(config.seed)
        .with_threads(config.threads);

    let summary = if config.uses_stdio() {
        engine.run(std::io::stdin().lock(), Path::new("<stdin>"), registry)?
    } else {
        let file = File::open(&config.manifest).map_err(|e| ChecksumError::ManifestUnreadable {
            path: config.manifest.clone(),
            source: e,
        })?;
        engine.run(BufReader::new(file), &config.manifest, registry)?
    };

    print_summary(&summary, config.summary_format, false)?;
    Ok(summary.is_success())
}

fn cmd_create_or_update(config: &ChecksumConfig, algorithm: HashAlgorithm) -> Result<()> {
    let engine = CreateOrUpdateEngine::new(&config.base_path, algorithm)
        .with_seed(config.seed)
        .with_threads(config.threads);

    if config.uses_stdio() {
        let report = engine.run(std::io::stdout().lock(), None)?;
        return print_summary(&report, config.summary_format, true);
    }

    let manifest = &config.manifest;
    let mut previous = None;
    if manifest.exists() {
        if config.mode == Mode::Update {
            let loaded = PreviousManifest::load(manifest, &algorithm)?;
            if loaded.has_errors()
                && !confirm(
                    config,
                    &format!(
                        "Checksum file '{}' contains invalid or duplicate records, continue? [y/n]",
                        manifest.display()
                    ),
                )?
            {
                return Ok(());
            }
            previous = Some(loaded);
        } else if !confirm(
            config,
            &format!(
                "The existing file '{}' will be overwritten, do you want to continue? [y/n]",
                manifest.display()
            ),
        )? {
            return Ok(());
        }
    } else if config.mode == Mode::Update
        && !confirm(
            config,
            &format!(
                "Checksum file '{}' does not exist, create it? [y/n]",
                manifest.display()
            ),
        )?
    {
        return Ok(());
    }

    let output = File::create(manifest).with_path(manifest)?;
    let report = engine
        .with_exclude(Some(manifest.clone()))
        .run(output, previous)?;
    print_summary(&report, config.summary_format, false)
}

/// Ask on stderr, read y/n from stdin; `--yes` answers for the user
fn confirm(config: &ChecksumConfig, question: &str) -> Result<bool> {
    if config.assume_yes {
        return Ok(true);
    }
    eprintln!("{}", question);
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

fn print_summary<T>(summary: &T, format: SummaryFormat, to_stderr: bool) -> Result<()>
where
    T: Serialize + std::fmt::Display,
{
    let rendered = match format {
        SummaryFormat::Text => summary.to_string(),
        SummaryFormat::Json => serde_json::to_string_pretty(summary)? + "\n",
    };
    if to_stderr {
        eprint!("{}", rendered);
    } else {
        print!("{}", rendered);
    }
    Ok(())
}
