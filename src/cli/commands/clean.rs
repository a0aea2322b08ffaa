use anyhow::Result;
use colored::Colorize;
use delovable::config::Config;
use delovable::error::DelovableError;
use delovable::process::{FileStatus, ManifestOutcome, ProcessOptions, ProcessReport};
use delovable::remote::{GitFetcher, RepositoryFetcher, RepositoryRef};
use delovable::validation::InputValidator;
use delovable::Delovable;
use std::path::PathBuf;

use crate::cli::Cli;

pub fn handle(cli: &Cli) -> Result<()> {
    let config = Config::load_or_default(cli.signatures.as_deref())?;
    let delovable = Delovable::new(config)?;

    let project_root = resolve_input(cli)?;

    println!(
        "{} {}",
        "Scanning project at".bright_blue().bold(),
        project_root.display()
    );
    println!("{} {}", "Target platform:".bright_blue(), cli.platform);
    if cli.dry_run {
        println!("{}", "Dry run, no files will be written".bright_yellow());
    }

    let options = ProcessOptions {
        platform: cli.platform,
        dry_run: cli.dry_run,
        parallel: !cli.no_parallel,
        follow_links: cli.follow_links,
    };
    let report = delovable.process(&project_root, &options)?;

    if cli.verbose {
        print_details(&report);
    }

    for warning in report.warnings() {
        eprintln!("{} {}", "⚠".bright_yellow(), warning);
    }

    print_summary(&report);

    if !cli.platform.is_none() {
        println!(
            "{} Project is now ready for deployment to {}",
            "→".bright_cyan(),
            cli.platform.to_string().bright_cyan()
        );
    }

    Ok(())
}

/// A local path is used as is; a repository URL is cloned first
fn resolve_input(cli: &Cli) -> Result<PathBuf> {
    if !RepositoryRef::is_url(&cli.input) {
        if cli.output.is_some() {
            tracing::warn!("--output only applies to repository URLs, ignoring it");
        }
        return Ok(PathBuf::from(&cli.input));
    }

    let repo = RepositoryRef::parse(&cli.input).map_err(DelovableError::from)?;
    let dest = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&repo.repo));
    InputValidator::validate_output_dir(&dest)?;

    println!(
        "{} {} into {}",
        "Cloning".bright_blue().bold(),
        repo,
        dest.display()
    );
    let checkout = GitFetcher::new()
        .fetch(&repo, &dest)
        .map_err(DelovableError::from)?;

    Ok(checkout)
}

fn print_details(report: &ProcessReport) {
    for line in report.log_lines() {
        println!("  {} {}", "•".bright_black(), line);
    }

    for file in &report.files {
        if let FileStatus::Cleaned { hits } = &file.status {
            for hit in hits {
                println!(
                    "    {} {} x{}",
                    file.path.display().to_string().bright_black(),
                    hit.rule,
                    hit.count
                );
            }
        }
    }
}

fn print_summary(report: &ProcessReport) {
    let manifest_changed = matches!(report.manifest, ManifestOutcome::Cleaned { .. });
    let cleaned = report.cleaned_files().count();

    if !report.changed() {
        println!(
            "\n{} No Lovable metadata found, nothing to do",
            "✓".bright_green().bold()
        );
        return;
    }

    let verb = if report.dry_run { "Would remove" } else { "Removed" };
    println!(
        "\n{} {} Lovable metadata ({} manifest, {} markup file(s))",
        "✓".bright_green().bold(),
        verb,
        if manifest_changed { "1" } else { "0" },
        cleaned
    );

    if let Some(deployment) = report.deployment.as_ref().filter(|d| d.created) {
        if let Some(path) = &deployment.path {
            let verb = if report.dry_run { "Would create" } else { "Created" };
            println!("{} {} {}", "✓".bright_green().bold(), verb, path.display());
        }
    }
}
