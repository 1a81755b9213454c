// Declare modules
pub mod cli;
pub mod colors;
pub mod config;
pub mod formatter;
pub mod git;
pub mod links;
pub mod models;
pub mod scanner;
pub mod sections;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::fs;
use std::io::{self, Write};

use self::cli::Cli;
use self::colors::ColorGenerator;
use self::config::resolve_config;
use self::formatter::OutputGenerator;
use self::git::{CommandRunner, SystemRunner};
use self::links::CiEnvironment;
use self::models::{GeneratorConfig, OutputFormat};
use self::scanner::Scanner;
use self::sections::build_sections;

/// Entry point: parses the process arguments and runs against the real environment.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();
    init_logging(args.log_level.into());

    run_with(args, &CiEnvironment::from_env(), &SystemRunner)
}

/// Initializes components and orchestrates data flow.
pub fn run_with(args: Cli, ci: &CiEnvironment, runner: &dyn CommandRunner) -> Result<()> {
    // 2. Resolve Configuration (fatal errors stop here, before any discovery)
    let config = resolve_config(args, ci, runner).context("Invalid configuration")?;

    log::info!("Scanning directory: {}", config.directory.display());
    log::debug!("Using repository URL: {:?}", config.repo_url);
    log::debug!("Link reference: {}", config.link_reference);

    // 3. Scan Directory
    let scanner = Scanner::new(config.directory.clone(), &config.ignore_list);
    let files = scanner.scan(config.respect_gitignore, runner);
    log::info!("Discovered {} files", files.len());
    for file in &files {
        log::trace!("Found {}", file.path.display());
    }

    // 4. Generate Output
    let sections = build_sections(&files, &config.categories, &config.repo_root_header);
    let content = match config.output_format {
        OutputFormat::Html => {
            let mut colors =
                ColorGenerator::new(&config.color).context("Invalid color preferences")?;
            OutputGenerator::render_html(&sections, &config, &mut colors)?
        }
        OutputFormat::Markdown => OutputGenerator::render_markdown(&sections, &config),
    };

    // 5. Write to file or stdout
    write_output(&config, &content)?;
    match &config.output_file {
        Some(path) => log::info!("Wrote file list to {}", path.display()),
        None => log::info!("Wrote file list to stdout"),
    }

    Ok(())
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: LevelFilter) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp_secs()
        .init();
}

fn write_output(config: &GeneratorConfig, content: &str) -> Result<()> {
    let Some(path) = &config.output_file else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes()).context("Failed to write to stdout")?;
        return stdout.flush().context("Failed to flush stdout");
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
