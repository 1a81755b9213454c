use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

use crate::app::models::{ColorSource, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate colorful HTML or Markdown file indexes for repositories"
)]
pub struct Cli {
    /// Root directory to scan
    #[arg(long, default_value = ".")]
    pub directory: PathBuf,

    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Named preset from the presets file (defaults to the scanned directory's name)
    #[arg(long)]
    pub preset: Option<String>,

    /// Presets file to read instead of ~/.config/file_index/presets.toml
    #[arg(long)]
    pub presets_file: Option<PathBuf>,

    /// Primary repository URL for generated links
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Repository URL used when automatic detection fails; empty for local links
    #[arg(long, default_value = crate::app::links::DEFAULT_FALLBACK_REPO_URL)]
    pub fallback_repo_url: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    pub output_format: OutputFormat,

    /// Destination file, relative to the scanned directory. Use '-' for stdout
    #[arg(long, default_value = "file_list.html")]
    pub output_file: String,

    /// Write to stdout regardless of --output-file
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_bool)]
    pub output_file_stdout: bool,

    #[arg(long, value_enum, default_value_t = ColorSource::Random)]
    pub color_source: ColorSource,

    /// Colors to cycle through when --color-source=list (hex codes)
    #[arg(long, num_args = 1..)]
    pub color_list: Option<Vec<String>>,

    /// Random color range bounds (#RRGGBB)
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub color_range: Option<Vec<String>>,

    /// Seed for the random color generator
    #[arg(long)]
    pub color_seed: Option<u64>,

    /// Maximum attempts when searching for compliant colors
    #[arg(long, default_value_t = 1_000_000)]
    pub max_attempts: usize,

    /// Exclude colors below the dark luminance threshold
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_bool)]
    pub exclude_dark_colors: bool,

    /// Exclude colors above the bright luminance threshold
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_bool)]
    pub exclude_bright_colors: bool,

    /// Exclude colors at or below the black threshold
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_bool)]
    pub exclude_blacks: bool,

    #[arg(long, default_value = "#222222")]
    pub exclude_blacks_threshold: String,

    /// Keep colors within a readable luminance band
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_bool)]
    pub ensure_readable_colors: bool,

    #[arg(long, default_value_t = 128)]
    pub dark_color_luminance_threshold: u32,

    #[arg(long, default_value_t = 200)]
    pub bright_color_luminance_threshold: u32,

    #[arg(long)]
    pub repo_root_header: Option<String>,

    #[arg(long)]
    pub header_text: Option<String>,

    #[arg(long)]
    pub intro_text: Option<String>,

    /// List items per lazily loaded chunk
    #[arg(long, default_value_t = 40)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 768)]
    pub viewport_mobile: u32,

    #[arg(long, default_value_t = 1024)]
    pub viewport_tablet: u32,

    #[arg(long, default_value_t = 1440)]
    pub viewport_small_desktop: u32,

    #[arg(long, default_value = "0px 0px 100px 0px")]
    pub root_margin_mobile: String,

    #[arg(long, default_value = "0px 0px 200px 0px")]
    pub root_margin_tablet: String,

    #[arg(long, default_value = "0px 0px 300px 0px")]
    pub root_margin_small_desktop: String,

    #[arg(long, default_value = "0px 0px 400px 0px")]
    pub root_margin_large_desktop: String,

    /// EXT NAME pairs appended to the default categories
    #[arg(long, num_args = 1..)]
    pub file_categories: Option<Vec<String>>,

    /// Replace the default categories instead of extending them
    #[arg(long)]
    pub overwrite_file_categories: bool,

    /// Path segments to ignore during discovery
    #[arg(long, num_args = 1..)]
    pub ignore_list: Option<Vec<String>>,

    /// Replace the default ignore list instead of extending it
    #[arg(long)]
    pub overwrite_ignore_list: bool,

    /// Prefer `git ls-files` so .gitignore rules are honoured
    #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value = "false",
          default_missing_value = "true", value_parser = parse_bool)]
    pub respect_gitignore: bool,

    /// Explicit branch, tag, or SHA to use when building links
    #[arg(long)]
    pub link_ref: Option<String>,

    /// Fallback branch name when --link-ref is not supplied
    #[arg(long)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => LevelFilter::Error,
        }
    }
}

pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("expected a boolean value, received '{}'", value)),
    }
}
