use std::path::PathBuf;

use clap::ValueEnum;

use crate::app::colors::Rgb;

/// Maps a file-name suffix to the section it is listed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub ext: String,
    pub name: String,
}

impl Category {
    pub fn new(ext: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ext: ext.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive suffix match against a relative path.
    pub fn matches(&self, relative_path: &str) -> bool {
        relative_path
            .to_lowercase()
            .ends_with(&self.ext.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Html,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorSource {
    /// Rejection-sample colors from an RGB range
    #[value(alias = "random-range")]
    Random,
    /// Cycle through a fixed list of colors
    #[value(alias = "fixed-list")]
    List,
}

#[derive(Debug, Clone)]
pub struct ColorPreferences {
    pub source: ColorSource,
    pub colors: Vec<Rgb>,
    pub range: (Rgb, Rgb),
    pub max_attempts: usize,
    pub exclude_dark: bool,
    pub exclude_bright: bool,
    pub exclude_blacks: bool,
    pub exclude_blacks_threshold: Rgb,
    pub ensure_readable: bool,
    pub dark_luminance_threshold: f64,
    pub bright_luminance_threshold: f64,
    /// Fixed seed for reproducible colors; entropy-seeded when absent.
    pub seed: Option<u64>,
}

/// Client-side lazy loading knobs for the HTML output.
#[derive(Debug, Clone)]
pub struct LazyLoadPreferences {
    pub chunk_size: usize,
    pub viewport_mobile: u32,
    pub viewport_tablet: u32,
    pub viewport_small_desktop: u32,
    pub root_margin_mobile: String,
    pub root_margin_tablet: String,
    pub root_margin_small_desktop: String,
    pub root_margin_large_desktop: String,
}

/// Represents the final configuration after merging presets, CLI args and CI environment.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub directory: PathBuf,
    pub repo_url: Option<String>,
    pub link_reference: String,
    pub output_format: OutputFormat,
    /// `None` writes to stdout.
    pub output_file: Option<PathBuf>,
    pub header_text: String,
    pub intro_text: String,
    pub repo_root_header: String,
    pub categories: Vec<Category>,
    pub ignore_list: Vec<String>,
    pub color: ColorPreferences,
    pub lazy: LazyLoadPreferences,
    pub respect_gitignore: bool,
}

/// Represents a single file discovered during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Relative to the scan root, always `/`-separated.
    pub relative_path: String,
}

/// A titled group of relative paths in render order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub entries: Vec<String>,
}
