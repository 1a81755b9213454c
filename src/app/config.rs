use crate::app::cli::Cli;
use crate::app::colors::{ColorError, Rgb};
use crate::app::git::{CommandRunner, Git};
use crate::app::links::{self, CiEnvironment};
use crate::app::models::{
    Category, ColorPreferences, GeneratorConfig, LazyLoadPreferences, OutputFormat,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_IGNORE_LIST: &[&str] = &[
    ".git",
    "node_modules",
    ".DS_Store",
    ".history",
    "styles",
    "zwiftbikes",
    "__pycache__",
    ".pytest_cache",
];
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    (".user.css", "Userstyles"),
    (".user.js", "Userscripts"),
    (".css", "CSS"),
    (".js", "JavaScript"),
    (".yml", "YAML"),
];
pub const DEFAULT_COLOR_LIST: &[&str] = &[
    "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
];
pub const DEFAULT_HEADER_TEXT: &str = "## File List";
pub const DEFAULT_INTRO_TEXT: &str = "# Here is a list of files included in this repository:";
pub const DEFAULT_REPO_ROOT_HEADER: &str = "Repo Root";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access directory '{path}': {source}")]
    MissingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
    #[error("--file-categories expects EXT NAME pairs, got {0} values")]
    UnpairedCategories(usize),
    #[error("invalid {field}: {source}")]
    Color {
        field: &'static str,
        #[source]
        source: ColorError,
    },
    #[error("failed to read presets file {path}: {source}")]
    PresetsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse presets file {path}: {source}")]
    PresetsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Debug)]
struct PresetsFile {
    #[serde(flatten)]
    presets: HashMap<String, PresetConfig>,
}

#[derive(Deserialize, Debug, Clone)]
struct PresetCategory {
    ext: String,
    name: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
struct PresetConfig {
    categories: Option<Vec<PresetCategory>>,
    ignore_list: Option<Vec<String>>,
    color_list: Option<Vec<String>>,
    header_text: Option<String>,
    intro_text: Option<String>,
    repo_root_header: Option<String>,
    repo_url: Option<String>,
}

fn default_presets_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("file_index").join("presets.toml"))
}

fn load_presets_file(path: &Path) -> Result<HashMap<String, PresetConfig>, ConfigError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::PresetsRead {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: PresetsFile = toml::from_str(&content).map_err(|source| ConfigError::PresetsParse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parsed.presets)
}

/// Accepts `--opt "a b c"` as well as `--opt a b c`.
fn split_single_value(values: Option<Vec<String>>) -> Option<Vec<String>> {
    values.map(|values| match values.as_slice() {
        [single] if single.contains(char::is_whitespace) => {
            single.split_whitespace().map(str::to_string).collect()
        }
        _ => values.into_iter().filter(|v| !v.is_empty()).collect(),
    })
}

fn merge_vecs<T>(preset_vec: Option<Vec<T>>, cli_vec: Option<Vec<T>>) -> Vec<T> {
    let mut combined = preset_vec.unwrap_or_default();
    if let Some(mut cli_items) = cli_vec {
        combined.append(&mut cli_items);
    }
    combined
}

/// Trims, drops empties, and keeps the first occurrence of each token.
fn dedup_tokens(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty() && seen.insert(token.clone()))
        .collect()
}

fn parse_color(field: &'static str, value: &str) -> Result<Rgb, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::Color { field, source })
}

fn parse_categories(raw: Vec<String>) -> Result<Vec<Category>, ConfigError> {
    if raw.len() % 2 != 0 {
        return Err(ConfigError::UnpairedCategories(raw.len()));
    }
    Ok(raw
        .chunks(2)
        .map(|pair| Category::new(pair[0].clone(), pair[1].clone()))
        .collect())
}

/// Swaps the output extension to match the format when it names the other one.
fn adjust_output_name(name: &str, format: OutputFormat) -> String {
    let lower = name.to_lowercase();
    match format {
        OutputFormat::Html if lower.ends_with(".md") => {
            format!("{}.html", &name[..name.len() - 3])
        }
        OutputFormat::Markdown if lower.ends_with(".html") => {
            format!("{}.md", &name[..name.len() - 5])
        }
        _ => name.to_string(),
    }
}

pub fn resolve_config(
    cli: Cli,
    ci: &CiEnvironment,
    runner: &dyn CommandRunner,
) -> Result<GeneratorConfig, ConfigError> {
    let directory = cli
        .directory
        .canonicalize()
        .map_err(|source| ConfigError::MissingDirectory {
            path: cli.directory.clone(),
            source,
        })?;
    if !directory.is_dir() {
        return Err(ConfigError::NotADirectory(directory));
    }

    let presets_path = cli.presets_file.clone().or_else(default_presets_path);
    let presets = match presets_path {
        Some(path) => load_presets_file(&path)?,
        None => HashMap::new(),
    };

    // Determine preset to use: CLI flag > directory name > None
    let project_name = directory.file_name().and_then(|n| n.to_str());
    let preset_key = cli.preset.as_deref().or(project_name);
    let preset = preset_key
        .and_then(|k| presets.get(k))
        .cloned()
        .unwrap_or_default();
    if let Some(key) = preset_key.filter(|k| presets.contains_key(*k)) {
        log::debug!("Using preset '{}'", key);
    }

    // Colors
    let color_values = merge_vecs(preset.color_list, split_single_value(cli.color_list));
    let colors: Result<Vec<Rgb>, ConfigError> = if color_values.is_empty() {
        DEFAULT_COLOR_LIST.iter().map(|c| parse_color("color-list", c)).collect()
    } else {
        color_values.iter().map(|c| parse_color("color-list", c)).collect()
    };
    let colors = colors?;
    let range = match cli.color_range.as_deref() {
        Some([low, high]) => (parse_color("color-range", low)?, parse_color("color-range", high)?),
        _ => (Rgb::BLACK, Rgb::WHITE),
    };
    let exclude_blacks_threshold =
        parse_color("exclude-blacks-threshold", &cli.exclude_blacks_threshold)?;

    // Categories
    let preset_categories = preset
        .categories
        .map(|cats| cats.into_iter().map(|c| Category::new(c.ext, c.name)).collect());
    let cli_categories = split_single_value(cli.file_categories)
        .map(parse_categories)
        .transpose()?;
    let additional = merge_vecs(preset_categories, cli_categories);
    let categories = if cli.overwrite_file_categories {
        additional
    } else {
        let mut categories: Vec<Category> = DEFAULT_CATEGORIES
            .iter()
            .map(|(ext, name)| Category::new(*ext, *name))
            .collect();
        categories.extend(additional);
        categories
    };

    // Ignore list
    let additional = merge_vecs(preset.ignore_list, split_single_value(cli.ignore_list));
    let ignore_list = if cli.overwrite_ignore_list {
        dedup_tokens(additional)
    } else {
        let mut tokens: Vec<String> = DEFAULT_IGNORE_LIST.iter().map(|s| s.to_string()).collect();
        tokens.extend(additional);
        dedup_tokens(tokens)
    };

    // Links
    let git = Git::new(runner);
    let repo_url_arg = cli.repo_url.or(preset.repo_url);
    let repo_url = links::resolve_repo_url(
        repo_url_arg.as_deref(),
        Some(cli.fallback_repo_url.as_str()),
        &directory,
        ci,
        &git,
    );
    let link_reference = links::resolve_link_reference(
        cli.link_ref.as_deref(),
        cli.default_branch.as_deref(),
        &directory,
        ci,
        &git,
    );

    // Output destination
    let output_name = adjust_output_name(&cli.output_file, cli.output_format);
    let output_file = if cli.output_file_stdout || output_name.trim() == "-" {
        None
    } else {
        let candidate = PathBuf::from(&output_name);
        Some(if candidate.is_absolute() {
            candidate
        } else {
            directory.join(candidate)
        })
    };

    Ok(GeneratorConfig {
        repo_url,
        link_reference,
        output_format: cli.output_format,
        output_file,
        header_text: cli
            .header_text
            .or(preset.header_text)
            .unwrap_or_else(|| DEFAULT_HEADER_TEXT.to_string()),
        intro_text: cli
            .intro_text
            .or(preset.intro_text)
            .unwrap_or_else(|| DEFAULT_INTRO_TEXT.to_string()),
        repo_root_header: cli
            .repo_root_header
            .or(preset.repo_root_header)
            .unwrap_or_else(|| DEFAULT_REPO_ROOT_HEADER.to_string()),
        categories,
        ignore_list,
        color: ColorPreferences {
            source: cli.color_source,
            colors,
            range,
            max_attempts: cli.max_attempts.max(1),
            exclude_dark: cli.exclude_dark_colors,
            exclude_bright: cli.exclude_bright_colors,
            exclude_blacks: cli.exclude_blacks,
            exclude_blacks_threshold,
            ensure_readable: cli.ensure_readable_colors,
            dark_luminance_threshold: f64::from(cli.dark_color_luminance_threshold),
            bright_luminance_threshold: f64::from(cli.bright_color_luminance_threshold),
            seed: cli.color_seed,
        },
        lazy: LazyLoadPreferences {
            chunk_size: cli.chunk_size.max(1),
            viewport_mobile: cli.viewport_mobile,
            viewport_tablet: cli.viewport_tablet,
            viewport_small_desktop: cli.viewport_small_desktop,
            root_margin_mobile: cli.root_margin_mobile,
            root_margin_tablet: cli.root_margin_tablet,
            root_margin_small_desktop: cli.root_margin_small_desktop,
            root_margin_large_desktop: cli.root_margin_large_desktop,
        },
        respect_gitignore: cli.respect_gitignore,
        directory,
    })
}
