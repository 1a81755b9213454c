use crate::app::colors::ColorGenerator;
use crate::app::links::build_file_url;
use crate::app::models::{GeneratorConfig, LazyLoadPreferences, Section};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

const PLACEHOLDER_CLASS: &str = "lazyload-placeholder";
const NO_FILES_NOTICE: &str = "<p>No files found.</p>";

/// One IntersectionObserver configuration, chosen client-side by viewport width.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewportRule<'a> {
    max_width: Option<u32>,
    root_margin: &'a str,
    threshold: f64,
}

pub struct OutputGenerator;

impl OutputGenerator {
    /// HTML fragment: header, lazily populated placeholders, and the loader script.
    pub fn render_html(
        sections: &[Section],
        config: &GeneratorConfig,
        colors: &mut ColorGenerator,
    ) -> Result<String> {
        let mut content_parts = Vec::new();

        let mut header_parts = Vec::new();
        let header = strip_heading_marker(&config.header_text);
        if !header.is_empty() {
            header_parts.push(format!("<h1>{}</h1>", html_escape(header)));
        }
        let intro = strip_heading_marker(&config.intro_text);
        if !intro.is_empty() {
            header_parts.push(format!("<p>{}</p>", html_escape(intro)));
        }
        if !header_parts.is_empty() {
            content_parts.push(header_parts.join("\n"));
        }

        let mut items = Vec::new();
        for section in sections {
            items.push(format!(
                "<li><h2 style=\"color: {};\">{}</h2></li>",
                colors.next_color(),
                html_escape(&section.title)
            ));
            for entry in &section.entries {
                let url = build_file_url(config.repo_url.as_deref(), &config.link_reference, entry);
                items.push(format!(
                    "<li><a href=\"{}\" style=\"color: {};\">{}</a></li>",
                    html_escape(&url),
                    colors.next_color(),
                    html_escape(entry)
                ));
            }
        }

        if items.is_empty() {
            content_parts.push(NO_FILES_NOTICE.to_string());
            return Ok(finish(&content_parts, "\n\n"));
        }

        // Chunks cut straight across section boundaries.
        let mut chunk_data = BTreeMap::new();
        let mut placeholders = Vec::new();
        for (idx, chunk) in items.chunks(config.lazy.chunk_size.max(1)).enumerate() {
            let key = format!("file-list-{}", idx + 1);
            placeholders.push(format!(
                "<div class=\"{}\" data-content=\"{}\" style=\"min-height: 400px;\"></div>",
                PLACEHOLDER_CLASS, key
            ));
            chunk_data.insert(key, format!("<ul>{}</ul>", chunk.join("\n")));
        }

        content_parts.push(placeholders.join("\n"));
        content_parts.push(lazyload_script(&config.lazy, &chunk_data)?);
        Ok(finish(&content_parts, "\n\n"))
    }

    /// Fully materialized Markdown index.
    pub fn render_markdown(sections: &[Section], config: &GeneratorConfig) -> String {
        let mut lines = Vec::new();

        let header = config.header_text.trim();
        if !header.is_empty() {
            lines.push(as_heading(header, "##"));
            lines.push(String::new());
        }

        let intro = config.intro_text.trim();
        if !intro.is_empty() {
            lines.push(intro.to_string());
            lines.push(String::new());
        }

        for section in sections {
            let title = section.title.trim();
            if !title.is_empty() {
                lines.push(as_heading(title, "###"));
                lines.push(String::new());
            }
            for entry in &section.entries {
                let url = build_file_url(config.repo_url.as_deref(), &config.link_reference, entry);
                lines.push(format!("- [{}]({})", html_escape(entry), url));
            }
            lines.push(String::new());
        }

        finish(&lines, "\n")
    }
}

/// Titles that already carry a Markdown heading marker are used verbatim.
fn as_heading(title: &str, marker: &str) -> String {
    if title.starts_with('#') {
        title.to_string()
    } else {
        format!("{} {}", marker, title)
    }
}

fn strip_heading_marker(text: &str) -> &str {
    text.trim().trim_start_matches('#').trim()
}

fn finish(parts: &[String], separator: &str) -> String {
    let mut out = parts.join(separator).trim().to_string();
    out.push('\n');
    out
}

fn lazyload_script(
    lazy: &LazyLoadPreferences,
    chunk_data: &BTreeMap<String, String>,
) -> Result<String> {
    let rules = [
        ViewportRule {
            max_width: Some(lazy.viewport_mobile),
            root_margin: &lazy.root_margin_mobile,
            threshold: 0.1,
        },
        ViewportRule {
            max_width: Some(lazy.viewport_tablet),
            root_margin: &lazy.root_margin_tablet,
            threshold: 0.3,
        },
        ViewportRule {
            max_width: Some(lazy.viewport_small_desktop),
            root_margin: &lazy.root_margin_small_desktop,
            threshold: 0.4,
        },
        ViewportRule {
            max_width: None,
            root_margin: &lazy.root_margin_large_desktop,
            threshold: 0.5,
        },
    ];

    Ok(format!(
        r#"<script>
document.addEventListener("DOMContentLoaded", function() {{
  const chunkData = {chunks};
  const lazyLoadElements = document.querySelectorAll(".{class}");
  if (!lazyLoadElements.length) {{
    return;
  }}
  const viewportRules = {rules};
  function pickObserverConfig(width) {{
    for (const rule of viewportRules) {{
      if (rule.maxWidth === null || width <= rule.maxWidth) {{
        return rule;
      }}
    }}
    return viewportRules[viewportRules.length - 1];
  }}
  function populate(placeholder) {{
    const key = placeholder.dataset.content;
    if (chunkData[key]) {{
      placeholder.innerHTML = chunkData[key];
    }}
  }}
  const width = window.innerWidth || document.documentElement.clientWidth || 0;
  const currentConfig = pickObserverConfig(width);
  if ("IntersectionObserver" in window) {{
    const observer = new IntersectionObserver((entries, obs) => {{
      entries.forEach(entry => {{
        if (entry.isIntersecting) {{
          populate(entry.target);
          obs.unobserve(entry.target);
        }}
      }});
    }}, {{ rootMargin: currentConfig.rootMargin, threshold: currentConfig.threshold }});
    lazyLoadElements.forEach(element => observer.observe(element));
  }} else {{
    lazyLoadElements.forEach(populate);
  }}
}});
</script>"#,
        chunks = script_json(chunk_data)?,
        class = PLACEHOLDER_CLASS,
        rules = script_json(&rules)?,
    ))
}

/// JSON safe to inline in a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::colors::Rgb;
    use crate::app::models::{
        Category, ColorPreferences, ColorSource, FileEntry, LazyLoadPreferences, OutputFormat,
    };
    use crate::app::sections::build_sections;
    use std::path::PathBuf;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            directory: PathBuf::from("/tmp/repo"),
            repo_url: Some("https://example.com/repo".into()),
            link_reference: "main".into(),
            output_format: OutputFormat::Markdown,
            output_file: None,
            header_text: "## File List".into(),
            intro_text: "Intro".into(),
            repo_root_header: "Root".into(),
            categories: vec![Category::new(".py", "Python"), Category::new(".md", "Markdown")],
            ignore_list: vec![".git".into()],
            color: ColorPreferences {
                source: ColorSource::List,
                colors: vec![Rgb::new(0x11, 0x22, 0x33), Rgb::new(0x44, 0x55, 0x66)],
                range: (Rgb::BLACK, Rgb::WHITE),
                max_attempts: 10,
                exclude_dark: false,
                exclude_bright: false,
                exclude_blacks: false,
                exclude_blacks_threshold: Rgb::BLACK,
                ensure_readable: false,
                dark_luminance_threshold: 0.0,
                bright_luminance_threshold: 255.0,
                seed: Some(1),
            },
            lazy: LazyLoadPreferences {
                chunk_size: 2,
                viewport_mobile: 640,
                viewport_tablet: 1024,
                viewport_small_desktop: 1366,
                root_margin_mobile: "0px 0px 100px 0px".into(),
                root_margin_tablet: "0px 0px 200px 0px".into(),
                root_margin_small_desktop: "0px 0px 300px 0px".into(),
                root_margin_large_desktop: "0px 0px 400px 0px".into(),
            },
            respect_gitignore: false,
        }
    }

    fn sections(config: &GeneratorConfig, paths: &[&str]) -> Vec<Section> {
        let files: Vec<FileEntry> = paths
            .iter()
            .map(|p| FileEntry {
                path: config.directory.join(p),
                relative_path: p.to_string(),
            })
            .collect();
        build_sections(&files, &config.categories, &config.repo_root_header)
    }

    fn html(config: &GeneratorConfig, paths: &[&str]) -> String {
        let mut colors = ColorGenerator::new(&config.color).unwrap();
        OutputGenerator::render_html(&sections(config, paths), config, &mut colors).unwrap()
    }

    #[test]
    fn markdown_groups_files() {
        let config = config();
        let output = OutputGenerator::render_markdown(
            &sections(&config, &["main.py", "docs/data.csv", "notes.txt"]),
            &config,
        );
        assert!(output.starts_with("## File List\n\nIntro\n\n### Root\n"));
        assert!(output.contains("### Python"));
        assert!(output.contains("- [main.py](https://example.com/repo/blob/main/main.py)"));
        assert!(output.contains("\n### docs\n"));
        assert!(output
            .contains("- [docs/data.csv](https://example.com/repo/blob/main/docs/data.csv)"));
        assert!(output.contains("- [notes.txt](https://example.com/repo/blob/main/notes.txt)"));
        assert!(output.ends_with("docs/data.csv)\n"));
    }

    #[test]
    fn markdown_lists_every_file_exactly_once() {
        let config = config();
        let paths = ["a.py", "b/c.md", "b/d.txt", "e.txt", "f/g/h.rs"];
        let output = OutputGenerator::render_markdown(&sections(&config, &paths), &config);
        let bullets: Vec<&str> = output.lines().filter(|l| l.starts_with("- [")).collect();
        assert_eq!(bullets.len(), paths.len());
        for path in paths {
            let prefix = format!("- [{}]", path);
            assert_eq!(bullets.iter().filter(|l| l.starts_with(&prefix)).count(), 1);
        }
    }

    #[test]
    fn markdown_titles_with_heading_marker_are_verbatim() {
        let mut config = config();
        config.header_text = "File List".into();
        config.repo_root_header = "# Top".into();
        let output = OutputGenerator::render_markdown(&sections(&config, &["a.txt"]), &config);
        assert!(output.starts_with("## File List\n"));
        assert!(output.contains("\n# Top\n"));
    }

    #[test]
    fn markdown_without_files_has_no_bullets() {
        let config = config();
        let output = OutputGenerator::render_markdown(&[], &config);
        assert_eq!(output, "## File List\n\nIntro\n");
        assert!(!output.contains("- ["));
    }

    #[test]
    fn html_chunks_into_placeholders() {
        let config = config();
        // 5 root files plus the section heading: 6 items, 3 chunks
        let files = ["file_0.txt", "file_1.txt", "file_2.txt", "file_3.txt", "file_4.txt"];
        let output = html(&config, &files);
        assert_eq!(output.matches("class=\"lazyload-placeholder\"").count(), 3);
        assert_eq!(output.matches("<script>").count(), 1);
        for key in ["file-list-1", "file-list-2", "file-list-3"] {
            assert!(output.contains(&format!("data-content=\"{}\"", key)));
            assert!(output.contains(&format!("\"{}\":\"<ul>", key)));
        }
        assert!(output.contains("file_0.txt"));
        assert!(output.contains("\"maxWidth\":640"));
        assert!(output.contains("\"maxWidth\":null"));
    }

    #[test]
    fn html_colors_each_item_in_turn() {
        let config = config();
        let output = html(&config, &["a.txt"]);
        assert!(output.contains(r#"<h2 style=\"color: #112233;\">Root<\/h2>"#));
        assert!(output.contains(concat!(
            r#"<a href=\"https://example.com/repo/blob/main/a.txt\" "#,
            r#"style=\"color: #445566;\">a.txt<\/a>"#
        )));
    }

    #[test]
    fn html_escapes_names_and_header() {
        let mut config = config();
        config.header_text = "## Files & <things>".into();
        let output = html(&config, &["a<b>.txt"]);
        assert!(output.starts_with("<h1>Files &amp; &lt;things&gt;</h1>\n<p>Intro</p>"));
        assert!(output.contains("a&lt;b&gt;.txt"));
        assert!(!output.contains("a<b>.txt"));
    }

    #[test]
    fn html_without_files_renders_notice_only() {
        let config = config();
        let output = html(&config, &[]);
        assert!(output.contains("<p>No files found.</p>"));
        assert!(!output.contains("lazyload-placeholder"));
        assert!(!output.contains("<script>"));
    }
}
