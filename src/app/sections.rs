use std::collections::BTreeMap;

use crate::app::models::{Category, FileEntry, Section};

/// Groups discovered files into render-ordered sections.
///
/// Each path goes to the first category whose suffix matches; the rest land in
/// the root section or in a section keyed by their full parent directory.
pub fn build_sections(
    files: &[FileEntry],
    categories: &[Category],
    root_title: &str,
) -> Vec<Section> {
    let mut root_files = Vec::new();
    // One bucket per distinct category name, in first-occurrence order;
    // `slots[i]` is the bucket of `categories[i]`.
    let mut category_names: Vec<&str> = Vec::new();
    let mut slots = Vec::with_capacity(categories.len());
    for category in categories {
        let slot = match category_names.iter().position(|name| *name == category.name) {
            Some(slot) => slot,
            None => {
                category_names.push(&category.name);
                category_names.len() - 1
            }
        };
        slots.push(slot);
    }
    let mut category_files: Vec<Vec<String>> = vec![Vec::new(); category_names.len()];
    let mut folders: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for file in files {
        let path = &file.relative_path;
        if let Some(idx) = categories.iter().position(|c| c.matches(path)) {
            category_files[slots[idx]].push(path.clone());
            continue;
        }

        match path.rsplit_once('/') {
            Some((folder, _)) => folders.entry(folder.to_string()).or_default().push(path.clone()),
            None => root_files.push(path.clone()),
        }
    }

    let mut sections = Vec::new();
    if !root_files.is_empty() {
        sections.push(section(root_title, root_files));
    }
    for (name, entries) in category_names.into_iter().zip(category_files) {
        if !entries.is_empty() {
            sections.push(section(name, entries));
        }
    }

    let mut folders: Vec<(String, Vec<String>)> = folders.into_iter().collect();
    folders.sort_by(|(a, _), (b, _)| case_insensitive(a, b));
    sections.extend(folders.into_iter().map(|(folder, entries)| section(&folder, entries)));
    sections
}

fn section(title: &str, mut entries: Vec<String>) -> Section {
    entries.sort_by(|a, b| case_insensitive(a, b));
    Section {
        title: title.to_string(),
        entries,
    }
}

fn case_insensitive(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
