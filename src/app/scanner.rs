use crate::app::git::{CommandRunner, Git};
use crate::app::models::FileEntry;
use ignore::WalkBuilder;
use pathdiff::diff_paths;
use std::path::{Component, Path, PathBuf};

/// True iff a non-empty, trimmed token equals one whole segment of `path`.
pub fn should_ignore(path: &Path, ignore_list: &[String]) -> bool {
    let segments: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    ignore_list
        .iter()
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .any(|token| segments.contains(&token))
}

pub struct Scanner {
    root: PathBuf,
    ignore_list: Vec<String>,
}

impl Scanner {
    pub fn new(root: PathBuf, ignore_list: &[String]) -> Self {
        Self {
            root,
            ignore_list: ignore_list.to_vec(),
        }
    }

    /// Git-aware discovery when requested, with a silent fallback to the filesystem walk.
    pub fn scan(&self, respect_gitignore: bool, runner: &dyn CommandRunner) -> Vec<FileEntry> {
        if respect_gitignore {
            if let Some(entries) = self.collect_via_git(runner) {
                return entries;
            }
            log::info!("Falling back to filesystem traversal; git-aware discovery unavailable.");
        }
        self.collect_via_walk()
    }

    /// Lists files through `git ls-files`. `None` when git cannot answer for this root.
    pub fn collect_via_git(&self, runner: &dyn CommandRunner) -> Option<Vec<FileEntry>> {
        let git = Git::new(runner);
        let toplevel = match git.toplevel(&self.root) {
            Ok(path) => path,
            Err(err) => {
                log::debug!("Unable to determine git repository root: {}", err);
                return None;
            }
        };
        let repo_root = toplevel.canonicalize().unwrap_or(toplevel);

        if !self.root.starts_with(&repo_root) {
            log::debug!(
                "Directory '{}' is not contained within git root '{}'",
                self.root.display(),
                repo_root.display()
            );
            return None;
        }

        let listed = match git.ls_files(&repo_root) {
            Ok(files) => files,
            Err(err) => {
                log::debug!("git ls-files failed: {}", err);
                return None;
            }
        };

        let mut entries: Vec<FileEntry> = listed
            .iter()
            .filter_map(|line| self.process_path(&repo_root.join(line)))
            .collect();
        sort_entries(&mut entries);

        log::debug!("Collected {} files via git ls-files", entries.len());
        Some(entries)
    }

    /// Recursive walk that prunes ignored directories instead of descending into them.
    pub fn collect_via_walk(&self) -> Vec<FileEntry> {
        let mut entries = Vec::new();

        let root = self.root.clone();
        let ignore_list = self.ignore_list.clone();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false) // Only ignore tokens decide here
            .follow_links(false)
            .filter_entry(move |entry| match entry.path().strip_prefix(&root) {
                Ok(relative) => !should_ignore(relative, &ignore_list),
                Err(_) => true,
            })
            .build();

        for result in walker {
            match result {
                Ok(entry) => {
                    if entry.depth() == 0 || entry.path().is_dir() {
                        continue;
                    }
                    if let Some(processed) = self.process_path(entry.path()) {
                        entries.push(processed);
                    }
                }
                Err(err) => log::warn!("Error walking entry: {}", err),
            }
        }

        sort_entries(&mut entries);
        log::debug!("Collected {} files via filesystem walk", entries.len());
        entries
    }

    fn process_path(&self, path: &Path) -> Option<FileEntry> {
        // Paths outside the scan root come back with a leading `..`
        let relative = diff_paths(path, &self.root)?;
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return None;
        }
        if relative.as_os_str().is_empty() || should_ignore(&relative, &self.ignore_list) {
            return None;
        }

        let relative_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Some(FileEntry {
            path: path.to_path_buf(),
            relative_path,
        })
    }
}

/// Case-insensitive by relative path, exact bytes break ties.
fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        a.relative_path
            .to_lowercase()
            .cmp(&b.relative_path.to_lowercase())
            .then_with(|| a.relative_path.cmp(&b.relative_path))
    });
}
