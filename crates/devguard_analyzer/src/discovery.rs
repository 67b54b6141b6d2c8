//! Source file discovery.
//!
//! Walks a project root with `ignore::WalkBuilder` (so `.gitignore` is
//! honored) and additionally skips the directories the original analyzer
//! hard-excludes regardless of `.gitignore` contents.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    ".archived",
    "target",
    "dist",
    "build",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

impl Language {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Self::Python),
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "jsx" => Some(Self::Jsx),
            "tsx" => Some(Self::Tsx),
            _ => None,
        }
    }

    pub fn is_typescript(self) -> bool {
        matches!(self, Self::TypeScript | Self::Tsx)
    }

    pub fn is_jsx(self) -> bool {
        matches!(self, Self::Jsx | Self::Tsx)
    }
}

pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
}

pub fn discover(root: &Path) -> Vec<SourceFile> {
    let mut files = Vec::new();
    let mut walker = WalkBuilder::new(root);
    walker.hidden(false).git_ignore(true);

    for entry in walker.build() {
        let Ok(entry) = entry else { continue };
        let path = entry.path();

        if path
            .components()
            .any(|c| is_skipped_component(c.as_os_str().to_string_lossy().as_ref()))
        {
            continue;
        }

        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if let Some(language) = Language::from_extension(ext) {
            files.push(SourceFile {
                path: path.to_path_buf(),
                language,
            });
        }
    }

    files
}

fn is_skipped_component(name: &str) -> bool {
    SKIP_DIRS.contains(&name) || (name.starts_with('.') && name != "." && name != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_detection_covers_all_supported_extensions() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_extension("rb"), None);
    }

    #[test]
    fn skips_dot_directories_and_known_vendor_dirs() {
        assert!(is_skipped_component(".git"));
        assert!(is_skipped_component("node_modules"));
        assert!(is_skipped_component(".venv"));
        assert!(!is_skipped_component("src"));
    }
}
