//! Generated artifacts
//!
//! A provider answer becomes either one runnable document or a multi-file
//! project with a designated entry file. See [`normalize`].

mod normalizer;

pub use normalizer::{normalize, select_entry, ENTRY_PATTERNS};

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{GatewayError, Result};

/// File name used when a single document is written to disk
pub const SINGLE_FILE_NAME: &str = "index.html";

/// Role of a file inside a generated project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Page,
    Component,
    Style,
    Script,
    Config,
    Asset,
    #[default]
    Other,
}

impl FileKind {
    /// Parse a declared kind; anything unrecognised is `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "page" | "html" => FileKind::Page,
            "component" => FileKind::Component,
            "style" | "css" | "stylesheet" => FileKind::Style,
            "script" | "js" | "javascript" | "typescript" => FileKind::Script,
            "config" | "configuration" => FileKind::Config,
            "asset" | "image" => FileKind::Asset,
            _ => FileKind::Other,
        }
    }

    /// Guess the kind of an undeclared file from its path
    pub fn infer(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem, ext.to_lowercase()),
            None => (name, String::new()),
        };

        if stem.ends_with(".config")
            || matches!(name, "package.json" | "tsconfig.json" | ".env" | "Dockerfile")
        {
            return FileKind::Config;
        }
        let in_pages = path.starts_with("pages/") || path.contains("/pages/");
        let app_route = (stem == "page" || stem == "layout") && path.contains("app/");
        if ext == "html" || app_route || in_pages {
            return FileKind::Page;
        }
        match ext.as_str() {
            "jsx" | "tsx" | "vue" | "svelte" => FileKind::Component,
            "css" | "scss" | "sass" | "less" => FileKind::Style,
            "js" | "mjs" | "cjs" | "ts" => FileKind::Script,
            "json" | "toml" | "yaml" | "yml" => FileKind::Config,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" | "webp" => FileKind::Asset,
            _ => FileKind::Other,
        }
    }
}

/// One file of a multi-file project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
    pub kind: FileKind,
}

/// Normalized form of a provider answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Artifact {
    /// One runnable document, kept verbatim
    SingleFile { content: String },
    /// Project skeleton; `files` is never empty and `entry_path` names one of them
    #[serde(rename_all = "camelCase")]
    MultiFile {
        files: Vec<ProjectFile>,
        entry_path: String,
    },
}

impl Artifact {
    pub fn is_multi_file(&self) -> bool {
        matches!(self, Artifact::MultiFile { .. })
    }

    /// Content of the document a preview would open first
    pub fn entry_content(&self) -> &str {
        match self {
            Artifact::SingleFile { content } => content,
            Artifact::MultiFile { files, entry_path } => files
                .iter()
                .find(|f| &f.path == entry_path)
                .map(|f| f.content.as_str())
                .unwrap_or_default(),
        }
    }

    /// Write the artifact under `dir`, returning the written paths
    ///
    /// Paths that are absolute or climb out of `dir` are rejected before
    /// anything is written.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let targets: Vec<(PathBuf, &str)> = match self {
            Artifact::SingleFile { content } => vec![(dir.join(SINGLE_FILE_NAME), content)],
            Artifact::MultiFile { files, .. } => files
                .iter()
                .map(|f| Ok((dir.join(safe_relative(&f.path)?), f.content.as_str())))
                .collect::<Result<_>>()?,
        };

        let mut written = Vec::with_capacity(targets.len());
        for (path, content) in targets {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
            tracing::debug!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Relative path made only of normal components
fn safe_relative(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(GatewayError::UnsafePath(path.to_string()));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(GatewayError::UnsafePath(path.to_string()));
    }
    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(path: &str, content: &str) -> ProjectFile {
        ProjectFile {
            path: path.to_string(),
            content: content.to_string(),
            kind: FileKind::infer(path),
        }
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(FileKind::from_label("Component"), FileKind::Component);
        assert_eq!(FileKind::from_label("stylesheet"), FileKind::Style);
        assert_eq!(FileKind::from_label("hologram"), FileKind::Other);
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(FileKind::infer("app/page.tsx"), FileKind::Page);
        assert_eq!(FileKind::infer("src/app/layout.tsx"), FileKind::Page);
        assert_eq!(FileKind::infer("index.html"), FileKind::Page);
        assert_eq!(FileKind::infer("components/Button.tsx"), FileKind::Component);
        assert_eq!(FileKind::infer("styles/globals.css"), FileKind::Style);
        assert_eq!(FileKind::infer("lib/api.ts"), FileKind::Script);
        assert_eq!(FileKind::infer("next.config.js"), FileKind::Config);
        assert_eq!(FileKind::infer("package.json"), FileKind::Config);
        assert_eq!(FileKind::infer("public/logo.svg"), FileKind::Asset);
        assert_eq!(FileKind::infer("README"), FileKind::Other);
    }

    #[test]
    fn test_serialized_shape() {
        let artifact = Artifact::MultiFile {
            files: vec![file("app/page.tsx", "x")],
            entry_path: "app/page.tsx".to_string(),
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["type"], "multiFile");
        assert_eq!(json["entryPath"], "app/page.tsx");
        assert_eq!(json["files"][0]["kind"], "page");
    }

    #[test]
    fn test_write_single_file() {
        let dir = TempDir::new().unwrap();
        let artifact = Artifact::SingleFile {
            content: "<html></html>".to_string(),
        };
        let written = artifact.write_to(dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("index.html")]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("index.html")).unwrap(),
            "<html></html>"
        );
    }

    #[test]
    fn test_write_project_creates_directories() {
        let dir = TempDir::new().unwrap();
        let artifact = Artifact::MultiFile {
            files: vec![file("./app/page.tsx", "page"), file("components/Nav.tsx", "nav")],
            entry_path: "./app/page.tsx".to_string(),
        };
        artifact.write_to(dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("app/page.tsx")).unwrap(),
            "page"
        );
        assert!(dir.path().join("components/Nav.tsx").exists());
    }

    #[test]
    fn test_write_rejects_escaping_paths() {
        let dir = TempDir::new().unwrap();
        for bad in ["../evil.js", "/etc/passwd", "a/../../b", ""] {
            let artifact = Artifact::MultiFile {
                files: vec![file("ok.js", "fine"), file(bad, "x")],
                entry_path: "ok.js".to_string(),
            };
            assert!(
                matches!(artifact.write_to(dir.path()), Err(GatewayError::UnsafePath(_))),
                "{} should be rejected",
                bad
            );
        }
        // Nothing written when any path is unsafe
        assert!(!dir.path().join("ok.js").exists());
    }
}
