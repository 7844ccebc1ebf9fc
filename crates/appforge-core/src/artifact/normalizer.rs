//! Response normalizer
//!
//! Turns raw provider text into an [`Artifact`]:
//! 1. a ```json fenced project manifest, or a bare `{...}` manifest, becomes `MultiFile`
//! 2. anything else non-empty is kept verbatim as `SingleFile`
//!
//! Manifest shape: `{type?, files: [{path, content, kind?}], entry?}`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use super::{Artifact, FileKind, ProjectFile};
use crate::error::{GatewayError, Result};
use crate::extract::extract_json;

/// Conventional entry files, highest priority first. Directory prefixes allowed.
pub const ENTRY_PATTERNS: &[&str] = &[
    r"(^|/)app/page\.[^/]+$",
    r"(^|/)App\.[^/]+$",
    r"(^|/)main\.[^/]+$",
    r"(^|/)index\.[^/]+$",
];

static ENTRY_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    ENTRY_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
});

/// Normalize a provider answer
///
/// Deterministic: normalizing a `SingleFile`'s content again yields the same artifact.
pub fn normalize(raw: &str) -> Result<Artifact> {
    if raw.trim().is_empty() {
        return Err(GatewayError::EmptyResponse);
    }

    if let Some(artifact) = extract_json(raw).and_then(|manifest| from_manifest(&manifest)) {
        return Ok(artifact);
    }

    Ok(Artifact::SingleFile {
        content: raw.to_string(),
    })
}

/// Build a `MultiFile` from a manifest; `None` when no file entry is usable
fn from_manifest(manifest: &Value) -> Option<Artifact> {
    let entries = manifest.get("files")?.as_array()?;

    let mut seen = HashSet::new();
    let files: Vec<ProjectFile> = entries
        .iter()
        .filter_map(|entry| {
            let path = entry.get("path")?.as_str()?.trim();
            let path = path.strip_prefix("./").unwrap_or(path);
            if path.is_empty() {
                return None;
            }
            let content = entry.get("content")?.as_str()?;
            let kind = match entry.get("kind").and_then(|k| k.as_str()) {
                Some(label) => FileKind::from_label(label),
                None => FileKind::infer(path),
            };
            Some(ProjectFile {
                path: path.to_string(),
                content: content.to_string(),
                kind,
            })
        })
        // Duplicate paths keep the first occurrence
        .filter(|file| seen.insert(file.path.clone()))
        .collect();

    if files.is_empty() {
        tracing::debug!("Manifest had no usable files; keeping raw text");
        return None;
    }

    let declared = manifest.get("entry").and_then(|e| e.as_str());
    let entry_path = select_entry(&files, declared);
    Some(Artifact::MultiFile { files, entry_path })
}

/// Pick the entry file: the declared one if it exists, else by convention, else the first
pub fn select_entry(files: &[ProjectFile], declared: Option<&str>) -> String {
    if let Some(declared) = declared {
        let declared = declared.trim();
        let declared = declared.strip_prefix("./").unwrap_or(declared);
        if files.iter().any(|f| f.path == declared) {
            return declared.to_string();
        }
    }

    ENTRY_REGEXES
        .iter()
        .find_map(|re| files.iter().find(|f| re.is_match(&f.path)))
        .or_else(|| files.first())
        .map(|f| f.path.clone())
        .unwrap_or_default()
}
