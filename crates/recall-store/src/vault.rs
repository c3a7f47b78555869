//! Directory-backed note source.
//!
//! A vault is a directory tree of `.md` / `.txt` files. Note ids are paths
//! relative to the vault root with `/` separators. Titles come from the
//! first level-one markdown heading, falling back to the file stem.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use recall_core::{Note, NoteRead, NoteSource, RecallError};
use walkdir::WalkDir;

use crate::error::{Result, StoreError};

const NOTE_EXTENSIONS: [&str; 2] = ["md", "txt"];

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::InvalidData(format!(
                "vault {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an id to a path inside the vault. Ids escaping the root are refused.
    fn resolve(&self, id: &str) -> Option<PathBuf> {
        let relative = Path::new(id);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        (contained && !id.is_empty()).then(|| self.root.join(relative))
    }

    /// Every note id in the vault, sorted.
    pub fn scan(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping vault entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_note_file(entry.path()) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                let id = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                ids.push(id);
            }
        }
        ids.sort();
        ids
    }

    /// Read every note; unreadable files stay in the list as errors.
    pub fn read_all(&self) -> Vec<NoteRead> {
        self.read_many(&self.scan())
    }
}

impl NoteSource for Vault {
    fn read_note(&self, id: &str) -> NoteRead {
        let path = self
            .resolve(id)
            .ok_or_else(|| RecallError::unreadable(id, "id escapes the vault root"))?;
        let body = fs::read_to_string(&path).map_err(|e| RecallError::unreadable(id, e))?;
        let modified = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let title = markdown_title(&body).unwrap_or_else(|| file_stem(&path));
        Ok(Note {
            id: id.to_string(),
            title,
            body,
            modified,
        })
    }

    fn list_ids(&self) -> Vec<String> {
        self.scan()
    }
}

fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| NOTE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}

/// Text of the first `# heading`, if any.
fn markdown_title(content: &str) -> Option<String> {
    let mut in_title = false;
    let mut title = String::new();
    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_title = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) => {
                let trimmed = title.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
                in_title = false;
            }
            Event::Text(text) | Event::Code(text) if in_title => title.push_str(&text),
            _ => {}
        }
    }
    None
}
