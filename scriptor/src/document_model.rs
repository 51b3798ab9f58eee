//! Document model: an ordered list of named sections holding rich HTML
//!
//! Sections are identified by their display name. `structure` is the
//! canonical chapter order and `contents` maps each name to its HTML. After
//! every mutation `contents` holds an entry for each name in `structure`,
//! and entries of removed sections are dropped eagerly.

use crate::html_tree::HtmlFragment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Sections a fresh project starts with
pub const DEFAULT_STRUCTURE: &[&str] = &[
    "Title Page",
    "Copyright",
    "Dedication",
    "Table of Contents",
    "Foreword",
    "Introduction",
    "Chapter 1",
];

/// Errors raised by section mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    /// Section names must contain something other than whitespace
    #[error("Section name must not be empty")]
    EmptyName,

    /// The name is already used by another section
    #[error("A section named '{0}' already exists")]
    DuplicateName(String),
}

/// Result of a rename request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// Content moved to the new name
    Renamed { from: String, to: String },
    /// New name equals the old one
    Unchanged,
    /// Another section already uses the new name; nothing changed
    Duplicate(String),
    /// The old name is not part of the structure
    NotFound,
}

/// The whole manuscript
///
/// Serializes to the persisted record shape:
/// `{ "title", "subtitle", "structure": [..], "contents": { name: html } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Book title
    #[serde(default)]
    pub title: String,
    /// Book subtitle (may be empty)
    #[serde(default)]
    pub subtitle: String,
    /// Section names in chapter order
    #[serde(default)]
    pub structure: Vec<String>,
    /// Section name to HTML content
    #[serde(default)]
    pub contents: BTreeMap<String, String>,
}

impl Default for Document {
    fn default() -> Self {
        let mut document = Self {
            title: String::new(),
            subtitle: String::new(),
            structure: DEFAULT_STRUCTURE.iter().map(|s| s.to_string()).collect(),
            contents: BTreeMap::new(),
        };
        document.ensure_contents();
        document
    }
}

impl Document {
    /// Create a new project with the default section outline
    pub fn new(title: &str, subtitle: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            ..Self::default()
        }
    }

    /// Build a document from a persisted record
    ///
    /// Missing title/subtitle load as empty strings, a missing or empty
    /// structure keeps the default outline, and stored contents are merged
    /// over the default (empty) entries.
    pub fn from_record(record: Document) -> Self {
        let mut document = Self::default();
        document.title = record.title;
        document.subtitle = record.subtitle;
        if !record.structure.is_empty() {
            document.structure = record.structure;
        }
        document.contents.extend(record.contents);
        document.ensure_contents();
        document
    }

    /// Change the title and/or subtitle; `None` leaves a field as it is
    ///
    /// # Returns
    /// * `true` if either field changed
    pub fn set_heading(&mut self, title: Option<&str>, subtitle: Option<&str>) -> bool {
        let mut changed = false;
        if let Some(title) = title.filter(|title| *title != self.title) {
            self.title = title.to_string();
            changed = true;
        }
        if let Some(subtitle) = subtitle.filter(|subtitle| *subtitle != self.subtitle) {
            self.subtitle = subtitle.to_string();
            changed = true;
        }
        changed
    }

    /// Create an empty entry for every structure name that has no content yet
    pub fn ensure_contents(&mut self) {
        for name in &self.structure {
            self.contents.entry(name.clone()).or_default();
        }
    }

    /// Whether a section with this name exists
    pub fn has_section(&self, name: &str) -> bool {
        self.structure.iter().any(|s| s == name)
    }

    /// Content of a section (empty if it has none)
    pub fn content(&self, name: &str) -> &str {
        self.contents.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Replace the content of a section, creating it at the end if needed
    pub fn set_content(&mut self, name: &str, html: String) {
        if !self.has_section(name) {
            self.structure.push(name.to_string());
        }
        self.contents.insert(name.to_string(), html);
    }

    /// Name suggested for the next added section ("Chapter N")
    pub fn next_chapter_name(&self) -> String {
        let chapters = self
            .structure
            .iter()
            .filter(|name| name.starts_with("Chapter"))
            .count();
        format!("Chapter {}", chapters + 1)
    }

    /// Append a new section
    ///
    /// # Parameters
    /// * `name` - Requested name; `None` uses [`Document::next_chapter_name`]
    ///
    /// # Returns
    /// * `Ok(String)` - The (trimmed) name of the new section
    /// * `Err(SectionError)` - Empty or duplicate name
    pub fn add_section(&mut self, name: Option<&str>) -> Result<String, SectionError> {
        let name = match name {
            Some(requested) => requested.trim().to_string(),
            None => self.next_chapter_name(),
        };
        if name.is_empty() {
            return Err(SectionError::EmptyName);
        }
        if self.has_section(&name) {
            return Err(SectionError::DuplicateName(name));
        }

        log::info!("Adding section '{}'", name);
        self.structure.push(name.clone());
        self.contents.entry(name.clone()).or_default();
        Ok(name)
    }

    /// Delete a section and its content
    ///
    /// Irrecoverable; callers confirm with the user first.
    ///
    /// # Returns
    /// * `true` if a section was removed, `false` if the name was unknown
    pub fn delete_section(&mut self, name: &str) -> bool {
        if !self.has_section(name) {
            return false;
        }
        log::info!("Deleting section '{}'", name);
        self.structure.retain(|s| s != name);
        self.contents.remove(name);
        true
    }

    /// Rename a section, keeping its position in the structure
    ///
    /// Renaming onto an existing name is refused without touching anything.
    pub fn rename_section(&mut self, old_name: &str, new_name: &str) -> RenameOutcome {
        let Some(idx) = self.structure.iter().position(|s| s == old_name) else {
            return RenameOutcome::NotFound;
        };
        let new_name = new_name.trim();
        if new_name.is_empty() || new_name == old_name {
            return RenameOutcome::Unchanged;
        }
        if self.has_section(new_name) {
            log::warn!(
                "Refusing to rename '{}' to '{}': name already exists",
                old_name,
                new_name
            );
            return RenameOutcome::Duplicate(new_name.to_string());
        }

        let content = self.contents.remove(old_name).unwrap_or_default();
        self.contents.insert(new_name.to_string(), content);
        self.structure[idx] = new_name.to_string();

        log::info!("Renamed section '{}' to '{}'", old_name, new_name);
        RenameOutcome::Renamed {
            from: old_name.to_string(),
            to: new_name.to_string(),
        }
    }

    /// Sections in structure order with their content
    pub fn sections(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.structure
            .iter()
            .map(move |name| (name.as_str(), self.content(name)))
    }

    /// Total word count over all sections
    pub fn word_count(&self) -> usize {
        self.sections().map(|(_, html)| count_words(html)).sum()
    }
}

/// Count whitespace-separated words in the text of an HTML fragment
pub fn count_words(html: &str) -> usize {
    if html.trim().is_empty() {
        return 0;
    }
    HtmlFragment::parse(html)
        .text_content()
        .split_whitespace()
        .count()
}
