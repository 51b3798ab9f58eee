//! Editing session state
//!
//! The editor works on one section at a time. Its in-progress HTML lives in
//! a buffer until it is flushed into the document, which happens before
//! switching sections and before any read-modify-export operation.

use crate::document_model::{count_words, Document, RenameOutcome, SectionError};
use crate::find_replace::replace_in_html;

/// A document plus the section currently open in the editor
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    document: Document,
    active: Option<String>,
    buffer: String,
}

/// Progress towards a word goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    pub words: usize,
    pub goal: usize,
}

impl GoalProgress {
    /// A goal of zero is never reached
    pub fn reached(&self) -> bool {
        self.goal > 0 && self.words >= self.goal
    }
}

impl std::fmt::Display for GoalProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.words, self.goal)
    }
}

impl EditorSession {
    /// Start a session with no section open
    pub fn new(document: Document) -> Self {
        Self {
            document,
            active: None,
            buffer: String::new(),
        }
    }

    /// The underlying document (without unflushed edits)
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Name of the open section
    pub fn active_section(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// In-progress HTML of the open section
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Write the buffer back into the open section
    pub fn flush(&mut self) {
        if let Some(name) = &self.active {
            self.document.set_content(name, self.buffer.clone());
        }
    }

    /// Open a section for editing
    ///
    /// Flushes the previously open section first. The name is trimmed; a
    /// name that is not in the structure yet is added at the end under the
    /// same rules as [`Document::add_section`].
    ///
    /// # Returns
    /// * `Ok(&str)` - The HTML now loaded in the editor
    /// * `Err(SectionError)` - The name is empty
    pub fn open_section(&mut self, name: &str) -> Result<&str, SectionError> {
        self.flush();
        let name = name.trim();
        let name = if self.document.has_section(name) {
            name.to_string()
        } else {
            self.document.add_section(Some(name))?
        };
        self.document.ensure_contents();
        self.buffer = self.document.content(&name).to_string();
        self.active = Some(name);
        Ok(&self.buffer)
    }

    /// Replace the editor content
    pub fn edit(&mut self, html: &str) {
        self.buffer = html.to_string();
    }

    /// Append HTML to the editor content
    pub fn append(&mut self, html: &str) {
        self.buffer.push_str(html);
    }

    /// Add a section and open it
    pub fn add_section(&mut self, name: Option<&str>) -> Result<String, SectionError> {
        self.flush();
        let name = self.document.add_section(name)?;
        self.open_section(&name)?;
        Ok(name)
    }

    /// Delete a section; deleting the open one clears the editor
    pub fn delete_section(&mut self, name: &str) -> bool {
        self.flush();
        let removed = self.document.delete_section(name);
        if removed && self.active.as_deref() == Some(name) {
            self.active = None;
            self.buffer.clear();
        }
        removed
    }

    /// Rename a section; the open section follows its new name
    pub fn rename_section(&mut self, old_name: &str, new_name: &str) -> RenameOutcome {
        self.flush();
        let outcome = self.document.rename_section(old_name, new_name);
        if let RenameOutcome::Renamed { from, to } = &outcome {
            if self.active.as_deref() == Some(from.as_str()) {
                self.active = Some(to.clone());
            }
        }
        outcome
    }

    /// Case-insensitive replace across the manuscript
    ///
    /// With a section open only that section is searched; otherwise every
    /// stored section is.
    ///
    /// # Returns
    /// * Number of occurrences replaced
    pub fn replace_all(&mut self, search: &str, replacement: &str) -> usize {
        self.flush();
        let search = search.trim();
        if search.is_empty() {
            return 0;
        }

        if self.active.is_some() {
            let (html, count) = replace_in_html(&self.buffer, search, replacement);
            self.buffer = html;
            self.flush();
            return count;
        }

        let mut total = 0;
        for html in self.document.contents.values_mut() {
            let (replaced, count) = replace_in_html(html, search, replacement);
            *html = replaced;
            total += count;
        }
        total
    }

    /// Words in the open section
    pub fn word_count(&self) -> usize {
        count_words(&self.buffer)
    }

    /// Word count of the open section against a goal
    pub fn goal_progress(&self, goal: usize) -> GoalProgress {
        GoalProgress {
            words: self.word_count(),
            goal,
        }
    }

    /// The document with all edits flushed, ready to render or save
    pub fn snapshot(&mut self) -> &Document {
        self.flush();
        &self.document
    }

    /// Finish the session, returning the flushed document
    pub fn into_document(mut self) -> Document {
        self.flush();
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> EditorSession {
        let mut document = Document::new("Book", "");
        document.set_content("Foreword", "<p>Hello world</p>".to_string());
        document.set_content("Chapter 1", "<p>hello again</p>".to_string());
        EditorSession::new(document)
    }

    #[test]
    fn test_open_section_flushes_previous_buffer() {
        let mut session = session();
        session.open_section("Foreword").unwrap();
        session.edit("<p>changed</p>");
        let loaded = session.open_section("Chapter 1").unwrap().to_string();
        assert_eq!(loaded, "<p>hello again</p>");
        assert_eq!(session.document().content("Foreword"), "<p>changed</p>");
    }

    #[test]
    fn test_open_unknown_section_creates_it() {
        let mut session = session();
        session.open_section(" Appendix ").unwrap();
        assert!(session.document().has_section("Appendix"));
        assert_eq!(session.active_section(), Some("Appendix"));
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn test_open_blank_name_is_rejected() {
        let mut session = session();
        let before = session.document().structure.clone();
        assert_eq!(session.open_section("   "), Err(SectionError::EmptyName));
        assert_eq!(session.open_section(""), Err(SectionError::EmptyName));
        assert_eq!(session.document().structure, before);
        assert_eq!(session.active_section(), None);
    }

    #[test]
    fn test_add_section_opens_it() {
        let mut session = session();
        session.open_section("Foreword").unwrap();
        session.edit("<p>kept</p>");

        let added = session.add_section(None).unwrap();
        assert_eq!(added, "Chapter 2");
        assert_eq!(session.active_section(), Some("Chapter 2"));
        assert_eq!(session.document().content("Foreword"), "<p>kept</p>");
        assert_eq!(
            session.add_section(Some("Foreword")),
            Err(SectionError::DuplicateName("Foreword".to_string()))
        );
        assert_eq!(session.active_section(), Some("Chapter 2"));
    }

    #[test]
    fn test_delete_active_section_clears_editor() {
        let mut session = session();
        session.open_section("Foreword").unwrap();
        assert!(session.delete_section("Foreword"));
        assert_eq!(session.active_section(), None);
        assert_eq!(session.buffer(), "");
        // Deleted content must not come back on the next flush
        session.flush();
        assert!(!session.document().contents.contains_key("Foreword"));
    }

    #[test]
    fn test_rename_active_section_follows() {
        let mut session = session();
        session.open_section("Foreword").unwrap();
        session.edit("<p>draft</p>");
        session.rename_section("Foreword", "Preface");
        assert_eq!(session.active_section(), Some("Preface"));
        assert_eq!(session.snapshot().content("Preface"), "<p>draft</p>");
    }

    #[test]
    fn test_replace_all_in_active_section_only() {
        let mut session = session();
        session.open_section("Foreword").unwrap();
        let count = session.replace_all("hello", "Hi");
        assert_eq!(count, 1);
        assert_eq!(session.buffer(), "<p>Hi world</p>");
        assert_eq!(session.document().content("Chapter 1"), "<p>hello again</p>");
    }

    #[test]
    fn test_replace_all_across_sections() {
        let mut session = session();
        let count = session.replace_all("  HELLO ", "Hi");
        assert_eq!(count, 2);
        assert_eq!(session.document().content("Chapter 1"), "<p>Hi again</p>");
        assert_eq!(session.replace_all("   ", "x"), 0);
    }

    #[test]
    fn test_goal_progress() {
        let mut session = session();
        session.open_section("Foreword").unwrap();
        let progress = session.goal_progress(2);
        assert_eq!(progress.to_string(), "2 / 2");
        assert!(progress.reached());
        assert!(!session.goal_progress(0).reached());
    }
}
