//! Writing prompts grouped by book niche
//!
//! The table is read from a TOML file mapping each niche to its prompts:
//!
//! ```toml
//! lead-magnet = ["Give 5 quick wins your audience can achieve this week."]
//! self-help = ["Describe a tiny habit that creates outsized change."]
//! ```
//!
//! Without a file the built-in table is used.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Niche value that stands for "nothing selected"
pub const NO_NICHE: &str = "default";

/// Built-in prompts used when no prompt file is configured
const FALLBACK_PROMPTS: &[(&str, &[&str])] = &[
    (
        "lead-magnet",
        &["Give 5 quick wins your audience can achieve this week."],
    ),
    (
        "self-help",
        &["Describe a tiny habit that creates outsized change."],
    ),
];

/// Errors that can occur when loading a prompt table
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid prompt table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Prompts keyed by niche
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTable {
    niches: BTreeMap<String, Vec<String>>,
}

/// Outcome of asking for inspiration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspiration {
    /// A prompt picked from the niche
    Prompt(String),
    /// No niche was chosen
    NoNiche,
    /// The niche has no prompts
    NoPrompts(String),
}

impl std::fmt::Display for Inspiration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Inspiration::Prompt(prompt) => f.write_str(prompt),
            Inspiration::NoNiche => f.write_str("Please select a niche first!"),
            Inspiration::NoPrompts(_) => f.write_str("No prompts for this niche yet. Try another!"),
        }
    }
}

impl PromptTable {
    /// The built-in table
    pub fn fallback() -> Self {
        let niches = FALLBACK_PROMPTS
            .iter()
            .map(|(niche, prompts)| {
                (
                    niche.to_string(),
                    prompts.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        Self { niches }
    }

    /// Load a prompt table from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to the prompt file
    ///
    /// # Returns
    /// * `Ok(PromptTable)` - Successfully loaded table
    /// * `Err(PromptError)` - Error reading or parsing the file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PromptError> {
        let content = fs::read_to_string(&path)?;
        let table: PromptTable = toml::from_str(&content)?;
        log::info!(
            "Loaded prompts for {} niche(s) from {}",
            table.niches.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Load the configured table, or the built-in one when none is configured
    pub fn load_or_fallback(path: Option<&Path>) -> Result<Self, PromptError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::fallback()),
        }
    }

    /// Niche names in sorted order
    pub fn niches(&self) -> impl Iterator<Item = &str> {
        self.niches.keys().map(String::as_str)
    }

    /// Prompts of a niche (empty for unknown niches)
    pub fn prompts(&self, niche: &str) -> &[String] {
        self.niches.get(niche).map(Vec::as_slice).unwrap_or_default()
    }

    /// Pick a random prompt for a niche
    ///
    /// A missing, blank or `default` niche yields [`Inspiration::NoNiche`].
    pub fn inspire<R: Rng + ?Sized>(&self, niche: Option<&str>, rng: &mut R) -> Inspiration {
        let niche = match niche.map(str::trim) {
            Some(niche) if !niche.is_empty() && niche != NO_NICHE => niche,
            _ => return Inspiration::NoNiche,
        };

        let prompts = self.prompts(niche);
        if prompts.is_empty() {
            return Inspiration::NoPrompts(niche.to_string());
        }
        Inspiration::Prompt(prompts[rng.random_range(0..prompts.len())].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fallback_table() {
        let table = PromptTable::fallback();
        assert_eq!(table.niches().collect::<Vec<_>>(), ["lead-magnet", "self-help"]);
        assert_eq!(
            table.prompts("self-help"),
            ["Describe a tiny habit that creates outsized change."]
        );
    }

    #[test]
    fn test_no_niche_selected() {
        let table = PromptTable::fallback();
        let mut rng = StdRng::seed_from_u64(7);
        for niche in [None, Some(""), Some("  "), Some("default")] {
            let inspiration = table.inspire(niche, &mut rng);
            assert_eq!(inspiration, Inspiration::NoNiche);
            assert_eq!(inspiration.to_string(), "Please select a niche first!");
        }
    }

    #[test]
    fn test_niche_without_prompts() {
        let table = PromptTable::fallback();
        let inspiration = table.inspire(Some("cookbook"), &mut StdRng::seed_from_u64(7));
        assert_eq!(inspiration, Inspiration::NoPrompts("cookbook".to_string()));
        assert_eq!(
            inspiration.to_string(),
            "No prompts for this niche yet. Try another!"
        );
    }

    #[test]
    fn test_prompt_comes_from_the_niche() {
        let table: PromptTable = toml::from_str(
            r#"
fiction = ["Open with a door.", "End with a letter.", "Start mid-argument."]
empty = []
"#,
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            match table.inspire(Some("fiction"), &mut rng) {
                Inspiration::Prompt(prompt) => {
                    assert!(table.prompts("fiction").contains(&prompt))
                }
                other => panic!("expected a prompt, got {:?}", other),
            }
        }
        assert_eq!(
            table.inspire(Some("empty"), &mut rng),
            Inspiration::NoPrompts("empty".to_string())
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.toml");
        fs::write(&path, "memoir = [\"Write about a kitchen.\"]\n").unwrap();

        let table = PromptTable::load_or_fallback(Some(path.as_path())).unwrap();
        assert_eq!(table.prompts("memoir"), ["Write about a kitchen."]);
        assert!(table.prompts("self-help").is_empty());

        fs::write(&path, "memoir = 3\n").unwrap();
        assert!(matches!(
            PromptTable::load(&path),
            Err(PromptError::Parse(_))
        ));
    }
}
