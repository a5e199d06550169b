//! The script catalog.
//!
//! A plain-text list, one script per line:
//!
//! ```text
//! door.int        ; generic door        # local_vars=2
//! ```
//!
//! The line number is the script index stored on each [`Script`](crate::Script).
//! Lines without a `.int` name still occupy an index.

use std::path::Path;

use mapscript_foundation::{Error, Result};

/// One catalog line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Image name without the `.int` extension; empty if the line had none.
    pub name: String,
    /// Size of the local variable window for scripts using this entry.
    pub local_vars: i32,
}

impl CatalogEntry {
    /// Parses a catalog line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let name = line
            .find(".int")
            .map(|end| line[..end].trim().to_string())
            .unwrap_or_default();
        let local_vars = line
            .find('#')
            .and_then(|hash| {
                let tail = &line[hash..];
                let at = tail.find("local_vars=")?;
                let digits: String = tail[at + "local_vars=".len()..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse().ok()
            })
            .unwrap_or(0);
        Self { name, local_vars }
    }

    /// The image file name, e.g. `door.int`.
    #[must_use]
    pub fn file_name(&self) -> Option<String> {
        (!self.name.is_empty()).then(|| format!("{}.int", self.name))
    }
}

/// Script index to image name and local variable count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptCatalog {
    entries: Vec<CatalogEntry>,
}

impl ScriptCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses catalog text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text.lines().map(CatalogEntry::parse).collect(),
        }
    }

    /// Reads a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("{}: {e}", path.display())))?;
        Ok(Self::parse(&text))
    }

    /// Appends an entry, returning its script index.
    pub fn push(&mut self, name: impl Into<String>, local_vars: i32) -> i32 {
        self.entries.push(CatalogEntry {
            name: name.into(),
            local_vars,
        });
        i32::try_from(self.entries.len() - 1).unwrap_or(i32::MAX)
    }

    /// The entry for a script index.
    #[must_use]
    pub fn get(&self, script_index: i32) -> Option<&CatalogEntry> {
        usize::try_from(script_index)
            .ok()
            .and_then(|i| self.entries.get(i))
    }

    /// Image file name for a script index.
    #[must_use]
    pub fn file_name(&self, script_index: i32) -> Option<String> {
        self.get(script_index).and_then(CatalogEntry::file_name)
    }

    /// Local variable count for a script index; zero if unknown.
    #[must_use]
    pub fn local_vars(&self, script_index: i32) -> i32 {
        self.get(script_index).map_or(0, |e| e.local_vars)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
