//! Extension-based file categorization.
//!
//! A [`CategoryTable`] maps category names to lists of extensions. Category
//! order is the order in which the table was built (or written in the config
//! file), and lookups walk it front to back so that an extension listed
//! under two categories always resolves to the first one.
//!
//! # Examples
//!
//! ```
//! use quicksortbox::classifier::{categorize, CategoryTable, OTHERS};
//!
//! let table = CategoryTable::default();
//! assert_eq!(categorize("holiday.JPG", &table), "Images");
//! assert_eq!(categorize("notes.txt", &table), "Documents");
//! assert_eq!(categorize("Makefile", &table), OTHERS);
//! ```

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Catch-all category for files with no matching extension.
pub const OTHERS: &str = "Others";

/// Quarantine category for files whose content was already seen in the run.
pub const DUPLICATES: &str = "Duplicates";

/// One named category and the extensions routed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub extensions: Vec<String>,
}

/// Ordered mapping from category name to extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Creates an empty table; every file categorizes as [`OTHERS`].
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Appends a category, or replaces the extensions of an existing one in place.
    ///
    /// Extensions are normalized to lower case with a leading `.`.
    pub fn insert<I, S>(&mut self, name: &str, extensions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions: Vec<String> = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();

        match self.categories.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.extensions = extensions,
            None => self.categories.push(Category {
                name: name.to_string(),
                extensions,
            }),
        }
    }

    /// Iterates categories in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    /// Category names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns the first category listing `extension` (already normalized).
    fn lookup(&self, extension: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.extensions.iter().any(|e| e == extension))
            .map(|c| c.name.as_str())
    }
}

impl Default for CategoryTable {
    /// The built-in table used when no configuration file overrides it.
    fn default() -> Self {
        let mut table = Self::new();
        table.insert(
            "Images",
            [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".svg", ".webp"],
        );
        table.insert(
            "Documents",
            [
                ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt",
                ".pptx", ".csv",
            ],
        );
        table.insert("Archives", [".zip", ".rar", ".7z", ".tar", ".gz"]);
        table.insert("Audio", [".mp3", ".wav", ".flac", ".aac", ".ogg"]);
        table.insert("Video", [".mp4", ".mkv", ".avi", ".mov", ".wmv"]);
        table.insert(
            "Code",
            [
                ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".h", ".json", ".xml",
            ],
        );
        table.insert("Executables", [".exe", ".msi", ".bat", ".sh", ".app"]);
        table
    }
}

/// Lower-cases an extension and makes sure it starts with a single `.`.
fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

/// Extracts the extension of a file name: the text from the last `.` on, lower-cased.
///
/// Leading dots (`.bashrc`, `..foo`) never start an extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    let name = file_name.trim_start_matches('.');
    let dot = name.rfind('.')?;
    if dot + 1 == name.len() {
        return None;
    }
    Some(name[dot..].to_lowercase())
}

/// Maps a file name to the name of its category.
///
/// Pure and deterministic: unknown or missing extensions yield [`OTHERS`].
pub fn categorize<'a>(file_name: &str, table: &'a CategoryTable) -> &'a str {
    extension_of(file_name)
        .and_then(|ext| table.lookup(&ext))
        .unwrap_or(OTHERS)
}

impl Serialize for CategoryTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.extensions)?;
        }
        map.end()
    }
}

struct CategoryTableVisitor;

impl<'de> Visitor<'de> for CategoryTableVisitor {
    type Value = CategoryTable;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of category names to lists of extensions")
    }

    // Entries arrive in document order, which becomes the lookup order.
    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = CategoryTable::new();
        while let Some((name, extensions)) = access.next_entry::<String, Vec<String>>()? {
            table.insert(&name, extensions);
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for CategoryTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(CategoryTableVisitor)
    }
}
