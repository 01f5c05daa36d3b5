//! Shared record types for the Shakespeare catalog.
//!
//! Everything the ingestion pipeline produces ends up in one of these shapes:
//! a [`Work`] (a play or a single sonnet), the [`Passage`]s that belong to it
//! (one per scene, or one per sonnet), and the [`Definition`] returned by a
//! word lookup. All records serialize with camelCase field names so they can
//! be handed to a JSON consumer unchanged.
//!
//! [`safe_int`] is the lossy label normalization used to order acts and
//! scenes.
//!
//! ```rust
//! use folio_types::{WorkKind, safe_int};
//!
//! assert_eq!(safe_int("prologue"), 0);
//! assert_eq!(safe_int("3"), 3);
//! assert_eq!(WorkKind::Sonnet.to_string(), "sonnet");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sort key assigned to an act or scene labelled `epilogue`.
pub const EPILOGUE: i32 = 99;

/// Whether a work is a play or a sonnet.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkKind {
    Play,
    Sonnet,
}

impl fmt::Display for WorkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkKind::Play => "play",
            WorkKind::Sonnet => "sonnet",
        })
    }
}

/// Top-level literary unit in the catalog.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: u32,
    pub title: String,
    pub kind: WorkKind,
    pub year: i32,
    pub description: String,
}

/// Retrievable unit of text: one scene of a play or one sonnet.
///
/// `act` and `scene` are `None` exactly when the owning work is a sonnet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    pub id: u32,
    pub work_id: u32,
    pub title: String,
    pub content: String,
    pub act: Option<i32>,
    pub scene: Option<i32>,
}

impl Passage {
    /// Lines of the passage in display order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }
}

/// Result of a successful word lookup.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub word: String,
    pub definition: String,
    pub part_of_speech: String,
}

/// Normalize an act or scene label to an integer.
///
/// Digits parse directly, `prologue` maps to 0 and `epilogue` to
/// [`EPILOGUE`]; anything else (including the empty string) maps to 0.
pub fn safe_int(label: &str) -> i32 {
    let label = label.trim();
    if label.is_empty() {
        return 0;
    }
    match label.to_ascii_lowercase().as_str() {
        "prologue" => 0,
        "epilogue" => EPILOGUE,
        other => other.parse().unwrap_or(0),
    }
}
