//! Headword lookup over the historical lexicon, with a remote fallback.
//!
//! The lexicon is built once from a dictionary-style markup file into a
//! case-folded `headword -> definition` map. Lookups normalize the reader's
//! word the crude way the reading UI always has:
//!
//! 1. Lowercase and strip one trailing punctuation character.
//! 2. Try that form against the lexicon.
//! 3. If it ends in `s`, try it again without the `s` (and without any
//!    punctuation that exposes, so `Romeo's` becomes `romeo`).
//! 4. Otherwise ask the remote dictionary service, if one is configured.
//!
//! Step 3 is not stemming: a genuinely singular word such as `bless` is also
//! tried as `bles`. Callers should treat a miss as "no definition", never as
//! a fault.
//!
//! # Example
//! ```no_run
//! use folio_lexicon::Lexicon;
//! use folio_markup::LoadMode;
//!
//! # fn main() -> Result<(), folio_markup::MarkupError> {
//! let lexicon = Lexicon::load("attached_assets/schmidt.xml", LoadMode::Mmap)?;
//! if let Some(def) = lexicon.resolve("Abatements") {
//!     println!("{}: {}", def.word, def.definition);
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p folio-lexicon --example define -- <lexicon.xml> <word>`.

mod remote;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use folio_markup::schema::adapters;
use folio_markup::{LoadMode, MarkupError, Node, load_tree};
use folio_types::Definition;
use tracing::{debug, info, warn};

pub use remote::{DEFAULT_API_URL, DEFAULT_TIMEOUT, RemoteDictionary, UpstreamError};

/// Part of speech reported for lexicon hits; the source does not mark it.
pub const LEXICON_PART_OF_SPEECH: &str = "n/a";

/// Case-insensitive `headword -> definition` map.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    entries: HashMap<String, String>,
}

impl Lexicon {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from a parsed dictionary tree.
    pub fn from_tree(root: &Node) -> Self {
        Self {
            entries: extract_lexicon(root),
        }
    }

    /// Read, parse and extract a dictionary file.
    pub fn load(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self, MarkupError> {
        let root = load_tree(path, mode)?;
        Ok(Self::from_tree(&root))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definition stored under `headword`, compared case-insensitively.
    pub fn get(&self, headword: &str) -> Option<&str> {
        self.entries
            .get(&headword.to_lowercase())
            .map(String::as_str)
    }

    /// Fold `other` into this lexicon; its definitions win on collision.
    pub fn merge(&mut self, other: Lexicon) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve a reader's word against the lexicon only.
    pub fn resolve(&self, word: &str) -> Option<Definition> {
        let forms = normalize_query(word)?;
        forms.candidates().find_map(|candidate| {
            self.entries.get(candidate).map(|definition| Definition {
                word: candidate.to_string(),
                definition: definition.clone(),
                part_of_speech: LEXICON_PART_OF_SPEECH.to_string(),
            })
        })
    }
}

impl FromIterator<(String, String)> for Lexicon {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut entries = HashMap::new();
        for (headword, definition) in iter {
            entries.insert(headword.to_lowercase(), definition);
        }
        Self { entries }
    }
}

/// Extract `lowercased headword -> definition` from a dictionary tree.
///
/// Uses the first adapter whose entries carry at least one headword. Entries
/// without a headword are skipped; a repeated headword keeps the last
/// definition seen.
pub fn extract_lexicon(root: &Node) -> HashMap<String, String> {
    let Some((schema, raw)) = adapters().iter().find_map(|schema| {
        let raw = schema.find_entries(root);
        raw.iter()
            .any(|e| e.headword.is_some())
            .then_some((schema.name(), raw))
    }) else {
        warn!("no dictionary entries found under <{}>", root.tag);
        return HashMap::new();
    };

    let mut entries = HashMap::with_capacity(raw.len());
    let mut skipped = 0usize;
    for entry in raw {
        match entry.headword.map(|h| h.trim().to_lowercase()) {
            Some(headword) if !headword.is_empty() => {
                entries.insert(headword, entry.definition);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("skipped {skipped} lexicon entries without a headword");
    }
    info!("lexicon built: {} entries ({schema} convention)", entries.len());
    entries
}

/// Normalized forms of a reader's word, in the order they are tried.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryForms {
    pub exact: String,
    pub singular: Option<String>,
}

impl QueryForms {
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.exact.as_str()).chain(self.singular.as_deref())
    }
}

/// Lowercase, strip one trailing punctuation character, and derive the naive
/// singular. Returns `None` when nothing is left to look up.
pub fn normalize_query(word: &str) -> Option<QueryForms> {
    let lowered = word.trim().to_lowercase();
    let exact = strip_trailing_punct(&lowered).to_string();
    if exact.is_empty() {
        return None;
    }
    let singular = exact
        .strip_suffix('s')
        .map(strip_trailing_punct)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some(QueryForms { exact, singular })
}

fn strip_trailing_punct(word: &str) -> &str {
    match word.chars().next_back() {
        Some(c) if is_punct(c) => &word[..word.len() - c.len_utf8()],
        _ => word,
    }
}

fn is_punct(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '‘' | '’' | '“' | '”' | '—' | '–' | '…')
}

/// Lexicon plus optional remote fallback; the handle readers query.
pub struct Dictionary {
    lexicon: Arc<Lexicon>,
    remote: Option<RemoteDictionary>,
}

impl Dictionary {
    pub fn new(lexicon: Arc<Lexicon>, remote: Option<RemoteDictionary>) -> Self {
        Self { lexicon, remote }
    }

    pub fn offline(lexicon: Arc<Lexicon>) -> Self {
        Self::new(lexicon, None)
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Resolve `word` locally, then remotely. Upstream trouble is logged and
    /// reported as a miss.
    pub async fn lookup(&self, word: &str) -> Option<Definition> {
        if let Some(found) = self.lexicon.resolve(word) {
            debug!("lexicon hit for {word:?}");
            return Some(found);
        }
        let forms = normalize_query(word)?;
        let remote = self.remote.as_ref()?;
        match remote.define(&forms.exact).await {
            Ok(Some(found)) => Some(found),
            Ok(None) => {
                debug!("no definition for {:?} in lexicon or upstream", forms.exact);
                None
            }
            Err(err) => {
                warn!("dictionary fallback failed for {:?}: {err}", forms.exact);
                None
            }
        }
    }
}
