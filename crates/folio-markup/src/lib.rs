//! Turn Shakespeare markup files into a generic attributed tree.
//!
//! Source files arrive in several inconsistent conventions, so this crate
//! stays schema-agnostic up to the tree and pushes convention-specific field
//! lookups into small adapters:
//!
//! 1. [`normalize`] resolves or drops named character references that would
//!    otherwise break the XML reader, and folds line endings.
//! 2. [`parse`] builds a [`Node`] tree (elements, attributes, text leaves) and
//!    reports malformed input as [`MarkupError::Malformed`].
//! 3. [`schema`] exposes the [`Schema`] trait with one adapter per convention
//!    (`TEI.2` and the flat `PLAY`/`POEMS` style).
//!
//! Files can be memory-mapped or read into owned buffers via [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use folio_markup::{LoadMode, load_tree, schema};
//!
//! # fn main() -> Result<(), folio_markup::MarkupError> {
//! let root = load_tree("attached_assets/ham.xml", LoadMode::Mmap)?;
//! if let Some((adapter, title)) = schema::select_by_title(&root) {
//!     println!("{title} ({} convention)", adapter.name());
//! }
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p folio-markup --example tree -- <file>`.

mod entities;
pub mod schema;
mod tree;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memmap2::Mmap;
use thiserror::Error;

pub use entities::normalize;
pub use schema::{Division, RawEntry, Role, Schema};
pub use tree::{Content, Descendants, Node, parse};

/// Strategy for reading source files.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map each file.
    Mmap,
    /// Read each file into an owned buffer.
    Owned,
}

#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("{0}")]
    Read(String),
    #[error("{} is not valid UTF-8", .0.display())]
    Encoding(PathBuf),
    #[error("malformed markup at byte {position}: {message}")]
    Malformed { position: u64, message: String },
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    match mode {
        LoadMode::Mmap if len > 0 => unsafe { Mmap::map(&file) }
            .map(Buffer::Mmap)
            .with_context(|| format!("mmap {}", path.display())),
        _ => {
            let mut buf = Vec::with_capacity(len as usize);
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

/// Read a source file and return its normalized text.
pub fn load_text(path: impl AsRef<Path>, mode: LoadMode) -> Result<String, MarkupError> {
    let path = path.as_ref();
    let buffer = load_file(path, mode).map_err(|e| MarkupError::Read(format!("{e:#}")))?;
    let text = std::str::from_utf8(buffer.as_slice())
        .map_err(|_| MarkupError::Encoding(path.to_path_buf()))?;
    Ok(normalize(text))
}

/// Read, normalize and parse a source file.
pub fn load_tree(path: impl AsRef<Path>, mode: LoadMode) -> Result<Node, MarkupError> {
    let text = load_text(path, mode)?;
    parse(&text)
}
