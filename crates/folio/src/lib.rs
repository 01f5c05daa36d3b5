//! Shakespeare catalog: plays, sonnets and a historical lexicon built from
//! TEI markup, with word lookup on top.
//!
//! [`Catalog::build`] ingests a corpus directory once; [`Library`] is the
//! read-only handle consumers query afterwards.
//!
//! ```no_run
//! use folio::{Catalog, CorpusLayout, Library};
//! use folio_markup::LoadMode;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let catalog = Catalog::build("attached_assets", &CorpusLayout::default(), LoadMode::Mmap)?;
//! let library = Library::offline(catalog);
//! for work in library.works() {
//!     println!("{} {} ({})", work.id, work.title, work.kind);
//! }
//! if let Some(def) = library.define("Abatements").await {
//!     println!("{}", def.definition);
//! }
//! # Ok(()) }
//! ```

pub mod catalog;
pub mod library;
pub mod scenes;
pub mod sonnets;

pub use catalog::{Catalog, CatalogError, CorpusLayout, FileRole, IngestError};
pub use library::Library;
pub use scenes::{SceneText, extract_scenes};
pub use sonnets::{SonnetText, extract_sonnets};
