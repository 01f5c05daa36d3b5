use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use folio_lexicon::Lexicon;
use folio_markup::schema::select_by_title;
use folio_markup::{LoadMode, MarkupError, load_tree};
use folio_types::{Passage, Work, WorkKind, safe_int};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::scenes::{SceneText, extract_scenes};
use crate::sonnets::{SonnetText, extract_sonnets, select_sonnet_schema};

pub const DEFAULT_PLAY_YEAR: i32 = 1600;
pub const DEFAULT_SONNET_YEAR: i32 = 1609;
const SONNET_EXCERPT_CHARS: usize = 50;

/// Which corpus files are sonnet anthologies and which are the lexicon.
///
/// Basenames are compared case-insensitively. Every other `.xml` file is
/// treated as a play.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CorpusLayout {
    pub sonnet_files: Vec<String>,
    pub lexicon_files: Vec<String>,
}

impl Default for CorpusLayout {
    fn default() -> Self {
        Self {
            sonnet_files: vec!["son.xml".into(), "sonnets.xml".into()],
            lexicon_files: vec!["schmidt.xml".into(), "lexicon.xml".into()],
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileRole {
    Play,
    Sonnets,
    Lexicon,
}

impl CorpusLayout {
    pub fn role_of(&self, file_name: &str) -> FileRole {
        let listed = |names: &[String]| names.iter().any(|n| n.eq_ignore_ascii_case(file_name));
        if listed(&self.sonnet_files) {
            FileRole::Sonnets
        } else if listed(&self.lexicon_files) {
            FileRole::Lexicon
        } else {
            FileRole::Play
        }
    }
}

/// Why a single corpus file contributed nothing.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to parse {}: {source}", .file.display())]
    Parse {
        file: PathBuf,
        #[source]
        source: MarkupError,
    },
    #[error("{} has no {field}", .file.display())]
    MissingField { file: PathBuf, field: &'static str },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read corpus directory {}: {source}", .dir.display())]
    CorpusUnreadable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What one file yields before ids are assigned.
enum Ingested {
    Play {
        title: String,
        year: i32,
        scenes: Vec<SceneText>,
    },
    Sonnets {
        year: i32,
        sonnets: Vec<SonnetText>,
    },
    Lexicon(Lexicon),
}

/// Works, passages and lexicon built from one corpus directory.
///
/// Works and passages are stored in id order; a work's passages are
/// contiguous.
#[derive(Debug, Default)]
pub struct Catalog {
    works: Vec<Work>,
    passages: Vec<Passage>,
    lexicon: Arc<Lexicon>,
}

impl Catalog {
    /// Ingest every `.xml` file under `dir`.
    ///
    /// Files are parsed in parallel, then numbered sequentially in filename
    /// order. A file that fails to parse, or yields nothing usable, is logged
    /// and consumes no ids. Only an unreadable directory is an error.
    pub fn build(
        dir: impl AsRef<Path>,
        layout: &CorpusLayout,
        mode: LoadMode,
    ) -> Result<Arc<Self>, CatalogError> {
        let dir = dir.as_ref();
        let start = Instant::now();
        let files = corpus_files(dir).map_err(|source| CatalogError::CorpusUnreadable {
            dir: dir.to_path_buf(),
            source,
        })?;
        info!("ingesting {} markup files from {}", files.len(), dir.display());

        let parsed: Vec<(PathBuf, Result<Ingested, IngestError>)> = files
            .into_par_iter()
            .map(|path| {
                let outcome = ingest_file(&path, layout, mode);
                (path, outcome)
            })
            .collect();

        let mut catalog = Catalog::default();
        let mut lexicon = Lexicon::empty();
        let mut skipped = 0usize;
        for (path, outcome) in parsed {
            match outcome {
                Ok(Ingested::Play {
                    title,
                    year,
                    scenes,
                }) => catalog.push_play(&path, title, year, scenes),
                Ok(Ingested::Sonnets { year, sonnets }) => catalog.push_sonnets(year, sonnets),
                Ok(Ingested::Lexicon(found)) => lexicon.merge(found),
                Err(err) => {
                    warn!("skipping corpus file: {err}");
                    skipped += 1;
                }
            }
        }
        catalog.lexicon = Arc::new(lexicon);

        info!(
            "catalog built in {} ms: {} works, {} passages, {} lexicon entries, {} files skipped",
            start.elapsed().as_millis(),
            catalog.works.len(),
            catalog.passages.len(),
            catalog.lexicon.len(),
            skipped
        );
        Ok(Arc::new(catalog))
    }

    pub fn works(&self) -> &[Work] {
        &self.works
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn work(&self, id: u32) -> Option<&Work> {
        self.works
            .binary_search_by_key(&id, |w| w.id)
            .ok()
            .map(|i| &self.works[i])
    }

    pub fn passage(&self, id: u32) -> Option<&Passage> {
        self.passages
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|i| &self.passages[i])
    }

    /// Passages of one work in reading order; empty for an unknown id.
    pub fn passages_for(&self, work_id: u32) -> &[Passage] {
        let start = self.passages.partition_point(|p| p.work_id < work_id);
        let end = self.passages.partition_point(|p| p.work_id <= work_id);
        &self.passages[start..end]
    }

    fn next_work_id(&self) -> u32 {
        self.works.len() as u32 + 1
    }

    fn next_passage_id(&self) -> u32 {
        self.passages.len() as u32 + 1
    }

    fn push_play(&mut self, path: &Path, title: String, year: i32, mut scenes: Vec<SceneText>) {
        scenes.sort_by_key(|s| (safe_int(&s.act_label), safe_int(&s.scene_label)));
        if scenes.is_empty() {
            warn!("{} ({title}) has no scenes", path.display());
        }
        let work_id = self.next_work_id();
        debug!("{} -> work {work_id}: {title}, {} scenes", path.display(), scenes.len());
        self.works.push(Work {
            id: work_id,
            title,
            kind: WorkKind::Play,
            year,
            description: format!("A {year} play by William Shakespeare"),
        });
        for scene in scenes {
            let passage = Passage {
                id: self.next_passage_id(),
                work_id,
                title: scene_title(&scene.act_label, &scene.scene_label),
                content: scene.content,
                act: Some(safe_int(&scene.act_label)),
                scene: Some(safe_int(&scene.scene_label)),
            };
            self.passages.push(passage);
        }
    }

    fn push_sonnets(&mut self, year: i32, sonnets: Vec<SonnetText>) {
        for sonnet in sonnets {
            let work_id = self.next_work_id();
            let title = format!("Sonnet {}", sonnet.number);
            self.works.push(Work {
                id: work_id,
                title: title.clone(),
                kind: WorkKind::Sonnet,
                year,
                description: excerpt(&sonnet.content),
            });
            let passage = Passage {
                id: self.next_passage_id(),
                work_id,
                title,
                content: sonnet.content,
                act: None,
                scene: None,
            };
            self.passages.push(passage);
        }
    }
}

/// `.xml` files directly under `dir`, sorted by file name.
fn corpus_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if is_xml && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn ingest_file(path: &Path, layout: &CorpusLayout, mode: LoadMode) -> Result<Ingested, IngestError> {
    let root = load_tree(path, mode).map_err(|source| IngestError::Parse {
        file: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let missing = |field| IngestError::MissingField {
        file: path.to_path_buf(),
        field,
    };

    match layout.role_of(file_name) {
        FileRole::Lexicon => {
            let lexicon = Lexicon::from_tree(&root);
            info!("{file_name}: {} lexicon entries", lexicon.len());
            Ok(Ingested::Lexicon(lexicon))
        }
        FileRole::Sonnets => {
            let schema = select_sonnet_schema(&root).ok_or_else(|| missing("sonnets"))?;
            let sonnets = extract_sonnets(schema, &root);
            let year = schema.find_year(&root).unwrap_or(DEFAULT_SONNET_YEAR);
            info!("{file_name}: {} sonnets ({} convention)", sonnets.len(), schema.name());
            Ok(Ingested::Sonnets { year, sonnets })
        }
        FileRole::Play => {
            let (schema, title) = select_by_title(&root).ok_or_else(|| missing("title"))?;
            let scenes = extract_scenes(schema, &root);
            let year = schema.find_year(&root).unwrap_or(DEFAULT_PLAY_YEAR);
            info!("{file_name}: {title} ({} scenes, {} convention)", scenes.len(), schema.name());
            Ok(Ingested::Play {
                title,
                year,
                scenes,
            })
        }
    }
}

fn scene_title(act_label: &str, scene_label: &str) -> String {
    let textual = act_label.parse::<i32>().is_err();
    if textual && !act_label.is_empty() && act_label.eq_ignore_ascii_case(scene_label) {
        capitalize(act_label)
    } else {
        format!("Act {act_label}, Scene {scene_label}")
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn excerpt(content: &str) -> String {
    let head: String = content.chars().take(SONNET_EXCERPT_CHARS).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_dispatches_by_basename() {
        let layout = CorpusLayout::default();
        assert_eq!(layout.role_of("son.xml"), FileRole::Sonnets);
        assert_eq!(layout.role_of("Sonnets.XML"), FileRole::Sonnets);
        assert_eq!(layout.role_of("schmidt.xml"), FileRole::Lexicon);
        assert_eq!(layout.role_of("ham.xml"), FileRole::Play);
    }

    #[test]
    fn scene_titles() {
        assert_eq!(scene_title("1", "2"), "Act 1, Scene 2");
        assert_eq!(scene_title("prologue", "prologue"), "Prologue");
        assert_eq!(scene_title("5", "epilogue"), "Act 5, Scene epilogue");
    }

    #[test]
    fn excerpt_counts_characters() {
        let line = "Shall I compare thee to a summer’s day? Thou art more lovely";
        let short = excerpt(line);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 53);
        assert_eq!(excerpt("Brief"), "Brief...");
    }

    #[test]
    fn empty_catalog_lookups_miss() {
        let catalog = Catalog::default();
        assert!(catalog.work(1).is_none());
        assert!(catalog.passage(1).is_none());
        assert!(catalog.passages_for(1).is_empty());
    }
}
