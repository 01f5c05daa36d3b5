use std::sync::Arc;

use folio_lexicon::Dictionary;
use folio_types::{Definition, Passage, Work};

use crate::catalog::Catalog;

/// Read-only handle over a built catalog and the word lookup.
#[derive(Clone)]
pub struct Library {
    catalog: Arc<Catalog>,
    dictionary: Arc<Dictionary>,
}

impl Library {
    pub fn new(catalog: Arc<Catalog>, dictionary: Arc<Dictionary>) -> Self {
        Self {
            catalog,
            dictionary,
        }
    }

    /// Catalog only; lookups never leave the process.
    pub fn offline(catalog: Arc<Catalog>) -> Self {
        let dictionary = Arc::new(Dictionary::offline(Arc::clone(catalog.lexicon())));
        Self::new(catalog, dictionary)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn works(&self) -> &[Work] {
        self.catalog.works()
    }

    pub fn work(&self, id: u32) -> Option<&Work> {
        self.catalog.work(id)
    }

    pub fn passages_for(&self, work_id: u32) -> &[Passage] {
        self.catalog.passages_for(work_id)
    }

    pub fn passage(&self, id: u32) -> Option<&Passage> {
        self.catalog.passage(id)
    }

    pub async fn define(&self, word: &str) -> Option<Definition> {
        self.dictionary.lookup(word).await
    }

    pub fn lexicon_len(&self) -> usize {
        self.dictionary.lexicon().len()
    }
}
