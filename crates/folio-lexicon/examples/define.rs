use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use folio_lexicon::{Lexicon, normalize_query};
use folio_markup::LoadMode;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .context("usage: cargo run -p folio-lexicon --example define -- <lexicon.xml> <word>...")?;
    let words: Vec<String> = args.collect();

    let lexicon = Lexicon::load(&path, LoadMode::Mmap)
        .with_context(|| format!("loading {}", path.display()))?;
    println!("{} headwords in {}", lexicon.len(), path.display());

    if words.is_empty() {
        let mut sample: Vec<(&str, &str)> = lexicon.iter().collect();
        sample.sort_unstable();
        for (headword, definition) in sample.into_iter().take(10) {
            println!("{headword:>16}    {definition}");
        }
        return Ok(());
    }

    for word in &words {
        let tried: Vec<String> = normalize_query(word)
            .map(|forms| forms.candidates().map(str::to_string).collect())
            .unwrap_or_default();
        match lexicon.resolve(word) {
            Some(def) => println!("{word:>16} -> {}: {}", def.word, def.definition),
            None => println!("{word:>16} -> not found (tried {tried:?})"),
        }
    }
    Ok(())
}
