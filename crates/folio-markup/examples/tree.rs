use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use folio_markup::{LoadMode, Node, load_tree, schema};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p folio-markup --example tree -- <file.xml>")?;

    let root = load_tree(&path, LoadMode::Mmap)
        .with_context(|| format!("loading {}", path.display()))?;

    println!("File: {}", path.display());
    match schema::select_by_title(&root) {
        Some((adapter, title)) => {
            println!("Convention: {}", adapter.name());
            println!("Title     : {}", title);
            println!("Year      : {:?}", adapter.find_year(&root));
            for act in adapter.find_acts(&root) {
                let scenes = adapter.find_scenes(act.node);
                println!("  act {:<10} {} scene(s)", act.label, scenes.len());
            }
        }
        None => println!("No adapter found a title"),
    }

    println!("\nOutline:");
    outline(&root, 0, 3);
    Ok(())
}

fn outline(node: &Node, depth: usize, max_depth: usize) {
    let count = node.elements().count();
    println!("{}<{}> ({} children)", "  ".repeat(depth), node.tag, count);
    if depth == max_depth {
        return;
    }
    for child in node.elements() {
        outline(child, depth + 1, max_depth);
    }
}
