use std::path::PathBuf;

use folio_markup::schema::{self, FlatSchema, Schema, TeiSchema};
use folio_markup::{LoadMode, MarkupError, Role, load_tree};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn parses_tei_play_through_the_tei_adapter() {
    let root = load_tree(fixture("tei_play.xml"), LoadMode::Mmap).expect("load fixture");
    let (adapter, title) = schema::select_by_title(&root).expect("title");
    assert_eq!(adapter.name(), "tei");
    assert_eq!(title, "The Tragedie of Hamlet, Prince of Denmarke");
    assert_eq!(adapter.find_year(&root), Some(1623));

    let acts = adapter.find_acts(&root);
    let labels: Vec<&str> = acts.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, ["cast", "1"]);

    let scenes = adapter.find_scenes(acts[1].node);
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].label, "1");

    let speech = scenes[0].node.find("sp").expect("speech");
    assert_eq!(adapter.classify(speech), Role::Speech);
    assert_eq!(speech.child("l").unwrap().text(), "Who’s there?");
    let speeches: Vec<String> = scenes[0]
        .node
        .elements()
        .filter(|n| n.is("sp"))
        .map(|n| n.spaced_text())
        .collect();
    assert_eq!(
        speeches[1],
        "Francisco Nay answer me: Stand & vnfold your selfe."
    );
}

#[test]
fn parses_flat_play_through_the_flat_adapter() {
    let root = load_tree(fixture("flat_play.xml"), LoadMode::Owned).expect("load fixture");
    assert!(TeiSchema.find_title(&root).is_none());
    let (adapter, title) = schema::select_by_title(&root).expect("title");
    assert_eq!(adapter.name(), "flat");
    assert_eq!(title, "The Tempest");
    assert_eq!(adapter.find_year(&root), Some(1611));

    let acts = FlatSchema.find_acts(&root);
    let labels: Vec<&str> = acts.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(labels, ["1", "epilogue"]);
    let stage = acts[0].node.find("STAGEDIR").unwrap();
    assert_eq!(FlatSchema.classify(stage), Role::Stage);
}

#[test]
fn reports_malformed_file() {
    let err = load_tree(fixture("broken.xml"), LoadMode::Mmap).unwrap_err();
    assert!(matches!(err, MarkupError::Malformed { .. }), "{err}");
}
