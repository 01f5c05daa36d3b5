//! Schema adapters over the generic tree.
//!
//! The corpus mixes two conventions for the same kinds of document: TEI
//! (`TEI.2` root, `div1`/`div2` divisions, `sp`/`speaker`/`l`/`stage`) and a
//! flat upper-case one (`PLAY`/`POEMS`/`LEXICON` roots, `ACT`/`SCENE`,
//! `SPEECH`/`SPEAKER`/`LINE`/`STAGEDIR`). Each adapter answers the same
//! questions about a tree; callers try them in [`adapters`] order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::tree::Node;

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b1[56]\d{2}\b").expect("valid year pattern"));

/// What a node means inside a scene.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Speech,
    Speaker,
    Verse,
    Stage,
    Other,
}

/// A labelled structural division (act, scene, sonnet) and its node.
#[derive(Clone, Debug)]
pub struct Division<'a> {
    pub label: String,
    pub node: &'a Node,
}

/// Headword/definition pair as found in the source, before key folding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawEntry {
    pub headword: Option<String>,
    pub definition: String,
}

/// Extraction interface shared by every markup convention.
pub trait Schema: Sync {
    fn name(&self) -> &'static str;
    fn find_title(&self, root: &Node) -> Option<String>;
    fn find_year(&self, root: &Node) -> Option<i32>;
    fn find_acts<'a>(&self, root: &'a Node) -> Vec<Division<'a>>;
    fn find_scenes<'a>(&self, act: &'a Node) -> Vec<Division<'a>>;
    /// Every sonnet-like division, dedications included.
    fn find_sonnets<'a>(&self, root: &'a Node) -> Vec<Division<'a>>;
    fn find_entries(&self, root: &Node) -> Vec<RawEntry>;
    fn classify(&self, node: &Node) -> Role;
}

static ADAPTERS: [&dyn Schema; 2] = [&TeiSchema, &FlatSchema];

/// Adapters in preference order.
pub fn adapters() -> &'static [&'static dyn Schema] {
    &ADAPTERS
}

/// First adapter that yields a non-empty title, together with that title.
pub fn select_by_title(root: &Node) -> Option<(&'static dyn Schema, String)> {
    adapters()
        .iter()
        .find_map(|schema| schema.find_title(root).map(|title| (*schema, title)))
}

/// First 15xx/16xx year mentioned in `text`.
pub fn first_year(text: &str) -> Option<i32> {
    YEAR.find(text).and_then(|m| m.as_str().parse().ok())
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

fn strip_homograph_digits(key: &str) -> &str {
    key.trim().trim_end_matches(|c: char| c.is_ascii_digit())
}

/// `TEI.2` documents.
pub struct TeiSchema;

const TEI_SCENE_TYPES: &[&str] = &["scene", "prologue", "epilogue"];

impl TeiSchema {
    fn type_is(node: &Node, wanted: &[&str]) -> bool {
        node.attr("type")
            .is_some_and(|t| wanted.iter().any(|w| t.eq_ignore_ascii_case(w)))
    }

    fn label(node: &Node) -> String {
        match (node.attr("n"), node.attr("type")) {
            (Some(n), _) if !n.trim().is_empty() => n.trim().to_string(),
            (_, Some(t)) if !t.eq_ignore_ascii_case("scene") && !t.eq_ignore_ascii_case("act") => {
                t.to_ascii_lowercase()
            }
            _ => String::new(),
        }
    }
}

impl Schema for TeiSchema {
    fn name(&self) -> &'static str {
        "tei"
    }

    fn find_title(&self, root: &Node) -> Option<String> {
        root.find("teiHeader")
            .and_then(|header| header.find("title"))
            .or_else(|| root.find("title"))
            .map(Node::text)
            .and_then(non_empty)
    }

    fn find_year(&self, root: &Node) -> Option<i32> {
        root.find("teiHeader")
            .and_then(|header| first_year(&header.spaced_text()))
            .or_else(|| first_year(&root.spaced_text()))
    }

    fn find_acts<'a>(&self, root: &'a Node) -> Vec<Division<'a>> {
        root.descendants()
            .filter(|n| n.is("div1") && Self::type_is(n, &["act", "prologue", "epilogue"]))
            .map(|node| Division {
                label: Self::label(node),
                node,
            })
            .collect()
    }

    fn find_scenes<'a>(&self, act: &'a Node) -> Vec<Division<'a>> {
        let scenes: Vec<Division<'a>> = act
            .descendants()
            .filter(|n| n.is("div2") && Self::type_is(n, TEI_SCENE_TYPES))
            .map(|node| Division {
                label: Self::label(node),
                node,
            })
            .collect();
        if scenes.is_empty() && Self::type_is(act, &["prologue", "epilogue"]) {
            return vec![Division {
                label: Self::label(act),
                node: act,
            }];
        }
        scenes
    }

    fn find_sonnets<'a>(&self, root: &'a Node) -> Vec<Division<'a>> {
        root.descendants()
            .filter(|n| n.is("div1") && Self::type_is(n, &["sonnet", "dedication"]))
            .map(|node| Division {
                label: if Self::type_is(node, &["dedication"]) {
                    "dedication".to_string()
                } else {
                    node.attr("n").unwrap_or_default().trim().to_string()
                },
                node,
            })
            .collect()
    }

    fn find_entries(&self, root: &Node) -> Vec<RawEntry> {
        root.descendants()
            .filter(|n| n.is("entryFree") || n.is("entry"))
            .map(|entry| {
                let headword = entry
                    .attr("key")
                    .map(strip_homograph_digits)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .or_else(|| entry.find("orth").map(Node::text).and_then(non_empty));
                let defs: Vec<String> = entry
                    .descendants()
                    .filter(|n| n.is("def"))
                    .map(Node::text)
                    .filter(|d| !d.is_empty())
                    .collect();
                let definition = if defs.is_empty() {
                    entry.spaced_text()
                } else {
                    defs.join("; ")
                };
                RawEntry {
                    headword,
                    definition,
                }
            })
            .collect()
    }

    fn classify(&self, node: &Node) -> Role {
        // Some TEI plays use speech/speaker1/line inside div1/div2.
        match node.tag.as_str() {
            "sp" | "speech" => Role::Speech,
            "speaker" | "speaker1" => Role::Speaker,
            "l" | "p" | "line" => Role::Verse,
            "stage" => Role::Stage,
            _ => Role::Other,
        }
    }
}

/// Flat upper-case documents (`PLAY`, `POEMS`, `LEXICON`).
///
/// Tags are compared case-insensitively, which also covers the lower-case
/// `speech`/`speaker1`/`line` variant seen in some play files.
pub struct FlatSchema;

impl FlatSchema {
    fn numbered<'a>(nodes: impl Iterator<Item = &'a Node>, tag: &str) -> Vec<Division<'a>> {
        let mut ordinal = 0usize;
        let mut out = Vec::new();
        for node in nodes {
            if node.is_ignore_case("prologue") || node.is_ignore_case("epilogue") {
                out.push(Division {
                    label: node.tag.to_ascii_lowercase(),
                    node,
                });
            } else if node.is_ignore_case(tag) {
                ordinal += 1;
                let label = node
                    .attr("n")
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| ordinal.to_string());
                out.push(Division { label, node });
            }
        }
        out
    }

    fn child_text(node: &Node, tags: &[&str]) -> Option<String> {
        node.elements()
            .find(|n| tags.iter().any(|t| n.is_ignore_case(t)))
            .map(Node::text)
            .and_then(non_empty)
    }
}

impl Schema for FlatSchema {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn find_title(&self, root: &Node) -> Option<String> {
        Self::child_text(root, &["title"])
    }

    fn find_year(&self, root: &Node) -> Option<i32> {
        root.elements()
            .find(|n| n.is_ignore_case("fm"))
            .and_then(|fm| first_year(&fm.spaced_text()))
            .or_else(|| first_year(&root.spaced_text()))
    }

    fn find_acts<'a>(&self, root: &'a Node) -> Vec<Division<'a>> {
        Self::numbered(root.elements(), "act")
    }

    fn find_scenes<'a>(&self, act: &'a Node) -> Vec<Division<'a>> {
        if act.is_ignore_case("prologue") || act.is_ignore_case("epilogue") {
            return vec![Division {
                label: act.tag.to_ascii_lowercase(),
                node: act,
            }];
        }
        Self::numbered(act.elements(), "scene")
    }

    fn find_sonnets<'a>(&self, root: &'a Node) -> Vec<Division<'a>> {
        let mut ordinal = 0usize;
        let mut out = Vec::new();
        for node in root.descendants() {
            let is_dedication = node.is_ignore_case("dedication")
                || node
                    .attr("type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("dedication"));
            if is_dedication {
                out.push(Division {
                    label: "dedication".to_string(),
                    node,
                });
            } else if node.is_ignore_case("sonnet") || node.is_ignore_case("poem") {
                ordinal += 1;
                let label = node
                    .attr("n")
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| ordinal.to_string());
                out.push(Division { label, node });
            }
        }
        out
    }

    fn find_entries(&self, root: &Node) -> Vec<RawEntry> {
        root.descendants()
            .filter(|n| n.is_ignore_case("entry"))
            .map(|entry| RawEntry {
                headword: Self::child_text(entry, &["word", "headword"])
                    .or_else(|| entry.attr("word").map(str::trim).map(str::to_string))
                    .filter(|w| !w.is_empty()),
                definition: Self::child_text(entry, &["definition", "def"]).unwrap_or_default(),
            })
            .collect()
    }

    fn classify(&self, node: &Node) -> Role {
        match node.tag.to_ascii_lowercase().as_str() {
            "speech" => Role::Speech,
            "speaker" | "speaker1" => Role::Speaker,
            "line" | "l" => Role::Verse,
            "stagedir" | "stage" => Role::Stage,
            _ => Role::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse;

    #[test]
    fn prefers_tei_title_then_flat() {
        let tei = parse(
            "<TEI.2><teiHeader><fileDesc><titleStmt><title>Hamlet</title></titleStmt>\
             <publicationStmt><date>1603</date></publicationStmt></fileDesc></teiHeader></TEI.2>",
        )
        .unwrap();
        let (schema, title) = select_by_title(&tei).unwrap();
        assert_eq!(schema.name(), "tei");
        assert_eq!(title, "Hamlet");
        assert_eq!(schema.find_year(&tei), Some(1603));

        let flat = parse("<PLAY><TITLE>The Tempest</TITLE><ACT/></PLAY>").unwrap();
        let (schema, title) = select_by_title(&flat).unwrap();
        assert_eq!(schema.name(), "flat");
        assert_eq!(title, "The Tempest");
        assert_eq!(schema.find_year(&flat), None);
    }

    #[test]
    fn no_adapter_without_title() {
        let root = parse("<TEI.2><text/></TEI.2>").unwrap();
        assert!(select_by_title(&root).is_none());
    }

    #[test]
    fn flat_labels_fall_back_to_ordinals() {
        let root = parse(
            "<PLAY><TITLE>T</TITLE><PROLOGUE/><ACT><SCENE/><SCENE n=\"7\"/></ACT><ACT/><EPILOGUE/></PLAY>",
        )
        .unwrap();
        let acts = FlatSchema.find_acts(&root);
        let labels: Vec<&str> = acts.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["prologue", "1", "2", "epilogue"]);
        let scenes = FlatSchema.find_scenes(acts[1].node);
        let labels: Vec<&str> = scenes.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["1", "7"]);
        assert_eq!(FlatSchema.find_scenes(acts[0].node)[0].label, "prologue");
    }

    #[test]
    fn tei_entries_strip_homograph_digits() {
        let root = parse(
            r#"<TEI.2><text><body>
                <entryFree key="Bear2"><orth>Bear</orth>, <def>to carry</def></entryFree>
                <entryFree><orth>Abate</orth> to lessen</entryFree>
                <entryFree key=""> orphan</entryFree>
            </body></text></TEI.2>"#,
        )
        .unwrap();
        let entries = TeiSchema.find_entries(&root);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].headword.as_deref(), Some("Bear"));
        assert_eq!(entries[0].definition, "to carry");
        assert_eq!(entries[1].headword.as_deref(), Some("Abate"));
        assert_eq!(entries[1].definition, "Abate to lessen");
        assert_eq!(entries[2].headword, None);
    }

    #[test]
    fn tei_classifies_both_speech_tag_sets() {
        let root = parse(
            "<div2 type=\"scene\"><sp><speaker>A</speaker><l>x</l></sp>\
             <speech><speaker1>B</speaker1><line>y</line></speech><stage>Exit</stage></div2>",
        )
        .unwrap();
        let roles: Vec<Role> = root.descendants().map(|n| TeiSchema.classify(n)).collect();
        assert_eq!(
            roles,
            [
                Role::Speech,
                Role::Speaker,
                Role::Verse,
                Role::Speech,
                Role::Speaker,
                Role::Verse,
                Role::Stage
            ]
        );
    }

    #[test]
    fn finds_first_year() {
        assert_eq!(first_year("printed 1623, acted 1601"), Some(1623));
        assert_eq!(first_year("line 21600 and 1700"), None);
    }
}
