//! Scene reconstruction for plays.
//!
//! A scene is flattened into a sequence of events in document order and then
//! folded into display lines. The fold carries who is speaking and what they
//! have said since the last flush; every line break in the output goes through
//! the same `flush` transition.

use folio_markup::{Node, Role, Schema};

/// One reconstructed scene, labels still as written in the source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SceneText {
    pub act_label: String,
    pub scene_label: String,
    pub content: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Event {
    /// A speech opens, with its speaker if one is named.
    Speech(Option<String>),
    Verse(String),
    Stage(String),
    /// Verse outside any speech.
    Loose(String),
}

#[derive(Debug, Default)]
struct Turns {
    emitted: Vec<String>,
    speaker: Option<String>,
    buffer: Vec<String>,
}

impl Turns {
    fn flush(mut self) -> Self {
        if !self.buffer.is_empty() {
            let said = self.buffer.join(" ");
            match &self.speaker {
                Some(speaker) => self.emitted.push(format!("{speaker}: {said}")),
                None => self.emitted.push(said),
            }
            self.buffer.clear();
        }
        self
    }

    fn step(self, event: Event) -> Self {
        match event {
            Event::Speech(speaker) if speaker.is_some() && speaker == self.speaker => self,
            Event::Speech(speaker) => Turns {
                speaker,
                ..self.flush()
            },
            Event::Verse(text) if self.speaker.is_none() => {
                let mut next = self;
                next.emitted.push(text);
                next
            }
            Event::Verse(text) => {
                let mut next = self;
                next.buffer.push(text);
                next
            }
            Event::Stage(text) => {
                let mut next = self.flush();
                next.emitted.push(format!("[{text}]"));
                next
            }
            Event::Loose(text) => {
                let mut next = Turns {
                    speaker: None,
                    ..self.flush()
                };
                next.emitted.push(text);
                next
            }
        }
    }

    fn finish(self) -> String {
        self.flush().emitted.join("\n").trim().to_string()
    }
}

/// Reconstruct every scene of a play, in document order.
///
/// The cast-list division is skipped, as are scenes that produce no lines.
pub fn extract_scenes(schema: &dyn Schema, root: &Node) -> Vec<SceneText> {
    schema
        .find_acts(root)
        .into_iter()
        .filter(|act| !is_cast_list(act.label.as_str(), act.node))
        .flat_map(|act| {
            schema
                .find_scenes(act.node)
                .into_iter()
                .map(move |scene| (act.label.clone(), scene))
        })
        .filter_map(|(act_label, scene)| {
            let content = scene_content(schema, scene.node);
            (!content.is_empty()).then(|| SceneText {
                act_label,
                scene_label: scene.label,
                content,
            })
        })
        .collect()
}

fn is_cast_list(label: &str, act: &Node) -> bool {
    label.eq_ignore_ascii_case("cast") || act.elements().any(|n| n.is("castList"))
}

/// Fold one scene's events into newline-joined display lines.
pub fn scene_content(schema: &dyn Schema, scene: &Node) -> String {
    let mut events = Vec::new();
    collect_events(schema, scene, false, &mut events);
    events
        .into_iter()
        .fold(Turns::default(), Turns::step)
        .finish()
}

fn collect_events(schema: &dyn Schema, node: &Node, in_speech: bool, out: &mut Vec<Event>) {
    for child in node.elements() {
        match schema.classify(child) {
            Role::Speech => {
                let speaker = child
                    .elements()
                    .find(|n| schema.classify(n) == Role::Speaker)
                    .map(Node::text)
                    .filter(|s| !s.is_empty());
                out.push(Event::Speech(speaker));
                collect_events(schema, child, true, out);
            }
            Role::Speaker => {}
            Role::Verse => {
                let is_stage = |n: &Node| schema.classify(n) == Role::Stage;
                let text = child.text_excluding(is_stage);
                if !text.is_empty() {
                    out.push(if in_speech {
                        Event::Verse(text)
                    } else {
                        Event::Loose(text)
                    });
                }
                out.extend(
                    child
                        .descendants()
                        .filter(|n| is_stage(*n))
                        .map(Node::text)
                        .filter(|t| !t.is_empty())
                        .map(Event::Stage),
                );
            }
            Role::Stage => {
                let text = child.text();
                if !text.is_empty() {
                    out.push(Event::Stage(text));
                }
            }
            Role::Other => collect_events(schema, child, in_speech, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_markup::parse;
    use folio_markup::schema::{FlatSchema, TeiSchema};

    fn tei_scene(body: &str) -> String {
        let root = parse(&format!("<div2 type=\"scene\" n=\"1\">{body}</div2>")).unwrap();
        scene_content(&TeiSchema, &root)
    }

    #[test]
    fn coalesces_consecutive_lines_of_one_speaker() {
        let content = tei_scene(
            "<sp><speaker>Hamlet</speaker><l>To be, or not to be,</l><l>that is the question:</l></sp>\
             <sp><speaker>Hamlet</speaker><l>Whether 'tis nobler</l></sp>\
             <sp><speaker>Ophelia</speaker><l>Good my lord,</l></sp>",
        );
        assert_eq!(
            content,
            "Hamlet: To be, or not to be, that is the question: Whether 'tis nobler\n\
             Ophelia: Good my lord,"
        );
    }

    #[test]
    fn stage_direction_splits_a_turn() {
        let content = tei_scene(
            "<sp><speaker>Hamlet</speaker><l>Alas, poor Yorick!</l>\
             <stage>Takes the skull</stage><l>I knew him, Horatio</l></sp>",
        );
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            [
                "Hamlet: Alas, poor Yorick!",
                "[Takes the skull]",
                "Hamlet: I knew him, Horatio"
            ]
        );
    }

    #[test]
    fn nested_stage_follows_its_line() {
        let content = tei_scene(
            "<sp><speaker>Ghost</speaker><l>Swear. <stage>Beneath</stage></l><l>Swear by his sword.</l></sp>",
        );
        assert_eq!(content, "Ghost: Swear.\n[Beneath]\nGhost: Swear by his sword.");
    }

    #[test]
    fn unattributed_verse_stays_plain() {
        let content = tei_scene(
            "<stage>Enter Chorus</stage><l>Two households, both alike in dignity,</l>\
             <sp><l>In fair Verona</l></sp>",
        );
        assert_eq!(
            content,
            "[Enter Chorus]\nTwo households, both alike in dignity,\nIn fair Verona"
        );
    }

    #[test]
    fn flat_plays_use_their_own_tags() {
        let root = parse(
            "<PLAY><TITLE>The Tempest</TITLE>\
             <ACT><TITLE>ACT I</TITLE><SCENE><TITLE>SCENE I. On a ship</TITLE>\
             <STAGEDIR>A tempestuous noise of thunder</STAGEDIR>\
             <SPEECH><SPEAKER>Master</SPEAKER><LINE>Boatswain!</LINE></SPEECH>\
             <SPEECH><SPEAKER>Boatswain</SPEAKER><LINE>Here, master:</LINE><LINE>what cheer?</LINE></SPEECH>\
             </SCENE><SCENE/></ACT></PLAY>",
        )
        .unwrap();
        let scenes = extract_scenes(&FlatSchema, &root);
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].act_label, "1");
        assert_eq!(scenes[0].scene_label, "1");
        assert_eq!(
            scenes[0].content,
            "[A tempestuous noise of thunder]\nMaster: Boatswain!\nBoatswain: Here, master: what cheer?"
        );
    }

    #[test]
    fn skips_cast_list_act() {
        let root = parse(
            "<TEI.2><text><body>\
             <div1 type=\"act\" n=\"cast\"><div2 type=\"scene\"><sp><speaker>X</speaker><l>y</l></sp></div2></div1>\
             <div1 type=\"act\" n=\"1\"><div2 type=\"scene\" n=\"2\"><sp><speaker>A</speaker><l>b</l></sp></div2></div1>\
             </body></text></TEI.2>",
        )
        .unwrap();
        let scenes = extract_scenes(&TeiSchema, &root);
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].scene_label, "2");
        assert_eq!(scenes[0].content, "A: b");
    }
}
