use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::MarkupError;

/// Element of the generic attributed tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Node {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Content>,
}

/// Child of a [`Node`]: a nested element or a text leaf.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Content {
    Element(Node),
    Text(String),
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Case-sensitive tag comparison.
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn is_ignore_case(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Direct child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Content::Element(node) => Some(node),
            Content::Text(_) => None,
        })
    }

    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.elements().find(|n| n.is(tag))
    }

    /// All descendant elements in document (pre-)order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Node> = self.elements().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// First descendant with exactly this tag.
    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.descendants().find(|n| n.is(tag))
    }

    /// Descendant text with whitespace runs collapsed and ends trimmed.
    pub fn text(&self) -> String {
        self.text_excluding(|_| false)
    }

    /// Text leaves joined with spaces, so adjacent elements never run
    /// together.
    pub fn spaced_text(&self) -> String {
        let mut raw = String::new();
        collect_spaced(self, &mut raw);
        collapse_whitespace(&raw)
    }

    /// Like [`Node::text`], skipping any subtree for which `skip` holds.
    pub fn text_excluding<F>(&self, skip: F) -> String
    where
        F: Fn(&Node) -> bool,
    {
        let mut raw = String::new();
        collect_text(self, &skip, &mut raw);
        collapse_whitespace(&raw)
    }
}

fn collect_text<F>(node: &Node, skip: &F, out: &mut String)
where
    F: Fn(&Node) -> bool,
{
    for child in &node.children {
        match child {
            Content::Text(text) => out.push_str(text),
            Content::Element(el) if !skip(el) => collect_text(el, skip, out),
            Content::Element(_) => out.push(' '),
        }
    }
}

fn collect_spaced(node: &Node, out: &mut String) {
    for child in &node.children {
        match child {
            Content::Text(text) => {
                out.push(' ');
                out.push_str(text);
            }
            Content::Element(el) => collect_spaced(el, out),
        }
    }
}

pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let before = self.stack.len();
        self.stack.extend(node.elements());
        self.stack[before..].reverse();
        Some(node)
    }
}

/// Parse markup into an attributed tree.
///
/// The input is expected to have gone through [`crate::normalize`] first so
/// that only XML-predefined and numeric references remain. Comments,
/// processing instructions and the DOCTYPE are skipped.
pub fn parse(text: &str) -> Result<Node, MarkupError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(reader.error_position(), e.to_string()))?;
        let position = reader.buffer_position();
        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed(position, "more than one root element"));
                }
                stack.push(open(&start, position)?);
            }
            Event::Empty(start) => {
                let node = open(&start, position)?;
                attach(node, &mut stack, &mut root, position)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| malformed(position, "closing tag without an open element"))?;
                attach(node, &mut stack, &mut root, position)?;
            }
            Event::Text(raw) => {
                let unescaped = raw
                    .unescape()
                    .map_err(|e| malformed(position, e.to_string()))?;
                push_text(&unescaped, &mut stack, position)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data).into_owned();
                push_text(&text, &mut stack, position)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            reader.buffer_position(),
            format!("unclosed element <{}>", open.tag),
        ));
    }
    root.ok_or_else(|| malformed(0, "no root element"))
}

fn open(start: &BytesStart<'_>, position: u64) -> Result<Node, MarkupError> {
    let mut node = Node::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| malformed(position, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(position, e.to_string()))?
            .into_owned();
        node.attributes.insert(key, value);
    }
    Ok(node)
}

fn attach(
    node: Node,
    stack: &mut [Node],
    root: &mut Option<Node>,
    position: u64,
) -> Result<(), MarkupError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Content::Element(node));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(malformed(position, "more than one root element")),
    }
}

fn push_text(text: &str, stack: &mut [Node], position: u64) -> Result<(), MarkupError> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(Content::Text(prev)) = parent.children.last_mut() {
                prev.push_str(text);
            } else {
                parent.children.push(Content::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed(position, "text outside the root element")),
    }
}

fn malformed(position: u64, message: impl Into<String>) -> MarkupError {
    MarkupError::Malformed {
        position,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_attributed_tree() {
        let root = parse(
            r#"<?xml version="1.0"?>
<!DOCTYPE TEI.2 SYSTEM "tei2.dtd">
<TEI.2><text><div1 type="act" n="1"><l>To be, <hi>or</hi> not</l><lb/></div1></text></TEI.2>"#,
        )
        .unwrap();
        assert_eq!(root.tag, "TEI.2");
        let act = root.find("div1").unwrap();
        assert_eq!(act.attr("type"), Some("act"));
        assert_eq!(act.attr("n"), Some("1"));
        assert_eq!(act.child("l").unwrap().text(), "To be, or not");
        assert!(act.child("lb").unwrap().children.is_empty());
    }

    #[test]
    fn descendants_are_in_document_order() {
        let root = parse("<a><b><c/></b><d/></a>").unwrap();
        let tags: Vec<&str> = root.descendants().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, ["b", "c", "d"]);
    }

    #[test]
    fn unescapes_text_and_attributes() {
        let root = parse(r#"<w k="a&amp;b">&lt;x&gt; &#8212; <![CDATA[<raw>]]></w>"#).unwrap();
        assert_eq!(root.attr("k"), Some("a&b"));
        assert_eq!(root.text(), "<x> — <raw>");
    }

    #[test]
    fn text_excluding_skips_subtrees() {
        let root = parse("<l><stage>Aside</stage>Words, words</l>").unwrap();
        assert_eq!(root.text_excluding(|n| n.is("stage")), "Words, words");
        assert_eq!(root.spaced_text(), "Aside Words, words");
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(matches!(
            parse("<a><b></a>"),
            Err(MarkupError::Malformed { .. })
        ));
        assert!(parse("<a><b>").is_err());
        assert!(parse("not markup at all").is_err());
        assert!(parse("").is_err());
        assert!(parse("<a/><b/>").is_err());
    }
}
