use folio_markup::schema::adapters;
use folio_markup::{Node, Role, Schema};

/// Label the schema adapters give a dedication division.
const DEDICATION: &str = "dedication";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SonnetText {
    pub number: String,
    pub content: String,
}

/// First adapter that finds any sonnet division in `root`.
pub fn select_sonnet_schema(root: &Node) -> Option<&'static dyn Schema> {
    adapters()
        .iter()
        .copied()
        .find(|schema| !schema.find_sonnets(root).is_empty())
}

/// Sonnets in document order, with dedications and empty poems dropped.
pub fn extract_sonnets(schema: &dyn Schema, root: &Node) -> Vec<SonnetText> {
    schema
        .find_sonnets(root)
        .into_iter()
        .filter(|division| !division.label.eq_ignore_ascii_case(DEDICATION))
        .filter_map(|division| {
            let content = division
                .node
                .descendants()
                .filter(|n| schema.classify(n) == Role::Verse)
                .map(Node::text)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            (!content.is_empty()).then_some(SonnetText {
                number: division.label,
                content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_markup::parse;

    #[test]
    fn drops_dedication_and_empty_sonnets() {
        let root = parse(
            r#"<TEI.2><text><body>
                <div1 type="dedication"><l>TO THE ONLIE BEGETTER</l></div1>
                <div1 type="sonnet" n="dedication"><l>Mr. W. H.</l></div1>
                <div1 type="sonnet" n="18">
                  <l>Shall I compare thee to a summer's day?</l>
                  <l>Thou art more lovely and more temperate:</l>
                </div1>
                <div1 type="sonnet" n="19"/>
            </body></text></TEI.2>"#,
        )
        .unwrap();
        let schema = select_sonnet_schema(&root).unwrap();
        assert_eq!(schema.name(), "tei");
        let sonnets = extract_sonnets(schema, &root);
        assert_eq!(sonnets.len(), 1);
        assert_eq!(sonnets[0].number, "18");
        assert_eq!(
            sonnets[0].content,
            "Shall I compare thee to a summer's day?\nThou art more lovely and more temperate:"
        );
    }

    #[test]
    fn flat_poems_number_by_position() {
        let root = parse(
            "<POEMS><TITLE>Sonnets</TITLE>\
             <SONNET><LINE>From fairest creatures we desire increase,</LINE></SONNET>\
             <SONNET><LINE>When forty winters shall besiege thy brow,</LINE></SONNET>\
             </POEMS>",
        )
        .unwrap();
        let schema = select_sonnet_schema(&root).unwrap();
        assert_eq!(schema.name(), "flat");
        let numbers: Vec<String> = extract_sonnets(schema, &root)
            .into_iter()
            .map(|s| s.number)
            .collect();
        assert_eq!(numbers, ["1", "2"]);
    }

    #[test]
    fn no_schema_without_sonnets() {
        let root = parse("<PLAY><TITLE>Macbeth</TITLE></PLAY>").unwrap();
        assert!(select_sonnet_schema(&root).is_none());
    }
}
