use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static NAMED_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9._-]*);").expect("valid entity pattern"));

// Left for the XML reader to unescape.
const PREDEFINED: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

const KNOWN: &[(&str, &str)] = &[
    ("aelig", "æ"),
    ("AElig", "Æ"),
    ("oelig", "œ"),
    ("OElig", "Œ"),
    ("lsquo", "‘"),
    ("rsquo", "’"),
    ("ldquo", "“"),
    ("rdquo", "”"),
    ("mdash", "—"),
    ("ndash", "–"),
    ("hellip", "…"),
    ("nbsp", "\u{a0}"),
    ("eacute", "é"),
    ("egrave", "è"),
    ("agrave", "à"),
    ("acirc", "â"),
    ("ecirc", "ê"),
    ("ccedil", "ç"),
    ("uuml", "ü"),
    ("ouml", "ö"),
    ("pound", "£"),
    ("sect", "§"),
];

/// Clean raw markup before it reaches the XML reader.
///
/// Known named references become their literal characters, the XML-predefined
/// ones and numeric references are kept, and every other named reference is
/// dropped. Dropping a reference can splice a new one together (`&x&bad;;`),
/// so substitution repeats until nothing changes. Leading byte-order marks are
/// removed and line endings are folded to `\n`. Running this twice gives the
/// same result as running it once.
pub fn normalize(raw: &str) -> String {
    let mut text = if raw.contains('\r') {
        raw.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        raw.to_string()
    };

    loop {
        let next = NAMED_REF.replace_all(&text, expand);
        if next == text.as_str() {
            break;
        }
        text = next.into_owned();
    }

    text.trim_start_matches('\u{feff}').to_string()
}

fn expand(caps: &Captures<'_>) -> String {
    let name = &caps[1];
    if PREDEFINED.contains(&name) {
        return caps[0].to_string();
    }
    KNOWN
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, literal)| (*literal).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_and_strips_unknown() {
        let out = normalize("Ha&mdash;ha &ldquo;C&aelig;sar&rdquo; &foo; &c.");
        assert_eq!(out, "Ha—ha “Cæsar”  &c.");
    }

    #[test]
    fn keeps_predefined_and_numeric_references() {
        let raw = "a &amp; b &lt;c&gt; &#8212; &#x2014; &amp;mdash;";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn folds_line_endings_and_bom() {
        assert_eq!(normalize("\u{feff}<a>\r\nb\rc</a>"), "<a>\nb\nc</a>");
    }

    #[test]
    fn is_idempotent() {
        let raw = "\u{feff}O&rsquo;er &unknown; &amp;amp; &mdash;\r\nthe&nbsp;sea";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn spliced_references_are_stripped_in_one_call() {
        let once = normalize("Ha &x&unknown;; ho");
        assert_eq!(once, "Ha  ho");
        assert_eq!(normalize(&once), once);

        let once = normalize("&a&b&c;;; &amp&zz;; &m&bogus;dash;");
        assert_eq!(once, " &amp; —");
        assert_eq!(normalize(&once), once);

        let once = normalize("\u{feff}&x;\u{feff}<a/>");
        assert_eq!(once, "<a/>");
        assert_eq!(normalize(&once), once);
    }
}
