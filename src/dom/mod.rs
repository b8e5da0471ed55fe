//! HTML parsing into an arena DOM.

mod arena;
mod tree_sink;

pub use arena::{ArenaDom, Attribute, Children, Descendants, Node, NodeData, NodeId};
pub use tree_sink::ArenaSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::util::decode_document;

/// Decode and parse an HTML or XHTML document.
///
/// Bytes are decoded with [`decode_document`]; the tree sink drops soft
/// hyphens from text nodes. Parsing is lenient and never fails.
pub fn parse_html(bytes: &[u8]) -> ArenaDom {
    parse_document(ArenaSink::new(), ParseOpts::default())
        .one(decode_document(bytes).into_owned())
        .into_dom()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_soft_hyphens() {
        let dom = parse_html("<p>ex\u{00AD}am\u{00AD}ple</p>".as_bytes());
        let p = dom.find_by_tag("p").expect("p");
        assert_eq!(dom.text_content(p), "example");
    }

    #[test]
    fn test_parse_declared_encoding() {
        let dom = parse_html(b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><html><body><p>Cap\xEDtulo</p></body></html>");
        let p = dom.find_by_tag("p").expect("p");
        assert_eq!(dom.text_content(p), "Capítulo");
    }

    #[test]
    fn test_parse_decodes_entities() {
        let dom = parse_html(b"<p>Tom &amp; Jerry&nbsp;&eacute;</p>");
        let p = dom.find_by_tag("p").expect("p");
        assert_eq!(dom.text_content(p), "Tom & Jerry\u{a0}é");
    }
}
