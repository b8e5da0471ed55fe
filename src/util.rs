//! Decoding and archive path helpers shared by the extractors.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Decode bytes to a string.
///
/// UTF-8 is tried first (a BOM is removed). Invalid sequences are replaced,
/// unless the XML declaration names another encoding that encoding_rs knows,
/// in which case that encoding is used instead.
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
        && encoding != encoding_rs::UTF_8
    {
        let (decoded, _, _) = encoding.decode(bytes);
        return decoded;
    }

    result
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` in the first 100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = rest.iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Decode an XML or HTML document using its own declaration as the hint.
pub fn decode_document(bytes: &[u8]) -> Cow<'_, str> {
    decode_text(bytes, extract_xml_encoding(bytes))
}

// ============================================================================
// Archive paths
// ============================================================================

/// Directory part of an archive path (`"OEBPS/text/ch1.xhtml"` -> `"OEBPS/text"`).
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Last component of an archive path.
pub fn file_name(path: &str) -> &str {
    path.rfind('/').map(|i| &path[i + 1..]).unwrap_or(path)
}

/// File name without its extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

/// Normalize an archive path: `\` becomes `/`, `.` and empty segments are
/// dropped and `..` pops the previous segment.
pub fn normalize_archive_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Resolve an `href` found in a document located in `base_dir`.
///
/// The fragment is dropped, percent escapes are decoded and the result is
/// normalized. An href starting with `/` is taken relative to the archive root.
///
/// ```ignore
/// assert_eq!(resolve_href("OEBPS/text", "../Text/Cap%C3%ADtulo.xhtml#p1"), "OEBPS/Text/Capítulo.xhtml");
/// ```
pub fn resolve_href(base_dir: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href).trim();
    let decoded = percent_decode_str(href).decode_utf8_lossy();
    let decoded = decoded.replace('\\', "/");

    if let Some(absolute) = decoded.strip_prefix('/') {
        return normalize_archive_path(absolute);
    }
    if base_dir.is_empty() {
        return normalize_archive_path(&decoded);
    }
    normalize_archive_path(&format!("{}/{}", base_dir, decoded))
}

/// Whether an archive path names an HTML/XHTML content document.
pub fn is_html_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm") || lower.ends_with(".xhtml")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("Capítulo".as_bytes(), None), "Capítulo");
        // BOM is removed
        assert_eq!(decode_text(b"\xEF\xBB\xBFhi", None), "hi");
    }

    #[test]
    fn test_decode_invalid_utf8_is_replaced() {
        let decoded = decode_text(b"caf\xE9 au lait", None);
        assert_eq!(decoded, "caf\u{FFFD} au lait");
    }

    #[test]
    fn test_decode_uses_declared_encoding() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><p>caf\xE9</p>";
        let decoded = decode_document(bytes);
        assert!(decoded.contains("café"));
    }

    #[test]
    fn test_extract_xml_encoding() {
        assert_eq!(
            extract_xml_encoding(br#"<?xml version="1.0" encoding="ISO-8859-1"?>"#),
            Some("ISO-8859-1")
        );
        assert_eq!(
            extract_xml_encoding(b"<?xml version='1.0' encoding='utf-8'?>"),
            Some("utf-8")
        );
        assert_eq!(extract_xml_encoding(b"<html></html>"), None);
        assert_eq!(extract_xml_encoding(br#"<?xml encoding="#), None);
    }

    #[test]
    fn test_path_components() {
        assert_eq!(parent_dir("OEBPS/text/ch1.xhtml"), "OEBPS/text");
        assert_eq!(parent_dir("content.opf"), "");
        assert_eq!(file_name("OEBPS/text/ch1.xhtml"), "ch1.xhtml");
        assert_eq!(file_stem("OEBPS/text/0001_0000.html"), "0001_0000");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    #[test]
    fn test_normalize_archive_path() {
        assert_eq!(normalize_archive_path("OEBPS/./text/../images/a.png"), "OEBPS/images/a.png");
        assert_eq!(normalize_archive_path("OEBPS\\text\\ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(normalize_archive_path("../../a.html"), "a.html");
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(resolve_href("OEBPS", "text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve_href("OEBPS/toc", "../text/ch1.xhtml#sec2"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve_href("", "Cap%C3%ADtulo%201.xhtml"), "Capítulo 1.xhtml");
        assert_eq!(resolve_href("OEBPS", "/root.html"), "root.html");
        assert_eq!(resolve_href("OEBPS", "text\\ch2.xhtml"), "OEBPS/text/ch2.xhtml");
    }

    #[test]
    fn test_is_html_path() {
        assert!(is_html_path("a/b.XHTML"));
        assert!(is_html_path("index.htm"));
        assert!(!is_html_path("style.css"));
        assert!(!is_html_path("toc.ncx"));
    }
}
