//! In-memory EPUB and PDF fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use pdf_extract::content::{Content, Operation};
use pdf_extract::{Dictionary, Document, Object, Stream};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const OPF_PATH: &str = "OEBPS/content.opf";

/// Builds a small EPUB: container, OPF in `OEBPS/`, optional NCX.
#[derive(Default)]
pub struct EpubBuilder {
    title: String,
    /// (id, href relative to the OPF, content)
    items: Vec<(String, String, Vec<u8>)>,
    spine: Vec<String>,
    nav: Option<Vec<(String, String)>>,
    /// Manifest entries whose file is not in the archive.
    missing: Vec<(String, String)>,
    /// Files stored outside the manifest, by archive path.
    loose: Vec<(String, Vec<u8>)>,
    broken_ncx: bool,
}

impl EpubBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Add a manifest item with its content, without putting it in the spine.
    pub fn item(mut self, id: &str, href: &str, content: &str) -> Self {
        self.items
            .push((id.to_string(), href.to_string(), content.as_bytes().to_vec()));
        self
    }

    /// Add a content document to the manifest and the spine.
    pub fn chapter(self, id: &str, href: &str, content: &str) -> Self {
        let mut builder = self.item(id, href, content);
        builder.spine.push(id.to_string());
        builder
    }

    /// Declare a manifest item whose file is absent.
    pub fn missing(mut self, id: &str, href: &str) -> Self {
        self.missing.push((id.to_string(), href.to_string()));
        self
    }

    pub fn loose_file(mut self, path: &str, content: &str) -> Self {
        self.loose
            .push((path.to_string(), content.as_bytes().to_vec()));
        self
    }

    /// Navigation points as (label, src relative to the NCX).
    pub fn nav(mut self, points: &[(&str, &str)]) -> Self {
        self.nav = Some(
            points
                .iter()
                .map(|(label, src)| (label.to_string(), src.to_string()))
                .collect(),
        );
        self
    }

    pub fn broken_ncx(mut self) -> Self {
        self.broken_ncx = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut add = |name: &str, data: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        add("mimetype", b"application/epub+zip");
        add(
            "META-INF/container.xml",
            br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        );

        let mut manifest = String::new();
        for (id, href, _) in &self.items {
            manifest.push_str(&format!(
                "    <item id=\"{id}\" href=\"{href}\" media-type=\"application/xhtml+xml\"/>\n"
            ));
        }
        for (id, href) in &self.missing {
            manifest.push_str(&format!(
                "    <item id=\"{id}\" href=\"{href}\" media-type=\"application/xhtml+xml\"/>\n"
            ));
        }
        if self.nav.is_some() {
            manifest.push_str(
                "    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n",
            );
        }
        let spine: String = self
            .spine
            .iter()
            .map(|id| format!("    <itemref idref=\"{id}\"/>\n"))
            .collect();

        let opf = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>{}</dc:title>
    <dc:creator>Test Author</dc:creator>
    <dc:language>es</dc:language>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>"#,
            self.title
        );
        add(OPF_PATH, opf.as_bytes());

        if let Some(points) = &self.nav {
            let ncx = if self.broken_ncx {
                "<ncx><navMap><navPoint></navMap></ncx>".to_string()
            } else {
                ncx(points)
            };
            add("OEBPS/toc.ncx", ncx.as_bytes());
        }

        for (_, href, content) in &self.items {
            add(&format!("OEBPS/{href}"), content);
        }
        for (path, content) in &self.loose {
            add(path, content);
        }

        drop(add);
        zip.finish().unwrap().into_inner()
    }

    /// Build and write to `dir/name`.
    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn ncx(points: &[(String, String)]) -> String {
    let mut nav = String::new();
    for (i, (label, src)) in points.iter().enumerate() {
        nav.push_str(&format!(
            "    <navPoint id=\"np{i}\" playOrder=\"{}\">\n      <navLabel><text>{label}</text></navLabel>\n      <content src=\"{src}\"/>\n    </navPoint>\n",
            i + 1
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head/>
  <docTitle><text>Test</text></docTitle>
  <navMap>
{nav}  </navMap>
</ncx>"#
    )
}

/// Minimal XHTML document with `body` as its body markup.
pub fn xhtml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>t</title></head>
<body>{body}</body></html>"#
    )
}

/// Builds a PDF with one Courier text line per input line.
#[derive(Default)]
pub struct PdfBuilder {
    /// (lines, has a MediaBox)
    pages: Vec<(Vec<String>, bool)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, text: &str) -> Self {
        self.pages.push((text.lines().map(String::from).collect(), true));
        self
    }

    /// A page without a MediaBox, which pdf-extract cannot lay out.
    pub fn broken_page(mut self, text: &str) -> Self {
        self.pages.push((text.lines().map(String::from).collect(), false));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut font = Dictionary::new();
        font.set("Type", "Font");
        font.set("Subtype", "Type1");
        font.set("BaseFont", "Courier");
        let font_id = doc.add_object(font);
        let mut fonts = Dictionary::new();
        fonts.set("F1", font_id);
        let mut resources = Dictionary::new();
        resources.set("Font", fonts);
        let resources_id = doc.add_object(resources);

        let mut kids: Vec<Object> = Vec::new();
        for (lines, has_media_box) in &self.pages {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
            ];
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    operations.push(Operation::new("Td", vec![0.into(), (-24).into()]));
                }
                operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
            }
            operations.push(Operation::new("ET", vec![]));
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

            let mut page = Dictionary::new();
            page.set("Type", "Page");
            page.set("Parent", pages_id);
            page.set("Contents", content_id);
            if *has_media_box {
                page.set(
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 595.into(), 842.into()]),
                );
            }
            kids.push(doc.add_object(page).into());
        }

        let mut pages = Dictionary::new();
        pages.set("Type", "Pages");
        pages.set("Count", kids.len() as i64);
        pages.set("Kids", kids);
        pages.set("Resources", resources_id);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", "Catalog");
        catalog.set("Pages", pages_id);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// Build and write to `dir/name`.
    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}
