//! EPUB package parsing (container.xml, OPF, NCX).

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::archive::EpubArchive;
use crate::error::{Error, Result};
use crate::model::Metadata;
use crate::util::{decode_document, normalize_archive_path, parent_dir, resolve_href};

pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

/// One `manifest/item` of the OPF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,
    /// Archive path, resolved against the OPF directory.
    pub href: String,
    pub media_type: String,
}

/// The parsed package of one EPUB. A new value is produced for every parse.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub opf_path: String,
    /// Archive path of the NCX, if the package declares one.
    pub ncx_path: Option<String>,
    /// Manifest items in document order, ids unique.
    pub manifest: Vec<ManifestEntry>,
    /// Spine idrefs in reading order. Only ids present in the manifest are
    /// kept; repeated ids are kept.
    pub spine: Vec<String>,
    pub metadata: Metadata,
}

impl Package {
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestEntry> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Manifest items of the spine, in reading order.
    pub fn spine_items(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.spine.iter().filter_map(|id| self.manifest_item(id))
    }
}

/// One navPoint of the NCX.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    /// Label text, possibly empty.
    pub label: String,
    /// Target archive path with the fragment removed.
    pub target: String,
}

/// Read the container and OPF of an opened archive.
pub fn parse_package(archive: &mut EpubArchive) -> Result<Package> {
    let container = archive
        .read(CONTAINER_PATH)
        .map_err(|e| Error::Container(format!("{CONTAINER_PATH}: {e}")))?;
    let opf_path = normalize_archive_path(&parse_container_xml(&container)?);

    let opf = archive
        .read(&opf_path)
        .map_err(|e| Error::Package(format!("{opf_path}: {e}")))?;
    parse_opf(&decode_document(&opf), &opf_path)
}

/// Read and flatten the NCX of a package.
///
/// Returns an empty list when the package declares no NCX.
pub fn read_navigation(archive: &mut EpubArchive, package: &Package) -> Result<Vec<NavPoint>> {
    let Some(ncx_path) = &package.ncx_path else {
        return Ok(Vec::new());
    };
    let bytes = archive
        .read(ncx_path)
        .map_err(|e| Error::Navigation(format!("{ncx_path}: {e}")))?;
    parse_ncx(&decode_document(&bytes), ncx_path)
}

/// Parse `META-INF/container.xml` and return the first rootfile path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = decode_document(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"rootfile" =>
            {
                if let Some(path) = attribute(&e, b"full-path")
                    && !path.trim().is_empty()
                {
                    return Ok(path.trim().to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Container(e.to_string())),
            _ => {}
        }
    }

    Err(Error::Container("no rootfile found in container.xml".into()))
}

/// Parse an OPF package document located at `opf_path`.
pub fn parse_opf(content: &str, opf_path: &str) -> Result<Package> {
    let opf_dir = parent_dir(opf_path);
    let mut reader = Reader::from_str(content);

    let mut package = Package {
        opf_path: opf_path.to_string(),
        ..Package::default()
    };
    let mut spine_ids: Vec<String> = Vec::new();
    let mut toc_id: Option<String> = None;

    let mut title = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut language = String::new();

    let mut in_metadata = false;
    let mut current_element: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::Package(format!("{opf_path}: {e}")))?;

        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_start = matches!(event, Event::Start(_));
                match local_name(e.name().as_ref()) {
                    b"metadata" if is_start => in_metadata = true,
                    b"title" if in_metadata && is_start => current_element = Some("title"),
                    b"creator" if in_metadata && is_start => current_element = Some("creator"),
                    b"language" if in_metadata && is_start => current_element = Some("language"),
                    b"item" => {
                        let id = attribute(e, b"id").unwrap_or_default();
                        let href = attribute(e, b"href").unwrap_or_default();
                        if id.is_empty() || href.is_empty() {
                            continue;
                        }
                        if package.manifest_item(&id).is_some() {
                            log::debug!("{opf_path}: duplicate manifest id {id}");
                            continue;
                        }
                        package.manifest.push(ManifestEntry {
                            id,
                            href: resolve_href(opf_dir, &href),
                            media_type: attribute(e, b"media-type")
                                .unwrap_or_default()
                                .trim()
                                .to_string(),
                        });
                    }
                    b"spine" => toc_id = attribute(e, b"toc"),
                    b"itemref" => {
                        if let Some(idref) = attribute(e, b"idref") {
                            spine_ids.push(idref);
                        }
                    }
                    _ => {}
                }
                if current_element.is_some() && is_start {
                    buf_text.clear();
                }
            }
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    buf_text.push_str(&resolved);
                }
            }
            Event::End(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if local == b"metadata" {
                    in_metadata = false;
                }
                if let Some(elem) = current_element
                    && local == elem.as_bytes()
                {
                    let value = buf_text.trim().to_string();
                    match elem {
                        "title" if title.is_empty() => title = value,
                        "creator" if !value.is_empty() => authors.push(value),
                        "language" if language.is_empty() => language = value,
                        _ => {}
                    }
                    current_element = None;
                    buf_text.clear();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    package.metadata = authors
        .into_iter()
        .fold(Metadata::new(title).with_language(language), Metadata::with_author);

    for id in spine_ids {
        if package.manifest_item(&id).is_some() {
            package.spine.push(id);
        } else {
            log::debug!("{opf_path}: spine references unknown id {id}");
        }
    }

    package.ncx_path = package
        .manifest
        .iter()
        .find(|item| item.media_type.eq_ignore_ascii_case(NCX_MEDIA_TYPE))
        .or_else(|| toc_id.as_deref().and_then(|id| package.manifest_item(id)))
        .map(|item| item.href.clone());

    Ok(package)
}

/// Parse an NCX located at `ncx_path` and flatten its navMap.
///
/// navPoints are returned in document order (parents before children).
/// Points without a `content/@src` are skipped; a missing label is kept as
/// an empty string.
pub fn parse_ncx(content: &str, ncx_path: &str) -> Result<Vec<NavPoint>> {
    let ncx_dir = parent_dir(ncx_path);
    let mut reader = Reader::from_str(content);

    // Flattened points under construction, and the indices of the open ones.
    let mut points: Vec<(String, Option<String>)> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut in_label = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::Navigation(format!("{ncx_path}: {e}")))?;

        match &event {
            Event::Start(e) | Event::Empty(e) => {
                let is_start = matches!(event, Event::Start(_));
                match local_name(e.name().as_ref()) {
                    b"navPoint" if is_start => {
                        open.push(points.len());
                        points.push((String::new(), None));
                    }
                    b"navLabel" if is_start => in_label = true,
                    b"text" if is_start => in_text = true,
                    b"content" => {
                        if let Some(&index) = open.last()
                            && points[index].1.is_none()
                            && let Some(src) = attribute(e, b"src")
                        {
                            points[index].1 = Some(resolve_href(ncx_dir, &src));
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                if in_label
                    && in_text
                    && let Some(&index) = open.last()
                {
                    points[index].0.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if in_label
                    && in_text
                    && let Some(&index) = open.last()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    points[index].0.push_str(&resolved);
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"navPoint" => {
                    open.pop();
                }
                b"navLabel" => in_label = false,
                b"text" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(points
        .into_iter()
        .filter_map(|(label, target)| {
            let target = target.filter(|t| !t.is_empty())?;
            Some(NavPoint {
                label: label.trim().to_string(),
                target,
            })
        })
        .collect())
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Value of an attribute, with XML escapes resolved.
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == name)
        .map(|attr| {
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            match quick_xml::escape::unescape(&raw) {
                Ok(Cow::Owned(unescaped)) => unescaped,
                _ => raw,
            }
        })
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Resolve XML entity references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        "nbsp" => return Some("\u{a0}".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#').and_then(|dec| dec.parse().ok())
    };
    code.and_then(char::from_u32).map(String::from)
}
