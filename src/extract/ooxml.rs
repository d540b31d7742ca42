//! Shared helpers for Office Open XML packages (docx, xlsx, pptx).
//!
//! An OOXML file is a zip archive of XML parts linked by relationship
//! (`.rels`) parts.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::ExtractionError;
use crate::models::DocumentKind;

/// An opened OOXML package.
pub(crate) struct OoxmlPackage {
    archive: ZipArchive<File>,
    kind: DocumentKind,
}

impl OoxmlPackage {
    pub fn open(path: &Path, kind: DocumentKind) -> Result<Self, ExtractionError> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file).map_err(|e| match e {
            ZipError::Io(io) => ExtractionError::Io(io),
            other => ExtractionError::corrupt(kind, format!("not a valid OOXML package: {}", other)),
        })?;
        Ok(Self { archive, kind })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Read a part that must be present.
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>, ExtractionError> {
        self.read_optional_part(name)?
            .ok_or_else(|| ExtractionError::corrupt(self.kind, format!("missing part {}", name)))
    }

    /// Read a part that may be absent.
    pub fn read_optional_part(&mut self, name: &str) -> Result<Option<Vec<u8>>, ExtractionError> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(ExtractionError::corrupt(
                    self.kind,
                    format!("unreadable part {}: {}", name, e),
                ))
            }
        };
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| ExtractionError::corrupt(self.kind, format!("{}: {}", name, e)))?;
        Ok(Some(buf))
    }

    /// Relationships of a part, as relationship id -> resolved part name.
    ///
    /// External targets are skipped. A part without a `.rels` part has no
    /// relationships.
    pub fn relationships(&mut self, part: &str) -> Result<HashMap<String, String>, ExtractionError> {
        let rels_name = rels_part_name(part);
        let Some(xml) = self.read_optional_part(&rels_name)? else {
            return Ok(HashMap::new());
        };

        let mut rels = HashMap::new();
        let mut reader = Reader::from_reader(xml.as_slice());
        loop {
            match reader.read_event().map_err(|e| self.xml_error(&rels_name, e))? {
                Event::Start(e) | Event::Empty(e) if element_name(&e) == b"Relationship" => {
                    if attribute(&e, b"TargetMode").as_deref() == Some("External") {
                        continue;
                    }
                    if let (Some(id), Some(target)) =
                        (attribute(&e, b"Id"), attribute(&e, b"Target"))
                    {
                        rels.insert(id, resolve_target(part, &target));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(rels)
    }

    /// Wrap an XML parse error for `part` as a corrupt-document error.
    pub fn xml_error(&self, part: &str, err: quick_xml::Error) -> ExtractionError {
        ExtractionError::corrupt(self.kind, format!("malformed XML in {}: {}", part, err))
    }
}

/// Name of the relationships part for `part` (`xl/workbook.xml` ->
/// `xl/_rels/workbook.xml.rels`).
fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Strip a namespace prefix (`w:p` -> `p`).
pub(crate) fn local_name(qualified: &[u8]) -> &[u8] {
    match qualified.iter().position(|&b| b == b':') {
        Some(idx) => &qualified[idx + 1..],
        None => qualified,
    }
}

/// Local name of an element.
pub(crate) fn element_name<'a>(e: &'a BytesStart<'_>) -> &'a [u8] {
    local_name(e.name().into_inner())
}

/// Value of an unprefixed attribute.
pub(crate) fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| decode_value(&a))
}

/// Value of a namespace-prefixed attribute, matched by local name
/// (`r:id` matches `b"id"`, plain `id` does not).
pub(crate) fn prefixed_attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| {
            let key = a.key.as_ref();
            key.contains(&b':') && local_name(key) == local
        })
        .map(|a| decode_value(&a))
}

fn decode_value(attr: &quick_xml::events::attributes::Attribute<'_>) -> String {
    attr.unescape_value()
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_part_name() {
        assert_eq!(rels_part_name("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(rels_part_name("document.xml"), "_rels/document.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide2.xml"),
            "ppt/slides/slide2.xml"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../media/image1.png"),
            "ppt/media/image1.png"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/worksheets/sheet3.xml"),
            "xl/worksheets/sheet3.xml"
        );
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"w:p"), b"p");
        assert_eq!(local_name(b"row"), b"row");
    }

    #[test]
    fn test_attributes() {
        let mut reader =
            Reader::from_reader(&br#"<p:sldId id="256" r:id="rId2" name="A &amp; B"/>"#[..]);
        match reader.read_event().unwrap() {
            Event::Empty(e) => {
                assert_eq!(attribute(&e, b"id").as_deref(), Some("256"));
                assert_eq!(prefixed_attribute(&e, b"id").as_deref(), Some("rId2"));
                assert_eq!(attribute(&e, b"name").as_deref(), Some("A & B"));
                assert_eq!(attribute(&e, b"missing"), None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}

/// Test helper: write an OOXML package from `(part name, contents)` pairs.
#[cfg(test)]
pub(crate) fn write_package(path: &Path, parts: &[(&str, &str)]) {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, contents) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}
