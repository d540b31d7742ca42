//! Presentation (.pptx) extraction.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::ooxml::{element_name, local_name, prefixed_attribute, OoxmlPackage};
use super::{ExtractionError, FormatExtractor};
use crate::models::{DocumentKind, DocumentMetadata, ExtractedDocument, ExtractionDetail};

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Extracts slide text in presentation order.
pub struct PresentationExtractor;

impl FormatExtractor for PresentationExtractor {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Presentation
    }

    fn extract(
        &self,
        path: &Path,
        _detail: ExtractionDetail,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let kind = DocumentKind::Presentation;
        let mut package = OoxmlPackage::open(path, kind)?;

        let xml = package.read_part(PRESENTATION_PART)?;
        let slide_ids = slide_rel_ids(&xml).map_err(|e| package.xml_error(PRESENTATION_PART, e))?;
        let rels = package.relationships(PRESENTATION_PART)?;

        let mut slides = Vec::with_capacity(slide_ids.len());
        for rel_id in slide_ids {
            let part = rels.get(&rel_id).ok_or_else(|| {
                ExtractionError::corrupt(kind, format!("slide relationship {} not found", rel_id))
            })?;
            let slide_xml = package.read_part(part)?;
            let shapes = shape_texts(&slide_xml).map_err(|e| package.xml_error(part, e))?;
            slides.push(shapes.join("\n"));
        }
        tracing::debug!("Read {} slides from {}", slides.len(), path.display());

        Ok(ExtractedDocument::new(
            slides.join("\n"),
            DocumentMetadata::Presentation {
                slide_count: slides.len(),
                slides,
            },
        ))
    }
}

/// Relationship ids from `p:sldIdLst`, in presentation order.
fn slide_rel_ids(xml: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if element_name(&e) == b"sldId" => {
                ids.extend(prefixed_attribute(&e, b"id"));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

/// Text of each top-level `p:sp` shape on a slide.
///
/// A shape's text is its `a:p` paragraphs joined by newlines; shapes
/// without a text body contribute an empty string. Group members and
/// non-shape elements (pictures, tables) are skipped.
fn shape_texts(xml: &[u8]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shapes = Vec::new();
    let mut paragraphs: Option<Vec<String>> = None;
    let mut paragraph: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(e.name().into_inner()).to_vec();
                let parent = stack.last().map(Vec::as_slice);
                if name == b"sp" && parent == Some(b"spTree".as_slice()) {
                    paragraphs = Some(Vec::new());
                } else if name == b"p" && parent == Some(b"txBody".as_slice()) && paragraphs.is_some() {
                    paragraph = Some(String::new());
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                let parent = stack.last().map(Vec::as_slice);
                if name == b"sp" && parent == Some(b"spTree".as_slice()) {
                    shapes.push(String::new());
                } else if name == b"p" && parent == Some(b"txBody".as_slice()) {
                    if let Some(paras) = paragraphs.as_mut() {
                        paras.push(String::new());
                    }
                } else if name == b"br" {
                    if let Some(text) = paragraph.as_mut() {
                        text.push('\n');
                    }
                }
            }
            Event::Text(e) => {
                if let Some(text) = paragraph.as_mut() {
                    if stack.last().is_some_and(|top| top == b"t") {
                        text.push_str(&e.unescape()?);
                    }
                }
            }
            Event::End(_) => {
                let closed = stack.pop();
                let parent = stack.last().map(Vec::as_slice);
                match closed.as_deref() {
                    Some(b"p") if parent == Some(b"txBody".as_slice()) => {
                        if let (Some(paras), Some(text)) = (paragraphs.as_mut(), paragraph.take()) {
                            paras.push(text);
                        }
                    }
                    Some(b"sp") if parent == Some(b"spTree".as_slice()) => {
                        if let Some(paras) = paragraphs.take() {
                            shapes.push(paras.join("\n"));
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ooxml::write_package;

    const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
                xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
  <p:sldIdLst>
    <p:sldId id="257" r:id="rId3"/>
    <p:sldId id="256" r:id="rId2"/>
  </p:sldIdLst>
</p:presentation>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
</Relationships>"#;

    fn slide(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree><p:nvGrpSpPr/><p:grpSpPr/>{}</p:spTree></p:cSld>
</p:sld>"#,
            shapes
        )
    }

    fn text_shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Text\"/></p:nvSpPr><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>",
            body
        )
    }

    #[test]
    fn test_shape_texts() {
        let xml = slide(&format!(
            "{}{}<p:sp><p:nvSpPr/><p:spPr/></p:sp><p:grpSp>{}</p:grpSp><p:pic/>",
            text_shape(&["Title"]),
            text_shape(&["Line one", "Line two"]),
            text_shape(&["grouped"])
        ));
        let shapes = shape_texts(xml.as_bytes()).unwrap();
        assert_eq!(shapes, vec!["Title", "Line one\nLine two", ""]);
    }

    #[test]
    fn test_runs_and_breaks_in_a_paragraph() {
        let xml = slide(
            "<p:sp><p:txBody><a:p><a:r><a:t>Q3 </a:t></a:r><a:r><a:t>results</a:t></a:r>\
             <a:br/><a:r><a:t>&lt;draft&gt;</a:t></a:r></a:p><a:p/></p:txBody></p:sp>",
        );
        let shapes = shape_texts(xml.as_bytes()).unwrap();
        assert_eq!(shapes, vec!["Q3 results\n<draft>\n"]);
    }

    #[test]
    fn test_extract_pptx_in_presentation_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        let slide1 = slide(&text_shape(&["Welcome"]));
        let slide2 = slide(&format!(
            "{}{}",
            text_shape(&["Agenda"]),
            text_shape(&["Budget", "Hiring"])
        ));
        write_package(
            &path,
            &[
                ("ppt/presentation.xml", PRESENTATION),
                ("ppt/_rels/presentation.xml.rels", RELS),
                ("ppt/slides/slide1.xml", &slide1),
                ("ppt/slides/slide2.xml", &slide2),
            ],
        );

        let doc = PresentationExtractor
            .extract(&path, ExtractionDetail::Summary)
            .unwrap();
        assert_eq!(doc.kind, DocumentKind::Presentation);
        // sldIdLst lists rId3 (slide2) first.
        assert_eq!(doc.text, "Agenda\nBudget\nHiring\nWelcome");
        assert_eq!(
            doc.metadata,
            DocumentMetadata::Presentation {
                slide_count: 2,
                slides: vec!["Agenda\nBudget\nHiring".to_string(), "Welcome".to_string()],
            }
        );
    }

    #[test]
    fn test_empty_presentation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pptx");
        write_package(
            &path,
            &[(
                "ppt/presentation.xml",
                r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#,
            )],
        );

        let doc = PresentationExtractor
            .extract(&path, ExtractionDetail::Summary)
            .unwrap();
        assert_eq!(doc.text, "");
        assert_eq!(
            doc.metadata,
            DocumentMetadata::Presentation {
                slide_count: 0,
                slides: vec![],
            }
        );
    }

    #[test]
    fn test_dangling_slide_relationship_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dangling.pptx");
        write_package(&path, &[("ppt/presentation.xml", PRESENTATION)]);

        let err = PresentationExtractor
            .extract(&path, ExtractionDetail::Summary)
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::CorruptDocument {
                kind: DocumentKind::Presentation,
                ..
            }
        ));
    }
}
