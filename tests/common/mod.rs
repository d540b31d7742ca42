//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const S_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Write a zip package from `(part name, contents)` pairs.
pub fn write_package(path: &Path, parts: &[(&str, String)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, contents) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn relationships(targets: &[&str]) -> String {
    let rels: String = targets
        .iter()
        .enumerate()
        .map(|(i, target)| {
            format!(
                r#"<Relationship Id="rId{}" Type="{}/part" Target="{}"/>"#,
                i + 1,
                R_NS,
                target
            )
        })
        .collect();
    format!(r#"<Relationships xmlns="{}">{}</Relationships>"#, REL_NS, rels)
}

/// A .docx with one body paragraph per entry.
pub fn docx(dir: &Path, name: &str, paragraphs: &[&str]) -> PathBuf {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", escape(p)))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        W_NS, body
    );
    let path = dir.join(name);
    write_package(&path, &[("word/document.xml", document)]);
    path
}

/// A .xlsx with one sheet per `(name, rows)` entry, all cells inline strings.
pub fn xlsx(dir: &Path, name: &str, sheets: &[(&str, Vec<Vec<&str>>)]) -> PathBuf {
    let sheet_refs: String = sheets
        .iter()
        .enumerate()
        .map(|(i, (sheet_name, _))| {
            format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(sheet_name),
                i + 1,
                i + 1
            )
        })
        .collect();
    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{}" xmlns:r="{}"><sheets>{}</sheets></workbook>"#,
        S_NS, R_NS, sheet_refs
    );

    let targets: Vec<String> = (1..=sheets.len())
        .map(|i| format!("worksheets/sheet{}.xml", i))
        .collect();
    let target_refs: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();

    let mut parts = vec![
        ("xl/workbook.xml".to_string(), workbook),
        ("xl/_rels/workbook.xml.rels".to_string(), relationships(&target_refs)),
    ];
    for (i, (_, rows)) in sheets.iter().enumerate() {
        let rows_xml: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|value| {
                        format!(r#"<c t="inlineStr"><is><t>{}</t></is></c>"#, escape(value))
                    })
                    .collect();
                format!("<row>{}</row>", cells)
            })
            .collect();
        let sheet = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{}"><sheetData>{}</sheetData></worksheet>"#,
            S_NS, rows_xml
        );
        parts.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet));
    }

    let path = dir.join(name);
    let borrowed: Vec<(&str, String)> = parts
        .iter()
        .map(|(name, xml)| (name.as_str(), xml.clone()))
        .collect();
    write_package(&path, &borrowed);
    path
}

/// A .pptx with one slide per entry, one text shape per string.
pub fn pptx(dir: &Path, name: &str, slides: &[Vec<&str>]) -> PathBuf {
    let ids: String = (1..=slides.len())
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i))
        .collect();
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><p:presentation xmlns:p="{}" xmlns:r="{}"><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
        P_NS, R_NS, ids
    );

    let targets: Vec<String> = (1..=slides.len())
        .map(|i| format!("slides/slide{}.xml", i))
        .collect();
    let target_refs: Vec<&str> = targets.iter().map(|t| t.as_str()).collect();

    let mut parts = vec![
        ("ppt/presentation.xml".to_string(), presentation),
        ("ppt/_rels/presentation.xml.rels".to_string(), relationships(&target_refs)),
    ];
    for (i, shapes) in slides.iter().enumerate() {
        let shapes_xml: String = shapes
            .iter()
            .map(|text| {
                format!(
                    "<p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>",
                    escape(text)
                )
            })
            .collect();
        let slide = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><p:sld xmlns:a="{}" xmlns:p="{}"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            A_NS, P_NS, shapes_xml
        );
        parts.push((format!("ppt/slides/slide{}.xml", i + 1), slide));
    }

    let path = dir.join(name);
    let borrowed: Vec<(&str, String)> = parts
        .iter()
        .map(|(name, xml)| (name.as_str(), xml.clone()))
        .collect();
    write_package(&path, &borrowed);
    path
}

/// A small RGB PNG.
pub fn png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save_with_format(&path, image::ImageFormat::Png).unwrap();
    path
}
