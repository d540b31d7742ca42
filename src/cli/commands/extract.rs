//! Document extraction command.

use std::path::PathBuf;
use std::sync::Arc;

use console::style;

use super::helpers::{parse_kind, print_json};
use crate::models::{DocumentMetadata, ExtractedDocument, ExtractionDetail};
use crate::services::DocumentAnalyzer;

/// Extract a document and print its text and metadata.
pub async fn cmd_extract(
    analyzer: &Arc<DocumentAnalyzer>,
    file: PathBuf,
    kind: Option<&str>,
    full: bool,
    json: bool,
) -> anyhow::Result<()> {
    let kind = kind.map(parse_kind).transpose()?;
    let detail = if full {
        ExtractionDetail::Full
    } else {
        ExtractionDetail::Summary
    };

    let doc = analyzer.extract_async(file.clone(), kind, detail).await?;

    if json {
        return print_json(&doc);
    }

    println!(
        "{} {} ({}, {} words)",
        style("Extracted").green().bold(),
        file.display(),
        doc.kind,
        doc.word_count()
    );
    for line in metadata_lines(&doc) {
        println!("  {}", style(line).dim());
    }
    println!("{}", "-".repeat(50));
    if doc.has_text() {
        println!("{}", doc.text);
    } else {
        println!("{}", style("(no text)").dim());
    }
    Ok(())
}

fn metadata_lines(doc: &ExtractedDocument) -> Vec<String> {
    match &doc.metadata {
        DocumentMetadata::Pdf { page_count } => vec![format!("pages: {}", page_count)],
        DocumentMetadata::Word { paragraph_count } => {
            vec![format!("paragraphs: {}", paragraph_count)]
        }
        DocumentMetadata::Spreadsheet { sheets } => sheets
            .iter()
            .map(|s| format!("sheet '{}': {} rows x {} columns", s.name, s.rows, s.columns))
            .collect(),
        DocumentMetadata::Presentation { slide_count, .. } => {
            vec![format!("slides: {}", slide_count)]
        }
        DocumentMetadata::Image {
            format,
            color_mode,
            width,
            height,
            script,
        } => {
            let mut lines = vec![format!("{} {}x{} ({})", format, width, height, color_mode)];
            if let Some(detected) = script {
                lines.push(format!(
                    "script: {} ({:.2}), rotate {}°",
                    detected.script, detected.script_confidence, detected.rotate
                ));
            }
            lines
        }
    }
}
