//! Tool and backend availability check.

use std::sync::Arc;

use console::style;
use serde::Serialize;

use super::helpers::print_json;
use crate::backend::BackendKind;
use crate::config::Config;
use crate::extract::ExtractionEngine;
use crate::ocr::{OcrEngine, TesseractEngine};
use crate::services::DocumentAnalyzer;

#[derive(Serialize)]
struct ToolStatus {
    name: String,
    available: bool,
}

#[derive(Serialize)]
struct BackendReport {
    kind: BackendKind,
    engine: String,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct CheckReport {
    tools: Vec<ToolStatus>,
    ocr_language: String,
    backends: Vec<BackendReport>,
}

/// Check extraction tools and try to construct each analysis backend.
pub async fn cmd_check(
    analyzer: &Arc<DocumentAnalyzer>,
    config: &Config,
    json: bool,
) -> anyhow::Result<()> {
    let tools: Vec<ToolStatus> = ExtractionEngine::check_tools()
        .into_iter()
        .map(|(name, available)| ToolStatus { name, available })
        .collect();

    let mut backends = Vec::new();
    for kind in BackendKind::ALL {
        let manager = Arc::clone(analyzer.backends());
        let built = tokio::task::spawn_blocking(move || manager.get(kind)).await?;
        let engine = config.backends.get(kind).engine_for(kind).as_str().to_string();
        backends.push(match built {
            Ok(handle) => BackendReport {
                kind,
                engine,
                ready: true,
                backend: Some(handle.backend_id().to_string()),
                error: None,
            },
            Err(e) => BackendReport {
                kind,
                engine,
                ready: false,
                backend: None,
                error: Some(e.to_string()),
            },
        });
    }

    let report = CheckReport {
        tools,
        ocr_language: config.extraction.ocr_language.clone(),
        backends,
    };

    if json {
        return print_json(&report);
    }

    println!("\n{}", style("Extraction Tools").bold());
    println!("{}", "-".repeat(50));
    for tool in &report.tools {
        let status = if tool.available {
            style("✓ found").green()
        } else {
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool.name, status);
    }

    let tesseract = TesseractEngine::new().with_language(&report.ocr_language);
    println!(
        "  {:<15} {}",
        "",
        style(tesseract.availability_hint()).dim()
    );

    println!("\n{}", style("Analysis Backends").bold());
    println!("{}", "-".repeat(50));
    for backend in &report.backends {
        let status = if backend.ready {
            style(format!(
                "✓ ready ({})",
                backend.backend.as_deref().unwrap_or(&backend.engine)
            ))
            .green()
        } else {
            style("✗ unavailable".to_string()).red()
        };
        println!("  {:<15} {}", backend.kind.as_str(), status);
        if let Some(error) = &backend.error {
            println!("                  {}", style(error).dim());
        }
    }

    let missing = report.tools.iter().filter(|t| !t.available).count();
    if missing > 0 {
        println!(
            "\n{}",
            style("Some tools are missing; PDF or image extraction will fail without them.")
                .yellow()
        );
    }
    Ok(())
}
