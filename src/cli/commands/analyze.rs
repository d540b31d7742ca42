//! Text analysis commands (sentiment, summary, keywords).

use std::sync::Arc;

use console::style;

use super::helpers::{parse_kind, print_json, read_stdin, truncate};
use super::InputArgs;
use crate::config::Config;
use crate::models::{AnalysisParams, AnalysisRequest, AnalysisResult, Operation};
use crate::services::DocumentAnalyzer;

/// Parameters for an operation: command-line values over config defaults.
pub fn params_for(
    operation: Operation,
    config: &Config,
    max_length: Option<usize>,
    min_length: Option<usize>,
    top_n: Option<usize>,
) -> AnalysisParams {
    match operation {
        Operation::Sentiment => AnalysisParams::Sentiment,
        Operation::Summary => AnalysisParams::Summary {
            max_length: max_length.unwrap_or(config.analysis.max_length),
            min_length: min_length.unwrap_or(config.analysis.min_length),
        },
        Operation::Keywords => AnalysisParams::Keywords {
            top_n: top_n.unwrap_or(config.analysis.top_n),
        },
    }
}

/// Run one analysis over text, stdin or a document.
pub async fn cmd_analyze(
    analyzer: &Arc<DocumentAnalyzer>,
    input: InputArgs,
    params: AnalysisParams,
    json: bool,
) -> anyhow::Result<()> {
    let operation = params.operation();

    let result = if let Some(path) = input.file {
        let kind = input.kind.as_deref().map(parse_kind).transpose()?;
        analyzer.analyze_document_async(path, kind, params).await?
    } else {
        let text = match input.text {
            Some(text) => text,
            None if input.stdin => read_stdin()?,
            None => anyhow::bail!("Provide TEXT, --file or --stdin"),
        };
        analyzer
            .analyze_async(AnalysisRequest::new(text, params))
            .await?
    };

    if json {
        print_json(&result)?;
    } else {
        print_result(&result);
    }

    if let AnalysisResult::Failure { reason, .. } = &result {
        anyhow::bail!("{} analysis failed: {}", operation, reason);
    }
    Ok(())
}

fn print_result(result: &AnalysisResult) {
    match result {
        AnalysisResult::Sentiment { label, confidence } => {
            let label = match label.as_str() {
                "POSITIVE" => style(label.as_str()).green(),
                "NEGATIVE" => style(label.as_str()).red(),
                _ => style(label.as_str()).yellow(),
            };
            println!("{} {}", label.bold(), style(format!("({:.4})", confidence)).dim());
        }
        AnalysisResult::Summary {
            text,
            original_word_count,
            summary_word_count,
        } => {
            println!("{}", text);
            println!(
                "\n{}",
                style(format!(
                    "{} words -> {} words",
                    original_word_count, summary_word_count
                ))
                .dim()
            );
        }
        AnalysisResult::Keywords { entries } => {
            if entries.is_empty() {
                println!("{}", style("No keywords found").dim());
            }
            for entry in entries {
                println!("  {:<24} {}", truncate(&entry.word, 24), entry.count);
            }
        }
        AnalysisResult::Failure {
            operation,
            reason,
            fallback,
        } => {
            eprintln!(
                "{} {} analysis failed: {}",
                style("✗").red(),
                operation,
                reason
            );
            if let Some(fallback) = fallback {
                print_result(fallback);
            }
        }
    }
}
