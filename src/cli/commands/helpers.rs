//! Shared helper functions for CLI commands.

use std::io::Read;

use serde::Serialize;

use crate::models::DocumentKind;

/// Parse a `--kind` value.
pub fn parse_kind(name: &str) -> anyhow::Result<DocumentKind> {
    DocumentKind::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = DocumentKind::ALL.iter().map(|k| k.as_str()).collect();
        anyhow::anyhow!("Unknown document kind '{}' (expected one of: {})", name, known.join(", "))
    })
}

/// Read all of stdin as text.
pub fn read_stdin() -> anyhow::Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Truncate a string to at most `max` characters, adding "..." when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
