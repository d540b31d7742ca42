//! External command backend.
//!
//! Runs a user-configured program (typically a wrapper around a transformer
//! model) once per input. The text is written to the program's stdin and a
//! JSON answer is read from stdout:
//!
//! - sentiment: `{"label": "POSITIVE", "score": 0.98}`
//! - summary: `{"summary_text": "..."}`
//!
//! A one-element array of either shape is accepted too, matching what
//! model pipelines usually print. Arguments may contain `{max_length}` and
//! `{min_length}` placeholders.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use serde::Deserialize;

use super::{BackendError, BackendKind, SentimentBackend, SentimentScore, SummaryBackend};
use crate::utils::{command_stdout, ToolFailure};

/// A backend that shells out to an external program.
pub struct CommandBackend {
    kind: BackendKind,
    program: String,
    args: Vec<String>,
    max_input_chars: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn first(self) -> Option<T> {
        match self {
            OneOrMany::One(v) => Some(v),
            OneOrMany::Many(v) => v.into_iter().next(),
        }
    }
}

#[derive(Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

impl CommandBackend {
    /// Create a backend for `kind`, checking that `program` can be found.
    pub fn new(
        kind: BackendKind,
        program: &str,
        args: Vec<String>,
        max_input_chars: usize,
    ) -> Result<Self, BackendError> {
        let resolved = which::which(program).map_err(|e| BackendError::ConstructionFailed {
            kind,
            reason: format!("command '{}' not found: {}", program, e),
        })?;
        tracing::debug!("Using {} command {}", kind, resolved.display());

        Ok(Self {
            kind,
            program: program.to_string(),
            args,
            max_input_chars,
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    fn expand_args(&self, max_length: usize, min_length: usize) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{max_length}", &max_length.to_string())
                    .replace("{min_length}", &min_length.to_string())
            })
            .collect()
    }

    fn run(&self, args: &[String], input: &str) -> Result<String, BackendError> {
        let spawned = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let output = spawned.and_then(|mut child| {
            let stdin = child.stdin.take();
            std::thread::scope(|scope| -> io::Result<_> {
                // Stdin is fed from its own thread while stdout and stderr drain.
                let writer = stdin.map(|mut stdin| {
                    scope.spawn(move || stdin.write_all(input.as_bytes()))
                });
                let output = child.wait_with_output()?;
                let written = match writer {
                    Some(handle) => handle
                        .join()
                        .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked"))),
                    None => Ok(()),
                };
                match written {
                    // The program may exit without reading all of its input.
                    Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                    _ => Ok(output),
                }
            })
        });

        command_stdout(output).map_err(|failure| match failure {
            ToolFailure::NotFound => {
                BackendError::InferenceFailed(format!("command '{}' not found", self.program))
            }
            ToolFailure::Failed(msg) => {
                BackendError::InferenceFailed(format!("{} failed: {}", self.program, msg))
            }
            ToolFailure::Io(e) => BackendError::Io(e),
        })
    }
}

fn parse_json<T: for<'de> Deserialize<'de>>(stdout: &str) -> Result<T, BackendError> {
    serde_json::from_str::<OneOrMany<T>>(stdout.trim())
        .map_err(|e| BackendError::InvalidOutput(e.to_string()))?
        .first()
        .ok_or_else(|| BackendError::InvalidOutput("empty result list".to_string()))
}

impl SentimentBackend for CommandBackend {
    fn backend_id(&self) -> &str {
        &self.program
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn classify(&self, text: &str) -> Result<SentimentScore, BackendError> {
        let stdout = self.run(&self.args, text)?;
        let score: SentimentScore = parse_json(&stdout)?;
        if !(0.0..=1.0).contains(&score.score) {
            return Err(BackendError::InvalidOutput(format!(
                "score {} outside [0, 1]",
                score.score
            )));
        }
        Ok(score)
    }
}

impl SummaryBackend for CommandBackend {
    fn backend_id(&self) -> &str {
        &self.program
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn summarize(
        &self,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<String, BackendError> {
        let args = self.expand_args(max_length, min_length);
        let stdout = self.run(&args, text)?;
        let output: SummaryOutput = parse_json(&stdout)?;
        Ok(output.summary_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_fails_construction() {
        let err = match CommandBackend::new(
            BackendKind::Summary,
            "doclens-no-such-model",
            vec![],
            1024,
        ) {
            Ok(_) => panic!("construction should fail"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            BackendError::ConstructionFailed {
                kind: BackendKind::Summary,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_json_shapes() {
        let one: SentimentScore = parse_json(r#"{"label":"POSITIVE","score":0.9}"#).unwrap();
        assert_eq!(one.label, "POSITIVE");

        let many: SummaryOutput = parse_json(r#"[{"summary_text":"short"}]"#).unwrap();
        assert_eq!(many.summary_text, "short");

        assert!(matches!(
            parse_json::<SummaryOutput>("[]"),
            Err(BackendError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_json::<SummaryOutput>("not json"),
            Err(BackendError::InvalidOutput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_sentiment_via_shell() {
        let backend = CommandBackend::new(
            BackendKind::Sentiment,
            "sh",
            vec![
                "-c".to_string(),
                r#"cat >/dev/null; echo '[{"label":"NEGATIVE","score":0.75}]'"#.to_string(),
            ],
            512,
        )
        .unwrap();
        let score = backend.classify("meh").unwrap();
        assert_eq!(score.label, "NEGATIVE");
        assert_eq!(score.score, 0.75);
        assert_eq!(SentimentBackend::backend_id(&backend), "sh");
    }

    #[cfg(unix)]
    #[test]
    fn test_summary_placeholders_and_stdin() {
        let backend = CommandBackend::new(
            BackendKind::Summary,
            "sh",
            vec![
                "-c".to_string(),
                r#"read line; printf '{"summary_text":"%s %s %s"}' "$0" "$1" "$line""#.to_string(),
                "{max_length}".to_string(),
                "{min_length}".to_string(),
            ],
            1024,
        )
        .unwrap();
        let summary = backend.summarize("hello there", 60, 10).unwrap();
        assert_eq!(summary, "60 10 hello there");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_inference_failure() {
        let backend = CommandBackend::new(
            BackendKind::Summary,
            "sh",
            vec!["-c".to_string(), "cat >/dev/null; echo oom >&2; exit 2".to_string()],
            1024,
        )
        .unwrap();
        let err = backend.summarize("text", 10, 1).unwrap_err();
        match err {
            BackendError::InferenceFailed(msg) => assert!(msg.contains("oom")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_program_that_ignores_input_is_reaped() {
        let backend = CommandBackend::new(
            BackendKind::Summary,
            "sh",
            vec!["-c".to_string(), "exit 0".to_string()],
            usize::MAX,
        )
        .unwrap();
        let input = "x".repeat(4 * 1024 * 1024);
        let err = backend.summarize(&input, 10, 1).unwrap_err();
        assert!(
            matches!(err, BackendError::InvalidOutput(_)),
            "unexpected error: {:?}",
            err
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_large_input_and_output_do_not_stall() {
        let backend = CommandBackend::new(
            BackendKind::Summary,
            "sh",
            vec![
                "-c".to_string(),
                r#"yes noise | head -c 1000000 >&2; cat >/dev/null; echo '{"summary_text":"done"}'"#
                    .to_string(),
            ],
            usize::MAX,
        )
        .unwrap();
        let input = "y".repeat(4 * 1024 * 1024);
        assert_eq!(backend.summarize(&input, 10, 1).unwrap(), "done");
    }
}
