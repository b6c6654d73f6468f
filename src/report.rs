//! Report formatters for the debug response body.
//!
//! The engine only depends on [`ReportFormatter`]. [`PlainTextFormatter`]
//! writes one `name: message` line per probe; [`JsonFormatter`] writes an
//! array of objects that also carry the failure flag and duration.

use serde::Serialize;

use crate::engine::ProbeResult;

/// Renders per-probe results into a response body.
pub trait ReportFormatter: Send + Sync {
    /// MIME type of the rendered body
    fn content_type(&self) -> &str;

    fn write(&self, results: &[ProbeResult]) -> String;
}

/// `<name>: <message>` per result, newline-terminated, in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormatter;

impl ReportFormatter for PlainTextFormatter {
    fn content_type(&self) -> &str {
        "text/plain; charset=utf-8"
    }

    fn write(&self, results: &[ProbeResult]) -> String {
        let mut body = String::new();
        for result in results {
            body.push_str(&result.name);
            body.push_str(": ");
            body.push_str(result.outcome.message());
            body.push('\n');
        }
        body
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonEntry<'a> {
    name: &'a str,
    message: &'a str,
    failed: bool,
    duration_ms: u64,
}

impl ReportFormatter for JsonFormatter {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn write(&self, results: &[ProbeResult]) -> String {
        let entries: Vec<JsonEntry<'_>> = results
            .iter()
            .map(|result| JsonEntry {
                name: &result.name,
                message: result.outcome.message(),
                failed: result.outcome.has_failed(),
                duration_ms: result.duration.as_millis() as u64,
            })
            .collect();

        serde_json::to_string(&entries).expect("string and integer fields always serialize")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::probe::ProbeOutcome;

    fn result(name: &str, outcome: ProbeOutcome, millis: u64) -> ProbeResult {
        ProbeResult {
            name: name.to_string(),
            outcome,
            duration: Duration::from_millis(millis),
        }
    }

    #[test]
    fn test_plain_text_empty_results() {
        assert_eq!(PlainTextFormatter.write(&[]), "");
    }

    #[test]
    fn test_plain_text_single_result() {
        let results = [result("A", ProbeOutcome::passed(), 3)];
        assert_eq!(PlainTextFormatter.write(&results), "A: Success\n");
    }

    #[test]
    fn test_plain_text_preserves_order_and_duplicates() {
        let results = [
            result("B", ProbeOutcome::failed_with("down"), 1),
            result("A", ProbeOutcome::passed(), 2),
            result("B", ProbeOutcome::passed_with("OK"), 3),
        ];
        assert_eq!(
            PlainTextFormatter.write(&results),
            "B: down\nA: Success\nB: OK\n"
        );
    }

    #[test]
    fn test_json_empty_results() {
        assert_eq!(JsonFormatter.write(&[]), "[]");
    }

    #[test]
    fn test_json_fields() {
        let results = [result("db", ProbeOutcome::failed_with("refused"), 42)];
        let value: serde_json::Value = serde_json::from_str(&JsonFormatter.write(&results)).unwrap();

        assert_eq!(
            value,
            serde_json::json!([
                { "name": "db", "message": "refused", "failed": true, "duration_ms": 42 }
            ])
        );
    }

    #[test]
    fn test_content_types() {
        assert!(PlainTextFormatter.content_type().starts_with("text/plain"));
        assert_eq!(JsonFormatter.content_type(), "application/json");
    }
}
