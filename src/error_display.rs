//! User-facing error message formatting.
//!
//! Uses typed error matching (ParseError variants, io::ErrorKind) rather
//! than string parsing to produce actionable, implementation-agnostic
//! messages.

use std::io;
use std::path::Path;

use crate::error::ParseError;

/// Format a ParseError as a user-facing message by matching on its variant.
pub fn user_message_from_parse(err: &ParseError) -> String {
    match err {
        ParseError::MalformedJson(inner) => format!(
            "Invalid JSON (line {}, column {}). Check the file for syntax errors.",
            inner.line(),
            inner.column()
        ),
        ParseError::UnrecognizedJsonShape | ParseError::UnsupportedExtension => err.to_string(),
        ParseError::Io(inner) => user_message_from_io(inner),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error) -> String {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        _ => err.to_string(),
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find ParseError or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report, path: Option<&Path>) -> String {
    for cause in report.chain() {
        if let Some(parse_err) = cause.downcast_ref::<ParseError>() {
            let msg = user_message_from_parse(parse_err);
            return match path {
                Some(p) => format!("Failed to load {}: {}", p.display(), msg),
                None => msg,
            };
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            let msg = user_message_from_io(io_err);
            return match path {
                Some(p) => format!("Failed to load {}: {}", p.display(), msg),
                None => msg,
            };
        }
    }

    // Fallback: first line of the display form, to avoid long tracebacks
    let display = report.to_string();
    let first_line = display.lines().next().unwrap_or("An error occurred").trim();
    match path {
        Some(p) => format!("Failed to load {}: {}", p.display(), first_line),
        None => first_line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_keeps_contract_message() {
        let msg = user_message_from_parse(&ParseError::UnsupportedExtension);
        assert_eq!(msg, "Unsupported file format. Please upload a JSON or CSV file.");
    }

    #[test]
    fn unrecognized_shape_keeps_contract_message() {
        let msg = user_message_from_parse(&ParseError::UnrecognizedJsonShape);
        assert_eq!(msg, "Invalid JSON format. Expected an array or object.");
    }

    #[test]
    fn malformed_json_reports_position() {
        let inner = serde_json::from_str::<serde_json::Value>("{oops")
            .expect_err("must fail");
        let msg = user_message_from_parse(&ParseError::MalformedJson(inner));
        assert!(msg.contains("line 1"));
    }

    #[test]
    fn io_not_found_message() {
        let err = io::Error::new(io::ErrorKind::NotFound, "x");
        assert_eq!(user_message_from_io(&err), "File or directory not found.");
    }

    #[test]
    fn report_chain_finds_parse_error() {
        let report = color_eyre::eyre::Report::new(ParseError::UnsupportedExtension);
        let msg = user_message_from_report(&report, Some(Path::new("notes.txt")));
        assert!(msg.contains("notes.txt"));
        assert!(msg.contains("Unsupported file format"));
    }

    #[test]
    fn report_fallback_uses_first_line() {
        let report = color_eyre::eyre::eyre!("top line\nsecond line");
        assert_eq!(user_message_from_report(&report, None), "top line");
    }
}
