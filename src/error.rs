//! Typed errors for the ingestion path.
//!
//! Every variant is terminal for the current upload attempt: the caller
//! surfaces the message and clears the session rather than keeping a
//! partially populated dataset.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    /// The file claimed to be JSON but did not parse.
    #[error("Invalid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The JSON parsed but was neither an array nor an object.
    #[error("Invalid JSON format. Expected an array or object.")]
    UnrecognizedJsonShape,

    /// The file extension maps to no supported format.
    #[error("Unsupported file format. Please upload a JSON or CSV file.")]
    UnsupportedExtension,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
