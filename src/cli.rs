//! Command-line definitions: arguments plus the format/compression/chart-kind
//! enums used for extension-based detection.

use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// File format for data files (used to bypass extension-based detection).
/// When `--format` is not specified, format is auto-detected from the file extension.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON document (array of records, or an object holding one)
    Json,
    /// Comma-separated values
    Csv,
}

impl FileFormat {
    /// Detect file format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "json", "csv").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Compression format for data files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz) - Most common, good balance of speed and compression
    Gzip,
    /// Zstandard compression (.zst) - Modern, fast compression with good ratios
    Zstd,
    /// Bzip2 compression (.bz2) - Good compression ratio, slower than gzip
    Bzip2,
    /// XZ compression (.xz) - Excellent compression ratio, slower than bzip2
    Xz,
}

impl CompressionFormat {
    /// Detect compression format from the final file extension (e.g. `.csv.gz` -> gz).
    pub fn from_extension(path: &Path) -> Option<Self> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "gz" => Some(Self::Gzip),
                "zst" | "zstd" => Some(Self::Zstd),
                "bz2" | "bz" => Some(Self::Bzip2),
                "xz" => Some(Self::Xz),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Get file extension for this compression format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
        }
    }
}

/// Chart kind for the exported chart input.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ChartKind {
    /// Vertical bar chart
    Bar,
    /// Line chart
    Line,
    /// Pie chart
    Pie,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
        }
    }

    /// Parse a kind from its config-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "bar" => Some(Self::Bar),
            "line" => Some(Self::Line),
            "pie" => Some(Self::Pie),
            _ => None,
        }
    }
}

/// Command-line arguments for viztab
#[derive(Parser, Debug)]
#[command(version, about = "Visualize tabular data in the terminal")]
pub struct Args {
    /// Path to the data file to open (not required with --generate-config)
    #[arg(required_unless_present = "generate_config", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Specify the file format instead of detecting it from the extension
    #[arg(long = "format", value_enum)]
    pub format: Option<FileFormat>,

    /// Specify the compression format instead of detecting it from the extension
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionFormat>,

    /// Field to use for chart labels (defaults to the first categorical field)
    #[arg(long = "category-field")]
    pub category_field: Option<String>,

    /// Field to use for chart values (defaults to the first numeric field)
    #[arg(long = "value-field")]
    pub value_field: Option<String>,

    /// Chart kind for exported chart input
    #[arg(long = "chart-kind", value_enum)]
    pub chart_kind: Option<ChartKind>,

    /// Write chart input JSON to this path and exit without entering the UI
    #[arg(long = "export-chart", value_name = "FILE")]
    pub export_chart: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing config file (with --generate-config)
    #[arg(long = "force", action)]
    pub force: bool,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,
}
