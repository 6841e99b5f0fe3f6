use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const SALES_CSV: &str = "region,revenue\neast,100\nwest,250\nnorth,75\n";

pub const SALES_JSON: &str = r#"[
  {"region": "east", "revenue": 100},
  {"region": "west", "revenue": 250},
  {"region": "north", "revenue": 75}
]"#;

/// Write `contents` to `name` inside `dir` and return the full path.
pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

/// Write gzip-compressed `contents` to `name` inside `dir`.
pub fn write_gzip_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let file = File::create(&path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}
