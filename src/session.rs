//! Upload session state: the current dataset, its field classification, and
//! the selected chart fields, guarded by an upload generation counter.
//!
//! Each load is tagged with the generation that was current when it started,
//! and only a result matching the current generation is applied. Two racing
//! uploads therefore resolve to an explicit last-writer-wins instead of an
//! undefined ordering.

use std::path::PathBuf;

use crate::classify::{classify, FieldClassification};
use crate::cli::FileFormat;
use crate::ingest::Dataset;

/// The applied result of one successful upload.
#[derive(Clone, Debug)]
pub struct Upload {
    pub path: PathBuf,
    pub format: FileFormat,
    pub dataset: Dataset,
    pub fields: FieldClassification,
    pub category_field: Option<String>,
    pub value_field: Option<String>,
}

impl Upload {
    /// Classify the dataset and pick default chart fields: first categorical
    /// for labels, first numeric for values.
    pub fn new(path: PathBuf, format: FileFormat, dataset: Dataset) -> Self {
        let fields = classify(&dataset);
        let category_field = fields.default_category().map(String::from);
        let value_field = fields.default_value().map(String::from);
        Self {
            path,
            format,
            dataset,
            fields,
            category_field,
            value_field,
        }
    }

    /// Both a category and a value field are selected.
    pub fn is_chartable(&self) -> bool {
        self.category_field.is_some() && self.value_field.is_some()
    }
}

fn cycle(fields: &[String], current: Option<&str>) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    let next = match current.and_then(|c| fields.iter().position(|f| f == c)) {
        Some(index) => (index + 1) % fields.len(),
        None => 0,
    };
    Some(fields[next].clone())
}

/// Mutable app state for uploads, with a defined reset transition.
#[derive(Debug, Default)]
pub struct UploadSession {
    generation: u64,
    current: Option<Upload>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new upload attempt. Bumps and returns the generation; any
    /// in-flight load tagged with an older generation is thereby superseded.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Install the result of a finished load. Returns false (and discards the
    /// upload) when a newer upload attempt has begun since `generation`.
    pub fn apply(&mut self, generation: u64, upload: Upload) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.current = Some(upload);
        true
    }

    /// Reset transition: clear the current upload and field selections. The
    /// generation is never reset; it stays monotonic across the session.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&Upload> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Upload> {
        self.current.as_mut()
    }

    /// Select the next categorical field as the chart category, wrapping.
    pub fn cycle_category(&mut self) {
        if let Some(upload) = self.current.as_mut() {
            upload.category_field = cycle(
                &upload.fields.categorical,
                upload.category_field.as_deref(),
            );
        }
    }

    /// Select the next numeric field as the chart value, wrapping.
    pub fn cycle_value(&mut self) {
        if let Some(upload) = self.current.as_mut() {
            upload.value_field = cycle(&upload.fields.numeric, upload.value_field.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FileFormat;
    use crate::ingest::parse_text;

    fn upload(text: &str) -> Upload {
        let dataset = parse_text(text, FileFormat::Csv).unwrap();
        Upload::new(PathBuf::from("data.csv"), FileFormat::Csv, dataset)
    }

    #[test]
    fn defaults_selected_on_new_upload() {
        let upload = upload("region,revenue\neast,100\n");
        assert_eq!(upload.category_field.as_deref(), Some("region"));
        assert_eq!(upload.value_field.as_deref(), Some("revenue"));
        assert!(upload.is_chartable());
    }

    #[test]
    fn all_numeric_upload_is_not_chartable() {
        let upload = upload("x,y\n1,2\n");
        assert!(upload.category_field.is_none());
        assert!(!upload.is_chartable());
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut session = UploadSession::new();
        let first = session.begin();
        let second = session.begin();

        // The earlier upload finishes last; it must not clobber the newer one.
        assert!(session.apply(second, upload("a,b\nnew,1\n")));
        assert!(!session.apply(first, upload("a,b\nold,2\n")));

        let current = session.current().unwrap();
        assert_eq!(
            current.dataset.records()[0].get("a"),
            Some(&serde_json::json!("new"))
        );
    }

    #[test]
    fn reset_clears_upload_but_not_generation() {
        let mut session = UploadSession::new();
        let generation = session.begin();
        assert!(session.apply(generation, upload("a,b\nx,1\n")));
        assert!(session.current().is_some());

        session.reset();
        assert!(session.current().is_none());
        assert!(session.begin() > generation);
    }

    #[test]
    fn cycling_wraps_within_partition() {
        let mut session = UploadSession::new();
        let generation = session.begin();
        session.apply(generation, upload("name,team,score\nann,red,3\n"));

        assert_eq!(
            session.current().unwrap().category_field.as_deref(),
            Some("name")
        );
        session.cycle_category();
        assert_eq!(
            session.current().unwrap().category_field.as_deref(),
            Some("team")
        );
        session.cycle_category();
        assert_eq!(
            session.current().unwrap().category_field.as_deref(),
            Some("name")
        );

        // Single numeric field cycles onto itself.
        session.cycle_value();
        assert_eq!(
            session.current().unwrap().value_field.as_deref(),
            Some("score")
        );
    }
}
