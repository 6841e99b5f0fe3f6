//! Chart input export: write the `{labels, datasets}` document to disk for
//! the external chart renderer.

use color_eyre::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::chart_data::ChartInput;
use crate::cli::ChartKind;

/// Default export filename, timestamped so repeated exports don't collide.
pub fn default_export_filename(kind: ChartKind) -> String {
    format!(
        "chart-{}-{}.json",
        kind.as_str(),
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    )
}

/// Write chart input as pretty-printed JSON. Exporting an empty chart is an
/// error: the renderer contract requires at least one label.
pub fn write_chart_json(path: &Path, input: &ChartInput) -> Result<()> {
    if input.labels.is_empty() {
        return Err(color_eyre::eyre::eyre!("No data to export"));
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, input)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
