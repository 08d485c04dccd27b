//! Output writing and run summaries.

use crate::error::Result;
use std::fs;
use std::path::Path;
use textmine_schema::AggregateOutput;
use tracing::info;

/// Write the aggregate output as pretty JSON.
///
/// The file is written to a temporary sibling first and renamed into place,
/// so a crash mid-write never leaves a truncated output file. Parent
/// directories are created as needed.
pub fn write_output(path: &Path, output: &AggregateOutput) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(output)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;

    info!("results written to {}", path.display());
    Ok(())
}

/// Print a human-readable run summary to stdout.
pub fn print_summary(output: &AggregateOutput) {
    let metadata = &output.metadata;

    println!("Extraction complete");
    println!("  Run:        {}", metadata.run_id);
    println!("  Model:      {}", metadata.model);
    println!(
        "  Documents:  {} processed, {} skipped",
        output.documents.len(),
        metadata.skipped_documents.len()
    );

    let total_records: usize = output.documents.values().map(|r| r.record_count()).sum();
    println!("  Records:    {}", total_records);

    if !metadata.degraded.is_empty() {
        println!(
            "  Degraded:   {} chunk-category pairs failed after retries",
            metadata.degraded.len()
        );
    }
    if metadata.discarded_lines > 0 {
        println!(
            "  Discarded:  {} unparseable response lines",
            metadata.discarded_lines
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use textmine_schema::{AggregateOutput, ExtractionResult, RunMetadata};

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        let mut output = AggregateOutput::new(RunMetadata::new("mock-model"));
        output.add_document("a.txt", ExtractionResult::new());
        write_output(&path, &output).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(parsed.get("metadata").is_some());
        assert!(parsed["documents"].get("a.txt").is_some());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let output = AggregateOutput::new(RunMetadata::new("mock-model"));
        write_output(&path, &output).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("out.json.tmp").exists());
    }
}
