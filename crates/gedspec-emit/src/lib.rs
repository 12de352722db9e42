//! Output rendering and writing.
//!
//! Emission is two-phase. `emit` renders every record, table, and the run
//! report into an in-memory bundle; `write_bundle` then lays the bundle out
//! on disk. Nothing touches the filesystem until every piece has rendered,
//! so a failing render leaves the destination untouched.
//!
//! The on-disk layout puts one record per entry under `tags/`, the four
//! tab-separated extracts and `report.json` beside it.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use gedspec_ingest::Extraction;

pub mod extracts;
pub mod flatten;
pub mod records;

pub use extracts::ExtractTables;
pub use flatten::{PlainFlattener, TextFlattener};
pub use records::RecordRenderer;

#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Column at which description text wraps, indent included.
    pub width: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { width: 79 }
    }
}

/// Everything a run writes, rendered but not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitBundle {
    /// Tag to rendered record text, in tag order.
    pub records: BTreeMap<String, String>,
    pub tables: ExtractTables,
    pub report_json: String,
}

pub fn emit(extraction: &Extraction, options: &EmitOptions) -> Result<EmitBundle> {
    let flattener = PlainFlattener::new(options.width);
    let renderer = RecordRenderer::new(&extraction.prefixes, &flattener);

    let mut records = BTreeMap::new();
    for (tag, entry) in extraction.graph.iter() {
        let record = renderer
            .render(tag, entry, extraction.graph.members(tag))
            .with_context(|| format!("failed to render record for {tag}"))?;
        records.insert(tag.to_string(), record);
    }

    let tables = extracts::collect(&extraction.graph, &extraction.prefixes);
    let mut report_json = serde_json::to_string_pretty(&extraction.report)
        .context("failed to serialize run report")?;
    report_json.push('\n');

    Ok(EmitBundle {
        records,
        tables,
        report_json,
    })
}

/// Write a bundle under `out_dir`. The report lands at `report_path` when
/// given, `<out_dir>/report.json` otherwise.
pub fn write_bundle(
    bundle: &EmitBundle,
    out_dir: &Path,
    report_path: Option<&Path>,
) -> Result<()> {
    let tags_dir = out_dir.join("tags");
    fs::create_dir_all(&tags_dir)
        .with_context(|| format!("failed to create {}", tags_dir.display()))?;

    for (tag, record) in &bundle.records {
        let path = tags_dir.join(tag);
        fs::write(&path, record)
            .with_context(|| format!("failed to write record {}", path.display()))?;
    }

    let tables = &bundle.tables;
    let files = [
        ("substructures.tsv", extracts::to_tsv(&tables.substructures)),
        ("enumerations.tsv", extracts::to_tsv(&tables.enumerations)),
        ("payloads.tsv", extracts::to_tsv(&tables.payloads)),
        ("cardinalities.tsv", extracts::to_tsv(&tables.cardinalities)),
    ];
    for (name, contents) in files {
        let path = out_dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let report = match report_path {
        Some(path) => path.to_path_buf(),
        None => out_dir.join("report.json"),
    };
    fs::write(&report, &bundle.report_json)
        .with_context(|| format!("failed to write {}", report.display()))?;
    Ok(())
}
