//! CSV export of normalized publications.

use crate::error::Result;
use crate::normalize::NormalizedRecord;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// One exported row
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    title: &'a str,
    href: &'a str,
    doi_url: &'a str,
    scopus_url: &'a str,
    cited_by: u64,
    date: &'a str,
    venue: &'a str,
    details: &'a str,
    category: &'static str,
}

impl<'a> From<&'a NormalizedRecord> for ExportRow<'a> {
    fn from(r: &'a NormalizedRecord) -> Self {
        Self {
            title: &r.title,
            href: &r.href,
            doi_url: r.doi_url.as_deref().unwrap_or(""),
            scopus_url: r.scopus_url.as_deref().unwrap_or(""),
            cited_by: r.citations,
            date: &r.date,
            venue: &r.venue,
            details: &r.details,
            category: r.category.as_str(),
        }
    }
}

/// Write records as CSV with a header row to any writer
pub fn write_csv<W: Write>(writer: W, records: &[NormalizedRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        wtr.serialize(ExportRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save records to a CSV file
pub fn save_csv(path: &Path, records: &[NormalizedRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, records)?;
    info!(path = %path.display(), count = records.len(), "Saved CSV export");
    Ok(())
}
