//! CSV export of deduplicated companies
//!
//! The file is UTF-8 with a byte-order mark so spreadsheet tools open the
//! Japanese text correctly. The header row is written even when there are
//! no companies.

use crate::entity::CandidateEntity;
use crate::output::traits::{OutputError, OutputResult};
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// UTF-8 byte-order mark
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column order of the export
pub const CSV_HEADER: [&str; 7] = [
    "company_name",
    "homepage_url",
    "contact_url",
    "email",
    "phone",
    "address",
    "source_url",
];

/// Writes `entities` to `companies_YYYYmmdd_HHMMSS.csv` under `export_dir`
///
/// The directory is created if missing. If a file with the same timestamp
/// already exists a numeric suffix is appended instead of overwriting it.
///
/// # Returns
///
/// The absolute path of the written file
pub fn export_csv(
    entities: &[CandidateEntity],
    export_dir: &Path,
    timestamp: DateTime<Local>,
) -> OutputResult<PathBuf> {
    fs::create_dir_all(export_dir)?;

    let stem = format!("companies_{}", timestamp.format("%Y%m%d_%H%M%S"));
    let (path, mut file) = create_unique(export_dir, &stem)?;

    file.write_all(BOM)?;
    write_csv(file, entities)?;

    let path = fs::canonicalize(&path).unwrap_or(path);
    info!("Exported {} companies to {}", entities.len(), path.display());
    Ok(path)
}

/// Writes the header and one row per entity to `writer`
///
/// Absent fields become empty strings.
pub fn write_csv<W: Write>(writer: W, entities: &[CandidateEntity]) -> OutputResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(CSV_HEADER)?;

    for entity in entities {
        writer.write_record([
            entity.name.as_deref().unwrap_or(""),
            entity.homepage_url.as_deref().unwrap_or(""),
            entity.contact_url.as_deref().unwrap_or(""),
            entity.email.as_deref().unwrap_or(""),
            entity.phone.as_deref().unwrap_or(""),
            entity.address.as_deref().unwrap_or(""),
            entity.source_url.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn create_unique(dir: &Path, stem: &str) -> OutputResult<(PathBuf, File)> {
    for attempt in 0..100 {
        let name = if attempt == 0 {
            format!("{}.csv", stem)
        } else {
            format!("{}_{}.csv", stem, attempt)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(OutputError::Write(format!(
        "Could not find a free file name for {} in {}",
        stem,
        dir.display()
    )))
}
