//! One-way text exports of the catalog and of unavailable avatars.
//!
//! Every record renders on exactly one line; the formats are not meant to
//! be read back (imports go through [`crate::parser`]).

use crate::{avatar::AvatarRecord, types::AvatarId};

/// Header row of the CSV export.
pub const CSV_HEADER: &str = "ID,Name,Author Name";

/// Catalog export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Header plus quoted `id,name,authorName` rows.
    Csv,
    /// Plain `id,name,authorName` rows.
    Text,
}

impl ExportFormat {
    /// Conventional download file name.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Csv => "vrchat_avatars.csv",
            Self::Text => "vrchat_avatars.txt",
        }
    }
}

pub fn render(records: &[AvatarRecord], format: ExportFormat) -> String {
    match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Text => to_text(records),
    }
}

pub fn to_csv(records: &[AvatarRecord]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(records.iter().map(|r| {
        format!(
            "{},{},{}",
            csv_field(&r.id),
            csv_field(&r.name),
            csv_field(&r.author_name)
        )
    }));
    lines.join("\n")
}

pub fn to_text(records: &[AvatarRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "{},{},{}",
                single_line(&r.id),
                single_line(&r.name),
                single_line(&r.author_name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `id,name` per line for avatars found unavailable during a verify run.
pub fn unavailable_to_text(pairs: &[(AvatarId, String)]) -> String {
    pairs
        .iter()
        .map(|(id, name)| format!("{},{}", single_line(id), single_line(name)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn csv_field(value: &str) -> String {
    let value = single_line(value);
    if value.contains([',', '"']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}
