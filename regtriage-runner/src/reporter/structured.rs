// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Machine-readable output: the JSON summary of a triage run.

use crate::errors::WriteReportError;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, TimeZone};
use regtriage_metadata::TriageSummary;
use std::{fs::File, io::Write};
use tracing::debug;

/// The JSON flavor to write.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JsonFormat {
    /// A single line of JSON.
    Compact,

    /// Indented JSON.
    Pretty,
}

/// Writes `summary` to `writer` as JSON, followed by a newline.
pub fn write_json(
    summary: &TriageSummary,
    format: JsonFormat,
    mut writer: impl Write,
) -> Result<(), WriteReportError> {
    match format {
        JsonFormat::Compact => serde_json::to_writer(&mut writer, summary)?,
        JsonFormat::Pretty => serde_json::to_writer_pretty(&mut writer, summary)?,
    }
    writeln!(writer)?;
    Ok(())
}

/// Returns the path at which a summary generated at `now` is stored under `report_dir`:
/// `<report_dir>/<YYYY>/<Mon>/<DD>/triage_report_<HH-MM-SS>.json`.
pub fn stored_report_path<Tz>(report_dir: &Utf8Path, now: &DateTime<Tz>) -> Utf8PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut path = report_dir.to_owned();
    path.push(now.format("%Y").to_string());
    path.push(now.format("%b").to_string());
    path.push(now.format("%d").to_string());
    path.push(format!("triage_report_{}.json", now.format("%H-%M-%S")));
    path
}

/// Stores `summary` as pretty-printed JSON under `report_dir`, in a subdirectory named after the
/// date. Returns the path of the stored report.
pub fn store_summary<Tz>(
    summary: &TriageSummary,
    report_dir: &Utf8Path,
    now: &DateTime<Tz>,
) -> Result<Utf8PathBuf, WriteReportError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let path = stored_report_path(report_dir, now);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|err| WriteReportError::CreateDir {
            dir: dir.to_owned(),
            err,
        })?;
    }

    let file = File::create(&path).map_err(|err| WriteReportError::WriteFile {
        file: path.clone(),
        err,
    })?;
    write_json(summary, JsonFormat::Pretty, file)?;
    debug!("stored triage report at {path}");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};
    use regtriage_metadata::ErrorTallySummary;
    use std::collections::BTreeMap;

    fn summary() -> TriageSummary {
        TriageSummary::new(
            "/regress",
            0,
            BTreeMap::new(),
            ErrorTallySummary::default(),
            ErrorTallySummary::default(),
        )
    }

    fn timestamp() -> DateTime<FixedOffset> {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|date| date.and_hms_opt(9, 5, 30))
            .expect("valid date")
            .and_local_timezone(FixedOffset::east_opt(0).expect("valid offset"))
            .single()
            .expect("unambiguous time")
    }

    #[test]
    fn report_path_is_date_stamped() {
        let path = stored_report_path(Utf8Path::new("reports"), &timestamp());
        assert_eq!(
            path,
            Utf8Path::new("reports")
                .join("2024")
                .join("Mar")
                .join("07")
                .join("triage_report_09-05-30.json")
        );
    }

    #[test]
    fn store_summary_writes_json() {
        let dir = camino_tempfile::tempdir().expect("created temp dir");
        let path = store_summary(&summary(), dir.path(), &timestamp()).expect("stored report");
        let contents = std::fs::read_to_string(&path).expect("read report");
        let parsed = TriageSummary::parse_json(&contents).expect("report parses");
        assert_eq!(parsed, summary());
    }

    #[test]
    fn compact_json_is_one_line() {
        let mut out = Vec::new();
        write_json(&summary(), JsonFormat::Compact, &mut out).expect("wrote JSON");
        let out = String::from_utf8(out).expect("JSON is UTF-8");
        assert_eq!(out.lines().count(), 1);
        assert!(out.ends_with('\n'));
    }
}
