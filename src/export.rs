//! CSV export of the active window.
//!
//! The header comes from the first reading's keys; later readings are
//! aligned to it by key so columns can never shift. Keys outside the header
//! are dropped and reported.

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::reading::Reading;
use crate::window::Window;

/// Spreadsheet tools need it to detect UTF-8.
pub const BYTE_ORDER_MARK: &str = "\u{feff}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub content: String,
}

pub fn export_file_name(window: &Window) -> String {
    format!("data_{}.csv", window.id())
}

/// Render `readings` as CSV. `Ok(None)` for an empty window.
pub fn export_window(window: &Window, readings: &[&Reading]) -> Result<Option<Export>, String> {
    let Some(first) = readings.first() else {
        return Ok(None);
    };
    let header: Vec<&str> = first.keys().collect();

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record(&header)
        .map_err(|e| format!("write csv header failed: {}", e))?;

    let mut heterogeneous = 0usize;
    for reading in readings {
        if reading.len() != header.len() || reading.keys().any(|k| !header.contains(&k)) {
            heterogeneous += 1;
        }
        let record: Vec<String> = header
            .iter()
            .map(|key| reading.field_text(key).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| format!("write csv row failed: {}", e))?;
    }
    if heterogeneous > 0 {
        warn!(
            "Export: {} of {} reading(s) have a different key set than the header; aligned to {} column(s)",
            heterogeneous,
            readings.len(),
            header.len()
        );
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| format!("flush csv failed: {}", e.error()))?;
    let body = String::from_utf8(bytes).map_err(|e| format!("csv output is not UTF-8: {}", e))?;
    let body = body.strip_suffix('\n').unwrap_or(&body);

    Ok(Some(Export {
        file_name: export_file_name(window),
        content: format!("{}{}", BYTE_ORDER_MARK, body),
    }))
}

/// Write an export into `dir`, creating it when needed.
pub fn write_export(dir: &Path, export: &Export) -> Result<PathBuf, String> {
    fs::create_dir_all(dir).map_err(|e| format!("create export dir {} failed: {}", dir.display(), e))?;
    let path = dir.join(&export.file_name);
    fs::write(&path, export.content.as_bytes()).map_err(|e| format!("write {} failed: {}", path.display(), e))?;
    info!("Export: wrote {} ({} bytes)", path.display(), export.content.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowMode;
    use chrono::NaiveDate;

    fn readings(json: &str) -> Vec<Reading> {
        serde_json::from_str(json).unwrap()
    }

    fn march_10() -> Window {
        Window::new(WindowMode::Day, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
    }

    fn lines(export: &Export) -> Vec<&str> {
        export
            .content
            .strip_prefix(BYTE_ORDER_MARK)
            .expect("bom prefix")
            .split('\n')
            .collect()
    }

    #[test]
    fn single_reading_export() {
        let rows = readings(r#"[{"TimeStamp":"2025-03-10 08:00:00","PH":"6.5"}]"#);
        let refs: Vec<&Reading> = rows.iter().collect();
        let export = export_window(&march_10(), &refs).unwrap().unwrap();
        assert_eq!(export.file_name, "data_10-03-2025.csv");
        assert_eq!(lines(&export), vec!["TimeStamp,PH", "2025-03-10 08:00:00,6.5"]);
    }

    #[test]
    fn empty_window_exports_nothing() {
        assert_eq!(export_window(&march_10(), &[]).unwrap(), None);
    }

    #[test]
    fn quotes_and_escapes_fields() {
        let rows = readings(r#"[{"note":"wet, windy","quote":"say \"hi\"","n":1.5}]"#);
        let refs: Vec<&Reading> = rows.iter().collect();
        let export = export_window(&march_10(), &refs).unwrap().unwrap();
        assert_eq!(lines(&export)[1], r#""wet, windy","say ""hi""",1.5"#);
    }

    #[test]
    fn heterogeneous_rows_align_to_header() {
        let rows = readings(
            r#"[
                {"TimeStamp":"a","PH":"6.5","N":"1"},
                {"N":"2","TimeStamp":"b","Extra":"x"},
                {"TimeStamp":"c","PH":"7.0","N":"3"}
            ]"#,
        );
        let refs: Vec<&Reading> = rows.iter().collect();
        let export = export_window(&march_10(), &refs).unwrap().unwrap();
        assert_eq!(lines(&export), vec!["TimeStamp,PH,N", "a,6.5,1", "b,,2", "c,7.0,3"]);
    }

    #[test]
    fn writes_into_directory() {
        let dir = std::env::temp_dir().join(format!("farm-monitor-export-{}", std::process::id()));
        let export = Export {
            file_name: "data_03-2025.csv".into(),
            content: format!("{}TimeStamp", BYTE_ORDER_MARK),
        };
        let path = write_export(&dir, &export).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
