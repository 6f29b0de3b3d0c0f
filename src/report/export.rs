use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::ProjectionSeries;
use crate::error::{AppError, AppResult};

pub const DEFAULT_EXPORT_FILE: &str = "asset_projection_results.csv";

const CSV_HEADER: &str = "Year,Age,Total Assets,Monthly Withdrawal";
const UTF8_BOM: &str = "\u{feff}";

/// CSV body without a byte-order mark. Amounts use shortest round-trip float
/// text so nothing is lost relative to the in-memory series.
pub fn to_csv(series: &ProjectionSeries) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + series.len() * 40);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in series {
        out.push_str(&format!(
            "{},{},{},{}\n",
            r.year, r.age, r.balance, r.monthly_withdrawal
        ));
    }
    out
}

/// Writes the CSV with a UTF-8 byte-order mark so spreadsheet tools pick the
/// right encoding.
pub fn write_csv(series: &ProjectionSeries, path: &Path) -> AppResult<()> {
    let mut body = String::from(UTF8_BOM);
    body.push_str(&to_csv(series));
    write_atomically(path, body.as_bytes())?;
    tracing::info!(path = %path.display(), rows = series.len(), "projection exported");
    Ok(())
}

/// Replaces `path` only once the full contents are on disk; an existing file
/// is left untouched if anything fails.
pub fn write_atomically(path: &Path, contents: &[u8]) -> AppResult<()> {
    let tmp = temp_path(path);
    let result = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    result.map_err(|source| {
        let _ = fs::remove_file(&tmp);
        AppError::Export {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
