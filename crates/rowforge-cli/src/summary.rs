use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use rowforge_exec::ExecutionResult;

use crate::CliError;

pub const SUMMARY_FILE: &str = "result.json";

/// Written to `<log_dir>/result.json` when a run finishes.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub connection: Option<String>,
    pub result: ExecutionResult,
}

/// Replace `<log_dir>/result.json` through a temp file and rename.
pub fn write_summary(log_dir: &Path, summary: &RunSummary) -> Result<PathBuf, CliError> {
    create_dir_all(log_dir)?;
    let path = log_dir.join(SUMMARY_FILE);
    let tmp_path = log_dir.join(format!("{SUMMARY_FILE}.tmp"));

    let data = serde_json::to_vec_pretty(summary)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, &path)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_result_json() {
        let dir = std::env::temp_dir().join(format!("rowforge_summary_{}", uuid::Uuid::new_v4()));
        let now = Utc::now();
        let summary = RunSummary {
            run_id: "run-1".to_string(),
            started_at: now,
            finished_at: now,
            cancelled: false,
            connection: None,
            result: ExecutionResult {
                errors: vec!["boom".to_string()],
                insert_count: 4,
                executed_item_count: 2,
            },
        };

        let path = write_summary(&dir, &summary).expect("write summary");

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).expect("read")).expect("json");
        assert_eq!(value["result"]["insert_count"], 4);
        assert_eq!(value["result"]["errors"][0], "boom");
        assert!(!dir.join("result.json.tmp").exists());
    }
}
