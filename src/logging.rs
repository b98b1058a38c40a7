use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const MAX_ENTRIES: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferRecord {
    pub timestamp: String,
    pub mode: String,
    pub included: usize,
    pub excluded: usize,
    pub argv: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub view_only: bool,
    pub exit_code: Option<i32>,
}

impl TransferRecord {
    pub fn summary(&self) -> String {
        let outcome = if self.view_only {
            "viewed".to_string()
        } else {
            match self.exit_code {
                Some(code) => format!("exit {code}"),
                None => "killed".to_string(),
            }
        };
        let dry = if self.dry_run { " (dry run)" } else { "" };
        format!(
            "{} {} +{} -{} {}{}\n    {}",
            self.timestamp,
            self.mode,
            self.included,
            self.excluded,
            outcome,
            dry,
            self.argv.join(" ")
        )
    }
}

pub fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".into())
}

pub fn record_transfer(log_path: &Path, record: &TransferRecord) -> Result<()> {
    if let Some(dir) = log_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string(record)?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;
    writeln!(file, "{json}")?;
    truncate_log(log_path)
}

pub fn read_tail(log_path: &Path, count: usize) -> Result<Vec<TransferRecord>> {
    if !log_path.exists() {
        return Ok(Vec::new());
    }
    let lines = read_lines(log_path)?;
    let start = lines.len().saturating_sub(count);
    lines[start..]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .with_context(|| format!("corrupt entry in {}", log_path.display()))
        })
        .collect()
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let lines = BufReader::new(file).lines().collect::<Result<_, _>>()?;
    Ok(lines)
}

fn truncate_log(path: &Path) -> Result<()> {
    let lines = read_lines(path)?;
    if lines.len() <= MAX_ENTRIES {
        return Ok(());
    }
    let keep = &lines[lines.len() - MAX_ENTRIES..];
    fs::write(path, keep.join("\n") + "\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(n: usize) -> TransferRecord {
        TransferRecord {
            timestamp: format!("2026-01-01T00:00:{:02}Z", n % 60),
            mode: "exclude".into(),
            included: n,
            excluded: 1,
            argv: vec!["rsync".into(), "-a".into(), "src/".into(), "dst/".into()],
            dry_run: false,
            view_only: false,
            exit_code: Some(0),
        }
    }

    #[test]
    fn appends_and_reads_back_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("log.jsonl");
        for n in 0..3 {
            record_transfer(&path, &record(n)).unwrap();
        }
        let tail = read_tail(&path, 2).unwrap();
        assert_eq!(tail, vec![record(1), record(2)]);
        assert_eq!(read_tail(&path, 10).unwrap().len(), 3);
    }

    #[test]
    fn keeps_only_newest_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        for n in 0..MAX_ENTRIES + 5 {
            record_transfer(&path, &record(n)).unwrap();
        }
        let all = read_tail(&path, usize::MAX).unwrap();
        assert_eq!(all.len(), MAX_ENTRIES);
        assert_eq!(all[0].included, 5);
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempdir().unwrap();
        assert!(read_tail(&dir.path().join("none.jsonl"), 5).unwrap().is_empty());
    }

    #[test]
    fn summary_mentions_outcome() {
        let mut rec = record(2);
        rec.exit_code = Some(23);
        rec.dry_run = true;
        assert!(rec.summary().contains("exit 23 (dry run)"));
        rec.view_only = true;
        assert!(rec.summary().contains("viewed"));
        assert!(now_timestamp().contains('T'));
    }
}
