use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::debug;

use crate::mode::DEFAULT_MAX_INLINE_FILTERS;
use crate::report::{DEFAULT_DELIMITER, DEFAULT_SENTINEL, ReportFormat};

const APP_DIR: &str = "syncere";
const CONFIG_FILE: &str = "config.yaml";
const TRANSFER_LOG_FILE: &str = "transfer_log.jsonl";

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub rsync: Option<String>,
    pub max_inline_filters: Option<usize>,
    pub list_dir: Option<PathBuf>,
    pub keep_list_files: Option<bool>,
    pub sentinel: Option<String>,
    pub delimiter: Option<String>,
    pub rulesets: Vec<PathBuf>,
    pub transfer_log: Option<PathBuf>,
    pub log_transfers: Option<bool>,
}

#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub rsync: Option<String>,
    pub max_inline_filters: Option<usize>,
    pub list_dir: Option<PathBuf>,
    pub keep_list_files: bool,
    pub rulesets: Vec<PathBuf>,
    pub transfer_log: Option<PathBuf>,
    pub no_transfer_log: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rsync: String,
    pub max_inline_filters: usize,
    pub list_dir: PathBuf,
    pub keep_list_files: bool,
    pub format: ReportFormat,
    pub rulesets: Vec<PathBuf>,
    pub transfer_log: Option<PathBuf>,
}

impl Settings {
    pub fn merge(file: FileConfig, cli: Overrides) -> Result<Self> {
        let format = ReportFormat {
            sentinel: file.sentinel.unwrap_or_else(|| DEFAULT_SENTINEL.to_string()),
            delimiter: file.delimiter.unwrap_or_else(|| DEFAULT_DELIMITER.to_string()),
        };
        if format.sentinel.is_empty() {
            bail!("sentinel must not be empty");
        }
        if format.delimiter.trim().is_empty() {
            bail!("delimiter must contain a non-blank character");
        }

        let logging = !cli.no_transfer_log && file.log_transfers.unwrap_or(true);
        let transfer_log = if logging {
            cli.transfer_log
                .or(file.transfer_log)
                .or_else(default_transfer_log_path)
        } else {
            None
        };

        let mut rulesets = file.rulesets;
        rulesets.extend(cli.rulesets);

        Ok(Self {
            rsync: cli
                .rsync
                .or(file.rsync)
                .unwrap_or_else(|| "rsync".to_string()),
            max_inline_filters: cli
                .max_inline_filters
                .or(file.max_inline_filters)
                .unwrap_or(DEFAULT_MAX_INLINE_FILTERS),
            list_dir: cli
                .list_dir
                .or(file.list_dir)
                .unwrap_or_else(env::temp_dir),
            keep_list_files: cli.keep_list_files || file.keep_list_files.unwrap_or(false),
            format,
            rulesets,
            transfer_log,
        })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

pub fn default_transfer_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR).join(TRANSFER_LOG_FILE))
}

pub fn load_config(path: &Path) -> Result<FileConfig> {
    let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let config = if is_json {
        serde_json::from_slice(&data)
            .with_context(|| format!("parsing config {}", path.display()))?
    } else if data.iter().all(u8::is_ascii_whitespace) {
        FileConfig::default()
    } else {
        serde_yaml::from_slice(&data)
            .with_context(|| format!("parsing config {}", path.display()))?
    };
    Ok(config)
}

pub fn resolve_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            debug!(path = %path.display(), "loading default config");
            load_config(&path)
        }
        _ => Ok(FileConfig::default()),
    }
}
