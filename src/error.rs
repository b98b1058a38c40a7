use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::mode::TransferMode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("malformed report line {line_number}: {line}")]
    MalformedReportLine { line_number: usize, line: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("there are no pending changes")]
    NoPendingChanges,
    #[error(transparent)]
    BadSelection(#[from] BadSelection),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BadSelection {
    #[error("bad selection '{token}': {reason}")]
    IdSelector { token: String, reason: String },
    #[error("bad filter syntax '{token}': {reason}")]
    Filter { token: String, reason: String },
}

impl BadSelection {
    pub(crate) fn id(token: &str, reason: impl Into<String>) -> Self {
        Self::IdSelector {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn filter(token: &str, reason: impl fmt::Display) -> Self {
        Self::Filter {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("there are still {undecided} undecided change(s)")]
    UndecidedChangesRemain { undecided: usize },
    #[error("every change is excluded; there is nothing to transfer")]
    NothingIncluded,
    #[error("transfer modes are mutually exclusive: {}", join_modes(.0))]
    AmbiguousMode(Vec<TransferMode>),
}

fn join_modes(modes: &[TransferMode]) -> String {
    modes
        .iter()
        .map(|mode| mode.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
#[error("could not write list file {}: {source}", path.display())]
pub struct ListFileWriteFailed {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("rsync option {0} is not supported")]
    UnsupportedOption(String),
    #[error("no source or destination locations were given")]
    MissingLocations,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("invalid rule at line {line_number}: {line}")]
    InvalidRule { line_number: usize, line: String },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}
