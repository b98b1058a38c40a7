use regex::{Captures, Regex};

use crate::change::{Change, Decision, GroupId, ItemizedCode, Operation};
use crate::error::ReportError;

pub const DEFAULT_SENTINEL: &str = "[syncere]";
pub const DEFAULT_DELIMITER: &str = "///";

const ITEMIZED_PATTERN: &str = r"[<>ch.][fdLDS][.+ ?cstTpoguanbax]{9}|\*deleting  ";
const OPERATION_PATTERN: &str = r"send|recv|receive|del\.|delete";
const CHECKSUM_WIDTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFormat {
    pub sentinel: String,
    pub delimiter: String,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL.to_string(),
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl ReportFormat {
    pub fn out_format(&self) -> String {
        let d = &self.delimiter;
        format!(
            "{}%i %o %B %U %G %l{d}%M{d}%f{d}%n{d}%L{d}%C",
            self.sentinel
        )
    }
}

pub struct ReportParser {
    sentinel: String,
    line: Regex,
}

impl ReportParser {
    pub fn new(format: &ReportFormat) -> Result<Self, regex::Error> {
        let d = regex::escape(&format.delimiter);
        let pattern = format!(
            r"^(?P<code>{ITEMIZED_PATTERN}) (?P<op>{OPERATION_PATTERN}) (?P<perms>[-rwxsStT]{{9}}) (?P<owner>\d+) (?P<group>\d+|DEFAULT) (?P<size>\d+){d}(?P<time>.*?){d}(?P<long>.*?){d}(?P<short>.*?){d}(?P<link>.*?){d}(?P<sum>[0-9a-fA-F]{{{CHECKSUM_WIDTH}}}| {{{CHECKSUM_WIDTH}}})$"
        );
        Ok(Self {
            sentinel: format.sentinel.clone(),
            line: Regex::new(&pattern)?,
        })
    }

    pub fn parse<F>(&self, output: &str, mut info: F) -> Result<Vec<Change>, ReportError>
    where
        F: FnMut(&str),
    {
        let mut changes = Vec::new();

        for (idx, raw) in output.lines().enumerate() {
            let Some(record) = raw.strip_prefix(self.sentinel.as_str()) else {
                info(raw);
                continue;
            };

            let change = self
                .line
                .captures(record)
                .and_then(|caps| build_change(changes.len() + 1, &caps))
                .ok_or_else(|| ReportError::MalformedReportLine {
                    line_number: idx + 1,
                    line: raw.to_string(),
                })?;
            changes.push(change);
        }

        Ok(changes)
    }
}

fn build_change(id: usize, caps: &Captures<'_>) -> Option<Change> {
    let code = &caps["code"];
    debug_assert_eq!(code.len(), ItemizedCode::WIDTH);

    let checksum = &caps["sum"];
    let checksum = if checksum.trim().is_empty() {
        None
    } else {
        Some(checksum.to_ascii_lowercase())
    };

    Some(Change {
        id,
        itemized: ItemizedCode::new(code),
        operation: Operation::parse(&caps["op"])?,
        permissions: caps["perms"].to_string(),
        owner: caps["owner"].parse().ok()?,
        group: GroupId::parse(&caps["group"])?,
        size: caps["size"].parse().ok()?,
        timestamp: caps["time"].to_string(),
        long_path: caps["long"].to_string(),
        short_path: caps["short"].to_string(),
        link_target: strip_link_arrow(&caps["link"]).to_string(),
        checksum,
        decision: Decision::Undecided,
    })
}

// `%L` prints ` -> target` for symlinks and ` => target` for hard links
fn strip_link_arrow(raw: &str) -> &str {
    raw.strip_prefix(" -> ")
        .or_else(|| raw.strip_prefix(" => "))
        .unwrap_or(raw)
}
