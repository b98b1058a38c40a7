use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::change::{Change, Decision, ItemizedCode};
use crate::decisions::ChangeList;
use crate::error::RuleError;
use crate::selection::PathMatcher;

const DELETING: &str = "*deleting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathField {
    Short,
    Long,
}

#[derive(Debug, Clone)]
struct Rule {
    action: Decision,
    itemized: String,
    field: PathField,
    matcher: PathMatcher,
}

impl Rule {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_start();
        let mut chars = line.chars();
        let action = match chars.next()? {
            '>' => Decision::Included,
            '!' => Decision::Excluded,
            '?' => Decision::Undecided,
            _ => return None,
        };
        let rest = chars.as_str().trim_start();

        let (itemized, rest) = if let Some(rest) = rest.strip_prefix(DELETING) {
            (DELETING, rest)
        } else {
            let end = rest.char_indices().nth(ItemizedCode::WIDTH).map_or(rest.len(), |(i, _)| i);
            let code = &rest[..end];
            if !is_itemized(code) {
                return None;
            }
            (code, &rest[end..])
        };

        let (kind, path) = rest.trim_start().split_once(':')?;
        if path.is_empty() {
            return None;
        }
        let ignore_case = kind.len() == 2 && kind.ends_with('i');
        let matcher = match kind {
            "p" | "pi" | "P" => PathMatcher::exact(path, ignore_case),
            "g" | "gi" | "G" => PathMatcher::glob(path, ignore_case).ok()?,
            "r" | "ri" | "R" => PathMatcher::regex(path, ignore_case).ok()?,
            _ => return None,
        };
        let field = if kind.starts_with(|c: char| c.is_ascii_uppercase()) {
            PathField::Long
        } else {
            PathField::Short
        };

        Some(Self {
            action,
            itemized: itemized.trim_end().to_string(),
            field,
            matcher,
        })
    }

    fn matches(&self, change: &Change) -> bool {
        if change.itemized.as_str().trim_end() != self.itemized {
            return false;
        }
        let path = match self.field {
            PathField::Short => &change.short_path,
            PathField::Long => &change.long_path,
        };
        self.matcher.matches(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

fn is_itemized(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == ItemizedCode::WIDTH
        && b"<>ch.".contains(&bytes[0])
        && b"fdLDS".contains(&bytes[1])
        && bytes[2..].iter().all(|b| b".+ ?cstTpoguanbax".contains(b))
}

impl RuleSet {
    pub fn parse(text: &str) -> Result<Self, RuleError> {
        let mut rules = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let rule = Rule::parse(line).ok_or_else(|| RuleError::InvalidRule {
                line_number: idx + 1,
                line: line.to_string(),
            })?;
            rules.push(rule);
        }
        Ok(Self { rules })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read rule set {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse rule set {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn extend(&mut self, other: RuleSet) {
        self.rules.extend(other.rules);
    }

    // last matching rule wins
    pub fn decide(&self, change: &Change) -> Option<Decision> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(change))
            .last()
            .map(|rule| rule.action)
    }

    pub fn apply(&self, list: &mut ChangeList) -> usize {
        let mut applied = 0;
        for change in list.changes_mut() {
            let Some(decision) = self.decide(change) else {
                continue;
            };
            match decision {
                Decision::Included => change.include(),
                Decision::Excluded => change.exclude(),
                Decision::Undecided => change.reset(),
            }
            applied += 1;
        }
        applied
    }
}
