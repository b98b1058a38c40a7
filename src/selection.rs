use std::collections::BTreeSet;

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};

use crate::change::{Change, GroupId, Operation};
use crate::error::{BadSelection, SelectError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Code,
    Operation,
    Permissions,
    Owner,
    Group,
    Size,
    Timestamp,
    Path,
    PathIgnoreCase,
    Regex,
    RegexIgnoreCase,
    Glob,
    GlobIgnoreCase,
}

impl FilterKind {
    pub const ALL: [FilterKind; 13] = [
        Self::Code,
        Self::Operation,
        Self::Permissions,
        Self::Owner,
        Self::Group,
        Self::Size,
        Self::Timestamp,
        Self::Path,
        Self::PathIgnoreCase,
        Self::Regex,
        Self::RegexIgnoreCase,
        Self::Glob,
        Self::GlobIgnoreCase,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Operation => "op",
            Self::Permissions => "perms",
            Self::Owner => "owner",
            Self::Group => "group",
            Self::Size => "size",
            Self::Timestamp => "time",
            Self::Path => "path",
            Self::PathIgnoreCase => "ipath",
            Self::Regex => "regex",
            Self::RegexIgnoreCase => "iregex",
            Self::Glob => "glob",
            Self::GlobIgnoreCase => "iglob",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

#[derive(Debug, Clone)]
pub enum PathMatcher {
    Exact(String),
    ExactIgnoreCase(String),
    Regex(Regex),
    Glob(GlobMatcher),
}

impl PathMatcher {
    pub fn exact(path: &str, ignore_case: bool) -> Self {
        if ignore_case {
            Self::ExactIgnoreCase(path.to_lowercase())
        } else {
            Self::Exact(path.to_string())
        }
    }

    pub fn regex(pattern: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map(Self::Regex)
    }

    // `*` and `?` also match `/`
    pub fn glob(pattern: &str, ignore_case: bool) -> Result<Self, globset::Error> {
        GlobBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .literal_separator(false)
            .build()
            .map(|glob| Self::Glob(glob.compile_matcher()))
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(expected) => path == expected,
            Self::ExactIgnoreCase(expected) => path.to_lowercase() == *expected,
            Self::Regex(regex) => regex.is_match(path),
            Self::Glob(glob) => glob.is_match(path),
        }
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    Code(String),
    Operation(Operation),
    Permissions(String),
    Owner(u32),
    Group(GroupId),
    Size(u64),
    Timestamp(String),
    ShortPath(PathMatcher),
}

impl Predicate {
    fn parse(kind: FilterKind, token: &str, value: &str) -> Result<Self, BadSelection> {
        let bad = |reason: &dyn std::fmt::Display| BadSelection::filter(token, reason);
        let predicate = match kind {
            FilterKind::Code => Self::Code(value.to_string()),
            FilterKind::Operation => Self::Operation(
                Operation::parse(value).ok_or_else(|| bad(&"expected send, recv or del."))?,
            ),
            FilterKind::Permissions => Self::Permissions(value.to_string()),
            FilterKind::Owner => {
                Self::Owner(value.parse().map_err(|err| bad(&err))?)
            }
            FilterKind::Group => Self::Group(
                GroupId::parse(value).ok_or_else(|| bad(&"expected a group id or DEFAULT"))?,
            ),
            FilterKind::Size => Self::Size(value.parse().map_err(|err| bad(&err))?),
            FilterKind::Timestamp => Self::Timestamp(value.to_string()),
            FilterKind::Path => Self::ShortPath(PathMatcher::exact(value, false)),
            FilterKind::PathIgnoreCase => Self::ShortPath(PathMatcher::exact(value, true)),
            FilterKind::Regex | FilterKind::RegexIgnoreCase => Self::ShortPath(
                PathMatcher::regex(value, kind == FilterKind::RegexIgnoreCase)
                    .map_err(|err| bad(&err))?,
            ),
            FilterKind::Glob | FilterKind::GlobIgnoreCase => Self::ShortPath(
                PathMatcher::glob(value, kind == FilterKind::GlobIgnoreCase)
                    .map_err(|err| bad(&err))?,
            ),
        };
        Ok(predicate)
    }

    fn matches(&self, change: &Change) -> bool {
        match self {
            Self::Code(code) => change.itemized.as_str() == code,
            Self::Operation(op) => change.operation == *op,
            Self::Permissions(perms) => change.permissions == *perms,
            Self::Owner(owner) => change.owner == *owner,
            Self::Group(group) => change.group == *group,
            Self::Size(size) => change.size == *size,
            Self::Timestamp(time) => change.timestamp == *time,
            Self::ShortPath(matcher) => matcher.matches(&change.short_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[cfg(test)]
    pub fn ids(&self) -> Vec<usize> {
        self.indices.iter().map(|idx| idx + 1).collect()
    }
}

pub fn select(changes: &[Change], query: &str) -> Result<Selection, SelectError> {
    if changes.is_empty() {
        return Err(SelectError::NoPendingChanges);
    }

    let tokens = tokenize(query)?;
    let (filter_tokens, id_tokens): (Vec<&str>, Vec<&str>) = tokens
        .iter()
        .map(String::as_str)
        .partition(|token| token.contains('='));

    let candidates = resolve_ids(&id_tokens, changes.len())?;

    let mut groups: Vec<(FilterKind, Vec<Predicate>)> = Vec::new();
    for token in filter_tokens {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let kind = FilterKind::from_key(key)
            .ok_or_else(|| BadSelection::filter(token, format!("unknown filter '{key}'")))?;
        let predicate = Predicate::parse(kind, token, value)?;
        match groups.iter_mut().find(|(existing, _)| *existing == kind) {
            Some((_, alternatives)) => alternatives.push(predicate),
            None => groups.push((kind, vec![predicate])),
        }
    }

    let indices = candidates
        .into_iter()
        .filter(|&idx| {
            groups
                .iter()
                .all(|(_, alternatives)| alternatives.iter().any(|p| p.matches(&changes[idx])))
        })
        .collect();

    Ok(Selection { indices })
}

fn resolve_ids(tokens: &[&str], total: usize) -> Result<BTreeSet<usize>, BadSelection> {
    if tokens.is_empty() {
        return Ok((0..total).collect());
    }

    let mut picked = BTreeSet::new();
    for token in tokens {
        for item in token.split(',') {
            if item == "*" {
                picked.extend(0..total);
                continue;
            }
            let (start, end) = match item.split_once('-') {
                Some((start, end)) => (parse_id(token, start, total)?, parse_id(token, end, total)?),
                None => {
                    let id = parse_id(token, item, total)?;
                    (id, id)
                }
            };
            if start > end {
                return Err(BadSelection::id(
                    token,
                    format!("range {start}-{end} is reversed"),
                ));
            }
            picked.extend(start - 1..end);
        }
    }
    Ok(picked)
}

fn parse_id(token: &str, raw: &str, total: usize) -> Result<usize, BadSelection> {
    let id: usize = raw
        .trim()
        .parse()
        .map_err(|_| BadSelection::id(token, format!("'{raw}' is not an id")))?;
    if id == 0 || id > total {
        return Err(BadSelection::id(
            token,
            format!("{id} is out of range (1-{total})"),
        ));
    }
    Ok(id)
}

fn tokenize(query: &str) -> Result<Vec<String>, BadSelection> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in query.chars() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err(BadSelection::filter(query, "unterminated quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
