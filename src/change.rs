use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Send,
    Receive,
    Delete,
}

impl Operation {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "send" => Some(Self::Send),
            "recv" | "receive" => Some(Self::Receive),
            "del." | "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "recv",
            Self::Delete => "del.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupId {
    Id(u32),
    Default,
}

impl GroupId {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "DEFAULT" {
            return Some(Self::Default);
        }
        raw.parse().ok().map(Self::Id)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Default => f.write_str("DEFAULT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    #[default]
    Undecided,
    Included,
    Excluded,
}

impl Decision {
    pub fn marker(self) -> char {
        match self {
            Self::Undecided => '?',
            Self::Included => '>',
            Self::Excluded => '!',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub id: usize,
    pub itemized: ItemizedCode,
    pub operation: Operation,
    pub permissions: String,
    pub owner: u32,
    pub group: GroupId,
    pub size: u64,
    pub timestamp: String,
    pub long_path: String,
    pub short_path: String,
    pub link_target: String,
    pub checksum: Option<String>,
    pub decision: Decision,
}

impl Change {
    pub fn include(&mut self) {
        self.decision = Decision::Included;
    }

    pub fn exclude(&mut self) {
        self.decision = Decision::Excluded;
    }

    pub fn reset(&mut self) {
        self.decision = Decision::Undecided;
    }

    pub fn summary(&self, width: usize) -> String {
        let mut line = format!(
            "{:>width$} {} {} {}",
            self.id,
            self.decision.marker(),
            self.itemized,
            self.short_path
        );
        if !self.link_target.is_empty() {
            line.push_str(" -> ");
            line.push_str(&self.link_target);
        }
        line
    }

    pub fn details(&self, width: usize) -> String {
        let pad = " ".repeat(width + 3);
        let mut out = format!(
            "{pad}{}, {} {} {}:{} {} bytes {}",
            self.itemized.describe(),
            self.operation.label(),
            self.permissions,
            self.owner,
            self.group,
            self.size,
            self.timestamp
        );
        if self.long_path != self.short_path {
            out.push_str(&format!("\n{pad}full path: {}", self.long_path));
        }
        let attributes = self.itemized.changed_attributes();
        if !attributes.is_empty() {
            out.push_str(&format!("\n{pad}changed: {}", attributes.join(", ")));
        }
        if let Some(sum) = &self.checksum {
            out.push_str(&format!("\n{pad}checksum: {sum}"));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemizedCode(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Sent,
    Received,
    LocalChange,
    HardLink,
    NotUpdated,
    Message,
}

impl UpdateKind {
    fn label(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
            Self::LocalChange => "local",
            Self::HardLink => "hard-linked",
            Self::NotUpdated => "unchanged",
            Self::Message => "reported",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    Symlink,
    Device,
    Special,
}

impl FileKind {
    fn label(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Symlink => "symlink",
            Self::Device => "device",
            Self::Special => "special file",
        }
    }
}

const ATTRIBUTE_NAMES: [&str; 9] = [
    "checksum",
    "size",
    "time",
    "permissions",
    "owner",
    "group",
    "access time",
    "acl",
    "xattr",
];

impl ItemizedCode {
    pub const WIDTH: usize = 11;

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_deletion(&self) -> bool {
        self.0.starts_with("*deleting")
    }

    pub fn update_kind(&self) -> Option<UpdateKind> {
        match self.0.chars().next()? {
            '<' => Some(UpdateKind::Sent),
            '>' => Some(UpdateKind::Received),
            'c' => Some(UpdateKind::LocalChange),
            'h' => Some(UpdateKind::HardLink),
            '.' => Some(UpdateKind::NotUpdated),
            '*' => Some(UpdateKind::Message),
            _ => None,
        }
    }

    pub fn file_kind(&self) -> Option<FileKind> {
        if self.is_deletion() {
            return None;
        }
        match self.0.chars().nth(1)? {
            'f' => Some(FileKind::File),
            'd' => Some(FileKind::Directory),
            'L' => Some(FileKind::Symlink),
            'D' => Some(FileKind::Device),
            'S' => Some(FileKind::Special),
            _ => None,
        }
    }

    pub fn is_new(&self) -> bool {
        !self.is_deletion() && self.0.get(2..).is_some_and(|rest| rest.chars().all(|c| c == '+'))
    }

    pub fn describe(&self) -> String {
        if self.is_deletion() {
            return "deleted".to_string();
        }
        match (self.update_kind(), self.file_kind()) {
            (Some(update), Some(kind)) => format!("{} {}", update.label(), kind.label()),
            (Some(update), None) => update.label().to_string(),
            _ => format!("item {}", self.0),
        }
    }

    pub fn changed_attributes(&self) -> Vec<&'static str> {
        if self.is_deletion() || self.is_new() {
            return Vec::new();
        }
        self.0
            .chars()
            .skip(2)
            .zip(ATTRIBUTE_NAMES)
            .filter(|(flag, _)| !matches!(flag, '.' | ' ' | '+' | '?'))
            .map(|(_, name)| name)
            .collect()
    }
}

impl fmt::Display for ItemizedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
pub(crate) fn sample(id: usize, code: &str, short_path: &str) -> Change {
    Change {
        id,
        itemized: ItemizedCode::new(code),
        operation: if code.starts_with("*deleting") {
            Operation::Delete
        } else {
            Operation::Send
        },
        permissions: "rw-r--r--".into(),
        owner: 1000,
        group: GroupId::Id(1000),
        size: 0,
        timestamp: "2016/01/02-03:04:05".into(),
        long_path: format!("src/{short_path}"),
        short_path: short_path.into(),
        link_target: String::new(),
        checksum: None,
        decision: Decision::Undecided,
    }
}
