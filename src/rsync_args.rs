use crate::error::ArgsError;
use crate::mode::TransferMode;
use crate::report::ReportFormat;

const UNSUPPORTED_LONG: [&str; 5] = [
    "--daemon",
    "--config",
    "--dparam",
    "--remote-option",
    "--no-detach",
];
const UNSUPPORTED_SHORT: [char; 1] = ['M'];

const PREVIEW_ONLY_LONG: [&str; 7] = [
    "--dry-run",
    "--itemize-changes",
    "--out-format",
    "--log-format",
    "--info",
    "--quiet",
    "--msgs2stderr",
];
const PREVIEW_ONLY_SHORT: [char; 3] = ['n', 'i', 'q'];

const SHORT_WITH_VALUE: [char; 6] = ['B', 'e', 'f', 'T', 'M', '@'];

const LONG_WITH_VALUE: &[&str] = &[
    "--address",
    "--backup-dir",
    "--block-size",
    "--bwlimit",
    "--checksum-choice",
    "--checksum-seed",
    "--chmod",
    "--chown",
    "--compare-dest",
    "--compress-choice",
    "--compress-level",
    "--config",
    "--contimeout",
    "--copy-as",
    "--copy-dest",
    "--debug",
    "--dparam",
    "--exclude",
    "--exclude-from",
    "--files-from",
    "--filter",
    "--groupmap",
    "--iconv",
    "--include",
    "--include-from",
    "--info",
    "--link-dest",
    "--log-file",
    "--log-file-format",
    "--log-format",
    "--max-alloc",
    "--max-delete",
    "--max-size",
    "--min-size",
    "--modify-window",
    "--only-write-batch",
    "--out-format",
    "--outbuf",
    "--partial-dir",
    "--password-file",
    "--port",
    "--protocol",
    "--read-batch",
    "--remote-option",
    "--rsh",
    "--rsync-path",
    "--skip-compress",
    "--sockopts",
    "--suffix",
    "--temp-dir",
    "--timeout",
    "--usermap",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arg {
    Long {
        name: String,
        value: Option<String>,
        attached: bool,
    },
    // `letters` ends with the value-taking option when `value` is set
    Short {
        letters: Vec<char>,
        value: Option<String>,
        attached: bool,
    },
    Terminator,
    Positional(String),
}

impl Arg {
    fn render(&self, drop_long: &[&str], drop_short: &[char], out: &mut Vec<String>) {
        match self {
            Arg::Long {
                name,
                value,
                attached,
            } => {
                if drop_long.contains(&name.as_str()) {
                    return;
                }
                match (value, attached) {
                    (Some(value), true) => out.push(format!("{name}={value}")),
                    (Some(value), false) => {
                        out.push(name.clone());
                        out.push(value.clone());
                    }
                    (None, _) => out.push(name.clone()),
                }
            }
            Arg::Short {
                letters,
                value,
                attached,
            } => {
                let kept: String = letters.iter().filter(|c| !drop_short.contains(c)).collect();
                if kept.is_empty() {
                    return;
                }
                match (value, attached) {
                    (Some(value), true) => out.push(format!("-{kept}{value}")),
                    (Some(value), false) => {
                        out.push(format!("-{kept}"));
                        out.push(value.clone());
                    }
                    (None, _) => out.push(format!("-{kept}")),
                }
            }
            Arg::Terminator => out.push("--".to_string()),
            Arg::Positional(text) => out.push(text.clone()),
        }
    }

    fn is_long(&self, wanted: &str) -> bool {
        matches!(self, Arg::Long { name, .. } if name == wanted)
    }

    fn has_short(&self, wanted: char) -> bool {
        matches!(self, Arg::Short { letters, .. } if letters.contains(&wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsyncArgs {
    args: Vec<Arg>,
}

impl RsyncArgs {
    pub fn parse<I, S>(raw: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut raw = raw.into_iter().map(Into::<String>::into);
        let mut args = Vec::new();
        let mut terminated = false;

        while let Some(text) = raw.next() {
            if terminated || text == "-" || !text.starts_with('-') {
                args.push(Arg::Positional(text));
                continue;
            }
            if text == "--" {
                terminated = true;
                args.push(Arg::Terminator);
                continue;
            }

            if text.starts_with("--") {
                let (name, value) = match text.split_once('=') {
                    Some((name, value)) => (name.to_string(), Some(value.to_string())),
                    None => (text.clone(), None),
                };
                if UNSUPPORTED_LONG.contains(&name.as_str()) {
                    return Err(ArgsError::UnsupportedOption(name));
                }
                let attached = value.is_some();
                let value = if value.is_none() && LONG_WITH_VALUE.contains(&name.as_str()) {
                    raw.next()
                } else {
                    value
                };
                args.push(Arg::Long {
                    name,
                    value,
                    attached,
                });
                continue;
            }

            let mut letters = Vec::new();
            let mut value = None;
            let mut attached = false;
            for (idx, letter) in text.char_indices().skip(1) {
                if UNSUPPORTED_SHORT.contains(&letter) {
                    return Err(ArgsError::UnsupportedOption(format!("-{letter}")));
                }
                letters.push(letter);
                if SHORT_WITH_VALUE.contains(&letter) {
                    let rest = &text[idx + letter.len_utf8()..];
                    if rest.is_empty() {
                        value = raw.next();
                    } else {
                        value = Some(rest.to_string());
                        attached = true;
                    }
                    break;
                }
            }
            args.push(Arg::Short {
                letters,
                value,
                attached,
            });
        }

        if !args.iter().any(|arg| matches!(arg, Arg::Positional(_))) {
            return Err(ArgsError::MissingLocations);
        }
        Ok(Self { args })
    }

    pub fn checksum_preferred(&self) -> bool {
        self.args
            .iter()
            .any(|arg| arg.is_long("--checksum") || arg.has_short('c'))
    }

    pub fn user_dry_run(&self) -> bool {
        self.args
            .iter()
            .any(|arg| arg.is_long("--dry-run") || arg.has_short('n'))
    }

    pub fn preview_args(&self, format: &ReportFormat) -> Vec<String> {
        let mut out = self.render(&PREVIEW_ONLY_LONG, &PREVIEW_ONLY_SHORT);
        // options must stay ahead of a `--` terminator
        let at = self
            .args
            .iter()
            .position(|arg| *arg == Arg::Terminator)
            .and_then(|_| out.iter().position(|a| a == "--"))
            .unwrap_or(out.len());
        out.splice(
            at..at,
            [
                "--dry-run".to_string(),
                format!("--out-format={}", format.out_format()),
            ],
        );
        out
    }

    pub fn transfer_args(&self, mode: TransferMode) -> Vec<String> {
        if mode.is_checksum() {
            self.render(&["--checksum"], &['c'])
        } else {
            self.render(&[], &[])
        }
    }

    fn render(&self, drop_long: &[&str], drop_short: &[char]) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len() + 2);
        for arg in &self.args {
            arg.render(drop_long, drop_short, &mut out);
        }
        out
    }
}
