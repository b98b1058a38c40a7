use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::decisions::ChangeList;
use crate::error::{ListFileWriteFailed, TransferError};
use crate::mode::{self, TransferMode};

const EXCLUDE_ALL: [&str; 2] = ["--exclude", "*"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for TransferCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[derive(Debug)]
pub struct Synthesis {
    pub mode: TransferMode,
    pub command: TransferCommand,
    pub list_file: Option<PathBuf>,
    // `command` still references the list file
    pub write_error: Option<ListFileWriteFailed>,
}

#[derive(Debug, Clone)]
pub struct Synthesizer {
    program: String,
    list_dir: PathBuf,
}

impl Synthesizer {
    pub fn new(program: impl Into<String>, list_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            list_dir: list_dir.into(),
        }
    }

    pub fn list_file_path(&self, mode: TransferMode) -> PathBuf {
        self.list_dir
            .join(format!("syncere-{}.{}", std::process::id(), mode.name()))
    }

    pub fn build(
        &self,
        mode: TransferMode,
        changes: &ChangeList,
        base: &[String],
        dry_run: bool,
    ) -> Result<Synthesis, TransferError> {
        let counts = changes.counts();
        mode::check_decisions(counts.included, counts.excluded, counts.total())?;

        let paths: Vec<&str> = if mode.lists_excluded() {
            changes.excluded().map(|c| c.short_path.as_str()).collect()
        } else {
            changes.included().map(|c| c.short_path.as_str()).collect()
        };

        let mut args = Vec::new();
        let mut list_file = None;
        let mut write_error = None;

        if mode.uses_list_file() {
            let path = self.list_file_path(mode);
            if let Err(err) = write_list_file(&path, &paths) {
                write_error = Some(err);
            }
            let flag = match mode {
                TransferMode::ExcludeFromFile => "--exclude-from",
                TransferMode::FilesFromFile => "--files-from",
                _ => "--include-from",
            };
            args.push(flag.to_string());
            args.push(path.display().to_string());
            list_file = Some(path);
        } else {
            let flag = if mode.lists_excluded() {
                "--exclude"
            } else {
                "--include"
            };
            for path in &paths {
                args.push(flag.to_string());
                args.push(path.to_string());
            }
        }

        if !mode.lists_excluded() && mode != TransferMode::FilesFromFile {
            args.extend(EXCLUDE_ALL.map(String::from));
        }

        // rsync stops at the first matching filter, so ours go before the user's
        args.extend(base.iter().cloned());
        if dry_run {
            args.push("--dry-run".to_string());
        }
        if mode.is_checksum() {
            args.push("--ignore-times".to_string());
        }

        debug!(mode = mode.name(), listed = paths.len(), "synthesized transfer command");
        Ok(Synthesis {
            mode,
            command: TransferCommand {
                program: self.program.clone(),
                args,
            },
            list_file,
            write_error,
        })
    }
}

pub fn write_list_file(path: &Path, paths: &[&str]) -> Result<(), ListFileWriteFailed> {
    let wrap = |source| ListFileWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    // unlink instead of truncating so a planted symlink is never followed
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(wrap(err)),
    }
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(wrap)?;
    let mut writer = BufWriter::new(file);
    for entry in paths {
        writeln!(writer, "{entry}").map_err(wrap)?;
    }
    writer.flush().map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::{Decision, sample};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn decided(included: &[&str], excluded: &[&str]) -> ChangeList {
        let mut changes = Vec::new();
        for path in included.iter().chain(excluded) {
            changes.push(sample(changes.len() + 1, ">f+++++++++", path));
        }
        let mut list = ChangeList::new(changes);
        for change in list.changes_mut() {
            if included.contains(&change.short_path.as_str()) {
                change.include();
            } else {
                change.exclude();
            }
        }
        list
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn base() -> Vec<String> {
        strings(&["-a", "src/", "dst/"])
    }

    #[test]
    fn inline_exclude_prepends_pairs() {
        let synth = Synthesizer::new("rsync", "/tmp");
        let out = synth
            .build(TransferMode::InlineExclude, &decided(&["a"], &["b", "c d"]), &base(), false)
            .unwrap();
        assert_eq!(
            out.command.args,
            strings(&["--exclude", "b", "--exclude", "c d", "-a", "src/", "dst/"])
        );
        assert!(out.list_file.is_none());
        assert_eq!(out.command.to_string(), "rsync --exclude b --exclude 'c d' -a src/ dst/");
    }

    #[test]
    fn inline_include_ends_with_exclude_all() {
        let synth = Synthesizer::new("rsync", "/tmp");
        let out = synth
            .build(TransferMode::InlineInclude, &decided(&["a", "b"], &["c"]), &base(), true)
            .unwrap();
        assert_eq!(
            out.command.args,
            strings(&[
                "--include", "a", "--include", "b", "--exclude", "*", "-a", "src/", "dst/",
                "--dry-run"
            ])
        );
    }

    #[test]
    fn checksum_modes_end_with_ignore_times() {
        let dir = tempdir().unwrap();
        let synth = Synthesizer::new("rsync", dir.path());
        let list = decided(&["a"], &["b"]);

        let inline = synth
            .build(TransferMode::InlineChecksum, &list, &base(), true)
            .unwrap();
        assert_eq!(inline.command.args.last().map(String::as_str), Some("--ignore-times"));
        assert_eq!(inline.command.args[..4].to_vec(), strings(&["--include", "a", "--exclude", "*"]));

        let from_file = synth
            .build(TransferMode::ChecksumFromFile, &list, &base(), false)
            .unwrap();
        let path = from_file.list_file.clone().unwrap();
        let shown = path.display().to_string();
        assert_eq!(
            from_file.command.args,
            strings(&[
                "--include-from",
                shown.as_str(),
                "--exclude",
                "*",
                "-a",
                "src/",
                "dst/",
                "--ignore-times"
            ])
        );
        assert_eq!(fs::read_to_string(path).unwrap(), "a\n");
    }

    #[test]
    fn files_from_has_no_exclude_all() {
        let dir = tempdir().unwrap();
        let synth = Synthesizer::new("rsync", dir.path());
        let out = synth
            .build(TransferMode::FilesFromFile, &decided(&["x", "y"], &[]), &base(), false)
            .unwrap();
        let path = out.list_file.unwrap();
        assert_eq!(out.command.args[0], "--files-from");
        assert!(!out.command.args.contains(&"*".to_string()));
        assert_eq!(fs::read_to_string(path).unwrap(), "x\ny\n");
    }

    #[test]
    fn exclude_list_file_is_truncated_on_every_write() {
        let dir = tempdir().unwrap();
        let synth = Synthesizer::new("rsync", dir.path());

        let first = synth
            .build(
                TransferMode::ExcludeFromFile,
                &decided(&["keep"], &["a/b.txt", "c.txt"]),
                &base(),
                false,
            )
            .unwrap();
        let path = first.list_file.unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a/b.txt\nc.txt\n");

        synth
            .build(TransferMode::ExcludeFromFile, &decided(&["keep"], &["z"]), &base(), false)
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "z\n");
    }

    #[cfg(unix)]
    #[test]
    fn planted_symlink_is_replaced_not_followed() {
        let dir = tempdir().unwrap();
        let victim = dir.path().join("victim.txt");
        fs::write(&victim, "precious\n").unwrap();
        let synth = Synthesizer::new("rsync", dir.path());
        let path = synth.list_file_path(TransferMode::ExcludeFromFile);
        std::os::unix::fs::symlink(&victim, &path).unwrap();

        let out = synth
            .build(TransferMode::ExcludeFromFile, &decided(&["a"], &["b"]), &base(), false)
            .unwrap();
        assert!(out.write_error.is_none());
        assert_eq!(fs::read_to_string(&victim).unwrap(), "precious\n");
        assert!(!fs::symlink_metadata(&path).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&path).unwrap(), "b\n");
    }

    #[test]
    fn write_failure_still_returns_command() {
        let dir = tempdir().unwrap();
        let synth = Synthesizer::new("rsync", dir.path().join("missing"));
        let out = synth
            .build(TransferMode::IncludeFromFile, &decided(&["a"], &["b"]), &base(), false)
            .unwrap();
        let err = out.write_error.unwrap();
        assert_eq!(Some(err.path.as_path()), out.list_file.as_deref());
        assert_eq!(out.command.args[0], "--include-from");
    }

    #[test]
    fn refuses_undecided_and_all_excluded() {
        let synth = Synthesizer::new("rsync", "/tmp");
        let mut list = decided(&["a"], &["b"]);
        list.decide_query("1", Decision::Undecided).unwrap();
        assert_eq!(
            synth
                .build(TransferMode::InlineExclude, &list, &base(), false)
                .unwrap_err(),
            TransferError::UndecidedChangesRemain { undecided: 1 }
        );

        let none = decided(&[], &["a", "b"]);
        assert_eq!(
            synth
                .build(TransferMode::InlineExclude, &none, &base(), false)
                .unwrap_err(),
            TransferError::NothingIncluded
        );
    }
}
