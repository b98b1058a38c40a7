use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::change::Decision;
use crate::config::Settings;
use crate::decisions::{ChangeList, DecisionCounts};
use crate::logging::{TransferRecord, now_timestamp, record_transfer};
use crate::mode::{ModeRequest, TransferMode, select_mode};
use crate::report::ReportParser;
use crate::rsync_args::RsyncArgs;
use crate::rules::RuleSet;
use crate::runner::Executor;
use crate::synth::{Synthesis, Synthesizer};

const PROMPT: &str = "syncere> ";
const MAX_IMPORT_DEPTH: usize = 8;

const HELP: &str = "\
commands:
  list [QUERY]        (ls) list changes
  details [QUERY]     list changes with their attributes
  include [QUERY]     (>) include changes in the transfer
  exclude [QUERY]     (!) exclude changes from the transfer
  reset [QUERY]       (?) mark changes undecided again
  preview             run the preview again, dropping every decision
  rules FILE          load a rule set and apply it
  import FILE         run the commands in FILE, one per line
  transfer [MODE...] [--dry-run] [--view]
                      transfer the included changes
  help                show this help
  quit                (exit) leave without transferring

queries: ids and ranges like '1,3-5' or '*', plus filters
  code= op= perms= owner= group= size= time=
  path= ipath= regex= iregex= glob= iglob=
  repeats of one filter are alternatives, different filters must all match

modes: exclude exclude-from include include-from files-from checksum checksum-from";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    pub modes: Vec<TransferMode>,
    pub dry_run: bool,
    pub view: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionCommand {
    Nothing,
    List(String),
    Details(String),
    Decide(Decision, String),
    Preview,
    Rules(PathBuf),
    Import(PathBuf),
    Transfer(TransferRequest),
    Help,
    Quit,
}

pub struct Session<E, W> {
    settings: Settings,
    args: RsyncArgs,
    parser: ReportParser,
    synth: Synthesizer,
    rules: RuleSet,
    changes: ChangeList,
    executor: E,
    out: W,
    show_prompt: bool,
    exit_code: i32,
}

impl<E: Executor, W: Write> Session<E, W> {
    pub fn new(settings: Settings, args: RsyncArgs, executor: E, out: W) -> Result<Self> {
        let parser = ReportParser::new(&settings.format).context("building the report parser")?;
        let synth = Synthesizer::new(settings.rsync.clone(), settings.list_dir.clone());
        let mut rules = RuleSet::default();
        for path in &settings.rulesets {
            rules.extend(RuleSet::load(path)?);
        }
        Ok(Self {
            settings,
            args,
            parser,
            synth,
            rules,
            changes: ChangeList::default(),
            executor,
            out,
            show_prompt: true,
            exit_code: 0,
        })
    }

    pub fn with_prompt(mut self, show: bool) -> Self {
        self.show_prompt = show;
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[cfg(test)]
    pub fn changes(&self) -> &ChangeList {
        &self.changes
    }

    // `Stop` means there is nothing to decide
    pub fn start(&mut self) -> Result<Flow> {
        let flow = self.preview()?;
        if flow == Flow::Continue {
            writeln!(self.out, "Type 'help' to list available commands")?;
        }
        Ok(flow)
    }

    pub fn run_commands(&mut self, lines: &[String]) -> Result<Flow> {
        for line in lines {
            if self.execute_line(line, 0)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    pub fn prompt<R: BufRead>(&mut self, mut input: R) -> Result<()> {
        loop {
            if self.show_prompt {
                write!(self.out, "{PROMPT}")?;
                self.out.flush()?;
            }
            let mut line = String::new();
            let bytes = input.read_line(&mut line).context("reading command")?;
            if bytes == 0 {
                if self.show_prompt {
                    writeln!(self.out)?;
                }
                break;
            }
            if self.execute_line(&line, 0)? == Flow::Stop {
                break;
            }
        }
        Ok(())
    }

    fn execute_line(&mut self, line: &str, depth: usize) -> Result<Flow> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                writeln!(self.out, "{message}")?;
                return Ok(Flow::Continue);
            }
        };

        match command {
            SessionCommand::Nothing => {}
            SessionCommand::List(query) => self.show(&query, false)?,
            SessionCommand::Details(query) => self.show(&query, true)?,
            SessionCommand::Decide(decision, query) => self.decide(&query, decision)?,
            SessionCommand::Preview => return self.preview(),
            SessionCommand::Rules(path) => self.load_rules(&path)?,
            SessionCommand::Import(path) => return self.import(&path, depth),
            SessionCommand::Transfer(request) => return self.transfer(&request),
            SessionCommand::Help => writeln!(self.out, "{HELP}")?,
            SessionCommand::Quit => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    fn preview(&mut self) -> Result<Flow> {
        let args = self.args.preview_args(&self.settings.format);
        info!(program = %self.settings.rsync, "running preview");
        let captured = self.executor.capture(&self.settings.rsync, &args)?;

        let mut passthrough = Vec::new();
        let parsed = self
            .parser
            .parse(&captured.stdout, |line| passthrough.push(line.to_string()));
        for line in &passthrough {
            writeln!(self.out, "{line}")?;
        }
        let changes = parsed.context("the preview report could not be read")?;

        if !captured.success() {
            warn!(exit_code = ?captured.exit_code, "preview did not succeed");
            writeln!(
                self.out,
                "warning: the preview command {}",
                describe_exit(captured.exit_code)
            )?;
        }

        self.changes.replace(changes);
        if self.changes.is_empty() {
            if !captured.success() {
                self.exit_code = captured.exit_code.unwrap_or(1);
            } else {
                writeln!(self.out, "nothing to do")?;
            }
            return Ok(Flow::Stop);
        }

        info!(changes = self.changes.len(), "preview parsed");
        if !self.rules.is_empty() {
            let decided = self.rules.apply(&mut self.changes);
            writeln!(self.out, "rule sets decided {decided} change(s)")?;
        }
        self.show("", false)?;
        Ok(Flow::Continue)
    }

    fn show(&mut self, query: &str, details: bool) -> Result<()> {
        let selection = match self.changes.select(query) {
            Ok(selection) => selection,
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(());
            }
        };
        if selection.is_empty() {
            writeln!(self.out, "no changes selected")?;
            return Ok(());
        }
        let width = self.changes.id_width();
        for change in self.changes.selected(&selection) {
            writeln!(self.out, "{}", change.summary(width))?;
            if details {
                writeln!(self.out, "{}", change.details(width))?;
            }
        }
        Ok(())
    }

    fn decide(&mut self, query: &str, decision: Decision) -> Result<()> {
        match self.changes.decide_query(query, decision) {
            Ok(selection) if selection.is_empty() => writeln!(self.out, "no changes selected")?,
            Ok(selection) => {
                let verb = match decision {
                    Decision::Included => "included",
                    Decision::Excluded => "excluded",
                    Decision::Undecided => "reset",
                };
                let undecided = self.changes.counts().undecided;
                writeln!(
                    self.out,
                    "{} change(s) {verb}, {undecided} undecided",
                    selection.len()
                )?;
            }
            Err(err) => writeln!(self.out, "{err}")?,
        }
        Ok(())
    }

    fn load_rules(&mut self, path: &Path) -> Result<()> {
        match RuleSet::load(path) {
            Ok(rules) => {
                let decided = rules.apply(&mut self.changes);
                writeln!(
                    self.out,
                    "loaded {} rule(s), {decided} change(s) decided",
                    rules.len()
                )?;
                self.rules.extend(rules);
            }
            Err(err) => writeln!(self.out, "{err:#}")?,
        }
        Ok(())
    }

    fn import(&mut self, path: &Path, depth: usize) -> Result<Flow> {
        if depth >= MAX_IMPORT_DEPTH {
            writeln!(self.out, "imports nested too deeply at {}", path.display())?;
            return Ok(Flow::Continue);
        }
        let script = match fs::read_to_string(path) {
            Ok(script) => script,
            Err(err) => {
                writeln!(self.out, "failed to read {}: {err}", path.display())?;
                return Ok(Flow::Continue);
            }
        };
        for line in script.lines() {
            if self.execute_line(line, depth + 1)? == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    fn transfer(&mut self, request: &TransferRequest) -> Result<Flow> {
        let counts = self.changes.counts();
        let mode_request = ModeRequest {
            included: counts.included,
            excluded: counts.excluded,
            total: counts.total(),
            explicit: request.modes.clone(),
            checksum_preferred: self.args.checksum_preferred(),
            max_inline_filters: self.settings.max_inline_filters,
        };
        let mode = match select_mode(&mode_request) {
            Ok(mode) => mode,
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(Flow::Continue);
            }
        };

        let base = self.args.transfer_args(mode);
        let dry_run = request.dry_run || self.args.user_dry_run();
        let synthesis = match self.synth.build(mode, &self.changes, &base, dry_run) {
            Ok(synthesis) => synthesis,
            Err(err) => {
                writeln!(self.out, "{err}")?;
                return Ok(Flow::Continue);
            }
        };
        writeln!(self.out, "{}", synthesis.command)?;

        if let Some(err) = &synthesis.write_error {
            warn!(error = %err, "list file not written");
            writeln!(self.out, "error: {err}")?;
            if !request.view {
                discard_list_file(synthesis.list_file.as_deref());
                writeln!(self.out, "transfer not started")?;
                return Ok(Flow::Continue);
            }
        }

        if request.view {
            discard_list_file(synthesis.list_file.as_deref());
            self.log_transfer(&synthesis, counts, dry_run, true, None);
            return Ok(Flow::Continue);
        }

        info!(mode = mode.name(), dry_run, "starting transfer");
        let exit_code = match self
            .executor
            .inherit(&synthesis.command.program, &synthesis.command.args)
        {
            Ok(code) => code,
            Err(err) => {
                discard_list_file(synthesis.list_file.as_deref());
                return Err(err.into());
            }
        };
        writeln!(self.out, "rsync {}", describe_exit(exit_code))?;
        self.log_transfer(&synthesis, counts, dry_run, false, exit_code);
        // a failed transfer keeps its list file for inspection
        if let Some(path) = &synthesis.list_file {
            if exit_code == Some(0) && !self.settings.keep_list_files {
                discard_list_file(Some(path.as_path()));
            } else {
                writeln!(self.out, "list file kept at {}", path.display())?;
            }
        }

        if dry_run {
            return Ok(Flow::Continue);
        }
        self.changes.clear();
        self.exit_code = exit_code.unwrap_or(1);
        Ok(Flow::Stop)
    }

    fn log_transfer(
        &self,
        synthesis: &Synthesis,
        counts: DecisionCounts,
        dry_run: bool,
        view_only: bool,
        exit_code: Option<i32>,
    ) {
        let Some(log_path) = &self.settings.transfer_log else {
            return;
        };
        let mut argv = vec![synthesis.command.program.clone()];
        argv.extend(synthesis.command.args.iter().cloned());
        let record = TransferRecord {
            timestamp: now_timestamp(),
            mode: synthesis.mode.name().to_string(),
            included: counts.included,
            excluded: counts.excluded,
            argv,
            dry_run,
            view_only,
            exit_code,
        };
        if let Err(err) = record_transfer(log_path, &record) {
            warn!(error = %err, "could not record transfer");
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

fn discard_list_file(path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "could not remove list file");
        }
    }
}

fn parse_command(input: &str) -> Result<SessionCommand, String> {
    let line = input.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(SessionCommand::Nothing);
    }
    for (symbol, decision) in [
        ('>', Decision::Included),
        ('!', Decision::Excluded),
        ('?', Decision::Undecided),
    ] {
        if let Some(rest) = line.strip_prefix(symbol) {
            return Ok(SessionCommand::Decide(decision, rest.trim().to_string()));
        }
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "list" | "ls" => SessionCommand::List(rest.to_string()),
        "details" => SessionCommand::Details(rest.to_string()),
        "include" => SessionCommand::Decide(Decision::Included, rest.to_string()),
        "exclude" => SessionCommand::Decide(Decision::Excluded, rest.to_string()),
        "reset" => SessionCommand::Decide(Decision::Undecided, rest.to_string()),
        "preview" if rest.is_empty() => SessionCommand::Preview,
        "preview" => return Err("preview takes no arguments".to_string()),
        "rules" => SessionCommand::Rules(required_path("rules", rest)?),
        "import" => SessionCommand::Import(required_path("import", rest)?),
        "transfer" => SessionCommand::Transfer(parse_transfer(rest)?),
        "help" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(format!("unknown command '{other}'; type 'help'")),
    };
    Ok(command)
}

fn required_path(command: &str, rest: &str) -> Result<PathBuf, String> {
    let path = rest.trim_matches(|c: char| c == '"' || c == '\'');
    if path.is_empty() {
        return Err(format!("{command} needs a file name"));
    }
    Ok(PathBuf::from(path))
}

fn parse_transfer(rest: &str) -> Result<TransferRequest, String> {
    let mut request = TransferRequest::default();
    for token in rest.split_whitespace() {
        match token {
            "--dry-run" | "-n" => request.dry_run = true,
            "--view" => request.view = true,
            name => {
                let mode = TransferMode::parse(name)
                    .ok_or_else(|| format!("unknown transfer mode '{name}'"))?;
                request.modes.push(mode);
            }
        }
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use crate::report::ReportFormat;
    use crate::runner::Captured;
    use pretty_assertions::assert_eq;
    use tempfile::{TempDir, tempdir};

    const BLANK_SUM: &str = "                                ";

    #[derive(Default)]
    struct FakeRsync {
        previews: Vec<String>,
        preview_code: Option<i32>,
        transfer_code: Option<i32>,
        spawn_fails: bool,
        captured: Vec<Vec<String>>,
        transfers: Vec<Vec<String>>,
    }

    impl Executor for FakeRsync {
        fn capture(&mut self, _program: &str, args: &[String]) -> Result<Captured, RunError> {
            self.captured.push(args.to_vec());
            let stdout = if self.previews.is_empty() {
                String::new()
            } else {
                self.previews.remove(0)
            };
            Ok(Captured {
                stdout,
                exit_code: self.preview_code.or(Some(0)),
            })
        }

        fn inherit(&mut self, _program: &str, args: &[String]) -> Result<Option<i32>, RunError> {
            self.transfers.push(args.to_vec());
            if self.spawn_fails {
                return Err(RunError::Spawn {
                    program: "rsync".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Ok(self.transfer_code.or(Some(0)))
        }
    }

    fn report(paths: &[&str]) -> String {
        let mut out = String::from("sending incremental file list\n");
        for path in paths {
            out.push_str(&format!(
                "[syncere]>f+++++++++ send rw-r--r-- 1000 1000 3///2016/01/02-03:04:05///src/{path}///{path}//////{BLANK_SUM}\n"
            ));
        }
        out
    }

    fn settings(dir: &TempDir) -> Settings {
        Settings {
            rsync: "rsync".into(),
            max_inline_filters: 20,
            list_dir: dir.path().to_path_buf(),
            keep_list_files: false,
            format: ReportFormat::default(),
            rulesets: Vec::new(),
            transfer_log: Some(dir.path().join("log.jsonl")),
        }
    }

    fn session(dir: &TempDir, previews: Vec<String>) -> Session<FakeRsync, Vec<u8>> {
        let args = RsyncArgs::parse(["-a", "src/", "dst/"]).unwrap();
        let fake = FakeRsync {
            previews,
            ..FakeRsync::default()
        };
        Session::new(settings(dir), args, fake, Vec::new()).unwrap()
    }

    fn output(session: &Session<FakeRsync, Vec<u8>>) -> String {
        String::from_utf8_lossy(&session.out).into_owned()
    }

    fn commands(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn decide_then_transfer_clears_list() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a", "b", "c"])]);
        assert_eq!(session.start().unwrap(), Flow::Continue);

        let flow = session
            .run_commands(&commands(&["> 1-2", "exclude path=c", "transfer"]))
            .unwrap();
        assert_eq!(flow, Flow::Stop);
        assert_eq!(
            session.executor.transfers,
            vec![commands(&["--exclude", "c", "-a", "src/", "dst/"])]
        );
        assert!(session.changes().is_empty());
        assert_eq!(session.exit_code(), 0);

        let preview = &session.executor.captured[0];
        assert!(preview.contains(&"--dry-run".to_string()));
        assert!(output(&session).contains("sending incremental file list"));
        assert!(output(&session).contains("1 ? >f+++++++++ a"));

        let log = crate::logging::read_tail(&dir.path().join("log.jsonl"), 5).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].mode, "exclude");
        assert_eq!(log[0].exit_code, Some(0));
    }

    #[test]
    fn empty_preview_has_nothing_to_do() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&[])]);
        assert_eq!(session.start().unwrap(), Flow::Stop);
        assert!(output(&session).contains("nothing to do"));
        assert_eq!(session.exit_code(), 0);
    }

    #[test]
    fn malformed_preview_aborts() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec!["[syncere]broken\n".into()]);
        let err = session.start().unwrap_err();
        assert!(format!("{err:#}").contains("malformed report line 1"));
    }

    #[test]
    fn transfer_refused_while_undecided() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a", "b"])]);
        session.start().unwrap();
        let flow = session
            .run_commands(&commands(&["> 1", "transfer"]))
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert!(session.executor.transfers.is_empty());
        assert!(output(&session).contains("there are still 1 undecided change(s)"));
    }

    #[test]
    fn view_and_dry_run_keep_decisions() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a", "b"])]);
        session.start().unwrap();
        session
            .run_commands(&commands(&["> *", "transfer include-from --view"]))
            .unwrap();
        assert!(session.executor.transfers.is_empty());
        assert!(output(&session).contains("--include-from"));
        let list_file = session.synth.list_file_path(TransferMode::IncludeFromFile);
        assert!(!list_file.exists());

        let flow = session
            .run_commands(&commands(&["transfer --dry-run"]))
            .unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            session.executor.transfers,
            vec![commands(&["-a", "src/", "dst/", "--dry-run"])]
        );
        assert_eq!(session.changes().counts().included, 2);
    }

    #[test]
    fn failing_transfer_sets_exit_code() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a"])]);
        session.executor.transfer_code = Some(23);
        session.start().unwrap();
        session.run_commands(&commands(&["> 1", "transfer"])).unwrap();
        assert_eq!(session.exit_code(), 23);
        assert!(output(&session).contains("rsync exited with code 23"));
    }

    #[test]
    fn list_file_outlives_only_a_failed_transfer() {
        let dir = tempdir().unwrap();
        let run = |transfer_code| {
            let mut session = session(&dir, vec![report(&["a", "b"])]);
            session.executor.transfer_code = transfer_code;
            session.start().unwrap();
            session
                .run_commands(&commands(&["> 1", "! 2", "transfer exclude-from"]))
                .unwrap();
            let list_file = session.synth.list_file_path(TransferMode::ExcludeFromFile);
            (list_file.exists(), output(&session))
        };

        let (kept, out) = run(Some(23));
        assert!(kept);
        assert!(out.contains("list file kept at"));

        let (kept, out) = run(Some(0));
        assert!(!kept);
        assert!(!out.contains("list file kept at"));
    }

    #[test]
    fn spawn_failure_removes_list_file() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a", "b"])]);
        session.executor.spawn_fails = true;
        session.start().unwrap();
        let err = session
            .run_commands(&commands(&["> *", "transfer include-from"]))
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to run rsync"));
        assert!(!session.synth.list_file_path(TransferMode::IncludeFromFile).exists());
    }

    #[test]
    fn reports_selection_problems() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a", "b"])]);
        session.start().unwrap();
        session
            .run_commands(&commands(&["list 7", "ls regex=(", "details size=9", "frobnicate"]))
            .unwrap();
        let out = output(&session);
        assert!(out.contains("bad selection '7'"));
        assert!(out.contains("bad filter syntax 'regex=('"));
        assert!(out.contains("no changes selected"));
        assert!(out.contains("unknown command 'frobnicate'"));
    }

    #[test]
    fn preview_again_discards_decisions() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a", "b"]), report(&["c"])]);
        session.start().unwrap();
        session.run_commands(&commands(&["! *", "preview"])).unwrap();
        assert_eq!(session.changes().len(), 1);
        assert_eq!(session.changes().counts().undecided, 1);
        assert_eq!(session.changes().changes()[0].short_path, "c");
    }

    #[test]
    fn rules_and_imports() {
        let dir = tempdir().unwrap();
        let rules = dir.path().join("keep.rules");
        fs::write(&rules, "> >f+++++++++ g:*\n! >f+++++++++ p:b\n").unwrap();
        let script = dir.path().join("script.txt");
        fs::write(
            &script,
            format!("# decide\nrules {}\ntransfer\n", rules.display()),
        )
        .unwrap();

        let mut session = session(&dir, vec![report(&["a", "b"])]);
        session.start().unwrap();
        let flow = session
            .run_commands(&[format!("import {}", script.display())])
            .unwrap();
        assert_eq!(flow, Flow::Stop);
        assert_eq!(
            session.executor.transfers,
            vec![commands(&["--exclude", "b", "-a", "src/", "dst/"])]
        );
    }

    #[test]
    fn prompt_stops_at_end_of_input() {
        let dir = tempdir().unwrap();
        let mut session = session(&dir, vec![report(&["a"])]);
        session.start().unwrap();
        session.prompt("help\n> 1\n".as_bytes()).unwrap();
        let out = output(&session);
        assert!(out.contains("commands:"));
        assert!(out.contains("1 change(s) included, 0 undecided"));
        assert!(session.executor.transfers.is_empty());
    }

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command(">1-3 glob=*.txt"),
            Ok(SessionCommand::Decide(Decision::Included, "1-3 glob=*.txt".into()))
        );
        assert_eq!(
            parse_command("  reset  "),
            Ok(SessionCommand::Decide(Decision::Undecided, String::new()))
        );
        assert_eq!(parse_command("# note"), Ok(SessionCommand::Nothing));
        assert_eq!(parse_command("EXIT"), Ok(SessionCommand::Quit));
        assert_eq!(
            parse_command("transfer files-from -n"),
            Ok(SessionCommand::Transfer(TransferRequest {
                modes: vec![TransferMode::FilesFromFile],
                dry_run: true,
                view: false,
            }))
        );
        assert!(parse_command("transfer sideways").is_err());
        assert!(parse_command("rules").is_err());
        assert!(parse_command("preview now").is_err());
    }
}
