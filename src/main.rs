use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use is_terminal::IsTerminal;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

mod change;
mod config;
mod decisions;
mod error;
mod logging;
mod mode;
mod report;
mod rsync_args;
mod rules;
mod runner;
mod selection;
mod session;
mod synth;

use config::{Overrides, Settings};
use rsync_args::RsyncArgs;
use runner::SystemExecutor;
use session::{Flow, Session};

#[derive(Debug, Parser)]
#[command(
    name = "syncere",
    version,
    about = "Interactive rsync: review every pending change before it happens"
)]
struct Cli {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(long, value_name = "PATH", global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Run(RunCommand),
    Log(LogCommand),
}

#[derive(Debug, Args)]
struct RunCommand {
    #[arg(long, value_name = "PROGRAM")]
    rsync: Option<String>,
    #[arg(long = "max-inline-filters", value_name = "N")]
    max_inline_filters: Option<usize>,
    #[arg(long = "list-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    list_dir: Option<PathBuf>,
    #[arg(long = "keep-list-files", action = ArgAction::SetTrue)]
    keep_list_files: bool,
    #[arg(long = "ruleset", value_name = "FILE", value_hint = ValueHint::FilePath)]
    rulesets: Vec<PathBuf>,
    #[arg(long = "transfer-log", value_name = "PATH", value_hint = ValueHint::FilePath)]
    transfer_log: Option<PathBuf>,
    #[arg(long = "no-transfer-log", action = ArgAction::SetTrue)]
    no_transfer_log: bool,
    #[arg(long = "command", value_name = "CMD")]
    commands: Vec<String>,
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    script: Option<PathBuf>,
    #[arg(long, action = ArgAction::SetTrue)]
    batch: bool,
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "RSYNC_ARGS"
    )]
    rsync_args: Vec<String>,
}

impl RunCommand {
    fn overrides(&self) -> Overrides {
        Overrides {
            rsync: self.rsync.clone(),
            max_inline_filters: self.max_inline_filters,
            list_dir: self.list_dir.clone(),
            keep_list_files: self.keep_list_files,
            rulesets: self.rulesets.clone(),
            transfer_log: self.transfer_log.clone(),
            no_transfer_log: self.no_transfer_log,
        }
    }
}

#[derive(Debug, Args)]
struct LogCommand {
    #[arg(long = "tail", default_value_t = 20)]
    tail: usize,
    #[arg(long = "since", value_name = "RFC3339")]
    since: Option<String>,
    #[arg(long = "file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let code = run(cli)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let directive = match verbose {
        0 => "syncere=warn",
        1 => "syncere=info",
        _ => "syncere=debug",
    };
    let filter = match directive.parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run(cmd) => handle_run(cmd, config_path),
        Command::Log(cmd) => handle_log(cmd, config_path).map(|()| 0),
    }
}

fn handle_run(cmd: RunCommand, config_path: Option<&Path>) -> Result<i32> {
    let file = config::resolve_config(config_path)?;
    let settings = Settings::merge(file, cmd.overrides())?;
    debug!(?settings, "resolved settings");
    let args = RsyncArgs::parse(cmd.rsync_args.iter().cloned())
        .context("cannot run this rsync command interactively")?;

    let mut lines = cmd.commands.clone();
    if let Some(script) = &cmd.script {
        let text = fs::read_to_string(script)
            .with_context(|| format!("reading script {}", script.display()))?;
        lines.extend(text.lines().map(str::to_string));
    }

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut session =
        Session::new(settings, args, SystemExecutor, io::stdout().lock())?.with_prompt(interactive);

    if session.start()? == Flow::Stop {
        return Ok(session.exit_code());
    }
    if session.run_commands(&lines)? == Flow::Stop {
        return Ok(session.exit_code());
    }
    if !cmd.batch {
        session.prompt(stdin.lock())?;
    }
    Ok(session.exit_code())
}

fn handle_log(cmd: LogCommand, config_path: Option<&Path>) -> Result<()> {
    let file = config::resolve_config(config_path)?;
    let overrides = Overrides {
        transfer_log: cmd.file,
        ..Overrides::default()
    };
    let Some(log_path) = Settings::merge(file, overrides)?.transfer_log else {
        println!("transfer logging is disabled.");
        return Ok(());
    };

    let since = match cmd.since.as_deref() {
        Some(raw) => Some(
            OffsetDateTime::parse(raw, &Rfc3339)
                .with_context(|| format!("parsing --since '{raw}' as RFC3339 timestamp"))?,
        ),
        None => None,
    };

    let mut entries = logging::read_tail(&log_path, usize::MAX)?;
    if let Some(min) = since {
        entries.retain(|entry| {
            OffsetDateTime::parse(&entry.timestamp, &Rfc3339).is_ok_and(|ts| ts >= min)
        });
    }
    let start = entries.len().saturating_sub(cmd.tail);
    let entries = &entries[start..];

    if entries.is_empty() {
        println!("transfer log is empty.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.summary());
    }
    Ok(())
}
