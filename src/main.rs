//! marksect: edit marked sections of a telephony server configuration file.
#![allow(clippy::multiple_crate_versions)]

use chrono::Utc;
use clap::{Parser, Subcommand};
use marksect::config::Config;
use marksect::edit_plan::EditPlan;
use marksect::logs::{section_logs, LogFollower, LogTail, Subscriptions};
use marksect::monitor::{ManagerEvent, MonitorState, RelayEvent};
use marksect::reload::{ReloadOutcome, Reloader};
use marksect::{Error, Section, SectionFile};
use serde_json::{json, Value};
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "marksect")]
#[command(about = "Edit marked sections of a PJSIP configuration file", long_about = None)]
struct Args {
    /// Configuration file to edit (overrides marksect.toml and PJSIP_CONFIG)
    #[arg(long, short = 'f', value_name = "PATH", global = true)]
    file: Option<PathBuf>,

    /// Do not reload the telephony service after a change
    #[arg(long, global = true)]
    no_reload: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every section
    List,
    /// Show one section
    Get {
        /// Section name
        name: String,
    },
    /// Append a new section
    Create {
        /// Section name
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Replace the body of a section
    Replace {
        /// Section name
        name: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Delete a section
    Delete {
        /// Section name
        name: String,
    },
    /// Report sentinel lines that cannot be paired
    Check,
    /// Apply an edit plan from a JSON file
    Apply {
        /// Plan file
        plan: PathBuf,
    },
    /// Print log lines that mention a section
    Logs {
        /// Section name
        section: String,

        /// Keep following the log and print new lines as they arrive
        #[arg(long)]
        follow: bool,

        /// Log file to read (overrides marksect.toml and LOG_FILE)
        #[arg(long, value_name = "PATH")]
        log_file: Option<PathBuf>,

        /// How long to gather change events before reading the log
        #[arg(long, value_name = "MS", default_value_t = 100)]
        debounce_ms: u64,
    },
    /// Turn manager events (JSON lines on stdin) into endpoint status events
    Monitor,
}

#[derive(clap::Args)]
struct BodyArgs {
    /// Body text
    #[arg(long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the body from a file, or `-` for stdin
    #[arg(long, value_name = "PATH")]
    body_file: Option<PathBuf>,
}

impl BodyArgs {
    fn read(self) -> Result<String, Error> {
        let text = match (self.body, self.body_file) {
            (Some(body), _) => return Ok(body),
            (None, Some(path)) if path == Path::new("-") => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .map_err(|e| Error::io("reading body", "<stdin>", e))?;
                text
            }
            (None, Some(path)) => {
                std::fs::read_to_string(&path).map_err(|e| Error::io("reading body", &path, e))?
            }
            (None, None) => return Err(Error::MissingField { field: "content" }),
        };
        Ok(text.strip_suffix('\n').unwrap_or(&text).to_string())
    }
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(output) => {
            println!("{output:#}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "command failed");
            println!("{:#}", json!({ "success": false, "error": e.to_string() }));
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marksect=info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn exit_code(e: &Error) -> u8 {
    match e.status_code() {
        400 => 3,
        404 => 4,
        _ => 5,
    }
}

fn run(args: Args) -> Result<Value, Error> {
    let cfg = Config::load()?;
    let mut file = SectionFile::new(args.file.unwrap_or_else(|| cfg.config_file.clone().into()));
    let reloader = if args.no_reload || !cfg.reload {
        Reloader::disabled()
    } else {
        Reloader::new(cfg.reload_command.clone())
    };

    match args.command {
        Command::List => {
            let sections: Vec<Value> = file.list()?.iter().map(section_json).collect();
            Ok(json!({ "success": true, "sections": sections }))
        }
        Command::Get { name } => {
            let section = file.get(&name)?;
            Ok(json!({ "success": true, "section": section_json(&section) }))
        }
        Command::Create { name, body } => {
            let body = body.read()?;
            file.create(&name, &body)?;
            Ok(mutation_json("Section created successfully", &reloader))
        }
        Command::Replace { name, body } => {
            let body = body.read()?;
            file.replace(&name, &body)?;
            Ok(mutation_json("Section updated successfully", &reloader))
        }
        Command::Delete { name } => {
            file.delete(&name)?;
            Ok(mutation_json("Section deleted successfully", &reloader))
        }
        Command::Check => {
            let scan = file.inspect()?;
            for malformation in &scan.malformations {
                warn!(%malformation, path = %file.path().display(), "unpaired sentinel");
            }
            match scan.malformations.into_iter().next() {
                Some(first) => Err(Error::Malformed(first)),
                None => Ok(json!({ "success": true, "sections": scan.sections.len() })),
            }
        }
        Command::Apply { plan } => {
            let written = EditPlan::load(&plan)?.apply()?;
            let reloaded = if written.is_empty() {
                false
            } else {
                reloader.trigger() == ReloadOutcome::Reloaded
            };
            let files: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
            Ok(json!({ "success": true, "files": files, "reloaded": reloaded }))
        }
        Command::Logs {
            section,
            follow,
            log_file,
            debounce_ms,
        } => {
            let log_file = log_file.unwrap_or_else(|| cfg.log_file.clone().into());
            if follow {
                follow_logs(&log_file, &section, Duration::from_millis(debounce_ms))
            } else {
                let contents = std::fs::read_to_string(&log_file)
                    .map_err(|e| Error::io("reading", &log_file, e))?;
                let logs = section_logs(contents.lines(), &section);
                Ok(json!({ "success": true, "logs": logs }))
            }
        }
        Command::Monitor => monitor_stdin(),
    }
}

fn section_json(section: &Section) -> Value {
    json!({
        "name": section.name,
        "content": section.body_text(),
        "startLine": section.start_line,
        "endLine": section.end_line,
    })
}

fn mutation_json(message: &str, reloader: &Reloader) -> Value {
    let reloaded = reloader.trigger() == ReloadOutcome::Reloaded;
    json!({ "success": true, "message": message, "reloaded": reloaded })
}

fn emit(event: &RelayEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "could not encode relay event"),
    }
}

fn follow_logs(path: &Path, section: &str, debounce: Duration) -> Result<Value, Error> {
    const CLIENT: &str = "stdout";

    let mut follower = LogFollower::new(LogTail::open(path)?, debounce)?;
    let mut subscriptions = Subscriptions::new();
    if !subscriptions.subscribe(CLIENT, section) {
        return Err(Error::MissingField { field: "section" });
    }

    loop {
        for line in follower.wait(None)? {
            for (_, event) in subscriptions.route(&line) {
                emit(&event);
            }
        }
    }
}

fn monitor_stdin() -> Result<Value, Error> {
    let mut state = MonitorState::new(Utc::now());

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| Error::io("reading events", "<stdin>", e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ManagerEvent>(&line) {
            Ok(event) => {
                if let Some(relay) = state.apply(event, Utc::now()) {
                    emit(&relay);
                }
            }
            Err(e) => warn!(error = %e, "ignoring undecodable manager event"),
        }
    }

    Ok(json!({ "success": true, "status": state.snapshot() }))
}
