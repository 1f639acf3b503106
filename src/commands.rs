//! Command surface
//!
//! The two commands a chat integration exposes, `status` and `add-server`,
//! plus the line syntax the bot accepts on stdin. Both the HTTP API and the
//! stdin loop dispatch through [`CommandHandler`].

use std::fmt;

use tracing::{debug, instrument};

use crate::monitors::Monitor;
use crate::registry::{Target, TargetId, ValidationError};
use crate::report::{ReportBuilder, StatusReport};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sweep every server, then report
    Status,

    /// Register a server
    AddServer { name: String, endpoint: String },

    /// Report last-known state without probing
    List,

    Help,
}

/// Why a command line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    MissingArguments(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::Unknown(cmd) => write!(f, "unknown command '{cmd}' (try 'help')"),
            ParseError::MissingArguments(usage) => {
                write!(f, "Missing required parameters, usage: {usage}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

pub const ADD_SERVER_USAGE: &str = "add-server <name> <url>";

pub const HELP: &str = "commands:
  status                   check every server and print a report
  add-server <name> <url>  monitor a new server (e.g. add-server web http://web:4120)
  list                     print last known state without checking
  help                     show this message";

impl Command {
    /// Parse one input line
    ///
    /// The URL is the last word of `add-server`; everything between the
    /// command and the URL is the name, so names may contain spaces.
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        match command.to_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "status" => Ok(Command::Status),
            "list" => Ok(Command::List),
            "help" => Ok(Command::Help),
            "add-server" => {
                let Some((name, endpoint)) = rest.rsplit_once(char::is_whitespace) else {
                    return Err(ParseError::MissingArguments(ADD_SERVER_USAGE));
                };
                Ok(Command::AddServer {
                    name: name.trim().to_string(),
                    endpoint: endpoint.to_string(),
                })
            }
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Result of a successfully executed command
#[derive(Debug, Clone)]
pub enum CommandReply {
    Report(StatusReport),
    Added(Target),
    Help(&'static str),
}

/// Executes commands against the monitor
#[derive(Clone)]
pub struct CommandHandler {
    monitor: Monitor,
    reports: ReportBuilder,
}

impl CommandHandler {
    pub fn new(monitor: Monitor, reports: ReportBuilder) -> Self {
        Self { monitor, reports }
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    /// `status`: full awaited sweep, then a fresh report
    #[instrument(skip(self))]
    pub async fn status(&self) -> StatusReport {
        self.monitor.sweep().await;
        self.snapshot().await
    }

    /// Report on last-known state without probing
    pub async fn snapshot(&self) -> StatusReport {
        let targets = self.monitor.registry().list().await;
        self.reports.build(&targets)
    }

    /// `add-server`: register, then check the new server in the background
    #[instrument(skip(self))]
    pub async fn add_server(&self, name: &str, endpoint: &str) -> Result<Target, ValidationError> {
        let (id, target) = self.monitor.registry().add(name, endpoint).await?;
        self.spawn_check(id);
        Ok(target)
    }

    fn spawn_check(&self, id: TargetId) {
        let monitor = self.monitor.clone();
        tokio::spawn(async move {
            if let Some(target) = monitor.check(id).await {
                debug!("initial check of {}: {}", target.name, target.health.state());
            }
        });
    }

    pub async fn execute(&self, command: Command) -> Result<CommandReply, ValidationError> {
        match command {
            Command::Status => Ok(CommandReply::Report(self.status().await)),
            Command::List => Ok(CommandReply::Report(self.snapshot().await)),
            Command::AddServer { name, endpoint } => {
                self.add_server(&name, &endpoint).await.map(CommandReply::Added)
            }
            Command::Help => Ok(CommandReply::Help(HELP)),
        }
    }
}
