use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "doorguard", about = "Read and toggle door/window relay devices")]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show status of all devices
    Status,
    /// Toggle all devices
    All,
    /// Toggle a specific device
    Toggle {
        /// Device identifier, any case
        device: String,
    },
    /// Monitor all devices and stream changes
    Watch,
}

/// What the operator asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Command),
    Usage,
    Invalid,
}

impl Invocation {
    /// Parse a full argument list, program name first. Command names are
    /// matched case-insensitively, extra trailing arguments are ignored and
    /// parse failures never exit the process.
    pub fn parse<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();

        if let Some(command) = args.get_mut(1) {
            *command = command.to_lowercase();
        }

        // Only `toggle` takes an operand; anything past it is dropped
        let keep = if args.get(1).is_some_and(|command| command == "toggle") { 3 } else { 2 };
        args.truncate(keep);

        match Cli::try_parse_from(args) {
            Ok(Cli {
                command: Some(command),
            }) => Invocation::Run(command),
            Ok(Cli { command: None }) => Invocation::Usage,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                Invocation::Usage
            }
            Err(e) => {
                tracing::debug!("unrecognized arguments: {:?}", e.kind());
                Invocation::Invalid
            }
        }
    }
}
