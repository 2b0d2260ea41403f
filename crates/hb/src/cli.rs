use std::ffi::OsString;

use clap::{error::ErrorKind, Parser, ValueEnum};

pub const USAGE: &str =
    "You must specify a single command, either 'post_message' or 'reply_to_mentions'";

#[derive(Debug, Parser)]
#[command(name = "hb")]
#[command(about = "Posts compliments and replies to mentions", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// What to do on this run
    #[arg(value_enum)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Command {
    /// Post one compliment to the timeline
    #[value(name = "post_message")]
    PostMessage,
    /// Reply to every mention since the last run
    #[value(name = "reply_to_mentions")]
    ReplyToMentions,
}

/// Why the command line was refused. Each variant has its own exit status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UsageError {
    WrongArgCount(usize),
    UnknownCommand(String),
}

impl UsageError {
    pub fn exit_status(&self) -> u8 {
        match self {
            UsageError::WrongArgCount(_) => 1,
            UsageError::UnknownCommand(_) => 2,
        }
    }
}

/// Parse the arguments that follow the program name.
pub fn parse<I, S>(args: I) -> Result<Command, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let argv = std::iter::once(OsString::from("hb")).chain(args.iter().cloned());

    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(cli.command),
        Err(e) => Err(classify(e.kind(), &args)),
    }
}

fn classify(kind: ErrorKind, args: &[OsString]) -> UsageError {
    match (kind, args) {
        (ErrorKind::InvalidValue | ErrorKind::UnknownArgument, [single]) => {
            UsageError::UnknownCommand(single.to_string_lossy().into_owned())
        }
        _ => UsageError::WrongArgCount(args.len()),
    }
}

/// Map a command result to a process exit status without wrapping.
pub fn exit_status(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse(["post_message"]), Ok(Command::PostMessage));
        assert_eq!(parse(["reply_to_mentions"]), Ok(Command::ReplyToMentions));
    }

    #[test]
    fn wrong_arg_count_exits_1() {
        let none: [&str; 0] = [];
        let err = parse(none).unwrap_err();
        assert_eq!(err, UsageError::WrongArgCount(0));
        assert_eq!(err.exit_status(), 1);

        let err = parse(["post_message", "extra"]).unwrap_err();
        assert_eq!(err, UsageError::WrongArgCount(2));
        assert_eq!(err.exit_status(), 1);
    }

    #[test]
    fn unknown_command_exits_2() {
        let err = parse(["tweet"]).unwrap_err();
        assert_eq!(err, UsageError::UnknownCommand("tweet".to_string()));
        assert_eq!(err.exit_status(), 2);

        // Commands are matched exactly.
        assert_eq!(parse(["post-message"]).unwrap_err().exit_status(), 2);
    }

    #[test]
    fn flags_are_not_commands() {
        let err = parse(["--help"]).unwrap_err();
        assert_eq!(err, UsageError::UnknownCommand("--help".to_string()));
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn exit_status_saturates() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(187), 187);
        assert_eq!(exit_status(255), 255);
        assert_eq!(exit_status(256), 255);
        assert_eq!(exit_status(10_000), 255);
    }
}
