use crate::error::FilterError;
use crate::registry::MuteRegistry;

/// User commands for the mute list. A closed set, matched exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mute { pattern: String },
    Unmute { index: i64 },
    ListMuted,
    MuteColor { code: Option<String> },
}

/// What the host should show after running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Reply(Vec<String>),
    /// Bad invocation: show the help for this command instead.
    Help(String),
}

pub const MUTE_HELP: &str = "/MUTE <nick> (shell-style wildcards accepted)
eg: /MUTE *bot
Display messages from muted senders in plain format and muted color.
See also: /help UNMUTE, /help LMUTE";

pub const UNMUTE_HELP: &str = "/UNMUTE <index>
eg: /UNMUTE 0
Remove a user from the muted senders list.
See also: /help MUTE, /help LMUTE";

pub const LMUTE_HELP: &str = "/LMUTE
Show the list of currently muted users.
See also: /help MUTE, /help UNMUTE";

pub const MUTECOLOR_HELP: &str = "/MUTECOLOR [color]
eg: /MUTECOLOR 14
Show or set the color used for muted messages.
See also: /help MUTE";

/// Help text for a command name, if it is one of ours.
pub fn help_for(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "mute" => Some(MUTE_HELP),
        "unmute" => Some(UNMUTE_HELP),
        "lmute" => Some(LMUTE_HELP),
        "mutecolor" => Some(MUTECOLOR_HELP),
        _ => None,
    }
}

impl Command {
    /// Parse a `/`-prefixed line. Arguments are whitespace separated and
    /// each command takes a fixed number of them.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let input = input.trim();
        let Some(input) = input.strip_prefix('/') else {
            return Err(FilterError::Parse("commands start with /".into()));
        };

        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            return Err(FilterError::Parse("empty command".into()));
        };
        let lowered = name.to_ascii_lowercase();
        let malformed = || FilterError::MalformedInvocation(lowered.clone());

        match lowered.as_str() {
            "mute" => match args {
                [pattern] => Ok(Command::Mute {
                    pattern: pattern.to_string(),
                }),
                _ => Err(malformed()),
            },
            "unmute" => match args {
                [index] => index
                    .parse()
                    .map(|index| Command::Unmute { index })
                    .map_err(|_| malformed()),
                _ => Err(malformed()),
            },
            "lmute" => Ok(Command::ListMuted),
            "mutecolor" => match args {
                [] => Ok(Command::MuteColor { code: None }),
                [code] => Ok(Command::MuteColor {
                    code: Some(code.to_string()),
                }),
                _ => Err(malformed()),
            },
            _ => Err(FilterError::Parse(format!("unknown command: /{name}"))),
        }
    }

    /// Run against the registry. Out-of-range indices become a reply, not
    /// an error; only persistence failures propagate.
    pub fn execute(self, registry: &mut MuteRegistry) -> Result<CommandResult, FilterError> {
        let lines = match self {
            Command::Mute { pattern } => {
                registry.add(&pattern)?;
                vec![format!("{pattern} will be muted.")]
            }
            Command::Unmute { index } => match registry.remove_at(index) {
                Ok(removed) => vec![format!("{removed} unmuted.")],
                Err(e @ FilterError::IndexOutOfRange { .. }) => vec![e.to_string()],
                Err(e) => return Err(e),
            },
            Command::ListMuted => list_lines(registry),
            Command::MuteColor { code: Some(code) } => {
                registry.set_accent_color(&code)?;
                vec![format!("Mute color set to {code}.")]
            }
            Command::MuteColor { code: None } => {
                vec![format!("Mute color is {}.", registry.accent_color())]
            }
        };
        Ok(CommandResult::Reply(lines))
    }
}

fn list_lines(registry: &MuteRegistry) -> Vec<String> {
    let mut lines = vec!["Muted nicks:".to_string()];
    if registry.is_empty() {
        lines.push("No muted nicks".to_string());
    } else {
        lines.extend(registry.list().map(|(i, pattern)| format!("{i:<3}: {pattern}")));
    }
    lines
}

/// Parse and run a command line, turning bad invocations into help.
pub fn run(input: &str, registry: &mut MuteRegistry) -> Result<CommandResult, FilterError> {
    match Command::parse(input) {
        Ok(cmd) => cmd.execute(registry),
        Err(FilterError::MalformedInvocation(name)) => Ok(CommandResult::Help(name)),
        Err(e) => Err(e),
    }
}
