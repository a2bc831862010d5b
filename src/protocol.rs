use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::error::FilterError;
use crate::types::{Event, EventFields, EventKind};

/// Line format read by the terminal host:
///
///   /command args...          a mute command
///   KIND:sender:text          an incoming message event
///
/// KIND is MSG, HMSG, ACTION or HACTION. A leading `~&@%+` on the sender
/// is split off as the channel mode marker. Text may contain `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame<'a> {
    Command(&'a str),
    Event {
        kind: EventKind,
        mode: Cow<'a, str>,
        sender: Cow<'a, str>,
        text: Cow<'a, str>,
    },
}

const MODE_PREFIXES: &[char] = &['~', '&', '@', '%', '+'];

/// Parse one input line. Borrows from `line`.
pub fn parse_frame(line: &str) -> Result<Frame<'_>, FilterError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim_start().starts_with('/') {
        return Ok(Frame::Command(line.trim()));
    }

    let (tag, payload) = line
        .split_once(':')
        .ok_or_else(|| FilterError::Parse("missing ':' delimiter".into()))?;

    let kind = match tag.trim() {
        "MSG" => EventKind::ChannelMessage,
        "HMSG" => EventKind::ChannelMsgHilight,
        "ACTION" => EventKind::ChannelAction,
        "HACTION" => EventKind::ChannelActionHighlight,
        other => return Err(FilterError::Parse(format!("unknown frame type: {other}"))),
    };

    let (sender, text) = payload
        .split_once(':')
        .ok_or_else(|| FilterError::Parse(format!("{} requires sender:text", tag.trim())))?;

    let sender = sender.trim();
    let (mode, sender) = match sender.strip_prefix(MODE_PREFIXES) {
        Some(rest) => sender.split_at(sender.len() - rest.len()),
        None => ("", sender),
    };
    if sender.is_empty() {
        return Err(FilterError::Parse("empty sender".into()));
    }

    Ok(Frame::Event {
        kind,
        mode: Cow::Borrowed(mode),
        sender: Cow::Borrowed(sender),
        text: Cow::Borrowed(text),
    })
}

impl Frame<'_> {
    /// Turn an event frame into an [`Event`] stamped with `time`.
    /// The highlight slot stays empty.
    pub fn into_event(self, time: DateTime<Utc>) -> Option<Event> {
        match self {
            Frame::Event {
                kind,
                mode,
                sender,
                text,
            } => {
                let fields = EventFields::new(sender.into_owned(), text.into_owned())
                    .with_mode(mode.into_owned());
                Some(Event::new(kind, fields, time))
            }
            Frame::Command(_) => None,
        }
    }
}
