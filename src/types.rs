use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::FilterError;

/// The four message-kind print events both filters subscribe to.
///
/// A closed set: the host only ever hands these filters one of these
/// kinds, so anything else is a registration bug rather than input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ChannelAction,
    ChannelActionHighlight,
    ChannelMessage,
    ChannelMsgHilight,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::ChannelAction,
        EventKind::ChannelActionHighlight,
        EventKind::ChannelMessage,
        EventKind::ChannelMsgHilight,
    ];

    /// The host's name for this print event.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ChannelAction => "Channel Action",
            EventKind::ChannelActionHighlight => "Channel Action Highlight",
            EventKind::ChannelMessage => "Channel Message",
            EventKind::ChannelMsgHilight => "Channel Msg Hilight",
        }
    }

    pub fn is_action(self) -> bool {
        matches!(
            self,
            EventKind::ChannelAction | EventKind::ChannelActionHighlight
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = FilterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| FilterError::Parse(format!("unknown event kind: {name}")))
    }
}

/// The positional payload of a message event: nick, text, mode, highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFields {
    pub sender: String,
    pub text: String,
    pub mode: String,
    pub highlight: String,
}

impl EventFields {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_highlight(mut self, highlight: impl Into<String>) -> Self {
        self.highlight = highlight.into();
        self
    }

    /// Apply `f` to every field, in positional order.
    pub fn map(&self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            sender: f(&self.sender),
            text: f(&self.text),
            mode: f(&self.mode),
            highlight: f(&self.highlight),
        }
    }
}

/// A print event as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub fields: EventFields,
    pub time: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: EventKind, fields: EventFields, time: DateTime<Utc>) -> Self {
        Self { kind, fields, time }
    }

    /// Same kind and timestamp, different payload.
    pub fn with_fields(&self, fields: EventFields) -> Self {
        Self {
            kind: self.kind,
            fields,
            time: self.time,
        }
    }
}

/// Handler priority. Higher values see an event first.
///
/// A newtype so a priority can't be confused with an index or a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(i32);

impl Priority {
    pub const HIGHEST: Priority = Priority(127);
    pub const NORM: Priority = Priority(0);
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pri{}", self.0)
    }
}

/// What a handler tells the host to do with the event it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The handler took care of it; the host must not render the original.
    Suppress,
    /// Keep going; render normally if nobody else suppresses.
    PassThrough,
}
