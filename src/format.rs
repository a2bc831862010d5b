//! mIRC formatting codes and the text templates built on them.
//!
//! Control characters understood here:
//! - 0x02 bold, 0x0F reset, 0x11 monospace, 0x16 reverse
//! - 0x1D italic, 0x1E strikethrough, 0x1F underline
//! - 0x03 color, followed by up to two fg digits and optionally `,` and two bg digits
//! - 0x04 hex color, followed by up to six hex digits and optionally `,` and six more

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::Chars;

use crate::types::{EventFields, EventKind};

pub const COLOR: char = '\x03';
pub const HEX_COLOR: char = '\x04';
pub const BOLD: char = '\x02';
pub const RESET: char = '\x0F';
pub const MONOSPACE: char = '\x11';
pub const REVERSE: char = '\x16';
pub const ITALIC: char = '\x1D';
pub const STRIKETHROUGH: char = '\x1E';
pub const UNDERLINE: char = '\x1F';

const CONTROL_CHARS: &[char] = &[
    COLOR,
    HEX_COLOR,
    BOLD,
    RESET,
    MONOSPACE,
    REVERSE,
    ITALIC,
    STRIKETHROUGH,
    UNDERLINE,
];

/// Does the text contain any formatting control characters?
pub fn is_formatted(text: &str) -> bool {
    text.contains(CONTROL_CHARS)
}

/// Does the text open with a color code? Used as the "already colored" tag.
pub fn is_color_tagged(text: &str) -> bool {
    text.starts_with(COLOR)
}

/// Remove every formatting code, including color arguments.
///
/// Returns `Cow::Borrowed` when there was nothing to strip.
pub fn strip_formatting(text: &str) -> Cow<'_, str> {
    if !is_formatted(text) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            COLOR => {
                take_color_args(&mut chars);
            }
            HEX_COLOR => {
                take_hex_color_args(&mut chars);
            }
            c if CONTROL_CHARS.contains(&c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Consume `NN[,NN]` after a color code. Returns (fg, bg).
///
/// A comma not followed by a digit is left in place as text.
fn take_color_args(chars: &mut Peekable<Chars<'_>>) -> (Option<u8>, Option<u8>) {
    let fg = take_digits(chars, 2);
    let mut bg = None;
    if fg.is_some() && chars.peek() == Some(&',') {
        let mut ahead = chars.clone();
        ahead.next();
        if ahead.peek().is_some_and(char::is_ascii_digit) {
            chars.next();
            bg = take_digits(chars, 2);
        }
    }
    (fg, bg)
}

fn take_digits(chars: &mut Peekable<Chars<'_>>, max: usize) -> Option<u8> {
    let mut value: Option<u8> = None;
    for _ in 0..max {
        match chars.peek().and_then(|c| c.to_digit(10)) {
            Some(d) => {
                chars.next();
                // At most two digits, so this never overflows.
                value = Some(value.unwrap_or(0) * 10 + d as u8);
            }
            None => break,
        }
    }
    value
}

fn take_hex_color_args(chars: &mut Peekable<Chars<'_>>) {
    let taken = take_hex(chars, 6);
    if taken > 0 && chars.peek() == Some(&',') {
        let mut ahead = chars.clone();
        ahead.next();
        if ahead.peek().is_some_and(char::is_ascii_hexdigit) {
            chars.next();
            take_hex(chars, 6);
        }
    }
}

fn take_hex(chars: &mut Peekable<Chars<'_>>, max: usize) -> usize {
    let mut taken = 0;
    while taken < max && chars.peek().is_some_and(char::is_ascii_hexdigit) {
        chars.next();
        taken += 1;
    }
    taken
}

/// Color code prefix with the code taken verbatim (accent colors are not validated).
pub fn color_prefix(code: &str) -> String {
    format!("{COLOR}{code}")
}

/// `nick` prefixed with a two-digit palette color.
pub fn colored_nick(index: u8, nick: &str) -> String {
    format!("{COLOR}{index:02}{nick}")
}

impl EventKind {
    /// Plain-text layout used when the mute filter prints an event itself.
    ///
    /// Placeholders: `{0}` sender, `{1}` text, `{2}` mode, `{3}` highlight.
    pub fn template(self) -> &'static str {
        match self {
            EventKind::ChannelAction | EventKind::ChannelActionHighlight => "\x1D\t• {0} {1}",
            EventKind::ChannelMessage | EventKind::ChannelMsgHilight => "<{3}{2}{0}>\t{1}",
        }
    }
}

/// Fill `template` with the positional fields in one pass.
///
/// Substituted text is never rescanned, so a `{1}` inside a nick stays literal.
pub fn render_template(template: &str, fields: &EventFields) -> String {
    let mut out = String::with_capacity(template.len() + fields.text.len() + fields.sender.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let field = match tail.get(..3) {
            Some("{0}") => Some(&fields.sender),
            Some("{1}") => Some(&fields.text),
            Some("{2}") => Some(&fields.mode),
            Some("{3}") => Some(&fields.highlight),
            _ => None,
        };
        match field {
            Some(value) => {
                out.push_str(value);
                rest = &tail[3..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// How the host itself draws an event nobody suppressed.
pub fn render_default(kind: EventKind, fields: &EventFields) -> String {
    if kind.is_action() {
        format!("* {} {}", fields.sender, fields.text)
    } else {
        format!("<{}{}>\t{}", fields.mode, fields.sender, fields.text)
    }
}

/// mIRC palette 0..=15 as ANSI 256-color indices.
const ANSI_PALETTE: [u8; 16] = [15, 0, 4, 2, 9, 1, 5, 208, 11, 10, 6, 14, 12, 13, 8, 7];

/// Extended mIRC colors (16..=98) are drawn dim grey.
const ANSI_EXTENDED: u8 = 244;

/// Translate mIRC codes into ANSI escapes for a terminal.
pub fn to_ansi(text: &str) -> String {
    if !is_formatted(text) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut styled = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            COLOR => match take_color_args(&mut chars) {
                (Some(fg), _) => {
                    let ansi = ANSI_PALETTE
                        .get(usize::from(fg))
                        .copied()
                        .unwrap_or(ANSI_EXTENDED);
                    out.push_str(&format!("\x1b[38;5;{ansi}m"));
                    styled = true;
                }
                (None, _) => out.push_str("\x1b[39m"),
            },
            HEX_COLOR => take_hex_color_args(&mut chars),
            BOLD => {
                out.push_str("\x1b[1m");
                styled = true;
            }
            ITALIC => {
                out.push_str("\x1b[3m");
                styled = true;
            }
            UNDERLINE => {
                out.push_str("\x1b[4m");
                styled = true;
            }
            RESET => out.push_str("\x1b[0m"),
            c if CONTROL_CHARS.contains(&c) => {}
            c => out.push(c),
        }
    }
    if styled {
        out.push_str("\x1b[0m");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        match strip_formatting("plain text") {
            Cow::Borrowed(b) => assert_eq!(b, "plain text"),
            Cow::Owned(_) => panic!("expected borrowed"),
        }
    }

    #[test]
    fn strips_attributes() {
        assert_eq!(strip_formatting("\x02bold\x02 \x1Funder\x0F"), "bold under");
        assert_eq!(strip_formatting("\x1Dital\x1D"), "ital");
    }

    #[test]
    fn strips_color_arguments() {
        assert_eq!(strip_formatting("\x034red"), "red");
        assert_eq!(strip_formatting("\x0304red"), "red");
        assert_eq!(strip_formatting("\x0304,12both"), "both");
        assert_eq!(strip_formatting("\x03plain"), "plain");
    }

    #[test]
    fn keeps_digits_past_two_and_lone_commas() {
        assert_eq!(strip_formatting("\x03123"), "3");
        assert_eq!(strip_formatting("\x0304,x"), ",x");
    }

    #[test]
    fn strips_hex_colors() {
        assert_eq!(strip_formatting("\x04FF0000red"), "red");
        assert_eq!(strip_formatting("\x04FF0000,00FF00xy"), "xy");
    }

    #[test]
    fn colored_nick_pads_to_two_digits() {
        assert_eq!(colored_nick(3, "alice"), "\x0303alice");
        assert_eq!(colored_nick(15, "bob"), "\x0315bob");
        assert!(is_color_tagged(&colored_nick(1, "x")));
    }

    #[test]
    fn message_template_orders_highlight_mode_sender() {
        let fields = EventFields::new("alice", "hello")
            .with_mode("@")
            .with_highlight("!");
        let line = render_template(EventKind::ChannelMessage.template(), &fields);
        assert_eq!(line, "<!@alice>\thello");
    }

    #[test]
    fn action_template_is_italic_bullet() {
        let fields = EventFields::new("alice", "waves");
        let line = render_template(EventKind::ChannelAction.template(), &fields);
        assert_eq!(line, "\x1D\t• alice waves");
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let fields = EventFields::new("{1}", "{0} {x");
        let line = render_template(EventKind::ChannelMessage.template(), &fields);
        assert_eq!(line, "<{1}>\t{0} {x");
    }

    #[test]
    fn ansi_maps_palette_and_resets() {
        assert_eq!(to_ansi("\x0304red"), "\x1b[38;5;9mred\x1b[0m");
        assert_eq!(to_ansi("\x0321dim"), "\x1b[38;5;244mdim\x1b[0m");
        assert_eq!(to_ansi("plain"), "plain");
    }
}
