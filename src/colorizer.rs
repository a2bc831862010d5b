use crate::filter::{Effects, EventFilter};
use crate::format::{colored_nick, is_color_tagged, strip_formatting};
use crate::types::{Decision, Event};

/// Number of palette colors a nick can land on (indices 1..=15).
pub const PALETTE_SIZE: u64 = 15;

/// Normalize a nick for hashing: lower-case, drop trailing `` ` `` and `_`,
/// then cut at the first `|`, `{` or `[`.
///
/// `Alice`, `alice_`, `alice|away` and `alice[m]` all share one color.
pub fn canonical_nick(nick: &str) -> String {
    let lowered = nick.to_lowercase();
    let trimmed = lowered.trim_end_matches(['`', '_']);
    let end = trimmed.find(['|', '{', '[']).unwrap_or(trimmed.len());
    trimmed[..end].to_string()
}

/// Palette index for `nick`, in `1..=15`. Same nick, same color, every run.
pub fn color_index(nick: &str) -> u8 {
    let hash = fnv1a64(canonical_nick(nick).as_bytes());
    // < 16, always fits.
    1 + (hash % PALETTE_SIZE) as u8
}

/// FNV-1a, 64-bit. Unseeded on purpose: colors must not change between runs.
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xCBF2_9CE4_8422_2325_u64;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
    hash
}

/// Re-emits every untagged message with the sender wrapped in its color.
///
/// Stateless. The color tag on the re-emitted sender is what keeps the
/// re-emission from being colored again.
#[derive(Debug, Default, Clone, Copy)]
pub struct NickColorizer;

impl NickColorizer {
    pub fn new() -> Self {
        Self
    }
}

impl EventFilter for NickColorizer {
    fn name(&self) -> &str {
        "nickcolor"
    }

    fn handle(&self, event: &Event, effects: &mut Effects) -> Decision {
        if is_color_tagged(&event.fields.sender) {
            return Decision::PassThrough;
        }

        let nick = strip_formatting(&event.fields.sender);
        let index = color_index(&nick);
        tracing::trace!(nick = %nick, index, "coloring nick");

        let mut fields = event.fields.clone();
        fields.sender = colored_nick(index, &nick);
        effects.emit(event.with_fields(fields));
        Decision::Suppress
    }
}
