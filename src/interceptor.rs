use std::cell::RefCell;
use std::rc::Rc;

use crate::filter::{Effects, EventFilter};
use crate::format::{color_prefix, render_template, strip_formatting};
use crate::registry::MuteRegistry;
use crate::types::{Decision, Event};

/// Prints messages from muted senders as one plain accent-colored line
/// and suppresses the normal rendering. Everyone else passes through.
///
/// Matching uses the sender with formatting stripped but case kept, so
/// `*bot` does not mute `EvilBot`.
pub struct MuteInterceptor {
    registry: Rc<RefCell<MuteRegistry>>,
}

impl MuteInterceptor {
    pub fn new(registry: Rc<RefCell<MuteRegistry>>) -> Self {
        Self { registry }
    }
}

impl EventFilter for MuteInterceptor {
    fn name(&self) -> &str {
        "mute_senders"
    }

    fn handle(&self, event: &Event, effects: &mut Effects) -> Decision {
        let fields = event.fields.map(|field| strip_formatting(field).into_owned());

        let registry = self.registry.borrow();
        let Some(pattern) = registry.matching_pattern(&fields.sender) else {
            return Decision::PassThrough;
        };
        tracing::debug!(sender = %fields.sender, pattern, kind = %event.kind, "muting message");

        let mut line = color_prefix(registry.accent_color());
        line.push_str(&render_template(event.kind.template(), &fields));
        effects.print(line);
        Decision::Suppress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Effect;
    use crate::registry::DEFAULT_ACCENT_COLOR;
    use crate::store::MemoryStore;
    use crate::types::{EventFields, EventKind};
    use chrono::Utc;

    fn interceptor(patterns: &[&str], color: &str) -> MuteInterceptor {
        let mut registry =
            MuteRegistry::load("mute_senders", DEFAULT_ACCENT_COLOR, Box::new(MemoryStore::new()));
        for pattern in patterns {
            registry.add(pattern).unwrap();
        }
        registry.set_accent_color(color).unwrap();
        MuteInterceptor::new(Rc::new(RefCell::new(registry)))
    }

    fn handle(
        filter: &MuteInterceptor,
        kind: EventKind,
        fields: EventFields,
    ) -> (Decision, Vec<Effect>) {
        let mut effects = Effects::default();
        let decision = filter.handle(&Event::new(kind, fields, Utc::now()), &mut effects);
        (decision, effects.into_effects())
    }

    #[test]
    fn muted_message_is_printed_plain_in_accent_color() {
        let filter = interceptor(&["*Bot*"], "4");
        let (decision, effects) = handle(
            &filter,
            EventKind::ChannelMessage,
            EventFields::new("EvilBot99", "buy now").with_mode("+"),
        );
        assert_eq!(decision, Decision::Suppress);
        assert_eq!(effects, vec![Effect::Print("\x034<+EvilBot99>\tbuy now".into())]);
    }

    #[test]
    fn muted_action_uses_action_template() {
        let filter = interceptor(&["spam*"], "14");
        let (_, effects) = handle(
            &filter,
            EventKind::ChannelActionHighlight,
            EventFields::new("spammer", "dances"),
        );
        assert_eq!(effects, vec![Effect::Print("\x0314\x1D\t• spammer dances".into())]);
    }

    #[test]
    fn colored_sender_is_matched_on_plain_text() {
        let filter = interceptor(&["*bot"], "4");
        let (decision, effects) = handle(
            &filter,
            EventKind::ChannelMessage,
            EventFields::new("\x0307evilbot", "\x02loud\x02"),
        );
        assert_eq!(decision, Decision::Suppress);
        assert_eq!(effects, vec![Effect::Print("\x034<evilbot>\tloud".into())]);
    }

    #[test]
    fn unmatched_sender_passes_through() {
        let filter = interceptor(&["*bot"], "4");
        let (decision, effects) = handle(
            &filter,
            EventKind::ChannelMessage,
            EventFields::new("EvilBot99", "hi"),
        );
        assert_eq!(decision, Decision::PassThrough);
        assert!(effects.is_empty());
    }

    #[test]
    fn registry_changes_are_seen_immediately() {
        let registry = Rc::new(RefCell::new(MuteRegistry::load(
            "mute_senders",
            DEFAULT_ACCENT_COLOR,
            Box::new(MemoryStore::new()),
        )));
        let filter = MuteInterceptor::new(Rc::clone(&registry));
        let fields = EventFields::new("alice", "hi");

        let (decision, _) = handle(&filter, EventKind::ChannelMessage, fields.clone());
        assert_eq!(decision, Decision::PassThrough);
        registry.borrow_mut().add("alice").unwrap();
        let (decision, effects) = handle(&filter, EventKind::ChannelMessage, fields);
        assert_eq!(decision, Decision::Suppress);
        assert_eq!(effects, vec![Effect::Print("\x0321<alice>\thi".into())]);
    }
}
