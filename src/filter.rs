use crate::types::{Decision, Event, EventKind, Priority};

/// How many times an event may be re-emitted from inside its own dispatch.
pub const MAX_EMIT_DEPTH: usize = 8;

/// A print-event handler.
///
/// Handlers get a shared reference: the host is single-threaded and state
/// a handler needs to consult lives behind `Rc<RefCell<_>>` owned elsewhere.
pub trait EventFilter {
    fn name(&self) -> &str {
        "anonymous"
    }

    fn handle(&self, event: &Event, effects: &mut Effects) -> Decision;
}

/// Plain closures are filters too.
impl<F> EventFilter for F
where
    F: Fn(&Event, &mut Effects) -> Decision,
{
    fn handle(&self, event: &Event, effects: &mut Effects) -> Decision {
        self(event, effects)
    }
}

/// Side effects a filter asks the host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Feed a new event through the whole chain, top priority first.
    Emit(Event),
    /// Print a line as-is, skipping the event renderer.
    Print(String),
}

/// Collects a filter's effects during one `handle` call.
#[derive(Debug, Default)]
pub struct Effects {
    queued: Vec<Effect>,
}

impl Effects {
    pub fn emit(&mut self, event: Event) {
        self.queued.push(Effect::Emit(event));
    }

    pub fn print(&mut self, line: impl Into<String>) {
        self.queued.push(Effect::Print(line.into()));
    }

    pub fn into_effects(self) -> Vec<Effect> {
        self.queued
    }
}

/// What finally reaches the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A line printed by a filter.
    Raw(String),
    /// An event nobody suppressed; the host draws it with its own format.
    Rendered(Event),
}

struct Subscription {
    kinds: Vec<EventKind>,
    priority: Priority,
    filter: Box<dyn EventFilter>,
}

/// Per-kind handler chains, ordered by priority.
///
/// Each event walks the chain from the highest priority down. A filter
/// that returns `Suppress` ends the walk; an event that reaches the end
/// is rendered by the host.
#[derive(Default)]
pub struct FilterChain {
    subscriptions: Vec<Subscription>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `filter` to `kinds`. Equal priorities run in the order
    /// they were added.
    pub fn add<F>(&mut self, kinds: &[EventKind], priority: Priority, filter: F)
    where
        F: EventFilter + 'static,
    {
        tracing::debug!(filter = filter.name(), %priority, ?kinds, "filter registered");
        let at = self
            .subscriptions
            .iter()
            .position(|s| s.priority < priority)
            .unwrap_or(self.subscriptions.len());
        self.subscriptions.insert(
            at,
            Subscription {
                kinds: kinds.to_vec(),
                priority,
                filter: Box::new(filter),
            },
        );
    }

    /// Filters subscribed to `kind`, in the order they will run.
    pub fn chain(&self, kind: EventKind) -> Vec<(&str, Priority)> {
        self.subscriptions
            .iter()
            .filter(|s| s.kinds.contains(&kind))
            .map(|s| (s.filter.name(), s.priority))
            .collect()
    }

    /// Run `event` through the chain and return everything it produced, in order.
    pub fn dispatch(&self, event: &Event) -> Vec<Output> {
        let mut outputs = Vec::new();
        self.dispatch_at(event, 0, &mut outputs);
        outputs
    }

    fn dispatch_at(&self, event: &Event, depth: usize, outputs: &mut Vec<Output>) {
        if depth > MAX_EMIT_DEPTH {
            tracing::warn!(kind = %event.kind, depth, "re-emission limit reached, rendering as-is");
            outputs.push(Output::Rendered(event.clone()));
            return;
        }

        for sub in self.subscriptions.iter().filter(|s| s.kinds.contains(&event.kind)) {
            let mut effects = Effects::default();
            let decision = sub.filter.handle(event, &mut effects);

            // Emitted events finish their own dispatch before this one continues.
            for effect in effects.into_effects() {
                match effect {
                    Effect::Emit(next) => self.dispatch_at(&next, depth + 1, outputs),
                    Effect::Print(line) => outputs.push(Output::Raw(line)),
                }
            }

            if decision == Decision::Suppress {
                tracing::trace!(filter = sub.filter.name(), kind = %event.kind, "event suppressed");
                return;
            }
        }

        outputs.push(Output::Rendered(event.clone()));
    }
}
