use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::colorizer::NickColorizer;
use crate::command::{self, CommandResult};
use crate::config::{PluginConfig, VERSION};
use crate::error::FilterError;
use crate::filter::{FilterChain, Output};
use crate::interceptor::MuteInterceptor;
use crate::registry::MuteRegistry;
use crate::store::PreferenceStore;
use crate::types::{Event, EventKind, Priority};

/// Where each filter sits in the chain. The colorizer must see raw events
/// before the mute filter sees the colored re-emission.
pub const COLORIZER_PRIORITY: Priority = Priority::HIGHEST;
pub const INTERCEPTOR_PRIORITY: Priority = Priority::NORM;

/// Both filters installed on one chain, sharing one registry.
///
/// The registry is shared between the mute filter and the command surface;
/// everything runs on one thread, so `Rc<RefCell<_>>` is enough.
pub struct Plugin {
    registry: Rc<RefCell<MuteRegistry>>,
    chain: FilterChain,
}

impl Plugin {
    pub fn load(config: &PluginConfig, store: Box<dyn PreferenceStore>) -> Self {
        let registry = Rc::new(RefCell::new(MuteRegistry::load(
            config.name.clone(),
            config.default_color.clone(),
            store,
        )));

        let mut chain = FilterChain::new();
        chain.add(&EventKind::ALL, COLORIZER_PRIORITY, NickColorizer::new());
        chain.add(
            &EventKind::ALL,
            INTERCEPTOR_PRIORITY,
            MuteInterceptor::new(Rc::clone(&registry)),
        );

        {
            let registry = registry.borrow();
            tracing::info!("{} {} loaded ({} muted)", registry.name(), VERSION, registry.len());
        }
        Self { registry, chain }
    }

    pub fn dispatch(&self, event: &Event) -> Vec<Output> {
        self.chain.dispatch(event)
    }

    pub fn run_command(&self, line: &str) -> Result<CommandResult, FilterError> {
        command::run(line, &mut self.registry.borrow_mut())
    }

    pub fn registry(&self) -> Ref<'_, MuteRegistry> {
        self.registry.borrow()
    }

    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn colorizer_runs_before_interceptor_on_every_kind() {
        let plugin = Plugin::load(&PluginConfig::builder().build(), Box::new(MemoryStore::new()));
        for kind in EventKind::ALL {
            assert_eq!(
                plugin.chain().chain(kind),
                vec![
                    ("nickcolor", COLORIZER_PRIORITY),
                    ("mute_senders", INTERCEPTOR_PRIORITY)
                ]
            );
        }
    }

    #[test]
    fn commands_reach_the_shared_registry() {
        let plugin = Plugin::load(&PluginConfig::builder().build(), Box::new(MemoryStore::new()));
        plugin.run_command("/mute *bot").unwrap();
        assert!(plugin.registry().matches("evilbot"));
    }
}
