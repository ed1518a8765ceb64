//! Named engine factories.
//!
//! To add an engine, implement [`EngineFactory`] for it and append an
//! [`EngineEntry`] below. Names are what `AI_ENGINE` selects and what
//! players see in `aiMeta.engine`.

use std::sync::Arc;

use super::config::AiConfig;
use super::random::{RandomEngine, RandomEngineFactory};
use super::trait_def::{EngineError, EngineFactory};
use super::uci::UciEngineFactory;

pub struct EngineEntry {
    pub name: &'static str,
    pub make: fn(&AiConfig) -> Arc<dyn EngineFactory>,
}

static ENGINES: &[EngineEntry] = &[
    EngineEntry {
        name: UciEngineFactory::NAME,
        make: make_uci,
    },
    EngineEntry {
        name: RandomEngine::NAME,
        make: make_random,
    },
];

pub fn registered_engines() -> &'static [EngineEntry] {
    ENGINES
}

pub fn by_name(name: &str) -> Option<&'static EngineEntry> {
    registered_engines().iter().find(|entry| entry.name == name)
}

/// Build the factory `config.engine` names.
pub fn factory_for(config: &AiConfig) -> Result<Arc<dyn EngineFactory>, EngineError> {
    by_name(&config.engine)
        .map(|entry| (entry.make)(config))
        .ok_or_else(|| EngineError::Unknown(config.engine.clone()))
}

fn make_uci(config: &AiConfig) -> Arc<dyn EngineFactory> {
    Arc::new(UciEngineFactory::new(config.engine_path.clone()))
}

fn make_random(config: &AiConfig) -> Arc<dyn EngineFactory> {
    Arc::new(RandomEngineFactory::new(config.seed))
}
