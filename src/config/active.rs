//! Active configuration with atomic reload
//!
//! Request processing works against an `Arc<IntakeState>` snapshot, so a
//! reload never disturbs a request already in flight. A reload that fails to
//! parse leaves the previous state, once-only memory included, in place.

use super::element::Element;
use super::model::Configuration;
use super::parser::ConfigParser;
use crate::core::Result;
use crate::processing::IntakeState;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct ActiveConfiguration {
    parser: ConfigParser,
    state: RwLock<Arc<IntakeState>>,
    generation: AtomicU64,
}

impl ActiveConfiguration {
    /// Activate an already-built configuration
    pub fn new(configuration: Configuration) -> Self {
        Self::with_parser(ConfigParser::new(), configuration)
    }

    /// Activate a configuration; later reloads use `parser`
    pub fn with_parser(parser: ConfigParser, configuration: Configuration) -> Self {
        Self {
            parser,
            state: RwLock::new(Arc::new(IntakeState::new(configuration))),
            generation: AtomicU64::new(0),
        }
    }

    /// Parse and activate a declarative tree
    pub fn load(root: &Element) -> Result<Self> {
        Self::load_with(ConfigParser::new(), root)
    }

    pub fn load_with(parser: ConfigParser, root: &Element) -> Result<Self> {
        let configuration = parser.parse_configuration(root)?;
        Ok(Self::with_parser(parser, configuration))
    }

    /// Current state; stays valid across reloads
    pub fn snapshot(&self) -> Arc<IntakeState> {
        self.state.read().clone()
    }

    /// Number of successful reloads
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Parse `root` and swap it in
    ///
    /// On error the current configuration stays active and the error is
    /// returned to the caller.
    pub fn reload(&self, root: &Element) -> Result<()> {
        match self.parser.parse_configuration(root) {
            Ok(configuration) => {
                self.replace(configuration);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    generation = self.generation(),
                    "configuration reload failed, keeping previous configuration"
                );
                Err(e)
            }
        }
    }

    /// Swap in a configuration, resetting once-only state
    pub fn replace(&self, configuration: Configuration) {
        let state = Arc::new(IntakeState::new(configuration));
        *self.state.write() = state;
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::info!(generation, "configuration activated");
    }
}

impl Default for ActiveConfiguration {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl std::fmt::Debug for ActiveConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveConfiguration")
            .field("generation", &self.generation())
            .finish()
    }
}
