//! Configuration System
//!
//! Engine tunables load from `relstream.toml` with `RELSTREAM_*`
//! environment variable overrides:
//!
//! ```toml
//! # relstream.toml
//! workers = 8
//! channel_capacity = 32
//! ```
//!
//! ```bash
//! RELSTREAM_WORKERS=2 RELSTREAM_CHANNEL_CAPACITY=16
//! ```
//!
//! Relations inherit their configuration from the literal leaves they are
//! built over; `Relation::with_config` overrides it per node.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker tasks per parallel operator invocation (0 = logical CPUs)
    #[serde(default)]
    pub workers: usize,

    /// Capacity of the bounded tuple channels between operator stages
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            workers: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl EngineConfig {
    /// Load configuration: defaults, then `relstream.toml`, then
    /// `RELSTREAM_*` environment variables.
    pub fn load() -> figment::Result<EngineConfig> {
        Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("relstream.toml"))
            .merge(Env::prefixed("RELSTREAM_"))
            .extract()
    }

    /// The effective degree of parallelism.
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    /// Channel capacity, floored at 1 so zero-capacity misconfiguration
    /// cannot stall rendezvous-free operators.
    pub fn capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }
}
