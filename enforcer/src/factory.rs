//! Building enforcers from policy snapshots.

use crate::enforcer::{Enforcer, TreeBasedEnforcer, TrieBasedEnforcer};
use crate::error::EnforcerError;
use crate::policy::PolicySnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Which index an enforcer is built on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnforcerStrategy {
    /// Precomputes every node; fastest queries, largest footprint.
    #[default]
    ThroughputOptimized,
    /// Keeps sorted policy rules; smallest footprint, slower queries.
    MemoryOptimized,
}

impl EnforcerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcerStrategy::ThroughputOptimized => "throughput-optimized",
            EnforcerStrategy::MemoryOptimized => "memory-optimized",
        }
    }
}

impl fmt::Display for EnforcerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnforcerStrategy {
    type Err = EnforcerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "throughput-optimized" | "throughput" | "trie" => {
                Ok(EnforcerStrategy::ThroughputOptimized)
            }
            "memory-optimized" | "memory" | "tree" => Ok(EnforcerStrategy::MemoryOptimized),
            _ => Err(EnforcerError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Builds an enforcer with the default (throughput-optimized) strategy.
pub fn default_evaluator(snapshot: &PolicySnapshot) -> Arc<dyn Enforcer> {
    evaluator(EnforcerStrategy::default(), snapshot)
}

pub fn throughput_optimized_evaluator(snapshot: &PolicySnapshot) -> Arc<dyn Enforcer> {
    evaluator(EnforcerStrategy::ThroughputOptimized, snapshot)
}

pub fn memory_optimized_evaluator(snapshot: &PolicySnapshot) -> Arc<dyn Enforcer> {
    evaluator(EnforcerStrategy::MemoryOptimized, snapshot)
}

pub fn evaluator(strategy: EnforcerStrategy, snapshot: &PolicySnapshot) -> Arc<dyn Enforcer> {
    let started = Instant::now();
    let enforcer: Arc<dyn Enforcer> = match strategy {
        EnforcerStrategy::ThroughputOptimized => Arc::new(TrieBasedEnforcer::new(snapshot)),
        EnforcerStrategy::MemoryOptimized => Arc::new(TreeBasedEnforcer::new(snapshot)),
    };
    debug!(
        "Created {} enforcer for policy {:?} revision {:?} in {:?}",
        strategy,
        snapshot.policy_id(),
        snapshot.revision(),
        started.elapsed()
    );
    enforcer
}
