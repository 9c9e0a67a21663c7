pub mod check;
pub mod config;
pub mod subjects;
pub mod view;

use crate::config::Settings;
use crate::utils::documents;
use anyhow::Result;
use clap::Args;
use enforcer::{factory, AuthorizationContext, Enforcer, EnforcerStrategy, Permissions, SubjectId};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments shared by every command that evaluates a policy.
#[derive(Debug, Args)]
pub struct PolicyArgs {
    /// Policy file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long)]
    pub policy: PathBuf,

    /// Enforcer strategy (throughput-optimized, memory-optimized)
    #[arg(long)]
    pub strategy: Option<EnforcerStrategy>,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

impl PolicyArgs {
    /// Builds an enforcer for the policy file, preferring `--strategy` over
    /// the configured strategy.
    pub fn enforcer(&self, settings: &Settings) -> Result<Arc<dyn Enforcer>> {
        let snapshot = documents::load_policy(&self.policy)?;
        let strategy = self.strategy.unwrap_or(settings.strategy);
        Ok(factory::evaluator(strategy, &snapshot))
    }
}

/// The requested permissions, or the configured defaults when none were given.
pub fn permissions(requested: &[String], settings: &Settings) -> Permissions {
    if requested.is_empty() {
        settings.default_permissions.iter().cloned().collect()
    } else {
        requested.iter().cloned().collect()
    }
}

pub fn context(subjects: &[String]) -> AuthorizationContext {
    AuthorizationContext::new(subjects.iter().map(String::as_str))
}

pub fn names(subjects: &BTreeSet<SubjectId>) -> Vec<&str> {
    subjects.iter().map(SubjectId::as_str).collect()
}

/// Prints `value` as JSON or YAML, or runs `text` for any other format.
pub fn render(format: &str, value: &Value, text: impl FnOnce()) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(value)?),
        "yaml" => print!("{}", serde_yaml::to_string(value)?),
        _ => text(),
    }
    Ok(())
}
