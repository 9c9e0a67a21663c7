use super::{context, permissions, render, PolicyArgs};
use crate::config::Settings;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use enforcer::ResourceKey;
use serde_json::json;
use tracing::info;

/// How much of the resource the context must be able to access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// The whole subtree, with no revoke anywhere below
    Unrestricted,
    /// Any part of the subtree
    Partial,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Unrestricted => "unrestricted",
            Mode::Partial => "partial",
        }
    }
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Resource key, e.g. thing:/attributes/location
    #[arg(short, long)]
    pub resource: ResourceKey,

    /// Subject of the authorization context (repeatable)
    #[arg(short, long = "subject", required = true)]
    pub subjects: Vec<String>,

    /// Required permission (repeatable, defaults to the configured permissions)
    #[arg(long = "permission")]
    pub permissions: Vec<String>,

    /// Access mode to check
    #[arg(short, long, value_enum, default_value_t = Mode::Unrestricted)]
    pub mode: Mode,
}

/// Decides whether the subjects may access the resource.
///
/// A denial is a normal outcome and exits successfully.
pub fn execute(args: CheckArgs, settings: &Settings) -> Result<()> {
    let enforcer = args.policy.enforcer(settings)?;
    let context = context(&args.subjects);
    let permissions = permissions(&args.permissions, settings);

    let allowed = match args.mode {
        Mode::Unrestricted => {
            enforcer.has_unrestricted_permissions(&args.resource, &context, &permissions)?
        }
        Mode::Partial => enforcer.has_partial_permissions(&args.resource, &context, &permissions)?,
    };
    info!(
        "Checked {} {} on {} for {:?}: allowed={}",
        args.mode.as_str(),
        permissions,
        args.resource,
        args.subjects,
        allowed
    );

    let output = json!({
        "resource": args.resource.to_string(),
        "mode": args.mode.as_str(),
        "permissions": permissions.iter().collect::<Vec<_>>(),
        "subjects": args.subjects,
        "allowed": allowed,
    });
    render(&args.policy.format, &output, || {
        let verdict = if allowed {
            "ALLOWED".green().bold()
        } else {
            "DENIED".red().bold()
        };
        println!("{}", verdict);
        println!(
            "  {} {} on {} for {}",
            args.mode.as_str(),
            permissions,
            args.resource.to_string().cyan(),
            args.subjects.join(", ")
        );
    })
}
