use super::{context, permissions, render, PolicyArgs};
use crate::config::Settings;
use crate::utils::documents;
use anyhow::Result;
use clap::Args;
use enforcer::{JsonPointer, ResourceKey};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Resource key the document is rooted at, e.g. thing:/
    #[arg(short, long)]
    pub resource: ResourceKey,

    /// Document to filter (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long)]
    pub document: PathBuf,

    /// Subject of the authorization context (repeatable)
    #[arg(short, long = "subject", required = true)]
    pub subjects: Vec<String>,

    /// Required permission (repeatable, defaults to the configured permissions)
    #[arg(long = "permission")]
    pub permissions: Vec<String>,

    /// Field copied unfiltered when the subjects have any access (repeatable)
    #[arg(long = "allow")]
    pub allowlist: Vec<JsonPointer>,

    /// List the visible leaf paths instead of printing the filtered document
    #[arg(long)]
    pub paths: bool,
}

/// Prints the part of a document the subjects may see.
pub fn execute(args: ViewArgs, settings: &Settings) -> Result<()> {
    let enforcer = args.policy.enforcer(settings)?;
    let document = documents::load_document(&args.document)?;
    let context = context(&args.subjects);
    let permissions = permissions(&args.permissions, settings);

    if args.paths {
        let paths: Vec<String> = enforcer
            .accessible_paths(&args.resource, &document, &context, &permissions)?
            .iter()
            .map(ToString::to_string)
            .collect();
        return render(&args.policy.format, &Value::from(paths.clone()), || {
            for path in &paths {
                println!("{}", path);
            }
        });
    }

    let view = enforcer.build_json_view_with_allowlist(
        &args.resource,
        &document,
        &context,
        &args.allowlist,
        &permissions,
    )?;
    let format = match args.policy.format.as_str() {
        "yaml" => "yaml",
        _ => "json",
    };
    render(format, &view, || {})
}
