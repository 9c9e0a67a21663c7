use super::{names, permissions, render, PolicyArgs};
use crate::config::Settings;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::*;
use enforcer::{ResourceKey, SubjectId};
use serde_json::json;
use std::collections::BTreeSet;

/// Which subjects to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scope {
    /// Subjects granted or revoked exactly at the resource
    Exact,
    /// Subjects granted anywhere at or below the resource
    Partial,
    /// Subjects granted the whole subtree
    Unrestricted,
    /// Unrestricted, partial-only and exact grants in one listing
    Classify,
}

#[derive(Debug, Args)]
pub struct SubjectsArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Resource key, e.g. thing:/features
    #[arg(short, long)]
    pub resource: ResourceKey,

    /// Required permission (repeatable, defaults to the configured permissions)
    #[arg(long = "permission")]
    pub permissions: Vec<String>,

    /// Which subjects to list
    #[arg(long, value_enum, default_value_t = Scope::Classify)]
    pub scope: Scope,
}

/// Lists the subjects holding permissions on a resource.
pub fn execute(args: SubjectsArgs, settings: &Settings) -> Result<()> {
    let enforcer = args.policy.enforcer(settings)?;
    let permissions = permissions(&args.permissions, settings);
    let resource = &args.resource;

    let sections: Vec<(&str, BTreeSet<SubjectId>)> = match args.scope {
        Scope::Exact => {
            let effected = enforcer.subjects_with_permission(resource, &permissions)?;
            vec![
                ("granted", effected.granted().clone()),
                ("revoked", effected.revoked().clone()),
            ]
        }
        Scope::Partial => vec![(
            "partial",
            enforcer.subjects_with_partial_permission(resource, &permissions)?,
        )],
        Scope::Unrestricted => vec![(
            "unrestricted",
            enforcer.subjects_with_unrestricted_permission(resource, &permissions)?,
        )],
        Scope::Classify => {
            let classification = enforcer.classify_subjects(resource, &permissions)?;
            vec![
                ("unrestricted", classification.unrestricted().clone()),
                ("partialOnly", classification.partial_only().clone()),
                ("effectedGranted", classification.effected_granted().clone()),
            ]
        }
    };

    let mut output = serde_json::Map::new();
    for (name, subjects) in &sections {
        output.insert(name.to_string(), json!(names(subjects)));
    }
    render(&args.policy.format, &output.into(), || {
        println!(
            "{}",
            format!("=== Subjects with {} on {} ===", permissions, resource).bold()
        );
        for (name, subjects) in &sections {
            println!("{}", format!("[{}]", name).cyan().bold());
            if subjects.is_empty() {
                println!("  {}", "(none)".dimmed());
            }
            for subject in subjects {
                println!("  - {}", subject);
            }
        }
    })
}
