use anyhow::{Context, Result};
use enforcer::PolicySnapshot;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Whether a file is read as YAML rather than JSON, decided by its extension.
fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

fn load<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse {} file {}", what, path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {} file {}", what, path.display()))?
    };
    Ok(parsed)
}

/// Loads a policy snapshot from a JSON or YAML file.
pub fn load_policy(path: &Path) -> Result<PolicySnapshot> {
    let snapshot: PolicySnapshot = load(path, "policy")?;
    tracing::debug!(
        "Loaded policy {:?} revision {:?} with {} entries from {}",
        snapshot.policy_id(),
        snapshot.revision(),
        snapshot.entries().len(),
        path.display()
    );
    Ok(snapshot)
}

/// Loads a JSON (or YAML) document to filter.
pub fn load_document(path: &Path) -> Result<Value> {
    load(path, "document")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POLICY_YAML: &str = r#"
policyId: "org.example:twin"
entries:
  OWNER:
    subjects:
      "oauth2:alice": { type: user }
    resources:
      "thing:/":
        grant: [READ, WRITE]
"#;

    #[test]
    fn test_format_follows_extension() {
        assert!(is_yaml(Path::new("policy.yaml")));
        assert!(is_yaml(Path::new("policy.YML")));
        assert!(!is_yaml(Path::new("policy.json")));
        assert!(!is_yaml(Path::new("policy")));
    }

    #[test]
    fn test_load_yaml_policy() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("policy.yaml");
        fs::write(&path, POLICY_YAML).unwrap();

        let snapshot = load_policy(&path).unwrap();
        assert_eq!(snapshot.policy_id(), Some("org.example:twin"));
        assert!(snapshot.entry("OWNER").is_some());
    }

    #[test]
    fn test_parse_errors_name_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
