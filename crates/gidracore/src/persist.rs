//! Best-effort snapshot of the last-known-good tree.
//!
//! One JSON file next to the process: the tree, the provider version token
//! and the capture time. Loaded at startup when the first refresh fails so
//! a provider outage does not force an empty menu after a restart.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tree::GuideTree;

/// The persisted form of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub tree: GuideTree,
    pub version: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Writes the snapshot as JSON, through a temp file so a crash mid-write
/// never leaves a truncated snapshot behind.
pub async fn save(path: &Path, snapshot: &TreeSnapshot) -> Result<()> {
    let payload = serde_json::to_vec_pretty(snapshot).context("serializing tree snapshot")?;

    let tmp = path.with_extension("json.tmp");
    fs_err::tokio::write(&tmp, &payload)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs_err::tokio::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming into {}", path.display()))?;

    log::debug!("Snapshot saved to {}", path.display());
    Ok(())
}

/// Reads a snapshot back. Missing or corrupt files are ordinary errors for
/// the caller to log and ignore.
pub async fn load(path: &Path) -> Result<TreeSnapshot> {
    let payload = fs_err::tokio::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&payload).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_rows;
    use pretty_assertions::assert_eq;

    fn sample_snapshot() -> TreeSnapshot {
        let rows = vec![
            vec!["".to_string(), "Интро".to_string(), "Привет".to_string()],
            vec!["Интро".to_string(), "FAQ".to_string(), "Ответы".to_string()],
        ];
        let (tree, _) = parse_rows(&rows);
        TreeSnapshot {
            tree,
            version: Some("2026-01-12T10:00:00.000Z".to_string()),
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = sample_snapshot();

        save(&path, &snapshot).await.unwrap();
        let loaded = load(&path).await.unwrap();

        assert_eq!(loaded, snapshot);
        assert!(!path.with_extension("json.tmp").exists(), "temp file must be gone");
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs_err::tokio::write(&path, b"{not json").await.unwrap();
        assert!(load(&path).await.is_err());
    }
}
