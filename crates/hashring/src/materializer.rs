use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use crate::definition::{self, HashringConfig};
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::ownership::Ownership;

/// What materializing a reconciled configuration did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Materialized {
    /// The derived file already held these bytes; nothing was written.
    Unchanged(Fingerprint),

    /// The derived file was (re)written.
    Written(Fingerprint),
}

impl Materialized {
    /// Fingerprint of the derived file after materializing.
    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Unchanged(f) | Self::Written(f) => *f,
        }
    }

    /// Whether a write happened.
    #[must_use]
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Writes reconciled hashrings to disk when, and only when, their content
/// changed.
#[derive(Clone, Debug, Default)]
pub struct Materializer {
    ownership: Ownership,
}

impl Materializer {
    /// Creates a new `Materializer` applying `ownership` after each write.
    #[must_use]
    pub const fn new(ownership: Ownership) -> Self {
        Self { ownership }
    }

    /// Serializes `hashrings` and writes them to `path` unless the file
    /// already holds identical bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file at `path` cannot be read, the
    /// owner cannot be resolved, or the write or ownership change fails.
    /// Nothing is written in the first two cases.
    pub async fn materialize(
        &self,
        hashrings: &[HashringConfig],
        path: &Path,
    ) -> Result<Materialized> {
        let content = definition::encode(hashrings)?;
        let fingerprint = Fingerprint::of(&content);

        match fs::read(path).await {
            Ok(existing) => {
                if Fingerprint::of(&existing) == fingerprint {
                    debug!("hashring file {:?} is OK, no update needed", path);
                    return Ok(Materialized::Unchanged(fingerprint));
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::ReadDerived {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }

        // User database lookups and chown block, keep them off the runtime workers.
        let ownership = self.ownership.clone();
        let owner = spawn_blocking(move || ownership.resolve()).await??;

        write_file(path, &content).await?;

        if let Some(owner) = owner {
            let path = path.to_path_buf();
            spawn_blocking(move || owner.apply(&path)).await??;
        }

        info!("file {:?} saved ({})", path, fingerprint);

        Ok(Materialized::Written(fingerprint))
    }
}

async fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    let to_error = |source: std::io::Error| Error::WriteDerived {
        path: PathBuf::from(path),
        source,
    };

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
        .await
        .map_err(to_error)?;

    file.write_all(content).await.map_err(to_error)?;
    file.flush().await.map_err(to_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    fn ring(endpoints: &[&str]) -> Vec<HashringConfig> {
        vec![HashringConfig {
            hashring: Some("default".to_string()),
            tenants: vec![],
            endpoints: endpoints.iter().map(ToString::to_string).collect(),
        }]
    }

    #[tokio::test]
    async fn test_writes_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hashrings_generated.json");

        let outcome = Materializer::default()
            .materialize(&ring(&["a:1"]), &path)
            .await
            .unwrap();

        assert!(outcome.is_written());
        assert_eq!(
            std::fs::read(&path).unwrap(),
            br#"[{"hashring":"default","endpoints":["a:1"]}]"#
        );
        assert_eq!(
            outcome.fingerprint(),
            Fingerprint::of(&std::fs::read(&path).unwrap())
        );
    }

    #[tokio::test]
    async fn test_second_run_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hashrings_generated.json");
        let materializer = Materializer::default();

        let first = materializer
            .materialize(&ring(&["a:1", "c:1"]), &path)
            .await
            .unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let second = materializer
            .materialize(&ring(&["a:1", "c:1"]), &path)
            .await
            .unwrap();

        assert!(first.is_written());
        assert_eq!(second, Materialized::Unchanged(first.fingerprint()));
        assert_eq!(
            std::fs::metadata(&path).unwrap().modified().unwrap(),
            modified
        );
    }

    #[tokio::test]
    async fn test_change_triggers_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hashrings_generated.json");
        let materializer = Materializer::default();

        let first = materializer
            .materialize(&ring(&["a:1", "c:1"]), &path)
            .await
            .unwrap();
        let second = materializer
            .materialize(&ring(&["a:1"]), &path)
            .await
            .unwrap();

        assert!(second.is_written());
        assert_ne!(first.fingerprint(), second.fingerprint());

        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(
            definition::decode(&path, &on_disk).unwrap(),
            ring(&["a:1"])
        );
    }

    #[tokio::test]
    async fn test_empty_membership_is_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hashrings_generated.json");

        let outcome = Materializer::default()
            .materialize(&ring(&[]), &path)
            .await
            .unwrap();

        assert!(outcome.is_written());
        assert_eq!(
            std::fs::read(&path).unwrap(),
            br#"[{"hashring":"default","endpoints":[]}]"#
        );
    }

    #[tokio::test]
    async fn test_unreadable_existing_file_aborts() {
        let dir = tempdir().unwrap();
        // A directory at the target path exists but cannot be read as a file.
        let path = dir.path().join("hashrings_generated.json");
        std::fs::create_dir(&path).unwrap();

        let result = Materializer::default()
            .materialize(&ring(&["a:1"]), &path)
            .await;

        assert!(matches!(result, Err(Error::ReadDerived { .. })));
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_unknown_owner_leaves_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hashrings_generated.json");
        std::fs::write(&path, b"previous").unwrap();

        let result = Materializer::new(Ownership::User("ringkeeper-no-such-user".to_string()))
            .materialize(&ring(&["a:1"]), &path)
            .await;

        assert!(matches!(result, Err(Error::UnknownOwner(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn test_current_user_owner_is_applied() {
        use nix::unistd::{Uid, User};

        let Some(user) = User::from_uid(Uid::current()).unwrap() else {
            return;
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("hashrings_generated.json");

        let outcome = Materializer::new(Ownership::User(user.name))
            .materialize(&ring(&["a:1"]), &path)
            .await
            .unwrap();

        assert!(outcome.is_written());
        assert_eq!(
            std::fs::read(&path).unwrap(),
            br#"[{"hashring":"default","endpoints":["a:1"]}]"#
        );
    }

    #[tokio::test]
    async fn test_unwritable_target() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("hashrings_generated.json");

        let result = Materializer::default()
            .materialize(&ring(&["a:1"]), &path)
            .await;

        assert!(matches!(result, Err(Error::WriteDerived { .. })));
    }
}
