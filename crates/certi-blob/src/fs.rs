//! Filesystem blob store.
//!
//! Blobs live at `{root}/{sha256-hex}`. The reference is the digest, so the
//! file name encodes its content and a re-upload of identical bytes is a
//! no-op. Writes go to a temporary file renamed into place, so a digest path
//! never holds a partial write; an existing file that fails its digest is
//! replaced. Reads verify the digest.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use certi_core::ContentRef;
use sha2::{Digest, Sha256};

use crate::error::BlobError;
use crate::store::{BlobPayload, BlobStore};

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

fn is_digest_hex(s: &str) -> bool {
    s.len() == 64 && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// Content-addressed store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Store rooted at `root`. The directory is created on first put.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a stored blob. `Ok(None)` when absent.
    ///
    /// Fails if the reference is not a digest or the bytes no longer hash
    /// to it.
    pub async fn get(&self, content_ref: &ContentRef) -> Result<Option<Vec<u8>>, BlobError> {
        let digest = content_ref.as_str();
        if !is_digest_hex(digest) {
            return Err(BlobError::Deserialization(format!(
                "not a sha256 reference: {digest}"
            )));
        }
        let bytes = match tokio::fs::read(self.root.join(digest)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let actual = sha256_hex(&bytes);
        if actual != digest {
            return Err(BlobError::Deserialization(format!(
                "blob {digest} is corrupted (content hashes to {actual})"
            )));
        }
        Ok(Some(bytes))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn name(&self) -> &str {
        "fs"
    }

    async fn put(&self, payload: BlobPayload) -> Result<ContentRef, BlobError> {
        let digest = sha256_hex(&payload.bytes);
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.root.join(&digest);
        match tokio::fs::read(&path).await {
            Ok(existing) if sha256_hex(&existing) == digest => {
                tracing::debug!(%digest, "blob already stored");
                return Ok(ContentRef::new(digest));
            }
            Ok(_) => tracing::warn!(%digest, "stored blob fails its digest, rewriting"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let tmp = self.root.join(format!(
            ".{digest}.{}.{}.tmp",
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = write_then_rename(&tmp, &path, &payload.bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(%digest, file_name = %payload.file_name, "stored blob");
        Ok(ContentRef::new(digest))
    }
}

async fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp, path).await
}
