//! # Pinata IPFS Pinning Adapter
//!
//! Uploads a file with `POST {api}/pinning/pinFileToIPFS` as a multipart
//! form with a single `file` part. The content reference is the response's
//! `IpfsHash` (a CID). Authentication is by the `pinata_api_key` and
//! `pinata_secret_api_key` headers.

use async_trait::async_trait;
use certi_core::ContentRef;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::PinataConfig;
use crate::error::BlobError;
use crate::store::{BlobPayload, BlobStore};

const PIN_FILE_PATH: &str = "pinning/pinFileToIPFS";

#[derive(Debug, Deserialize)]
struct PinFileResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Blob store backed by Pinata.
#[derive(Debug)]
pub struct PinataBlobStore {
    client: reqwest::Client,
    config: PinataConfig,
}

impl PinataBlobStore {
    pub fn new(config: PinataConfig) -> Result<Self, BlobError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BlobError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{PIN_FILE_PATH}",
            self.config.api_url.as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl BlobStore for PinataBlobStore {
    fn name(&self) -> &str {
        "pinata"
    }

    async fn put(&self, payload: BlobPayload) -> Result<ContentRef, BlobError> {
        let size = payload.bytes.len();
        let part = Part::bytes(payload.bytes).file_name(payload.file_name);
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.endpoint())
            .header("pinata_api_key", &self.config.api_key)
            .header("pinata_secret_api_key", self.config.api_secret.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BlobError::Unavailable("pinFileToIPFS: request timed out".into())
                } else {
                    BlobError::Unavailable(format!("pinFileToIPFS: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BlobError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let pinned: PinFileResponse = resp
            .json()
            .await
            .map_err(|e| BlobError::Deserialization(e.to_string()))?;
        if pinned.ipfs_hash.trim().is_empty() {
            return Err(BlobError::Deserialization("empty IpfsHash".into()));
        }

        tracing::debug!(cid = %pinned.ipfs_hash, size, "pinned file");
        Ok(ContentRef::new(pinned.ipfs_hash))
    }
}
