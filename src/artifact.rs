//! Local model artifact resolution with optional remote fetch

use crate::error::StartupError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Resolves the trained artifact on local storage.
///
/// A file already present at the local path is trusted as is. Otherwise it is
/// downloaded from the remote source, if one is configured.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    local_path: PathBuf,
    remote_url: Option<String>,
}

impl ArtifactStore {
    pub fn new(local_path: impl Into<PathBuf>, remote_url: Option<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_url,
        }
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Make sure the artifact exists locally and return its path.
    pub async fn ensure(&self) -> Result<PathBuf, StartupError> {
        if self.local_path.exists() {
            info!(path = %self.local_path.display(), "Model artifact present");
            return Ok(self.local_path.clone());
        }

        let Some(url) = self.remote_url.as_deref() else {
            return Err(StartupError::ArtifactMissing {
                path: self.local_path.clone(),
            });
        };

        info!(url = %url, path = %self.local_path.display(), "Downloading model artifact");
        let bytes = self.download(url).await?;
        info!(
            path = %self.local_path.display(),
            bytes = bytes,
            "Model artifact downloaded successfully"
        );

        Ok(self.local_path.clone())
    }

    /// Stream the remote artifact into a sibling `.part` file and rename it
    /// into place. On any failure the partial file is removed, so the local
    /// path never holds a truncated artifact.
    async fn download(&self, url: &str) -> Result<u64, StartupError> {
        if let Some(parent) = self.local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StartupError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let partial = self.partial_path();
        let written = match fetch_into(url, &partial).await {
            Ok(written) => written,
            Err(e) => {
                discard(&partial).await;
                return Err(e);
            }
        };

        if let Err(source) = tokio::fs::rename(&partial, &self.local_path).await {
            discard(&partial).await;
            return Err(StartupError::Io {
                path: self.local_path.clone(),
                source,
            });
        }

        Ok(written)
    }

    fn partial_path(&self) -> PathBuf {
        let mut partial = self.local_path.clone().into_os_string();
        partial.push(".part");
        PathBuf::from(partial)
    }
}

async fn fetch_into(url: &str, partial: &Path) -> Result<u64, StartupError> {
    let fetch_err = |source| StartupError::Fetch {
        url: url.to_string(),
        source,
    };
    let io_err = |source| StartupError::Io {
        path: partial.to_path_buf(),
        source,
    };

    let mut response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;

    let mut file = tokio::fs::File::create(partial).await.map_err(io_err)?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await.map_err(fetch_err)? {
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.sync_all().await.map_err(io_err)?;

    Ok(written)
}

async fn discard(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => debug!(path = %partial.display(), "Removed partial download"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %partial.display(), error = %e, "Failed to remove partial download"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, Bytes},
        http::StatusCode,
        routing::get,
        Router,
    };

    const MODEL_BYTES: &[u8] = b"onnx-bytes";

    /// Serve a fake artifact on an ephemeral port and return the base URL.
    async fn serve_artifact() -> String {
        let app = Router::new()
            .route("/model.onnx", get(|| async { MODEL_BYTES }))
            .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/truncated",
                get(|| async {
                    Body::from_stream(futures::stream::iter(vec![
                        Ok(Bytes::from_static(b"partial")),
                        Err(io::Error::other("connection dropped")),
                    ]))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_present_artifact_is_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fraud_pipeline.onnx");
        std::fs::write(&path, b"local").unwrap();

        // Unreachable remote: any fetch attempt would fail.
        let store = ArtifactStore::new(&path, Some("http://127.0.0.1:9/model.onnx".to_string()));
        assert_eq!(store.ensure().await.unwrap(), path);
        assert_eq!(std::fs::read(&path).unwrap(), b"local");
    }

    #[tokio::test]
    async fn test_missing_artifact_without_remote_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("fraud_pipeline.onnx"), None);

        let err = store.ensure().await.unwrap_err();
        assert!(matches!(err, StartupError::ArtifactMissing { .. }));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_downloaded() {
        let base = serve_artifact().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("fraud_pipeline.onnx");

        let store = ArtifactStore::new(&path, Some(format!("{}/model.onnx", base)));
        assert_eq!(store.ensure().await.unwrap(), path);
        assert_eq!(std::fs::read(&path).unwrap(), MODEL_BYTES);
        assert!(!dir.path().join("models").join("fraud_pipeline.onnx.part").exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing_behind() {
        let base = serve_artifact().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fraud_pipeline.onnx");

        let store = ArtifactStore::new(&path, Some(format!("{}/gone", base)));
        let err = store.ensure().await.unwrap_err();

        assert!(matches!(err, StartupError::Fetch { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_interrupted_download_removes_partial_file() {
        let base = serve_artifact().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fraud_pipeline.onnx");

        let store = ArtifactStore::new(&path, Some(format!("{}/truncated", base)));
        let err = store.ensure().await.unwrap_err();

        assert!(matches!(err, StartupError::Fetch { .. }));
        assert!(!path.exists());
        assert!(!dir.path().join("fraud_pipeline.onnx.part").exists());
    }
}
