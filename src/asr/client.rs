//! ASR Client
//!
//! Speech to text: normalize the upload, send it as one IAT request, collect
//! the recognized words.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::audio::{normalized_path, AudioAsset, Normalize};
use crate::error::{AsrError, GatewayError, GatewayResult};
use crate::session::{OutboundFrame, StreamingSession, TranscriptAccumulator};

/// Default recognition language
pub const DEFAULT_LANGUAGE: &str = "zh_cn";

/// Speech recognition client
#[derive(Clone)]
pub struct AsrClient {
    session: StreamingSession,
    normalizer: Arc<dyn Normalize>,
    language: String,
    remove_source: bool,
}

impl AsrClient {
    pub fn new(session: StreamingSession, normalizer: Arc<dyn Normalize>) -> Self {
        Self {
            session,
            normalizer,
            language: DEFAULT_LANGUAGE.to_string(),
            remove_source: true,
        }
    }

    /// Language used by [`AsrClient::transcribe`]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Whether the original upload is deleted once a transcription finishes
    pub fn with_remove_source(mut self, remove_source: bool) -> Self {
        self.remove_source = remove_source;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Transcribe the audio file at `audio_path` in the default language
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, AsrError> {
        self.transcribe_with_cancel(audio_path, &self.language, &CancellationToken::new())
            .await
    }

    /// Transcribe in `language`
    pub async fn transcribe_with_language(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, AsrError> {
        self.transcribe_with_cancel(audio_path, language, &CancellationToken::new())
            .await
    }

    /// Transcribe, aborting with `Cancelled` when `cancel` fires.
    ///
    /// The normalized intermediate (and the original upload, unless disabled)
    /// is removed when this returns or is dropped, whatever the outcome.
    pub async fn transcribe_with_cancel(
        &self,
        audio_path: &Path,
        language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AsrError> {
        let mut cleanup = CleanupGuard::default();
        cleanup.track(normalized_path(audio_path));
        if self.remove_source {
            cleanup.track(audio_path.to_path_buf());
        }

        let text = self
            .recognize(audio_path, language, cancel, &mut cleanup)
            .await?;
        tracing::info!("Transcribed {}: {} chars", audio_path.display(), text.chars().count());
        Ok(text)
    }

    async fn recognize(
        &self,
        audio_path: &Path,
        language: &str,
        cancel: &CancellationToken,
        cleanup: &mut CleanupGuard,
    ) -> GatewayResult<String> {
        let asset = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            asset = self.normalizer.normalize(audio_path) => asset?,
        };
        cleanup.track(asset.path.clone());

        let pcm = read_pcm(asset).await?;
        tracing::debug!("Sending {} bytes of PCM ({})", pcm.len(), language);

        let app_id = &self.session.signer().credentials().app_id;
        let frame = OutboundFrame::iat(app_id, language, &pcm);
        drop(pcm);

        self.session
            .run(frame, TranscriptAccumulator::new(), cancel)
            .await
    }
}

async fn read_pcm(asset: AudioAsset) -> GatewayResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || asset.read_pcm())
        .await
        .map_err(|e| GatewayError::Transcode(format!("read task failed: {}", e)))?
}

/// Removes tracked files when dropped
#[derive(Debug, Default)]
struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl CleanupGuard {
    fn track(&mut self, path: PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_guard_removes_tracked_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.wav");
        let b = dir.path().join("b.wav");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        {
            let mut guard = CleanupGuard::default();
            guard.track(a.clone());
            guard.track(a.clone());
            guard.track(dir.path().join("never-created.wav"));
            assert_eq!(guard.paths.len(), 2);
        }

        assert!(!a.exists());
        assert!(b.exists());
    }
}
