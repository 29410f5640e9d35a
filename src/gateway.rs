//! Speech Gateway
//!
//! The entry points used by the rest of the backend: `transcribe` and
//! `synthesize`. Built once at startup from [`GatewayConfig`].

use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::asr::AsrClient;
use crate::audio::{AudioNormalizer, Normalize};
use crate::auth::AuthSigner;
use crate::data::GatewayConfig;
use crate::error::{AsrError, GatewayResult, TtsError};
use crate::session::{Connector, StreamingSession, WsConnector};
use crate::tts::{TtsClient, VoiceOptions};

/// ASR + TTS clients sharing one credential set and connector
#[derive(Clone)]
pub struct SpeechGateway {
    asr: AsrClient,
    tts: TtsClient,
}

impl SpeechGateway {
    /// Build the gateway with a WebSocket connector and the ffmpeg normalizer
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let connector: Arc<dyn Connector> =
            Arc::new(WsConnector::from_policy(config.tls.insecure_skip_verify));
        let normalizer: Arc<dyn Normalize> =
            Arc::new(AudioNormalizer::new(config.transcoder.program.clone()));
        Self::with_parts(config, connector, normalizer)
    }

    /// Build the gateway around a custom connector and normalizer
    pub fn with_parts(
        config: &GatewayConfig,
        connector: Arc<dyn Connector>,
        normalizer: Arc<dyn Normalize>,
    ) -> GatewayResult<Self> {
        config.credentials.validate()?;

        let signer = AuthSigner::new(Arc::new(config.credentials.clone()));
        let timeout = config.session.receive_timeout();

        let iat_session =
            StreamingSession::new(connector.clone(), signer.clone(), config.iat.endpoint.clone())
                .with_receive_timeout(timeout);
        let tts_session = StreamingSession::new(connector, signer, config.tts.endpoint.clone())
            .with_receive_timeout(timeout);

        let asr = AsrClient::new(iat_session, normalizer)
            .with_language(config.iat.language.clone())
            .with_remove_source(config.asr.remove_source);
        let tts = TtsClient::new(tts_session).with_default_voice(VoiceOptions::new(
            config.tts.voice.clone(),
            config.tts.encoding,
        ));

        tracing::info!(
            "Speech gateway ready (app_id={}, iat={}{}, tts={}{})",
            config.credentials.app_id,
            config.iat.endpoint.host,
            config.iat.endpoint.path,
            config.tts.endpoint.host,
            config.tts.endpoint.path
        );
        Ok(Self { asr, tts })
    }

    pub fn asr(&self) -> &AsrClient {
        &self.asr
    }

    pub fn tts(&self) -> &TtsClient {
        &self.tts
    }

    /// Transcribe an uploaded audio file
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, AsrError> {
        self.asr.transcribe(audio_path).await
    }

    pub async fn transcribe_with_language(
        &self,
        audio_path: &Path,
        language: &str,
    ) -> Result<String, AsrError> {
        self.asr.transcribe_with_language(audio_path, language).await
    }

    pub async fn transcribe_with_cancel(
        &self,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, AsrError> {
        self.asr
            .transcribe_with_cancel(audio_path, self.asr.language(), cancel)
            .await
    }

    /// Synthesize `text` into encoded audio
    pub async fn synthesize(&self, text: &str, voice: &VoiceOptions) -> Result<Vec<u8>, TtsError> {
        self.tts.synthesize(text, voice).await
    }

    pub async fn synthesize_default(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        self.tts.synthesize_default(text).await
    }

    pub async fn synthesize_with_cancel(
        &self,
        text: &str,
        voice: &VoiceOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TtsError> {
        self.tts.synthesize_with_cancel(text, voice, cancel).await
    }
}
