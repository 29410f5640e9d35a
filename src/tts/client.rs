//! TTS Client
//!
//! Text to speech over a single streaming session.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::error::{GatewayError, TtsError};
use crate::session::{AudioAccumulator, OutboundFrame, StreamingSession};

/// Output encoding (`aue`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// MP3
    #[default]
    Lame,
    /// Raw 16 kHz PCM
    Raw,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Lame => "lame",
            AudioEncoding::Raw => "raw",
        }
    }

    /// Conventional file extension for audio in this encoding
    pub fn extension(&self) -> &'static str {
        match self {
            AudioEncoding::Lame => "mp3",
            AudioEncoding::Raw => "pcm",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AudioEncoding {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lame" | "mp3" => Ok(AudioEncoding::Lame),
            "raw" | "pcm" => Ok(AudioEncoding::Raw),
            other => Err(GatewayError::InvalidInput(format!(
                "unknown audio encoding {:?}",
                other
            ))),
        }
    }
}

/// Voice selection for synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceOptions {
    /// Speaker (`vcn`), e.g. `xiaoyan` (female) or `aisjiuxu` (male)
    pub voice: String,
    pub encoding: AudioEncoding,
}

impl VoiceOptions {
    pub fn new(voice: impl Into<String>, encoding: AudioEncoding) -> Self {
        Self {
            voice: voice.into(),
            encoding,
        }
    }
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self::new("xiaoyan", AudioEncoding::Lame)
    }
}

/// Speech synthesis client
#[derive(Clone)]
pub struct TtsClient {
    session: StreamingSession,
    default_voice: VoiceOptions,
}

impl TtsClient {
    pub fn new(session: StreamingSession) -> Self {
        Self {
            session,
            default_voice: VoiceOptions::default(),
        }
    }

    /// Voice used by [`TtsClient::synthesize_default`]
    pub fn with_default_voice(mut self, voice: VoiceOptions) -> Self {
        self.default_voice = voice;
        self
    }

    pub fn default_voice(&self) -> &VoiceOptions {
        &self.default_voice
    }

    /// Synthesize `text`; returns the encoded audio bytes
    pub async fn synthesize(&self, text: &str, voice: &VoiceOptions) -> Result<Vec<u8>, TtsError> {
        self.synthesize_with_cancel(text, voice, &CancellationToken::new())
            .await
    }

    /// Synthesize `text` with the default voice
    pub async fn synthesize_default(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        self.synthesize(text, &self.default_voice).await
    }

    /// Synthesize `text`, aborting with `Cancelled` when `cancel` fires
    pub async fn synthesize_with_cancel(
        &self,
        text: &str,
        voice: &VoiceOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TtsError> {
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidInput("text is empty".to_string()).into());
        }

        let app_id = &self.session.signer().credentials().app_id;
        let frame = OutboundFrame::tts(app_id, &voice.voice, voice.encoding, text);

        tracing::info!(
            "Synthesizing {} chars (voice={}, aue={})",
            text.chars().count(),
            voice.voice,
            voice.encoding
        );
        let audio = self
            .session
            .run(frame, AudioAccumulator::new(), cancel)
            .await?;
        tracing::info!("Synthesized {} bytes of audio", audio.len());
        Ok(audio)
    }
}
