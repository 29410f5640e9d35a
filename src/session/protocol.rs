//! Speech Service Protocol
//!
//! Outbound request frames and inbound response frames. Every session sends
//! exactly one outbound frame (`data.status == 2`) and reads inbound frames
//! until one carries `data.status == 2`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::constants::*;
use crate::error::{GatewayError, GatewayResult};
use crate::tts::AudioEncoding;

/// Session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Speech to text
    Iat,
    /// Text to speech
    Tts,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionMode::Iat => write!(f, "iat"),
            SessionMode::Tts => write!(f, "tts"),
        }
    }
}

/// The single request frame of a session
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    pub common: Common,
    pub business: Business,
    pub data: OutboundData,
}

#[derive(Debug, Clone, Serialize)]
pub struct Common {
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Business {
    Iat(IatBusiness),
    Tts(TtsBusiness),
}

#[derive(Debug, Clone, Serialize)]
pub struct IatBusiness {
    pub language: String,
    pub domain: String,
    pub accent: String,
    pub vinfo: u8,
    pub vad_eos: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TtsBusiness {
    pub aue: AudioEncoding,
    pub vcn: String,
    pub tte: String,
    pub sfl: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundData {
    Audio {
        status: u8,
        format: String,
        encoding: String,
        audio: String,
    },
    Text {
        status: u8,
        text: String,
    },
}

impl OutboundFrame {
    /// Build the IAT request carrying the whole utterance as canonical PCM
    pub fn iat(app_id: &str, language: &str, pcm: &[u8]) -> Self {
        Self {
            common: Common {
                app_id: app_id.to_string(),
            },
            business: Business::Iat(IatBusiness {
                language: language.to_string(),
                domain: IAT_DOMAIN.to_string(),
                accent: IAT_ACCENT.to_string(),
                vinfo: IAT_VINFO,
                vad_eos: IAT_VAD_EOS_MS,
            }),
            data: OutboundData::Audio {
                status: STATUS_LAST,
                format: IAT_AUDIO_FORMAT.to_string(),
                encoding: IAT_AUDIO_ENCODING.to_string(),
                audio: STANDARD.encode(pcm),
            },
        }
    }

    /// Build the TTS request for `text`
    pub fn tts(app_id: &str, voice: &str, encoding: AudioEncoding, text: &str) -> Self {
        Self {
            common: Common {
                app_id: app_id.to_string(),
            },
            business: Business::Tts(TtsBusiness {
                aue: encoding,
                vcn: voice.to_string(),
                tte: TTS_TEXT_ENCODING.to_string(),
                sfl: TTS_SFL,
            }),
            data: OutboundData::Text {
                status: STATUS_LAST,
                text: STANDARD.encode(text.as_bytes()),
            },
        }
    }

    pub fn mode(&self) -> SessionMode {
        match self.business {
            Business::Iat(_) => SessionMode::Iat,
            Business::Tts(_) => SessionMode::Tts,
        }
    }

    /// Serialize to the JSON text sent on the wire
    pub fn to_json(&self) -> GatewayResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Response frame from the service
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub data: Option<FrameData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameData {
    #[serde(default)]
    pub status: Option<u8>,
    /// IAT recognition result
    #[serde(default)]
    pub result: Option<IatResult>,
    /// TTS audio fragment, base64
    #[serde(default)]
    pub audio: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IatResult {
    #[serde(default)]
    pub ws: Vec<WordSegment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordSegment {
    #[serde(default)]
    pub cw: Vec<CandidateWord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateWord {
    #[serde(default)]
    pub w: String,
}

impl IatResult {
    /// Word tokens in array order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.ws
            .iter()
            .flat_map(|seg| seg.cw.iter())
            .map(|cw| cw.w.as_str())
    }
}

/// Position of an inbound frame in the result stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    First,
    Continue,
    Last,
}

impl FrameStatus {
    /// A missing status counts as a continuation frame
    pub fn from_raw(status: Option<u8>) -> GatewayResult<Self> {
        match status {
            Some(STATUS_FIRST) => Ok(FrameStatus::First),
            None | Some(STATUS_CONTINUE) => Ok(FrameStatus::Continue),
            Some(STATUS_LAST) => Ok(FrameStatus::Last),
            Some(other) => Err(GatewayError::Protocol(format!(
                "unexpected frame status {}",
                other
            ))),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == FrameStatus::Last
    }
}

/// Envelope read before `data` is trusted
#[derive(Deserialize)]
struct FrameHeader {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

fn malformed(e: serde_json::Error) -> GatewayError {
    GatewayError::Protocol(format!("malformed frame: {}", e))
}

impl InboundFrame {
    /// Parse one inbound message
    ///
    /// `data` is only decoded when `code` is 0; error frames keep their code
    /// whatever shape their payload has.
    pub fn parse(text: &str) -> GatewayResult<Self> {
        let header: FrameHeader = serde_json::from_str(text).map_err(malformed)?;
        let data = match header.data {
            Some(value) if header.code == 0 && !value.is_null() => {
                Some(serde_json::from_value(value).map_err(malformed)?)
            }
            _ => None,
        };
        Ok(Self {
            code: header.code,
            message: header.message,
            sid: header.sid,
            data,
        })
    }

    pub fn status(&self) -> GatewayResult<FrameStatus> {
        FrameStatus::from_raw(self.data.as_ref().and_then(|d| d.status))
    }
}
