//! Speech Service Protocol Constants

/// Speech recognition (IAT) WebSocket host
pub const IAT_HOST: &str = "wss://iat-api.xfyun.cn";
/// Speech recognition (IAT) request path
pub const IAT_PATH: &str = "/v2/iat";

/// Speech synthesis WebSocket host
pub const TTS_HOST: &str = "wss://tts-api.xfyun.cn";
/// Speech synthesis request path
pub const TTS_PATH: &str = "/v2/tts";

/// Canonical audio configuration
pub const SAMPLE_RATE: u32 = 16000;
pub const CHANNELS: u16 = 1;
pub const BIT_DEPTH: u16 = 16;

/// Audio format announced in IAT frames
pub const IAT_AUDIO_FORMAT: &str = "audio/L16;rate=16000";
pub const IAT_AUDIO_ENCODING: &str = "raw";

/// IAT business parameters
pub const IAT_DOMAIN: &str = "iat";
pub const IAT_ACCENT: &str = "mandarin";
pub const IAT_VINFO: u8 = 1;
/// Trailing silence (ms) before the service ends recognition
pub const IAT_VAD_EOS_MS: u32 = 3000;

/// TTS business parameters
pub const TTS_TEXT_ENCODING: &str = "UTF8";
pub const TTS_SFL: u8 = 1;

/// Frame status values
pub const STATUS_FIRST: u8 = 0;
pub const STATUS_CONTINUE: u8 = 1;
pub const STATUS_LAST: u8 = 2;
