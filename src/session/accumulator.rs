//! Result accumulation
//!
//! Each session mode folds inbound frames into its result with an [`Accumulator`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::protocol::FrameData;
use crate::error::{GatewayError, GatewayResult};

/// Folds the payload of successive inbound frames into a result
pub trait Accumulator: Send {
    type Output: Send;

    /// Absorb one frame's payload, in arrival order
    fn absorb(&mut self, data: &FrameData) -> GatewayResult<()>;

    /// Produce the result once the terminal frame has been absorbed
    fn finish(self) -> Self::Output;
}

/// Concatenates recognized word tokens
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    text: String,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for TranscriptAccumulator {
    type Output = String;

    fn absorb(&mut self, data: &FrameData) -> GatewayResult<()> {
        if let Some(result) = &data.result {
            for word in result.words() {
                self.text.push_str(word);
            }
        }
        Ok(())
    }

    fn finish(self) -> String {
        self.text.trim().to_string()
    }
}

/// Concatenates decoded audio fragments
#[derive(Debug, Default)]
pub struct AudioAccumulator {
    audio: Vec<u8>,
    fragments: usize,
}

impl AudioAccumulator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for AudioAccumulator {
    type Output = Vec<u8>;

    fn absorb(&mut self, data: &FrameData) -> GatewayResult<()> {
        match data.audio.as_deref() {
            Some(fragment) if !fragment.is_empty() => {
                STANDARD
                    .decode_vec(fragment, &mut self.audio)
                    .map_err(|e| {
                        GatewayError::Protocol(format!(
                            "invalid audio fragment {}: {}",
                            self.fragments, e
                        ))
                    })?;
                self.fragments += 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.audio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::protocol::{CandidateWord, IatResult, WordSegment};

    fn words(tokens: &[&str]) -> FrameData {
        FrameData {
            status: Some(1),
            result: Some(IatResult {
                ws: tokens
                    .iter()
                    .map(|w| WordSegment {
                        cw: vec![CandidateWord { w: w.to_string() }],
                    })
                    .collect(),
            }),
            audio: None,
        }
    }

    fn audio(b64: &str) -> FrameData {
        FrameData {
            status: Some(1),
            result: None,
            audio: Some(b64.to_string()),
        }
    }

    #[test]
    fn test_transcript_in_arrival_order() {
        let mut acc = TranscriptAccumulator::new();
        acc.absorb(&words(&["血", "压"])).unwrap();
        acc.absorb(&FrameData::default()).unwrap();
        acc.absorb(&words(&["一", "二", "零"])).unwrap();
        assert_eq!(acc.finish(), "血压一二零");
    }

    #[test]
    fn test_transcript_is_trimmed() {
        let mut acc = TranscriptAccumulator::new();
        acc.absorb(&words(&[" ", "ok", "。 "])).unwrap();
        assert_eq!(acc.finish(), "ok。");
    }

    #[test]
    fn test_audio_fragments_concatenate() {
        let mut acc = AudioAccumulator::new();
        acc.absorb(&audio("QQ==")).unwrap();
        acc.absorb(&audio("")).unwrap();
        acc.absorb(&FrameData::default()).unwrap();
        acc.absorb(&audio("Qg==")).unwrap();
        assert_eq!(acc.finish(), b"AB".to_vec());
    }

    #[test]
    fn test_invalid_audio_fragment() {
        let mut acc = AudioAccumulator::new();
        let err = acc.absorb(&audio("!!not-base64!!")).unwrap_err();
        assert!(matches!(err, GatewayError::Protocol(_)));
    }
}
