//! Streaming session module
//!
//! Implements the single-request / multi-response session protocol shared by
//! speech recognition and speech synthesis.

mod accumulator;
pub mod constants;
mod protocol;
mod session;
mod transport;

pub use accumulator::{Accumulator, AudioAccumulator, TranscriptAccumulator};
pub use protocol::{
    Business, CandidateWord, Common, FrameData, FrameStatus, IatBusiness, IatResult,
    InboundFrame, OutboundData, OutboundFrame, SessionMode, TtsBusiness, WordSegment,
};
pub use session::{SessionHandle, SessionState, StreamingSession};
pub use transport::{Connector, FrameStream, WsConnector, WsFrameStream};
