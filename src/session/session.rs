//! Streaming Session
//!
//! One session = one signed connection, one outbound frame, and a receive loop
//! that runs until the service sends a terminal frame, reports an error, or
//! the caller cancels.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use super::accumulator::Accumulator;
use super::protocol::{InboundFrame, OutboundFrame};
use super::transport::{Connector, FrameStream};
use crate::auth::AuthSigner;
use crate::data::Endpoint;
use crate::error::{GatewayError, GatewayResult};

/// Upper bound on the closing handshake
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Sending,
    Awaiting,
    Done,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "CONNECTING",
            SessionState::Open => "OPEN",
            SessionState::Sending => "SENDING",
            SessionState::Awaiting => "AWAITING",
            SessionState::Done => "DONE",
            SessionState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Tracks the state of one run for logging
struct Lifecycle {
    id: String,
    state: SessionState,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            state: SessionState::Connecting,
        }
    }

    fn enter(&mut self, next: SessionState) {
        tracing::debug!("[{}] {} -> {}", self.id, self.state, next);
        self.state = next;
    }
}

/// Drives sessions against one endpoint
#[derive(Clone)]
pub struct StreamingSession {
    connector: Arc<dyn Connector>,
    signer: AuthSigner,
    endpoint: Endpoint,
    receive_timeout: Option<Duration>,
}

impl StreamingSession {
    pub fn new(connector: Arc<dyn Connector>, signer: AuthSigner, endpoint: Endpoint) -> Self {
        Self {
            connector,
            signer,
            endpoint,
            receive_timeout: None,
        }
    }

    /// Fail the session if no frame arrives within `timeout`
    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn signer(&self) -> &AuthSigner {
        &self.signer
    }

    /// Run one session to completion.
    ///
    /// The connection is closed on every exit path. On failure nothing
    /// accumulated so far is returned.
    pub async fn run<A: Accumulator>(
        &self,
        frame: OutboundFrame,
        accumulator: A,
        cancel: &CancellationToken,
    ) -> GatewayResult<A::Output> {
        let mut lifecycle = Lifecycle::new();
        let mode = frame.mode();

        let signed = self.signer.sign_now(&self.endpoint)?;
        tracing::info!(
            "[{}] Connecting {} session to {}{}",
            lifecycle.id,
            mode,
            self.endpoint.host,
            self.endpoint.path
        );

        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            result = self.connector.connect(signed.as_str()) => result,
        };
        let mut stream = match connected {
            Ok(stream) => stream,
            Err(e) => {
                lifecycle.enter(SessionState::Failed);
                tracing::warn!("[{}] Connect failed: {}", lifecycle.id, e);
                return Err(e);
            }
        };
        lifecycle.enter(SessionState::Open);

        let result = self
            .exchange(&mut *stream, frame, accumulator, cancel, &mut lifecycle)
            .await;

        if tokio::time::timeout(CLOSE_TIMEOUT, stream.close()).await.is_err() {
            tracing::debug!("[{}] Close handshake timed out", lifecycle.id);
        }

        match &result {
            Ok(_) => {
                lifecycle.enter(SessionState::Done);
                tracing::info!("[{}] {} session finished", lifecycle.id, mode);
            }
            Err(e) => {
                lifecycle.enter(SessionState::Failed);
                tracing::warn!("[{}] {} session failed: {}", lifecycle.id, mode, e);
            }
        }
        result
    }

    /// Run one session on its own task
    pub fn spawn<A>(&self, frame: OutboundFrame, accumulator: A) -> SessionHandle<A::Output>
    where
        A: Accumulator + 'static,
        A::Output: 'static,
    {
        let cancel = CancellationToken::new();
        let session = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move { session.run(frame, accumulator, &token).await });
        SessionHandle {
            guard: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    async fn exchange<A: Accumulator>(
        &self,
        stream: &mut dyn FrameStream,
        frame: OutboundFrame,
        mut accumulator: A,
        cancel: &CancellationToken,
        lifecycle: &mut Lifecycle,
    ) -> GatewayResult<A::Output> {
        lifecycle.enter(SessionState::Sending);
        let payload = frame.to_json()?;
        tracing::debug!("[{}] Sending request frame ({} bytes)", lifecycle.id, payload.len());
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            sent = stream.send_text(payload) => sent?,
        }

        lifecycle.enter(SessionState::Awaiting);
        let mut frames = 0usize;
        loop {
            let message = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                message = self.receive(&mut *stream) => message?,
            };
            let text = message.ok_or_else(|| {
                GatewayError::Protocol(format!(
                    "connection closed after {} frames without a terminal frame",
                    frames
                ))
            })?;
            frames += 1;

            let inbound = InboundFrame::parse(&text)?;
            if inbound.code != 0 {
                return Err(GatewayError::Upstream {
                    code: inbound.code,
                    message: text,
                });
            }
            let status = inbound.status()?;
            if let Some(data) = &inbound.data {
                accumulator.absorb(data)?;
            }
            tracing::debug!(
                "[{}] Frame {} status={:?} sid={}",
                lifecycle.id,
                frames,
                status,
                inbound.sid.as_deref().unwrap_or("-")
            );

            if status.is_terminal() {
                return Ok(accumulator.finish());
            }
        }
    }

    async fn receive(&self, stream: &mut dyn FrameStream) -> GatewayResult<Option<String>> {
        let next = match self.receive_timeout {
            Some(limit) => tokio::time::timeout(limit, stream.next_text())
                .await
                .map_err(|_| GatewayError::Timeout(limit))?,
            None => stream.next_text().await,
        };
        next.transpose()
    }
}

/// A session running on its own task
///
/// Dropping the handle cancels the session.
pub struct SessionHandle<T> {
    cancel: CancellationToken,
    guard: DropGuard,
    task: JoinHandle<GatewayResult<T>>,
}

impl<T> SessionHandle<T> {
    /// Close the connection and fail the session with `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for DONE or FAILED
    ///
    /// A panic inside the session task is resumed on the caller.
    pub async fn result(self) -> GatewayResult<T> {
        let SessionHandle { guard, task, .. } = self;
        let outcome = task.await;
        guard.disarm();
        match outcome {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(GatewayError::Cancelled),
        }
    }
}
