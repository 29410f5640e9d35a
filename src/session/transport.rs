//! WebSocket Transport
//!
//! The session talks to the wire through [`Connector`] / [`FrameStream`]. The
//! production implementation is a tokio-tungstenite WebSocket.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector as TlsConnector};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{GatewayError, GatewayResult};

/// Opens message-framed connections to signed URLs
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> GatewayResult<Box<dyn FrameStream>>;
}

/// One open, message-framed connection
#[async_trait]
pub trait FrameStream: Send {
    /// Send one text message
    async fn send_text(&mut self, text: String) -> GatewayResult<()>;

    /// Next text message; `None` once the peer has closed the connection
    async fn next_text(&mut self) -> Option<GatewayResult<String>>;

    /// Close the connection. Must be safe to call on a broken connection.
    async fn close(&mut self);
}

/// WebSocket connector
pub struct WsConnector {
    tls: Option<TlsConnector>,
}

impl WsConnector {
    /// Connector validating server certificates against the native roots
    pub fn new() -> Self {
        Self { tls: None }
    }

    /// Connector that accepts any server certificate
    pub fn insecure() -> Self {
        tracing::warn!(
            "TLS certificate validation is DISABLED for speech service connections \
             (tls.insecure_skip_verify = true)"
        );
        let config = rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(danger::AcceptAnyCertificate))
            .with_no_client_auth();
        Self {
            tls: Some(TlsConnector::Rustls(Arc::new(config))),
        }
    }

    /// Build from the configured TLS policy
    pub fn from_policy(insecure_skip_verify: bool) -> Self {
        if insecure_skip_verify {
            Self::insecure()
        } else {
            Self::new()
        }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Box<dyn FrameStream>> {
        let (stream, response) = connect_async_tls_with_config(url, None, false, self.tls.clone())
            .await
            .map_err(|e| GatewayError::Connect(e.to_string()))?;
        tracing::debug!("WebSocket handshake completed: {}", response.status());
        Ok(Box::new(WsFrameStream { inner: stream }))
    }
}

/// WebSocket connection carrying JSON text frames
pub struct WsFrameStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn send_text(&mut self, text: String) -> GatewayResult<()> {
        self.inner
            .send(Message::Text(text))
            .await
            .map_err(|e| GatewayError::Connect(format!("send failed: {}", e)))
    }

    async fn next_text(&mut self) -> Option<GatewayResult<String>> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(e) => {
                    return Some(Err(GatewayError::Connect(format!("receive failed: {}", e))))
                }
            };
            match message {
                Message::Text(text) => return Some(Ok(text)),
                Message::Binary(data) => {
                    return Some(String::from_utf8(data).map_err(|_| {
                        GatewayError::Protocol("binary frame is not UTF-8".to_string())
                    }))
                }
                Message::Close(frame) => {
                    tracing::debug!("Peer closed connection: {:?}", frame);
                    return None;
                }
                // Pings are answered by tungstenite
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.inner.close(None).await {
            tracing::debug!("WebSocket close: {}", e);
        }
    }
}

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, SignatureScheme};

    #[derive(Debug)]
    pub struct AcceptAnyCertificate;

    impl ServerCertVerifier for AcceptAnyCertificate {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            vec![
                SignatureScheme::RSA_PKCS1_SHA256,
                SignatureScheme::RSA_PKCS1_SHA384,
                SignatureScheme::RSA_PKCS1_SHA512,
                SignatureScheme::ECDSA_NISTP256_SHA256,
                SignatureScheme::ECDSA_NISTP384_SHA384,
                SignatureScheme::RSA_PSS_SHA256,
                SignatureScheme::RSA_PSS_SHA384,
                SignatureScheme::RSA_PSS_SHA512,
                SignatureScheme::ED25519,
            ]
        }
    }
}
