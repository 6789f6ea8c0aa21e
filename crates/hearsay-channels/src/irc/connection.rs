//! Transport setup: plain TCP or TLS over TCP.

use hearsay_core::{config::BotConfig, error::HearsayError};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{self, pki_types::ServerName, ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

/// A bidirectional byte stream to the server.
pub(crate) trait Transport: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Transport for T {}

/// Open the connection described by `config`.
pub(crate) async fn open(config: &BotConfig) -> Result<Box<dyn Transport>, HearsayError> {
    let addr = format!("{}:{}", config.server, config.port);
    let tcp = TcpStream::connect(&addr)
        .await
        .map_err(|e| HearsayError::Channel(format!("connect to {addr} failed: {e}")))?;

    if !config.tls {
        return Ok(Box::new(tcp));
    }

    let connector = tls_connector()?;
    let server_name = ServerName::try_from(config.server.clone())
        .map_err(|e| HearsayError::Channel(format!("invalid server name {}: {e}", config.server)))?;
    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| HearsayError::Channel(format!("TLS handshake with {addr} failed: {e}")))?;
    Ok(Box::new(stream))
}

fn tls_connector() -> Result<TlsConnector, HearsayError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let tls = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| HearsayError::Channel(format!("TLS setup failed: {e}")))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(tls)))
}
