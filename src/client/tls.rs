//! TLS upgrade for the outbound connection.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::warn;

use crate::error::ConnectionError;

/// Run the TLS handshake over an established TCP stream.
///
/// With `verify_cert` the server chain is checked against the platform
/// trust store. Without it any certificate is accepted.
pub async fn upgrade_to_tls(
    tcp_stream: TcpStream,
    hostname: &str,
    verify_cert: bool,
) -> Result<TlsStream<TcpStream>, ConnectionError> {
    let config = if verify_cert {
        ClientConfig::builder()
            .with_root_certificates(native_roots())
            .with_no_client_auth()
    } else {
        warn!(host = %hostname, "TLS certificate verification disabled");
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(NoVerifier))
            .with_no_client_auth()
    };

    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| ConnectionError::InvalidServerName(hostname.to_string()))?;

    TlsConnector::from(Arc::new(config))
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| ConnectionError::Tls(e.to_string()))
}

fn native_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    let loaded = rustls_native_certs::load_native_certs();
    for e in &loaded.errors {
        warn!(error = %e, "Error loading native certs");
    }
    for cert in loaded.certs {
        if let Err(e) = roots.add(cert) {
            warn!(error = %e, "Failed to add root cert");
        }
    }
    roots
}

#[derive(Debug)]
struct NoVerifier;

impl ServerCertVerifier for NoVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        tokio_rustls::rustls::crypto::aws_lc_rs::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
