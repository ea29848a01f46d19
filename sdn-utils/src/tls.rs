//
// Copyright (c) The sdn-rs Contributors
//
// SPDX-License-Identifier: MIT
//

//! TLS context construction shared by the Controller's session server and
//! the Router agent's session client. Cipher suites are restricted to the
//! ECDHE+AESGCM / ECDHE+CHACHA20 families; legacy DHE suites have no
//! rustls equivalent (rustls only implements (EC)DHE key exchange over
//! TLS 1.2/1.3) and are dropped, noted in `DESIGN.md`.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio_rustls::rustls;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio_rustls::{TlsAcceptor, TlsConnector};

use crate::config::TlsConfig;

fn load_certs(path: &str) -> io::Result<Vec<CertificateDer<'static>>> {
    let file = std::fs::File::open(Path::new(path))?;
    let mut reader = io::BufReader::new(file);
    rustls_pemfile::certs(&mut reader).collect()
}

fn load_private_key(path: &str) -> io::Result<PrivateKeyDer<'static>> {
    let file = std::fs::File::open(Path::new(path))?;
    let mut reader = io::BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "no private key found"))
}

/// Restricted cipher-suite list: ECDHE+AESGCM and ECDHE+CHACHA20, the
/// subset rustls can express.
fn cipher_suites() -> Vec<rustls::SupportedCipherSuite> {
    use rustls::crypto::ring::cipher_suite::{
        TLS13_AES_256_GCM_SHA384, TLS13_CHACHA20_POLY1305_SHA256,
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384, TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
    };
    vec![
        TLS13_AES_256_GCM_SHA384,
        TLS13_CHACHA20_POLY1305_SHA256,
        TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
    ]
}

fn crypto_provider() -> Arc<rustls::crypto::CryptoProvider> {
    let base = rustls::crypto::ring::default_provider();
    Arc::new(rustls::crypto::CryptoProvider {
        cipher_suites: cipher_suites(),
        ..base
    })
}

/// Builds the server-side TLS acceptor. `dev_mode` disables client
/// certificate verification, matching the permissive development default
/// preserved from the source.
pub fn server_acceptor(tls: &TlsConfig) -> io::Result<TlsAcceptor> {
    let certs = load_certs(&tls.cert_file)?;
    let key = load_private_key(&tls.key_file)?;

    let builder = ServerConfig::builder_with_provider(crypto_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let config = if tls.dev_mode || tls.ca_file.is_none() {
        builder
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
    } else {
        let ca_path = tls.ca_file.as_ref().unwrap();
        let mut roots = RootCertStore::empty();
        for cert in load_certs(ca_path)? {
            roots.add(cert).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        }
        let verifier = rustls::server::WebPkiClientVerifier::builder(Arc::new(roots))
            .build()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        builder
            .with_client_cert_verifier(verifier)
            .with_single_cert(certs, key)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
    };

    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// A permissive server-certificate verifier used only in development
/// mode, mirroring the source's `ssl.CERT_NONE` / `check_hostname = False`
/// defaults.
#[derive(Debug)]
struct InsecureServerVerifier(Arc<rustls::crypto::CryptoProvider>);

impl rustls::client::danger::ServerCertVerifier for InsecureServerVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Builds the client-side TLS connector.
pub fn client_connector(tls: &TlsConfig) -> io::Result<TlsConnector> {
    let provider = crypto_provider();
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let config = if tls.dev_mode {
        let mut config = builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InsecureServerVerifier(provider)))
            .with_no_client_auth();
        config.enable_sni = false;
        config
    } else {
        let mut roots = RootCertStore::empty();
        if let Some(ca_path) = &tls.ca_file {
            for cert in load_certs(ca_path)? {
                roots.add(cert).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            }
        }
        let certs = load_certs(&tls.cert_file)?;
        let key = load_private_key(&tls.key_file)?;
        builder
            .with_root_certificates(roots)
            .with_client_auth_cert(certs, key)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
    };

    Ok(TlsConnector::from(Arc::new(config)))
}
