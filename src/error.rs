//! Crate-wide error type for the document pipeline.
//!
//! The HTML and CSS parsers are total — they never fail, recovering from
//! malformed input per their own rules — so no `HtmlParseError` or
//! `CssParseError` variant exists here. Everything that *can* fail lives on
//! the network path: connecting, reading the response, and following
//! redirects.

use std::net::TcpStream;

/// Errors surfaced by [`crate::url::Url::request`] and the cache layer.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// More than 10 redirect hops were followed without reaching a final response.
    #[error("redirect loop: more than 10 hops")]
    RedirectLoop,

    /// The response declared `transfer-encoding` or `content-encoding`, neither
    /// of which this engine decodes.
    #[error("unsupported response encoding: {0}")]
    UnsupportedEncoding(String),

    /// The status line could not be parsed as `version SP status SP reason`.
    #[error("malformed status line: {0}")]
    BadStatus(String),

    /// Socket or file I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS negotiation failure.
    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),

    /// TLS handshake failure, which `native-tls` types separately from a
    /// plain `Error` because it can carry back a mid-handshake stream.
    #[error("tls handshake error: {0}")]
    Handshake(#[from] native_tls::HandshakeError<TcpStream>),
}
