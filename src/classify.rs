//! First-chunk protocol classification.
//!
//! Looks at the leading bytes of a chunk to decide what the peer is speaking.
//! Classification is observational only: the relay forwards the same bytes
//! verbatim whatever the outcome.

use crate::sniff::parse_sni;

/// HTTP method tokens recognized in a request line, each with its trailing
/// space so that e.g. `GETX` does not match.
const HTTP_METHODS: [&[u8]; 6] = [b"GET ", b"POST ", b"HEAD ", b"PUT ", b"DELETE ", b"OPTIONS "];

/// What the first bytes of a chunk look like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A plain HTTP request; `url` is the request-line target.
    HttpRequest { url: String },
    /// An HTTP CONNECT tunnel request.
    ConnectTunnel,
    /// A TLS handshake record; `sni` is the hostname from the ClientHello,
    /// when one was present and parseable.
    TlsClientHello { sni: Option<String> },
    /// Anything else.
    Unrecognized,
}

/// Classifies a chunk by its leading bytes.
///
/// Never fails: malformed request lines and unparseable handshakes come back
/// as [`Classification::Unrecognized`] or an SNI-less
/// [`Classification::TlsClientHello`].
#[must_use]
pub fn classify(data: &[u8]) -> Classification {
    if HTTP_METHODS.iter().any(|method| data.starts_with(method)) {
        return match parse_request_target(data) {
            Some(url) => Classification::HttpRequest { url },
            None => Classification::Unrecognized,
        };
    }

    if data.starts_with(b"CONNECT") {
        return Classification::ConnectTunnel;
    }

    if data.starts_with(&[0x16, 0x03]) {
        return Classification::TlsClientHello {
            sni: parse_sni(data),
        };
    }

    Classification::Unrecognized
}

/// Pulls the request-target out of an HTTP request line.
///
/// The line runs to the first CRLF, or to the end of the buffer when there is
/// none, and must hold exactly three space-separated fields.
fn parse_request_target(data: &[u8]) -> Option<String> {
    let line = data
        .windows(2)
        .position(|pair| pair == b"\r\n")
        .map_or(data, |idx| &data[..idx]);
    let line = std::str::from_utf8(line).ok()?;

    match line.split(' ').collect::<Vec<_>>().as_slice() {
        [_method, target, _version] => Some((*target).to_string()),
        _ => None,
    }
}
