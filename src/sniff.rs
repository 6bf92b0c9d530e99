//! TLS `ClientHello` inspection.
//!
//! Walks the record layer, handshake header, and extension list of a raw
//! `ClientHello` to pull out the SNI hostname, without touching the rest of
//! the handshake. The whole record must already be present in the buffer;
//! nothing is reassembled across reads.

const RECORD_HEADER_LEN: usize = 5;

const CONTENT_TYPE_HANDSHAKE: u8 = 0x16;
const TLS_VERSION_MAJOR: u8 = 0x03;
const HANDSHAKE_TYPE_CLIENT_HELLO: u8 = 0x01;

const EXT_SERVER_NAME: u16 = 0x0000;
const SNI_HOST_NAME: u8 = 0x00;

fn read_u16(data: &[u8], pos: usize) -> usize {
    u16::from_be_bytes([data[pos], data[pos + 1]]) as usize
}

/// Extracts the SNI hostname from a buffer holding a complete TLS
/// `ClientHello` record.
///
/// Returns `None` for anything that is not a complete, well-formed
/// `ClientHello` carrying a `host_name` entry: wrong content type or version,
/// a record longer than the buffer, a length field pointing past the end of
/// the data, or a name that is not valid UTF-8. Malformed input is an
/// expected outcome, never an error.
#[must_use]
pub fn parse_sni(data: &[u8]) -> Option<String> {
    if data.len() < RECORD_HEADER_LEN {
        return None;
    }
    if data[0] != CONTENT_TYPE_HANDSHAKE || data[1] != TLS_VERSION_MAJOR {
        return None;
    }

    // The record must fit in the buffer entirely; a ClientHello split across
    // reads fails here.
    let record_len = read_u16(data, 3);
    if data.len() < RECORD_HEADER_LEN + record_len {
        return None;
    }

    let mut pos = RECORD_HEADER_LEN;
    if data.len() < pos + 4 {
        return None;
    }
    if data[pos] != HANDSHAKE_TYPE_CLIENT_HELLO {
        return None;
    }
    pos += 4; // handshake type + 24-bit handshake length

    // Legacy client version + random.
    if data.len() < pos + 2 + 32 {
        return None;
    }
    pos += 2 + 32;

    // Session ID.
    if data.len() < pos + 1 {
        return None;
    }
    let session_id_len = data[pos] as usize;
    pos += 1 + session_id_len;

    // Cipher suites.
    if data.len() < pos + 2 {
        return None;
    }
    let cipher_suites_len = read_u16(data, pos);
    pos += 2 + cipher_suites_len;

    // Compression methods.
    if data.len() < pos + 1 {
        return None;
    }
    let compression_methods_len = data[pos] as usize;
    pos += 1 + compression_methods_len;

    // Extensions block.
    if data.len() < pos + 2 {
        return None;
    }
    let extensions_len = read_u16(data, pos);
    pos += 2;
    let extensions_end = pos + extensions_len;

    while pos < extensions_end {
        if data.len() < pos + 4 {
            return None;
        }
        let ext_type = u16::from_be_bytes([data[pos], data[pos + 1]]);
        let ext_len = read_u16(data, pos + 2);
        pos += 4;

        if ext_type == EXT_SERVER_NAME {
            // Server name list: 2-byte list length, then entries of
            // (1-byte type, 2-byte length, name). Only the first entry is
            // inspected; the first host_name found ends the scan.
            if data.len() < pos + 3 {
                return None;
            }
            if data[pos + 2] == SNI_HOST_NAME {
                if data.len() < pos + 5 {
                    return None;
                }
                let name_len = read_u16(data, pos + 3);
                if data.len() < pos + 5 + name_len {
                    return None;
                }
                return String::from_utf8(data[pos + 5..pos + 5 + name_len].to_vec()).ok();
            }
        }

        pos += ext_len;
    }

    None
}


#[cfg(test)]
mod tests {
    use super::testdata::{client_hello, client_hello_with_sni, sni_extension};
    use super::*;

    #[test]
    fn extracts_host_name() {
        let hello = client_hello_with_sni("example.com");
        assert_eq!(parse_sni(&hello), Some("example.com".to_string()));
    }

    #[test]
    fn finds_sni_after_other_extensions() {
        let hello = client_hello(&[
            (0x002b, vec![0x02, 0x03, 0x04]), // supported_versions
            sni_extension(&[(0, b"internal.example.org")]),
            (0x0010, vec![0x00, 0x03, 0x02, 0x68, 0x32]), // ALPN: h2
        ]);
        assert_eq!(parse_sni(&hello), Some("internal.example.org".to_string()));
    }

    #[test]
    fn first_host_name_entry_wins() {
        let hello = client_hello(&[sni_extension(&[
            (0, b"first.example.com"),
            (0, b"second.example.com"),
        ])]);
        assert_eq!(parse_sni(&hello), Some("first.example.com".to_string()));
    }

    #[test]
    fn no_sni_extension_yields_none() {
        let hello = client_hello(&[(0x0010, vec![0x00, 0x03, 0x02, 0x68, 0x32])]);
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn empty_extension_block_yields_none() {
        let hello = client_hello(&[]);
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn non_host_name_entry_yields_none() {
        let hello = client_hello(&[sni_extension(&[(1, b"example.com")])]);
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn rejects_non_handshake_record() {
        let mut hello = client_hello_with_sni("example.com");
        hello[0] = 0x17; // application_data
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn rejects_wrong_version_major() {
        let mut hello = client_hello_with_sni("example.com");
        hello[1] = 0x02;
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn rejects_non_client_hello_handshake() {
        let mut hello = client_hello_with_sni("example.com");
        hello[5] = 0x02; // ServerHello
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn rejects_record_longer_than_buffer() {
        let mut hello = client_hello_with_sni("example.com");
        let claimed = (hello.len() as u16).to_be_bytes(); // 5 bytes too long
        hello[3] = claimed[0];
        hello[4] = claimed[1];
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn rejects_non_utf8_host_name() {
        let hello = client_hello(&[sni_extension(&[(0, &[0xff, 0xfe, 0xfd])])]);
        assert_eq!(parse_sni(&hello), None);
    }

    #[test]
    fn truncation_at_every_offset_yields_none() {
        let hello = client_hello_with_sni("truncated.example.com");
        for len in 0..hello.len() {
            assert_eq!(parse_sni(&hello[..len]), None, "truncated to {len} bytes");
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic() {
        for len in 0..512 {
            let data: Vec<u8> = (0..len).map(|i| (i * 7 + 13) as u8).collect();
            assert_eq!(parse_sni(&data), None);
        }
    }

    #[test]
    fn handshake_prefix_with_garbage_never_panics() {
        for len in 0..256 {
            let mut data = vec![0x16, 0x03, 0x01, 0x00, len as u8];
            data.extend(std::iter::repeat_n(0xff, len));
            let _ = parse_sni(&data);
        }
    }
}
