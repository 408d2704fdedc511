//! TLS SNI parser: extracts the `server_name` extension's `host_name`
//! entry from the first bytes of a TLS ClientHello, without terminating
//! or interpreting the handshake any further.
//!
//! All multi-byte integers in the TLS wire format are big-endian; every
//! step here bounds-checks against the input slice before reading, per
//! the component design. A short or malformed record yields `None`
//! rather than a panic, and callers treat that identically to "no SNI
//! available" (fall through to the HTTP parser).

const RECORD_TYPE_HANDSHAKE: u8 = 0x16;
const HANDSHAKE_TYPE_CLIENT_HELLO: u8 = 0x01;
const EXTENSION_SERVER_NAME: u16 = 0x0000;
const SERVER_NAME_TYPE_HOST_NAME: u8 = 0x00;

/// Extract the first `host_name` entry of the `server_name` extension from
/// a ClientHello, or `None` if the input isn't one or the extension is
/// absent/malformed.
pub fn parse_sni(input: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(input);

    if cursor.read_u8()? != RECORD_TYPE_HANDSHAKE {
        return None;
    }
    cursor.skip(2)?; // legacy_record_version
    let record_len = cursor.read_u16()? as usize;
    if cursor.remaining() < record_len {
        return None;
    }

    if cursor.read_u8()? != HANDSHAKE_TYPE_CLIENT_HELLO {
        return None;
    }
    cursor.skip(3)?; // 24-bit handshake body length

    cursor.skip(2)?; // legacy_version
    cursor.skip(32)?; // random

    let session_id_len = cursor.read_u8()? as usize;
    cursor.skip(session_id_len)?;

    let cipher_suites_len = cursor.read_u16()? as usize;
    cursor.skip(cipher_suites_len)?;

    let compression_methods_len = cursor.read_u8()? as usize;
    cursor.skip(compression_methods_len)?;

    let extensions_len = cursor.read_u16()? as usize;
    let extensions_end = cursor.pos + extensions_len;
    if extensions_end > cursor.data.len() {
        return None;
    }

    while cursor.pos < extensions_end {
        let ext_type = cursor.read_u16()?;
        let ext_len = cursor.read_u16()? as usize;
        if cursor.pos + ext_len > extensions_end {
            return None;
        }

        if ext_type == EXTENSION_SERVER_NAME {
            let ext_body = cursor.slice(ext_len)?;
            return parse_server_name_extension(ext_body);
        }
        cursor.skip(ext_len)?;
    }

    None
}

fn parse_server_name_extension(body: &[u8]) -> Option<String> {
    let mut cursor = Cursor::new(body);
    let list_len = cursor.read_u16()? as usize;
    let list_end = (cursor.pos + list_len).min(cursor.data.len());

    while cursor.pos < list_end {
        let name_type = cursor.read_u8()?;
        let name_len = cursor.read_u16()? as usize;
        let name = cursor.slice(name_len)?;
        if name_type == SERVER_NAME_TYPE_HOST_NAME {
            return std::str::from_utf8(name).ok().map(str::to_string);
        }
    }

    None
}

/// Minimal bounds-checked big-endian byte cursor, local to this parser.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn read_u16(&mut self) -> Option<u16> {
        let bytes = self.data.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        if self.pos + n > self.data.len() {
            return None;
        }
        self.pos += n;
        Some(())
    }

    fn slice(&mut self, n: usize) -> Option<&'a [u8]> {
        let out = self.data.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal, syntactically valid ClientHello record carrying a
    /// single `server_name` extension for `sni`.
    fn build_client_hello(sni: &str) -> Vec<u8> {
        let mut server_name_list = Vec::new();
        server_name_list.push(SERVER_NAME_TYPE_HOST_NAME);
        server_name_list.extend_from_slice(&(sni.len() as u16).to_be_bytes());
        server_name_list.extend_from_slice(sni.as_bytes());

        let mut server_name_ext_body = Vec::new();
        server_name_ext_body.extend_from_slice(&(server_name_list.len() as u16).to_be_bytes());
        server_name_ext_body.extend_from_slice(&server_name_list);

        let mut extensions = Vec::new();
        extensions.extend_from_slice(&EXTENSION_SERVER_NAME.to_be_bytes());
        extensions.extend_from_slice(&(server_name_ext_body.len() as u16).to_be_bytes());
        extensions.extend_from_slice(&server_name_ext_body);

        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]); // legacy_version (TLS 1.2)
        body.extend_from_slice(&[0u8; 32]); // random
        body.push(0); // session_id_len
        body.extend_from_slice(&[0x00, 0x02]); // cipher_suites_len
        body.extend_from_slice(&[0x13, 0x01]); // one cipher suite
        body.push(1); // compression_methods_len
        body.push(0); // compression method: null
        body.extend_from_slice(&(extensions.len() as u16).to_be_bytes());
        body.extend_from_slice(&extensions);

        let mut handshake = Vec::new();
        handshake.push(HANDSHAKE_TYPE_CLIENT_HELLO);
        let body_len = (body.len() as u32).to_be_bytes();
        handshake.extend_from_slice(&body_len[1..4]); // 24-bit length
        handshake.extend_from_slice(&body);

        let mut record = Vec::new();
        record.push(RECORD_TYPE_HANDSHAKE);
        record.extend_from_slice(&[0x03, 0x01]); // legacy_record_version
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);

        record
    }

    #[test]
    fn extracts_sni_from_canonical_client_hello() {
        let hello = build_client_hello("ads.example.com");
        assert_eq!(parse_sni(&hello).as_deref(), Some("ads.example.com"));
    }

    #[test]
    fn rejects_non_handshake_record() {
        let mut bytes = vec![0x17]; // application_data
        bytes.extend_from_slice(&[0u8; 20]);
        assert_eq!(parse_sni(&bytes), None);
    }

    #[test]
    fn returns_none_on_truncated_input() {
        let hello = build_client_hello("ads.example.com");
        assert_eq!(parse_sni(&hello[..hello.len() - 10]), None);
    }

    #[test]
    fn returns_none_without_server_name_extension() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0x03, 0x03]);
        body.extend_from_slice(&[0u8; 32]);
        body.push(0);
        body.extend_from_slice(&[0x00, 0x02]);
        body.extend_from_slice(&[0x13, 0x01]);
        body.push(1);
        body.push(0);
        body.extend_from_slice(&[0x00, 0x00]); // zero-length extensions

        let mut handshake = vec![HANDSHAKE_TYPE_CLIENT_HELLO];
        handshake.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..4]);
        handshake.extend_from_slice(&body);

        let mut record = vec![RECORD_TYPE_HANDSHAKE, 0x03, 0x01];
        record.extend_from_slice(&(handshake.len() as u16).to_be_bytes());
        record.extend_from_slice(&handshake);

        assert_eq!(parse_sni(&record), None);
    }
}
