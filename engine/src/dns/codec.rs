//! DNS wire codec: QNAME extraction and block-response synthesis.
//!
//! Only the slice of RFC 1035 needed by a sink-holing relay is implemented:
//! reading the question name out of a query, and stamping a synthetic
//! A-record answer onto a copy of that same query. Name-compression
//! pointers are not expected in questions and are not followed.

use std::net::Ipv4Addr;

/// Offset of QDCOUNT within the 12-byte DNS header.
const QDCOUNT_OFFSET: usize = 4;
/// Offset of ANCOUNT within the 12-byte DNS header.
const ANCOUNT_OFFSET: usize = 6;
/// Offset the question section starts at.
const QUESTION_OFFSET: usize = 12;
/// Answer RR appended after the (single) question: pointer + type + class +
/// TTL + rdlength + 4-byte A record.
const ANSWER_RR_LEN: usize = 16;

/// Read the transaction-id-bearing header and extract QNAME, joining labels
/// with `.`. Returns `None` if the buffer is short or any label would read
/// past the buffer end; callers treat that identically to "no name" and
/// forward the datagram untouched.
pub fn parse_qname(buf: &[u8]) -> Option<String> {
    if buf.len() < QUESTION_OFFSET {
        return None;
    }

    let mut pos = QUESTION_OFFSET;
    let mut labels: Vec<&str> = Vec::new();

    loop {
        let len = *buf.get(pos)?;
        pos += 1;
        if len == 0 {
            break;
        }
        let len = len as usize;
        if len > 63 || pos + len > buf.len() {
            return None;
        }
        let label = std::str::from_utf8(&buf[pos..pos + len]).ok()?;
        labels.push(label);
        pos += len;
    }

    Some(labels.join("."))
}

/// Build a well-formed block response for `req`, whose answer points the
/// client at `sink_v4`.
///
/// The output is `req` with the flags field overwritten to `0x8180`
/// (QR=1, RA=1, RCODE=0), ANCOUNT set to 1, followed by one appended answer
/// RR: name pointer `C0 0C`, type A, class IN, TTL 60, RDLENGTH 4 and the
/// sink address. Output length is always `req.len() + 16`.
pub fn synthesize_block_response(req: &[u8], sink_v4: Ipv4Addr) -> Vec<u8> {
    let mut resp = Vec::with_capacity(req.len() + ANSWER_RR_LEN);
    resp.extend_from_slice(req);

    resp[2] = 0x81;
    resp[3] = 0x80;
    resp[ANCOUNT_OFFSET] = 0x00;
    resp[ANCOUNT_OFFSET + 1] = 0x01;

    resp.extend_from_slice(&[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x3C, 0x00, 0x04]);
    resp.extend_from_slice(&sink_v4.octets());

    resp
}

/// Build a minimal standard-query DNS message for `name`, used by tests and
/// by the upstream forwarding path's own sanity checks. Panics if any label
/// exceeds 63 octets (the implementation never constructs such a query).
#[cfg(test)]
pub fn build_query(id: u16, name: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&id.to_be_bytes());
    buf.extend_from_slice(&[0x01, 0x00]); // flags: recursion desired
    buf.extend_from_slice(&[0x00, 0x01]); // QDCOUNT = 1
    buf.extend_from_slice(&[0x00, 0x00, QDCOUNT_OFFSET as u8, 0x00]); // ANCOUNT/NSCOUNT placeholders (overwritten below)
    buf.truncate(QUESTION_OFFSET);

    for label in name.split('.') {
        assert!(label.len() <= 63, "label too long for a standard query");
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0x00);
    buf.extend_from_slice(&[0x00, 0x01]); // QTYPE A
    buf.extend_from_slice(&[0x00, 0x01]); // QCLASS IN
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_labels() {
        let query = build_query(0x1234, "ads.example.com");
        assert_eq!(parse_qname(&query).as_deref(), Some("ads.example.com"));
    }

    #[test]
    fn rejects_short_buffer() {
        assert_eq!(parse_qname(&[0u8; 8]), None);
    }

    #[test]
    fn rejects_label_reading_past_end() {
        let mut buf = vec![0u8; 12];
        buf.push(10); // claims a 10-byte label
        buf.extend_from_slice(b"short");
        assert_eq!(parse_qname(&buf), None);
    }

    #[test]
    fn synthesizes_well_formed_block_response() {
        let query = build_query(0xBEEF, "ads.example.com");
        let resp = synthesize_block_response(&query, Ipv4Addr::new(127, 0, 0, 1));

        assert_eq!(resp.len(), query.len() + 16);
        assert_eq!(&resp[0..2], &0xBEEFu16.to_be_bytes());
        assert_eq!(&resp[2..4], &[0x81, 0x80]);
        assert_eq!(&resp[6..8], &[0x00, 0x01]);

        let rr = &resp[query.len()..];
        assert_eq!(
            rr,
            &[0xC0, 0x0C, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x3C, 0x00, 0x04, 127, 0, 0, 1]
        );
    }

    #[test]
    fn synthesizes_with_custom_sink() {
        let query = build_query(1, "tracker.io");
        let resp = synthesize_block_response(&query, Ipv4Addr::new(10, 0, 0, 9));
        assert_eq!(&resp[resp.len() - 4..], &[10, 0, 0, 9]);
    }
}
