//! Prefix-free routing command encoding/decoding, destination encoding, and
//! payload padding.
//!
//! Grounded on `original_source/sphinxmixcrypto/node.py`'s
//! `prefix_free_decode`/`destination_encode`; reshaped as a tagged-variant
//! constructor per SPEC_FULL.md Design Notes.

use thiserror::Error;

use super::params::K;

/// A decoded routing command, plus whatever remained of the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingCommand {
    /// Forward to another mix; `node_id`'s own first byte is the `0xFF` tag.
    Mix { node_id: [u8; K] },
    /// Process locally; an inner command follows in the payload.
    Process,
    /// Deliver to a named client.
    Client { client_id: Vec<u8> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer too short for its own length prefix")]
    Truncated,
    #[error("routing byte not in {{0x00, 0xFF, 1..127}}")]
    InvalidMessageType,
    #[error("destination id must be 1..=127 bytes")]
    InvalidDestination,
    #[error("padding sentinel not found")]
    InvalidPadding,
}

/// Decodes one routing command from the front of `buf`, returning the
/// command and the remaining tail.
pub fn decode_command(buf: &[u8]) -> Result<(RoutingCommand, &[u8]), CodecError> {
    let tag = *buf.first().ok_or(CodecError::Truncated)?;
    match tag {
        0x00 => Ok((RoutingCommand::Process, &buf[1..])),
        0xFF => {
            if buf.len() < K {
                return Err(CodecError::Truncated);
            }
            let mut node_id = [0u8; K];
            node_id.copy_from_slice(&buf[0..K]);
            Ok((RoutingCommand::Mix { node_id }, &buf[K..]))
        }
        1..=127 => {
            let len = tag as usize;
            if buf.len() < 1 + len {
                return Err(CodecError::Truncated);
            }
            let client_id = buf[1..1 + len].to_vec();
            Ok((RoutingCommand::Client { client_id }, &buf[1 + len..]))
        }
        _ => Err(CodecError::InvalidMessageType),
    }
}

/// Encodes a routing command as it appears in a beta layer: for `Mix`, the
/// node id itself (whose first byte doubles as the `0xFF` tag); for
/// `Process`, the single `0x00` byte; for `Client`, a length byte followed by
/// the client id.
pub fn encode_command(cmd: &RoutingCommand) -> Vec<u8> {
    match cmd {
        RoutingCommand::Mix { node_id } => node_id.to_vec(),
        RoutingCommand::Process => vec![0x00],
        RoutingCommand::Client { client_id } => {
            let mut out = Vec::with_capacity(1 + client_id.len());
            out.push(client_id.len() as u8);
            out.extend_from_slice(client_id);
            out
        }
    }
}

/// Encodes a final-delivery destination id as a single length byte (1..=127)
/// followed by the id bytes.
pub fn destination_encode(dest: &[u8]) -> Result<Vec<u8>, CodecError> {
    if dest.is_empty() || dest.len() > 127 {
        return Err(CodecError::InvalidDestination);
    }
    let mut out = Vec::with_capacity(1 + dest.len());
    out.push(dest.len() as u8);
    out.extend_from_slice(dest);
    Ok(out)
}

/// Decodes a destination id from the front of `buf`, returning the id and
/// the remaining tail.
pub fn destination_decode(buf: &[u8]) -> Result<(Vec<u8>, &[u8]), CodecError> {
    let len = *buf.first().ok_or(CodecError::Truncated)? as usize;
    if len == 0 || len > 127 || buf.len() < 1 + len {
        return Err(CodecError::InvalidDestination);
    }
    Ok((buf[1..1 + len].to_vec(), &buf[1 + len..]))
}

/// Pads `body` to `total_len` with a `0x7F` sentinel followed by zero bytes.
pub fn add_padding(body: &[u8], total_len: usize) -> Vec<u8> {
    assert!(
        body.len() + 1 <= total_len,
        "body does not fit in padded length"
    );
    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(body);
    out.push(0x7F);
    out.resize(total_len, 0x00);
    out
}

/// Strips trailing zero bytes then the `0x7F` sentinel, returning the
/// original body.
pub fn remove_padding(padded: &[u8]) -> Result<Vec<u8>, CodecError> {
    let trimmed_len = padded
        .iter()
        .rposition(|&b| b != 0x00)
        .map(|idx| idx + 1)
        .ok_or(CodecError::InvalidPadding)?;
    let (body, sentinel) = padded[..trimmed_len].split_at(trimmed_len - 1);
    if sentinel != [0x7F] {
        return Err(CodecError::InvalidPadding);
    }
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_round_trips() {
        let encoded = encode_command(&RoutingCommand::Process);
        let (cmd, rest) = decode_command(&encoded).unwrap();
        assert_eq!(cmd, RoutingCommand::Process);
        assert!(rest.is_empty());
    }

    #[test]
    fn mix_round_trips_with_own_tag_byte() {
        let mut node_id = [0u8; 16];
        node_id[0] = 0xFF;
        node_id[1] = 0x42;
        let encoded = encode_command(&RoutingCommand::Mix { node_id });
        assert_eq!(encoded.len(), 16);
        let (cmd, rest) = decode_command(&encoded).unwrap();
        assert_eq!(cmd, RoutingCommand::Mix { node_id });
        assert!(rest.is_empty());
    }

    #[test]
    fn client_round_trips() {
        let client_id = vec![1, 2, 3, 4, 5];
        let cmd = RoutingCommand::Client { client_id: client_id.clone() };
        let encoded = encode_command(&cmd);
        let (decoded, rest) = decode_command(&encoded).unwrap();
        assert_eq!(decoded, RoutingCommand::Client { client_id });
        assert!(rest.is_empty());
    }

    #[test]
    fn invalid_tag_rejected() {
        assert_eq!(decode_command(&[128]).unwrap_err(), CodecError::InvalidMessageType);
    }

    #[test]
    fn padding_round_trips() {
        let body = b"this is a test";
        let padded = add_padding(body, 64);
        assert_eq!(padded.len(), 64);
        let recovered = remove_padding(&padded).unwrap();
        assert_eq!(recovered, body);
    }

    #[test]
    fn destination_round_trips() {
        let dest = b"dest";
        let encoded = destination_encode(dest).unwrap();
        let (decoded, rest) = destination_decode(&encoded).unwrap();
        assert_eq!(decoded, dest);
        assert!(rest.is_empty());
    }
}
