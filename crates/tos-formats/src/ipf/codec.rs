//! Element payload encoding: raw DEFLATE plus the PKWARE cipher.

use super::entry::IpfElement;
use super::error::{IpfError, IpfResult};
use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};
use std::io::Read;
use tos_crypto::pkware::{IPF_PASSWORD, PkwareCipher};

/// Extensions stored without compression; their content is already packed.
pub const NO_COMPRESSION_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "fsb", "mp3", "ogg"];

/// Highest DEFLATE level accepted by the builder
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Whether a file is stored raw because of its extension.
pub fn skips_compression(path: &str) -> bool {
    path.rsplit_once('.').is_some_and(|(_, extension)| {
        NO_COMPRESSION_EXTENSIONS
            .iter()
            .any(|skip| skip.eq_ignore_ascii_case(extension))
    })
}

/// Turn file content into stored element bytes.
///
/// Level `0` and deny-listed extensions store the content raw. Compressed
/// output that is exactly as long as the input is also stored raw, because
/// readers treat equal sizes as "not compressed".
pub fn encode_payload(path: &str, data: &[u8], level: u32, encrypt: bool) -> IpfResult<Vec<u8>> {
    if level > MAX_COMPRESSION_LEVEL {
        return Err(IpfError::InvalidFormat(format!(
            "compression level {level} is outside 0..={MAX_COMPRESSION_LEVEL}"
        )));
    }

    let mut stored = if level == 0 || skips_compression(path) {
        data.to_vec()
    } else {
        let mut encoder = DeflateEncoder::new(data, Compression::new(level));
        let mut compressed = Vec::with_capacity(data.len() / 2);
        encoder.read_to_end(&mut compressed)?;
        if compressed.len() == data.len() {
            data.to_vec()
        } else {
            compressed
        }
    };

    if encrypt {
        PkwareCipher::new(&IPF_PASSWORD).encrypt_in_place(&mut stored);
    }
    Ok(stored)
}

/// Turn stored element bytes back into file content.
pub fn decode_payload(element: &IpfElement, stored: &[u8], encrypted: bool) -> IpfResult<Vec<u8>> {
    let mut bytes = stored.to_vec();
    if encrypted {
        PkwareCipher::new(&IPF_PASSWORD).decrypt_in_place(&mut bytes);
    }
    if !element.is_compressed() {
        return Ok(bytes);
    }

    let expected = element.original_size as usize;
    let mut content = Vec::with_capacity(expected);
    // One extra byte is enough to detect overlong output
    DeflateDecoder::new(bytes.as_slice())
        .take(u64::from(element.original_size) + 1)
        .read_to_end(&mut content)
        .map_err(|e| IpfError::Corrupt {
            path: element.path.clone(),
            reason: format!("inflate failed: {e}"),
        })?;

    if content.len() != expected {
        return Err(IpfError::Corrupt {
            path: element.path.clone(),
            reason: if content.len() > expected {
                format!("inflates past the expected {expected} bytes")
            } else {
                format!("inflated to {} bytes, expected {expected}", content.len())
            },
        });
    }
    Ok(content)
}
