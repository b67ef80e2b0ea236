//! The single compressed-JSON envelope shared by all three persistent
//! variants (§4.6 / §6). Each variant owns a `*Body` struct describing its
//! wire shape; this module owns the common wrapper, hex coding, and gzip
//! framing.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{BloomError, Result};

/// Process-wide envelope metadata, reproduced as compile-time constants.
pub const VERSION: &str = "1.0";
pub const PROGRAM: &str = "bloomtrio";

pub const TYPE_CLASSIC: &str = "bloom";
pub const TYPE_COUNTING: &str = "counting bloom";
pub const TYPE_SCALABLE: &str = "scalable bloom";

#[derive(Serialize)]
struct SaveEnvelope<'a, B> {
    version: &'static str,
    program: &'static str,
    #[serde(rename = "type")]
    ty: &'a str,
    bloom: &'a B,
}

#[derive(Deserialize)]
struct LoadEnvelope<B> {
    #[serde(rename = "type")]
    ty: String,
    bloom: B,
}

/// Gzip-compress `body`, tag it with `ty`, and write it to `path`.
pub fn save<B: Serialize>(path: &Path, ty: &str, body: &B) -> Result<()> {
    let envelope = SaveEnvelope {
        version: VERSION,
        program: PROGRAM,
        ty,
        bloom: body,
    };

    let json = serde_json::to_vec(&envelope)?;

    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(&json)?;
    encoder.finish()?;

    tracing::debug!(path = %path.display(), bytes = json.len(), "saved bloom envelope");
    Ok(())
}

/// Read `path`, decompress, parse the envelope, and verify `ty` matches the
/// loading variant before handing back the variant-specific body.
pub fn load<B: DeserializeOwned>(path: &Path, expected_ty: &str) -> Result<B> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).map_err(|e| BloomError::Format {
        reason: format!("corrupt gzip stream: {e}"),
    })?;

    let envelope: LoadEnvelope<B> = serde_json::from_slice(&json)?;

    if envelope.ty != expected_ty {
        return Err(BloomError::Format {
            reason: format!(
                "expected envelope type '{expected_ty}', found '{}'",
                envelope.ty
            ),
        });
    }

    tracing::debug!(path = %path.display(), bytes = json.len(), "loaded bloom envelope");
    Ok(envelope.bloom)
}

/// Lowercase-hex encode, used for `bf`/`bfs` payloads.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// Decode a lowercase- or uppercase-hex string, as produced by [`to_hex`].
pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(BloomError::Format {
            reason: "hex payload has odd length".into(),
        });
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| BloomError::Format {
                reason: format!("invalid hex byte at offset {i}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips() {
        let bytes = vec![0x00, 0x0f, 0xff, 0xa3];
        let hex = to_hex(&bytes);
        assert_eq!(from_hex(&hex).unwrap(), bytes);
    }

    #[test]
    fn hex_rejects_odd_length() {
        assert!(from_hex("abc").is_err());
    }

    #[test]
    fn hex_rejects_non_hex_digits() {
        assert!(from_hex("zz").is_err());
    }

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Dummy {
        n: u32,
    }

    #[test]
    fn save_load_round_trip_checks_type_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.bloom");

        save(&path, TYPE_CLASSIC, &Dummy { n: 42 }).unwrap();
        let loaded: Dummy = load(&path, TYPE_CLASSIC).unwrap();
        assert_eq!(loaded, Dummy { n: 42 });

        let mismatch: Result<Dummy> = load(&path, TYPE_COUNTING);
        assert!(matches!(mismatch, Err(BloomError::Format { .. })));
    }

    #[test]
    fn corrupt_gzip_stream_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.bloom");
        std::fs::write(&path, b"not a gzip stream").unwrap();

        let result: Result<Dummy> = load(&path, TYPE_CLASSIC);
        assert!(matches!(result, Err(BloomError::Format { .. })));
    }
}
