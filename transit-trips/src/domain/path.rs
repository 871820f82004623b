//! Versioned encoding for leg paths.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! [version: u8 = 1][marker: u8]
//!     marker 0: no path
//!     marker 1: [count: u32] then count x [lat_e6: i32][lon_e6: i32]
//! ```
//!
//! The bytes travel as URL-safe base64 without padding. "No path" and "empty
//! path" encode differently.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::Point;

/// Current encoding version.
pub const PATH_ENCODING_VERSION: u8 = 1;

const MARKER_ABSENT: u8 = 0;
const MARKER_PRESENT: u8 = 1;
const HEADER_LEN: usize = 2;
const POINT_LEN: usize = 8;

/// Errors decoding an encoded path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathEncodingError {
    #[error("path is not valid base64: {0}")]
    Base64(String),

    #[error("unsupported path encoding version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid path marker {0}")]
    InvalidMarker(u8),

    #[error("path truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("{0} trailing bytes after path")]
    TrailingBytes(usize),
}

/// Encode a path to bytes.
pub fn encode_path_bytes(path: Option<&[Point]>) -> Vec<u8> {
    let Some(points) = path else {
        return vec![PATH_ENCODING_VERSION, MARKER_ABSENT];
    };

    let mut out = Vec::with_capacity(HEADER_LEN + 4 + points.len() * POINT_LEN);
    out.push(PATH_ENCODING_VERSION);
    out.push(MARKER_PRESENT);
    out.extend_from_slice(&(points.len() as u32).to_be_bytes());
    for point in points {
        out.extend_from_slice(&point.lat_e6().to_be_bytes());
        out.extend_from_slice(&point.lon_e6().to_be_bytes());
    }
    out
}

/// Decode a path from bytes.
pub fn decode_path_bytes(bytes: &[u8]) -> Result<Option<Vec<Point>>, PathEncodingError> {
    if bytes.len() < HEADER_LEN {
        return Err(PathEncodingError::Truncated {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }
    if bytes[0] != PATH_ENCODING_VERSION {
        return Err(PathEncodingError::UnsupportedVersion(bytes[0]));
    }

    let body = &bytes[HEADER_LEN..];
    match bytes[1] {
        MARKER_ABSENT => {
            if body.is_empty() {
                Ok(None)
            } else {
                Err(PathEncodingError::TrailingBytes(body.len()))
            }
        }
        MARKER_PRESENT => decode_points(body).map(Some),
        other => Err(PathEncodingError::InvalidMarker(other)),
    }
}

fn decode_points(body: &[u8]) -> Result<Vec<Point>, PathEncodingError> {
    let Some((count, rest)) = body.split_first_chunk::<4>() else {
        return Err(PathEncodingError::Truncated {
            expected: HEADER_LEN + 4,
            actual: HEADER_LEN + body.len(),
        });
    };
    let count = u32::from_be_bytes(*count) as usize;
    let expected = count.saturating_mul(POINT_LEN);

    if rest.len() < expected {
        return Err(PathEncodingError::Truncated {
            expected: HEADER_LEN + 4 + expected,
            actual: HEADER_LEN + body.len(),
        });
    }
    if rest.len() > expected {
        return Err(PathEncodingError::TrailingBytes(rest.len() - expected));
    }

    Ok(rest
        .chunks_exact(POINT_LEN)
        .map(|chunk| {
            let lat = i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let lon = i32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            Point::from_e6(lat, lon)
        })
        .collect())
}

/// Encode a path as URL-safe base64 text.
///
/// # Examples
///
/// ```
/// use transit_trips::domain::{Point, decode_path, encode_path};
///
/// let path = vec![Point::from_e6(52_525_592, 13_369_545)];
/// let text = encode_path(Some(&path));
/// assert_eq!(decode_path(&text).unwrap(), Some(path));
///
/// // Absent and empty are distinct
/// assert_ne!(encode_path(None), encode_path(Some(&[])));
/// assert_eq!(decode_path(&encode_path(Some(&[]))).unwrap(), Some(vec![]));
/// ```
pub fn encode_path(path: Option<&[Point]>) -> String {
    URL_SAFE_NO_PAD.encode(encode_path_bytes(path))
}

/// Decode URL-safe base64 text produced by [`encode_path`].
pub fn decode_path(text: &str) -> Result<Option<Vec<Point>>, PathEncodingError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| PathEncodingError::Base64(e.to_string()))?;
    decode_path_bytes(&bytes)
}

/// Serde adapter for `Option<Vec<Point>>` fields.
///
/// Use together with `#[serde(default)]` so a missing field reads as no path.
pub mod serde_path {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Point, decode_path, encode_path};

    pub fn serialize<S: Serializer>(
        path: &Option<Vec<Point>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_path(path.as_deref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<Point>>, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode_path(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_layout() {
        assert_eq!(encode_path_bytes(None), vec![1, 0]);
        assert_eq!(decode_path_bytes(&[1, 0]), Ok(None));
    }

    #[test]
    fn present_layout() {
        let bytes = encode_path_bytes(Some(&[Point::from_e6(1, -1)]));
        assert_eq!(
            bytes,
            vec![
                1, 1, // version, marker
                0, 0, 0, 1, // count
                0, 0, 0, 1, // lat
                0xFF, 0xFF, 0xFF, 0xFF, // lon
            ]
        );
    }

    #[test]
    fn empty_is_not_absent() {
        let empty = encode_path_bytes(Some(&[]));
        assert_eq!(empty, vec![1, 1, 0, 0, 0, 0]);
        assert_eq!(decode_path_bytes(&empty), Ok(Some(vec![])));
    }

    #[test]
    fn rejects_unknown_version() {
        assert_eq!(
            decode_path_bytes(&[2, 0]),
            Err(PathEncodingError::UnsupportedVersion(2))
        );
    }

    #[test]
    fn rejects_unknown_marker() {
        assert_eq!(
            decode_path_bytes(&[1, 7]),
            Err(PathEncodingError::InvalidMarker(7))
        );
    }

    #[test]
    fn rejects_truncated() {
        assert!(matches!(
            decode_path_bytes(&[1]),
            Err(PathEncodingError::Truncated { .. })
        ));
        assert!(matches!(
            decode_path_bytes(&[1, 1, 0, 0]),
            Err(PathEncodingError::Truncated { .. })
        ));
        // Count says two points, only one present
        let mut bytes = encode_path_bytes(Some(&[Point::from_e6(1, 2)]));
        bytes[5] = 2;
        assert_eq!(
            decode_path_bytes(&bytes),
            Err(PathEncodingError::Truncated {
                expected: 22,
                actual: 14
            })
        );
    }

    #[test]
    fn rejects_trailing() {
        assert_eq!(
            decode_path_bytes(&[1, 0, 9]),
            Err(PathEncodingError::TrailingBytes(1))
        );
        let mut bytes = encode_path_bytes(Some(&[]));
        bytes.push(0);
        assert_eq!(
            decode_path_bytes(&bytes),
            Err(PathEncodingError::TrailingBytes(1))
        );
    }

    #[test]
    fn rejects_bad_base64() {
        assert!(matches!(
            decode_path("not base64!"),
            Err(PathEncodingError::Base64(_))
        ));
    }

    #[test]
    fn serde_adapter() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Holder {
            #[serde(default, with = "serde_path")]
            path: Option<Vec<Point>>,
        }

        let holder = Holder {
            path: Some(vec![Point::from_e6(48_140_267, 11_558_313)]),
        };
        let json = serde_json::to_string(&holder).unwrap();
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, holder);

        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.path, None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = Point> {
        (-90_000_000i32..=90_000_000, -180_000_000i32..=180_000_000)
            .prop_map(|(lat, lon)| Point::from_e6(lat, lon))
    }

    proptest! {
        /// Decoding an encoded path yields the original, absent included
        #[test]
        fn encoding_roundtrip(path in proptest::option::of(proptest::collection::vec(point(), 0..50))) {
            let text = encode_path(path.as_deref());
            prop_assert_eq!(decode_path(&text).unwrap(), path);
        }

        /// Any strict prefix of a present path's bytes fails to decode
        #[test]
        fn prefixes_are_rejected(points in proptest::collection::vec(point(), 1..10), cut in 0usize..1000) {
            let bytes = encode_path_bytes(Some(&points));
            let cut = cut % bytes.len();
            prop_assert!(decode_path_bytes(&bytes[..cut]).is_err());
        }
    }
}
