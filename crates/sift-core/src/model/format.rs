//! Single-file binary model format.
//!
//! ```text
//! "SIFT" | version u32 | header_len u64 | header JSON | input f32s | output f32s | blake3
//! ```
//!
//! Integers and floats are little-endian, matrices row-major. The trailing
//! 32 bytes are the BLAKE3 hash of everything before them, so truncation and
//! bit rot are caught before any parsing happens.

use std::path::Path;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};

use super::args::ModelArgs;
use super::vocabulary::Entry;

const MAGIC: &[u8; 4] = b"SIFT";
const FORMAT_VERSION: u32 = 1;
const PREAMBLE_LEN: usize = 4 + 4 + 8;
const CHECKSUM_LEN: usize = 32;

/// Matrix shape as declared in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    fn of(m: &ArrayView2<'_, f32>) -> Self {
        Self {
            rows: m.nrows(),
            cols: m.ncols(),
        }
    }
}

#[derive(Deserialize)]
struct Header {
    args: ModelArgs,
    words: Vec<Entry>,
    labels: Vec<Entry>,
    input: Shape,
    output: Shape,
}

/// Everything a model file holds, before cross-checking.
#[derive(Debug)]
pub struct RawModel {
    pub args: ModelArgs,
    pub words: Vec<Entry>,
    pub labels: Vec<Entry>,
    pub input: Array2<f32>,
    pub output: Array2<f32>,
}

/// Serialize model parts. No consistency checks are made here.
pub fn encode(
    args: &ModelArgs,
    words: &[Entry],
    labels: &[Entry],
    input: ArrayView2<'_, f32>,
    output: ArrayView2<'_, f32>,
) -> Result<Vec<u8>, serde_json::Error> {
    #[derive(Serialize)]
    struct HeaderRef<'a> {
        args: &'a ModelArgs,
        words: &'a [Entry],
        labels: &'a [Entry],
        input: Shape,
        output: Shape,
    }

    let header = serde_json::to_vec(&HeaderRef {
        args,
        words,
        labels,
        input: Shape::of(&input),
        output: Shape::of(&output),
    })?;

    let payload = (input.len() + output.len()) * 4;
    let mut buf = Vec::with_capacity(PREAMBLE_LEN + header.len() + payload + CHECKSUM_LEN);
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&(header.len() as u64).to_le_bytes());
    buf.extend_from_slice(&header);
    // `iter()` walks logical row-major order whatever the memory layout.
    for x in input.iter().chain(output.iter()) {
        buf.extend_from_slice(&x.to_le_bytes());
    }
    let checksum = blake3::hash(&buf);
    buf.extend_from_slice(checksum.as_bytes());
    Ok(buf)
}

/// Read a whole model file into memory and decode it.
pub fn read(path: &Path) -> LoadResult<RawModel> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    decode(&bytes, path)
}

/// Decode a model image. `origin` is only used in error messages.
pub fn decode(bytes: &[u8], origin: &Path) -> LoadResult<RawModel> {
    let corrupt = |message: String| LoadError::CorruptFormat {
        path: origin.to_path_buf(),
        message,
    };

    if bytes.len() < PREAMBLE_LEN + CHECKSUM_LEN {
        return Err(corrupt(format!("file too short ({} bytes)", bytes.len())));
    }
    if &bytes[..4] != MAGIC {
        return Err(corrupt("bad magic, not a sift model".into()));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {version} (expected {FORMAT_VERSION})"
        )));
    }

    let (body, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if blake3::hash(body).as_bytes() != trailer {
        return Err(corrupt("checksum mismatch".into()));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&body[8..PREAMBLE_LEN]);
    let header_len = usize::try_from(u64::from_le_bytes(len_bytes))
        .ok()
        .filter(|&n| n <= body.len() - PREAMBLE_LEN)
        .ok_or_else(|| corrupt("header length exceeds file size".into()))?;

    let header_end = PREAMBLE_LEN + header_len;
    let header: Header = serde_json::from_slice(&body[PREAMBLE_LEN..header_end])
        .map_err(|e| corrupt(format!("invalid header: {e}")))?;

    let mut payload = &body[header_end..];
    let input = take_matrix(&mut payload, header.input)
        .ok_or_else(|| corrupt("input matrix is truncated".into()))?;
    let output = take_matrix(&mut payload, header.output)
        .ok_or_else(|| corrupt("output matrix is truncated".into()))?;
    if !payload.is_empty() {
        return Err(corrupt(format!(
            "{} unexpected bytes after output matrix",
            payload.len()
        )));
    }
    for (name, matrix) in [("input", &input), ("output", &output)] {
        if let Some(((row, col), value)) = matrix.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(corrupt(format!(
                "{name} matrix has non-finite weight {value} at ({row}, {col})"
            )));
        }
    }

    Ok(RawModel {
        args: header.args,
        words: header.words,
        labels: header.labels,
        input,
        output,
    })
}

/// Split a `rows × cols` f32 matrix off the front of `payload`.
fn take_matrix(payload: &mut &[u8], shape: Shape) -> Option<Array2<f32>> {
    let n_bytes = shape.rows.checked_mul(shape.cols)?.checked_mul(4)?;
    if payload.len() < n_bytes {
        return None;
    }
    let (data, rest) = payload.split_at(n_bytes);
    *payload = rest;

    let values: Vec<f32> = data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Array2::from_shape_vec((shape.rows, shape.cols), values).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Loss;
    use ndarray::array;

    fn sample() -> Vec<u8> {
        encode(
            &ModelArgs::new(2, Loss::Softmax),
            &[Entry::new("game", 3), Entry::new("election", 2)],
            &[Entry::new("__label__sports", 4), Entry::new("__label__politics", 1)],
            array![[1.0, 0.0], [0.0, 1.0]].view(),
            array![[2.0, 0.0], [0.0, 2.0]].view(),
        )
        .unwrap()
    }

    fn origin() -> &'static Path {
        Path::new("sample.bin")
    }

    #[test]
    fn test_decode_restores_parts() {
        let raw = decode(&sample(), origin()).unwrap();
        assert_eq!(raw.args.dim, 2);
        assert_eq!(raw.words[1], Entry::new("election", 2));
        assert_eq!(raw.labels[0].token, "__label__sports");
        assert_eq!(raw.input, array![[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(raw.output, array![[2.0, 0.0], [0.0, 2.0]]);
    }

    #[test]
    fn test_transposed_view_is_written_in_logical_order() {
        let m = array![[1.0f32, 2.0], [3.0, 4.0]];
        let bytes = encode(
            &ModelArgs::new(2, Loss::Softmax),
            &[],
            &[Entry::new("x", 1)],
            m.t(),
            Array2::<f32>::zeros((1, 2)).view(),
        )
        .unwrap();
        let raw = decode(&bytes, origin()).unwrap();
        assert_eq!(raw.input, array![[1.0, 3.0], [2.0, 4.0]]);
    }

    #[test]
    fn test_non_finite_weights_rejected() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let bytes = encode(
                &ModelArgs::new(2, Loss::Softmax),
                &[Entry::new("game", 3)],
                &[Entry::new("__label__sports", 4)],
                array![[1.0, 0.0]].view(),
                array![[0.5, bad]].view(),
            )
            .unwrap();
            let err = decode(&bytes, origin()).unwrap_err();
            assert!(matches!(err, LoadError::CorruptFormat { .. }));
            assert!(err.to_string().contains("output matrix has non-finite weight"));
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample();
        bytes[0] = b'X';
        let err = decode(&bytes, origin()).unwrap_err();
        assert!(matches!(err, LoadError::CorruptFormat { .. }));
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_flipped_bit_fails_checksum() {
        let mut bytes = sample();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0x01;
        let err = decode(&bytes, origin()).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_truncated_file() {
        let bytes = sample();
        let err = decode(&bytes[..bytes.len() - 10], origin()).unwrap_err();
        assert!(matches!(err, LoadError::CorruptFormat { .. }));

        let err = decode(&bytes[..12], origin()).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_wrong_version() {
        let mut bytes = sample();
        bytes[4] = 9;
        let err = decode(&bytes, origin()).unwrap_err();
        assert!(err.to_string().contains("version 9"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read(Path::new("/nonexistent/model.bin")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, sample()).unwrap();
        let raw = read(&path).unwrap();
        assert_eq!(raw.labels.len(), 2);
    }
}
