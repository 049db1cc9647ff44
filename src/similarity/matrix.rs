//! Square item-similarity matrix and its binary file format.
//!
//! File format: similarity.bin
//!
//! Header (13 bytes):
//! - version: u8 (1)
//! - rows: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Body: rows * rows f32 scores, row-major, little-endian.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Current file format version
const FORMAT_VERSION: u8 = 1;

/// Header size in bytes: version(1) + rows(8) + checksum(4)
const HEADER_SIZE: usize = 13;

#[derive(Debug, thiserror::Error)]
pub enum SimilarityError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("Matrix is not square: row {row} has {got} columns, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Matrix has {got} rows but the catalog has {expected} movies")]
    CatalogMismatch { expected: usize, got: usize },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Pairwise similarity scores indexed by catalog row.
#[derive(Debug, Clone, Default)]
pub struct SimilarityMatrix {
    rows: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, SimilarityError> {
        let expected = rows.len();
        let mut scores = Vec::with_capacity(expected * expected);

        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != expected {
                return Err(SimilarityError::NotSquare {
                    row,
                    expected,
                    got: values.len(),
                });
            }
            scores.extend(values);
        }

        Ok(Self {
            rows: expected,
            scores,
        })
    }

    /// Number of rows (and columns).
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, row: usize) -> Option<&[f32]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.rows;
        Some(&self.scores[start..start + self.rows])
    }

    pub fn load(path: &Path) -> Result<Self, SimilarityError> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let version = header[0];
        if version != FORMAT_VERSION {
            return Err(SimilarityError::VersionMismatch(version, FORMAT_VERSION));
        }

        let mut rows_bytes = [0u8; 8];
        rows_bytes.copy_from_slice(&header[1..9]);
        let rows = u64::from_le_bytes(rows_bytes);

        let mut checksum_bytes = [0u8; 4];
        checksum_bytes.copy_from_slice(&header[9..13]);
        if u32::from_le_bytes(checksum_bytes) != crc32fast::hash(&header[0..9]) {
            return Err(SimilarityError::ChecksumMismatch);
        }

        // The body size must be known to fit the file before anything is
        // allocated from the header.
        let body_len = rows
            .checked_mul(rows)
            .and_then(|cells| cells.checked_mul(4))
            .ok_or_else(|| SimilarityError::InvalidFormat(format!("{rows} rows overflow")))?;
        let actual = file_len - HEADER_SIZE as u64;
        if body_len != actual {
            return Err(SimilarityError::InvalidFormat(format!(
                "{rows} rows need {body_len} body bytes, file has {actual}"
            )));
        }

        let rows = usize::try_from(rows)
            .map_err(|_| SimilarityError::InvalidFormat(format!("{rows} rows overflow")))?;
        let cells = rows * rows;

        let mut scores = Vec::with_capacity(cells);
        let mut float_bytes = [0u8; 4];
        for _ in 0..cells {
            reader.read_exact(&mut float_bytes)?;
            scores.push(f32::from_le_bytes(float_bytes));
        }

        log::info!("loaded {rows}x{rows} similarity matrix from {}", path.display());

        Ok(Self { rows, scores })
    }
}

/// Writing the matrix belongs to the offline build; it is kept for fixtures.
#[cfg(test)]
impl SimilarityMatrix {
    /// Atomic write: temp file -> fsync -> rename
    pub fn save(&self, path: &Path) -> Result<(), SimilarityError> {
        let temp_path = path.with_extension("tmp");

        if let Err(err) = self.write_to_file(&temp_path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err);
        }

        std::fs::rename(&temp_path, path)?;
        Ok(())
    }

    fn write_to_file(&self, path: &Path) -> Result<(), SimilarityError> {
        use std::io::{BufWriter, Write};

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(&encode_header(self.rows as u64))?;
        for value in &self.scores {
            writer.write_all(&value.to_le_bytes())?;
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        file.sync_all()?;

        Ok(())
    }
}

#[cfg(test)]
fn encode_header(rows: u64) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0] = FORMAT_VERSION;
    header[1..9].copy_from_slice(&rows.to_le_bytes());
    let checksum = crc32fast::hash(&header[0..9]);
    header[9..13].copy_from_slice(&checksum.to_le_bytes());
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimilarityMatrix {
        SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.5, 0.1],
            vec![0.5, 1.0, 0.3],
            vec![0.1, 0.3, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, 0.2], vec![0.2]]);
        assert!(matches!(
            result,
            Err(SimilarityError::NotSquare { row: 1, expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_row_access() {
        let matrix = sample();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.row(1), Some(&[0.5, 1.0, 0.3][..]));
        assert_eq!(matrix.row(3), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");

        sample().save(&path).unwrap();
        let loaded = SimilarityMatrix::load(&path).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.row(2), Some(&[0.1, 0.3, 1.0][..]));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");
        sample().save(&path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[3] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let result = SimilarityMatrix::load(&path);
        assert!(matches!(result, Err(SimilarityError::ChecksumMismatch)));
    }

    #[test]
    fn test_truncated_body_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");
        sample().save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            SimilarityMatrix::load(&path),
            Err(SimilarityError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_row_count_larger_than_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");

        let mut bytes = encode_header(300_000).to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            SimilarityMatrix::load(&path),
            Err(SimilarityError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_overflowing_row_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");

        let mut bytes = encode_header(1 << 33).to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            SimilarityMatrix::load(&path),
            Err(SimilarityError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");

        let mut bytes = encode_header(0).to_vec();
        bytes[0] = 0;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            SimilarityMatrix::load(&path),
            Err(SimilarityError::VersionMismatch(0, FORMAT_VERSION))
        ));
    }
}
