//! On-disk cache of corpus embeddings.
//!
//! File format: vectors.bin
//!
//! Header (47 bytes):
//! - version: u8 (1)
//! - model_id: [u8; 32] (SHA256 hash of model name)
//! - dimensions: u16 (little-endian)
//! - entry_count: u64 (little-endian)
//! - checksum: u32 (CRC32 of header fields before checksum)
//!
//! Entries (repeated):
//! - row: u64 (little-endian, catalog row)
//! - content_hash: u64 (little-endian, hash of the embedded text)
//! - embedding: [f32; dimensions] (little-endian)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::semantic::index::{CorpusIndex, VectorEntry};

const FORMAT_VERSION: u8 = 1;

/// version(1) + model_id(32) + dimensions(2) + entry_count(8) + checksum(4)
const HEADER_SIZE: usize = 47;

#[derive(Debug, thiserror::Error)]
pub enum VectorStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Version mismatch: file version {0}, supported version {1}")]
    VersionMismatch(u8, u8),

    #[error("Model mismatch: file uses different model")]
    ModelMismatch,

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("Dimension mismatch: expected {expected}, file has {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug)]
struct Header {
    model_id: [u8; 32],
    dimensions: u16,
    entry_count: u64,
}

pub struct VectorStorage {
    path: PathBuf,
}

impl VectorStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads every cached entry keyed by catalog row.
    ///
    /// Fails when the file was written by another model or with other
    /// dimensions; callers treat that as an empty cache.
    pub fn load(
        &self,
        expected_model_id: &[u8; 32],
        expected_dimensions: usize,
    ) -> Result<HashMap<usize, VectorEntry>, VectorStorageError> {
        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = Self::read_header(&mut reader)?;
        if header.model_id != *expected_model_id {
            return Err(VectorStorageError::ModelMismatch);
        }
        if header.dimensions as usize != expected_dimensions {
            return Err(VectorStorageError::DimensionMismatch {
                expected: expected_dimensions,
                got: header.dimensions as usize,
            });
        }

        // row(8) + content_hash(8) + embedding
        let entry_size = 16 + 4 * expected_dimensions as u64;
        let body_len = file_len - HEADER_SIZE as u64;
        let expected_len = header
            .entry_count
            .checked_mul(entry_size)
            .ok_or_else(|| {
                VectorStorageError::InvalidFormat(format!("{} entries overflow", header.entry_count))
            })?;
        if expected_len != body_len {
            return Err(VectorStorageError::InvalidFormat(format!(
                "{} entries need {expected_len} body bytes, file has {body_len}",
                header.entry_count
            )));
        }

        let capacity = (body_len / entry_size) as usize;
        let mut entries = HashMap::with_capacity(capacity);
        for _ in 0..header.entry_count {
            let (row, entry) = Self::read_entry(&mut reader, expected_dimensions)?;
            entries.insert(row, entry);
        }

        Ok(entries)
    }

    /// Atomic write: temp file -> fsync -> rename
    pub fn save(&self, index: &CorpusIndex, model_id: &[u8; 32]) -> Result<(), VectorStorageError> {
        let temp_path = self.path.with_extension("tmp");

        if let Err(err) = Self::write_to_file(&temp_path, index, model_id) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(err);
        }

        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn write_to_file(
        path: &Path,
        index: &CorpusIndex,
        model_id: &[u8; 32],
    ) -> Result<(), VectorStorageError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let header = Self::encode_header(model_id, index.dimensions() as u16, index.len() as u64);
        writer.write_all(&header)?;

        for (row, entry) in index.iter() {
            writer.write_all(&(row as u64).to_le_bytes())?;
            writer.write_all(&entry.content_hash.to_le_bytes())?;
            for value in &entry.embedding {
                writer.write_all(&value.to_le_bytes())?;
            }
        }

        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        file.sync_all()?;

        Ok(())
    }

    fn encode_header(model_id: &[u8; 32], dimensions: u16, entry_count: u64) -> [u8; HEADER_SIZE] {
        let mut header = [0u8; HEADER_SIZE];
        header[0] = FORMAT_VERSION;
        header[1..33].copy_from_slice(model_id);
        header[33..35].copy_from_slice(&dimensions.to_le_bytes());
        header[35..43].copy_from_slice(&entry_count.to_le_bytes());
        let checksum = crc32fast::hash(&header[0..43]);
        header[43..47].copy_from_slice(&checksum.to_le_bytes());
        header
    }

    fn read_header(reader: &mut impl Read) -> Result<Header, VectorStorageError> {
        let mut bytes = [0u8; HEADER_SIZE];
        reader.read_exact(&mut bytes)?;

        let version = bytes[0];
        if version != FORMAT_VERSION {
            return Err(VectorStorageError::VersionMismatch(version, FORMAT_VERSION));
        }

        let mut checksum = [0u8; 4];
        checksum.copy_from_slice(&bytes[43..47]);
        if u32::from_le_bytes(checksum) != crc32fast::hash(&bytes[0..43]) {
            return Err(VectorStorageError::ChecksumMismatch);
        }

        let mut model_id = [0u8; 32];
        model_id.copy_from_slice(&bytes[1..33]);
        let mut entry_count = [0u8; 8];
        entry_count.copy_from_slice(&bytes[35..43]);

        Ok(Header {
            model_id,
            dimensions: u16::from_le_bytes([bytes[33], bytes[34]]),
            entry_count: u64::from_le_bytes(entry_count),
        })
    }

    fn read_entry(
        reader: &mut impl Read,
        dimensions: usize,
    ) -> Result<(usize, VectorEntry), VectorStorageError> {
        let mut word = [0u8; 8];
        reader.read_exact(&mut word)?;
        let row = u64::from_le_bytes(word) as usize;

        reader.read_exact(&mut word)?;
        let content_hash = u64::from_le_bytes(word);

        let mut embedding = Vec::with_capacity(dimensions);
        let mut float_bytes = [0u8; 4];
        for _ in 0..dimensions {
            reader.read_exact(&mut float_bytes)?;
            embedding.push(f32::from_le_bytes(float_bytes));
        }

        Ok((
            row,
            VectorEntry {
                content_hash,
                embedding,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model_id() -> [u8; 32] {
        let mut id = [0u8; 32];
        id[0] = 0xAB;
        id[31] = 0xCD;
        id
    }

    fn sample_index() -> CorpusIndex {
        let mut index = CorpusIndex::new(3);
        index.push(100, vec![1.0, 0.0, 0.0]).unwrap();
        index.push(200, vec![0.0, 1.0, 0.0]).unwrap();
        index
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = VectorStorage::new(dir.path().join("vectors.bin"));

        storage.save(&sample_index(), &test_model_id()).unwrap();
        assert!(storage.exists());

        let loaded = storage.load(&test_model_id(), 3).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[&0].content_hash, 100);
        assert_eq!(loaded[&1].embedding, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_model_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let storage = VectorStorage::new(dir.path().join("vectors.bin"));
        storage.save(&sample_index(), &test_model_id()).unwrap();

        let result = storage.load(&[0xFF; 32], 3);
        assert!(matches!(result, Err(VectorStorageError::ModelMismatch)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let storage = VectorStorage::new(dir.path().join("vectors.bin"));
        storage.save(&sample_index(), &test_model_id()).unwrap();

        let result = storage.load(&test_model_id(), 384);
        assert!(matches!(result, Err(VectorStorageError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.bin");
        let storage = VectorStorage::new(path.clone());
        storage.save(&sample_index(), &test_model_id()).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes[10] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let result = storage.load(&test_model_id(), 3);
        assert!(matches!(result, Err(VectorStorageError::ChecksumMismatch)));
    }

    #[test]
    fn test_truncated_body_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.bin");
        let storage = VectorStorage::new(path.clone());
        storage.save(&sample_index(), &test_model_id()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

        let result = storage.load(&test_model_id(), 3);
        assert!(matches!(result, Err(VectorStorageError::InvalidFormat(_))));
    }

    #[test]
    fn test_entry_count_larger_than_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.bin");

        for entry_count in [300_000_000, u64::MAX] {
            let mut bytes = VectorStorage::encode_header(&test_model_id(), 3, entry_count).to_vec();
            bytes.extend_from_slice(&[0u8; 28]);
            std::fs::write(&path, bytes).unwrap();

            let result = VectorStorage::new(path.clone()).load(&test_model_id(), 3);
            assert!(
                matches!(result, Err(VectorStorageError::InvalidFormat(_))),
                "entry_count={entry_count}"
            );
        }
    }

    #[test]
    fn test_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.bin");

        let mut bytes = VectorStorage::encode_header(&test_model_id(), 3, 0).to_vec();
        bytes[0] = 0;
        std::fs::write(&path, bytes).unwrap();

        let result = VectorStorage::new(path).load(&test_model_id(), 3);
        assert!(matches!(result, Err(VectorStorageError::VersionMismatch(0, 1))));
    }

    #[test]
    fn test_failed_save_cleans_up_temp_file() {
        let path = PathBuf::from("/nonexistent/directory/vectors.bin");
        let storage = VectorStorage::new(path.clone());

        assert!(storage.save(&sample_index(), &test_model_id()).is_err());
        assert!(!path.with_extension("tmp").exists());
    }
}
