//! Dense square similarity matrix and its on-disk format.
//!
//! File layout, little-endian: the 8-byte magic, the dimension as `u64`,
//! then `dim * dim` `f32` scores in row-major order.

use super::LoadError;
use anyhow::{Context, Result};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"SIMMATv1";
const HEADER_LEN: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    dim: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    pub fn new(dim: usize, scores: Vec<f32>) -> Result<SimilarityMatrix, LoadError> {
        let expected = dim.checked_mul(dim).ok_or_else(|| {
            LoadError::MalformedMatrix(format!("dimension {} is too large", dim))
        })?;
        if scores.len() != expected {
            return Err(LoadError::MalformedMatrix(format!(
                "expected {} scores for a {}x{} matrix, got {}",
                expected,
                dim,
                dim,
                scores.len()
            )));
        }
        if let Some(position) = scores.iter().position(|s| !s.is_finite()) {
            return Err(LoadError::MalformedMatrix(format!(
                "non-finite score at row {} column {}",
                position / dim,
                position % dim
            )));
        }
        Ok(SimilarityMatrix { dim, scores })
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<SimilarityMatrix, LoadError> {
        let dim = rows.len();
        if let Some(row) = rows.iter().position(|r| r.len() != dim) {
            return Err(LoadError::MalformedMatrix(format!(
                "row {} has {} scores, the matrix is not square",
                row,
                rows[row].len()
            )));
        }
        SimilarityMatrix::new(dim, rows.into_iter().flatten().collect())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Scores of `position` against every catalog position.
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        if position >= self.dim {
            return None;
        }
        let start = position * self.dim;
        Some(&self.scores[start..start + self.dim])
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f32> {
        self.row(row).and_then(|r| r.get(column).copied())
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&(self.dim as u64).to_le_bytes())?;
        for score in &self.scores {
            writer.write_all(&score.to_le_bytes())?;
        }
        writer.flush()
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<SimilarityMatrix, LoadError> {
        let mut header = [0u8; HEADER_LEN];
        reader.read_exact(&mut header).map_err(|err| match err.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                LoadError::MalformedMatrix("file is shorter than its header".to_string())
            }
            _ => LoadError::Io(err),
        })?;
        if &header[..8] != MAGIC {
            return Err(LoadError::MalformedMatrix("bad magic".to_string()));
        }
        let mut dim_bytes = [0u8; 8];
        dim_bytes.copy_from_slice(&header[8..]);
        let dim = usize::try_from(u64::from_le_bytes(dim_bytes))
            .map_err(|_| LoadError::MalformedMatrix("dimension overflows usize".to_string()))?;

        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        let expected_bytes = dim
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| LoadError::MalformedMatrix(format!("dimension {} is too large", dim)))?;
        if payload.len() != expected_bytes {
            return Err(LoadError::MalformedMatrix(format!(
                "header says {}x{} ({} bytes of scores), found {} bytes",
                dim,
                dim,
                expected_bytes,
                payload.len()
            )));
        }

        let scores = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        SimilarityMatrix::new(dim, scores)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<SimilarityMatrix, LoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoadError::MissingArtifact {
                artifact: "similarity matrix",
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        SimilarityMatrix::read_from(BufReader::new(file))
    }

    /// Write the matrix next to `path` and atomically move it into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        let tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create a temp file in {:?}", dir))?;
        self.write_to(BufWriter::new(tmp.as_file()))?;
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .with_context(|| format!("Failed to move similarity matrix to {:?}", path))?;
        Ok(())
    }
}
