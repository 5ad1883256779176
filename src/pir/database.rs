//! The server-held database, in cleartext and in plaintext-encoded form.

use crate::error::{PirError, Result};
use crate::fhe::fhe::EncryptionScheme;
use crate::math::utils::exact_sqrt;
use rand::Rng;

/// Integers in `[1, t - 1]`, addressed either flat or as a `v x v` row-major matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    values: Vec<u64>,
    plaintext_modulus: u64,
}

impl Database {
    pub fn new(values: Vec<u64>, plaintext_modulus: u64) -> Result<Self> {
        if let Some((i, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| **v == 0 || **v >= plaintext_modulus)
        {
            return Err(PirError::config(format!(
                "database entry {} = {} is outside [1, {}]",
                i,
                v,
                plaintext_modulus.saturating_sub(1)
            )));
        }
        Ok(Self {
            values,
            plaintext_modulus,
        })
    }

    /// Uniformly random entries in `[1, t - 1]`.
    pub fn random<R: Rng>(len: usize, plaintext_modulus: u64, rng: &mut R) -> Result<Self> {
        if plaintext_modulus < 2 {
            return Err(PirError::config(format!(
                "plaintext modulus {} has no non-zero entries",
                plaintext_modulus
            )));
        }
        Ok(Self {
            values: (0..len)
                .map(|_| rng.gen_range(1..plaintext_modulus))
                .collect(),
            plaintext_modulus,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn plaintext_modulus(&self) -> u64 {
        self.plaintext_modulus
    }

    pub fn get(&self, index: usize) -> Result<u64> {
        self.values
            .get(index)
            .copied()
            .ok_or(PirError::IndexOutOfRange {
                index: index as i64,
                len: self.len(),
            })
    }

    /// `v` such that `len = v * v`.
    pub fn side_length(&self) -> Result<usize> {
        side_length(self.len())
    }

    /// `(row, col) = (index / v, index % v)`.
    pub fn matrix_coordinates(&self, index: usize) -> Result<(usize, usize)> {
        let v = self.side_length()?;
        if index >= self.len() {
            return Err(PirError::IndexOutOfRange {
                index: index as i64,
                len: self.len(),
            });
        }
        Ok((index / v, index % v))
    }
}

pub fn side_length(len: usize) -> Result<usize> {
    exact_sqrt(len).ok_or(PirError::NonSquareDatabase { len })
}

/// The database with every entry encoded as a plaintext of the scheme.
pub struct EncodedDatabase<S: EncryptionScheme> {
    entries: Vec<S::Plaintext>,
}

impl<S: EncryptionScheme> EncodedDatabase<S> {
    pub fn encode(scheme: &S, db: &Database) -> Self {
        Self {
            entries: db.values().iter().map(|v| scheme.encode(*v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[S::Plaintext] {
        &self.entries
    }

    /// Row-major view as `v` rows of length `v`.
    pub fn rows(&self) -> Result<Vec<&[S::Plaintext]>> {
        let v = side_length(self.len())?;
        if v == 0 {
            return Ok(Vec::new());
        }
        Ok(self.entries.chunks(v).collect())
    }
}
