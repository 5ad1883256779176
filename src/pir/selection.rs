//! One-hot encrypted selection vectors.

use crate::error::{PirError, Result};
use crate::fhe::fhe::EncryptionScheme;
use log::debug;
use rand::Rng;

/// Validates a caller-supplied index against a length.
pub fn checked_index(index: i64, len: usize) -> Result<usize> {
    if index < 0 || index as u64 >= len as u64 {
        return Err(PirError::IndexOutOfRange { index, len });
    }
    Ok(index as usize)
}

/// Encrypts `1` at `hot_index` and `0` everywhere else. Every position is a fresh encryption.
pub fn build_one_hot<S: EncryptionScheme, R: Rng>(
    scheme: &S,
    sk: &S::SecretKey,
    length: usize,
    hot_index: usize,
    rng: &mut R,
) -> Result<Vec<S::Ciphertext>> {
    if length == 0 {
        return Err(PirError::EmptyInput);
    }
    if hot_index >= length {
        return Err(PirError::IndexOutOfRange {
            index: hot_index as i64,
            len: length,
        });
    }

    let zero = scheme.encode(0);
    let one = scheme.encode(1);
    let vector = (0..length)
        .map(|i| {
            let mu = if i == hot_index { &one } else { &zero };
            scheme.encrypt_sk(sk, mu, rng)
        })
        .collect();
    debug!("built one-hot vector of length {}", length);
    Ok(vector)
}

/// Builds `(column_vector, row_vector)` for `index` in a `vec_len x vec_len` matrix, hot at
/// `index % vec_len` and `index / vec_len` respectively.
pub fn build_row_and_column<S: EncryptionScheme, R: Rng>(
    scheme: &S,
    sk: &S::SecretKey,
    vec_len: usize,
    index: usize,
    rng: &mut R,
) -> Result<(Vec<S::Ciphertext>, Vec<S::Ciphertext>)> {
    if vec_len == 0 {
        return Err(PirError::EmptyInput);
    }
    let len = vec_len * vec_len;
    if index >= len {
        return Err(PirError::IndexOutOfRange {
            index: index as i64,
            len,
        });
    }
    let col = index % vec_len;
    let row = index / vec_len;
    let column_vector = build_one_hot(scheme, sk, vec_len, col, rng)?;
    let row_vector = build_one_hot(scheme, sk, vec_len, row, rng)?;
    Ok((column_vector, row_vector))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fhe::bfv::BfvContext;
    use crate::fhe::noise_tracker::NoiseTracker;
    use crate::params::ParameterProfile;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_checked_index() {
        assert_eq!(checked_index(0, 4), Ok(0));
        assert_eq!(checked_index(3, 4), Ok(3));
        assert_eq!(
            checked_index(4, 4),
            Err(PirError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert_eq!(
            checked_index(-1, 4),
            Err(PirError::IndexOutOfRange { index: -1, len: 4 })
        );
    }

    #[test]
    fn test_exactly_one_hot() {
        let scheme = NoiseTracker::new(ParameterProfile::ORIGINAL).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let v = build_one_hot(&scheme, &(), 6, 4, &mut rng).unwrap();
        let decrypted: Vec<u64> = v.iter().map(|c| scheme.decrypt(&(), c)).collect();
        assert_eq!(decrypted, vec![0, 0, 0, 0, 1, 0]);
        assert_eq!(scheme.encryptions(), 6);
    }

    #[test]
    fn test_bad_arguments_build_nothing() {
        let scheme = NoiseTracker::new(ParameterProfile::ORIGINAL).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        assert_eq!(
            build_one_hot(&scheme, &(), 4, 4, &mut rng).unwrap_err(),
            PirError::IndexOutOfRange { index: 4, len: 4 }
        );
        assert_eq!(
            build_one_hot(&scheme, &(), 0, 0, &mut rng).unwrap_err(),
            PirError::EmptyInput
        );
        assert_eq!(
            build_row_and_column(&scheme, &(), 3, 9, &mut rng).unwrap_err(),
            PirError::IndexOutOfRange { index: 9, len: 9 }
        );
        assert_eq!(scheme.encryptions(), 0);
    }

    #[test]
    fn test_row_and_column() {
        let scheme = NoiseTracker::new(ParameterProfile::ORIGINAL).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let (col, row) = build_row_and_column(&scheme, &(), 3, 7, &mut rng).unwrap();
        let col: Vec<u64> = col.iter().map(|c| scheme.decrypt(&(), c)).collect();
        let row: Vec<u64> = row.iter().map(|c| scheme.decrypt(&(), c)).collect();
        assert_eq!(col, vec![0, 1, 0]);
        assert_eq!(row, vec![0, 0, 1]);
    }

    #[test]
    fn test_positions_are_independent_encryptions() {
        let scheme = BfvContext::new(ParameterProfile::ORIGINAL).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sk = scheme.keygen(&mut rng);
        let v = build_one_hot(&scheme, &sk, 3, 0, &mut rng).unwrap();
        assert_ne!(v[1], v[2]);
        let decrypted: Vec<u64> = v
            .iter()
            .map(|c| scheme.decode(&scheme.decrypt(&sk, c)))
            .collect();
        assert_eq!(decrypted, vec![1, 0, 0]);
    }
}
