//! End-to-end correctness check of a retrieval result.

use crate::error::{PirError, Result};
use crate::fhe::fhe::FHEScheme;

/// Decrypts `result` once and compares it with `expected`. A result without noise budget is
/// reported as exhausted instead of being decrypted.
pub fn verify<S: FHEScheme>(
    scheme: &S,
    sk: &S::SecretKey,
    result: &S::Ciphertext,
    expected: u64,
) -> Result<u64> {
    if scheme.noise_budget_bits(sk, result) == 0 {
        return Err(PirError::NoiseBudgetExhausted {
            step: "verify",
            size: scheme.size(result),
        });
    }
    let actual = scheme.decode(&scheme.decrypt(sk, result));
    if actual != expected {
        return Err(PirError::Mismatch { expected, actual });
    }
    Ok(actual)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fhe::fhe::*;
    use crate::fhe::noise_tracker::NoiseTracker;
    use crate::params::ParameterProfile;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_verify() {
        let scheme = NoiseTracker::new(ParameterProfile::ORIGINAL).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let ct = scheme.encrypt_sk(&(), &42, &mut rng);
        assert_eq!(verify(&scheme, &(), &ct, 42), Ok(42));
        assert_eq!(
            verify(&scheme, &(), &ct, 43),
            Err(PirError::Mismatch {
                expected: 43,
                actual: 42
            })
        );
    }

    #[test]
    fn test_exhausted_result_is_not_trusted() {
        let scheme = NoiseTracker::new(ParameterProfile::SHALLOW_1024).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let ct = scheme.encrypt_sk(&(), &2, &mut rng);
        let ct = scheme.mul_hom(&ct, &ct);
        assert_eq!(
            verify(&scheme, &(), &ct, 4),
            Err(PirError::NoiseBudgetExhausted {
                step: "verify",
                size: 3
            })
        );
    }
}
