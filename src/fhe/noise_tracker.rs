//! A trivial (insecure) scheme that carries plaintexts in the clear and tracks an estimated noise
//! budget per ciphertext, using the cost model of a `ParameterProfile`.
//!
//! Ciphertexts whose budget has run out decrypt to a wrong value, which mimics a real scheme
//! failing silently. It also counts encryptions, so callers can check that none happened.
use crate::error::{PirError, Result};
use crate::fhe::fhe::*;
use crate::params::ParameterProfile;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Budget consumed by one relinearization.
pub const RELIN_COST_BITS: i64 = 1;

pub struct NoiseTracker {
    profile: ParameterProfile,
    encryptions: AtomicUsize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseCiphertext {
    x: u64,
    size: usize,
    budget: i64,
}

impl NoiseCiphertext {
    pub fn budget(&self) -> i64 {
        self.budget
    }
}

impl NoiseTracker {
    pub fn new(profile: ParameterProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            profile,
            encryptions: AtomicUsize::new(0),
        })
    }

    /// Number of encryptions performed so far.
    pub fn encryptions(&self) -> usize {
        self.encryptions.load(Ordering::Relaxed)
    }

    fn t(&self) -> u64 {
        self.profile.plaintext_modulus
    }
}

impl EncryptionScheme for NoiseTracker {
    type Plaintext = u64;
    type Ciphertext = NoiseCiphertext;
    type SecretKey = ();

    fn keygen<R: Rng>(&self, _: &mut R) -> Self::SecretKey {}

    fn encode(&self, value: u64) -> u64 {
        value % self.t()
    }

    fn decode(&self, pt: &u64) -> u64 {
        *pt
    }

    fn encrypt_sk<R: Rng>(&self, _: &(), mu: &u64, _: &mut R) -> NoiseCiphertext {
        self.encryptions.fetch_add(1, Ordering::Relaxed);
        NoiseCiphertext {
            x: *mu % self.t(),
            size: 2,
            budget: self.profile.fresh_noise_budget(),
        }
    }

    fn decrypt(&self, _: &(), ct: &NoiseCiphertext) -> u64 {
        if ct.budget <= 0 {
            (ct.x + 1) % self.t()
        } else {
            ct.x
        }
    }
}

impl AddHomEncryptionScheme for NoiseTracker {
    fn add_hom(&self, lhs: &NoiseCiphertext, rhs: &NoiseCiphertext) -> NoiseCiphertext {
        // Equal noise doubles
        let carry = (lhs.budget == rhs.budget) as i64;
        NoiseCiphertext {
            x: (lhs.x + rhs.x) % self.t(),
            size: lhs.size.max(rhs.size),
            budget: lhs.budget.min(rhs.budget) - carry,
        }
    }
}

impl AddScalarEncryptionScheme for NoiseTracker {
    fn add_scalar(&self, lhs: &NoiseCiphertext, rhs: &u64) -> NoiseCiphertext {
        NoiseCiphertext {
            x: (lhs.x + rhs) % self.t(),
            ..lhs.clone()
        }
    }
}

impl MulScalarEncryptionScheme for NoiseTracker {
    fn mul_scalar(&self, lhs: &NoiseCiphertext, rhs: &u64) -> NoiseCiphertext {
        NoiseCiphertext {
            x: ((lhs.x as u128 * *rhs as u128) % self.t() as u128) as u64,
            size: lhs.size,
            budget: lhs.budget - self.profile.plain_mult_cost(),
        }
    }
}

impl MulHomEncryptionScheme for NoiseTracker {
    fn mul_hom(&self, lhs: &NoiseCiphertext, rhs: &NoiseCiphertext) -> NoiseCiphertext {
        NoiseCiphertext {
            x: ((lhs.x as u128 * rhs.x as u128) % self.t() as u128) as u64,
            size: lhs.size + rhs.size - 1,
            budget: lhs.budget.min(rhs.budget) - self.profile.cipher_mult_cost(),
        }
    }
}

impl RelinEncryptionScheme for NoiseTracker {
    type RelinKey = ();

    fn relin_keygen<R: Rng>(&self, _: &(), _: &mut R) {}

    fn relinearize(&self, ct: &NoiseCiphertext, _: &()) -> Result<NoiseCiphertext> {
        match ct.size {
            0..=2 => Ok(ct.clone()),
            3 => Ok(NoiseCiphertext {
                x: ct.x,
                size: 2,
                budget: ct.budget - RELIN_COST_BITS,
            }),
            size => Err(PirError::Engine(format!(
                "cannot relinearize a ciphertext of size {}",
                size
            ))),
        }
    }
}

impl NoiseMeasurable for NoiseTracker {
    fn size(&self, ct: &NoiseCiphertext) -> usize {
        ct.size
    }

    fn noise_budget_bits(&self, _: &(), ct: &NoiseCiphertext) -> u32 {
        ct.budget.max(0) as u32
    }
}

impl FHEScheme for NoiseTracker {
    fn profile(&self) -> &ParameterProfile {
        &self.profile
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_tracks_budget_and_size() {
        let profile = ParameterProfile::ORIGINAL;
        let scheme = NoiseTracker::new(profile).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let a = scheme.encrypt_sk(&(), &5, &mut rng);
        let b = scheme.encrypt_sk(&(), &7, &mut rng);
        assert_eq!(scheme.encryptions(), 2);
        assert_eq!(scheme.noise_budget_bits(&(), &a), 39);

        let prod = scheme.mul_hom(&a, &b);
        assert_eq!(scheme.size(&prod), 3);
        assert_eq!(scheme.decrypt(&(), &prod), 35);
        assert_eq!(prod.budget(), 39 - profile.cipher_mult_cost());

        let relin = scheme.relinearize(&prod, &()).unwrap();
        assert_eq!(scheme.size(&relin), 2);
        assert_eq!(scheme.decrypt(&(), &relin), 35);
        assert!(scheme.relinearize(&scheme.mul_hom(&prod, &a), &()).is_err());
    }

    #[test]
    fn test_exhausted_ciphertexts_decrypt_wrong() {
        let scheme = NoiseTracker::new(ParameterProfile::SHALLOW_1024).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let a = scheme.encrypt_sk(&(), &3, &mut rng);
        let b = scheme.mul_scalar(&a, &4);
        assert_eq!(scheme.decrypt(&(), &b), 12);
        let c = scheme.mul_hom(&b, &a);
        assert_eq!(scheme.noise_budget_bits(&(), &c), 0);
        assert_ne!(scheme.decrypt(&(), &c), 36);
    }
}
