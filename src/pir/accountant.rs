//! Noise and depth accounting for retrieval steps, and the relinearization policy gate.

use crate::error::{PirError, Result};
use crate::fhe::fhe::{FHEScheme, NoiseMeasurable};
use crate::params::ParameterProfile;
use log::debug;
use std::fmt;
use std::str::FromStr;

/// When the matrix engine relinearizes the products of its second phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RelinearizationPolicy {
    /// Keep every product and partial sum at size 3.
    Never,
    /// Relinearize each product before it is accumulated.
    AfterEachProduct,
    /// Accumulate at size 3 and relinearize the sum once.
    Final,
    /// `AfterEachProduct` on shallow profiles, `Never` otherwise. The choice follows the cost
    /// estimate of `ParameterProfile::is_shallow`, not a measurement. Relinearizing spends about a
    /// bit of budget and only restores size 2, so a profile the estimate rejects can still run out
    /// of budget under every policy.
    #[default]
    Auto,
}

impl RelinearizationPolicy {
    pub fn resolve(self, profile: &ParameterProfile) -> Self {
        match self {
            RelinearizationPolicy::Auto if profile.is_shallow() => {
                RelinearizationPolicy::AfterEachProduct
            }
            RelinearizationPolicy::Auto => RelinearizationPolicy::Never,
            policy => policy,
        }
    }
}

impl fmt::Display for RelinearizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelinearizationPolicy::Never => "never",
            RelinearizationPolicy::AfterEachProduct => "each",
            RelinearizationPolicy::Final => "final",
            RelinearizationPolicy::Auto => "auto",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RelinearizationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" | "none" | "off" => Ok(RelinearizationPolicy::Never),
            "each" | "after-each-product" | "on" => Ok(RelinearizationPolicy::AfterEachProduct),
            "final" => Ok(RelinearizationPolicy::Final),
            "auto" => Ok(RelinearizationPolicy::Auto),
            _ => Err(format!(
                "unknown relinearization policy '{}' (expected never, each, final or auto)",
                s
            )),
        }
    }
}

/// Whether `ct` has to be relinearized before it takes part in a ciphertext-ciphertext
/// multiplication.
pub fn must_relinearize<S: FHEScheme>(
    scheme: &S,
    ct: &S::Ciphertext,
    policy: RelinearizationPolicy,
) -> bool {
    scheme.size(ct) > 2 && policy.resolve(scheme.profile()) != RelinearizationPolicy::Never
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseReading {
    pub step: &'static str,
    pub size: usize,
    pub noise_budget_bits: u32,
}

/// Records size and noise budget after each step it is shown. Holds the secret key, so it
/// belongs to the client; the server only receives it in diagnostic runs.
pub struct NoiseAccountant<'a, S: NoiseMeasurable> {
    scheme: &'a S,
    sk: &'a S::SecretKey,
    history: Vec<NoiseReading>,
}

impl<'a, S: NoiseMeasurable> NoiseAccountant<'a, S> {
    pub fn new(scheme: &'a S, sk: &'a S::SecretKey) -> Self {
        Self {
            scheme,
            sk,
            history: Vec::new(),
        }
    }

    /// Measures `ct` and records the reading. An exhausted budget is an error, since the value
    /// can no longer be decrypted reliably.
    pub fn after_operation(
        &mut self,
        step: &'static str,
        ct: &S::Ciphertext,
    ) -> Result<NoiseReading> {
        let reading = NoiseReading {
            step,
            size: self.scheme.size(ct),
            noise_budget_bits: self.scheme.noise_budget_bits(self.sk, ct),
        };
        debug!(
            "{}: size {}, noise budget {} bits",
            step, reading.size, reading.noise_budget_bits
        );
        self.history.push(reading.clone());
        if reading.noise_budget_bits == 0 {
            return Err(PirError::NoiseBudgetExhausted {
                step,
                size: reading.size,
            });
        }
        Ok(reading)
    }

    pub fn history(&self) -> &[NoiseReading] {
        &self.history
    }

    pub fn last(&self) -> Option<&NoiseReading> {
        self.history.last()
    }

    pub fn min_budget(&self) -> Option<u32> {
        self.history.iter().map(|r| r.noise_budget_bits).min()
    }
}

/// Records a reading if an accountant is attached.
pub(crate) fn record<S: NoiseMeasurable>(
    accountant: &mut Option<&mut NoiseAccountant<'_, S>>,
    step: &'static str,
    ct: &S::Ciphertext,
) -> Result<()> {
    if let Some(accountant) = accountant {
        accountant.after_operation(step, ct)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fhe::fhe::*;
    use crate::fhe::noise_tracker::NoiseTracker;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_policy_resolution() {
        let shallow = ParameterProfile::SHALLOW_1024;
        let deep = ParameterProfile::DEEP_4096;
        assert_eq!(
            RelinearizationPolicy::Auto.resolve(&shallow),
            RelinearizationPolicy::AfterEachProduct
        );
        assert_eq!(
            RelinearizationPolicy::Auto.resolve(&deep),
            RelinearizationPolicy::Never
        );
        assert_eq!(
            RelinearizationPolicy::Auto.resolve(&ParameterProfile::ORIGINAL),
            RelinearizationPolicy::Never
        );
        assert_eq!(
            RelinearizationPolicy::Final.resolve(&shallow),
            RelinearizationPolicy::Final
        );
        assert_eq!(
            "each".parse::<RelinearizationPolicy>(),
            Ok(RelinearizationPolicy::AfterEachProduct)
        );
        assert!("sometimes".parse::<RelinearizationPolicy>().is_err());
    }

    #[test]
    fn test_must_relinearize() {
        let scheme = NoiseTracker::new(ParameterProfile::ORIGINAL).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let a = scheme.encrypt_sk(&(), &2, &mut rng);
        let prod = scheme.mul_hom(&a, &a);
        assert!(!must_relinearize(&scheme, &a, RelinearizationPolicy::AfterEachProduct));
        assert!(must_relinearize(&scheme, &prod, RelinearizationPolicy::AfterEachProduct));
        assert!(must_relinearize(&scheme, &prod, RelinearizationPolicy::Final));
        assert!(!must_relinearize(&scheme, &prod, RelinearizationPolicy::Never));
    }

    #[test]
    fn test_history_and_exhaustion() {
        let scheme = NoiseTracker::new(ParameterProfile::SHALLOW_1024).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let mut accountant = NoiseAccountant::new(&scheme, &());
        let a = scheme.encrypt_sk(&(), &2, &mut rng);
        let fresh = accountant.after_operation("encrypt", &a).unwrap();
        assert_eq!(fresh.size, 2);

        let b = scheme.mul_scalar(&a, &5);
        let after = accountant.after_operation("plain multiply", &b).unwrap();
        assert!(after.noise_budget_bits < fresh.noise_budget_bits);

        let c = scheme.mul_hom(&b, &a);
        assert_eq!(
            accountant.after_operation("cipher multiply", &c),
            Err(PirError::NoiseBudgetExhausted {
                step: "cipher multiply",
                size: 3
            })
        );
        assert_eq!(accountant.history().len(), 3);
        assert_eq!(accountant.min_budget(), Some(0));
        assert_eq!(accountant.last().map(|r| r.step), Some("cipher multiply"));
    }
}
