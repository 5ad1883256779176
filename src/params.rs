//! Scheme parameters: presets, validation and rough noise-budget estimates.

use crate::error::{PirError, Result};
use crate::fhe::bfv::BfvContext;
use crate::math::number_theory::{find_ntt_prime, is_prime};
use crate::math::utils::{bit_count, ceil_log, floor_log};

/// Ring degrees the engine has parameters for.
pub const SUPPORTED_DEGREES: [usize; 3] = [1024, 2048, 4096];

/// Widest coefficient modulus the engine accepts. Exact ciphertext products are reconstructed
/// from two 61-bit primes, which bounds `2 * (bits - 1) + log2(d)`.
pub const MAX_COEFF_MODULUS_BITS: u32 = 54;

/// A profile is shallow when a plaintext multiplication followed by a ciphertext
/// multiplication is estimated to leave fewer bits than this, i.e. no budget at all.
pub const SHALLOW_MARGIN_BITS: i64 = 1;

pub const DEFAULT_NOISE_WIDTH_MILLIONTHS: u64 = 8_000_000;
pub const DEFAULT_RELIN_BASE_LOG: u32 = 12;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoeffModulus {
    /// Largest NTT-friendly prime of the default width for the degree.
    Default,
    /// Largest NTT-friendly prime with exactly this many bits.
    Bits(u32),
    /// An explicit prime.
    Value(u64),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ParameterProfile {
    pub ring_degree: usize,
    pub coeff_modulus: CoeffModulus,
    pub plaintext_modulus: u64,
    pub noise_width_millionths: u64,
    pub relin_base_log: u32,
}

/// Largest coefficient modulus width with 128-bit security for a ternary secret.
fn security_bound_bits(ring_degree: usize) -> u32 {
    match ring_degree {
        1024 => 27,
        2048 => 54,
        4096 => 109,
        _ => 0,
    }
}

fn default_modulus_bits(ring_degree: usize) -> u32 {
    security_bound_bits(ring_degree).min(MAX_COEFF_MODULUS_BITS)
}

impl ParameterProfile {
    /// The parameters of the reference demos.
    pub const ORIGINAL: Self = Self {
        ring_degree: 2048,
        coeff_modulus: CoeffModulus::Value(0x3fffffff000001),
        plaintext_modulus: 1024,
        noise_width_millionths: DEFAULT_NOISE_WIDTH_MILLIONTHS,
        relin_base_log: DEFAULT_RELIN_BASE_LOG,
    };

    pub const DEFAULT_2048: Self = Self {
        ring_degree: 2048,
        coeff_modulus: CoeffModulus::Default,
        plaintext_modulus: 1024,
        noise_width_millionths: DEFAULT_NOISE_WIDTH_MILLIONTHS,
        relin_base_log: DEFAULT_RELIN_BASE_LOG,
    };

    /// Too little budget for a ciphertext-ciphertext product after selection.
    pub const SHALLOW_1024: Self = Self {
        ring_degree: 1024,
        coeff_modulus: CoeffModulus::Default,
        plaintext_modulus: 1024,
        noise_width_millionths: DEFAULT_NOISE_WIDTH_MILLIONTHS,
        relin_base_log: DEFAULT_RELIN_BASE_LOG,
    };

    pub const DEEP_4096: Self = Self {
        ring_degree: 4096,
        coeff_modulus: CoeffModulus::Default,
        plaintext_modulus: 256,
        noise_width_millionths: DEFAULT_NOISE_WIDTH_MILLIONTHS,
        relin_base_log: DEFAULT_RELIN_BASE_LOG,
    };

    pub fn new(ring_degree: usize, plaintext_modulus: u64) -> Self {
        Self {
            ring_degree,
            coeff_modulus: CoeffModulus::Default,
            plaintext_modulus,
            noise_width_millionths: DEFAULT_NOISE_WIDTH_MILLIONTHS,
            relin_base_log: DEFAULT_RELIN_BASE_LOG,
        }
    }

    pub fn coeff_modulus_bits(&self) -> u32 {
        match self.coeff_modulus {
            CoeffModulus::Default => default_modulus_bits(self.ring_degree),
            CoeffModulus::Bits(bits) => bits,
            CoeffModulus::Value(q) => bit_count(q as u128),
        }
    }

    fn plaintext_bits(&self) -> i64 {
        ceil_log(2, self.plaintext_modulus.max(2)) as i64
    }

    fn log_degree(&self) -> i64 {
        floor_log(2, self.ring_degree.max(1) as u64) as i64
    }

    /// Estimated budget of a fresh encryption, in bits.
    pub fn fresh_noise_budget(&self) -> i64 {
        self.coeff_modulus_bits() as i64 - self.plaintext_bits() - 5
    }

    /// Estimated budget consumed by multiplying by a plaintext in `Z_t`.
    pub fn plain_mult_cost(&self) -> i64 {
        self.plaintext_bits() - 1
    }

    /// Estimated budget consumed by a ciphertext-ciphertext multiplication.
    pub fn cipher_mult_cost(&self) -> i64 {
        self.plaintext_bits() + self.log_degree()
    }

    pub fn is_shallow(&self) -> bool {
        self.fresh_noise_budget() - self.plain_mult_cost() - self.cipher_mult_cost()
            < SHALLOW_MARGIN_BITS
    }

    /// Checks every parameter and resolves the coefficient modulus.
    pub fn validate(&self) -> Result<u64> {
        let d = self.ring_degree;
        if !SUPPORTED_DEGREES.contains(&d) {
            return Err(PirError::config(format!(
                "unsupported ring degree {} (expected one of {:?})",
                d, SUPPORTED_DEGREES
            )));
        }

        let bits = self.coeff_modulus_bits();
        if bits > MAX_COEFF_MODULUS_BITS {
            return Err(PirError::config(format!(
                "coefficient modulus has {} bits, at most {} are supported",
                bits, MAX_COEFF_MODULUS_BITS
            )));
        }
        if bits > security_bound_bits(d) {
            return Err(PirError::config(format!(
                "coefficient modulus of {} bits is insecure for degree {}",
                bits, d
            )));
        }

        let q = match self.coeff_modulus {
            CoeffModulus::Default | CoeffModulus::Bits(_) => {
                if bits < 2 {
                    return Err(PirError::config("coefficient modulus too small"));
                }
                find_ntt_prime(bits, d).ok_or_else(|| {
                    PirError::config(format!("no {}-bit NTT prime for degree {}", bits, d))
                })?
            }
            CoeffModulus::Value(q) => {
                if !is_prime(q) {
                    return Err(PirError::config(format!(
                        "coefficient modulus {} is not prime",
                        q
                    )));
                }
                if q % (2 * d as u64) != 1 {
                    return Err(PirError::config(format!(
                        "coefficient modulus {} is not 1 mod {}",
                        q,
                        2 * d
                    )));
                }
                q
            }
        };

        let t = self.plaintext_modulus;
        if t < 2 || t >= q {
            return Err(PirError::config(format!(
                "plaintext modulus {} must be in [2, {})",
                t, q
            )));
        }
        if self.noise_width_millionths == 0 {
            return Err(PirError::config("noise width must be positive"));
        }
        if !(1..=30).contains(&self.relin_base_log) {
            return Err(PirError::config(format!(
                "relinearization base 2^{} outside 2^1..=2^30",
                self.relin_base_log
            )));
        }
        if self.fresh_noise_budget() <= 0 {
            return Err(PirError::config(format!(
                "plaintext modulus {} leaves no noise budget under a {}-bit coefficient modulus",
                t, bits
            )));
        }
        Ok(q)
    }
}

impl Default for ParameterProfile {
    fn default() -> Self {
        Self::DEFAULT_2048
    }
}

/// Builds a scheme context for `ring_degree` and `plaintext_modulus`, with the default
/// coefficient modulus for the degree.
pub fn configure(ring_degree: usize, plaintext_modulus: u64) -> Result<BfvContext> {
    BfvContext::new(ParameterProfile::new(ring_degree, plaintext_modulus))
}
