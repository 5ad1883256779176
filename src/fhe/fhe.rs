//! Capability surface of a leveled homomorphic encryption scheme.
//!
//! Schemes carry their parameters at runtime, so every operation takes `&self`. All randomness
//! comes from a caller-supplied RNG.
use crate::error::Result;
use crate::params::ParameterProfile;
use rand::Rng;

pub trait EncryptionScheme {
    type Plaintext: Clone;
    type Ciphertext: Clone;
    type SecretKey;

    fn keygen<R: Rng>(&self, rng: &mut R) -> Self::SecretKey;

    /// Encodes an integer in `[0, t)` as a plaintext.
    fn encode(&self, value: u64) -> Self::Plaintext;

    /// Inverse of `encode`.
    fn decode(&self, pt: &Self::Plaintext) -> u64;

    /// Symmetric-key encryption. Every call draws fresh randomness.
    fn encrypt_sk<R: Rng>(
        &self,
        sk: &Self::SecretKey,
        mu: &Self::Plaintext,
        rng: &mut R,
    ) -> Self::Ciphertext;

    fn decrypt(&self, sk: &Self::SecretKey, ct: &Self::Ciphertext) -> Self::Plaintext;
}

pub trait AddHomEncryptionScheme: EncryptionScheme {
    fn add_hom(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Self::Ciphertext;
}

pub trait AddScalarEncryptionScheme: EncryptionScheme {
    fn add_scalar(&self, lhs: &Self::Ciphertext, rhs: &Self::Plaintext) -> Self::Ciphertext;
}

/// Ciphertext-plaintext multiplication. Does not change the ciphertext size.
pub trait MulScalarEncryptionScheme: EncryptionScheme {
    fn mul_scalar(&self, lhs: &Self::Ciphertext, rhs: &Self::Plaintext) -> Self::Ciphertext;
}

/// Ciphertext-ciphertext multiplication. The result has size `size(lhs) + size(rhs) - 1`.
pub trait MulHomEncryptionScheme: EncryptionScheme {
    fn mul_hom(&self, lhs: &Self::Ciphertext, rhs: &Self::Ciphertext) -> Self::Ciphertext;
}

pub trait RelinEncryptionScheme: EncryptionScheme {
    type RelinKey;

    fn relin_keygen<R: Rng>(&self, sk: &Self::SecretKey, rng: &mut R) -> Self::RelinKey;

    /// Brings a size-3 ciphertext back to size 2 without changing its decryption. Smaller
    /// ciphertexts are returned unchanged; larger ones are rejected.
    fn relinearize(
        &self,
        ct: &Self::Ciphertext,
        rk: &Self::RelinKey,
    ) -> Result<Self::Ciphertext>;
}

pub trait NoiseMeasurable: EncryptionScheme {
    /// Number of ring elements in the ciphertext; 2 when fresh.
    fn size(&self, ct: &Self::Ciphertext) -> usize;

    /// Remaining invariant noise budget in bits. Zero means decryption is no longer reliable.
    fn noise_budget_bits(&self, sk: &Self::SecretKey, ct: &Self::Ciphertext) -> u32;
}

/// Everything the retrieval engines need from a scheme.
pub trait FHEScheme:
    AddHomEncryptionScheme
    + AddScalarEncryptionScheme
    + MulScalarEncryptionScheme
    + MulHomEncryptionScheme
    + RelinEncryptionScheme
    + NoiseMeasurable
{
    fn profile(&self) -> &ParameterProfile;

    /// The plaintext modulus `t`.
    fn plaintext_modulus(&self) -> u64 {
        self.profile().plaintext_modulus
    }
}
