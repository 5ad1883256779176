//! Symmetric-key BFV over `R_q = Z_q[x]/(x^d + 1)` with plaintext space `R_t`.
//!
//! Ciphertexts are vectors `(c_0, ..., c_{k-1})` decrypting via `w = sum c_i s^i`. Fresh and
//! relinearized ciphertexts have size 2; each ciphertext-ciphertext product grows the size.

use crate::error::{PirError, Result};
use crate::fhe::fhe::*;
use crate::math::crt::CrtMultiplier;
use crate::math::cyclo_poly::{CycloPoly, CycloRing};
use crate::math::gadget::Gadget;
use crate::math::modulus::Modulus;
use crate::math::utils::bit_count;
use crate::params::ParameterProfile;
use itertools::Itertools;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

pub struct BfvContext {
    profile: ParameterProfile,
    ring: Arc<CycloRing>,
    plain_modulus: u64,
    delta: u64,
    crt: CrtMultiplier,
    gadget: Gadget,
}

/// A polynomial mod `t`, stored without trailing zero coefficients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plaintext {
    coeff: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext {
    polys: Vec<CycloPoly>,
}

pub struct SecretKey {
    s: CycloPoly,
}

/// Key-switching key from `s^2` to `s`, one pair per gadget digit.
pub struct RelinKey {
    keys: Vec<(CycloPoly, CycloPoly)>,
}

impl Plaintext {
    pub fn new(mut coeff: Vec<u64>) -> Self {
        while coeff.last() == Some(&0) {
            coeff.pop();
        }
        Self { coeff }
    }

    pub fn coeff(&self) -> &[u64] {
        &self.coeff
    }

    pub fn is_constant(&self) -> bool {
        self.coeff.len() <= 1
    }

    pub fn constant_term(&self) -> u64 {
        self.coeff.first().copied().unwrap_or(0)
    }
}

impl Ciphertext {
    pub fn polys(&self) -> &[CycloPoly] {
        &self.polys
    }

    /// Size of the ciphertext in bytes, with each coefficient packed into `ceil(log2 q / 8)` bytes.
    pub fn byte_len(&self) -> usize {
        self.polys
            .first()
            .map(|p| {
                let coeff_bytes = (p.ring().modulus().bits() as usize + 7) / 8;
                self.polys.len() * p.ring().degree() * coeff_bytes
            })
            .unwrap_or(0)
    }
}

impl fmt::Debug for BfvContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BfvContext")
            .field("ring_degree", &self.ring.degree())
            .field("coeff_modulus", &self.ring.modulus().value())
            .field("plain_modulus", &self.plain_modulus)
            .field("relin_base_log", &self.gadget.base_log())
            .finish()
    }
}

impl BfvContext {
    pub fn new(profile: ParameterProfile) -> Result<Self> {
        let q = profile.validate()?;
        let modulus = Modulus::new(q)
            .ok_or_else(|| PirError::config(format!("coefficient modulus {} too wide", q)))?;
        let ring = CycloRing::new(profile.ring_degree, modulus).ok_or_else(|| {
            PirError::config(format!(
                "coefficient modulus {} does not support an NTT of length {}",
                q, profile.ring_degree
            ))
        })?;
        let crt = CrtMultiplier::new(profile.ring_degree).ok_or_else(|| {
            PirError::config(format!(
                "no auxiliary NTT primes for degree {}",
                profile.ring_degree
            ))
        })?;
        let gadget = Gadget::new(profile.relin_base_log, modulus);
        let plain_modulus = profile.plaintext_modulus;

        Ok(Self {
            profile,
            ring,
            plain_modulus,
            delta: q / plain_modulus,
            crt,
            gadget,
        })
    }

    pub fn ring_degree(&self) -> usize {
        self.ring.degree()
    }

    pub fn coeff_modulus(&self) -> u64 {
        self.ring.modulus().value()
    }

    pub fn delta(&self) -> u64 {
        self.delta
    }

    /// `delta * m` as an element of `R_q`.
    fn scale_plaintext(&self, pt: &Plaintext) -> CycloPoly {
        let q = self.ring.modulus();
        let mut result = CycloPoly::zero(&self.ring);
        for (r, m) in result.coeff_mut().iter_mut().zip(pt.coeff.iter()) {
            *r = q.mul(self.delta, *m);
        }
        result
    }

    /// Centred lift of `m` from `Z_t` to `Z`, in `(-t/2, t/2]`.
    fn lift_centred(&self, m: u64) -> i64 {
        let m = m % self.plain_modulus;
        if m > self.plain_modulus / 2 {
            m as i64 - self.plain_modulus as i64
        } else {
            m as i64
        }
    }

    /// Computes `w = sum c_i s^i` in `R_q`.
    fn inner_product(&self, sk: &SecretKey, ct: &Ciphertext) -> CycloPoly {
        let mut polys = ct.polys.iter();
        let mut w = match polys.next() {
            Some(c0) => c0.clone(),
            None => return CycloPoly::zero(&self.ring),
        };
        let mut s_pow = sk.s.clone();
        for (i, c) in polys.enumerate() {
            if i > 0 {
                s_pow = &s_pow * &sk.s;
            }
            w += &(c * &s_pow);
        }
        w
    }

    /// `round(t * x / q) mod q` for an exact integer `x`.
    fn scale_down(&self, x: i128) -> u64 {
        let q = self.ring.modulus();
        let q_i = q.value() as i128;
        let t = self.plain_modulus as u128;
        let hi = x.div_euclid(q_i);
        let lo = x.rem_euclid(q_i) as u128;
        let rounded = (t * lo + q.value() as u128 / 2) / q.value() as u128;
        q.reduce_i128(self.plain_modulus as i128 * hi + rounded as i128)
    }
}

impl EncryptionScheme for BfvContext {
    type Plaintext = Plaintext;
    type Ciphertext = Ciphertext;
    type SecretKey = SecretKey;

    fn keygen<R: Rng>(&self, rng: &mut R) -> SecretKey {
        SecretKey {
            s: CycloPoly::rand_ternary(&self.ring, rng),
        }
    }

    fn encode(&self, value: u64) -> Plaintext {
        Plaintext::new(vec![value % self.plain_modulus])
    }

    fn decode(&self, pt: &Plaintext) -> u64 {
        pt.constant_term()
    }

    fn encrypt_sk<R: Rng>(&self, sk: &SecretKey, mu: &Plaintext, rng: &mut R) -> Ciphertext {
        let a = CycloPoly::rand_uniform(&self.ring, rng);
        let e = CycloPoly::rand_discrete_gaussian(
            &self.ring,
            self.profile.noise_width_millionths,
            rng,
        );
        let mut c0 = -&(&(&a * &sk.s) + &e);
        c0 += &self.scale_plaintext(mu);
        Ciphertext {
            polys: vec![c0, a],
        }
    }

    fn decrypt(&self, sk: &SecretKey, ct: &Ciphertext) -> Plaintext {
        let w = self.inner_product(sk, ct);
        let q = self.ring.modulus().value() as u128;
        let t = self.plain_modulus as u128;
        Plaintext::new(
            w.coeff()
                .iter()
                .map(|x| (((t * *x as u128 + q / 2) / q) % t) as u64)
                .collect(),
        )
    }
}

impl AddHomEncryptionScheme for BfvContext {
    fn add_hom(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        let (long, short) = if lhs.polys.len() >= rhs.polys.len() {
            (lhs, rhs)
        } else {
            (rhs, lhs)
        };
        let mut polys = long.polys.clone();
        for (p, s) in polys.iter_mut().zip(short.polys.iter()) {
            *p += s;
        }
        Ciphertext { polys }
    }
}

impl AddScalarEncryptionScheme for BfvContext {
    fn add_scalar(&self, lhs: &Ciphertext, rhs: &Plaintext) -> Ciphertext {
        let mut result = lhs.clone();
        if let Some(c0) = result.polys.first_mut() {
            *c0 += &self.scale_plaintext(rhs);
        }
        result
    }
}

impl MulScalarEncryptionScheme for BfvContext {
    fn mul_scalar(&self, lhs: &Ciphertext, rhs: &Plaintext) -> Ciphertext {
        let q = self.ring.modulus();
        if rhs.is_constant() {
            let scalar = q.reduce_i64(self.lift_centred(rhs.constant_term()));
            return Ciphertext {
                polys: lhs.polys.iter().map(|p| p.mul_scalar(scalar)).collect(),
            };
        }
        let lifted = rhs.coeff.iter().map(|m| self.lift_centred(*m)).collect_vec();
        let m = CycloPoly::from_signed(&self.ring, &lifted);
        Ciphertext {
            polys: lhs.polys.iter().map(|p| p * &m).collect(),
        }
    }
}

impl MulHomEncryptionScheme for BfvContext {
    fn mul_hom(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        let d = self.ring.degree();
        let lhs_centred = lhs.polys.iter().map(|p| p.centred()).collect_vec();
        let rhs_centred = rhs.polys.iter().map(|p| p.centred()).collect_vec();
        let out_size = (lhs.polys.len() + rhs.polys.len()).saturating_sub(1);

        // Exact tensor product over the integers
        let mut tensor = vec![vec![0_i128; d]; out_size];
        for (i, a) in lhs_centred.iter().enumerate() {
            for (j, b) in rhs_centred.iter().enumerate() {
                let prod = self.crt.multiply(a, b);
                for (acc, x) in tensor[i + j].iter_mut().zip(prod) {
                    *acc += x;
                }
            }
        }

        let polys = tensor
            .iter()
            .map(|coeff| {
                let mut poly = CycloPoly::zero(&self.ring);
                for (r, x) in poly.coeff_mut().iter_mut().zip(coeff.iter()) {
                    *r = self.scale_down(*x);
                }
                poly
            })
            .collect();
        Ciphertext { polys }
    }
}

impl RelinEncryptionScheme for BfvContext {
    type RelinKey = RelinKey;

    fn relin_keygen<R: Rng>(&self, sk: &SecretKey, rng: &mut R) -> RelinKey {
        let s_squared = &sk.s * &sk.s;
        let keys = self
            .gadget
            .powers()
            .into_iter()
            .map(|power| {
                let a = CycloPoly::rand_uniform(&self.ring, rng);
                let e = CycloPoly::rand_discrete_gaussian(
                    &self.ring,
                    self.profile.noise_width_millionths,
                    rng,
                );
                let mut b = -&(&(&a * &sk.s) + &e);
                b += &s_squared.mul_scalar(power);
                (b, a)
            })
            .collect();
        RelinKey { keys }
    }

    fn relinearize(&self, ct: &Ciphertext, rk: &RelinKey) -> Result<Ciphertext> {
        match ct.polys.len() {
            0..=2 => Ok(ct.clone()),
            3 => {
                let len = self.gadget.len();
                let mut digits = vec![CycloPoly::zero(&self.ring); len];
                for (k, c) in ct.polys[2].coeff().iter().enumerate() {
                    for (i, digit) in self.gadget.decompose(*c).enumerate() {
                        digits[i].coeff_mut()[k] = digit;
                    }
                }

                let mut c0 = ct.polys[0].clone();
                let mut c1 = ct.polys[1].clone();
                for (digit, (b, a)) in digits.iter().zip(rk.keys.iter()) {
                    c0 += &(digit * b);
                    c1 += &(digit * a);
                }
                Ok(Ciphertext {
                    polys: vec![c0, c1],
                })
            }
            size => Err(PirError::Engine(format!(
                "cannot relinearize a ciphertext of size {}",
                size
            ))),
        }
    }
}

impl NoiseMeasurable for BfvContext {
    fn size(&self, ct: &Ciphertext) -> usize {
        ct.polys.len()
    }

    fn noise_budget_bits(&self, sk: &SecretKey, ct: &Ciphertext) -> u32 {
        let q = self.ring.modulus();
        let w = self.inner_product(sk, ct);
        let noise = w
            .coeff()
            .iter()
            .map(|x| q.norm(q.mul(self.plain_modulus % q.value(), *x)))
            .max()
            .unwrap_or(0);
        q.bits()
            .saturating_sub(bit_count(noise as u128))
            .saturating_sub(1)
    }
}

impl FHEScheme for BfvContext {
    fn profile(&self) -> &ParameterProfile {
        &self.profile
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::ParameterProfile;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup() -> (BfvContext, SecretKey, ChaCha20Rng) {
        let ctx = BfvContext::new(ParameterProfile::ORIGINAL).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let sk = ctx.keygen(&mut rng);
        (ctx, sk, rng)
    }

    #[test]
    fn test_encrypt_decrypt() {
        let (ctx, sk, mut rng) = setup();
        for m in [0, 1, 2, 511, 512, 1023] {
            let ct = ctx.encrypt_sk(&sk, &ctx.encode(m), &mut rng);
            assert_eq!(ctx.size(&ct), 2);
            assert_eq!(ctx.decode(&ctx.decrypt(&sk, &ct)), m);
        }
    }

    #[test]
    fn test_encryptions_are_randomized() {
        let (ctx, sk, mut rng) = setup();
        let one = ctx.encode(1);
        let ct1 = ctx.encrypt_sk(&sk, &one, &mut rng);
        let ct2 = ctx.encrypt_sk(&sk, &one, &mut rng);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_homomorphic_ops() {
        let (ctx, sk, mut rng) = setup();
        let a = ctx.encrypt_sk(&sk, &ctx.encode(700), &mut rng);
        let b = ctx.encrypt_sk(&sk, &ctx.encode(500), &mut rng);

        let sum = ctx.add_hom(&a, &b);
        assert_eq!(ctx.decode(&ctx.decrypt(&sk, &sum)), (700 + 500) % 1024);

        let plus = ctx.add_scalar(&a, &ctx.encode(30));
        assert_eq!(ctx.decode(&ctx.decrypt(&sk, &plus)), 730);

        let scaled = ctx.mul_scalar(&a, &ctx.encode(3));
        assert_eq!(ctx.size(&scaled), 2);
        assert_eq!(ctx.decode(&ctx.decrypt(&sk, &scaled)), (700 * 3) % 1024);

        let prod = ctx.mul_hom(&a, &b);
        assert_eq!(ctx.size(&prod), 3);
        assert_eq!(ctx.decode(&ctx.decrypt(&sk, &prod)), (700 * 500) % 1024);
    }

    #[test]
    fn test_polynomial_plaintexts() {
        // (1 + x) * (1 + x) = 1 + 2x + x^2
        let (ctx, sk, mut rng) = setup();
        let pt = Plaintext::new(vec![1, 1]);
        let ct = ctx.encrypt_sk(&sk, &pt, &mut rng);
        let sq = ctx.mul_hom(&ct, &ct);
        assert_eq!(ctx.decrypt(&sk, &sq).coeff(), &[1, 2, 1]);
        let by_plain = ctx.mul_scalar(&ct, &pt);
        assert_eq!(ctx.decrypt(&sk, &by_plain).coeff(), &[1, 2, 1]);
    }

    #[test]
    fn test_relinearize() {
        let (ctx, sk, mut rng) = setup();
        let rk = ctx.relin_keygen(&sk, &mut rng);
        let a = ctx.encrypt_sk(&sk, &ctx.encode(12), &mut rng);
        let b = ctx.encrypt_sk(&sk, &ctx.encode(34), &mut rng);
        let prod = ctx.mul_hom(&a, &b);
        let relin = ctx.relinearize(&prod, &rk).unwrap();
        assert_eq!(ctx.size(&relin), 2);
        assert_eq!(
            ctx.decrypt(&sk, &relin),
            ctx.decrypt(&sk, &prod),
            "relinearization changed the value"
        );
        assert_eq!(ctx.decode(&ctx.decrypt(&sk, &relin)), 12 * 34 % 1024);

        // size 2 is a no-op
        assert_eq!(ctx.relinearize(&a, &rk).unwrap(), a);

        // size 4 is rejected
        let cubed = ctx.mul_hom(&prod, &a);
        assert_eq!(ctx.size(&cubed), 4);
        assert!(matches!(
            ctx.relinearize(&cubed, &rk),
            Err(PirError::Engine(_))
        ));
    }

    #[test]
    fn test_noise_budget_decreases() {
        let (ctx, sk, mut rng) = setup();
        let a = ctx.encrypt_sk(&sk, &ctx.encode(5), &mut rng);
        let b = ctx.encrypt_sk(&sk, &ctx.encode(7), &mut rng);
        let fresh = ctx.noise_budget_bits(&sk, &a);
        assert!(fresh > 30, "fresh budget {}", fresh);

        let scaled = ctx.mul_scalar(&a, &ctx.encode(300));
        let after_plain = ctx.noise_budget_bits(&sk, &scaled);
        assert!(after_plain < fresh);

        let prod = ctx.mul_hom(&scaled, &b);
        let after_mult = ctx.noise_budget_bits(&sk, &prod);
        assert!(after_mult < after_plain);
        assert!(fresh - after_plain <= after_plain - after_mult);
        assert!(after_mult > 0);
    }
}
