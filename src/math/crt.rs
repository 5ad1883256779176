//! Exact integer negacyclic products through two auxiliary NTT primes and CRT reconstruction.

use crate::math::modulus::Modulus;
use crate::math::ntt::NttTable;
use crate::math::number_theory::{find_ntt_prime, find_ntt_prime_below};

/// Bit width of each auxiliary prime. The product of both is above `2^120`, which bounds the
/// magnitude of any coefficient this type can reconstruct.
pub const AUX_PRIME_BITS: u32 = 61;

/// Largest total bit width `bits(a) + bits(b) + log2(d)` of an exact product coefficient.
pub const MAX_PRODUCT_BITS: u32 = 2 * AUX_PRIME_BITS - 2;

#[derive(Debug, Clone)]
pub struct CrtMultiplier {
    ntt1: NttTable,
    ntt2: NttTable,
    p1_inv_mod_p2: u64,
}

impl CrtMultiplier {
    pub fn new(degree: usize) -> Option<Self> {
        let p1 = find_ntt_prime(AUX_PRIME_BITS, degree)?;
        let p2 = find_ntt_prime_below(p1, degree)?;
        let m1 = Modulus::new(p1)?;
        let m2 = Modulus::new(p2)?;
        Some(Self {
            ntt1: NttTable::new(degree, m1)?,
            ntt2: NttTable::new(degree, m2)?,
            p1_inv_mod_p2: m2.inv(m2.reduce(p1)),
        })
    }

    pub fn degree(&self) -> usize {
        self.ntt1.degree()
    }

    pub fn primes(&self) -> (u64, u64) {
        (self.ntt1.modulus().value(), self.ntt2.modulus().value())
    }

    /// Computes `a * b` in `Z[x]/(x^d + 1)` exactly, for centred inputs whose product coefficients
    /// stay below `2^MAX_PRODUCT_BITS` in magnitude.
    pub fn multiply(&self, a: &[i64], b: &[i64]) -> Vec<i128> {
        let r1 = Self::multiply_mod(&self.ntt1, a, b);
        let r2 = Self::multiply_mod(&self.ntt2, a, b);
        r1.into_iter()
            .zip(r2)
            .map(|(x1, x2)| self.reconstruct(x1, x2))
            .collect()
    }

    fn multiply_mod(ntt: &NttTable, a: &[i64], b: &[i64]) -> Vec<u64> {
        let m = ntt.modulus();
        let mut a_ntt: Vec<u64> = a.iter().map(|x| m.reduce_i64(*x)).collect();
        let mut b_ntt: Vec<u64> = b.iter().map(|x| m.reduce_i64(*x)).collect();
        ntt.forward(&mut a_ntt);
        ntt.forward(&mut b_ntt);
        for (x, y) in a_ntt.iter_mut().zip(b_ntt.iter()) {
            *x = m.mul(*x, *y);
        }
        ntt.backward(&mut a_ntt);
        a_ntt
    }

    /// Combines residues into the centred representative modulo `p1 * p2`.
    fn reconstruct(&self, x1: u64, x2: u64) -> i128 {
        let (p1, p2) = self.primes();
        let m2 = self.ntt2.modulus();
        let k = m2.mul(m2.sub(x2, m2.reduce(x1)), self.p1_inv_mod_p2);
        let big = p1 as u128 * p2 as u128;
        let x = x1 as u128 + p1 as u128 * k as u128;
        if x > big / 2 {
            x as i128 - big as i128
        } else {
            x as i128
        }
    }
}
