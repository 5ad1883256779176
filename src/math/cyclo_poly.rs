//! The cyclotomic ring `Z_q[x]/(x^d + 1)`. `d` is assumed to be a power of `2`.

use crate::math::discrete_gaussian::DiscreteGaussian;
use crate::math::modulus::Modulus;
use crate::math::ntt::NttTable;
use rand::Rng;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::sync::Arc;

/// Shared description of a ring: degree, modulus and the NTT tables used for multiplication.
#[derive(Debug)]
pub struct CycloRing {
    degree: usize,
    modulus: Modulus,
    ntt: NttTable,
}

impl CycloRing {
    /// Returns `None` if `modulus` does not support a negacyclic NTT of length `degree`.
    pub fn new(degree: usize, modulus: Modulus) -> Option<Arc<Self>> {
        let ntt = NttTable::new(degree, modulus)?;
        Some(Arc::new(Self {
            degree,
            modulus,
            ntt,
        }))
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }
}

/// The raw (coefficient) representation of an element of a cyclotomic ring.
///
/// Internally, this is a vector of coefficients where the `i`th index corresponds to `x^i`.
#[derive(Clone)]
pub struct CycloPoly {
    ring: Arc<CycloRing>,
    coeff: Vec<u64>,
}

impl CycloPoly {
    pub fn zero(ring: &Arc<CycloRing>) -> Self {
        Self {
            ring: ring.clone(),
            coeff: vec![0; ring.degree],
        }
    }

    pub fn constant(ring: &Arc<CycloRing>, a: u64) -> Self {
        let mut result = Self::zero(ring);
        result.coeff[0] = ring.modulus.reduce(a);
        result
    }

    /// Builds an element from at most `d` coefficients, reducing each mod `q`.
    pub fn from_coeffs(ring: &Arc<CycloRing>, coeff: &[u64]) -> Self {
        assert!(coeff.len() <= ring.degree);
        let mut result = Self::zero(ring);
        for (r, c) in result.coeff.iter_mut().zip(coeff) {
            *r = ring.modulus.reduce(*c);
        }
        result
    }

    pub fn from_signed(ring: &Arc<CycloRing>, coeff: &[i64]) -> Self {
        assert!(coeff.len() <= ring.degree);
        let mut result = Self::zero(ring);
        for (r, c) in result.coeff.iter_mut().zip(coeff) {
            *r = ring.modulus.reduce_i64(*c);
        }
        result
    }

    pub fn ring(&self) -> &Arc<CycloRing> {
        &self.ring
    }

    pub fn coeff(&self) -> &[u64] {
        &self.coeff
    }

    pub fn coeff_mut(&mut self) -> &mut [u64] {
        &mut self.coeff
    }

    pub fn is_zero(&self) -> bool {
        self.coeff.iter().all(|c| *c == 0)
    }

    /// Coefficients as centred representatives in `(-q/2, q/2]`.
    pub fn centred(&self) -> Vec<i64> {
        self.coeff.iter().map(|c| self.ring.modulus.center(*c)).collect()
    }

    /// Infinity norm of the centred representative.
    pub fn norm(&self) -> u64 {
        self.coeff
            .iter()
            .map(|c| self.ring.modulus.norm(*c))
            .max()
            .unwrap_or(0)
    }

    pub fn mul_scalar(&self, a: u64) -> Self {
        let q = &self.ring.modulus;
        let a = q.reduce(a);
        Self {
            ring: self.ring.clone(),
            coeff: self.coeff.iter().map(|c| q.mul(*c, a)).collect(),
        }
    }

    pub fn rand_uniform<T: Rng>(ring: &Arc<CycloRing>, rng: &mut T) -> Self {
        let q = ring.modulus.value();
        Self {
            ring: ring.clone(),
            coeff: (0..ring.degree).map(|_| rng.gen_range(0..q)).collect(),
        }
    }

    /// Coefficients uniform in `{-1, 0, 1}`.
    pub fn rand_ternary<T: Rng>(ring: &Arc<CycloRing>, rng: &mut T) -> Self {
        let q = &ring.modulus;
        Self {
            ring: ring.clone(),
            coeff: (0..ring.degree)
                .map(|_| q.reduce_i64(rng.gen_range(-1..=1)))
                .collect(),
        }
    }

    pub fn rand_discrete_gaussian<T: Rng>(
        ring: &Arc<CycloRing>,
        noise_width_millionths: u64,
        rng: &mut T,
    ) -> Self {
        let q = &ring.modulus;
        Self {
            ring: ring.clone(),
            coeff: (0..ring.degree)
                .map(|_| q.reduce_i64(DiscreteGaussian::sample(noise_width_millionths, rng)))
                .collect(),
        }
    }

    fn check_compatible(&self, other: &Self) {
        assert!(
            Arc::ptr_eq(&self.ring, &other.ring)
                || (self.ring.degree == other.ring.degree
                    && self.ring.modulus == other.ring.modulus),
            "ring elements from different rings"
        );
    }
}

impl PartialEq for CycloPoly {
    fn eq(&self, other: &Self) -> bool {
        self.ring.modulus == other.ring.modulus && self.coeff == other.coeff
    }
}

impl Eq for CycloPoly {}

impl fmt::Debug for CycloPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 4;
        write!(
            f,
            "CycloPoly(d={}, q={}, [",
            self.ring.degree,
            self.ring.modulus.value()
        )?;
        for (i, c) in self.coeff.iter().take(SHOWN).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        if self.coeff.len() > SHOWN {
            write!(f, ", ...")?;
        }
        write!(f, "])")
    }
}

/// Math operations on borrows `&CycloPoly`, potentially creating new values

impl<'a> Add for &'a CycloPoly {
    type Output = CycloPoly;

    fn add(self, rhs: Self) -> Self::Output {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

impl<'a> Sub for &'a CycloPoly {
    type Output = CycloPoly;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut result = self.clone();
        result -= rhs;
        result
    }
}

impl<'a> Neg for &'a CycloPoly {
    type Output = CycloPoly;

    fn neg(self) -> Self::Output {
        let q = &self.ring.modulus;
        CycloPoly {
            ring: self.ring.clone(),
            coeff: self.coeff.iter().map(|c| q.neg(*c)).collect(),
        }
    }
}

impl<'a> Mul for &'a CycloPoly {
    type Output = CycloPoly;

    fn mul(self, rhs: Self) -> Self::Output {
        self.check_compatible(rhs);
        let ntt = &self.ring.ntt;
        let q = &self.ring.modulus;
        let mut lhs_eval = self.coeff.clone();
        let mut rhs_eval = rhs.coeff.clone();
        ntt.forward(&mut lhs_eval);
        ntt.forward(&mut rhs_eval);
        for (x, y) in lhs_eval.iter_mut().zip(rhs_eval.iter()) {
            *x = q.mul(*x, *y);
        }
        ntt.backward(&mut lhs_eval);
        CycloPoly {
            ring: self.ring.clone(),
            coeff: lhs_eval,
        }
    }
}

/// Math operations on owned `CycloPoly`

impl<'a> AddAssign<&'a CycloPoly> for CycloPoly {
    fn add_assign(&mut self, rhs: &'a CycloPoly) {
        self.check_compatible(rhs);
        let q = self.ring.modulus;
        for (x, y) in self.coeff.iter_mut().zip(rhs.coeff.iter()) {
            *x = q.add(*x, *y);
        }
    }
}

impl<'a> SubAssign<&'a CycloPoly> for CycloPoly {
    fn sub_assign(&mut self, rhs: &'a CycloPoly) {
        self.check_compatible(rhs);
        let q = self.ring.modulus;
        for (x, y) in self.coeff.iter_mut().zip(rhs.coeff.iter()) {
            *x = q.sub(*x, *y);
        }
    }
}
