//! Gadget vector and gadget inverse (signed base-`2^k` decomposition).

use crate::math::modulus::Modulus;
use crate::math::utils::ceil_log;

/// Parameters of the gadget `g = (1, B, B^2, ..., B^(len-1))` for `B = 2^base_log`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Gadget {
    base_log: u32,
    len: usize,
    modulus: Modulus,
}

impl Gadget {
    pub fn new(base_log: u32, modulus: Modulus) -> Self {
        assert!((1..=30).contains(&base_log));
        let len = ceil_log(1 << base_log, modulus.value());
        Self {
            base_log,
            len,
            modulus,
        }
    }

    pub fn base(&self) -> u64 {
        1 << self.base_log
    }

    pub fn base_log(&self) -> u32 {
        self.base_log
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// The entries of the gadget vector, reduced mod `q`.
    pub fn powers(&self) -> Vec<u64> {
        let mut x = 1_u64;
        let mut powers = Vec::with_capacity(self.len);
        for _ in 0..self.len {
            powers.push(x);
            x = self.modulus.mul(x, self.base());
        }
        powers
    }

    /// Signed digits `d_i` of `a` with `sum d_i B^i = a mod q` and `|d_i| <= B/2`, each returned as
    /// an element of `Z_q`.
    pub fn decompose(&self, a: u64) -> Decomposition {
        Decomposition::new(a, self)
    }

    fn max_positive(&self) -> u128 {
        // Wrap if > threshold
        let threshold = (self.base() / 2) as u128;
        let mut sum = 0_u128;
        for _ in 0..self.len {
            sum *= self.base() as u128;
            sum += threshold;
        }
        sum
    }
}

pub struct Decomposition {
    a: u64,
    negate_all: bool,
    k: usize,
    len: usize,
    base: u64,
    modulus: Modulus,
}

impl Decomposition {
    fn new(a: u64, gadget: &Gadget) -> Self {
        let mut a = gadget.modulus.reduce(a);
        let negate_all = a as u128 > gadget.max_positive();
        if negate_all {
            a = gadget.modulus.neg(a);
        }
        Self {
            a,
            negate_all,
            k: 0,
            len: gadget.len,
            base: gadget.base(),
            modulus: gadget.modulus,
        }
    }
}

impl Iterator for Decomposition {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.k == self.len {
            return None;
        }

        let mut reduced = self.a % self.base;
        self.a /= self.base;
        if reduced > self.base / 2 {
            self.a += 1;
            reduced = self.modulus.neg(self.base - reduced);
        }
        if self.negate_all {
            reduced = self.modulus.neg(reduced);
        }
        self.k += 1;
        Some(reduced)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len - self.k, Some(self.len - self.k))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn recompose(gadget: &Gadget, digits: &[u64]) -> u64 {
        let q = gadget.modulus;
        digits
            .iter()
            .zip(gadget.powers())
            .fold(0, |acc, (d, p)| q.add(acc, q.mul(*d, p)))
    }

    #[test]
    fn gadget_inverse_is_correct() {
        let q = Modulus::new(11).unwrap();
        let gadget = Gadget::new(1, q);
        assert_eq!(gadget.len(), 4);
        assert_eq!(gadget.powers(), vec![1, 2, 4, 8]);
        for a in 0..11 {
            let digits: Vec<u64> = gadget.decompose(a).collect();
            assert_eq!(digits.len(), 4);
            assert_eq!(recompose(&gadget, &digits), a, "failed for {}", a);
        }
    }

    #[test]
    fn digits_are_small() {
        let q = Modulus::new(0x3fffffff000001).unwrap();
        let gadget = Gadget::new(18, q);
        assert_eq!(gadget.len(), 3);
        let half = gadget.base() / 2;
        for a in [0, 1, q.value() / 2, q.value() / 2 + 1, q.value() - 1, 123456789012345] {
            let digits: Vec<u64> = gadget.decompose(a).collect();
            assert!(digits.iter().all(|d| q.norm(*d) <= half));
            assert_eq!(recompose(&gadget, &digits), a);
        }
    }
}
