//! Arithmetic modulo a runtime prime `q < 2^62`.

use crate::math::number_theory::mod_pow;
use crate::math::utils::bit_count;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Modulus {
    value: u64,
}

impl Modulus {
    pub const MAX_BITS: u32 = 62;

    /// Returns `None` when `value` is smaller than 2 or too wide for lazy additions.
    pub fn new(value: u64) -> Option<Self> {
        (value >= 2 && bit_count(value as u128) <= Self::MAX_BITS).then_some(Self { value })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn bits(&self) -> u32 {
        bit_count(self.value as u128)
    }

    pub fn reduce(&self, a: u64) -> u64 {
        a % self.value
    }

    pub fn reduce_u128(&self, a: u128) -> u64 {
        (a % self.value as u128) as u64
    }

    pub fn reduce_i64(&self, a: i64) -> u64 {
        a.rem_euclid(self.value as i64) as u64
    }

    pub fn reduce_i128(&self, a: i128) -> u64 {
        a.rem_euclid(self.value as i128) as u64
    }

    pub fn add(&self, a: u64, b: u64) -> u64 {
        let sum = a + b;
        if sum >= self.value {
            sum - self.value
        } else {
            sum
        }
    }

    pub fn sub(&self, a: u64, b: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            a + self.value - b
        }
    }

    pub fn neg(&self, a: u64) -> u64 {
        if a == 0 {
            0
        } else {
            self.value - a
        }
    }

    pub fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.value as u128) as u64
    }

    pub fn pow(&self, a: u64, e: u64) -> u64 {
        mod_pow(a, e, self.value)
    }

    /// Inverse via Fermat's little theorem; only meaningful for prime moduli and `a != 0`.
    pub fn inv(&self, a: u64) -> u64 {
        self.pow(a, self.value - 2)
    }

    /// Centred representative in `(-q/2, q/2]`.
    pub fn center(&self, a: u64) -> i64 {
        if a > self.value / 2 {
            a as i64 - self.value as i64
        } else {
            a as i64
        }
    }

    /// Absolute value of the centred representative.
    pub fn norm(&self, a: u64) -> u64 {
        a.min(self.value - a)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rejects_bad_values() {
        assert!(Modulus::new(0).is_none());
        assert!(Modulus::new(1).is_none());
        assert!(Modulus::new(1 << 62).is_none());
        assert!(Modulus::new((1 << 62) - 1).is_some());
    }

    #[test]
    fn test_ops() {
        let q = Modulus::new(17).unwrap();
        assert_eq!(q.add(9, 9), 1);
        assert_eq!(q.sub(3, 5), 15);
        assert_eq!(q.neg(0), 0);
        assert_eq!(q.neg(1), 16);
        assert_eq!(q.mul(16, 16), 1);
        assert_eq!(q.mul(q.inv(5), 5), 1);
        assert_eq!(q.reduce_i64(-1), 16);
        assert_eq!(q.reduce_i128(-35), 16);
        assert_eq!(q.center(8), 8);
        assert_eq!(q.center(9), -8);
        assert_eq!(q.norm(16), 1);
    }

    #[test]
    fn test_wide_modulus() {
        let q = Modulus::new(0x3fffffff000001).unwrap();
        assert_eq!(q.bits(), 54);
        let a = q.value() - 1;
        assert_eq!(q.mul(a, a), 1);
        assert_eq!(q.center(a), -1);
    }
}
