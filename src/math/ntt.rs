//! Negacyclic number-theoretic transform over `Z_q[x]/(x^d + 1)` with runtime tables.

use crate::math::modulus::Modulus;
use crate::math::number_theory::find_sqrt_primitive_root;
use crate::math::utils::{floor_log, reverse_bits};

/// Lookup table for NTT-related operations
#[derive(Debug, Clone)]
pub struct NttTable {
    degree: usize,
    log_degree: usize,
    modulus: Modulus,
    root_powers: Vec<u64>,
    inv_root_powers: Vec<u64>,
    sqrt_root_powers: Vec<u64>,
    inv_sqrt_root_powers: Vec<u64>,
    inv_degree: u64,
}

fn power_table(modulus: &Modulus, root: u64, len: usize) -> Vec<u64> {
    let mut table = Vec::with_capacity(len);
    let mut cur = 1_u64;
    for _ in 0..len {
        table.push(cur);
        cur = modulus.mul(cur, root);
    }
    table
}

impl NttTable {
    /// Builds the tables for a power-of-two `degree`. Returns `None` if `modulus` has no
    /// primitive `2 * degree`-th root of unity.
    pub fn new(degree: usize, modulus: Modulus) -> Option<Self> {
        if degree < 2 || !degree.is_power_of_two() {
            return None;
        }
        let sqrt_root = find_sqrt_primitive_root(degree, modulus.value())?;
        let inv_sqrt_root = modulus.inv(sqrt_root);
        let root = modulus.mul(sqrt_root, sqrt_root);
        let inv_root = modulus.mul(inv_sqrt_root, inv_sqrt_root);

        Some(Self {
            degree,
            log_degree: floor_log(2, degree as u64),
            modulus,
            root_powers: power_table(&modulus, root, degree),
            inv_root_powers: power_table(&modulus, inv_root, degree),
            sqrt_root_powers: power_table(&modulus, sqrt_root, degree),
            inv_sqrt_root_powers: power_table(&modulus, inv_sqrt_root, degree),
            inv_degree: modulus.inv(degree as u64),
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn modulus(&self) -> &Modulus {
        &self.modulus
    }

    pub fn forward(&self, values: &mut [u64]) {
        assert_eq!(values.len(), self.degree);
        // Preprocess
        for (value, sqrt_root_power) in values.iter_mut().zip(self.sqrt_root_powers.iter()) {
            *value = self.modulus.mul(*value, *sqrt_root_power);
        }

        self.transform(values, &self.root_powers);
    }

    pub fn backward(&self, values: &mut [u64]) {
        assert_eq!(values.len(), self.degree);
        self.transform(values, &self.inv_root_powers);

        // Postprocess
        for (value, inv_sqrt_root_power) in values.iter_mut().zip(self.inv_sqrt_root_powers.iter())
        {
            *value = self.modulus.mul(*value, self.inv_degree);
            *value = self.modulus.mul(*value, *inv_sqrt_root_power);
        }
    }

    fn transform(&self, values: &mut [u64], powers: &[u64]) {
        let d = self.degree;
        for i in 0..d {
            let ri = reverse_bits(self.log_degree, i);
            if i < ri {
                values.swap(ri, i);
            }
        }

        // Cooley Tukey
        for round in 0..self.log_degree {
            let prev_block_size = 1 << round;
            let s = d >> (round + 1);

            for block_start in (0..d).step_by(prev_block_size * 2) {
                for i in 0..prev_block_size {
                    let w = powers[s * i];
                    let x = values[block_start + i];
                    let y = self.modulus.mul(w, values[block_start + i + prev_block_size]);
                    values[block_start + i] = self.modulus.add(x, y);
                    values[block_start + i + prev_block_size] = self.modulus.sub(x, y);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const P: u64 = 268369921;

    fn naive_negacyclic(a: &[u64], b: &[u64], q: &Modulus) -> Vec<u64> {
        let d = a.len();
        let mut out = vec![0_u64; d];
        for i in 0..d {
            for j in 0..d {
                let prod = q.mul(a[i], b[j]);
                if i + j < d {
                    out[i + j] = q.add(out[i + j], prod);
                } else {
                    out[i + j - d] = q.sub(out[i + j - d], prod);
                }
            }
        }
        out
    }

    #[test]
    fn ntt_self_inverse() {
        let table = NttTable::new(4, Modulus::new(P).unwrap()).unwrap();
        let orig = vec![1_u64, 2, 0, 0];
        let mut coeff = orig.clone();
        table.forward(&mut coeff);
        assert_ne!(coeff, orig);
        table.backward(&mut coeff);
        assert_eq!(coeff, orig);
    }

    #[test]
    fn ntt_multiplication_is_negacyclic() {
        let q = Modulus::new(P).unwrap();
        let table = NttTable::new(8, q).unwrap();
        let a: Vec<u64> = vec![3, 0, 7, 1, P - 1, 0, 0, 5];
        let b: Vec<u64> = vec![0, 2, 0, 0, 9, 1, 0, P - 4];
        let expected = naive_negacyclic(&a, &b, &q);

        let mut a_ntt = a.clone();
        let mut b_ntt = b.clone();
        table.forward(&mut a_ntt);
        table.forward(&mut b_ntt);
        let mut prod: Vec<u64> = a_ntt
            .iter()
            .zip(b_ntt.iter())
            .map(|(x, y)| q.mul(*x, *y))
            .collect();
        table.backward(&mut prod);
        assert_eq!(prod, expected);
    }

    #[test]
    fn x_times_x_pow_d_minus_one_wraps() {
        // x * x^(d-1) = x^d = -1
        let q = Modulus::new(P).unwrap();
        let table = NttTable::new(4, q).unwrap();
        let mut a = vec![0, 1, 0, 0];
        let mut b = vec![0, 0, 0, 1];
        table.forward(&mut a);
        table.forward(&mut b);
        let mut c: Vec<u64> = a.iter().zip(b.iter()).map(|(x, y)| q.mul(*x, *y)).collect();
        table.backward(&mut c);
        assert_eq!(c, vec![P - 1, 0, 0, 0]);
    }

    #[test]
    fn rejects_unsupported() {
        let q = Modulus::new(P).unwrap();
        assert!(NttTable::new(3, q).is_none());
        assert!(NttTable::new(1 << 20, q).is_none());
    }
}
