use crate::math::utils::floor_log;

pub const fn mod_pow(mut a: u64, mut e: u64, n: u64) -> u64 {
    let mut res = 1_u64 % n;
    a %= n;
    while e > 0 {
        if (e & 1) == 1 {
            res = (((res as u128) * (a as u128)) % (n as u128)) as u64;
        }
        e >>= 1;
        a = (((a as u128) * (a as u128)) % (n as u128)) as u64;
    }
    res
}

/// Witnesses that make Miller-Rabin deterministic for every `u64`.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in MILLER_RABIN_BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for a in MILLER_RABIN_BASES {
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = ((x as u128 * x as u128) % n as u128) as u64;
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Finds a primitive `2 * degree`-th root of unity modulo the prime `modulus`, which exists iff
/// `modulus = 1 mod 2 * degree`.
pub fn find_sqrt_primitive_root(degree: usize, modulus: u64) -> Option<u64> {
    let double_degree = (2 * degree) as u64;
    if degree == 0 || (modulus - 1) % double_degree != 0 {
        return None;
    }
    let quotient_size = (modulus - 1) / double_degree;
    let log_double_degree = floor_log(2, double_degree);
    if 1 << log_double_degree != double_degree {
        return None;
    }

    'tries: for base in 2..modulus {
        let candidate = mod_pow(base, quotient_size, modulus);
        let mut curr_pow = candidate;
        for _ in 0..log_double_degree {
            if curr_pow == 1 {
                continue 'tries;
            }
            curr_pow = mod_pow(curr_pow, 2, modulus);
        }
        if curr_pow != 1 {
            // `modulus` is not prime
            return None;
        }
        return Some(candidate);
    }
    None
}

/// Largest prime `p < 2^bits` with `p = 1 mod 2 * degree`, i.e. one that supports a negacyclic
/// NTT of length `degree`. Returns `None` if no such prime has exactly `bits` bits.
pub fn find_ntt_prime(bits: u32, degree: usize) -> Option<u64> {
    assert!((2..=62).contains(&bits));
    find_ntt_prime_below(1_u64 << bits, degree).filter(|p| *p >= 1_u64 << (bits - 1))
}

/// Largest prime `p < bound` with `p = 1 mod 2 * degree`.
pub fn find_ntt_prime_below(bound: u64, degree: usize) -> Option<u64> {
    let step = (2 * degree) as u64;
    if bound <= step {
        return None;
    }
    let mut candidate = ((bound - 1) / step) * step + 1;
    if candidate >= bound {
        candidate -= step;
    }
    while candidate > step {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate -= step;
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mod_pow() {
        assert_eq!(mod_pow(11, 65520, 268369921), 228368554);
        assert_eq!(mod_pow(5, 0, 7), 1);
        assert_eq!(mod_pow(5, 3, 1), 0);
    }

    #[test]
    fn test_is_prime() {
        let primes = [2_u64, 3, 17, 268369921, 249561089, 0x3fffffff000001];
        for p in primes {
            assert!(is_prime(p), "{} should be prime", p);
        }
        let composites = [0_u64, 1, 4, 561, 268369921 * 3, 0x3fffffff000001 + 2];
        for c in composites {
            assert!(!is_prime(c), "{} should be composite", c);
        }
    }

    #[test]
    fn test_find_sqrt_primitive_root() {
        let prim1 = find_sqrt_primitive_root(2048, 268369921).unwrap();
        assert_eq!(prim1, mod_pow(11, (268369921 - 1) / 4096, 268369921));

        let prim2 = find_sqrt_primitive_root(2048, 249561089).unwrap();
        assert_eq!(prim2, mod_pow(3, (249561089 - 1) / 4096, 249561089));

        // 2^54 - 2^24 + 1 supports degrees up to 2^23
        let q = 0x3fffffff000001;
        let root = find_sqrt_primitive_root(2048, q).unwrap();
        assert_eq!(mod_pow(root, 4096, q), 1);
        assert_eq!(mod_pow(root, 2048, q), q - 1);

        assert_eq!(find_sqrt_primitive_root(2048, 17), None);
    }

    #[test]
    fn test_find_ntt_prime() {
        for (bits, degree) in [(27, 1024), (54, 2048), (54, 4096), (61, 2048)] {
            let p = find_ntt_prime(bits, degree).unwrap();
            assert!(is_prime(p));
            assert_eq!(p % (2 * degree as u64), 1);
            assert_eq!(64 - p.leading_zeros(), bits);
        }
        let p = find_ntt_prime(61, 2048).unwrap();
        let p2 = find_ntt_prime_below(p, 2048).unwrap();
        assert!(p2 < p);
        assert!(p2 > 1 << 60);
    }
}
