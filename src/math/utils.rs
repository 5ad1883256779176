//! Miscellaneous math utilities.

/// Computes `ceil(log_base(x))`. This method is not intended for efficiency.
pub const fn ceil_log(base: u64, x: u64) -> usize {
    assert!(base > 1);
    assert!(x > 0);
    let mut e = 0;
    let mut y: u128 = 1;

    while y < x as u128 {
        y *= base as u128;
        e += 1;
    }

    e
}

pub const fn floor_log(base: u64, mut x: u64) -> usize {
    assert!(base > 1);
    assert!(x > 0);
    let mut e = 0;

    while x >= base {
        x /= base;
        e += 1;
    }

    e
}

/// Number of significant bits of `x`, i.e. `floor(log2(x)) + 1` for `x > 0` and `0` for `x = 0`.
pub const fn bit_count(x: u128) -> u32 {
    128 - x.leading_zeros()
}

pub const fn mod_inverse(x: u64, modulus: u64) -> u64 {
    let modulus = modulus as i128;
    let mut a = x as i128;
    let mut b = modulus;
    let mut x = 1;
    let mut y = 0;
    while a > 1 {
        let q = a / b;

        let t = b;
        b = a % b;
        a = t;

        let t = y;
        y = (x - (q * y)) % modulus;
        x = t;
    }

    (x + (x < 0) as i128 * modulus) as u64
}

/// Exact integer square root: returns `Some(v)` with `v * v == n`, or `None` if `n` is not a
/// perfect square.
pub fn exact_sqrt(n: usize) -> Option<usize> {
    let v = isqrt(n);
    (v * v == n).then_some(v)
}

/// `floor(sqrt(n))` without going through floating point.
pub fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = (x >> 1) + (x & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

pub fn reverse_bits(log_d: usize, a: usize) -> usize {
    if log_d == 0 {
        return 0;
    }
    a.reverse_bits() >> ((usize::BITS as usize) - log_d)
}
