//! Matrix (square-root decomposition) retrieval.
//!
//! The database is viewed as a `v x v` matrix. Phase 1 selects a column in every row with
//! ciphertext-plaintext products, leaving one ciphertext per row. Phase 2 selects a row with
//! ciphertext-ciphertext products, which spends a second multiplicative level and grows the
//! ciphertext size to 3 unless it is relinearized.

use crate::error::{PirError, Result};
use crate::fhe::fhe::FHEScheme;
use crate::pir::accountant::{must_relinearize, record, NoiseAccountant, RelinearizationPolicy};
use crate::pir::linear::{dot_product_plain, fold_sum};
use log::{debug, info};
use std::time::Instant;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct MatrixEngineConfig {
    pub relinearization: RelinearizationPolicy,
}

/// Retrieves `rows[i / v][i % v]`, where `column` is hot at `i % v` and `row` at `i / v`.
pub fn retrieve_matrix<S: FHEScheme>(
    scheme: &S,
    rows: &[&[S::Plaintext]],
    column: &[S::Ciphertext],
    row: &[S::Ciphertext],
    rk: &S::RelinKey,
    config: MatrixEngineConfig,
    mut accountant: Option<&mut NoiseAccountant<'_, S>>,
) -> Result<S::Ciphertext> {
    let v = column.len();
    if v == 0 {
        return Err(PirError::EmptyInput);
    }
    for len in [row.len(), rows.len()] {
        if len != v {
            return Err(PirError::LengthMismatch {
                expected: v,
                actual: len,
            });
        }
    }
    if let Some(bad_row) = rows.iter().find(|r| r.len() != v) {
        return Err(PirError::LengthMismatch {
            expected: v,
            actual: bad_row.len(),
        });
    }
    let policy = config.relinearization.resolve(scheme.profile());
    debug!("matrix retrieval on {}x{} with policy {}", v, v, policy);

    // Phase 1: column selection
    let i0 = Instant::now();
    let mut intermediate = Vec::with_capacity(v);
    for r in rows.iter() {
        let reduced = dot_product_plain(scheme, column, r, &mut accountant)?;
        record(&mut accountant, "phase 1 row", &reduced)?;
        intermediate.push(reduced);
    }
    let i1 = Instant::now();

    // Phase 2: row selection
    let mut products = Vec::with_capacity(v);
    for (selector, reduced) in row.iter().zip(intermediate.iter()) {
        let selector = prepare_operand(scheme, selector, rk, policy)?;
        let reduced = prepare_operand(scheme, reduced, rk, policy)?;
        let mut product = scheme.mul_hom(&selector, &reduced);
        record(&mut accountant, "cipher multiply", &product)?;
        if policy == RelinearizationPolicy::AfterEachProduct {
            product = scheme.relinearize(&product, rk)?;
            record(&mut accountant, "relinearize", &product)?;
        }
        products.push(product);
    }
    let mut result = fold_sum(scheme, products)?;
    record(&mut accountant, "phase 2 sum", &result)?;
    if policy == RelinearizationPolicy::Final {
        result = scheme.relinearize(&result, rk)?;
        record(&mut accountant, "relinearize", &result)?;
    }
    let i2 = Instant::now();

    info!("(*) answer phase 1: {:?}", i1 - i0);
    info!("(*) answer phase 2: {:?}", i2 - i1);
    Ok(result)
}

fn prepare_operand<S: FHEScheme>(
    scheme: &S,
    ct: &S::Ciphertext,
    rk: &S::RelinKey,
    policy: RelinearizationPolicy,
) -> Result<S::Ciphertext> {
    if must_relinearize(scheme, ct, policy) {
        scheme.relinearize(ct, rk)
    } else {
        Ok(ct.clone())
    }
}
