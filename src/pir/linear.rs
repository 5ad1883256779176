//! Linear retrieval: one encrypted inner product over the whole database.

use crate::error::{PirError, Result};
use crate::fhe::fhe::{AddHomEncryptionScheme, FHEScheme};
use crate::pir::accountant::{record, NoiseAccountant};
use log::debug;

/// Left fold of `terms` under homomorphic addition.
pub fn fold_sum<S: AddHomEncryptionScheme, I: IntoIterator<Item = S::Ciphertext>>(
    scheme: &S,
    terms: I,
) -> Result<S::Ciphertext> {
    let mut terms = terms.into_iter();
    let first = terms.next().ok_or(PirError::EmptyInput)?;
    Ok(terms.fold(first, |acc, term| scheme.add_hom(&acc, &term)))
}

/// `sum_j selection[j] * entries[j]` with ciphertext-plaintext products. Every product is
/// shown to the accountant before it is accumulated.
pub fn dot_product_plain<S: FHEScheme>(
    scheme: &S,
    selection: &[S::Ciphertext],
    entries: &[S::Plaintext],
    accountant: &mut Option<&mut NoiseAccountant<'_, S>>,
) -> Result<S::Ciphertext> {
    if selection.len() != entries.len() {
        return Err(PirError::LengthMismatch {
            expected: selection.len(),
            actual: entries.len(),
        });
    }
    let mut terms = Vec::with_capacity(selection.len());
    for (ct, pt) in selection.iter().zip(entries.iter()) {
        let term = scheme.mul_scalar(ct, pt);
        record(accountant, "plain multiply", &term)?;
        terms.push(term);
    }
    fold_sum(scheme, terms)
}

/// Retrieves the entry selected by a one-hot `selection` vector of the same length as
/// `database`. Consumes one plaintext multiplicative level.
pub fn retrieve_linear<S: FHEScheme>(
    scheme: &S,
    database: &[S::Plaintext],
    selection: &[S::Ciphertext],
    mut accountant: Option<&mut NoiseAccountant<'_, S>>,
) -> Result<S::Ciphertext> {
    debug!("linear retrieval over {} entries", database.len());
    let result = dot_product_plain(scheme, selection, database, &mut accountant)?;
    record(&mut accountant, "plain multiply-accumulate", &result)?;
    Ok(result)
}
