//! Private information retrieval over a leveled BFV scheme.
//!
//! A client fetches element `i` of a server-held database of integers without revealing `i`. Two
//! retrieval strategies are provided: a linear scan with one encrypted one-hot vector of length
//! `n`, and a square-root decomposition with two one-hot vectors of length `sqrt(n)` that spends
//! an extra multiplicative level. Every homomorphic step can be metered by a noise accountant.
#![allow(clippy::needless_range_loop)]

pub mod error;
pub mod fhe;
pub mod math;
pub mod params;
pub mod pir;

pub use error::{PirError, Result};
pub use params::{configure, CoeffModulus, ParameterProfile};
