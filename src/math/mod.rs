//! Math-related constructs.
pub mod crt;
pub mod cyclo_poly;
pub mod discrete_gaussian;
pub mod gadget;
pub mod modulus;
pub mod ntt;
pub mod number_theory;
pub mod utils;
