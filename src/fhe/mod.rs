//! FHE (Fully Homomorphic Encryption) specific constructs.
pub mod bfv;
pub mod fhe;
pub mod noise_tracker;
