//! PIR (Private Information Retrieval) constructs.
pub mod accountant;
pub mod database;
pub mod harness;
pub mod linear;
pub mod matrix;
pub mod pir;
pub mod selection;
pub mod verify;
