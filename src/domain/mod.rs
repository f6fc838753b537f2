//! Domain layer - interface descriptions, decoded calls and records

pub mod abi;
pub mod records;
