//! Peak-detection primitives for 1D numeric sequences.

#[cfg(feature = "alloc")]
pub mod peak;
