//! Shared trait-first kernel substrate.
//!
//! Defines the constructor-validation lifecycle and the contiguous 1D
//! buffer adapters used by the fitting and extrema kernels.

use core::fmt;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use ndarray::{Array1, ArrayView1};

/// Validation errors raised at kernel construction or adapter binding time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required input or configuration field is empty.
    EmptyInput {
        /// Name of the argument that is empty.
        arg: &'static str,
    },
    /// A configuration argument value is invalid.
    InvalidArgument {
        /// Name of the argument.
        arg: &'static str,
        /// Human readable reason.
        reason: &'static str,
    },
    /// A contiguous 1D slice view could not be obtained.
    NonContiguous {
        /// Name of the argument that is non-contiguous.
        arg: &'static str,
    },
    /// Input/output lengths did not match the required shape.
    LengthMismatch {
        /// Name of the argument.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyInput { arg } => write!(f, "Input `{arg}` was empty."),
            ConfigError::InvalidArgument { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            ConfigError::NonContiguous { arg } => {
                write!(f, "Argument `{arg}` is not contiguous in memory.")
            }
            ConfigError::LengthMismatch { arg, expected, got } => {
                write!(
                    f,
                    "Length mismatch on `{arg}`. Expected {expected}, got {got}."
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Constructor validation lifecycle shared by kernel structs.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}

/// Adapter trait for reading contiguous 1D input.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing contiguous 1D output.
pub trait Write1D<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Write1D<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

#[cfg(feature = "alloc")]
impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T> Read1D<T> for Array1<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

#[cfg(feature = "alloc")]
impl<T> Write1D<T> for Array1<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

#[cfg(feature = "alloc")]
impl<'a, T> Read1D<T> for ArrayView1<'a, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array_view" })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KernelLifecycle, Read1D, Write1D};

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct ToleranceConfig {
        tol: f64,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct ToleranceKernel {
        tol: f64,
    }

    impl KernelLifecycle for ToleranceKernel {
        type Config = ToleranceConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            if !(config.tol > 0.0) {
                return Err(ConfigError::InvalidArgument {
                    arg: "tol",
                    reason: "tolerance must be positive",
                });
            }
            Ok(Self { tol: config.tol })
        }
    }

    #[test]
    fn lifecycle_accepts_valid_and_rejects_invalid() {
        let kernel =
            ToleranceKernel::try_new(ToleranceConfig { tol: 1e-8 }).expect("valid config");
        assert_eq!(kernel.tol, 1e-8);

        let err = ToleranceKernel::try_new(ToleranceConfig { tol: 0.0 }).expect_err("zero tol");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "tol",
                reason: "tolerance must be positive",
            }
        );
    }

    #[test]
    fn slice_vec_and_array_adapters() {
        let fixed = [0.25f64, 0.5, 0.75];
        assert_eq!(fixed.read_slice().expect("array adapter").len(), 3);

        let slice: &[f64] = &fixed;
        assert_eq!(slice.read_slice().expect("slice adapter")[1], 0.5);

        let mut owned = alloc::vec![0.0f64; 3];
        owned.write_slice_mut().expect("vec adapter")[2] = 1.0;
        assert_eq!(owned[2], 1.0);

        let arr = ndarray::arr1(&[1.0f64, 2.0]);
        assert_eq!(arr.read_slice().expect("ndarray adapter"), &[1.0, 2.0]);
    }
}
