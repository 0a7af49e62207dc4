//! Errors raised by the fitting and extrema-localization pipeline.

use crate::kernel::ConfigError;
use core::fmt;

use alloc::string::String;

/// Errors raised while fitting envelopes or localizing extrema.
///
/// Every variant aborts the enclosing extrema search; there are no partially
/// recovered results. Reaching the end of the data is signalled by a short
/// extrema set, never by an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Envelope evaluation was requested at or beyond its singularity time.
    FittingDomain {
        /// Largest time sample in the evaluation request.
        t_max: f64,
        /// Singularity time of the envelope parameters.
        t_sing: f64,
    },
    /// The bounded least-squares solver failed to converge.
    FitConvergence {
        /// Iterations consumed before giving up.
        iterations: usize,
    },
    /// Too few extrema exist left of the reference index and the window
    /// cannot move further left.
    InsufficientLeftExtrema {
        /// Reference index of the failing window.
        idx_ref: usize,
        /// Number of extrema that were required on the left.
        target: usize,
    },
    /// The data ends two or more extrema short of the right-side target.
    InsufficientRightExtrema {
        /// Reference index of the failing window.
        idx_ref: usize,
        /// Number of extrema that were required on the right.
        target: usize,
        /// Number of extrema actually found on the right.
        found: usize,
    },
    /// Window-size corrections oscillated without settling.
    WindowStall {
        /// Correction passes consumed before giving up.
        iterations: usize,
    },
    /// The envelope refit loop did not stabilize the extrema set.
    ResolverNonConvergence {
        /// Refit passes consumed before giving up.
        iterations: usize,
    },
    /// The outer sequence walk exceeded its absolute iteration guard.
    RunawayLoop {
        /// Outer steps consumed before giving up.
        iterations: usize,
    },
    /// The requested extrema type is not one of the known names.
    InvalidExtremaType {
        /// The unrecognized name.
        name: String,
    },
    /// The series is too short to seat the first search window.
    InsufficientData {
        /// Number of samples in the series.
        len: usize,
    },
    /// Constructor or adapter validation failure.
    Config(ConfigError),
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Error::Config(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FittingDomain { t_max, t_sing } => write!(
                f,
                "envelope singularity time {t_sing} lies within the requested \
                 time samples (max {t_max})"
            ),
            Error::FitConvergence { iterations } => {
                write!(f, "bounded fit failed to converge after {iterations} iterations")
            }
            Error::InsufficientLeftExtrema { idx_ref, target } => write!(
                f,
                "could not identify {target} extrema left of reference index {idx_ref}"
            ),
            Error::InsufficientRightExtrema {
                idx_ref,
                target,
                found,
            } => write!(
                f,
                "data ends {missing} extrema short of the {target} required right of \
                 reference index {idx_ref}",
                missing = target - found
            ),
            Error::WindowStall { iterations } => {
                write!(f, "window corrections did not settle within {iterations} passes")
            }
            Error::ResolverNonConvergence { iterations } => {
                write!(f, "extrema set did not stabilize within {iterations} refit passes")
            }
            Error::RunawayLoop { iterations } => {
                write!(f, "sequence walk exceeded {iterations} outer steps")
            }
            Error::InvalidExtremaType { name } => write!(
                f,
                "unknown extrema type `{name}`; expected one of maxima, peaks, minima, troughs"
            ),
            Error::InsufficientData { len } => {
                write!(f, "series of {len} samples is too short to seat a search window")
            }
            Error::Config(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            _ => None,
        }
    }
}
