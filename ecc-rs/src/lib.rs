//! # ecc-rs
//!
//! Orbital-eccentricity extrema localization for gravitational waveforms.
//!
//! An eccentric binary modulates its instantaneous orbital frequency once
//! per orbit, but the modulation rides on a strong secular trend that
//! defeats raw peak detection. This crate locates the alternating
//! periastron/apastron extrema on a *trend-subtracted* residual: a
//! power-law envelope is fit locally, refined iteratively, and walked
//! across the series with phase-based windows that stay honest near the
//! ends of the data.
//!
//! The main entry point is [`extrema::ExtremaFinder`]:
//!
//! ```
//! use ecc_rs::extrema::{ExtremaFinder, ExtremaFinderConfig, ExtremaType, Series};
//! use ecc_rs::kernel::KernelLifecycle;
//!
//! # fn samples() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
//! #     let n = 2000;
//! #     let dt = 1990.0 / (n - 1) as f64;
//! #     let t: Vec<f64> = (0..n).map(|i| -2000.0 + dt * i as f64).collect();
//! #     let trend: Vec<f64> = t.iter().map(|&ti| 2.9 * (10.0 - ti).powf(-0.375)).collect();
//! #     let mut phase = vec![0.0];
//! #     for i in 1..n {
//! #         let p = phase[i - 1] + 0.5 * (trend[i - 1] + trend[i]) * dt;
//! #         phase.push(p);
//! #     }
//! #     let omega: Vec<f64> = trend
//! #         .iter()
//! #         .zip(phase.iter())
//! #         .map(|(&tr, &ph)| tr * (1.0 + 0.1 * (ph / 2.0).sin()))
//! #         .collect();
//! #     (t, phase, omega)
//! # }
//! let (t, phase22, omega22) = samples();
//! let series = Series::try_new(t, phase22, omega22)?;
//! let finder = ExtremaFinder::try_new(ExtremaFinderConfig::default())?;
//! let periastrons = finder.find_extrema(&series, ExtremaType::Maxima)?;
//! assert!(periastrons.windows(2).all(|w| w[1] > w[0]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The pipeline is single threaded and free of shared state; independent
//! extrema types or waveforms parallelize from the outside.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
pub mod error;
#[cfg(feature = "alloc")]
pub mod extrema;
#[cfg(feature = "alloc")]
pub mod fit;
pub mod kernel;
#[cfg(feature = "plot")]
pub mod plot;
pub mod signal;

#[cfg(feature = "alloc")]
pub use error::Error;
