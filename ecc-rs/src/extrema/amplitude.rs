//! Direct amplitude-channel extremum finding.
//!
//! The cheap alternative to the fit-based walk: when the data channel has
//! no strong secular trend (a residual amplitude, for instance), its
//! extrema can be read off with one filtered peak-detection pass. Broad
//! default width filtering suppresses sample-level noise wiggles.

use crate::error::Error;
use crate::extrema::sequence::ExtremaType;
use crate::kernel::{ConfigError, KernelLifecycle, Read1D};
use crate::signal::peak::{find_peaks, FindPeaksOptions};

use alloc::vec::Vec;

/// Constructor config for [`AmplitudeExtremaFinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeFinderConfig {
    /// Minimum peak height.
    pub height: Option<f64>,
    /// Minimum index distance between retained peaks.
    pub distance: Option<usize>,
    /// Minimum peak prominence.
    pub prominence: Option<f64>,
    /// Minimum peak width in samples.
    pub width: Option<f64>,
    /// Relative height at which widths are measured.
    pub rel_height: f64,
}

impl Default for AmplitudeFinderConfig {
    fn default() -> Self {
        Self {
            height: None,
            distance: None,
            prominence: None,
            width: Some(50.0),
            rel_height: 0.5,
        }
    }
}

/// Extremum finder running the peak primitive directly on a data channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeExtremaFinder {
    config: AmplitudeFinderConfig,
}

impl KernelLifecycle for AmplitudeExtremaFinder {
    type Config = AmplitudeFinderConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&config.rel_height) {
            return Err(ConfigError::InvalidArgument {
                arg: "rel_height",
                reason: "relative height must lie in [0, 1]",
            });
        }
        if let Some(width) = config.width {
            if !(width > 0.0) {
                return Err(ConfigError::InvalidArgument {
                    arg: "width",
                    reason: "width must be positive",
                });
            }
        }
        Ok(Self { config })
    }
}

impl AmplitudeExtremaFinder {
    /// Find extrema of the given type in `data`.
    ///
    /// Minima are found by negating the channel, so all filters apply to
    /// the flipped signal.
    pub fn find_extrema<I>(
        &self,
        data: &I,
        extrema_type: ExtremaType,
    ) -> Result<Vec<usize>, Error>
    where
        I: Read1D<f64> + ?Sized,
    {
        let data = data.read_slice().map_err(Error::Config)?;
        let sign = extrema_type.sign();
        let signed: Vec<f64> = data.iter().map(|&v| sign * v).collect();
        Ok(find_peaks(
            &signed,
            FindPeaksOptions {
                height: self.config.height,
                distance: self.config.distance,
                prominence: self.config.prominence,
                width: self.config.width,
                rel_height: Some(self.config.rel_height),
            },
        ))
    }
}
