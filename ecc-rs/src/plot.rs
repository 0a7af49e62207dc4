//! Python/matplotlib diagnostic plotting for extrema walks.
//!
//! Debug-only bridge: generates a small Python script plotting the
//! frequency series with the located periastron and apastron samples
//! marked, then runs it with a non-interactive backend. Styling is an
//! explicit [`PlotSettings`] value handed in by the caller; the numerical
//! pipeline never consults ambient plot state.

use crate::extrema::Series;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors raised by plot utilities.
#[derive(Debug)]
pub enum PlotError {
    /// Underlying process or filesystem I/O failure.
    Io(std::io::Error),
    /// Python subprocess stdin was unavailable.
    StdinUnavailable,
    /// Python subprocess exited unsuccessfully.
    PythonExitFailure(ExitStatus),
}

impl core::fmt::Display for PlotError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlotError::Io(err) => write!(f, "plot I/O failure: {err}"),
            PlotError::StdinUnavailable => {
                write!(f, "failed to open stdin for python plotting process")
            }
            PlotError::PythonExitFailure(status) => {
                write!(f, "python plotting script failed with status: {status}")
            }
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Io(err) => Some(err),
            PlotError::StdinUnavailable | PlotError::PythonExitFailure(_) => None,
        }
    }
}

impl From<std::io::Error> for PlotError {
    fn from(value: std::io::Error) -> Self {
        PlotError::Io(value)
    }
}

/// Explicit styling for the extrema diagnostic plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotSettings {
    /// Line color of the frequency series.
    pub default_color: String,
    /// Marker color of periastron samples.
    pub periastron_color: String,
    /// Marker color of apastron samples.
    pub apastron_color: String,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            default_color: String::from("#46734f"),
            periastron_color: String::from("#b4674e"),
            apastron_color: String::from("#5b7ea4"),
        }
    }
}

fn join_floats(values: impl Iterator<Item = f64>) -> String {
    values
        .map(|v| format!("{v:e}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Debug utility that plots the frequency series with extrema markers.
///
/// Non-blocking best effort; the PNG lands under `target/plots`.
pub fn plot_extrema_in_omega(
    series: &Series,
    periastrons: &[usize],
    apastrons: &[usize],
    settings: &PlotSettings,
) {
    let _ = plot_extrema_in_omega_to_path(series, periastrons, apastrons, settings, None::<&Path>);
}

/// Plot the frequency series with extrema markers and save a PNG.
///
/// Returns the output path when plotting succeeds.
pub fn plot_extrema_in_omega_to_path<P: AsRef<Path>>(
    series: &Series,
    periastrons: &[usize],
    apastrons: &[usize],
    settings: &PlotSettings,
    output_path: Option<P>,
) -> Result<PathBuf, PlotError> {
    let output_path = match output_path {
        Some(path) => path.as_ref().to_path_buf(),
        None => {
            let ts = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            PathBuf::from(format!("target/plots/extrema_in_omega_{ts}.png"))
        }
    };
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let output_path_literal = output_path.to_string_lossy().replace('\\', "\\\\");
    let t = join_floats(series.t().iter().copied());
    let omega = join_floats(series.omega().iter().copied());
    let t_peri = join_floats(periastrons.iter().map(|&i| series.t()[i]));
    let w_peri = join_floats(periastrons.iter().map(|&i| series.omega()[i]));
    let t_apo = join_floats(apastrons.iter().map(|&i| series.t()[i]));
    let w_apo = join_floats(apastrons.iter().map(|&i| series.omega()[i]));

    let script = format!(
        r#"
import matplotlib
matplotlib.use("Agg")
import matplotlib.pyplot as plt

t = [{t}]
omega = [{omega}]
fig, ax = plt.subplots(figsize=(12, 4))
ax.plot(t, omega, c="{default}", label=r"$\omega_{{22}}(t)$")
ax.plot([{t_peri}], [{w_peri}], c="{peri}", marker=".", ls="", label="periastron")
ax.plot([{t_apo}], [{w_apo}], c="{apo}", marker=".", ls="", label="apastron")
ax.set_xlabel("time")
ax.set_ylabel(r"$M\omega_{{22}}(t)$")
ax.grid()
ax.legend()
fig.tight_layout()
fig.savefig("{path}", dpi=150)
"#,
        t = t,
        omega = omega,
        t_peri = t_peri,
        w_peri = w_peri,
        t_apo = t_apo,
        w_apo = w_apo,
        default = settings.default_color,
        peri = settings.periastron_color,
        apo = settings.apastron_color,
        path = output_path_literal,
    );

    let mut child = std::process::Command::new("python3")
        .arg("-")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;
    {
        let stdin = child.stdin.as_mut().ok_or(PlotError::StdinUnavailable)?;
        stdin.write_all(script.as_bytes())?;
    }
    let status = child.wait()?;
    if !status.success() {
        return Err(PlotError::PythonExitFailure(status));
    }
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrema::Series;

    fn tiny_series() -> Series {
        let t: Vec<f64> = (0..8).map(|i| -8.0 + i as f64).collect();
        let phase: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let omega: Vec<f64> = (0..8).map(|i| 0.1 + 0.01 * (i % 3) as f64).collect();
        Series::try_new(t, phase, omega).expect("series")
    }

    // requires python3 with matplotlib on the path
    #[test]
    #[ignore]
    fn writes_a_png_next_to_the_requested_path() {
        let series = tiny_series();
        let path = std::env::temp_dir().join("ecc_rs_plot_test.png");
        let written = plot_extrema_in_omega_to_path(
            &series,
            &[2, 5],
            &[3, 6],
            &PlotSettings::default(),
            Some(&path),
        )
        .expect("plot");
        assert!(written.exists());
        let _ = std::fs::remove_file(written);
    }
}
