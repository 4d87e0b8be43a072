/*
 * gw-signal, annual stream temperature signal and groundwater loss terms
 * Copyright (C) 2025 Athaariq A. Ramadhani <foss@athaariq.my.id>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Water temperatures outside this band are dropped before fitting, to stay
/// clear of freeze-thaw dynamics near 0 °C and of sensor errors.
pub const WATER_MIN_TEMP: f64 = 1.0;
pub const WATER_MAX_TEMP: f64 = 45.0;

/// Intercept, sine and cosine coefficients plus one residual degree of freedom.
pub const MIN_FIT_SAMPLES: usize = 4;

/// Annual sinusoid of one series. Amplitude in °C, phase in radians relative
/// to [`crate::typedef::REFERENCE_EPOCH`].
///
/// The low/high values come from evaluating the amplitude and phase formulas at
/// the corners of the per-coefficient confidence intervals. That enumeration
/// ignores the correlation between coefficients, so it is conservative and
/// usually wider than a joint confidence region.
#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SignalEstimate {
	pub amplitude: f64,
	pub phase: f64,
	pub amplitude_low: f64,
	pub amplitude_high: f64,
	pub phase_low: f64,
	pub phase_high: f64,
}

/// Outcome of fitting one annual sinusoid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HarmonicFit {
	Success(SignalEstimate),
	/// Too few present values after filtering.
	Insufficient { valid: usize, required: usize },
	/// The normal equations could not be solved (e.g. every sample falls on the
	/// same day of the year).
	Singular,
}

impl HarmonicFit {
	pub fn estimate(&self) -> Option<&SignalEstimate> {
		match self {
			HarmonicFit::Success(found) => Some(found),
			_ => None,
		}
	}

	pub fn is_success(&self) -> bool {
		matches!(self, HarmonicFit::Success(_))
	}

	pub fn amplitude(&self) -> Option<f64> {
		self.estimate().map(|found| found.amplitude)
	}

	pub fn phase(&self) -> Option<f64> {
		self.estimate().map(|found| found.phase)
	}

	pub fn amplitude_low(&self) -> Option<f64> {
		self.estimate().map(|found| found.amplitude_low)
	}

	pub fn amplitude_high(&self) -> Option<f64> {
		self.estimate().map(|found| found.amplitude_high)
	}

	pub fn phase_low(&self) -> Option<f64> {
		self.estimate().map(|found| found.phase_low)
	}

	pub fn phase_high(&self) -> Option<f64> {
		self.estimate().map(|found| found.phase_high)
	}
}

#[derive(burn::config::Config, Debug)]
pub struct AnnualSignalConfig {
	/// Two-sided confidence level of the coefficient intervals.
	#[config(default = 0.95)]
	pub confidence_level: f64,
}

impl AnnualSignalConfig {
	pub fn validate(&self) -> Result<(), SignalError> {
		if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
			return Err(SignalError::InvalidConfig(format!(
				"confidence level {} is outside (0, 1)",
				self.confidence_level
			)));
		}

		Ok(())
	}
}

pub(super) struct OlsFit {
	/// Intercept, sine and cosine coefficients
	pub coefficients: [f64; 3],
	pub lower: [f64; 3],
	pub upper: [f64; 3],
}
