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

use burn::tensor::{backend::Backend, Bool, Tensor};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::error::SignalError;

/// Columns of the per-timestep groundwater target, in storage order.
#[derive(PartialEq, Eq, Hash, EnumIter, Display, Deserialize, Serialize, Clone, Copy, Debug)]
pub enum GwColumn {
	#[strum(serialize = "Ar_obs")]
	AmplitudeRatio,
	#[strum(serialize = "delPhi_obs")]
	PhaseShift,
	#[strum(serialize = "air_phi")]
	AirPhase,
	#[strum(serialize = "air_amp")]
	AirAmplitude,
	#[strum(serialize = "sin_wt")]
	SinWt,
	#[strum(serialize = "cos_wt")]
	CosWt,
}

pub const GW_COLUMN_COUNT: usize = 6;

impl GwColumn {
	pub fn index(&self) -> usize {
		*self as usize
	}
}

/// Regressors of the batched fit. `sin_wt`/`cos_wt` are `[segments, timesteps]`,
/// the air references are `[segments]`.
#[derive(Clone, Debug)]
pub struct GwFeatures<B: Backend> {
	pub sin_wt: Tensor<B, 2>,
	pub cos_wt: Tensor<B, 2>,
	pub air_phase: Tensor<B, 1>,
	pub air_amplitude: Tensor<B, 1>,
}

/// Annual signal of a batch of predicted series. Every tensor is `[segments]`
/// except `coefficients`, which is `[segments, 3]` (intercept, sine, cosine).
#[derive(Clone, Debug)]
pub struct BatchSignal<B: Backend> {
	pub coefficients: Tensor<B, 2>,
	pub amplitude: Tensor<B, 1>,
	pub phase: Tensor<B, 1>,
	pub amplitude_ratio: Tensor<B, 1>,
	pub phase_shift: Tensor<B, 1>,
	/// Segments whose fitted amplitude is below the floor. Their phase carries
	/// no information.
	pub degenerate: Tensor<B, 1, Bool>,
}

#[derive(burn::config::Config, Debug)]
pub struct BatchRegressionConfig {
	/// Share of the raw regressor energy a centred sine or cosine column must
	/// keep, once the other is projected out, to enter the fit.
	#[config(default = 1e-10)]
	pub rank_tolerance: f64,
	/// Amplitudes below this mark a segment as degenerate.
	#[config(default = 1e-6)]
	pub amplitude_floor: f64,
}

impl BatchRegressionConfig {
	pub fn validate(&self) -> Result<(), SignalError> {
		if !(self.rank_tolerance > 0.0 && self.rank_tolerance < 1.0) {
			return Err(SignalError::InvalidConfig(format!(
				"rank tolerance {} is outside (0, 1)",
				self.rank_tolerance
			)));
		}
		if !(self.amplitude_floor >= 0.0) {
			return Err(SignalError::InvalidConfig(format!(
				"amplitude floor {} must not be negative",
				self.amplitude_floor
			)));
		}

		Ok(())
	}
}
