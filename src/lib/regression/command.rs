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

use std::f64::consts::PI;

use burn::tensor::{backend::Backend, Tensor};

use super::helper::*;
use super::typedef::*;
use crate::error::SignalError;
use crate::typedef::DAYS_PER_YEAR;

/// Smallest sine coefficient magnitude fed to `atan(b/a)`.
const MIN_SINE_COEFFICIENT: f64 = 1e-12;
/// Squared amplitudes are clamped here before the square root, which keeps the
/// gradient finite at zero.
const MIN_SQUARED_AMPLITUDE: f64 = 1e-20;
/// Air amplitudes below this are treated as unknown.
const MIN_AIR_AMPLITUDE: f64 = 1e-12;

/// Fit `T = c + a·sin(2πt) + b·cos(2πt)` to every segment of a batch of
/// predictions in one differentiable pass.
///
/// `temperature` is `[segments, timesteps, 1]` in °C. Regressors are centred
/// per segment and orthogonalized, so short windows keep full precision on
/// `f32` and collinear or constant designs give finite coefficients instead
/// of `NaN`. Missing air references are replaced with neutral values; the
/// matching targets are missing anyway.
pub fn batched_annual_signal<B: Backend>(
	temperature: Tensor<B, 3>,
	features: &GwFeatures<B>,
	config: &BatchRegressionConfig,
) -> Result<BatchSignal<B>, SignalError> {
	config.validate()?;

	let [segments, timesteps, channels] = temperature.dims();
	if channels != 1 || features.sin_wt.dims() != [segments, timesteps] {
		return Err(SignalError::shape_mismatch(
			format!("[{}, {}, 1] with features {:?}", segments, timesteps, [segments, timesteps]),
			format!("{:?} with features {:?}", temperature.dims(), features.sin_wt.dims()),
		));
	}
	if features.cos_wt.dims() != [segments, timesteps]
		|| features.air_phase.dims() != [segments]
		|| features.air_amplitude.dims() != [segments]
	{
		return Err(SignalError::shape_mismatch(
			format!("cos_wt [{}, {}] and air references [{}]", segments, timesteps, segments),
			format!(
				"cos_wt {:?}, air_phase {:?}, air_amplitude {:?}",
				features.cos_wt.dims(),
				features.air_phase.dims(),
				features.air_amplitude.dims()
			),
		));
	}

	let coefficients = centred_least_squares(
		temperature.reshape([segments, timesteps]),
		features.sin_wt.clone(),
		features.cos_wt.clone(),
		config.rank_tolerance,
	);

	let sine = coefficients.clone().slice([0..segments, 1..2]).reshape([segments]);
	let cosine = coefficients.clone().slice([0..segments, 2..3]).reshape([segments]);

	let amplitude = sine
		.clone()
		.mul(sine.clone())
		.add(cosine.clone().mul(cosine.clone()))
		.clamp_min(MIN_SQUARED_AMPLITUDE)
		.sqrt();

	let tiny_sine = sine.clone().abs().lower_elem(MIN_SINE_COEFFICIENT);
	let sine = sine.mask_fill(tiny_sine, MIN_SINE_COEFFICIENT);
	let phase = arctan(cosine.div(sine)).neg().add_scalar(3.0 * PI / 2.0);

	let air_phase = features.air_phase.clone();
	let air_phase = air_phase.clone().mask_fill(air_phase.is_nan(), 0.0);
	let air_amplitude = features.air_amplitude.clone();
	let air_amplitude = air_amplitude.clone().mask_fill(air_amplitude.is_nan(), 1.0);
	let air_amplitude = air_amplitude
		.clone()
		.mask_fill(air_amplitude.abs().lower_elem(MIN_AIR_AMPLITUDE), 1.0);

	let amplitude_ratio = amplitude.clone().div(air_amplitude);
	let phase_shift = phase
		.clone()
		.sub(air_phase)
		.mul_scalar(DAYS_PER_YEAR / (2.0 * PI));
	let degenerate = amplitude.clone().lower_elem(config.amplitude_floor);

	Ok(BatchSignal {
		coefficients,
		amplitude,
		phase,
		amplitude_ratio,
		phase_shift,
		degenerate,
	})
}
