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

use burn::tensor::{backend::Backend, Tensor};

use crate::dataset::GwScale;
use crate::error::SignalError;
use crate::regression::BatchRegressionConfig;
use crate::typedef::NormalParam;

/// Main and auxiliary target variables in front of the groundwater columns.
pub const N_VARS: usize = 2;

#[derive(burn::config::Config, Debug)]
pub struct GwLossConfig {
	/// Mean and standard deviation used to bring predictions back to °C before
	/// the annual fit.
	pub temperature: NormalParam,
	/// Prediction channel holding temperature.
	#[config(default = 0)]
	pub temp_index: usize,
	#[config(default = 0.5)]
	pub lambda_aux: f64,
	#[config(default = 0.0)]
	pub lambda_ar: f64,
	#[config(default = 0.0)]
	pub lambda_del_phi: f64,
	#[config(default = "BatchRegressionConfig::new()")]
	pub regression: BatchRegressionConfig,
	/// Standardize predicted `Ar`/`delPhi` the way the training targets were.
	pub gw_scale: Option<GwScale>,
}

impl GwLossConfig {
	pub fn init(&self) -> Result<GwLoss, SignalError> {
		for (name, value) in [
			("lambda_aux", self.lambda_aux),
			("lambda_ar", self.lambda_ar),
			("lambda_del_phi", self.lambda_del_phi),
		] {
			if !(value >= 0.0 && value.is_finite()) {
				return Err(SignalError::InvalidConfig(format!(
					"{} must be a non-negative number, got {}",
					name, value
				)));
			}
		}
		if !(self.temperature.stdev.is_finite() && self.temperature.stdev != 0.0) {
			return Err(SignalError::InvalidConfig(format!(
				"temperature stdev {} cannot rescale predictions",
				self.temperature.stdev
			)));
		}
		self.regression.validate()?;

		Ok(GwLoss {
			temperature: self.temperature,
			temp_index: self.temp_index,
			lambda_aux: self.lambda_aux,
			lambda_ar: self.lambda_ar,
			lambda_del_phi: self.lambda_del_phi,
			regression: self.regression.clone(),
			gw_scale: self.gw_scale,
		})
	}
}

/// `rmse(main) + λ₁·rmse(aux) + λ₂·rmse(Ar) + λ₃·rmse(delPhi)` over a combined
/// target of true values, groundwater columns and weights.
#[derive(Debug)]
pub struct GwLoss {
	pub(super) temperature: NormalParam,
	pub(super) temp_index: usize,
	pub(super) lambda_aux: f64,
	pub(super) lambda_ar: f64,
	pub(super) lambda_del_phi: f64,
	pub(super) regression: BatchRegressionConfig,
	pub(super) gw_scale: Option<GwScale>,
}

/// Unweighted terms of one loss evaluation. Groundwater terms are `None` when
/// their weights are zero and the regression was skipped.
#[derive(Clone, Debug)]
pub struct GwLossTerms<B: Backend> {
	pub main: Tensor<B, 1>,
	pub aux: Tensor<B, 1>,
	pub amplitude_ratio: Option<Tensor<B, 1>>,
	pub phase_shift: Option<Tensor<B, 1>>,
}
