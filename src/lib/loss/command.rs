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

use super::helper::*;
use super::typedef::*;
use crate::error::SignalError;
use crate::regression::{batched_annual_signal, segment_values, GwColumn, GwFeatures, GW_COLUMN_COUNT};
use crate::typedef::NormalParam;

fn standardize<B: Backend>(values: Tensor<B, 1>, param: &NormalParam) -> Tensor<B, 1> {
	values.sub_scalar(param.mean).div_scalar(param.stdev)
}

fn check_prediction<B: Backend>(data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>, channel: usize) -> Result<(), SignalError> {
	let [segments, timesteps, columns] = data.dims();
	let [pred_segments, pred_timesteps, channels] = y_pred.dims();

	if columns < 2 * N_VARS {
		return Err(SignalError::shape_mismatch(
			format!("at least {} target columns", 2 * N_VARS),
			format!("{:?}", data.dims()),
		));
	}
	if pred_segments != segments || pred_timesteps != timesteps || channel >= channels {
		return Err(SignalError::shape_mismatch(
			format!("[{}, {}, >{}]", segments, timesteps, channel),
			format!("{:?}", y_pred.dims()),
		));
	}

	Ok(())
}

/// True values, predictions and weights of one variable, each `[segments,
/// timesteps]`. True values whose weight is zero become `NaN` so no metric
/// counts them.
pub fn y_data_components<B: Backend>(
	data: &Tensor<B, 3>,
	y_pred: &Tensor<B, 3>,
	var_idx: usize,
) -> Result<(Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>), SignalError> {
	if var_idx >= N_VARS {
		return Err(SignalError::InvalidConfig(format!(
			"variable index {} is outside 0..{}",
			var_idx, N_VARS
		)));
	}
	check_prediction(data, y_pred, var_idx)?;

	let [segments, timesteps, columns] = data.dims();
	let weight_idx = columns - N_VARS + var_idx;

	let weights = data
		.clone()
		.slice([0..segments, 0..timesteps, weight_idx..weight_idx + 1])
		.reshape([segments, timesteps]);
	let y_true = data
		.clone()
		.slice([0..segments, 0..timesteps, var_idx..var_idx + 1])
		.reshape([segments, timesteps])
		.mask_fill(weights.clone().equal_elem(0.0), f64::NAN);
	let y_pred = y_pred
		.clone()
		.slice([0..segments, 0..timesteps, var_idx..var_idx + 1])
		.reshape([segments, timesteps]);

	Ok((y_true, y_pred, weights))
}

pub fn rmse_masked_one_var<B: Backend>(data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>, var_idx: usize) -> Result<Tensor<B, 1>, SignalError> {
	let (y_true, y_pred, _) = y_data_components(data, y_pred, var_idx)?;
	Ok(rmse(&y_true, &y_pred))
}

pub fn nnse_masked_one_var<B: Backend>(data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>, var_idx: usize) -> Result<Tensor<B, 1>, SignalError> {
	let (y_true, y_pred, _) = y_data_components(data, y_pred, var_idx)?;
	Ok(nnse_loss(&y_true, &y_pred))
}

pub fn nnse_one_var_samplewise<B: Backend>(data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>, var_idx: usize) -> Result<Tensor<B, 1>, SignalError> {
	let (y_true, y_pred, _) = y_data_components(data, y_pred, var_idx)?;
	Ok(samplewise_nnse_loss(&y_true, &y_pred))
}

pub fn kge_loss_one_var<B: Backend>(data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>, var_idx: usize) -> Result<Tensor<B, 1>, SignalError> {
	let (y_true, y_pred, _) = y_data_components(data, y_pred, var_idx)?;
	Ok(kge_loss(&y_true, &y_pred))
}

/// `rmse(main) + lambda_aux·rmse(aux)`. Needs no groundwater columns.
pub fn weighted_rmse<B: Backend>(data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>, lambda_aux: f64) -> Result<Tensor<B, 1>, SignalError> {
	let main = rmse_masked_one_var(data, y_pred, 0)?;
	let aux = rmse_masked_one_var(data, y_pred, 1)?;

	Ok(main.add(aux.mul_scalar(lambda_aux)))
}

/// Concatenate true values `[S, T, 2]`, groundwater columns `[S, T, 6]` and
/// weights `[S, T, 2]` into the target a [`GwLoss`] expects.
pub fn assemble_loss_targets<B: Backend>(
	y_true: Tensor<B, 3>,
	gw: Tensor<B, 3>,
	weights: Tensor<B, 3>,
) -> Result<Tensor<B, 3>, SignalError> {
	let [segments, timesteps, vars] = y_true.dims();
	let expected = [
		[segments, timesteps, N_VARS],
		[segments, timesteps, GW_COLUMN_COUNT],
		[segments, timesteps, N_VARS],
	];
	let actual = [y_true.dims(), gw.dims(), weights.dims()];
	if vars != N_VARS || expected != actual {
		return Err(SignalError::shape_mismatch(format!("{:?}", expected), format!("{:?}", actual)));
	}

	Ok(Tensor::cat(vec![y_true, gw, weights], 2))
}

impl GwLoss {
	/// The groundwater slice of a combined target.
	fn gw_columns<B: Backend>(&self, data: &Tensor<B, 3>) -> Result<Tensor<B, 3>, SignalError> {
		let [segments, timesteps, columns] = data.dims();
		if columns != 2 * N_VARS + GW_COLUMN_COUNT {
			return Err(SignalError::shape_mismatch(
				format!("[{}, {}, {}]", segments, timesteps, 2 * N_VARS + GW_COLUMN_COUNT),
				format!("{:?}", data.dims()),
			));
		}

		Ok(data
			.clone()
			.slice([0..segments, 0..timesteps, N_VARS..N_VARS + GW_COLUMN_COUNT]))
	}

	pub fn terms<B: Backend>(&self, data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>) -> Result<GwLossTerms<B>, SignalError> {
		let main = rmse_masked_one_var(data, y_pred, 0)?;
		let aux = rmse_masked_one_var(data, y_pred, 1)?;

		if self.lambda_ar == 0.0 && self.lambda_del_phi == 0.0 {
			return Ok(GwLossTerms {
				main,
				aux,
				amplitude_ratio: None,
				phase_shift: None,
			});
		}

		check_prediction(data, y_pred, self.temp_index)?;
		let gw = self.gw_columns(data)?;
		let [segments, timesteps, _] = y_pred.dims();

		let temperature = y_pred
			.clone()
			.slice([0..segments, 0..timesteps, self.temp_index..self.temp_index + 1])
			.mul_scalar(self.temperature.stdev)
			.add_scalar(self.temperature.mean);
		let features = GwFeatures::from_targets(&gw)?;
		let signal = batched_annual_signal(temperature, &features, &self.regression)?;

		let ratio_obs = segment_values(&gw, GwColumn::AmplitudeRatio);
		let shift_obs = segment_values(&gw, GwColumn::PhaseShift).mask_fill(signal.degenerate.clone(), f64::NAN);

		let (ratio_pred, shift_pred) = match &self.gw_scale {
			Some(scale) => (
				standardize(signal.amplitude_ratio, &scale.amplitude_ratio),
				standardize(signal.phase_shift, &scale.phase_shift),
			),
			None => (signal.amplitude_ratio, signal.phase_shift),
		};

		Ok(GwLossTerms {
			main,
			aux,
			amplitude_ratio: Some(rmse(&ratio_obs, &ratio_pred)),
			phase_shift: Some(rmse(&shift_obs, &shift_pred)),
		})
	}

	/// Composite loss as a one-element tensor on the caller's tape.
	pub fn forward<B: Backend>(&self, data: &Tensor<B, 3>, y_pred: &Tensor<B, 3>) -> Result<Tensor<B, 1>, SignalError> {
		let terms = self.terms(data, y_pred)?;

		let mut total = terms.main.add(terms.aux.mul_scalar(self.lambda_aux));
		if let Some(ratio) = terms.amplitude_ratio {
			total = total.add(ratio.mul_scalar(self.lambda_ar));
		}
		if let Some(shift) = terms.phase_shift {
			total = total.add(shift.mul_scalar(self.lambda_del_phi));
		}

		Ok(total)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dataset::GwScale;
	use crate::regression::BatchRegressionConfig;
	use burn::backend::ndarray::{NdArray, NdArrayDevice};
	use burn::backend::Autodiff;
	use burn::tensor::{ElementConversion, TensorData};
	use std::f64::consts::PI;

	type TestBackend = NdArray<f64>;
	type TestAutodiffBackend = Autodiff<TestBackend>;

	const TOL: f64 = 1e-9;
	const TEMPERATURE: NormalParam = NormalParam {
		mean: 12.0,
		stdev: 5.0,
	};

	fn tensor<B: Backend, const D: usize>(values: Vec<f64>, shape: [usize; D]) -> Tensor<B, D> {
		Tensor::from_data(TensorData::new(values, shape), &Default::default())
	}

	fn scalar<B: Backend>(value: Tensor<B, 1>) -> f64 {
		value.into_scalar().elem::<f64>()
	}

	fn decimal(step: usize) -> f64 {
		step as f64 / 365.0
	}

	/// Two segments over two years. Water is `12 + 5·sin(2π(t - lag))`, air has
	/// amplitude 10 and phase 3π/2, so the fitted Ar is 0.5 and delPhi equals the
	/// lag. `observed` sets the per-segment (Ar_obs, delPhi_obs) targets. The
	/// main target sits 0.2 above the normalized prediction.
	fn combined_fixture<B: Backend>(
		lags: [f64; 2],
		observed: [(f64, f64); 2],
		weights: f64,
	) -> (Tensor<B, 3>, Tensor<B, 3>) {
		let timesteps = 730;
		let mut data = Vec::new();
		let mut pred = Vec::new();

		for (lag, (ratio_obs, shift_obs)) in lags.iter().zip(observed.iter()) {
			for step in 0..timesteps {
				let t = decimal(step);
				let water = 12.0 + 5.0 * (2.0 * PI * (t - lag / 365.0)).sin();
				let aux = 0.3 * (step as f64 / 50.0).cos();
				let (sin, cos) = (2.0 * PI * t).sin_cos();

				data.extend([TEMPERATURE.normalize(water) + 0.2, aux, *ratio_obs, *shift_obs, 3.0 * PI / 2.0, 10.0, sin, cos, weights, weights]);
				pred.extend([TEMPERATURE.normalize(water), aux - 0.1]);
			}
		}

		(
			tensor(data, [2, timesteps, 2 * N_VARS + GW_COLUMN_COUNT]),
			tensor(pred, [2, timesteps, 2]),
		)
	}

	#[test]
	fn test_rmse_of_nothing_is_zero() {
		let y_true = tensor::<TestBackend, 1>(vec![f64::NAN; 4], [4]);
		let y_pred = tensor::<TestBackend, 1>(vec![1.0, 2.0, 3.0, 4.0], [4]);

		assert_eq!(scalar(rmse(&y_true, &y_pred)), 0.0);
	}

	#[test]
	fn test_rmse_skips_missing() {
		let y_true = tensor::<TestBackend, 1>(vec![1.0, f64::NAN, 3.0], [3]);
		let y_pred = tensor::<TestBackend, 1>(vec![2.0, 100.0, 3.0], [3]);

		assert!((scalar(rmse(&y_true, &y_pred)) - 0.5f64.sqrt()).abs() < TOL);
	}

	#[test]
	fn test_perfect_scores() {
		let y = tensor::<TestBackend, 2>(vec![1.0, 4.0, 2.0, f64::NAN, 5.0, 3.0], [2, 3]);
		let filled = tensor::<TestBackend, 2>(vec![1.0, 4.0, 2.0, 9.0, 5.0, 3.0], [2, 3]);

		assert!((scalar(nse(&y, &filled)) - 1.0).abs() < TOL);
		assert!((scalar(nnse(&y, &filled)) - 1.0).abs() < TOL);
		assert!(scalar(nnse_loss(&y, &filled)).abs() < TOL);

		// KGE statistics of the prediction include every position
		let complete = tensor::<TestBackend, 2>(vec![1.0, 4.0, 2.0, 7.0, 5.0, 3.0], [2, 3]);
		assert!((scalar(kge(&complete, &complete)) - 1.0).abs() < TOL);
		assert!((scalar(norm_kge(&complete, &complete)) - 1.0).abs() < TOL);
		assert!(scalar(kge_norm_loss(&complete, &complete)).abs() < TOL);
		assert!((scalar(kge_loss(&complete, &complete)) + 1.0).abs() < TOL);
	}

	#[test]
	fn test_kge_of_biased_prediction() {
		let y_true = tensor::<TestBackend, 1>(vec![1.0, 2.0, 3.0, 4.0], [4]);
		let y_pred = y_true.clone().mul_scalar(2.0);

		// r = 1, spread ratio 2, bias ratio 2
		let expected = 1.0 - 2f64.sqrt();
		assert!((scalar(kge(&y_true, &y_pred)) - expected).abs() < TOL);
	}

	#[test]
	fn test_sample_avg_nse() {
		let y_true = tensor::<TestBackend, 2>(vec![1.0, 2.0, 3.0, 2.0, 4.0, f64::NAN], [2, 3]);
		let y_pred = tensor::<TestBackend, 2>(vec![1.0, 2.0, 4.0, 2.0, 5.0, 0.0], [2, 3]);

		// Batch mean 2.4, deviations offset by 0.1 including the gap
		let first = 1.0 - 1.0 / (1.3f64.powi(2) + 0.3f64.powi(2) + 0.7f64.powi(2));
		let second = 1.0 - 1.0 / (0.3f64.powi(2) + 1.7f64.powi(2) + 0.1f64.powi(2));
		let expected = (first + second) / 2.0;

		assert!((scalar(sample_avg_nse(&y_true, &y_pred)) - expected).abs() < TOL);
		let expected_loss = 1.0 - 1.0 / (2.0 - expected);
		assert!((scalar(samplewise_nnse_loss(&y_true, &y_pred)) - expected_loss).abs() < TOL);
	}

	#[test]
	fn test_zero_weight_excludes_observation() {
		// [1, 2, 2] layout: true main/aux, then weights
		let data = tensor::<TestBackend, 3>(
			vec![1.0, 5.0, 1.0, 1.0, 2.0, 6.0, 0.0, 1.0, 3.0, 7.0, 1.0, 0.0],
			[1, 3, 4],
		);
		let y_pred = tensor::<TestBackend, 3>(vec![2.0, 5.0, 50.0, 6.0, 3.0, 70.0], [1, 3, 2]);

		let (y_true, _, weights) = y_data_components(&data, &y_pred, 0).unwrap();
		let y_true = y_true.into_data().iter::<f64>().collect::<Vec<_>>();
		assert_eq!(y_true[0], 1.0);
		assert!(y_true[1].is_nan());
		assert_eq!(weights.into_data().iter::<f64>().collect::<Vec<_>>(), vec![1.0, 0.0, 1.0]);

		// Only the first main value is off, by 1, out of two counted
		let main = scalar(rmse_masked_one_var(&data, &y_pred, 0).unwrap());
		assert!((main - 0.5f64.sqrt()).abs() < TOL);
		let aux = scalar(rmse_masked_one_var(&data, &y_pred, 1).unwrap());
		assert!(aux.abs() < TOL);

		let total = scalar(weighted_rmse(&data, &y_pred, 0.5).unwrap());
		assert!((total - main).abs() < TOL);

		assert!(y_data_components(&data, &y_pred, 2).is_err());
	}

	#[test]
	fn test_regression_skipped_without_gw_weights() {
		let data = tensor::<TestBackend, 3>(vec![1.0, 5.0, 1.0, 1.0], [1, 1, 4]);
		let y_pred = tensor::<TestBackend, 3>(vec![2.0, 7.0], [1, 1, 2]);

		let loss = GwLossConfig::new(TEMPERATURE).init().unwrap();
		let terms = loss.terms(&data, &y_pred).unwrap();
		assert!(terms.amplitude_ratio.is_none());
		assert!((scalar(loss.forward(&data, &y_pred).unwrap()) - 2.0).abs() < TOL);

		let with_gw = GwLossConfig::new(TEMPERATURE).with_lambda_ar(1.0).init().unwrap();
		assert!(matches!(
			with_gw.forward(&data, &y_pred),
			Err(SignalError::ShapeMismatch { .. })
		));
	}

	#[test]
	fn test_negative_lambda_is_rejected() {
		assert!(GwLossConfig::new(TEMPERATURE).with_lambda_aux(-0.1).init().is_err());
		assert!(GwLossConfig::new(TEMPERATURE).with_lambda_del_phi(f64::NAN).init().is_err());
		assert!(GwLossConfig::new(NormalParam { mean: 0.0, stdev: 0.0 }).init().is_err());
	}

	#[test]
	fn test_init_keeps_regression_config() {
		let regression = BatchRegressionConfig::new()
			.with_rank_tolerance(1e-8)
			.with_amplitude_floor(1e-3);
		let loss = GwLossConfig::new(TEMPERATURE)
			.with_regression(regression)
			.init()
			.unwrap();

		assert_eq!(loss.regression.rank_tolerance, 1e-8);
		assert_eq!(loss.regression.amplitude_floor, 1e-3);

		let rejected = BatchRegressionConfig::new().with_rank_tolerance(0.0);
		assert!(GwLossConfig::new(TEMPERATURE).with_regression(rejected).init().is_err());
	}

	#[test]
	fn test_composite_equals_weighted_terms() {
		let (data, y_pred) = combined_fixture::<TestBackend>([20.0, 35.0], [(0.4, 25.0), (f64::NAN, f64::NAN)], 1.0);
		let loss = GwLossConfig::new(TEMPERATURE)
			.with_lambda_aux(0.5)
			.with_lambda_ar(0.3)
			.with_lambda_del_phi(0.2)
			.init()
			.unwrap();

		let terms = loss.terms(&data, &y_pred).unwrap();
		let main = scalar(terms.main);
		let aux = scalar(terms.aux);
		let ratio = scalar(terms.amplitude_ratio.unwrap());
		let shift = scalar(terms.phase_shift.unwrap());

		assert!((main - 0.2).abs() < 1e-9, "Main rmse {}", main);
		assert!((aux - 0.1).abs() < 1e-9, "Aux rmse {}", aux);
		// Only the first segment is observed: |0.5 - 0.4| and |20 - 25|
		assert!((ratio - 0.1).abs() < 1e-5, "Ar rmse {}", ratio);
		assert!((shift - 5.0).abs() < 1e-3, "delPhi rmse {}", shift);

		let total = scalar(loss.forward(&data, &y_pred).unwrap());
		let expected = main + 0.5 * aux + 0.3 * ratio + 0.2 * shift;
		assert!((total - expected).abs() < TOL, "Total {} vs {}", total, expected);
	}

	#[test]
	fn test_scaled_targets_compare_scaled_predictions() {
		let scale = GwScale {
			amplitude_ratio: NormalParam { mean: 0.45, stdev: 0.1 },
			phase_shift: NormalParam { mean: 15.0, stdev: 5.0 },
		};
		// Targets standardized the same way: Ar 0.4 -> -0.5, delPhi 25 -> 2
		let (data, y_pred) = combined_fixture::<TestBackend>([20.0, 20.0], [(-0.5, 2.0), (-0.5, 2.0)], 1.0);
		let loss = GwLossConfig::new(TEMPERATURE)
			.with_lambda_ar(1.0)
			.with_lambda_del_phi(1.0)
			.with_gw_scale(Some(scale))
			.init()
			.unwrap();

		let terms = loss.terms(&data, &y_pred).unwrap();
		// Prediction Ar 0.5 -> 0.5, delPhi 20 -> 1
		assert!((scalar(terms.amplitude_ratio.unwrap()) - 1.0).abs() < 1e-4);
		assert!((scalar(terms.phase_shift.unwrap()) - 1.0).abs() < 1e-3);
	}

	#[test]
	fn test_gradients_are_finite() {
		let (data, y_pred) = combined_fixture::<TestAutodiffBackend>([20.0, 5.0], [(0.4, 25.0), (0.9, f64::NAN)], 1.0);
		let loss = GwLossConfig::new(TEMPERATURE)
			.with_lambda_ar(0.5)
			.with_lambda_del_phi(0.5)
			.init()
			.unwrap();

		let y_pred = y_pred.require_grad();
		let grads = loss.forward(&data, &y_pred).unwrap().backward();
		let grad = y_pred.grad(&grads).expect("prediction should have a gradient");
		assert!(grad.into_data().iter::<f64>().all(|each| each.is_finite()));
	}

	#[test]
	fn test_constant_prediction_gradients_are_finite() {
		let (data, _) = combined_fixture::<TestAutodiffBackend>([20.0, 5.0], [(0.4, 25.0), (0.9, 3.0)], 1.0);
		let y_pred = Tensor::<TestAutodiffBackend, 3>::zeros([2, 730, 2], &NdArrayDevice::Cpu).require_grad();
		let loss = GwLossConfig::new(TEMPERATURE)
			.with_lambda_ar(1.0)
			.with_lambda_del_phi(1.0)
			.init()
			.unwrap();

		let terms = loss.terms(&data, &y_pred).unwrap();
		// Flat predictions carry no phase, so the delPhi term has nothing to count
		assert_eq!(scalar(terms.phase_shift.unwrap()), 0.0);

		let grads = loss.forward(&data, &y_pred).unwrap().backward();
		let grad = y_pred.grad(&grads).expect("prediction should have a gradient");
		assert!(grad.into_data().iter::<f64>().all(|each| each.is_finite()));
	}

	#[test]
	fn test_assemble_loss_targets() {
		let y_true = Tensor::<TestBackend, 3>::ones([2, 3, 2], &NdArrayDevice::Cpu);
		let gw = Tensor::<TestBackend, 3>::zeros([2, 3, 6], &NdArrayDevice::Cpu);
		let weights = Tensor::<TestBackend, 3>::ones([2, 3, 2], &NdArrayDevice::Cpu).mul_scalar(0.5);

		let data = assemble_loss_targets(y_true.clone(), gw.clone(), weights.clone()).unwrap();
		assert_eq!(data.dims(), [2, 3, 10]);
		let row = data
			.slice([0..1, 0..1, 0..10])
			.into_data()
			.iter::<f64>()
			.collect::<Vec<_>>();
		assert_eq!(row, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5]);

		assert!(assemble_loss_targets(y_true, gw.slice([0..2, 0..3, 0..5]), weights).is_err());
	}
}
