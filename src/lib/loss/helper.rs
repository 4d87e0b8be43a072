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

//! Skill scores over tensors with `NaN` marking missing observations. Only
//! `y_true` may contain gaps.

use burn::tensor::{backend::Backend, ElementConversion, Tensor};

use crate::masked::{masked_count, masked_deviation, masked_mean, masked_std, pearson_r};

/// Offset added to every deviation in [`sample_avg_nse`] so near-flat samples do
/// not blow the score up.
const SAMPLE_DEVIATION_OFFSET: f64 = 0.1;

/// `y_pred - y_true` at observed positions, zero elsewhere. The filled target
/// keeps `NaN` out of the tape.
fn masked_error<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, D> {
	let missing = y_true.clone().is_nan();
	let filled = y_true.clone().mask_fill(missing.clone(), 0.0);

	y_pred.clone().sub(filled).mask_fill(missing, 0.0)
}

/// Root mean squared error over the observed positions. Exactly zero when
/// nothing is observed.
pub fn rmse<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	let count = masked_count(y_true);
	if count.clone().into_scalar().elem::<f64>() <= 0.0 {
		return Tensor::zeros([1], &y_pred.device());
	}

	let error = masked_error(y_true, y_pred);
	error.clone().mul(error).sum().div(count).sqrt()
}

/// Nash-Sutcliffe efficiency.
pub fn nse<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	let error = masked_error(y_true, y_pred);
	let deviation = masked_deviation(y_true);

	let numerator = error.clone().mul(error).sum();
	let denominator = deviation.clone().mul(deviation).sum();

	numerator.div(denominator).neg().add_scalar(1.0)
}

/// NSE of each sample (first axis) over its timesteps, averaged across samples.
/// Deviations are taken from the mean of the whole batch.
pub fn sample_avg_nse<B: Backend>(y_true: &Tensor<B, 2>, y_pred: &Tensor<B, 2>) -> Tensor<B, 1> {
	let [samples, _] = y_true.dims();
	let error = masked_error(y_true, y_pred);
	let deviation = masked_deviation(y_true).add_scalar(SAMPLE_DEVIATION_OFFSET);

	let numerator = error.clone().mul(error).sum_dim(1);
	let denominator = deviation.clone().mul(deviation).sum_dim(1);

	numerator
		.div(denominator)
		.neg()
		.add_scalar(1.0)
		.sum()
		.div_scalar(samples as f64)
}

/// NSE mapped from `(-inf, 1]` onto `(0, 1]`.
pub fn nnse<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	nse(y_true, y_pred).neg().add_scalar(2.0).recip()
}

pub fn nnse_loss<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	nnse(y_true, y_pred).neg().add_scalar(1.0)
}

pub fn samplewise_nnse_loss<B: Backend>(y_true: &Tensor<B, 2>, y_pred: &Tensor<B, 2>) -> Tensor<B, 1> {
	sample_avg_nse(y_true, y_pred)
		.neg()
		.add_scalar(2.0)
		.recip()
		.neg()
		.add_scalar(1.0)
}

/// Kling-Gupta efficiency from correlation, spread ratio and bias ratio.
pub fn kge<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	let r = pearson_r(y_true, y_pred);
	let spread = masked_std(y_pred).div(masked_std(y_true));
	let bias = masked_mean(y_pred).div(masked_mean(y_true));

	let square = |t: Tensor<B, 1>| t.clone().mul(t);
	let distance = square(r.sub_scalar(1.0))
		.add(square(spread.sub_scalar(1.0)))
		.add(square(bias.sub_scalar(1.0)))
		.sqrt();

	distance.neg().add_scalar(1.0)
}

/// KGE mapped onto `(0, 1]`.
pub fn norm_kge<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	kge(y_true, y_pred).neg().add_scalar(2.0).recip()
}

pub fn kge_norm_loss<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	norm_kge(y_true, y_pred).neg().add_scalar(1.0)
}

pub fn kge_loss<B: Backend, const D: usize>(y_true: &Tensor<B, D>, y_pred: &Tensor<B, D>) -> Tensor<B, 1> {
	kge(y_true, y_pred).neg()
}
