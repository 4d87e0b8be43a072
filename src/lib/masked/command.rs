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

//! Statistics over tensors where `NaN` marks a missing value. Missing positions
//! are skipped without changing the tensor shape. Every reduction returns a
//! one-element tensor so it stays on the autodiff tape.

use burn::tensor::{backend::Backend, Tensor};

/// Number of non-missing values.
pub fn masked_count<B: Backend, const D: usize>(y: &Tensor<B, D>) -> Tensor<B, 1> {
	y.clone().is_nan().bool_not().float().sum()
}

/// Mean of the non-missing values. `NaN` when every value is missing.
pub fn masked_mean<B: Backend, const D: usize>(y: &Tensor<B, D>) -> Tensor<B, 1> {
	let missing = y.clone().is_nan();
	let total = y.clone().mask_fill(missing, 0.0).sum();

	total.div(masked_count(y))
}

/// `y - mean(y)` at present positions and exactly zero at missing ones, so sums
/// over the result ignore the gaps.
pub fn masked_deviation<B: Backend, const D: usize>(y: &Tensor<B, D>) -> Tensor<B, D> {
	let mean = masked_mean(y).reshape([1usize; D]);
	let missing = y.clone().is_nan();

	y.clone().sub(mean).mask_fill(missing, 0.0)
}

/// Sample standard deviation (`n - 1` denominator).
pub fn masked_std<B: Backend, const D: usize>(y: &Tensor<B, D>) -> Tensor<B, 1> {
	let deviation = masked_deviation(y);
	let numerator = deviation.clone().mul(deviation).sum();
	let denominator = masked_count(y).sub_scalar(1.0);

	numerator.div(denominator).sqrt()
}

/// Pearson correlation. Each side is centred on its own masked mean, so both
/// should share the same missing positions. `NaN` when either side has zero
/// variance.
pub fn pearson_r<B: Backend, const D: usize>(a: &Tensor<B, D>, b: &Tensor<B, D>) -> Tensor<B, 1> {
	let a_dev = masked_deviation(a);
	let b_dev = masked_deviation(b);

	let numerator = a_dev.clone().mul(b_dev.clone()).sum();
	let ss_a = a_dev.clone().mul(a_dev).sum();
	let ss_b = b_dev.clone().mul(b_dev).sum();

	numerator.div(ss_a.mul(ss_b).sqrt())
}
