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

use super::typedef::*;
use crate::error::SignalError;

/// `atan` from elementary ops so it differentiates on every backend. Three
/// half-angle steps `atan(z) = 2·atan(z / (1 + sqrt(1 + z²)))` bring `|z|` under
/// `tan(π/16)`, where the odd series to `z¹⁵` is accurate to about 1e-12.
pub fn arctan<B: Backend, const D: usize>(z: Tensor<B, D>) -> Tensor<B, D> {
	let mut reduced = z;
	for _ in 0..3 {
		let denominator = reduced
			.clone()
			.mul(reduced.clone())
			.add_scalar(1.0)
			.sqrt()
			.add_scalar(1.0);
		reduced = reduced.div(denominator);
	}

	let square = reduced.clone().mul(reduced.clone());
	let mut series = square.clone().mul_scalar(-1.0 / 15.0).add_scalar(1.0 / 13.0);
	for k in (0..6).rev() {
		let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
		series = series.mul(square.clone()).add_scalar(sign / (2 * k + 1) as f64);
	}

	reduced.mul(series).mul_scalar(8.0)
}

/// Per-segment value of one column, taken at the first timestep.
pub fn segment_values<B: Backend>(gw: &Tensor<B, 3>, column: GwColumn) -> Tensor<B, 1> {
	let [segments, _, _] = gw.dims();
	let index = column.index();

	gw.clone()
		.slice([0..segments, 0..1, index..index + 1])
		.reshape([segments])
}

impl<B: Backend> GwFeatures<B> {
	/// Split a `[segments, timesteps, 6]` groundwater target into regressors.
	pub fn from_targets(gw: &Tensor<B, 3>) -> Result<Self, SignalError> {
		let [segments, timesteps, columns] = gw.dims();
		if columns != GW_COLUMN_COUNT {
			return Err(SignalError::shape_mismatch(
				format!("[{}, {}, {}]", segments, timesteps, GW_COLUMN_COUNT),
				format!("{:?}", gw.dims()),
			));
		}

		let column = |column: GwColumn| {
			let index = column.index();
			gw.clone()
				.slice([0..segments, 0..timesteps, index..index + 1])
				.reshape([segments, timesteps])
		};

		Ok(Self {
			sin_wt: column(GwColumn::SinWt),
			cos_wt: column(GwColumn::CosWt),
			air_phase: segment_values(gw, GwColumn::AirPhase),
			air_amplitude: segment_values(gw, GwColumn::AirAmplitude),
		})
	}
}

/// Lower bound of the rank floor, for designs that are zero everywhere.
const MIN_SUM_OF_SQUARES: f64 = 1e-30;

/// Row sums of an elementwise product, `[segments, timesteps]` to `[segments, 1]`.
fn dot<B: Backend>(x: &Tensor<B, 2>, y: &Tensor<B, 2>) -> Tensor<B, 2> {
	x.clone().mul(y.clone()).sum_dim(1)
}

/// Coefficients `(α, β)` of `y ~ α·p + β·q` for centred columns, each
/// `[segments, 1]`, by orthogonalizing `q` against `p`. A column whose sum of
/// squares (after projection, for `q`) is below `floor` carries no
/// information and gets a zero coefficient.
fn project_pair<B: Backend>(
	p: &Tensor<B, 2>,
	q: &Tensor<B, 2>,
	y: &Tensor<B, 2>,
	floor: &Tensor<B, 2>,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
	let spp = dot(p, p);
	let spq = dot(p, q);
	let p_absent = spp.clone().lower(floor.clone());
	let spp_safe = spp.mask_where(p_absent.clone(), floor.clone());

	let projection = spq.clone().div(spp_safe.clone()).mask_fill(p_absent.clone(), 0.0);
	let q_perp = q.clone().sub(p.clone().mul(projection));
	let sqq = dot(&q_perp, &q_perp);
	let q_absent = sqq.clone().lower(floor.clone());
	let sqq_safe = sqq.mask_where(q_absent.clone(), floor.clone());

	let beta = dot(&q_perp, y).div(sqq_safe).mask_fill(q_absent, 0.0);
	let alpha = dot(p, y)
		.sub(beta.clone().mul(spq))
		.div(spp_safe)
		.mask_fill(p_absent, 0.0);

	(alpha, beta)
}

/// Least squares of `y = c + a·sin_wt + b·cos_wt` for every segment, returned
/// as `[segments, 3]` (intercept, sine, cosine).
///
/// Centring the regressors per segment splits the intercept off, and the
/// remaining two-column problem is solved by Gram-Schmidt on the design itself
/// rather than through `XᵀX`, so the error grows with `cond(X)` and not its
/// square. The column with the larger spread is the pivot. Columns keeping
/// less than `rank_tolerance` of the raw regressor energy `Σ(sin² + cos²)`
/// count as absent.
pub(super) fn centred_least_squares<B: Backend>(
	temperature: Tensor<B, 2>,
	sin_wt: Tensor<B, 2>,
	cos_wt: Tensor<B, 2>,
	rank_tolerance: f64,
) -> Tensor<B, 2> {
	let floor = dot(&sin_wt, &sin_wt)
		.add(dot(&cos_wt, &cos_wt))
		.mul_scalar(rank_tolerance)
		.clamp_min(MIN_SUM_OF_SQUARES);

	let y_mean = temperature.clone().mean_dim(1);
	let sin_mean = sin_wt.clone().mean_dim(1);
	let cos_mean = cos_wt.clone().mean_dim(1);

	let y = temperature.sub(y_mean.clone());
	let sin = sin_wt.sub(sin_mean.clone());
	let cos = cos_wt.sub(cos_mean.clone());

	let (sine_first, cosine_second) = project_pair(&sin, &cos, &y, &floor);
	let (cosine_first, sine_second) = project_pair(&cos, &sin, &y, &floor);

	let sine_pivot = dot(&sin, &sin).greater_equal(dot(&cos, &cos));
	let sine = sine_second.mask_where(sine_pivot.clone(), sine_first);
	let cosine = cosine_first.mask_where(sine_pivot, cosine_second);

	let intercept = y_mean
		.sub(sine.clone().mul(sin_mean))
		.sub(cosine.clone().mul(cos_mean));

	Tensor::cat(vec![intercept, sine, cosine], 1)
}
