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

use chrono::NaiveDate;
use faer::{linalg::solvers::Solve, Mat};
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::typedef::*;
use crate::typedef::{DAYS_PER_YEAR, REFERENCE_EPOCH};

/// Largest tolerated entry of `XᵀX · (XᵀX)⁻¹ - I` before the system counts as
/// singular.
const INVERSE_RESIDUAL_TOL: f64 = 1e-6;

/// Years elapsed since [`REFERENCE_EPOCH`], counting 365 days per year.
pub fn decimal_date(date: NaiveDate) -> f64 {
	(date - REFERENCE_EPOCH).num_days() as f64 / DAYS_PER_YEAR
}

/// `(sin(2πt), cos(2πt))` for a decimal date `t`.
pub fn annual_features(decimal: f64) -> (f64, f64) {
	(2f64 * PI * decimal).sin_cos()
}

/// `3π/2 - atan(b/a)` for sine coefficient `a` and cosine coefficient `b`.
pub fn phase_of(a: f64, b: f64) -> f64 {
	3f64 * PI / 2f64 - (b / a).atan()
}

/// Least squares of `y = c + a·sin(2πt) + b·cos(2πt)` with Student-t confidence
/// intervals on each coefficient. `rows` holds `(decimal date, value)` pairs and
/// must have at least [`MIN_FIT_SAMPLES`] entries. Returns `None` when the
/// normal equations are singular.
pub(super) fn ordinary_least_squares(rows: &[(f64, f64)], confidence_level: f64) -> Option<OlsFit> {
	let n_data = rows.len();
	if n_data < MIN_FIT_SAMPLES {
		return None;
	}

	let design = rows
		.iter()
		.map(|(t, _)| {
			let (sin_wt, cos_wt) = annual_features(*t);
			[1f64, sin_wt, cos_wt]
		})
		.collect::<Vec<_>>();

	// X'X and X'y
	let mut xtx = Mat::<f64>::zeros(3, 3);
	let mut xty = Mat::<f64>::zeros(3, 1);
	for (row, (_, y)) in design.iter().zip(rows.iter()) {
		for i in 0..3 {
			xty[(i, 0)] += row[i] * y;
			for j in 0..3 {
				xtx[(i, j)] += row[i] * row[j];
			}
		}
	}

	let lu = xtx.as_ref().full_piv_lu();
	let beta = lu.solve(&xty);
	let inverse = lu.solve(&Mat::<f64>::identity(3, 3));

	// Full pivoting never reports failure, so check the inverse explicitly
	let mut worst_residual = 0f64;
	for i in 0..3 {
		for j in 0..3 {
			let mut sum = 0f64;
			for k in 0..3 {
				sum += xtx[(i, k)] * inverse[(k, j)];
			}
			let expected = if i == j { 1f64 } else { 0f64 };
			worst_residual = worst_residual.max((sum - expected).abs());
		}
	}
	if !(worst_residual < INVERSE_RESIDUAL_TOL) {
		return None;
	}

	let coefficients = [beta[(0, 0)], beta[(1, 0)], beta[(2, 0)]];
	if coefficients.iter().any(|each| !each.is_finite()) {
		return None;
	}

	let dof = (n_data - 3) as f64;
	let ssr = design
		.iter()
		.zip(rows.iter())
		.map(|(row, (_, y))| {
			let fitted = row
				.iter()
				.zip(coefficients.iter())
				.map(|(x, c)| x * c)
				.sum::<f64>();
			(y - fitted).powi(2)
		})
		.sum::<f64>();
	let residual_variance = ssr / dof;

	let t_dist = StudentsT::new(0f64, 1f64, dof).ok()?;
	let t_crit = t_dist.inverse_cdf(1f64 - (1f64 - confidence_level) / 2f64);

	let mut lower = [0f64; 3];
	let mut upper = [0f64; 3];
	for i in 0..3 {
		let std_error = (residual_variance * inverse[(i, i)]).max(0f64).sqrt();
		lower[i] = coefficients[i] - t_crit * std_error;
		upper[i] = coefficients[i] + t_crit * std_error;
	}

	Some(OlsFit {
		coefficients,
		lower,
		upper,
	})
}

/// Amplitude and phase of a fit, with bounds from the four corners of the
/// sine/cosine coefficient intervals.
pub(super) fn summarize_fit(fit: &OlsFit) -> SignalEstimate {
	let [_, a, b] = fit.coefficients;
	let a_bounds = [fit.lower[1], fit.upper[1]];
	let b_bounds = [fit.lower[2], fit.upper[2]];

	let a_min = a_bounds[0].abs().min(a_bounds[1].abs());
	let a_max = a_bounds[0].abs().max(a_bounds[1].abs());
	let b_min = b_bounds[0].abs().min(b_bounds[1].abs());
	let b_max = b_bounds[0].abs().max(b_bounds[1].abs());

	let phase_corners = b_bounds
		.iter()
		.flat_map(|b_bound| a_bounds.iter().map(move |a_bound| phase_of(*a_bound, *b_bound)))
		.collect::<Vec<_>>();

	SignalEstimate {
		amplitude: (a * a + b * b).sqrt(),
		phase: phase_of(a, b),
		amplitude_low: (a_min * a_min + b_min * b_min).sqrt(),
		amplitude_high: (a_max * a_max + b_max * b_max).sqrt(),
		phase_low: phase_corners.iter().cloned().fold(f64::INFINITY, f64::min),
		phase_high: phase_corners.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
	}
}
