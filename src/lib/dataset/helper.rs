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

use chrono::NaiveDate;

use super::typedef::*;
use crate::error::SignalError;
use crate::regression::GW_COLUMN_COUNT;
use crate::signal::{annual_features, decimal_date};
use crate::table::{SignalMetric, SignalTable};
use crate::typedef::NormalParam;

/// Mean and population standard deviation of the present values.
pub(super) fn nan_mean_std(values: &[Option<f64>]) -> Option<NormalParam> {
	let present = values
		.iter()
		.filter_map(|each| each.filter(|value| value.is_finite()))
		.collect::<Vec<_>>();
	if present.is_empty() {
		return None;
	}

	let count = present.len() as f64;
	let mean = present.iter().sum::<f64>() / count;
	let variance = present.iter().map(|each| (each - mean).powi(2)).sum::<f64>() / count;

	Some(NormalParam {
		mean,
		stdev: variance.sqrt(),
	})
}

pub(super) fn fit_metric_scale(table: &SignalTable, metric: SignalMetric, name: &'static str) -> Result<NormalParam, SignalError> {
	match nan_mean_std(&table.observed(metric)) {
		Some(found) if found.stdev > 0.0 => Ok(found),
		_ => Err(SignalError::DegenerateScaling(name)),
	}
}

/// Fill the `[segments, dates, 6]` grid. Per-segment values repeat on every
/// date; only the sine and cosine columns vary along time.
pub(super) fn build_targets(dates: &[NaiveDate], table: &SignalTable, scale: Option<&GwScale>) -> GwTargets {
	let features = dates
		.iter()
		.map(|date| annual_features(decimal_date(*date)))
		.collect::<Vec<_>>();

	let mut values = Vec::with_capacity(table.len() * dates.len() * GW_COLUMN_COUNT);
	for record in &table.records {
		let mut ratio = record.amplitude_ratio.obs;
		let mut shift = record.phase_shift.obs;
		if let Some(scale) = scale {
			ratio = ratio.map(|each| scale.amplitude_ratio.normalize(each));
			shift = shift.map(|each| scale.phase_shift.normalize(each));
		}

		let ratio = ratio.unwrap_or(f64::NAN);
		let shift = shift.unwrap_or(f64::NAN);
		let air_phase = record.air.phase().unwrap_or(f64::NAN);
		let air_amplitude = record.air.amplitude().unwrap_or(f64::NAN);

		for (sin_wt, cos_wt) in &features {
			values.extend([ratio, shift, air_phase, air_amplitude, *sin_wt, *cos_wt]);
		}
	}

	GwTargets {
		seg_ids: table.records.iter().map(|each| each.seg_id).collect(),
		dates: dates.to_vec(),
		values,
	}
}

/// First day of every full window over `timesteps` days, pass by pass. Pass
/// `i` starts at `⌊i · offset · seq_len⌋` and steps by `seq_len`; trailing
/// days that do not fill a window are left out. Empty for an invalid config.
pub fn window_starts(timesteps: usize, config: &SequenceConfig) -> Vec<usize> {
	if config.validate().is_err() {
		return Vec::new();
	}

	let seq_len = config.seq_len;
	let passes = (1.0 / config.offset).floor() as usize;

	(0..passes)
		.flat_map(move |pass| {
			let first = (pass as f64 * config.offset * seq_len as f64) as usize;
			(first..)
				.step_by(seq_len)
				.take_while(move |start| start + seq_len <= timesteps)
		})
		.collect()
}

/// Cut a row-major `[segments, timesteps, columns]` grid into
/// `[windows · segments, seq_len, columns]`, window-major. Returns the window
/// starts with the cut values. Apply it to the main target, its weights and
/// the groundwater grid alike so [`crate::loss::assemble_loss_targets`] sees
/// matching shapes.
pub fn split_into_sequences(
	values: &[f64],
	shape: [usize; 3],
	config: &SequenceConfig,
) -> Result<(Vec<usize>, Vec<f64>), SignalError> {
	config.validate()?;

	let [segments, timesteps, columns] = shape;
	if segments * timesteps * columns != values.len() {
		return Err(SignalError::shape_mismatch(
			format!("{} values for {:?}", segments * timesteps * columns, shape),
			format!("{} values", values.len()),
		));
	}

	let starts = window_starts(timesteps, config);
	if starts.is_empty() {
		return Err(SignalError::InvalidConfig(format!(
			"sequence length {} exceeds the {} available timesteps",
			config.seq_len, timesteps
		)));
	}

	let window = config.seq_len * columns;
	let mut cut = Vec::with_capacity(starts.len() * segments * window);
	for start in &starts {
		for segment in 0..segments {
			let first = (segment * timesteps + start) * columns;
			cut.extend_from_slice(&values[first..first + window]);
		}
	}

	Ok((starts, cut))
}

impl GwTargets {
	pub fn to_sequences(&self, config: &SequenceConfig) -> Result<GwSequences, SignalError> {
		let (starts, values) = split_into_sequences(&self.values, self.shape(), config)?;

		Ok(GwSequences {
			seg_ids: self.seg_ids.clone(),
			starts,
			seq_len: config.seq_len,
			values,
		})
	}
}
