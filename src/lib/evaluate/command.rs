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

use std::path::Path;

use chrono::NaiveDate;
use rayon::prelude::*;
use strum::IntoEnumIterator;
use tracing::info;

use super::helper::*;
use super::typedef::*;
use crate::dataset::Partition;
use crate::error::SignalError;
use crate::signal::{fit_annual_signal, AnnualSignalConfig};
use crate::table::{phase_to_days, SignalMetric, SignalTable};

/// Annual signal of each predicted water series, fitted like process-model
/// output (water band applied, no observation rules).
pub fn predicted_signal(
	dates: &[NaiveDate],
	predictions: &[PredictionSeries],
	config: &AnnualSignalConfig,
) -> Result<Vec<PredictedSignal>, SignalError> {
	config.validate()?;
	if let Some(bad) = predictions.iter().find(|each| each.water.len() != dates.len()) {
		return Err(SignalError::LengthMismatch {
			seg_id: bad.seg_id,
			dates: dates.len(),
			values: bad.water.len(),
		});
	}

	Ok(predictions
		.par_iter()
		.map(|each| PredictedSignal {
			seg_id: each.seg_id,
			water: fit_annual_signal(dates, &each.water, true, config),
		})
		.collect())
}

/// Join predicted signals onto a partition's table. Predicted ratio and shift
/// are taken against the observed air signal and are not filtered.
pub fn compare_signals(
	partition: Partition,
	table: &SignalTable,
	predicted: &[PredictedSignal],
) -> Vec<SignalComparison> {
	table
		.records
		.iter()
		.map(|record| {
			let water = predicted
				.iter()
				.find(|each| each.seg_id == record.seg_id)
				.and_then(|each| each.water.estimate());
			let air = record.air.estimate();

			let (ar_pred, del_phi_pred) = match (water, air) {
				(Some(water), Some(air)) => (
					Some(water.amplitude / air.amplitude),
					Some(phase_to_days(water.phase, air.phase)),
				),
				_ => (None, None),
			};

			SignalComparison {
				partition,
				seg_id: record.seg_id,
				ar_obs: record.amplitude_ratio.obs,
				ar_low_obs: record.amplitude_ratio.low,
				ar_high_obs: record.amplitude_ratio.high,
				ar_pbm: record.amplitude_ratio.pbm,
				ar_pred,
				del_phi_obs: record.phase_shift.obs,
				del_phi_low_obs: record.phase_shift.low,
				del_phi_high_obs: record.phase_shift.high,
				del_phi_pbm: record.phase_shift.pbm,
				del_phi_pred,
				class: classify(record.amplitude_ratio.obs, record.phase_shift.obs),
			}
		})
		.collect()
}

fn select(row: &SignalComparison, metric: SignalMetric, model: SignalModel) -> (Option<f64>, Option<f64>) {
	match (metric, model) {
		(SignalMetric::AmplitudeRatio, SignalModel::Network) => (row.ar_obs, row.ar_pred),
		(SignalMetric::AmplitudeRatio, SignalModel::ProcessModel) => (row.ar_obs, row.ar_pbm),
		(SignalMetric::PhaseShift, SignalModel::Network) => (row.del_phi_obs, row.del_phi_pred),
		(SignalMetric::PhaseShift, SignalModel::ProcessModel) => (row.del_phi_obs, row.del_phi_pbm),
	}
}

/// Partition order of the skill summary: training, then test, then validation.
pub const SUMMARY_PARTITIONS: [Partition; 3] = [Partition::Train, Partition::Test, Partition::Validation];

/// Score every model on every metric of every partition in `comparisons`.
/// Rows come out grouped by partition in [`SUMMARY_PARTITIONS`] order, then
/// metric, then model.
pub fn summarize_partitions(comparisons: &[SignalComparison]) -> Vec<MetricSummary> {
	let summaries = SUMMARY_PARTITIONS
		.into_iter()
		.flat_map(|partition| {
			SignalMetric::iter().flat_map(move |metric| {
				SignalModel::iter().map(move |model| (partition, metric, model))
			})
		})
		.map(|(partition, metric, model)| {
			let pairs = comparisons
				.iter()
				.filter(|row| row.partition == partition)
				.filter_map(|row| match select(row, metric, model) {
					(Some(obs), Some(value)) if obs.is_finite() && value.is_finite() => Some((obs, value)),
					_ => None,
				})
				.collect::<Vec<_>>();

			let scores = (!pairs.is_empty()).then(|| pair_scores(&pairs));
			MetricSummary {
				partition,
				metric,
				model,
				rmse: scores.as_ref().map(|found| found.rmse),
				nse: scores.as_ref().map(|found| found.nse),
				kge: scores.as_ref().map(|found| found.kge),
				r: scores.as_ref().map(|found| found.r),
				n: pairs.len(),
			}
		})
		.collect::<Vec<_>>();

	info!(rows = summaries.len(), "Summarized groundwater signal skill");
	summaries
}

pub fn write_signal_table(table: &SignalTable, path: &Path) -> Result<(), SignalError> {
	write_rows(path, &table.rows())
}

pub fn write_comparisons(rows: &[SignalComparison], path: &Path) -> Result<(), SignalError> {
	write_rows(path, rows)
}

pub fn write_summary(rows: &[MetricSummary], path: &Path) -> Result<(), SignalError> {
	write_rows(path, rows)
}
