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

use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use super::helper::*;
use super::typedef::*;
use crate::error::SignalError;
use crate::signal::AnnualSignalConfig;
use crate::table::{build_signal_table, SignalMetric, SignalTable};
use crate::typedef::TemperatureFrame;

/// Split `frame` into its partitions, build a signal table for each, and lay
/// the groundwater targets out per segment and date. The training targets are
/// standardized with the training mean and population standard deviation; the
/// other partitions keep physical units. With `sequences`, every grid is also
/// cut into windows in the layout of [`split_into_sequences`].
pub fn prepare_annual_signal_data(
	frame: &TemperatureFrame,
	ranges: &PartitionRanges,
	config: &AnnualSignalConfig,
	sequences: Option<&SequenceConfig>,
) -> Result<GwDataset, SignalError> {
	frame.validate()?;
	config.validate()?;
	if let Some(sequences) = sequences {
		sequences.validate()?;
	}

	let mut tables = Vec::<(Partition, TemperatureFrame, SignalTable)>::new();
	for partition in Partition::iter() {
		let range = ranges.range(partition);
		let sliced = frame.slice_dates(range.start, range.end);
		if sliced.dates.is_empty() {
			return Err(SignalError::EmptyPartition {
				partition: partition.to_string(),
				start: range.start,
				end: range.end,
			});
		}

		let table = build_signal_table(&sliced, config)?;
		let observed = table
			.observed(SignalMetric::AmplitudeRatio)
			.iter()
			.filter(|each| each.is_some())
			.count();
		if observed == 0 {
			warn!(%partition, "No segment has an observed groundwater signal");
		}
		debug!(%partition, dates = sliced.dates.len(), observed, "Partition signal table ready");

		tables.push((partition, sliced, table));
	}

	let train = tables
		.iter()
		.find(|(partition, _, _)| *partition == Partition::Train)
		.map(|(_, _, table)| table)
		.ok_or(SignalError::DegenerateScaling("Ar_obs"))?;
	let scale = GwScale {
		amplitude_ratio: fit_metric_scale(train, SignalMetric::AmplitudeRatio, "Ar_obs")?,
		phase_shift: fit_metric_scale(train, SignalMetric::PhaseShift, "delPhi_obs")?,
	};
	info!(
		ar_mean = scale.amplitude_ratio.mean,
		ar_std = scale.amplitude_ratio.stdev,
		del_phi_mean = scale.phase_shift.mean,
		del_phi_std = scale.phase_shift.stdev,
		"Fitted groundwater target scale"
	);

	let partitions = tables
		.into_iter()
		.map(|(partition, sliced, table)| {
			let scaled = partition == Partition::Train;
			let targets = build_targets(&sliced.dates, &table, scaled.then_some(&scale));
			let windows = sequences
				.map(|config| targets.to_sequences(config))
				.transpose()?;
			if let Some(windows) = &windows {
				debug!(%partition, samples = windows.shape()[0], "Partition targets windowed");
			}

			Ok::<_, SignalError>(PreparedPartition {
				partition,
				targets,
				sequences: windows,
				table,
				scaled,
			})
		})
		.collect::<Result<Vec<_>, _>>()?;

	Ok(GwDataset {
		partitions,
		columns: SignalTable::column_names()
			.iter()
			.map(|each| each.to_string())
			.collect(),
		scale,
	})
}
