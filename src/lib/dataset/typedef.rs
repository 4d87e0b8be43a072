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

use burn::tensor::{backend::Backend, ElementConversion, Tensor, TensorData};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::error::SignalError;
use crate::regression::GW_COLUMN_COUNT;
use crate::table::SignalTable;
use crate::typedef::{NormalParam, SegmentId};

#[derive(Default, PartialEq, Eq, Hash, EnumIter, Display, Deserialize, Serialize, Clone, Copy, Debug)]
pub enum Partition {
	#[default]
	#[strum(serialize = "trn")]
	#[serde(rename = "trn")]
	Train,
	#[strum(serialize = "val")]
	#[serde(rename = "val")]
	Validation,
	#[strum(serialize = "tst")]
	#[serde(rename = "tst")]
	Test,
}

/// Inclusive on both ends.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DateRange {
	pub start: NaiveDate,
	pub end: NaiveDate,
}

impl DateRange {
	pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
		Self { start, end }
	}

	pub fn contains(&self, date: NaiveDate) -> bool {
		date >= self.start && date <= self.end
	}
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PartitionRanges {
	pub train: DateRange,
	pub validation: DateRange,
	pub test: DateRange,
}

impl PartitionRanges {
	pub fn range(&self, partition: Partition) -> DateRange {
		match partition {
			Partition::Train => self.train,
			Partition::Validation => self.validation,
			Partition::Test => self.test,
		}
	}
}

/// Standardization of the observed groundwater metrics, fitted on the
/// training partition.
#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GwScale {
	pub amplitude_ratio: NormalParam,
	pub phase_shift: NormalParam,
}

impl GwScale {
	/// Persist next to the model weights so inference standardizes the same way.
	pub fn save(&self, path: &Path) -> Result<(), SignalError> {
		std::fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}

	pub fn load(path: &Path) -> Result<Self, SignalError> {
		let text = std::fs::read_to_string(path)?;
		Ok(serde_json::from_str(&text)?)
	}
}

/// Row-major `[segments, timesteps, 6]` grid of groundwater targets, `NaN` for
/// missing values.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct GwTargets {
	pub seg_ids: Vec<SegmentId>,
	pub dates: Vec<NaiveDate>,
	pub values: Vec<f64>,
}

impl GwTargets {
	pub fn shape(&self) -> [usize; 3] {
		[self.seg_ids.len(), self.dates.len(), GW_COLUMN_COUNT]
	}

	pub fn get(&self, segment: usize, step: usize, column: usize) -> f64 {
		let [_, timesteps, columns] = self.shape();
		self.values[(segment * timesteps + step) * columns + column]
	}

	pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Result<Tensor<B, 3>, SignalError> {
		grid_tensor(&self.values, self.shape(), device)
	}
}

/// Fixed-length training windows cut from a daily grid. Each pass starts
/// `offset · seq_len` days later than the previous one, so `offset = 0.5`
/// doubles the windows with half-overlapping sequences.
#[derive(burn::config::Config, Debug)]
pub struct SequenceConfig {
	#[config(default = 365)]
	pub seq_len: usize,
	#[config(default = 1.0)]
	pub offset: f64,
}

impl SequenceConfig {
	pub fn validate(&self) -> Result<(), SignalError> {
		if self.seq_len == 0 {
			return Err(SignalError::InvalidConfig("sequence length must be positive".to_string()));
		}
		if !(self.offset > 0.0 && self.offset <= 1.0) {
			return Err(SignalError::InvalidConfig(format!(
				"sequence offset {} is outside (0, 1]",
				self.offset
			)));
		}

		Ok(())
	}
}

/// Row-major `[windows · segments, seq_len, 6]` groundwater targets. Sample
/// `window · segments + segment` holds `segment` from day `starts[window]`.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct GwSequences {
	pub seg_ids: Vec<SegmentId>,
	pub starts: Vec<usize>,
	pub seq_len: usize,
	pub values: Vec<f64>,
}

impl GwSequences {
	pub fn shape(&self) -> [usize; 3] {
		[self.starts.len() * self.seg_ids.len(), self.seq_len, GW_COLUMN_COUNT]
	}

	pub fn get(&self, sample: usize, step: usize, column: usize) -> f64 {
		self.values[(sample * self.seq_len + step) * GW_COLUMN_COUNT + column]
	}

	pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Result<Tensor<B, 3>, SignalError> {
		grid_tensor(&self.values, self.shape(), device)
	}
}

pub(super) fn grid_tensor<B: Backend>(values: &[f64], shape: [usize; 3], device: &B::Device) -> Result<Tensor<B, 3>, SignalError> {
	if shape.iter().product::<usize>() != values.len() {
		return Err(SignalError::shape_mismatch(
			format!("{} values for {:?}", shape.iter().product::<usize>(), shape),
			format!("{} values", values.len()),
		));
	}

	let values = values
		.iter()
		.map(|each| each.elem::<B::FloatElem>())
		.collect::<Vec<_>>();

	Ok(Tensor::from_data(TensorData::new(values, shape), device))
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreparedPartition {
	pub partition: Partition,
	pub targets: GwTargets,
	/// `targets` cut into windows, when a [`SequenceConfig`] was given.
	pub sequences: Option<GwSequences>,
	/// Unscaled, so reports stay in physical units.
	pub table: SignalTable,
	/// Whether `targets` holds standardized `Ar_obs`/`delPhi_obs`.
	pub scaled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GwDataset {
	pub partitions: Vec<PreparedPartition>,
	pub columns: Vec<String>,
	pub scale: GwScale,
}

impl GwDataset {
	pub fn partition(&self, partition: Partition) -> Option<&PreparedPartition> {
		self.partitions.iter().find(|each| each.partition == partition)
	}
}
