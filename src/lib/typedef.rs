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
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Identifier of one stream segment (spatial unit).
pub type SegmentId = u64;

/// Every decimal date, and therefore every stored phase, is relative to this day.
/// Moving it to another time of year changes the phase formula.
pub const REFERENCE_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1980, 10, 1) {
	Some(found) => found,
	None => panic!("invalid reference epoch"),
};

pub const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct NormalParam {
	pub mean: f64,
	pub stdev: f64,
}

impl NormalParam {
	pub fn normalize(&self, value: f64) -> f64 {
		(value - self.mean) / self.stdev
	}

	pub fn denormalize(&self, value: f64) -> f64 {
		(value * self.stdev) + self.mean
	}
}

/// Air, observed water and process-model water temperatures of one segment,
/// aligned to the date index of the owning [`TemperatureFrame`].
#[derive(Default, Clone, Debug, PartialEq)]
pub struct SegmentTemperatures {
	pub seg_id: SegmentId,
	pub air: Vec<Option<f64>>,
	pub water_obs: Vec<Option<f64>>,
	pub water_pbm: Vec<Option<f64>>,
}

/// Daily temperatures of many segments on one shared date index.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct TemperatureFrame {
	pub dates: Vec<NaiveDate>,
	pub segments: Vec<SegmentTemperatures>,
}

impl TemperatureFrame {
	pub fn validate(&self) -> Result<(), SignalError> {
		let dates = self.dates.len();
		for each in &self.segments {
			for values in [each.air.len(), each.water_obs.len(), each.water_pbm.len()] {
				if values != dates {
					return Err(SignalError::LengthMismatch {
						seg_id: each.seg_id,
						dates,
						values,
					});
				}
			}
		}

		Ok(())
	}

	/// Keep the dates within `start..=end` (and the matching values).
	pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> TemperatureFrame {
		let keep = self
			.dates
			.iter()
			.map(|each| *each >= start && *each <= end)
			.collect::<Vec<_>>();

		let pick = |values: &Vec<Option<f64>>| {
			values
				.iter()
				.zip(keep.iter())
				.filter_map(|(value, kept)| kept.then_some(*value))
				.collect::<Vec<_>>()
		};

		TemperatureFrame {
			dates: self
				.dates
				.iter()
				.zip(keep.iter())
				.filter_map(|(date, kept)| kept.then_some(*date))
				.collect(),
			segments: self
				.segments
				.iter()
				.map(|each| SegmentTemperatures {
					seg_id: each.seg_id,
					air: pick(&each.air),
					water_obs: pick(&each.water_obs),
					water_pbm: pick(&each.water_pbm),
				})
				.collect(),
		}
	}
}
