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
use thiserror::Error;

use crate::typedef::SegmentId;

/// Caller-side mistakes. A failed or under-determined fit is not an error, see
/// [`crate::signal::HarmonicFit`].
#[derive(Error, Debug)]
pub enum SignalError {
	#[error("Tensor shape mismatch: expected {expected}, got {actual}")]
	ShapeMismatch { expected: String, actual: String },

	#[error("Segment {seg_id} has {values} values for {dates} dates")]
	LengthMismatch {
		seg_id: SegmentId,
		dates: usize,
		values: usize,
	},

	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("Partition {partition} has no dates between {start} and {end}")]
	EmptyPartition {
		partition: String,
		start: NaiveDate,
		end: NaiveDate,
	},

	#[error("Cannot standardize {0}: the training partition has no spread in it")]
	DegenerateScaling(&'static str),

	#[error("CSV export failed: {0}")]
	Csv(#[from] csv::Error),

	#[error("File access failed: {0}")]
	Io(#[from] std::io::Error),

	#[error("Invalid JSON: {0}")]
	Json(#[from] serde_json::Error),
}

impl SignalError {
	pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
		Self::ShapeMismatch {
			expected: expected.into(),
			actual: actual.into(),
		}
	}
}
