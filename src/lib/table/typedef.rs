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

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::signal::HarmonicFit;
use crate::typedef::SegmentId;

// Thresholds from Hare et al. 2021, "Continental-scale analysis of shallow and
// deep groundwater contributions to streams", Nature Communications 12.

/// Observed water series need more than this many raw values, and at least this
/// many inside the plausible band, to resolve an annual cycle.
pub const MIN_OBS_SAMPLES: usize = 365;
pub const OBS_MIN_TEMP: f64 = 1.0;
pub const OBS_MAX_TEMP: f64 = 60.0;

/// Water varying more than air suggests a data anomaly.
pub const MAX_AMPLITUDE_RATIO: f64 = 1.1;
/// Water leading air by more than this many days suggests a data anomaly. Smaller
/// leads are estimation noise and clamp to zero.
pub const MAX_LEAD_DAYS: f64 = 10.0;

#[derive(Default, PartialEq, Eq, Hash, EnumIter, Display, Deserialize, Serialize, Clone, Copy, Debug)]
pub enum SignalMetric {
	/// Water amplitude over air amplitude (`Ar`)
	#[default]
	#[strum(serialize = "Ar")]
	#[serde(rename = "Ar")]
	AmplitudeRatio,
	/// Water phase minus air phase in days (`delPhi`)
	#[strum(serialize = "delPhi")]
	#[serde(rename = "delPhi")]
	PhaseShift,
}

/// One derived metric of a segment: the filtered observed value with its
/// bounds, and the unfiltered process-model value.
#[derive(Default, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SignalPair {
	pub obs: Option<f64>,
	pub low: Option<f64>,
	pub high: Option<f64>,
	pub pbm: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SegmentSignalRecord {
	pub seg_id: SegmentId,
	pub air: HarmonicFit,
	pub water_obs: HarmonicFit,
	pub water_pbm: HarmonicFit,
	pub amplitude_ratio: SignalPair,
	pub phase_shift: SignalPair,
}

impl SegmentSignalRecord {
	pub fn metric(&self, metric: SignalMetric) -> &SignalPair {
		match metric {
			SignalMetric::AmplitudeRatio => &self.amplitude_ratio,
			SignalMetric::PhaseShift => &self.phase_shift,
		}
	}

	pub fn metric_mut(&mut self, metric: SignalMetric) -> &mut SignalPair {
		match metric {
			SignalMetric::AmplitudeRatio => &mut self.amplitude_ratio,
			SignalMetric::PhaseShift => &mut self.phase_shift,
		}
	}
}

/// Per-segment records in the segment order of the source frame.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct SignalTable {
	pub records: Vec<SegmentSignalRecord>,
}

impl SignalTable {
	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn get(&self, seg_id: SegmentId) -> Option<&SegmentSignalRecord> {
		self.records.iter().find(|each| each.seg_id == seg_id)
	}

	pub fn observed(&self, metric: SignalMetric) -> Vec<Option<f64>> {
		self.records
			.iter()
			.map(|each| each.metric(metric).obs)
			.collect()
	}

	pub fn rows(&self) -> Vec<SignalTableRow> {
		self.records.iter().map(SignalTableRow::from).collect()
	}

	pub fn column_names() -> &'static [&'static str] {
		&SIGNAL_TABLE_COLUMNS
	}
}

/// Flat, exportable view of a [`SegmentSignalRecord`].
#[derive(Default, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SignalTableRow {
	#[serde(rename = "seg_id_nat")]
	pub seg_id: SegmentId,
	pub air_amp: Option<f64>,
	pub air_phi: Option<f64>,
	pub water_amp_obs: Option<f64>,
	pub water_phi_obs: Option<f64>,
	#[serde(rename = "Ar_obs")]
	pub ar_obs: Option<f64>,
	#[serde(rename = "delPhi_obs")]
	pub del_phi_obs: Option<f64>,
	#[serde(rename = "Ar_low_obs")]
	pub ar_low_obs: Option<f64>,
	#[serde(rename = "Ar_high_obs")]
	pub ar_high_obs: Option<f64>,
	#[serde(rename = "delPhi_low_obs")]
	pub del_phi_low_obs: Option<f64>,
	#[serde(rename = "delPhi_high_obs")]
	pub del_phi_high_obs: Option<f64>,
	pub water_amp_pbm: Option<f64>,
	pub water_phi_pbm: Option<f64>,
	#[serde(rename = "Ar_pbm")]
	pub ar_pbm: Option<f64>,
	#[serde(rename = "delPhi_pbm")]
	pub del_phi_pbm: Option<f64>,
}

pub const SIGNAL_TABLE_COLUMNS: [&str; 15] = [
	"seg_id_nat",
	"air_amp",
	"air_phi",
	"water_amp_obs",
	"water_phi_obs",
	"Ar_obs",
	"delPhi_obs",
	"Ar_low_obs",
	"Ar_high_obs",
	"delPhi_low_obs",
	"delPhi_high_obs",
	"water_amp_pbm",
	"water_phi_pbm",
	"Ar_pbm",
	"delPhi_pbm",
];

impl From<&SegmentSignalRecord> for SignalTableRow {
	fn from(record: &SegmentSignalRecord) -> Self {
		Self {
			seg_id: record.seg_id,
			air_amp: record.air.amplitude(),
			air_phi: record.air.phase(),
			water_amp_obs: record.water_obs.amplitude(),
			water_phi_obs: record.water_obs.phase(),
			ar_obs: record.amplitude_ratio.obs,
			del_phi_obs: record.phase_shift.obs,
			ar_low_obs: record.amplitude_ratio.low,
			ar_high_obs: record.amplitude_ratio.high,
			del_phi_low_obs: record.phase_shift.low,
			del_phi_high_obs: record.phase_shift.high,
			water_amp_pbm: record.water_pbm.amplitude(),
			water_phi_pbm: record.water_pbm.phase(),
			ar_pbm: record.amplitude_ratio.pbm,
			del_phi_pbm: record.phase_shift.pbm,
		}
	}
}
