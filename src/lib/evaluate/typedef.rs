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

use crate::dataset::Partition;
use crate::signal::HarmonicFit;
use crate::typedef::SegmentId;

/// Water temperature predicted by the network for one segment, aligned to a
/// shared date index.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct PredictionSeries {
	pub seg_id: SegmentId,
	pub water: Vec<Option<f64>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PredictedSignal {
	pub seg_id: SegmentId,
	pub water: HarmonicFit,
}

/// Dominant thermal driver of a segment, after Hare et al. 2021.
#[derive(PartialEq, Eq, Hash, EnumIter, Display, Deserialize, Serialize, Clone, Copy, Debug)]
pub enum GroundwaterClass {
	#[strum(serialize = "shallow")]
	#[serde(rename = "shallow")]
	Shallow,
	#[strum(serialize = "deep")]
	#[serde(rename = "deep")]
	Deep,
	#[strum(serialize = "atm")]
	#[serde(rename = "atm")]
	Atmosphere,
}

/// Source of the values compared against observations.
#[derive(PartialEq, Eq, Hash, EnumIter, Display, Deserialize, Serialize, Clone, Copy, Debug)]
pub enum SignalModel {
	/// The trained network
	#[strum(serialize = "RGCN")]
	#[serde(rename = "RGCN")]
	Network,
	/// The process-based model
	#[strum(serialize = "SNTemp")]
	#[serde(rename = "SNTemp")]
	ProcessModel,
}

/// Observed, process-model and predicted signal of one segment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SignalComparison {
	pub partition: Partition,
	#[serde(rename = "seg_id_nat")]
	pub seg_id: SegmentId,
	#[serde(rename = "Ar_obs")]
	pub ar_obs: Option<f64>,
	#[serde(rename = "Ar_low_obs")]
	pub ar_low_obs: Option<f64>,
	#[serde(rename = "Ar_high_obs")]
	pub ar_high_obs: Option<f64>,
	#[serde(rename = "Ar_pbm")]
	pub ar_pbm: Option<f64>,
	#[serde(rename = "Ar_pred")]
	pub ar_pred: Option<f64>,
	#[serde(rename = "delPhi_obs")]
	pub del_phi_obs: Option<f64>,
	#[serde(rename = "delPhi_low_obs")]
	pub del_phi_low_obs: Option<f64>,
	#[serde(rename = "delPhi_high_obs")]
	pub del_phi_high_obs: Option<f64>,
	#[serde(rename = "delPhi_pbm")]
	pub del_phi_pbm: Option<f64>,
	#[serde(rename = "delPhi_pred")]
	pub del_phi_pred: Option<f64>,
	#[serde(rename = "type")]
	pub class: Option<GroundwaterClass>,
}

/// Skill of one model on one metric within one partition, over the segments
/// where both sides are present. Scores are `None` without any such segment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MetricSummary {
	pub partition: Partition,
	pub metric: crate::table::SignalMetric,
	pub model: SignalModel,
	pub rmse: Option<f64>,
	pub nse: Option<f64>,
	pub kge: Option<f64>,
	pub r: Option<f64>,
	pub n: usize,
}
