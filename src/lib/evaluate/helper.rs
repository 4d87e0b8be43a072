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

use burn::{
	backend::{ndarray::NdArrayDevice, NdArray},
	tensor::{ElementConversion, Tensor, TensorData},
};
use serde::Serialize;
use tracing::debug;

use super::typedef::*;
use crate::error::SignalError;
use crate::loss::{kge, nse, rmse};
use crate::masked::pearson_r;

/// Delays of at least this many days point to shallow groundwater.
pub const SHALLOW_MIN_LAG_DAYS: f64 = 10.0;
/// Damping below this ratio, at short delays, points to deep groundwater.
pub const DEEP_MAX_AMPLITUDE_RATIO: f64 = 0.65;

/// `None` unless both observed values are present. The deep rule is applied
/// after the shallow one, so it wins at exactly 10 days.
pub fn classify(amplitude_ratio: Option<f64>, phase_shift: Option<f64>) -> Option<GroundwaterClass> {
	let (ratio, shift) = (amplitude_ratio?, phase_shift?);

	let mut class = GroundwaterClass::Atmosphere;
	if shift >= SHALLOW_MIN_LAG_DAYS {
		class = GroundwaterClass::Shallow;
	}
	if shift <= SHALLOW_MIN_LAG_DAYS && ratio < DEEP_MAX_AMPLITUDE_RATIO {
		class = GroundwaterClass::Deep;
	}

	Some(class)
}

pub(super) struct PairScores {
	pub rmse: f64,
	pub nse: f64,
	pub kge: f64,
	pub r: f64,
}

/// Scores of complete `(observed, modelled)` pairs, computed on the CPU.
pub(super) fn pair_scores(pairs: &[(f64, f64)]) -> PairScores {
	let device = NdArrayDevice::Cpu;
	let to_tensor = |values: Vec<f64>| {
		let length = values.len();
		Tensor::<NdArray<f64>, 1>::from_data(TensorData::new(values, [length]), &device)
	};
	let observed = to_tensor(pairs.iter().map(|(obs, _)| *obs).collect());
	let modelled = to_tensor(pairs.iter().map(|(_, model)| *model).collect());

	let scalar = |value: Tensor<NdArray<f64>, 1>| value.into_scalar().elem::<f64>();

	PairScores {
		rmse: scalar(rmse(&observed, &modelled)),
		nse: scalar(nse(&observed, &modelled)),
		kge: scalar(kge(&observed, &modelled)),
		r: scalar(pearson_r(&observed, &modelled)),
	}
}

pub(super) fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), SignalError> {
	let mut writer = csv::Writer::from_path(path)?;
	for each in rows {
		writer.serialize(each)?;
	}
	writer.flush()?;

	debug!(path = %path.display(), rows = rows.len(), "Wrote CSV");
	Ok(())
}
