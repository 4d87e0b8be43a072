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

use rayon::prelude::*;
use tracing::{debug, info};

use super::helper::*;
use super::typedef::*;
use crate::error::SignalError;
use crate::signal::AnnualSignalConfig;
use crate::typedef::TemperatureFrame;

/// Fit air, observed water and process-model water of every segment and derive
/// their amplitude ratio and phase shift. Records come back in the segment
/// order of `frame`.
pub fn build_signal_table(
	frame: &TemperatureFrame,
	config: &AnnualSignalConfig,
) -> Result<SignalTable, SignalError> {
	frame.validate()?;
	config.validate()?;

	let records = frame
		.segments
		.par_iter()
		.map(|segment| build_record(&frame.dates, segment, config))
		.collect::<Vec<_>>();

	for record in records.iter().filter(|each| !each.air.is_success()) {
		debug!(seg_id = record.seg_id, fit = ?record.air, "Air signal unavailable");
	}

	let observed = records
		.iter()
		.filter(|each| each.amplitude_ratio.obs.is_some())
		.count();
	info!(
		segments = records.len(),
		observed,
		dates = frame.dates.len(),
		"Built annual signal table"
	);

	Ok(SignalTable { records })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::signal::HarmonicFit;
	use crate::testing::*;

	const TOL: f64 = 1e-6;

	#[test]
	fn test_filter_ordering() {
		// Ratio check runs first, so a plausible shift does not rescue the pair
		assert_eq!(apply_plausibility(Some(1.2), Some(5.0)), (None, None));
		assert_eq!(apply_plausibility(Some(0.5), Some(-12.0)), (None, None));
		assert_eq!(apply_plausibility(Some(1.2), Some(-12.0)), (None, None));
		assert_eq!(apply_plausibility(Some(1.1), Some(5.0)), (Some(1.1), Some(5.0)));
		assert_eq!(apply_plausibility(Some(0.5), Some(-10.0)), (Some(0.5), Some(0.0)));
	}

	#[test]
	fn test_small_lead_clamps_to_zero() {
		assert_eq!(apply_plausibility(Some(0.5), Some(-3.0)), (Some(0.5), Some(0.0)));
		assert_eq!(apply_plausibility(Some(0.5), Some(0.0)), (Some(0.5), Some(0.0)));
		assert_eq!(apply_plausibility(Some(0.5), Some(42.0)), (Some(0.5), Some(42.0)));
	}

	#[test]
	fn test_one_missing_side_drops_both() {
		assert_eq!(apply_plausibility(None, Some(3.0)), (None, None));
		assert_eq!(apply_plausibility(Some(0.4), None), (None, None));
		assert_eq!(apply_plausibility(Some(f64::INFINITY), Some(3.0)), (None, None));
		assert_eq!(apply_plausibility(Some(0.4), Some(f64::NAN)), (None, None));
	}

	#[test]
	fn test_ratio_and_shift_recovery() {
		let frame = synthetic_frame(3 * 365, &[(7, 0.5, 20.0)]);
		let table = build_signal_table(&frame, &AnnualSignalConfig::new()).unwrap();
		let record = table.get(7).expect("segment should be present");

		let ratio = record.amplitude_ratio.obs.expect("ratio should survive");
		let shift = record.phase_shift.obs.expect("shift should survive");
		assert!((ratio - 0.5).abs() < TOL, "Expected Ar = 0.5, got {}", ratio);
		assert!((shift - 20.0).abs() < TOL, "Expected delPhi = 20, got {}", shift);

		// Process model equals the observations here
		assert!((record.amplitude_ratio.pbm.unwrap() - ratio).abs() < TOL);
		assert!((record.phase_shift.pbm.unwrap() - shift).abs() < TOL);

		// Exact data leaves almost no room between the bounds
		let low = record.amplitude_ratio.low.unwrap();
		let high = record.amplitude_ratio.high.unwrap();
		assert!(low <= ratio + TOL && ratio <= high + TOL);
		assert!(high - low < 1e-3);
	}

	#[test]
	fn test_process_model_is_never_filtered() {
		let frame = synthetic_frame(3 * 365, &[(1, 1.5, 20.0), (2, 0.5, -15.0), (3, 0.5, -3.0)]);
		let table = build_signal_table(&frame, &AnnualSignalConfig::new()).unwrap();

		let too_variable = table.get(1).unwrap();
		assert_eq!(too_variable.amplitude_ratio.obs, None);
		assert_eq!(too_variable.phase_shift.obs, None);
		assert!((too_variable.amplitude_ratio.pbm.unwrap() - 1.5).abs() < TOL);

		let leading = table.get(2).unwrap();
		assert_eq!(leading.phase_shift.obs, None);
		assert_eq!(leading.amplitude_ratio.obs, None);
		assert!((leading.phase_shift.pbm.unwrap() + 15.0).abs() < TOL);

		let slightly_leading = table.get(3).unwrap();
		assert_eq!(slightly_leading.phase_shift.obs, Some(0.0));
		assert!((slightly_leading.phase_shift.pbm.unwrap() + 3.0).abs() < TOL);
	}

	#[test]
	fn test_short_observation_record() {
		let mut frame = synthetic_frame(3 * 365, &[(4, 0.5, 20.0)]);
		for (i, each) in frame.segments[0].water_obs.iter_mut().enumerate() {
			if i >= 300 {
				*each = None;
			}
		}

		let table = build_signal_table(&frame, &AnnualSignalConfig::new()).unwrap();
		let record = table.get(4).unwrap();

		assert_eq!(
			record.water_obs,
			HarmonicFit::Insufficient {
				valid: 300,
				required: MIN_OBS_SAMPLES + 1
			}
		);
		assert_eq!(record.amplitude_ratio.obs, None);
		assert_eq!(record.amplitude_ratio.low, None);
		assert!(record.amplitude_ratio.pbm.is_some());
		assert!(record.air.is_success());
	}

	#[test]
	fn test_implausible_observations_are_dropped() {
		let mut frame = synthetic_frame(400, &[(5, 0.5, 20.0)]);
		// 400 raw values but only 350 inside the plausible band
		for each in frame.segments[0].water_obs.iter_mut().take(50) {
			*each = Some(75.0);
		}

		let fit = fit_observed_water(&frame.dates, &frame.segments[0].water_obs, &AnnualSignalConfig::new());
		assert_eq!(
			fit,
			HarmonicFit::Insufficient {
				valid: 350,
				required: MIN_OBS_SAMPLES
			}
		);
	}

	#[test]
	fn test_flat_air_is_not_guarded() {
		let mut frame = synthetic_frame(3 * 365, &[(6, 0.5, 20.0)]);
		frame.segments[0].air = vec![Some(AIR_MEAN); frame.dates.len()];

		let table = build_signal_table(&frame, &AnnualSignalConfig::new()).unwrap();
		let record = table.get(6).unwrap();

		assert_eq!(record.amplitude_ratio.obs, None);
		let ratio_pbm = record.amplitude_ratio.pbm.unwrap();
		assert!(!ratio_pbm.is_finite() || ratio_pbm > 1e6, "Expected a blown-up ratio, got {}", ratio_pbm);
	}

	#[test]
	fn test_table_is_idempotent_and_ordered() {
		let frame = synthetic_frame(2 * 365 + 30, &[(30, 0.3, 35.0), (10, 0.8, 5.0), (20, 1.5, 20.0)]);
		let config = AnnualSignalConfig::new();

		let first = build_signal_table(&frame, &config).unwrap();
		let second = build_signal_table(&frame, &config).unwrap();
		assert_eq!(first, second);
		assert_eq!(
			first.records.iter().map(|each| each.seg_id).collect::<Vec<_>>(),
			vec![30, 10, 20]
		);

		// Segments are independent of their neighbours
		let mut reversed = frame.clone();
		reversed.segments.reverse();
		let reversed = build_signal_table(&reversed, &config).unwrap();
		for record in &first.records {
			assert_eq!(Some(record), reversed.get(record.seg_id));
		}
	}

	#[test]
	fn test_length_mismatch_is_rejected() {
		let mut frame = synthetic_frame(400, &[(8, 0.5, 20.0)]);
		frame.segments[0].air.pop();

		let result = build_signal_table(&frame, &AnnualSignalConfig::new());
		assert!(matches!(
			result,
			Err(SignalError::LengthMismatch {
				seg_id: 8,
				dates: 400,
				values: 399
			})
		));
	}

	#[test]
	fn test_rows_follow_column_names() {
		let frame = synthetic_frame(3 * 365, &[(9, 0.5, 20.0)]);
		let table = build_signal_table(&frame, &AnnualSignalConfig::new()).unwrap();
		let rows = table.rows();

		assert_eq!(rows.len(), 1);
		assert_eq!(rows[0].seg_id, 9);
		assert_eq!(rows[0].ar_obs, table.observed(SignalMetric::AmplitudeRatio)[0]);
		assert_eq!(SignalTable::column_names().len(), 15);
		assert_eq!(SignalMetric::PhaseShift.to_string(), "delPhi");
	}
}
