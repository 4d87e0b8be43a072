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

use std::f64::consts::PI;

use chrono::NaiveDate;

use super::typedef::*;
use crate::signal::{fit_annual_signal, AnnualSignalConfig, HarmonicFit};
use crate::typedef::{SegmentTemperatures, DAYS_PER_YEAR};

/// Convert a phase difference in radians into days of the year.
pub fn phase_to_days(water_phase: f64, air_phase: f64) -> f64 {
	(water_phase - air_phase) * DAYS_PER_YEAR / (2f64 * PI)
}

/// Drop implausible observed pairs, in order: amplitude ratio above
/// [`MAX_AMPLITUDE_RATIO`], water leading air by more than [`MAX_LEAD_DAYS`],
/// then clamp any remaining lead to zero. A missing or non-finite side makes
/// the whole pair missing.
pub fn apply_plausibility(
	amplitude_ratio: Option<f64>,
	phase_shift: Option<f64>,
) -> (Option<f64>, Option<f64>) {
	let (Some(ratio), Some(shift)) = (amplitude_ratio, phase_shift) else {
		return (None, None);
	};

	// NaN fails every comparison below, so check it up front
	if !ratio.is_finite() || !shift.is_finite() {
		return (None, None);
	}
	if ratio > MAX_AMPLITUDE_RATIO {
		return (None, None);
	}
	if shift < -MAX_LEAD_DAYS {
		return (None, None);
	}

	(Some(ratio), Some(shift.max(0f64)))
}

/// Fit the observed water series after the stricter observation rules: more
/// than [`MIN_OBS_SAMPLES`] finite values, and at least that many left once
/// values outside [`OBS_MIN_TEMP`]..=[`OBS_MAX_TEMP`] are dropped.
pub fn fit_observed_water(
	dates: &[NaiveDate],
	temps: &[Option<f64>],
	config: &AnnualSignalConfig,
) -> HarmonicFit {
	let raw = temps
		.iter()
		.filter(|each| each.is_some_and(f64::is_finite))
		.count();
	if raw <= MIN_OBS_SAMPLES {
		return HarmonicFit::Insufficient {
			valid: raw,
			required: MIN_OBS_SAMPLES + 1,
		};
	}

	let plausible = temps
		.iter()
		.map(|each| each.filter(|temp| (OBS_MIN_TEMP..=OBS_MAX_TEMP).contains(temp)))
		.collect::<Vec<_>>();
	let kept = plausible.iter().filter(|each| each.is_some()).count();
	if kept < MIN_OBS_SAMPLES {
		return HarmonicFit::Insufficient {
			valid: kept,
			required: MIN_OBS_SAMPLES,
		};
	}

	fit_annual_signal(dates, &plausible, true, config)
}

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub(super) struct Derived {
	pub value: Option<f64>,
	pub low: Option<f64>,
	pub high: Option<f64>,
}

/// Amplitude ratio and phase shift of a water fit against its air fit. A zero
/// air amplitude is not guarded and surfaces as `inf` or `NaN`.
pub(super) fn derive_metrics(water: &HarmonicFit, air: &HarmonicFit) -> (Derived, Derived) {
	let (Some(water), Some(air)) = (water.estimate(), air.estimate()) else {
		return Default::default();
	};

	let amplitude_ratio = Derived {
		value: Some(water.amplitude / air.amplitude),
		low: Some(water.amplitude_low / air.amplitude_high),
		high: Some(water.amplitude_high / air.amplitude_low),
	};
	let phase_shift = Derived {
		value: Some(phase_to_days(water.phase, air.phase)),
		low: Some(phase_to_days(water.phase_low, air.phase_high)),
		high: Some(phase_to_days(water.phase_high, air.phase_low)),
	};

	(amplitude_ratio, phase_shift)
}

pub(super) fn build_record(
	dates: &[NaiveDate],
	segment: &SegmentTemperatures,
	config: &AnnualSignalConfig,
) -> SegmentSignalRecord {
	let air = fit_annual_signal(dates, &segment.air, false, config);
	let water_obs = fit_observed_water(dates, &segment.water_obs, config);
	let water_pbm = fit_annual_signal(dates, &segment.water_pbm, true, config);

	let (ratio_obs, shift_obs) = derive_metrics(&water_obs, &air);
	let (ratio_pbm, shift_pbm) = derive_metrics(&water_pbm, &air);
	let (ratio, shift) = apply_plausibility(ratio_obs.value, shift_obs.value);

	SegmentSignalRecord {
		seg_id: segment.seg_id,
		air,
		water_obs,
		water_pbm,
		amplitude_ratio: SignalPair {
			obs: ratio,
			low: ratio_obs.low,
			high: ratio_obs.high,
			pbm: ratio_pbm.value,
		},
		phase_shift: SignalPair {
			obs: shift,
			low: shift_obs.low,
			high: shift_obs.high,
			pbm: shift_pbm.value,
		},
	}
}
