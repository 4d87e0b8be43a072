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

//! Synthetic daily series shared by the unit tests.

use std::f64::consts::PI;

use chrono::{Duration, NaiveDate};

use crate::signal::decimal_date;
use crate::typedef::{SegmentId, SegmentTemperatures, TemperatureFrame};

pub const AIR_MEAN: f64 = 10.0;
pub const AIR_AMPLITUDE: f64 = 10.0;
pub const WATER_MEAN: f64 = 20.0;

pub fn start() -> NaiveDate {
	NaiveDate::from_ymd_opt(2001, 10, 1).unwrap()
}

pub fn daily_dates(start: NaiveDate, days: i64) -> Vec<NaiveDate> {
	(0..days).map(|i| start + Duration::days(i)).collect()
}

/// `mean + amplitude·sin(2π(t - lag))`, peaking `lag_days` after a zero-lag wave.
pub fn annual_wave(dates: &[NaiveDate], mean: f64, amplitude: f64, lag_days: f64) -> Vec<Option<f64>> {
	dates
		.iter()
		.map(|date| {
			let t = decimal_date(*date) - lag_days / 365.0;
			Some(mean + amplitude * (2.0 * PI * t).sin())
		})
		.collect()
}

/// Air at phase zero, water damped by `ratio` and lagged by `lag_days`. The
/// process-model series equals the observed one.
pub fn synthetic_segment(seg_id: SegmentId, dates: &[NaiveDate], ratio: f64, lag_days: f64) -> SegmentTemperatures {
	let water = annual_wave(dates, WATER_MEAN, ratio * AIR_AMPLITUDE, lag_days);
	SegmentTemperatures {
		seg_id,
		air: annual_wave(dates, AIR_MEAN, AIR_AMPLITUDE, 0.0),
		water_obs: water.clone(),
		water_pbm: water,
	}
}

/// One segment per `(seg_id, ratio, lag_days)`.
pub fn synthetic_frame(days: i64, segments: &[(SegmentId, f64, f64)]) -> TemperatureFrame {
	let dates = daily_dates(start(), days);
	let segments = segments
		.iter()
		.map(|(seg_id, ratio, lag_days)| synthetic_segment(*seg_id, &dates, *ratio, *lag_days))
		.collect();

	TemperatureFrame { dates, segments }
}
