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

use super::helper::*;
use super::typedef::*;

/// Fit `T(t) = T_mean + a·sin(2πt) + b·cos(2πt)` to one segment's series
/// (Johnson et al. 2021, "Heed the data gap", Ecological Indicators 122).
///
/// `dates` and `temps` are paired by position. Missing values are skipped, and
/// for water series anything outside [`WATER_MIN_TEMP`]..=[`WATER_MAX_TEMP`] is
/// treated as missing too. Never fails loudly: bad input ends up as
/// [`HarmonicFit::Insufficient`] or [`HarmonicFit::Singular`].
pub fn fit_annual_signal(
	dates: &[NaiveDate],
	temps: &[Option<f64>],
	is_water: bool,
	config: &AnnualSignalConfig,
) -> HarmonicFit {
	let rows = dates
		.iter()
		.zip(temps.iter())
		.filter_map(|(date, temp)| {
			let temp = (*temp)?;
			if !temp.is_finite() {
				return None;
			}
			if is_water && !(WATER_MIN_TEMP..=WATER_MAX_TEMP).contains(&temp) {
				return None;
			}

			Some((decimal_date(*date), temp))
		})
		.collect::<Vec<_>>();

	if rows.len() < MIN_FIT_SAMPLES {
		return HarmonicFit::Insufficient {
			valid: rows.len(),
			required: MIN_FIT_SAMPLES,
		};
	}

	match ordinary_least_squares(&rows, config.confidence_level) {
		Some(fit) => HarmonicFit::Success(summarize_fit(&fit)),
		None => HarmonicFit::Singular,
	}
}
