#![recursion_limit = "256"]

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

pub mod typedef;
pub use typedef::*;

pub mod error;
pub use error::SignalError;

pub mod dataset;
pub mod evaluate;
pub mod loss;
pub mod masked;
pub mod regression;
pub mod signal;
pub mod table;

#[cfg(test)]
mod testing;

pub use dataset::{prepare_annual_signal_data, GwDataset, GwScale, Partition, PartitionRanges};
pub use loss::{GwLoss, GwLossConfig};
pub use regression::{batched_annual_signal, BatchSignal, GwFeatures};
pub use signal::{fit_annual_signal, AnnualSignalConfig, HarmonicFit, SignalEstimate};
pub use table::{build_signal_table, SignalMetric, SignalTable};
