/*
Copyright 2021 Jakub Lewandowski

This file is part of W2Grid.

W2Grid is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

W2Grid is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with W2Grid. If not, see https://www.gnu.org/licenses/.
*/

//! Module reading the products listed in the configuration, one by one.
//!
//! A file that cannot be read never stops the run. The error is
//! logged and the runner moves on, so one corrupted product in a
//! long list does not waste the work done on the others.

pub mod configuration;

pub use self::configuration::{Backend, Config};

use crate::diagnostics::Diagnostics;
use crate::errors::DecodeError;
use crate::grid::Grid;
use crate::product::classify_and_read;
use crate::source::{base_name, is_handled_file_type, NetcdfSource, ReadMode};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Counts of files in each state after a run.
///
/// Files of unhandled types and products of unknown `DataType`
/// are `skipped`, every other read error makes a file `failed`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RunSummary {
    pub decoded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct Runner {
    config: Config,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Runner { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Reads every configured file and passes the decoded
    /// grids to `consumer` in the order of the list.
    pub fn run<F: FnMut(Grid)>(&self, diag: Diagnostics, mut consumer: F) -> RunSummary {
        let files = &self.config.input.data_files;
        let mode = self.config.input.backend.read_mode();

        let mut summary = RunSummary::default();

        let files_bar = ProgressBar::new(files.len() as u64);
        files_bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
                .progress_chars("#>-"),
        );
        files_bar.set_prefix("Read products");

        for path in files {
            if !is_handled_file_type(path) {
                diag.warn(format_args!(
                    "Skipping {}, unhandled file type",
                    path.display()
                ));
                summary.skipped += 1;
                files_bar.inc(1);
                continue;
            }

            diag.info(format_args!("Reading {}", path.display()));

            match read_file(path, mode, diag) {
                Ok(grid) => {
                    diag.info(format_args!(
                        "Decoded {} {} ({} x {}) from {} valid at {}",
                        grid.type_name(),
                        grid.product_name(),
                        grid.matrix().nrows(),
                        grid.matrix().ncols(),
                        grid.file_name(),
                        grid.time_string()
                    ));
                    summary.decoded += 1;
                    consumer(grid);
                }
                Err(DecodeError::UnknownProductType(data_type)) => {
                    diag.warn(format_args!(
                        "Skipping {}, products of type {} are not supported",
                        path.display(),
                        data_type
                    ));
                    summary.skipped += 1;
                }
                Err(err) => {
                    diag.error(format_args!(
                        "Reading {} failed due to an error, skipping the file: {}",
                        path.display(),
                        err
                    ));
                    summary.failed += 1;
                }
            }

            files_bar.inc(1);
        }

        files_bar.finish_with_message("All files processed");

        summary
    }
}

/// Opens, decodes and closes one product file.
///
/// The grid is named after the file with every extension stripped.
pub fn read_file(path: &Path, mode: ReadMode, diag: Diagnostics) -> Result<Grid, DecodeError> {
    let source = NetcdfSource::open(path, mode)?;
    let decoded = classify_and_read(&source, diag);
    source.close()?;

    let mut grid = decoded?;
    grid.set_file_name(&base_name(path));

    Ok(grid)
}
