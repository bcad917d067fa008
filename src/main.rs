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

//! Command-line reader of NSSL radar products.
//!
//! Reads the files listed in `config.yaml` in the working directory
//! and logs a summary of every decoded grid. Set `W2GRID_LOG_LEVEL`
//! to `debug` to see the per-radial metadata and decoding progress.

use cap::Cap;
use env_logger::Env;
use log::{debug, error, info};
use std::{alloc, path::Path};
use w2grid::diagnostics::Diagnostics;
use w2grid::errors::RunError;
use w2grid::runner::{configuration::Config, RunSummary, Runner};

/// Global allocator used by the program.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better
/// [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
///
/// `env_logger` is initiated before anything else so that
/// errors from reading the configuration are reported too.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("W2GRID_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("W2GRID_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match run() {
        Ok(summary) => info!(
            "Finished: {} decoded, {} failed, {} skipped",
            summary.decoded, summary.failed, summary.skipped
        ),
        Err(err) => error!("Execution failed with error: {}", err),
    }
}

fn run() -> Result<RunSummary, RunError> {
    debug!("Reading configuration from config.yaml");
    let config = Config::new_from_file(Path::new("config.yaml"))?;

    debug!("Setting memory limit");
    let memory = config.resources.memory;
    ALLOCATOR
        .set_limit(memory.saturating_mul(1024 * 1024))
        .map_err(|_| RunError::MemoryLimit(memory))?;

    let runner = Runner::new(config);
    debug!("Reading with {:?} backend", runner.config().input.backend);

    let summary = runner.run(Diagnostics::global(), |grid| {
        debug!(
            "{} from {} covers {} cells",
            grid.type_name(),
            grid.file_name(),
            grid.matrix().len()
        );
    });

    Ok(summary)
}
