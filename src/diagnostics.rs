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

//! Module with the logging handle passed into decoding functions.
//!
//! The decoding code does not write through the global `log` macros.
//! Every entry point takes a [`Diagnostics`] which forwards records
//! to the logger it was created with. The binary hands in the installed
//! `env_logger` with [`Diagnostics::global`], tests hand in their own
//! logger to inspect what was reported.

use log::{Level, Log, Metadata, Record};
use std::fmt;

const TARGET: &str = "w2grid";

/// Cheap, copyable handle to a [`log::Log`] implementation.
#[derive(Clone, Copy)]
pub struct Diagnostics<'l> {
    logger: &'l dyn Log,
}

impl<'l> Diagnostics<'l> {
    pub fn new(logger: &'l dyn Log) -> Self {
        Diagnostics { logger }
    }

    /// Diagnostics writing to the logger installed for the process
    /// (or nowhere, when no logger was installed).
    pub fn global() -> Diagnostics<'static> {
        Diagnostics {
            logger: log::logger(),
        }
    }

    /// Checks the compile-time level cap and asks the logger
    /// whether it wants records of given level.
    pub fn enabled(&self, level: Level) -> bool {
        level <= log::STATIC_MAX_LEVEL
            && self
                .logger
                .enabled(&Metadata::builder().level(level).target(TARGET).build())
    }

    pub fn log(&self, level: Level, args: fmt::Arguments) {
        if !self.enabled(level) {
            return;
        }

        self.logger.log(
            &Record::builder()
                .args(args)
                .level(level)
                .target(TARGET)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn error(&self, args: fmt::Arguments) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args);
    }
}

impl fmt::Debug for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
