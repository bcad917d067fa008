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

//! Module responsible for parsing and checking the configuration file.
//!
//! The configuration file uses [YAML](https://en.wikipedia.org/wiki/YAML)
//! and `serde` to enforce strong typing, so mistakes in `config.yaml`
//! are reported before any product is read.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml`:
//!
//! ```yaml
//! input:
//!   backend: netcdf-buffered
//!   data_files:
//!     - data/Reflectivity/00.50/20150401-204712.netcdf.gz
//!     - data/MESH/00.25/20150401-204700.netcdf
//! resources:
//!   memory: 2048
//! ```

use crate::errors::ConfigError;
use crate::source::ReadMode;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Library used to read the NetCDF files.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Deserialize)]
pub enum Backend {
    /// Reads each value from the file when it is needed.
    /// Lowest memory usage, but slow for large sparse products.
    #[serde(rename = "netcdf")]
    Netcdf,

    /// Reads whole variables into memory before decoding.
    #[serde(rename = "netcdf-buffered")]
    NetcdfBuffered,
}

impl Backend {
    pub fn read_mode(&self) -> ReadMode {
        match self {
            Backend::Netcdf => ReadMode::Indexed,
            Backend::NetcdfBuffered => ReadMode::Buffered,
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Netcdf
    }
}

/// Fields with information about the products to read.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Input {
    /// _(Optional)_ Backend used to read files.
    ///
    /// One of `netcdf` or `netcdf-buffered`. Defaults to `netcdf`.
    #[serde(default)]
    pub backend: Backend,

    /// List of product files to read.
    ///
    /// Files can be plain NetCDF (`.netcdf`, `.nc`) or gzipped (`.gz`).
    /// Files with other extensions are skipped. The list cannot be empty.
    pub data_files: Vec<PathBuf>,
}

impl Input {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.data_files.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "List of data files cannot be empty",
            ));
        }

        Ok(())
    }
}

/// _(Optional)_ Fields with information about
/// resources available for the program.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Heap memory limit in MB.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space.
    ///
    /// Without the limit a product much larger than expected
    /// (eg. a corrupted file declaring huge dimensions) makes the
    /// system slow down and kill the process without a message.
    /// With the limit the allocator aborts with an OOM error instead.
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub input: Input,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::new_from_slice(data.as_slice())
    }

    pub fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        config.input.check_bounds()?;
        config.resources.check_bounds()?;

        Ok(config)
    }
}
