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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot set memory limit to {0} MB")]
    MemoryLimit(usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),
}

/// Errors that stop decoding of a single file.
///
/// None of them is fatal for a batch run, the runner
/// logs them and moves to the next file.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Required attribute '{name}' not found (scope: '{scope}')")]
    MissingAttribute { scope: String, name: String },

    #[error("Cannot process unknown DataType of '{0}'")]
    UnknownProductType(String),

    #[error("Malformed dimension: {0}")]
    MalformedDimension(String),

    #[error("Variable '{0}' not found in file")]
    MissingVariable(String),

    #[error("Attribute '{name}' has unusable value: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("Sparse record {record} points outside the grid at row {row}, column {col}")]
    PixelOutOfBounds { record: usize, row: i64, col: i64 },

    #[error("NetCDF backend failure: {0}")]
    Backend(#[from] netcdf::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub(crate) fn missing_attribute(scope: &str, name: &str) -> Self {
        DecodeError::MissingAttribute {
            scope: scope.to_string(),
            name: name.to_string(),
        }
    }

    pub(crate) fn missing_dimension(name: &str) -> Self {
        DecodeError::MalformedDimension(format!("dimension '{}' not found", name))
    }
}
