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

//! Sub-module with a dataset kept entirely in memory.
//!
//! Useful for synthesising products without touching the disk.

use super::{AttrValue, DataSource};
use crate::{errors::DecodeError, Float};
use rustc_hash::FxHashMap;

#[derive(Clone, PartialEq, Debug)]
struct MemoryVariable {
    dimensions: Vec<String>,
    values: Vec<Float>,
}

/// In-memory [`DataSource`] assembled with builder methods.
///
/// Values of multi-dimensional variables are stored flat in
/// row-major order, [`DataSource::value_2d`] uses the flat index.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct MemorySource {
    dimensions: FxHashMap<String, usize>,
    attributes: FxHashMap<(String, String), AttrValue>,
    variables: FxHashMap<String, MemoryVariable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(mut self, name: &str, len: usize) -> Self {
        self.dimensions.insert(name.to_string(), len);
        self
    }

    /// Adds an attribute, use `""` as `scope` for a global one.
    pub fn with_attribute(mut self, scope: &str, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attributes
            .insert((scope.to_string(), name.to_string()), value.into());
        self
    }

    pub fn with_variable(mut self, name: &str, dimensions: &[&str], values: Vec<Float>) -> Self {
        self.variables.insert(
            name.to_string(),
            MemoryVariable {
                dimensions: dimensions.iter().map(|dim| dim.to_string()).collect(),
                values,
            },
        );
        self
    }

    fn variable(&self, name: &str) -> Result<&MemoryVariable, DecodeError> {
        self.variables
            .get(name)
            .ok_or_else(|| DecodeError::MissingVariable(name.to_string()))
    }
}

impl DataSource for MemorySource {
    type Handle<'a> = &'a [Float];

    fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
            || self
                .variables
                .get(name)
                .map_or(false, |var| !var.values.is_empty())
    }

    fn has_attribute(&self, scope: &str, name: &str) -> bool {
        self.attributes
            .contains_key(&(scope.to_string(), name.to_string()))
    }

    fn attribute(&self, scope: &str, name: &str) -> Result<AttrValue, DecodeError> {
        self.attributes
            .get(&(scope.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| DecodeError::missing_attribute(scope, name))
    }

    fn dimension_size(&self, name: &str) -> Result<usize, DecodeError> {
        self.dimensions
            .get(name)
            .copied()
            .ok_or_else(|| DecodeError::missing_dimension(name))
    }

    fn dimension_size_by_variable(&self, name: &str) -> Result<usize, DecodeError> {
        let var = self.variable(name)?;

        let first_dim = var.dimensions.first().ok_or_else(|| {
            DecodeError::MalformedDimension(format!("variable '{}' has no dimensions", name))
        })?;

        self.dimension_size(first_dim)
    }

    fn value_handle(&self, name: &str) -> Result<Self::Handle<'_>, DecodeError> {
        Ok(self.variable(name)?.values.as_slice())
    }

    fn value<'a>(&'a self, handle: &Self::Handle<'a>, index: usize) -> Result<Float, DecodeError> {
        handle.get(index).copied().ok_or_else(|| {
            DecodeError::MalformedDimension(format!(
                "index {} out of {} stored values",
                index,
                handle.len()
            ))
        })
    }

    fn value_2d<'a>(
        &'a self,
        handle: &Self::Handle<'a>,
        index: usize,
        _row: usize,
        _col: usize,
    ) -> Result<Float, DecodeError> {
        self.value(handle, index)
    }
}
