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

//! Module with the interface through which products are read.
//!
//! There are several ways of getting values out of a NetCDF file
//! and they differ a lot in speed. [`DataSource`] hides those
//! differences so that the [`decoder`](crate::decoder) and the
//! [`product`](crate::product) code work the same way with any backend.

mod file;
mod memory;

pub use self::file::{NetcdfHandle, NetcdfSource, ReadMode};
pub use self::memory::MemorySource;

use crate::constants::HANDLED_FILE_TYPES;
use crate::errors::DecodeError;
use crate::Float;
use std::path::Path;

/// Value of an attribute, as far as the NSSL convention cares.
#[derive(Clone, PartialEq, Debug)]
pub enum AttrValue {
    Number(Float),
    Text(String),
}

impl AttrValue {
    /// Numeric value of the attribute.
    ///
    /// Some writers store numbers as text, those are parsed.
    pub fn as_float(&self, name: &str) -> Result<Float, DecodeError> {
        match self {
            AttrValue::Number(value) => Ok(*value),
            AttrValue::Text(text) => {
                text.trim()
                    .parse::<Float>()
                    .map_err(|_| DecodeError::InvalidAttribute {
                        name: name.to_string(),
                        reason: format!("'{}' is not a number", text),
                    })
            }
        }
    }

    /// Integer value of the attribute, fractional part is truncated.
    pub fn as_int(&self, name: &str) -> Result<i64, DecodeError> {
        let value = self.as_float(name)?;

        if !value.is_finite() || value.abs() >= i64::MAX as Float {
            return Err(DecodeError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("{} is not a valid integer", value),
            });
        }

        Ok(value.trunc() as i64)
    }

    pub fn as_text(&self) -> String {
        match self {
            AttrValue::Number(value) => value.to_string(),
            AttrValue::Text(text) => text.clone(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<Float> for AttrValue {
    fn from(value: Float) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value as Float)
    }
}

/// Capability interface over NetCDF-like backends.
///
/// `scope` arguments select where an attribute is searched:
/// an empty string means global attributes, any other value is the
/// name of the variable owning the attribute.
///
/// Values are read through handles. A handle is resolved once
/// with [`DataSource::value_handle`] and then reused for every
/// index of a scan, which for some backends makes the difference
/// between reading a variable once and reopening it per value.
pub trait DataSource {
    type Handle<'a>
    where
        Self: 'a;

    /// Checks if a dimension, or a variable holding at least
    /// one value, with given name exists. Absence is not an error.
    fn has_dimension(&self, name: &str) -> bool;

    fn has_attribute(&self, scope: &str, name: &str) -> bool;

    /// Fails with [`DecodeError::MissingAttribute`] when absent,
    /// check [`DataSource::has_attribute`] first for optional attributes.
    fn attribute(&self, scope: &str, name: &str) -> Result<AttrValue, DecodeError>;

    fn dimension_size(&self, name: &str) -> Result<usize, DecodeError>;

    /// Length of the first dimension of given variable.
    ///
    /// Returns `0` for unlimited dimensions with no records,
    /// which some old sparse files declare for their pixel dimension.
    /// Fails with [`DecodeError::MissingVariable`] when there is
    /// no such variable.
    fn dimension_size_by_variable(&self, name: &str) -> Result<usize, DecodeError>;

    fn value_handle(&self, name: &str) -> Result<Self::Handle<'_>, DecodeError>;

    fn value<'a>(&'a self, handle: &Self::Handle<'a>, index: usize) -> Result<Float, DecodeError>;

    /// Value of a 2D variable at given position.
    ///
    /// `index` is the row-major flat index of `(row, col)`,
    /// backends are free to use either.
    fn value_2d<'a>(
        &'a self,
        handle: &Self::Handle<'a>,
        index: usize,
        row: usize,
        col: usize,
    ) -> Result<Float, DecodeError>;

    fn float_attribute(&self, scope: &str, name: &str) -> Result<Float, DecodeError> {
        self.attribute(scope, name)?.as_float(name)
    }

    fn text_attribute(&self, scope: &str, name: &str) -> Result<String, DecodeError> {
        Ok(self.attribute(scope, name)?.as_text())
    }
}

/// Checks if the file name ends with one of [`HANDLED_FILE_TYPES`].
pub fn is_handled_file_type(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => HANDLED_FILE_TYPES.contains(&ext),
        None => false,
    }
}

/// File name without the directory and without every extension,
/// so `data/Reflectivity.netcdf.gz` becomes `Reflectivity`.
pub fn base_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut stem = file_name.as_str();

    while let Some(dot) = stem.rfind('.') {
        // a leading dot belongs to the name of hidden files
        if dot == 0 {
            break;
        }
        stem = &stem[..dot];
    }

    stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::{base_name, is_handled_file_type, AttrValue};
    use crate::errors::DecodeError;
    use std::path::Path;

    #[test]
    fn attribute_conversions() {
        assert_eq!(AttrValue::from(0.5).as_float("x").unwrap(), 0.5);
        assert_eq!(AttrValue::from(" 12.25 ").as_float("x").unwrap(), 12.25);
        assert_eq!(AttrValue::from(1428000000.9).as_int("Time").unwrap(), 1428000000);
        assert_eq!(AttrValue::from(3.0).as_text(), "3");
        assert_eq!(AttrValue::from("RadialSet").as_text(), "RadialSet");

        match AttrValue::from("dBZ").as_float("Unit") {
            Err(DecodeError::InvalidAttribute { name, .. }) => assert_eq!(name, "Unit"),
            other => panic!("Expected InvalidAttribute, got {:?}", other),
        }

        assert!(AttrValue::from(f64::NAN).as_int("Time").is_err());
    }

    #[test]
    fn handled_file_types() {
        assert!(is_handled_file_type(Path::new("a/Reflectivity.netcdf")));
        assert!(is_handled_file_type(Path::new("a/Reflectivity.nc")));
        assert!(is_handled_file_type(Path::new("Reflectivity.netcdf.gz")));
        assert!(!is_handled_file_type(Path::new("Reflectivity.png")));
        assert!(!is_handled_file_type(Path::new("README")));
    }

    #[test]
    fn base_name_strips_all_extensions() {
        assert_eq!(base_name(Path::new("C:/stuff/test.netcdf.gz")), "test");
        assert_eq!(base_name(Path::new("/data/20150401-204712.netcdf")), "20150401-204712");
        assert_eq!(base_name(Path::new("plain")), "plain");
        assert_eq!(base_name(Path::new(".hidden.nc")), ".hidden");
    }
}
