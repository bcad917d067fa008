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

//! Sub-module with the NetCDF file backend.

use super::{AttrValue, DataSource};
use crate::{errors::DecodeError, Float};
use flate2::read::GzDecoder;
use netcdf::{AttributeValue, Variable};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// How values are pulled out of the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// Every value is read from the file on request.
    Indexed,

    /// The whole variable is read into memory when its handle is resolved.
    Buffered,
}

/// [`DataSource`] reading a NetCDF file with the `netcdf` crate.
///
/// Gzipped files are decompressed into a temporary file first,
/// which lives as long as the source.
pub struct NetcdfSource {
    // must be dropped before the temporary file it may point to
    file: netcdf::File,
    mode: ReadMode,
    decompressed: Option<NamedTempFile>,
}

/// Resolved variable of a [`NetcdfSource`].
pub enum NetcdfHandle<'f> {
    Indexed(Variable<'f>),
    Buffered(Vec<Float>),
}

impl NetcdfSource {
    pub fn open(path: &Path, mode: ReadMode) -> Result<Self, DecodeError> {
        let is_gzipped = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"));

        if !is_gzipped {
            return Ok(NetcdfSource {
                file: netcdf::open(path)?,
                mode,
                decompressed: None,
            });
        }

        let decompressed = decompress(path)?;

        Ok(NetcdfSource {
            file: netcdf::open(decompressed.path())?,
            mode,
            decompressed: Some(decompressed),
        })
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Closes the file and removes the decompressed copy, if any.
    pub fn close(self) -> Result<(), DecodeError> {
        let NetcdfSource {
            file, decompressed, ..
        } = self;

        drop(file);

        if let Some(temp) = decompressed {
            temp.close()?;
        }

        Ok(())
    }

    fn variable(&self, name: &str) -> Result<Variable<'_>, DecodeError> {
        self.file
            .variable(name)
            .ok_or_else(|| DecodeError::MissingVariable(name.to_string()))
    }
}

impl fmt::Debug for NetcdfSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetcdfSource")
            .field("mode", &self.mode)
            .field(
                "decompressed",
                &self.decompressed.as_ref().map(|temp| temp.path()),
            )
            .finish_non_exhaustive()
    }
}

fn decompress(path: &Path) -> Result<NamedTempFile, DecodeError> {
    let mut decoder = GzDecoder::new(fs::File::open(path)?);

    let mut temp = tempfile::Builder::new()
        .prefix("w2grid_")
        .suffix(".nc")
        .tempfile()?;

    io::copy(&mut decoder, &mut temp)?;
    temp.flush()?;

    Ok(temp)
}

fn convert_attribute(name: &str, value: AttributeValue) -> Result<AttrValue, DecodeError> {
    let value = match value {
        AttributeValue::Uchar(v) => AttrValue::Number(v as Float),
        AttributeValue::Schar(v) => AttrValue::Number(v as Float),
        AttributeValue::Ushort(v) => AttrValue::Number(v as Float),
        AttributeValue::Short(v) => AttrValue::Number(v as Float),
        AttributeValue::Uint(v) => AttrValue::Number(v as Float),
        AttributeValue::Int(v) => AttrValue::Number(v as Float),
        AttributeValue::Ulonglong(v) => AttrValue::Number(v as Float),
        AttributeValue::Longlong(v) => AttrValue::Number(v as Float),
        AttributeValue::Float(v) => AttrValue::Number(v as Float),
        AttributeValue::Double(v) => AttrValue::Number(v),
        AttributeValue::Str(v) => AttrValue::Text(v),

        // single-element arrays are common for numbers written by older tools
        AttributeValue::Shorts(v) if v.len() == 1 => AttrValue::Number(v[0] as Float),
        AttributeValue::Ints(v) if v.len() == 1 => AttrValue::Number(v[0] as Float),
        AttributeValue::Floats(v) if v.len() == 1 => AttrValue::Number(v[0] as Float),
        AttributeValue::Doubles(v) if v.len() == 1 => AttrValue::Number(v[0]),
        AttributeValue::Strs(v) if v.len() == 1 => AttrValue::Text(v[0].clone()),

        other => {
            return Err(DecodeError::InvalidAttribute {
                name: name.to_string(),
                reason: format!("unsupported value {:?}", other),
            })
        }
    };

    Ok(value)
}

impl DataSource for NetcdfSource {
    type Handle<'a> = NetcdfHandle<'a>;

    fn has_dimension(&self, name: &str) -> bool {
        if self.file.dimension(name).is_some() {
            return true;
        }

        match self.file.variable(name) {
            Some(var) => var.dimensions().iter().map(|dim| dim.len()).product::<usize>() > 0,
            None => false,
        }
    }

    fn has_attribute(&self, scope: &str, name: &str) -> bool {
        if scope.is_empty() {
            return self.file.attribute(name).is_some();
        }

        self.file
            .variable(scope)
            .map_or(false, |var| var.attributes().any(|attr| attr.name() == name))
    }

    fn attribute(&self, scope: &str, name: &str) -> Result<AttrValue, DecodeError> {
        if scope.is_empty() {
            let attr = self
                .file
                .attribute(name)
                .ok_or_else(|| DecodeError::missing_attribute(scope, name))?;

            return convert_attribute(name, attr.value()?);
        }

        let var = self
            .file
            .variable(scope)
            .ok_or_else(|| DecodeError::missing_attribute(scope, name))?;
        let attr = var
            .attribute(name)
            .ok_or_else(|| DecodeError::missing_attribute(scope, name))?;

        convert_attribute(name, attr.value()?)
    }

    fn dimension_size(&self, name: &str) -> Result<usize, DecodeError> {
        self.file
            .dimension(name)
            .map(|dim| dim.len())
            .ok_or_else(|| DecodeError::missing_dimension(name))
    }

    fn dimension_size_by_variable(&self, name: &str) -> Result<usize, DecodeError> {
        let var = self.variable(name)?;

        let first_dim = var.dimensions().first().ok_or_else(|| {
            DecodeError::MalformedDimension(format!("variable '{}' has no dimensions", name))
        })?;

        Ok(first_dim.len())
    }

    fn value_handle(&self, name: &str) -> Result<Self::Handle<'_>, DecodeError> {
        let var = self.variable(name)?;

        match self.mode {
            ReadMode::Indexed => Ok(NetcdfHandle::Indexed(var)),
            ReadMode::Buffered => Ok(NetcdfHandle::Buffered(var.get_values::<Float, _>(..)?)),
        }
    }

    fn value<'a>(&'a self, handle: &Self::Handle<'a>, index: usize) -> Result<Float, DecodeError> {
        match handle {
            NetcdfHandle::Indexed(var) => Ok(var.get_value::<Float, _>([index].as_slice())?),
            NetcdfHandle::Buffered(values) => buffered_value(values, index),
        }
    }

    fn value_2d<'a>(
        &'a self,
        handle: &Self::Handle<'a>,
        index: usize,
        row: usize,
        col: usize,
    ) -> Result<Float, DecodeError> {
        match handle {
            NetcdfHandle::Indexed(var) => Ok(var.get_value::<Float, _>([row, col].as_slice())?),
            NetcdfHandle::Buffered(values) => buffered_value(values, index),
        }
    }
}

fn buffered_value(values: &[Float], index: usize) -> Result<Float, DecodeError> {
    values.get(index).copied().ok_or_else(|| {
        DecodeError::MalformedDimension(format!(
            "index {} out of {} stored values",
            index,
            values.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::{NetcdfHandle, NetcdfSource, ReadMode};
    use crate::errors::DecodeError;
    use crate::source::{AttrValue, DataSource};
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, TempDir};

    fn write_sample(dir: &Path) -> PathBuf {
        let path = dir.join("Velocity.netcdf");
        let mut file = netcdf::create(&path).unwrap();

        file.add_attribute("DataType", "RadialSet").unwrap();
        file.add_attribute("Elevation", 0.5f64).unwrap();
        file.add_attribute("Time", 1428000000i32).unwrap();

        file.add_dimension("Azimuth", 2).unwrap();
        file.add_dimension("Gate", 3).unwrap();
        file.add_dimension("empty", 0).unwrap();

        {
            let mut var = file.add_variable::<f32>("Velocity", &["Azimuth", "Gate"]).unwrap();
            var.put_attribute("Units", "MetersPerSecond").unwrap();
            var.put_attribute("BackgroundValue", -99900.0f32).unwrap();
            var.put_values(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], ..).unwrap();
        }

        {
            let mut var = file.add_variable::<f32>("BeamWidth", &["Azimuth"]).unwrap();
            var.put_values(&[0.95f32, 0.95], ..).unwrap();
        }

        file.add_variable::<f32>("nothing", &["empty"]).unwrap();

        path
    }

    fn sample() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = write_sample(dir.path());
        (dir, path)
    }

    #[test]
    fn reads_attributes() {
        let (_dir, path) = sample();
        let source = NetcdfSource::open(&path, ReadMode::Indexed).unwrap();

        assert!(source.has_attribute("", "DataType"));
        assert!(!source.has_attribute("", "BackgroundValue"));
        assert!(source.has_attribute("Velocity", "BackgroundValue"));
        assert!(!source.has_attribute("Reflectivity", "BackgroundValue"));

        assert_eq!(
            source.attribute("", "DataType").unwrap(),
            AttrValue::Text("RadialSet".to_string())
        );
        assert_eq!(source.float_attribute("", "Elevation").unwrap(), 0.5);
        assert_eq!(
            source.attribute("", "Time").unwrap().as_int("Time").unwrap(),
            1428000000
        );
        assert_eq!(
            source.float_attribute("Velocity", "BackgroundValue").unwrap(),
            -99900.0
        );

        assert!(matches!(
            source.attribute("", "Latitude"),
            Err(DecodeError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn reads_dimensions() {
        let (_dir, path) = sample();
        let source = NetcdfSource::open(&path, ReadMode::Indexed).unwrap();

        assert!(source.has_dimension("Gate"));
        assert!(source.has_dimension("BeamWidth"));
        assert!(!source.has_dimension("nothing"));
        assert!(!source.has_dimension("AzimuthalSpacing"));

        assert_eq!(source.dimension_size("Azimuth").unwrap(), 2);
        assert_eq!(source.dimension_size_by_variable("Velocity").unwrap(), 2);
        assert_eq!(source.dimension_size_by_variable("nothing").unwrap(), 0);

        assert!(matches!(
            source.dimension_size("pixel"),
            Err(DecodeError::MalformedDimension(_))
        ));
        assert!(matches!(
            source.dimension_size_by_variable("pixel_count"),
            Err(DecodeError::MissingVariable(_))
        ));
    }

    #[test]
    fn both_modes_read_same_values() {
        let (_dir, path) = sample();

        for mode in [ReadMode::Indexed, ReadMode::Buffered] {
            let source = NetcdfSource::open(&path, mode).unwrap();
            assert_eq!(source.mode(), mode);

            let handle = source.value_handle("Velocity").unwrap();

            match (&handle, mode) {
                (NetcdfHandle::Indexed(_), ReadMode::Indexed) => (),
                (NetcdfHandle::Buffered(values), ReadMode::Buffered) => assert_eq!(values.len(), 6),
                _ => panic!("Handle does not match read mode"),
            }

            assert_eq!(source.value_2d(&handle, 4, 1, 1).unwrap(), 5.0);
            assert_eq!(source.value_2d(&handle, 2, 0, 2).unwrap(), 3.0);

            let beam_width = source.value_handle("BeamWidth").unwrap();
            assert!((source.value(&beam_width, 1).unwrap() - 0.95).abs() < 1e-6);

            source.close().unwrap();
        }
    }

    #[test]
    fn opens_gzipped_file() {
        let (dir, path) = sample();
        let raw = std::fs::read(&path).unwrap();

        let gz_path = dir.path().join("Velocity.netcdf.gz");
        let mut encoder = GzEncoder::new(
            std::fs::File::create(&gz_path).unwrap(),
            Compression::default(),
        );
        encoder.write_all(&raw).unwrap();
        encoder.finish().unwrap();

        let source = NetcdfSource::open(&gz_path, ReadMode::Buffered).unwrap();
        let temp_path = source
            .decompressed
            .as_ref()
            .map(|temp| temp.path().to_path_buf())
            .unwrap();

        assert!(temp_path.exists());
        assert_eq!(source.dimension_size("Gate").unwrap(), 3);

        source.close().unwrap();
        assert!(!temp_path.exists());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();

        assert!(NetcdfSource::open(&dir.path().join("none.netcdf"), ReadMode::Indexed).is_err());
        assert!(matches!(
            NetcdfSource::open(&dir.path().join("none.netcdf.gz"), ReadMode::Indexed),
            Err(DecodeError::Io(_))
        ));
    }
}
