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

//! Module recognising the kind of product stored in a file
//! and assembling the matching [`Grid`].

use crate::constants::MISSING_NYQUIST;
use crate::decoder::decode_grid;
use crate::diagnostics::Diagnostics;
use crate::errors::DecodeError;
use crate::grid::{Grid, GridKind, Origin, PolarGrid, ProjectedGrid, Radial};
use crate::source::DataSource;
use crate::Float;
use chrono::{DateTime, TimeZone, Utc};

const GLOBAL: &str = "";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductKind {
    RadialSet,
    LatLonGrid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    pub kind: ProductKind,
    pub sparse: bool,
}

/// Determines product kind and storage layout from the `DataType` attribute.
///
/// `SparseRadialSet` and `SparseLatLonGrid` are the sparse variants.
pub fn classify(data_type: &str) -> Result<Classification, DecodeError> {
    let sparse = data_type.contains("Sparse");

    let kind = if data_type.contains("RadialSet") {
        ProductKind::RadialSet
    } else if data_type.contains("LatLonGrid") {
        ProductKind::LatLonGrid
    } else {
        return Err(DecodeError::UnknownProductType(data_type.to_string()));
    };

    Ok(Classification { kind, sparse })
}

/// Reads the whole product from `source`.
pub fn classify_and_read<S: DataSource>(
    source: &S,
    diag: Diagnostics,
) -> Result<Grid, DecodeError> {
    if !source.has_attribute(GLOBAL, "DataType") {
        diag.error(format_args!("Required attribute DataType not found"));
        return Err(DecodeError::missing_attribute(GLOBAL, "DataType"));
    }

    let data_type = source.text_attribute(GLOBAL, "DataType")?;
    diag.info(format_args!("Data type is {}", data_type));

    let origin = Origin {
        latitude: source.float_attribute(GLOBAL, "Latitude")?,
        longitude: source.float_attribute(GLOBAL, "Longitude")?,
        height: source.float_attribute(GLOBAL, "Height")?,
    };

    diag.info(format_args!(
        "Origin latitude: {}, longitude: {}, height: {}",
        origin.latitude, origin.longitude, origin.height
    ));

    let classification = match classify(&data_type) {
        Ok(classification) => classification,
        Err(err) => {
            diag.error(format_args!("{}", err));
            return Err(err);
        }
    };

    let (kind, type_name) = match classification.kind {
        ProductKind::RadialSet => read_polar_grid(source, classification.sparse, diag)?,
        ProductKind::LatLonGrid => read_projected_grid(source, classification.sparse, diag)?,
    };

    let time = read_time(source, diag)?;

    Ok(Grid::new(kind, time, &type_name, origin))
}

fn read_polar_grid<S: DataSource>(
    source: &S,
    sparse: bool,
    diag: Diagnostics,
) -> Result<(GridKind, String), DecodeError> {
    let elevation = source.float_attribute(GLOBAL, "Elevation")?;
    let range_to_first_gate = source.float_attribute(GLOBAL, "RangeToFirstGate")?;
    let type_name = source.text_attribute(GLOBAL, "TypeName")?;

    diag.info(format_args!(
        "{} sweep at elevation {}, first gate at {} m",
        type_name, elevation, range_to_first_gate
    ));

    let values = decode_grid(source, &type_name, "Azimuth", "Gate", sparse, diag)?;
    let radials = read_radials(source, values.nrows(), diag)?;

    let grid = PolarGrid::new(values, elevation, range_to_first_gate, radials);

    Ok((GridKind::Polar(grid), type_name))
}

/// Reads per-radial metadata.
///
/// Files without `AzimuthalSpacing` get the beamwidth instead,
/// files without `NyquistVelocity` get [`MISSING_NYQUIST`].
fn read_radials<S: DataSource>(
    source: &S,
    num_radials: usize,
    diag: Diagnostics,
) -> Result<Vec<Radial>, DecodeError> {
    let azimuth = source.value_handle("Azimuth")?;
    let beamwidth = source.value_handle("BeamWidth")?;
    let gate_width = source.value_handle("GateWidth")?;

    let spacing = if source.has_dimension("AzimuthalSpacing") {
        Some(source.value_handle("AzimuthalSpacing")?)
    } else {
        None
    };

    let nyquist = if source.has_dimension("NyquistVelocity") {
        Some(source.value_handle("NyquistVelocity")?)
    } else {
        None
    };

    let mut radials = Vec::with_capacity(num_radials);

    for i in 0..num_radials {
        let beamwidth_i = source.value(&beamwidth, i)?;

        let radial = Radial {
            azimuth: source.value(&azimuth, i)?,
            beamwidth: beamwidth_i,
            azimuthal_spacing: match &spacing {
                Some(handle) => source.value(handle, i)?,
                None => beamwidth_i,
            },
            nyquist_velocity: match &nyquist {
                Some(handle) => source.value(handle, i)?,
                None => MISSING_NYQUIST,
            },
            gate_width: source.value(&gate_width, i)? as i64,
        };

        diag.debug(format_args!(
            "Radial {}: azimuth {}, beamwidth {}, spacing {}, nyquist {}, gate width {}",
            i,
            radial.azimuth,
            radial.beamwidth,
            radial.azimuthal_spacing,
            radial.nyquist_velocity,
            radial.gate_width
        ));

        radials.push(radial);
    }

    Ok(radials)
}

fn read_projected_grid<S: DataSource>(
    source: &S,
    sparse: bool,
    diag: Diagnostics,
) -> Result<(GridKind, String), DecodeError> {
    let latitude = source.float_attribute(GLOBAL, "Latitude")?;
    let longitude = source.float_attribute(GLOBAL, "Longitude")?;
    let lat_spacing = source.float_attribute(GLOBAL, "LatGridSpacing")?;
    let lon_spacing = source.float_attribute(GLOBAL, "LonGridSpacing")?;
    let type_name = source.text_attribute(GLOBAL, "TypeName")?;

    diag.info(format_args!(
        "{} grid from ({}, {}), spacing {} x {} deg",
        type_name, latitude, longitude, lat_spacing, lon_spacing
    ));

    let values = decode_grid(source, &type_name, "Lat", "Lon", sparse, diag)?;

    let grid = ProjectedGrid::new(values, latitude, longitude, lat_spacing, lon_spacing);

    Ok((GridKind::Projected(grid), type_name))
}

/// `Time` holds whole seconds since the epoch, the optional
/// `FractionalTime` the rest. Without `Time` the current time is used.
fn read_time<S: DataSource>(
    source: &S,
    diag: Diagnostics,
) -> Result<DateTime<Utc>, DecodeError> {
    if !source.has_attribute(GLOBAL, "Time") {
        diag.warn(format_args!("No Time attribute, using current time"));
        return Ok(Utc::now());
    }

    let seconds = source.attribute(GLOBAL, "Time")?.as_int("Time")?;

    let fraction: Float = if source.has_attribute(GLOBAL, "FractionalTime") {
        source.float_attribute(GLOBAL, "FractionalTime")?
    } else {
        0.0
    };

    let nanos = (fraction.clamp(0.0, 0.999_999_999) * 1e9) as u32;

    Utc.timestamp_opt(seconds, nanos)
        .single()
        .ok_or_else(|| DecodeError::InvalidAttribute {
            name: "Time".to_string(),
            reason: format!("{} is not a representable timestamp", seconds),
        })
}
