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

//! Module with the decoded products handed over to collaborators.
//!
//! A [`Grid`] carries what every product has (time, type name,
//! source file, radar location) and a [`GridKind`] with the
//! geometry specific to polar or projected products.

use crate::constants::{
    DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH, TIME_FORMAT, UNKNOWN_FILE_NAME,
};
use crate::Float;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::any::Any;
use std::fmt;

/// Location of the radar (or grid reference point).
///
/// Height is in meters above sea level.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Origin {
    pub latitude: Float,
    pub longitude: Float,
    pub height: Float,
}

/// Metadata of a single radial of a sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Radial {
    pub azimuth: Float,
    pub beamwidth: Float,
    pub azimuthal_spacing: Float,
    pub nyquist_velocity: Float,
    pub gate_width: i64,
}

/// One sweep of a radar, azimuth by gate.
#[derive(Clone, Debug, PartialEq)]
pub struct PolarGrid {
    values: Array2<Float>,
    elevation: Float,
    range_to_first_gate: Float,
    radials: Vec<Radial>,
}

impl PolarGrid {
    pub fn new(
        values: Array2<Float>,
        elevation: Float,
        range_to_first_gate: Float,
        radials: Vec<Radial>,
    ) -> Self {
        PolarGrid {
            values,
            elevation,
            range_to_first_gate,
            radials,
        }
    }

    pub fn values(&self) -> &Array2<Float> {
        &self.values
    }

    pub fn elevation(&self) -> Float {
        self.elevation
    }

    pub fn range_to_first_gate(&self) -> Float {
        self.range_to_first_gate
    }

    pub fn radials(&self) -> &[Radial] {
        &self.radials
    }

    pub fn num_radials(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_gates(&self) -> usize {
        self.values.ncols()
    }
}

/// Regular latitude-longitude grid.
///
/// Rows go southwards from the upper-left corner,
/// columns go eastwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectedGrid {
    values: Array2<Float>,
    latitude: Float,
    longitude: Float,
    lat_spacing: Float,
    lon_spacing: Float,
}

impl ProjectedGrid {
    pub fn new(
        values: Array2<Float>,
        latitude: Float,
        longitude: Float,
        lat_spacing: Float,
        lon_spacing: Float,
    ) -> Self {
        ProjectedGrid {
            values,
            latitude,
            longitude,
            lat_spacing,
            lon_spacing,
        }
    }

    pub fn values(&self) -> &Array2<Float> {
        &self.values
    }

    /// Upper-left corner as `(lon, lat)`.
    pub fn upper_left(&self) -> (Float, Float) {
        (self.longitude, self.latitude)
    }

    /// Lower-left corner as `(lon, lat)`.
    pub fn lower_left(&self) -> (Float, Float) {
        (
            self.longitude,
            self.latitude - self.lat_spacing * self.values.nrows() as Float,
        )
    }

    /// Cell size in degrees as `(lon, lat)`.
    pub fn cell_size(&self) -> (Float, Float) {
        (self.lon_spacing, self.lat_spacing)
    }

    pub fn cell_size_x(&self) -> Float {
        self.lon_spacing
    }

    pub fn cell_size_y(&self) -> Float {
        self.lat_spacing
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GridKind {
    Polar(PolarGrid),
    Projected(ProjectedGrid),
}

/// Opaque raster rendered from a grid by a collaborator.
pub struct RasterHandle(Box<dyn Any + Send>);

impl RasterHandle {
    pub fn new<T: Any + Send>(raster: T) -> Self {
        RasterHandle(Box::new(raster))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RasterHandle(..)")
    }
}

/// Decoded product.
///
/// Fully populated when returned from [`crate::product::classify_and_read`],
/// afterwards only the file name and the raster can be set.
#[derive(Debug)]
pub struct Grid {
    kind: GridKind,
    time: DateTime<Utc>,
    type_name: String,
    file_name: String,
    origin: Origin,
    raster: Option<RasterHandle>,
}

impl Grid {
    pub fn new(kind: GridKind, time: DateTime<Utc>, type_name: &str, origin: Origin) -> Self {
        Grid {
            kind,
            time,
            type_name: type_name.to_string(),
            file_name: UNKNOWN_FILE_NAME.to_string(),
            origin,
            raster: None,
        }
    }

    pub fn kind(&self) -> &GridKind {
        &self.kind
    }

    pub fn into_kind(self) -> GridKind {
        self.kind
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn time_string(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file_name: &str) {
        self.file_name = file_name.to_string();
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn matrix(&self) -> &Array2<Float> {
        match &self.kind {
            GridKind::Polar(grid) => grid.values(),
            GridKind::Projected(grid) => grid.values(),
        }
    }

    pub fn image_width(&self) -> usize {
        match &self.kind {
            GridKind::Projected(grid) => grid.values().ncols(),
            GridKind::Polar(_) => DEFAULT_IMAGE_WIDTH,
        }
    }

    pub fn image_height(&self) -> usize {
        match &self.kind {
            GridKind::Projected(grid) => grid.values().nrows(),
            GridKind::Polar(_) => DEFAULT_IMAGE_HEIGHT,
        }
    }

    pub fn attach_raster(&mut self, raster: RasterHandle) {
        self.raster = Some(raster);
    }

    pub fn raster(&self) -> Option<&RasterHandle> {
        self.raster.as_ref()
    }

    pub fn has_raster(&self) -> bool {
        self.raster.is_some()
    }

    /// Name of the product kind as written in the `DataType` attribute.
    pub fn product_name(&self) -> &'static str {
        match self.kind {
            GridKind::Polar(_) => "RadialSet",
            GridKind::Projected(_) => "LatLonGrid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Grid, GridKind, Origin, PolarGrid, ProjectedGrid, RasterHandle};
    use crate::constants::UNKNOWN_FILE_NAME;
    use chrono::{TimeZone, Utc};
    use float_cmp::approx_eq;
    use ndarray::Array2;

    fn projected() -> ProjectedGrid {
        ProjectedGrid::new(Array2::zeros((100, 250)), 45.0, -100.0, 0.01, 0.02)
    }

    #[test]
    fn projected_geometry() {
        let grid = projected();

        assert_eq!(grid.upper_left(), (-100.0, 45.0));

        let (lon, lat) = grid.lower_left();
        assert!(approx_eq!(f64, lon, -100.0, ulps = 2));
        assert!(approx_eq!(f64, lat, 44.0, epsilon = 1e-9));

        assert_eq!(grid.cell_size(), (0.02, 0.01));
        assert_eq!(grid.cell_size_x(), 0.02);
        assert_eq!(grid.cell_size_y(), 0.01);
    }

    #[test]
    fn image_size_follows_kind() {
        let time = Utc.timestamp_opt(0, 0).unwrap();

        let grid = Grid::new(
            GridKind::Projected(projected()),
            time,
            "Reflectivity",
            Origin::default(),
        );
        assert_eq!((grid.image_width(), grid.image_height()), (250, 100));
        assert_eq!(grid.product_name(), "LatLonGrid");

        let polar = PolarGrid::new(Array2::zeros((360, 1000)), 0.5, 2125.0, vec![]);
        assert_eq!((polar.num_radials(), polar.num_gates()), (360, 1000));

        let grid = Grid::new(GridKind::Polar(polar), time, "Velocity", Origin::default());
        assert_eq!((grid.image_width(), grid.image_height()), (500, 200));
        assert_eq!(grid.matrix().dim(), (360, 1000));
        assert_eq!(grid.product_name(), "RadialSet");
    }

    #[test]
    fn base_metadata() {
        let time = Utc.timestamp_opt(1428000000, 0).unwrap();
        let origin = Origin {
            latitude: 35.33,
            longitude: -97.27,
            height: 390.0,
        };
        let mut grid = Grid::new(GridKind::Projected(projected()), time, "MESH", origin);

        assert_eq!(grid.time(), time);
        assert_eq!(grid.time_string(), "2015-04-02 18:40:00 UTC");
        assert_eq!(grid.type_name(), "MESH");
        assert_eq!(grid.origin(), origin);
        assert_eq!(grid.file_name(), UNKNOWN_FILE_NAME);

        grid.set_file_name("MESH_20150402");
        assert_eq!(grid.file_name(), "MESH_20150402");
    }

    #[test]
    fn raster_is_attached_later() {
        let time = Utc.timestamp_opt(0, 0).unwrap();
        let mut grid = Grid::new(GridKind::Projected(projected()), time, "MESH", Origin::default());

        assert!(!grid.has_raster());

        grid.attach_raster(RasterHandle::new(vec![0u8; 4]));

        assert!(grid.has_raster());
        let raster = grid.raster().unwrap();
        assert_eq!(raster.downcast_ref::<Vec<u8>>(), Some(&vec![0u8; 4]));
        assert!(raster.downcast_ref::<String>().is_none());
    }
}
