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

//! W2Grid reads weather radar products written by the NSSL
//! (WDSS-II) software into NetCDF files and reconstructs them
//! into dense, georeferenced 2D grids.
//!
//! Two product families are supported:
//!
//! - **RadialSet** - a single polar sweep of the radar (azimuth × gate),
//!   read into a [`grid::PolarGrid`],
//! - **LatLonGrid** - a field projected onto a regular latitude-longitude
//!   mesh, read into a [`grid::ProjectedGrid`].
//!
//! Both can be stored densely or in the NSSL sparse encoding, a list of
//! `(row, column, value, run length)` records over a background value.
//! The [`decoder`] module expands both encodings into full matrices.
//!
//! Files are accessed through the [`source::DataSource`] trait so the
//! decoding code does not depend on a particular NetCDF library.
//! [`product::classify_and_read`] is the main entry point: it inspects the
//! file attributes, picks the product type and encoding and returns
//! a populated [`grid::Grid`].
//!
//! Rendering, raster export and reporting are not part of this crate,
//! the decoded grid is handed over to them by the caller.

pub mod constants;
pub mod decoder;
pub mod diagnostics;
pub mod errors;
pub mod grid;
pub mod product;
pub mod runner;
pub mod source;


/// Floating point type used for all decoded values and coordinates.
pub type Float = f64;
