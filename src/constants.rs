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

//! Module containing constants of the NSSL data convention.

use crate::Float;

///Value of cells where no data was measured.
///
///Every value less or equal to this one is treated as "no data"
///and is never written over the background of sparse grids.
pub const MISSING_DATA: Float = -99900.0;

///Value of cells where the measurement is range folded
pub const RANGE_FOLDED: Float = -99901.0;

///Value of cells where data is unavailable
pub const DATA_UNAVAILABLE: Float = -99903.0;

///Nyquist velocity assigned to radials of files
///without the `NyquistVelocity` variable
pub const MISSING_NYQUIST: Float = -99999.0;

///Image width of grids with no natural raster size
pub const DEFAULT_IMAGE_WIDTH: usize = 500;

///Image height of grids with no natural raster size
pub const DEFAULT_IMAGE_HEIGHT: usize = 200;

///Number of decoded samples between progress messages
pub const PROGRESS_INTERVAL: usize = 10_000;

///Format of the timestamps attached to grids
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

///File name extensions that can be read
pub const HANDLED_FILE_TYPES: [&str; 3] = ["netcdf", "nc", "gz"];

///File name given to grids before the source file is known
pub const UNKNOWN_FILE_NAME: &str = "Unknown Filename";
