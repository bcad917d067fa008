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

//! Module responsible for turning stored product values into a dense matrix.
//!
//! NSSL products are stored either densely, with every cell present,
//! or sparsely as a list of records. A sparse record holds a value,
//! its starting row (`pixel_x`), its starting column (`pixel_y`) and
//! optionally the number of consecutive cells it covers (`pixel_count`).
//! Runs continue along the row and wrap to the start of the next row.
//! Cells not covered by any record keep the background value.

use crate::constants::{MISSING_DATA, PROGRESS_INTERVAL};
use crate::diagnostics::Diagnostics;
use crate::errors::DecodeError;
use crate::source::DataSource;
use crate::Float;
use ndarray::Array2;
use std::mem;

pub const PIXEL_X: &str = "pixel_x";
pub const PIXEL_Y: &str = "pixel_y";
pub const PIXEL_COUNT: &str = "pixel_count";
pub const BACKGROUND_VALUE: &str = "BackgroundValue";

/// Decodes the `type_name` variable into a matrix, choosing
/// the sparse or dense layout with `sparse`.
pub fn decode_grid<S: DataSource>(
    source: &S,
    type_name: &str,
    row_field: &str,
    col_field: &str,
    sparse: bool,
    diag: Diagnostics,
) -> Result<Array2<Float>, DecodeError> {
    if sparse {
        diag.info(format_args!("Data type is SPARSE"));
        decode_sparse(source, type_name, row_field, col_field, diag)
    } else {
        diag.info(format_args!("Data is not SPARSE"));
        decode_dense(source, type_name, row_field, col_field, diag)
    }
}

/// Reads every cell of a densely stored product.
///
/// Values are copied as stored, sentinels included.
pub fn decode_dense<S: DataSource>(
    source: &S,
    type_name: &str,
    row_field: &str,
    col_field: &str,
    diag: Diagnostics,
) -> Result<Array2<Float>, DecodeError> {
    let (rows, cols, cells) = grid_shape(source, row_field, col_field)?;

    diag.info(format_args!("Data dimensions: {} x {}", rows, cols));

    let mut matrix = Array2::zeros((rows, cols));
    let handle = source.value_handle(type_name)?;
    let mut progress = Progress::new(cells, diag);

    for ((row, col), cell) in matrix.indexed_iter_mut() {
        let index = row * cols + col;
        *cell = source.value_2d(&handle, index, row, col)?;
        progress.tick();
    }

    progress.finish();

    Ok(matrix)
}

/// Reconstructs a sparsely stored product.
///
/// Fails with [`DecodeError::PixelOutOfBounds`] when any record,
/// or any cell of its run, lies outside the grid.
pub fn decode_sparse<S: DataSource>(
    source: &S,
    type_name: &str,
    row_field: &str,
    col_field: &str,
    diag: Diagnostics,
) -> Result<Array2<Float>, DecodeError> {
    let background = source.float_attribute(type_name, BACKGROUND_VALUE)?;
    diag.info(format_args!("Background value is {}", background));

    let num_pixels = source.dimension_size_by_variable(PIXEL_X)?;
    let have_count = has_pixel_count(source)?;

    let (rows, cols, _) = grid_shape(source, row_field, col_field)?;

    diag.info(format_args!(
        "Data dimensions: {} x {}, {} sparse records{}",
        rows,
        cols,
        num_pixels,
        if have_count { "" } else { " without run lengths" }
    ));

    let mut matrix = Array2::from_elem((rows, cols), background);

    let values = source.value_handle(type_name)?;
    let pixel_x = source.value_handle(PIXEL_X)?;
    let pixel_y = source.value_handle(PIXEL_Y)?;
    let pixel_count = if have_count {
        Some(source.value_handle(PIXEL_COUNT)?)
    } else {
        None
    };

    let mut progress = Progress::new(num_pixels, diag);

    for record in 0..num_pixels {
        let value = source.value(&values, record)?;
        let row = source.value(&pixel_x, record)?;
        let col = source.value(&pixel_y, record)?;

        let count = match &pixel_count {
            Some(handle) => source.value(handle, record)? as i64,
            None => 1,
        };

        let mut cursor = RunCursor::start(record, row as i64, col as i64, rows, cols)?;
        cursor.write(&mut matrix, value);

        for _ in 1..count {
            cursor.advance()?;
            cursor.write(&mut matrix, value);
        }

        progress.tick();
    }

    progress.finish();

    Ok(matrix)
}

/// Declared rows, columns and cell count of the grid.
///
/// Corrupted headers can declare dimensions whose product does not
/// fit in memory addressing at all, those are rejected before allocating.
fn grid_shape<S: DataSource>(
    source: &S,
    row_field: &str,
    col_field: &str,
) -> Result<(usize, usize, usize), DecodeError> {
    let rows = source.dimension_size(row_field)?;
    let cols = source.dimension_size(col_field)?;

    let cells = rows
        .checked_mul(cols)
        .filter(|cells| {
            cells
                .checked_mul(mem::size_of::<Float>())
                .map_or(false, |bytes| bytes <= isize::MAX as usize)
        })
        .ok_or_else(|| {
            DecodeError::MalformedDimension(format!(
                "grid of {} x {} cells is too large",
                rows, cols
            ))
        })?;

    Ok((rows, cols, cells))
}

/// Absence of `pixel_count` only means runs of length one,
/// any other failure is a real problem with the file.
fn has_pixel_count<S: DataSource>(source: &S) -> Result<bool, DecodeError> {
    match source.dimension_size_by_variable(PIXEL_COUNT) {
        Ok(_) => Ok(true),
        Err(DecodeError::MissingVariable(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Position within one run of a sparse record.
struct RunCursor {
    record: usize,
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
}

impl RunCursor {
    fn start(
        record: usize,
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    ) -> Result<Self, DecodeError> {
        if row < 0 || col < 0 || row as usize >= rows || col as usize >= cols {
            return Err(DecodeError::PixelOutOfBounds { record, row, col });
        }

        Ok(RunCursor {
            record,
            row: row as usize,
            col: col as usize,
            rows,
            cols,
        })
    }

    fn advance(&mut self) -> Result<(), DecodeError> {
        self.col += 1;

        if self.col == self.cols {
            self.col = 0;
            self.row += 1;
        }

        if self.row >= self.rows {
            return Err(DecodeError::PixelOutOfBounds {
                record: self.record,
                row: self.row as i64,
                col: self.col as i64,
            });
        }

        Ok(())
    }

    /// Values at or below [`MISSING_DATA`] leave the background untouched.
    fn write(&self, matrix: &mut Array2<Float>, value: Float) {
        if value > MISSING_DATA {
            matrix[[self.row, self.col]] = value;
        }
    }
}

struct Progress<'l> {
    done: usize,
    total: usize,
    diag: Diagnostics<'l>,
}

impl<'l> Progress<'l> {
    fn new(total: usize, diag: Diagnostics<'l>) -> Self {
        Progress {
            done: 0,
            total,
            diag,
        }
    }

    fn tick(&mut self) {
        self.done += 1;

        if self.done % PROGRESS_INTERVAL == 0 {
            self.diag.debug(format_args!(
                "Processed {} of {} data samples.",
                self.done, self.total
            ));
        }
    }

    fn finish(&self) {
        self.diag.info(format_args!(
            "Processed {} of {} data samples.",
            self.done, self.total
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_dense, decode_grid, decode_sparse};
    use crate::constants::MISSING_DATA;
    use crate::diagnostics::{capture::CaptureLogger, Diagnostics};
    use crate::errors::DecodeError;
    use crate::source::MemorySource;
    use log::Level;
    use ndarray::{arr2, Array2};

    fn sparse_source(
        rows: usize,
        cols: usize,
        background: f64,
        records: &[(f64, f64, f64)],
        counts: Option<&[f64]>,
    ) -> MemorySource {
        let source = MemorySource::new()
            .with_dimension("Lat", rows)
            .with_dimension("Lon", cols)
            .with_dimension("pixel", records.len())
            .with_attribute("Reflectivity", "BackgroundValue", background)
            .with_variable(
                "Reflectivity",
                &["pixel"],
                records.iter().map(|r| r.2).collect(),
            )
            .with_variable("pixel_x", &["pixel"], records.iter().map(|r| r.0).collect())
            .with_variable("pixel_y", &["pixel"], records.iter().map(|r| r.1).collect());

        match counts {
            Some(counts) => source.with_variable("pixel_count", &["pixel"], counts.to_vec()),
            None => source,
        }
    }

    fn sparse(source: &MemorySource) -> Result<Array2<f64>, DecodeError> {
        decode_sparse(
            source,
            "Reflectivity",
            "Lat",
            "Lon",
            Diagnostics::new(&CaptureLogger::default()),
        )
    }

    #[test]
    fn dense_matches_source() {
        let values: Vec<f64> = (0..12).map(|v| v as f64 * 1.5 - 3.0).collect();
        let source = MemorySource::new()
            .with_dimension("Azimuth", 3)
            .with_dimension("Gate", 4)
            .with_variable("Velocity", &["Azimuth", "Gate"], values.clone());

        let logger = CaptureLogger::default();
        let matrix = decode_dense(
            &source,
            "Velocity",
            "Azimuth",
            "Gate",
            Diagnostics::new(&logger),
        )
        .unwrap();

        assert_eq!(matrix.dim(), (3, 4));
        assert_eq!(matrix, Array2::from_shape_vec((3, 4), values).unwrap());
        assert!(logger.contains(Level::Info, "Processed 12 of 12 data samples."));
    }

    #[test]
    fn dense_keeps_sentinels() {
        let source = MemorySource::new()
            .with_dimension("Azimuth", 1)
            .with_dimension("Gate", 2)
            .with_variable("Velocity", &["Azimuth", "Gate"], vec![-99901.0, -99900.0]);

        let matrix = decode_dense(
            &source,
            "Velocity",
            "Azimuth",
            "Gate",
            Diagnostics::new(&CaptureLogger::default()),
        )
        .unwrap();

        assert_eq!(matrix, arr2(&[[-99901.0, -99900.0]]));
    }

    #[test]
    fn sparse_without_run_lengths() {
        let source = sparse_source(2, 2, MISSING_DATA, &[(0.0, 0.0, 5.0), (0.0, 1.0, 7.0)], None);

        assert_eq!(
            sparse(&source).unwrap(),
            arr2(&[[5.0, 7.0], [-99900.0, -99900.0]])
        );
    }

    #[test]
    fn sparse_run_wraps_to_next_row() {
        let source = sparse_source(2, 2, 0.0, &[(0.0, 1.0, 9.0)], Some(&[3.0]));

        assert_eq!(sparse(&source).unwrap(), arr2(&[[0.0, 9.0], [9.0, 9.0]]));
    }

    #[test]
    fn sparse_runs_fill_consecutive_cells() {
        let source = sparse_source(
            3,
            4,
            -1.0,
            &[(0.0, 2.0, 10.0), (2.0, 0.0, 20.0), (2.0, 3.0, 30.0)],
            Some(&[4.0, 2.0, 1.0]),
        );

        assert_eq!(
            sparse(&source).unwrap(),
            arr2(&[
                [-1.0, -1.0, 10.0, 10.0],
                [10.0, 10.0, -1.0, -1.0],
                [20.0, 20.0, -1.0, 30.0]
            ])
        );
    }

    #[test]
    fn missing_values_never_overwrite_background() {
        let source = sparse_source(
            2,
            2,
            3.0,
            &[(0.0, 0.0, MISSING_DATA), (1.0, 0.0, -99901.0), (1.0, 1.0, -99899.0)],
            Some(&[2.0, 1.0, 1.0]),
        );

        assert_eq!(sparse(&source).unwrap(), arr2(&[[3.0, 3.0], [3.0, -99899.0]]));
    }

    #[test]
    fn run_past_last_cell_is_an_error() {
        let source = sparse_source(2, 2, 0.0, &[(1.0, 1.0, 4.0)], Some(&[2.0]));

        match sparse(&source) {
            Err(DecodeError::PixelOutOfBounds { record, row, col }) => {
                assert_eq!(record, 0);
                assert_eq!(row, 2);
                assert_eq!(col, 0);
            }
            other => panic!("Expected PixelOutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn record_outside_grid_is_an_error() {
        let source = sparse_source(2, 2, 0.0, &[(0.0, 0.0, 1.0), (0.0, 2.0, 4.0)], None);
        assert!(matches!(
            sparse(&source),
            Err(DecodeError::PixelOutOfBounds { record: 1, row: 0, col: 2 })
        ));

        let source = sparse_source(2, 2, 0.0, &[(-1.0, 0.0, 4.0)], None);
        assert!(matches!(
            sparse(&source),
            Err(DecodeError::PixelOutOfBounds { record: 0, row: -1, col: 0 })
        ));
    }

    #[test]
    fn background_value_is_required() {
        let source = MemorySource::new()
            .with_dimension("Lat", 1)
            .with_dimension("Lon", 1)
            .with_dimension("pixel", 0)
            .with_variable("Reflectivity", &["pixel"], vec![])
            .with_variable("pixel_x", &["pixel"], vec![])
            .with_variable("pixel_y", &["pixel"], vec![]);

        match sparse(&source) {
            Err(DecodeError::MissingAttribute { scope, name }) => {
                assert_eq!(scope, "Reflectivity");
                assert_eq!(name, "BackgroundValue");
            }
            other => panic!("Expected MissingAttribute, got {:?}", other),
        }
    }

    #[test]
    fn broken_pixel_count_is_not_treated_as_absent() {
        // pixel_count exists but has no dimensions, which is a malformed file
        let source = sparse_source(2, 2, 0.0, &[(0.0, 0.0, 1.0)], None).with_variable(
            "pixel_count",
            &[],
            vec![1.0],
        );

        assert!(matches!(
            sparse(&source),
            Err(DecodeError::MalformedDimension(_))
        ));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let diag_logger = CaptureLogger::default();
        let diag = Diagnostics::new(&diag_logger);

        // product of dimensions overflows usize
        let source = sparse_source(1, 1, 0.0, &[], None)
            .with_dimension("Lat", usize::MAX / 2)
            .with_dimension("Lon", 3)
            .with_variable("Reflectivity", &["Lat", "Lon"], vec![]);

        match decode_dense(&source, "Reflectivity", "Lat", "Lon", diag) {
            Err(DecodeError::MalformedDimension(msg)) => assert!(msg.contains("too large")),
            other => panic!("Expected MalformedDimension, got {:?}", other),
        }
        assert!(matches!(
            sparse(&source),
            Err(DecodeError::MalformedDimension(_))
        ));

        // cell count fits, but the bytes needed for it do not
        let source = sparse_source(1, 1, 0.0, &[], None)
            .with_dimension("Lat", isize::MAX as usize / 4)
            .with_dimension("Lon", 1);

        assert!(matches!(
            sparse(&source),
            Err(DecodeError::MalformedDimension(_))
        ));
    }

    #[test]
    fn empty_sparse_grid_is_background() {
        let source = sparse_source(2, 3, MISSING_DATA, &[], None);

        assert_eq!(
            sparse(&source).unwrap(),
            Array2::from_elem((2, 3), MISSING_DATA)
        );
    }

    #[test]
    fn grid_reports_encoding() {
        let logger = CaptureLogger::default();
        let source = sparse_source(1, 1, 0.0, &[(0.0, 0.0, 2.0)], None);

        let matrix =
            decode_grid(&source, "Reflectivity", "Lat", "Lon", true, Diagnostics::new(&logger))
                .unwrap();

        assert_eq!(matrix, arr2(&[[2.0]]));
        assert!(logger.contains(Level::Info, "Data type is SPARSE"));
        assert!(logger.contains(Level::Info, "Background value is 0"));
    }
}
