use std::ops::{Index, IndexMut};

use rayon::prelude::*;

pub mod seed;
pub mod step;

/// A 2D grid of intensities, stored row-major.
///
/// The size is fixed at construction; there is no way to resize a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    width: usize,
    height: usize,
    cells: Vec<f32>,
}

impl ScalarField {
    /// Creates a zero-filled field. Returns `None` if either dimension is zero.
    pub fn new(width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let len = width.checked_mul(height)?;
        Some(Self {
            width,
            height,
            cells: vec![0.0; len],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.offset(row, col).map(|i| self.cells[i])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut f32> {
        self.offset(row, col).map(move |i| &mut self.cells[i])
    }

    /// All cells, row 0 first. This is the exact layout uploaded to the GPU.
    pub fn as_slice(&self) -> &[f32] {
        &self.cells
    }

    pub(crate) fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = &mut [f32]> + '_ {
        self.cells.par_chunks_exact_mut(self.width)
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        self.contains(row, col).then(|| row * self.width + col)
    }
}

impl Index<(usize, usize)> for ScalarField {
    type Output = f32;

    /// Panics if `(row, col)` lies outside the field.
    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        match self.offset(row, col) {
            Some(i) => &self.cells[i],
            None => panic!(
                "cell ({row}, {col}) out of bounds for {}x{} field",
                self.width, self.height
            ),
        }
    }
}

impl IndexMut<(usize, usize)> for ScalarField {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        let (width, height) = (self.width, self.height);
        match self.offset(row, col) {
            Some(i) => &mut self.cells[i],
            None => panic!("cell ({row}, {col}) out of bounds for {width}x{height} field"),
        }
    }
}
