//! Row-major sample matrices.
//!
//! Both the features (X) and the targets (Y) passed to `fit` are `Samples`: a
//! validated 2-D array stored contiguously, one row per sample.

use crate::{Error, Result};

/// A 2-D array of samples with shape `(len, width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Samples {
    values: Vec<f32>,
    len: usize,
    width: usize,
}

impl Samples {
    /// Build from a flat buffer with shape `(len, width)`.
    pub fn from_flat(values: Vec<f32>, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidData("sample width must be > 0".to_owned()));
        }
        if values.is_empty() {
            return Err(Error::InvalidData("samples must not be empty".to_owned()));
        }
        if values.len() % width != 0 {
            return Err(Error::InvalidData(format!(
                "buffer length {} is not divisible by width {width}",
                values.len()
            )));
        }
        check_finite(&values)?;

        let len = values.len() / width;
        Ok(Self { values, len, width })
    }

    /// Build from per-sample rows (copies into contiguous storage).
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let first = rows
            .first()
            .ok_or_else(|| Error::InvalidData("samples must not be empty".to_owned()))?;

        let width = first.as_ref().len();
        if width == 0 {
            return Err(Error::InvalidData("sample width must be > 0".to_owned()));
        }

        let mut values = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Error::InvalidData(format!(
                    "row {i} has len {}, expected {width}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        check_finite(&values)?;

        Ok(Self {
            values,
            len: rows.len(),
            width,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The `idx`-th row.
    ///
    /// Panics if `idx >= len`.
    #[inline]
    pub fn row(&self, idx: usize) -> &[f32] {
        let start = idx * self.width;
        &self.values[start..start + self.width]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        self.values.chunks_exact(self.width)
    }
}

impl TryFrom<Vec<Vec<f32>>> for Samples {
    type Error = Error;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self> {
        Samples::from_rows(&rows)
    }
}

impl<const W: usize> TryFrom<&[[f32; W]]> for Samples {
    type Error = Error;

    fn try_from(rows: &[[f32; W]]) -> Result<Self> {
        Samples::from_rows(rows)
    }
}

fn check_finite(values: &[f32]) -> Result<()> {
    if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
        return Err(Error::InvalidData(format!(
            "value at flat index {idx} is not finite"
        )));
    }
    Ok(())
}
