//! Layer-size specification.
//!
//! A network is declared by its hidden layers only. The input and output widths
//! are deduced from the training data when the network is bound, so the full
//! size list is `[input_dim, hidden..., output_dim]`.
//!
//! ```rust
//! use splearn::{LayerSpec, DEFAULT_HIDDEN_LAYERS};
//!
//! # fn main() -> splearn::Result<()> {
//! assert_eq!(LayerSpec::from(9_usize).hidden_sizes()?, vec![9; DEFAULT_HIDDEN_LAYERS]);
//! assert_eq!(LayerSpec::uniform(9, 2).hidden_sizes()?, vec![9, 9]);
//! assert_eq!(LayerSpec::from([3_usize, 1, 4]).hidden_sizes()?, vec![3, 1, 4]);
//! assert_eq!("2x3".parse::<LayerSpec>()?.hidden_sizes()?, vec![2, 2, 2]);
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use crate::{Error, Result};

/// Hidden layer count used when a network is declared by a single size.
pub const DEFAULT_HIDDEN_LAYERS: usize = 5;

// Largest width whose `f32` buffer fits an allocation.
const MAX_LAYER_SIZE: usize = isize::MAX as usize / std::mem::size_of::<f32>();
// Leaves room for the input and output trace slots.
const MAX_HIDDEN_LAYERS: usize = isize::MAX as usize / std::mem::size_of::<Vec<f32>>() - 2;

/// Declared shape of the hidden layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSpec {
    /// `count` hidden layers of `size` neurons each.
    Uniform { size: usize, count: usize },
    /// One hidden layer per entry, in order.
    Explicit(Vec<usize>),
}

impl LayerSpec {
    #[inline]
    pub fn uniform(size: usize, count: usize) -> Self {
        LayerSpec::Uniform { size, count }
    }

    #[inline]
    pub fn explicit(sizes: impl Into<Vec<usize>>) -> Self {
        LayerSpec::Explicit(sizes.into())
    }

    /// Check sizes and counts without building anything.
    pub fn validate(&self) -> Result<()> {
        match self {
            LayerSpec::Uniform { size, count } => {
                if *size == 0 {
                    return Err(Error::InvalidConfig("layer size must be > 0".to_owned()));
                }
                if *count == 0 {
                    return Err(Error::InvalidConfig(
                        "hidden layer count must be > 0".to_owned(),
                    ));
                }
                if *size > MAX_LAYER_SIZE {
                    return Err(Error::InvalidConfig(format!("layer size {size} is too large")));
                }
                if *count > MAX_HIDDEN_LAYERS {
                    return Err(Error::InvalidConfig(format!(
                        "hidden layer count {count} is too large"
                    )));
                }
            }
            LayerSpec::Explicit(sizes) => {
                if sizes.is_empty() {
                    return Err(Error::InvalidConfig(
                        "at least one hidden layer is required".to_owned(),
                    ));
                }
                if let Some(idx) = sizes.iter().position(|&s| s == 0) {
                    return Err(Error::InvalidConfig(format!(
                        "hidden layer {idx} has size 0; all layer sizes must be > 0"
                    )));
                }
                if let Some(idx) = sizes.iter().position(|&s| s > MAX_LAYER_SIZE) {
                    return Err(Error::InvalidConfig(format!(
                        "hidden layer {idx} has size {} which is too large",
                        sizes[idx]
                    )));
                }
            }
        }
        Ok(())
    }

    /// Hidden layer sizes, in order.
    pub fn hidden_sizes(&self) -> Result<Vec<usize>> {
        self.validate()?;
        Ok(match self {
            LayerSpec::Uniform { size, count } => vec![*size; *count],
            LayerSpec::Explicit(sizes) => sizes.clone(),
        })
    }
}

impl From<usize> for LayerSpec {
    fn from(size: usize) -> Self {
        LayerSpec::uniform(size, DEFAULT_HIDDEN_LAYERS)
    }
}

impl From<Vec<usize>> for LayerSpec {
    fn from(sizes: Vec<usize>) -> Self {
        LayerSpec::Explicit(sizes)
    }
}

impl From<&[usize]> for LayerSpec {
    fn from(sizes: &[usize]) -> Self {
        LayerSpec::Explicit(sizes.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for LayerSpec {
    fn from(sizes: [usize; N]) -> Self {
        LayerSpec::Explicit(sizes.to_vec())
    }
}

/// Parses `"9"` (uniform, default count), `"9x5"` (uniform) or `"3,4,5"` (explicit).
impl FromStr for LayerSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidConfig("empty layer spec".to_owned()));
        }

        let spec = if let Some((size, count)) = s.split_once(['x', 'X']) {
            LayerSpec::uniform(parse_size(size)?, parse_size(count)?)
        } else if s.contains(',') {
            let sizes = s.split(',').map(parse_size).collect::<Result<Vec<_>>>()?;
            LayerSpec::Explicit(sizes)
        } else {
            LayerSpec::from(parse_size(s)?)
        };

        spec.validate()?;
        Ok(spec)
    }
}

fn parse_size(token: &str) -> Result<usize> {
    let token = token.trim();
    token.parse::<usize>().map_err(|_| {
        Error::InvalidConfig(format!(
            "layer size must be a positive integer, got {token:?}"
        ))
    })
}

/// Full size list `[input_dim, hidden..., output_dim]`.
pub(crate) fn bind_sizes(
    hidden: &[usize],
    input_dim: usize,
    output_dim: usize,
) -> Result<Vec<usize>> {
    if input_dim == 0 {
        return Err(Error::InvalidShape("input width must be > 0".to_owned()));
    }
    if output_dim == 0 {
        return Err(Error::InvalidShape("output width must be > 0".to_owned()));
    }

    let mut sizes = Vec::with_capacity(hidden.len() + 2);
    sizes.push(input_dim);
    sizes.extend_from_slice(hidden);
    sizes.push(output_dim);

    for pair in sizes.windows(2) {
        let bytes = pair[0]
            .checked_add(1)
            .and_then(|cols| cols.checked_mul(pair[1]))
            .and_then(|len| len.checked_mul(std::mem::size_of::<f32>()))
            .filter(|&bytes| bytes <= isize::MAX as usize);
        if bytes.is_none() {
            return Err(Error::InvalidConfig(format!(
                "weight matrix {} x {} (+1 bias) is too large",
                pair[1], pair[0]
            )));
        }
    }
    Ok(sizes)
}
