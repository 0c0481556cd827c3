use regqa_core::error::{codes, AppError};
use serde::{Deserialize, Serialize};

use super::similarity::squared_l2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Build-once, query-many nearest-neighbour index over positional vectors.
///
/// Results are ordered by ascending distance, ties by lower position. An
/// approximate implementation can replace [`FlatIndex`] behind this trait.
pub trait VectorIndex: Send + Sync {
    fn dims(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, AppError>;
}

/// Exact linear scan over squared Euclidean distance. Vectors are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dims: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn build(dims: usize, vectors: &[Vec<f32>]) -> Result<Self, AppError> {
        if dims == 0 {
            return Err(AppError::new(
                codes::CONFIG_DIMENSION_MISMATCH,
                "Vector index dimensionality must be at least 1",
            ));
        }
        let mut data = Vec::with_capacity(dims * vectors.len());
        for (pos, v) in vectors.iter().enumerate() {
            if v.len() != dims {
                return Err(dimension_mismatch(dims, v.len())
                    .with_details(format!("position={pos}; expected={dims}; got={}", v.len())));
            }
            if !is_finite(v) {
                return Err(non_finite("indexed").with_details(format!("position={pos}")));
            }
            data.extend_from_slice(v);
        }
        Ok(Self { dims, data })
    }

    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dims)?;
        self.data.get(start..start + self.dims)
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.data.chunks(self.dims).map(|r| r.to_vec()).collect()
    }
}

impl VectorIndex for FlatIndex {
    fn dims(&self) -> usize {
        self.dims
    }

    fn len(&self) -> usize {
        self.data.len() / self.dims
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, AppError> {
        if query.len() != self.dims {
            return Err(dimension_mismatch(self.dims, query.len()));
        }
        if !is_finite(query) {
            return Err(non_finite("query"));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Neighbor> = self
            .data
            .chunks(self.dims)
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: squared_l2(query, row),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

fn is_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn non_finite(which: &str) -> AppError {
    AppError::new(
        codes::DATA_NON_FINITE_VECTOR,
        "Vector contains NaN or infinite values",
    )
    .with_details(format!("vector={which}"))
}

fn dimension_mismatch(expected: usize, got: usize) -> AppError {
    AppError::new(
        codes::CONFIG_DIMENSION_MISMATCH,
        "Vector width does not match the index dimensionality",
    )
    .with_details(format!("expected={expected}; got={got}"))
}
