//! Face descriptor model.
//!
//! A face encoding is the 128-dimensional descriptor produced by the capture
//! device's face model. It is stored in `facial_data.face_encoding` as 1024
//! bytes of little-endian `f64`.

use serde::Deserialize;

use crate::error::AppError;

/// Number of dimensions in a face descriptor.
pub const ENCODING_DIMENSIONS: usize = 128;

/// Size of a stored descriptor BLOB.
pub const ENCODING_BLOB_LEN: usize = ENCODING_DIMENSIONS * 8;

/// A validated 128-d face descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceEncoding(Vec<f64>);

impl FaceEncoding {
    /// Validate raw values submitted by a client.
    pub fn new(values: Vec<f64>) -> Result<Self, AppError> {
        if values.len() != ENCODING_DIMENSIONS {
            return Err(AppError::InvalidRequest(format!(
                "Face encoding must have {} values, got {}",
                ENCODING_DIMENSIONS,
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::InvalidRequest(
                "Face encoding contains non-finite values".to_string(),
            ));
        }
        Ok(Self(values))
    }

    /// Element-wise mean of several samples of the same face.
    pub fn mean(samples: &[FaceEncoding]) -> Option<Self> {
        let first = samples.first()?;
        let mut sum = vec![0.0; first.0.len()];
        for sample in samples {
            for (acc, v) in sum.iter_mut().zip(&sample.0) {
                *acc += v;
            }
        }
        let n = samples.len() as f64;
        Some(Self(sum.into_iter().map(|v| v / n).collect()))
    }

    /// Euclidean distance between two descriptors.
    pub fn distance(&self, other: &FaceEncoding) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn to_blob(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Decode a stored BLOB. Returns `None` for a malformed blob.
    pub fn from_blob(blob: &[u8]) -> Option<Self> {
        if blob.len() != ENCODING_BLOB_LEN {
            return None;
        }
        let values = blob
            .chunks_exact(8)
            .map(|chunk| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                f64::from_le_bytes(bytes)
            })
            .collect();
        Some(Self(values))
    }
}

/// A row of `facial_data` joined for matching.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FaceRow {
    pub employee_id: i64,
    pub face_encoding: Vec<u8>,
}

/// Request body for `POST /api/recognize-face`.
///
/// ```json
/// { "encoding": [0.0123, -0.0456, ...] }
/// ```
#[derive(Debug, Deserialize)]
pub struct RecognizeRequest {
    pub encoding: Vec<f64>,
}

/// Request body for `POST /api/employees/{id}/face`.
///
/// Accepts one or more samples; they are averaged before storage.
#[derive(Debug, Deserialize)]
pub struct EnrollFaceRequest {
    pub encodings: Vec<Vec<f64>>,
}
