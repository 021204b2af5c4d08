//! Face matching service.
//!
//! This service handles:
//! - Matching a scanned descriptor against the enrolled gallery
//! - Caching the gallery in memory with a TTL
//! - Enrolling descriptors for employees
//!
//! # Matching
//!
//! Matching walks a tolerance ladder: the configured tolerance first, then
//! two progressively more lenient steps. A step is only tried when the
//! closest known face is within it, and the closest face among those inside
//! the accepted tolerance wins.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use sqlx::SqliteConnection;
use tokio::sync::RwLock;

use crate::{
    db::DbPool,
    error::AppError,
    models::face::{FaceEncoding, FaceRow},
};

/// Offsets added to the base tolerance, tried in order.
pub const TOLERANCE_STEPS: [f64; 3] = [0.0, 0.05, 0.10];

/// Result of matching a candidate against the gallery.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// `index` into the gallery of the best accepted face
    Matched {
        index: usize,
        distance: f64,
        tolerance: f64,
    },
    /// No face within the most lenient tolerance
    NotRecognized { min_distance: f64, similarity: f64 },
}

/// Match `candidate` against `known` using the tolerance ladder.
///
/// Returns `None` when `known` is empty.
pub fn match_face(known: &[FaceEncoding], candidate: &FaceEncoding, tolerance: f64) -> Option<MatchOutcome> {
    let distances: Vec<f64> = known.iter().map(|k| k.distance(candidate)).collect();

    let (min_index, min_distance) = distances
        .iter()
        .copied()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    tracing::debug!(
        "Minimum face distance: {:.4} (threshold: {:.2})",
        min_distance,
        tolerance
    );

    for step in TOLERANCE_STEPS {
        let current = tolerance + step;
        if min_distance > current {
            tracing::debug!("No match within tolerance {:.2}", current);
            continue;
        }

        // The global minimum is always inside the accepted tolerance, so it is
        // also the best match among all faces within it.
        return Some(MatchOutcome::Matched {
            index: min_index,
            distance: min_distance,
            tolerance: current,
        });
    }

    Some(MatchOutcome::NotRecognized {
        min_distance,
        similarity: (1.0 - min_distance) * 100.0,
    })
}

/// Snapshot of every enrolled descriptor.
#[derive(Debug, Default)]
pub struct Gallery {
    pub employee_ids: Vec<i64>,
    pub encodings: Vec<FaceEncoding>,
}

impl Gallery {
    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }
}

struct CachedGallery {
    loaded_at: Instant,
    gallery: Arc<Gallery>,
}

/// In-memory gallery cache shared by all requests.
///
/// The gallery is reloaded when older than the TTL or after
/// [`invalidate`](FaceGallery::invalidate). Empty galleries are not cached so
/// the first enrollment is picked up immediately.
///
/// Every invalidation bumps `generation`. A reload only stores its snapshot
/// when no invalidation happened since it started, so a snapshot read before
/// an enrollment committed is never cached.
pub struct FaceGallery {
    ttl: Duration,
    generation: AtomicU64,
    cached: RwLock<Option<CachedGallery>>,
}

impl FaceGallery {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            cached: RwLock::new(None),
        }
    }

    /// Return the cached gallery, loading it from the database when stale.
    pub async fn get(&self, pool: &DbPool) -> Result<Arc<Gallery>, AppError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            let age = cached.loaded_at.elapsed();
            if age < self.ttl {
                tracing::debug!("Using cached face encodings (age: {:.1}s)", age.as_secs_f64());
                return Ok(cached.gallery.clone());
            }
        }

        let generation = self.generation.load(Ordering::Acquire);
        tracing::debug!("Cache miss - loading faces from database");
        let gallery = Arc::new(load_gallery(pool).await?);

        if !gallery.is_empty() {
            let mut cached = self.cached.write().await;
            if self.generation.load(Ordering::Acquire) == generation {
                *cached = Some(CachedGallery {
                    loaded_at: Instant::now(),
                    gallery: gallery.clone(),
                });
                tracing::debug!("Face cache updated with {} encodings", gallery.len());
            } else {
                tracing::debug!("Face cache invalidated during reload, snapshot not stored");
            }
        }

        Ok(gallery)
    }

    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *cached = None;
        tracing::info!("Face cache cleared");
    }
}

/// Load every stored descriptor. Malformed blobs are skipped with a warning.
pub async fn load_gallery(pool: &DbPool) -> Result<Gallery, AppError> {
    let rows = sqlx::query_as::<_, FaceRow>(
        "SELECT employee_id, face_encoding FROM facial_data ORDER BY employee_id",
    )
    .fetch_all(pool)
    .await?;

    let mut gallery = Gallery::default();
    for row in rows {
        match FaceEncoding::from_blob(&row.face_encoding) {
            Some(encoding) => {
                gallery.employee_ids.push(row.employee_id);
                gallery.encodings.push(encoding);
            }
            None => tracing::warn!(
                "Skipping malformed face encoding for employee {}",
                row.employee_id
            ),
        }
    }

    Ok(gallery)
}

/// Identify the employee behind `candidate`.
///
/// # Errors
///
/// - `NoRegisteredFaces`: nobody is enrolled
/// - `FaceNotRecognized`: the closest face is beyond every tolerance step
pub async fn identify(
    pool: &DbPool,
    faces: &FaceGallery,
    candidate: &FaceEncoding,
    tolerance: f64,
) -> Result<i64, AppError> {
    let gallery = faces.get(pool).await?;

    match match_face(&gallery.encodings, candidate, tolerance) {
        None => {
            tracing::error!("No registered employees found in database");
            Err(AppError::NoRegisteredFaces)
        }
        Some(MatchOutcome::NotRecognized {
            min_distance,
            similarity,
        }) => {
            tracing::warn!(
                "Face not recognized - distance too high: {:.4}, similarity: {:.1}%",
                min_distance,
                similarity
            );
            Err(AppError::FaceNotRecognized { similarity })
        }
        Some(MatchOutcome::Matched {
            index,
            distance,
            tolerance,
        }) => {
            let employee_id = gallery.employee_ids[index];
            tracing::info!(
                "Face match found: employee_id={}, distance={:.4}, tolerance={:.2}",
                employee_id,
                distance,
                tolerance
            );
            Ok(employee_id)
        }
    }
}

/// Average `samples` into one descriptor.
///
/// # Errors
///
/// - `InvalidRequest`: no samples, or a sample is not a valid descriptor
pub fn mean_encoding(samples: &[Vec<f64>]) -> Result<FaceEncoding, AppError> {
    let encodings = samples
        .iter()
        .cloned()
        .map(FaceEncoding::new)
        .collect::<Result<Vec<_>, _>>()?;

    FaceEncoding::mean(&encodings).ok_or_else(|| {
        AppError::InvalidRequest("At least one face encoding is required".to_string())
    })
}

/// Upsert the descriptor row. Callers own the transaction and must
/// invalidate the gallery after committing.
pub async fn store_encoding(
    conn: &mut SqliteConnection,
    employee_id: i64,
    encoding: &FaceEncoding,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO facial_data (employee_id, face_encoding)
        VALUES (?, ?)
        ON CONFLICT(employee_id) DO UPDATE SET face_encoding = excluded.face_encoding
        "#,
    )
    .bind(employee_id)
    .bind(encoding.to_blob())
    .execute(conn)
    .await?;

    Ok(())
}

/// Store (or replace) an employee's descriptor as the mean of `samples`.
///
/// # Errors
///
/// - `InvalidRequest`: no samples, or a sample is not a valid descriptor
/// - `EmployeeNotFound`: the employee does not exist
pub async fn enroll(
    pool: &DbPool,
    faces: &FaceGallery,
    employee_id: i64,
    samples: &[Vec<f64>],
) -> Result<(), AppError> {
    let encoding = mean_encoding(samples)?;

    let mut tx = pool.begin().await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?)")
        .bind(employee_id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(AppError::EmployeeNotFound);
    }

    store_encoding(&mut tx, employee_id, &encoding).await?;
    tx.commit().await?;

    faces.invalidate().await;
    tracing::info!(
        "Face encoding saved for employee {} ({} samples)",
        employee_id,
        samples.len()
    );

    Ok(())
}
