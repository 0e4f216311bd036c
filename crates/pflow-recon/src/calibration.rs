//! Energy correction curves.
//!
//! Raw cluster energies systematically under- or over-measure the incident
//! particle energy; a pair of monotonic lookup tables (one per
//! calorimeter) maps raw deposited energy to a corrected estimate. The
//! curves are derived offline, loaded once at start-up, and read-only for
//! the rest of the run. A missing or malformed asset is fatal for the
//! whole run, so every failure here surfaces before the first event.
//!
//! # Asset format
//!
//! A curve is a JSON object with a `points` array of `[raw, corrected]`
//! pairs, raw values strictly increasing:
//!
//! ```json
//! { "points": [[0.0, 0.0], [1.0, 1.18], [4.0, 4.35]] }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// File name of the EM correction asset inside a calibration directory.
pub const EM_CURVE_FILE: &str = "ecal_correction.json";

/// File name of the hadronic correction asset inside a calibration
/// directory.
pub const HAD_CURVE_FILE: &str = "hcal_correction.json";

/// Errors raised while loading or validating correction curves.
///
/// All of these are run-fatal: reconstruction cannot start without valid
/// calibration data.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CalibrationError {
    /// The asset file could not be opened
    #[error("missing calibration asset '{path}': {source}")]
    AssetMissing {
        /// Path of the asset
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The asset file is not valid curve JSON
    #[error("failed to parse calibration asset '{path}': {source}")]
    ParseFailed {
        /// Path of the asset
        path: String,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// Too few points to interpolate
    #[error("correction curve needs at least {required} points, got {actual}")]
    TooFewPoints {
        /// Minimum number of points
        required: usize,
        /// Number of points supplied
        actual: usize,
    },

    /// A point coordinate is NaN or infinite
    #[error("correction curve point {index} is not finite")]
    NonFinitePoint {
        /// Index of the offending point
        index: usize,
    },

    /// Raw energies must be strictly increasing
    #[error("correction curve raw energy not strictly increasing at point {index}")]
    NonMonotonicRaw {
        /// Index of the offending point
        index: usize,
    },

    /// Corrected energies must be non-decreasing
    #[error("correction curve corrected energy decreases at point {index}")]
    NonMonotonicCorrected {
        /// Index of the offending point
        index: usize,
    },
}

/// On-disk form of a curve asset.
#[derive(Debug, Deserialize)]
struct CurveFile {
    points: Vec<(f64, f64)>,
}

/// A monotonic piecewise-linear mapping from raw to corrected energy.
///
/// Between knots the curve interpolates linearly; outside the tabulated
/// range the end segments extend linearly and the result is clamped to be
/// non-negative. Validation happens once at construction, so `evaluate`
/// is infallible.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionCurve {
    points: Vec<(f64, f64)>,
}

impl CorrectionCurve {
    /// Minimum number of points a curve must carry.
    pub const MIN_POINTS: usize = 2;

    /// Builds a curve from `(raw, corrected)` pairs.
    ///
    /// # Errors
    ///
    /// Fails if fewer than [`Self::MIN_POINTS`] points are given, any
    /// coordinate is non-finite, raw energies are not strictly
    /// increasing, or corrected energies decrease.
    pub fn from_points(points: Vec<(f64, f64)>) -> Result<Self, CalibrationError> {
        if points.len() < Self::MIN_POINTS {
            return Err(CalibrationError::TooFewPoints {
                required: Self::MIN_POINTS,
                actual: points.len(),
            });
        }
        for (index, &(raw, corrected)) in points.iter().enumerate() {
            if !raw.is_finite() || !corrected.is_finite() {
                return Err(CalibrationError::NonFinitePoint { index });
            }
        }
        for index in 1..points.len() {
            if points[index].0 <= points[index - 1].0 {
                return Err(CalibrationError::NonMonotonicRaw { index });
            }
            if points[index].1 < points[index - 1].1 {
                return Err(CalibrationError::NonMonotonicCorrected { index });
            }
        }
        Ok(Self { points })
    }

    /// The identity curve (corrected = raw), for tests and pass-through
    /// setups.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            points: vec![(0.0, 0.0), (1.0, 1.0)],
        }
    }

    /// Loads a curve from a JSON asset file.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::AssetMissing`] if the file cannot be opened,
    /// [`CalibrationError::ParseFailed`] on malformed JSON, plus the
    /// validation errors of [`Self::from_points`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CalibrationError::AssetMissing {
            path: path.display().to_string(),
            source,
        })?;
        let parsed: CurveFile =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                CalibrationError::ParseFailed {
                    path: path.display().to_string(),
                    source,
                }
            })?;
        let curve = Self::from_points(parsed.points)?;
        debug!(
            path = %path.display(),
            points = curve.n_points(),
            "loaded correction curve"
        );
        Ok(curve)
    }

    /// Evaluates the curve at a raw energy.
    ///
    /// Linear interpolation between knots; linear extrapolation along the
    /// end segments outside the tabulated range; never negative.
    #[must_use]
    pub fn evaluate(&self, raw: f64) -> f64 {
        let pts = &self.points;
        let last = pts.len() - 1;

        // Pick the segment whose upper knot first reaches `raw`; beyond
        // the table the end segment extrapolates.
        let mut hi = last;
        for i in 1..=last {
            if raw <= pts[i].0 {
                hi = i;
                break;
            }
        }
        let (x0, y0) = pts[hi - 1];
        let (x1, y1) = pts[hi];

        let t = (raw - x0) / (x1 - x0);
        let corrected = y0 + t * (y1 - y0);
        corrected.max(0.0)
    }

    /// Returns the number of knots.
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Returns the `(raw, corrected)` knots.
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

/// The read-only pair of correction curves a run is calibrated with.
///
/// Loaded once at start-up and injected into the builder at construction;
/// nothing mutates it afterwards, so sharing a reference across events
/// (or threads, in a parallel driver) is safe.
#[derive(Debug, Clone)]
pub struct EnergyCalibration {
    em: CorrectionCurve,
    had: CorrectionCurve,
}

impl EnergyCalibration {
    /// Creates a calibration from two curves.
    #[must_use]
    pub fn new(em: CorrectionCurve, had: CorrectionCurve) -> Self {
        Self { em, had }
    }

    /// Identity calibration for both calorimeters.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(CorrectionCurve::identity(), CorrectionCurve::identity())
    }

    /// Loads both curves from a calibration directory holding
    /// [`EM_CURVE_FILE`] and [`HAD_CURVE_FILE`].
    ///
    /// # Errors
    ///
    /// Any [`CalibrationError`]; all are run-fatal.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let dir = dir.as_ref();
        let em = CorrectionCurve::from_json_file(dir.join(EM_CURVE_FILE))?;
        let had = CorrectionCurve::from_json_file(dir.join(HAD_CURVE_FILE))?;
        Ok(Self::new(em, had))
    }

    /// Returns the EM correction curve.
    #[must_use]
    pub fn em(&self) -> &CorrectionCurve {
        &self.em
    }

    /// Returns the hadronic correction curve.
    #[must_use]
    pub fn had(&self) -> &CorrectionCurve {
        &self.had
    }
}
