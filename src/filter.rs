//! Candidate acceptance rules.
//!
//! A candidate survives when it meets the minimum resolution, sits within the
//! aspect-ratio tolerance of the target, and has not been downloaded before.
//! Rejections are skips, never errors; they are logged at debug so a quiet
//! run can be diagnosed by turning the level up.

use crate::config::ConfigError;
use crate::ledger::Ledger;
use crate::reddit::listing::Candidate;

/// Per-request acceptance criteria, fixed for the duration of one retrieval.
#[derive(Debug, Clone, Copy)]
pub struct FilterCriteria {
    pub target_width: u32,
    pub target_height: u32,
    /// Maximum absolute difference between candidate and target aspect
    /// ratios, boundary inclusive.
    pub aspect_tolerance: f64,
}

/// Validate requested target dimensions against the configured ceiling.
/// Runs once at orchestrator setup, before any network call.
pub fn validate_resolution(
    width: u32,
    height: u32,
    max_resolution: u32,
) -> Result<(), ConfigError> {
    if width == 0 || width > max_resolution || height == 0 || height > max_resolution {
        return Err(ConfigError::InvalidResolution {
            width,
            height,
            max: max_resolution,
        });
    }
    Ok(())
}

impl FilterCriteria {
    /// Accept iff the candidate meets minimum size, aspect tolerance, and is
    /// not already in the ledger. A candidate whose URL yields no recognizable
    /// filename is skipped.
    pub fn accepts(&self, candidate: &Candidate, ledger: &Ledger) -> bool {
        self.above_min_size(candidate)
            && self.within_aspect_tolerance(candidate)
            && !self.already_downloaded(candidate, ledger)
    }

    fn above_min_size(&self, candidate: &Candidate) -> bool {
        if candidate.width < self.target_width || candidate.height < self.target_height {
            tracing::debug!(
                uid = %candidate.uid,
                "Image resolution ({}, {}) does not meet minimum ({}, {})",
                candidate.width,
                candidate.height,
                self.target_width,
                self.target_height,
            );
            return false;
        }
        true
    }

    fn within_aspect_tolerance(&self, candidate: &Candidate) -> bool {
        let aspect = f64::from(candidate.width) / f64::from(candidate.height);
        let required = f64::from(self.target_width) / f64::from(self.target_height);
        let diff = (aspect - required).abs();
        if diff > self.aspect_tolerance {
            tracing::debug!(
                uid = %candidate.uid,
                "Image aspect ratio {aspect:.3} outside required {required:.3} (+/-{:.2})",
                self.aspect_tolerance,
            );
            return false;
        }
        true
    }

    fn already_downloaded(&self, candidate: &Candidate, ledger: &Ledger) -> bool {
        let Some(filename) = candidate.file_name() else {
            // Unknown file type: treat as a skip, not an error, so one odd
            // URL cannot abort the whole page.
            tracing::debug!(uid = %candidate.uid, url = %candidate.url, "Unknown image file type, skipping");
            return true;
        };
        if ledger.contains(&filename) {
            tracing::debug!(%filename, "Image already exists in the download directory");
            return true;
        }
        false
    }
}
