//! The fragment summarization core: relative-intensity normalization, top-N
//! selection, and the canonical display encoding of the retained peaks.

use std::sync::LazyLock;

use itertools::Itertools;
use mzpeaks::peak::MZPoint;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Fragment, FragmentSummary, SpectrumRecord};

/// Default number of fragment peaks retained per spectrum.
pub const DEFAULT_TOP_N: usize = 6;

// Thermo-style native ids ("controllerType=0 controllerNumber=1 scan=25869")
// must resolve to the scan field, not the first numeral they contain.
static SCAN_MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:scans?|index|frame)[\s=_:]*(\d+)").unwrap());

static FIRST_NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// The summarizer's only failure mode: parameters outside their documented
/// ranges. Irregular spectra never error, they fold into empty summaries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Controls how many fragment peaks are kept per spectrum and how weak a peak
/// may be, relative to the base peak, before it is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    /// Maximum number of fragments retained per spectrum. Must be at least 1.
    pub top_n: usize,
    /// Minimum relative intensity, in percent of the base peak, for a peak to
    /// be retained. Must lie in `[0, 100]`; a peak exactly at the threshold is
    /// kept.
    pub min_relative_intensity: f32,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            min_relative_intensity: 0.0,
        }
    }
}

impl SummaryParams {
    /// Build a validated parameter set.
    pub fn new(top_n: usize, min_relative_intensity: f32) -> Result<Self, SummaryError> {
        let this = Self {
            top_n,
            min_relative_intensity,
        };
        this.validate()?;
        Ok(this)
    }

    pub fn validate(&self) -> Result<(), SummaryError> {
        if self.top_n < 1 {
            return Err(SummaryError::InvalidParameter(
                "top_n must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_relative_intensity) {
            return Err(SummaryError::InvalidParameter(format!(
                "min_relative_intensity must lie in [0, 100], got {}",
                self.min_relative_intensity
            )));
        }
        Ok(())
    }
}

/// Reduce one scan to its fragment summary.
///
/// MS1 scans yield `Ok(None)`, they are filtered rather than failed. A scan
/// with no peaks, or no signal above zero, yields a summary with an empty
/// fragment list. Relative intensities are always normalized against the
/// full peak list, not the post-filter subset.
pub fn summarize(
    record: &SpectrumRecord,
    params: &SummaryParams,
) -> Result<Option<FragmentSummary>, SummaryError> {
    params.validate()?;
    if record.ms_level < 2 {
        return Ok(None);
    }
    let fragments = select_fragments(&record.peaks, params);
    Ok(Some(FragmentSummary {
        batch: record.batch.clone(),
        scan_id: record.scan_id.clone(),
        scan_number: record
            .scan_number
            .or_else(|| extract_scan_number(&record.scan_id)),
        precursor_mz: record.precursor_mz,
        n_fragments: fragments.len(),
        fragments,
    }))
}

/// Normalize against the base peak, drop peaks under the threshold, and keep
/// the `top_n` strongest, ordered deterministically: descending relative
/// intensity, ties by ascending m/z.
fn select_fragments(peaks: &[MZPoint], params: &SummaryParams) -> Vec<Fragment> {
    let base = peaks.iter().map(|p| p.intensity).fold(0.0f32, f32::max);
    if !base.is_finite() || base <= 0.0 {
        // No signal. Nothing can clear a positive threshold, and a zero
        // relative intensity is outside the (0, 100] range summaries report.
        return Vec::new();
    }
    peaks
        .iter()
        .map(|p| Fragment {
            mz: p.mz,
            relative_intensity: p.intensity / base * 100.0,
        })
        .filter(|f| {
            f.relative_intensity > 0.0 && f.relative_intensity >= params.min_relative_intensity
        })
        .sorted_unstable_by(|a, b| {
            b.relative_intensity
                .total_cmp(&a.relative_intensity)
                .then_with(|| a.mz.total_cmp(&b.mz))
        })
        .take(params.top_n)
        .collect()
}

/// Best-effort scan number from an opaque scan identifier.
///
/// A numeral following a `scan=`-style marker wins; otherwise the first
/// numeral anywhere in the identifier. Never fails, only yields `None`.
pub fn extract_scan_number(scan_id: &str) -> Option<usize> {
    if let Some(captures) = SCAN_MARKER_PATTERN.captures(scan_id) {
        if let Ok(value) = captures[1].parse() {
            return Some(value);
        }
    }
    FIRST_NUMBER_PATTERN
        .find(scan_id)
        .and_then(|m| m.as_str().parse().ok())
}

/// Join fragments as `"mz:rel"` pairs, one decimal place each, separated by
/// `"; "`, preserving input order. This is display formatting: the decimal
/// truncation is lossy and not meant to round-trip back to full precision.
pub fn encode_fragments(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| format!("{:.1}:{:.1}", f.mz, f.relative_intensity))
        .join("; ")
}
