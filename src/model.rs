//! Value objects flowing through the summarization pipeline: one
//! [`SpectrumRecord`] in per scan, one [`FragmentSummary`] out per MS2+ scan.

use mzdata::prelude::SpectrumLike;
use mzdata::spectrum::MultiLayerSpectrum;
use mzpeaks::peak::MZPoint;
use serde::{Deserialize, Serialize};

use crate::summarize::encode_fragments;

/// A single scan pulled out of a data file, reduced to the fields the
/// fragment summarizer consumes. Peak order is whatever the source reported.
#[derive(Debug, Default, Clone)]
pub struct SpectrumRecord {
    /// Source file identifier, standardized as the file name without extension.
    pub batch: String,
    /// The scan's native identifier (MGF title or mzML native id).
    pub scan_id: String,
    /// Scan number as reported by the source, when it reported one separately
    /// from the identifier.
    pub scan_number: Option<usize>,
    pub ms_level: u8,
    pub precursor_mz: Option<f64>,
    pub peaks: Vec<MZPoint>,
}

impl SpectrumRecord {
    /// Convert an owned spectrum, draining whichever peak layer it carries
    /// (raw arrays, centroids, or deconvoluted peaks) into plain points.
    pub fn from_spectrum(spectrum: MultiLayerSpectrum, batch: &str) -> Self {
        let (peaks, description) = spectrum.into_peaks_and_description();
        let precursor_mz = description
            .precursor
            .as_ref()
            .and_then(|precursor| precursor.ions.first())
            .map(|ion| ion.mz);
        Self {
            batch: batch.to_string(),
            scan_id: description.id,
            scan_number: None,
            ms_level: description.ms_level,
            precursor_mz,
            peaks: peaks.iter().collect(),
        }
    }
}

/// One retained fragment peak. `relative_intensity` is a percentage of the
/// spectrum's base peak, so it always falls in (0, 100].
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub mz: f64,
    pub relative_intensity: f32,
}

/// The table row produced for one MS2+ scan. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentSummary {
    pub batch: String,
    pub scan_id: String,
    pub scan_number: Option<usize>,
    pub precursor_mz: Option<f64>,
    /// Count of retained fragments, never more than the requested top-N.
    pub n_fragments: usize,
    /// Sorted by descending relative intensity, ties by ascending m/z.
    pub fragments: Vec<Fragment>,
}

impl FragmentSummary {
    /// The canonical `"mz:rel"` display string for this row's fragments.
    pub fn fragment_string(&self) -> String {
        encode_fragments(&self.fragments)
    }
}
