//! Build fragment-ion summary tables from mass spectrometry data files.
//!
//! Reading MGF and mzML files, plain or gzip-compressed, is delegated entirely
//! to [`mzdata`]. This crate reduces each MS2+ spectrum to a [`FragmentSummary`]:
//! the top-N most intense fragment peaks at or above a relative-intensity
//! threshold, normalized against the spectrum's base peak, plus the scan
//! metadata a table view needs. Summaries are plain serde-serializable value
//! objects, so table rendering, filtering, charting, and CSV export can live in
//! whatever presentation layer consumes them.
//!
//! ```no_run
//! use mzfragtable::{summarize_file, SummaryParams};
//!
//! # fn main() -> Result<(), mzfragtable::TableError> {
//! let params = SummaryParams::new(6, 1.0)?;
//! for row in summarize_file("batch_a.mgf".as_ref(), &params)? {
//!     println!("{}\t{}", row.scan_id, row.fragment_string());
//! }
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod model;
pub mod summarize;

pub use loader::{summarize_directory, summarize_file, SpectrumFile, TableError};
pub use model::{Fragment, FragmentSummary, SpectrumRecord};
pub use summarize::{
    encode_fragments, extract_scan_number, summarize, SummaryError, SummaryParams,
};
