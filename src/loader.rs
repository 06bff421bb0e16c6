//! Reading spectra files from disk. All format handling is `mzdata`'s: MGF and
//! mzML, with gzip compression recognized for either, the way the viewer
//! applications built on it open arbitrary user files.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use mzdata::io::{infer_format, MZReaderType, MassSpectrometryFormat, RestartableGzDecoder};
use mzdata::prelude::*;
use mzpeaks::{CentroidPeak, DeconvolutedPeak};
use thiserror::Error;

use crate::model::{FragmentSummary, SpectrumRecord};
use crate::summarize::{summarize, SummaryError, SummaryParams};

/// Errors produced while assembling a fragment table from files on disk.
///
/// Parameter validation happens before any file is opened; everything the
/// readers raise passes through as [`io::Error`].
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    InvalidParameter(#[from] SummaryError),
    #[error("failed to read spectra: {0}")]
    Io(#[from] io::Error),
}

enum Reader {
    Plain(MZReaderType<File, CentroidPeak, DeconvolutedPeak>),
    Gzipped(MZReaderType<RestartableGzDecoder<io::BufReader<File>>, CentroidPeak, DeconvolutedPeak>),
}

/// An open spectra file together with its standardized batch name.
pub struct SpectrumFile {
    reader: Reader,
    batch: String,
    path: PathBuf,
}

impl SpectrumFile {
    /// Open a spectra file, dispatching on whether it is gzip-compressed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let (_format, is_gzipped) = infer_format(path.to_path_buf())?;
        let reader = if is_gzipped {
            let fh = File::open(path)?;
            Reader::Gzipped(MZReaderType::open_gzipped_read_seek(fh)?)
        } else {
            Reader::Plain(MZReaderType::open_path(path.to_path_buf())?)
        };
        Ok(Self {
            reader,
            batch: batch_name(path),
            path: path.to_path_buf(),
        })
    }

    pub fn batch(&self) -> &str {
        &self.batch
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of scans the underlying reader indexed.
    pub fn len(&self) -> usize {
        match &self.reader {
            Reader::Plain(reader) => reader.len(),
            Reader::Gzipped(reader) => reader.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the whole file into one record per scan, batch name attached.
    pub fn records(&mut self) -> Vec<SpectrumRecord> {
        let batch = &self.batch;
        match &mut self.reader {
            Reader::Plain(reader) => reader
                .iter()
                .map(|spectrum| SpectrumRecord::from_spectrum(spectrum, batch))
                .collect(),
            Reader::Gzipped(reader) => reader
                .iter()
                .map(|spectrum| SpectrumRecord::from_spectrum(spectrum, batch))
                .collect(),
        }
    }
}

/// Batch name for a data file: the file name with a trailing `.gz` and the
/// format extension stripped.
pub fn batch_name(path: &Path) -> String {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return String::new(),
    };
    let trimmed = name.strip_suffix(".gz").unwrap_or(&name);
    match trimmed.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Summarize every MS2+ scan in one file.
pub fn summarize_file(
    path: &Path,
    params: &SummaryParams,
) -> Result<Vec<FragmentSummary>, TableError> {
    params.validate()?;
    let mut file = SpectrumFile::open(path)?;
    info!("Summarizing {} scans from {}", file.len(), path.display());
    let mut rows = Vec::new();
    for record in file.records() {
        if let Some(summary) = summarize(&record, params)? {
            rows.push(summary);
        }
    }
    Ok(rows)
}

/// Summarize every recognizable spectra file directly inside a directory,
/// visiting files in lexicographic order so the output row order is stable.
pub fn summarize_directory(
    directory: &Path,
    params: &SummaryParams,
) -> Result<Vec<FragmentSummary>, TableError> {
    params.validate()?;
    let mut paths: Vec<PathBuf> = fs::read_dir(directory)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut rows = Vec::new();
    for path in paths {
        if !is_spectrum_file(&path) {
            debug!("Skipping {}, not a recognized spectra file", path.display());
            continue;
        }
        rows.extend(summarize_file(&path, params)?);
    }
    Ok(rows)
}

/// Whether `mzdata` recognizes the file as one of the supported formats.
fn is_spectrum_file(path: &Path) -> bool {
    infer_format(path.to_path_buf())
        .map(|(format, _)| !matches!(format, MassSpectrometryFormat::Unknown))
        .unwrap_or(false)
}

#[cfg(test)]
mod test {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const MGF_A: &str = "BEGIN IONS\n\
TITLE=batch_a scan=7\n\
PEPMASS=445.12 1000.0\n\
CHARGE=2+\n\
100.0 80.0\n\
150.0 100.0\n\
200.0 10.0\n\
END IONS\n\
BEGIN IONS\n\
TITLE=blank_feature\n\
PEPMASS=300.0\n\
50.0 0.0\n\
END IONS\n";

    fn write_plain(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn write_gzipped(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
        path
    }

    #[test]
    fn batch_names_strip_extensions() {
        assert_eq!(batch_name(Path::new("/data/batch_a.mgf")), "batch_a");
        assert_eq!(batch_name(Path::new("batch_b.mzML.gz")), "batch_b");
        assert_eq!(batch_name(Path::new("no_extension")), "no_extension");
    }

    #[test_log::test]
    fn summarize_mgf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plain(dir.path(), "batch_a.mgf", MGF_A);

        let rows = summarize_file(&path, &SummaryParams::default()).unwrap();
        assert_eq!(rows.len(), 2);

        let row = &rows[0];
        assert_eq!(row.batch, "batch_a");
        assert_eq!(row.scan_number, Some(7));
        assert_eq!(row.precursor_mz, Some(445.12));
        assert_eq!(row.n_fragments, 3);
        assert_eq!(
            row.fragment_string(),
            "150.0:100.0; 100.0:80.0; 200.0:10.0"
        );

        // The zero-intensity scan summarizes to an empty row, not an error.
        let blank = &rows[1];
        assert_eq!(blank.scan_id, "blank_feature");
        assert_eq!(blank.scan_number, None);
        assert_eq!(blank.n_fragments, 0);
    }

    #[test_log::test]
    fn summarize_mgf_file_with_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plain(dir.path(), "batch_a.mgf", MGF_A);

        let params = SummaryParams::new(2, 20.0).unwrap();
        let rows = summarize_file(&path, &params).unwrap();
        assert_eq!(rows[0].fragment_string(), "150.0:100.0; 100.0:80.0");
        assert_eq!(rows[0].n_fragments, 2);
    }

    #[test_log::test]
    fn reads_gzipped_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_gzipped(dir.path(), "batch_b.mgf.gz", MGF_A);

        let mut file = SpectrumFile::open(&path).unwrap();
        assert_eq!(file.batch(), "batch_b");
        let records = file.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].peaks.len(), 3);
        assert_eq!(records[0].batch, "batch_b");
    }

    #[test_log::test]
    fn directory_traversal_skips_unrecognized_files() {
        let dir = tempfile::tempdir().unwrap();
        write_plain(dir.path(), "batch_a.mgf", MGF_A);
        write_gzipped(dir.path(), "batch_b.mgf.gz", MGF_A);
        write_plain(dir.path(), "notes.txt", "not a spectra file\n");

        let rows = summarize_directory(dir.path(), &SummaryParams::default()).unwrap();
        assert_eq!(rows.len(), 4);
        let batches: Vec<&str> = rows.iter().map(|row| row.batch.as_str()).collect();
        assert_eq!(batches, vec!["batch_a", "batch_a", "batch_b", "batch_b"]);
    }

    #[test]
    fn invalid_parameters_fail_before_io() {
        let params = SummaryParams {
            top_n: 0,
            min_relative_intensity: 0.0,
        };
        let err = summarize_directory(Path::new("/does/not/exist"), &params).unwrap_err();
        assert!(matches!(err, TableError::InvalidParameter(_)));
    }
}
