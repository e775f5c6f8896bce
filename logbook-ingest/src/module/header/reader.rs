//! Exposure file reader
//!
//! Unpacks gzip or bzip2 compressed files, reads the primary header and
//! turns the observation keywords into an [`ExposureRecord`].

use bzip2::read::BzDecoder;
use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::fits::read_observation_header;
use super::types::{ExposureRecord, ObservationHeader};
use crate::error::HeaderError;
use crate::module::names::LookupTables;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Plain,
    Gzip,
    Bzip2,
}

impl Container {
    fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            Container::Gzip
        } else if magic.starts_with(b"BZh") {
            Container::Bzip2
        } else {
            Container::Plain
        }
    }
}

/// A FITS file cfitsio can open directly
#[derive(Debug)]
pub enum ExposureSource {
    Plain(PathBuf),
    /// Decompressed copy, removed on drop
    Unpacked(NamedTempFile),
}

impl ExposureSource {
    pub fn path(&self) -> &Path {
        match self {
            ExposureSource::Plain(path) => path,
            ExposureSource::Unpacked(file) => file.path(),
        }
    }
}

/// Detect the container by magic bytes and unpack compressed files
pub fn open_exposure(path: &Path) -> Result<ExposureSource, HeaderError> {
    let mut reader = BufReader::new(File::open(path)?);
    let container = Container::detect(reader.fill_buf()?);

    match container {
        Container::Plain => Ok(ExposureSource::Plain(path.to_path_buf())),
        Container::Gzip => unpack(GzDecoder::new(reader)),
        Container::Bzip2 => unpack(BzDecoder::new(reader)),
    }
}

fn unpack(mut decoder: impl Read) -> Result<ExposureSource, HeaderError> {
    let mut file = tempfile::Builder::new()
        .prefix("logbook-exposure-")
        .suffix(".fits")
        .tempfile()?;
    std::io::copy(&mut decoder, &mut file)?;
    file.flush()?;
    Ok(ExposureSource::Unpacked(file))
}

/// Read one exposure file into a normalized record
pub fn read_exposure(path: &Path, tables: &LookupTables) -> Result<ExposureRecord, HeaderError> {
    let source = open_exposure(path)?;
    let header = read_observation_header(source.path())?;
    record_from_header(&header, tables)
}

/// Validate the observation keywords and normalize names
pub fn record_from_header(header: &ObservationHeader, tables: &LookupTables) -> Result<ExposureRecord, HeaderError> {
    let timestamp = observation_timestamp(header)?;

    let object = required(&header.object, "OBJECT")?;
    let filter = required(&header.filter, "FILTER")?;

    let observers = header
        .observer
        .as_deref()
        .map(|raw| {
            raw.split_whitespace()
                .map(|token| tables.observer(token))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(ExposureRecord::new(
        timestamp,
        tables.object_name(object),
        observers,
        tables.filter(filter),
        header.exptime.unwrap_or(0.0),
    ))
}

fn required<'a>(value: &'a Option<String>, keyword: &'static str) -> Result<&'a str, HeaderError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(HeaderError::MissingKeyword(keyword))
}

/// `DATE-OBS` + `T` + `TIME-OBS`. A `DATE-OBS` already carrying a time is
/// used as is when `TIME-OBS` is absent.
fn observation_timestamp(header: &ObservationHeader) -> Result<NaiveDateTime, HeaderError> {
    let date_obs = required(&header.date_obs, "DATE-OBS")?;

    let combined = match header.time_obs.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(time_obs) => {
            let date = date_obs.split('T').next().unwrap_or(date_obs);
            format!("{}T{}", date, time_obs)
        }
        None if date_obs.contains('T') => date_obs.to_string(),
        None => return Err(HeaderError::MissingKeyword("TIME-OBS")),
    };

    NaiveDateTime::parse_from_str(&combined, TIMESTAMP_FORMAT)
        .map_err(|_| HeaderError::InvalidTimestamp(combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::header::fits::fixtures::write_exposure;
    use crate::module::names::NameTable;
    use chrono::NaiveDate;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_sample(path: &Path) {
        write_exposure(
            path,
            &[
                ("DATE-OBS", "2021-06-01"),
                ("TIME-OBS", "21:03:04.250"),
                ("OBJECT", "andromeda"),
                ("OBSERVER", "jk  AB"),
                ("FILTER", "v"),
            ],
            Some(30.5),
        );
    }

    /// Sample frame, compressed with `encode`, written to `dir/name`
    fn write_compressed(dir: &Path, name: &str, encode: impl Fn(&[u8]) -> Vec<u8>) -> PathBuf {
        let plain = dir.join("plain.fits");
        write_sample(&plain);
        let path = dir.join(name);
        std::fs::write(&path, encode(&std::fs::read(&plain).unwrap())).unwrap();
        std::fs::remove_file(&plain).unwrap();
        path
    }

    fn header(date_obs: &str, time_obs: Option<&str>, object: Option<&str>) -> ObservationHeader {
        ObservationHeader {
            date_obs: Some(date_obs.to_string()),
            time_obs: time_obs.map(String::from),
            object: object.map(String::from),
            filter: Some("R".to_string()),
            ..Default::default()
        }
    }

    fn tables() -> LookupTables {
        LookupTables {
            names: NameTable::parse_csv("M31,Andromeda\n").unwrap(),
            filters: NameTable::parse_csv("V,Johnson V\n").unwrap(),
            observers: NameTable::parse_csv("Jan Kowalski,JK\n").unwrap(),
        }
    }

    fn expected_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_milli_opt(21, 3, 4, 250)
            .unwrap()
    }

    #[test]
    fn test_read_plain_fits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.fits");
        write_sample(&path);

        let record = read_exposure(&path, &tables()).unwrap();
        assert_eq!(record.timestamp, expected_timestamp());
        assert_eq!(record.object_name, "M31");
        assert_eq!(record.filter, "V");
        assert_eq!(
            record.observers.iter().cloned().collect::<Vec<_>>(),
            vec!["AB".to_string(), "Jan Kowalski".to_string()]
        );
        assert_eq!(record.exposure_seconds, 30.5);
    }

    #[test]
    fn test_read_gzip_fits() {
        let dir = TempDir::new().unwrap();
        let path = write_compressed(dir.path(), "frame.fits.gz", |bytes| {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(bytes).unwrap();
            encoder.finish().unwrap()
        });

        let record = read_exposure(&path, &tables()).unwrap();
        assert_eq!(record.object_name, "M31");
        assert_eq!(record.timestamp, expected_timestamp());
    }

    #[test]
    fn test_read_bzip2_fits() {
        let dir = TempDir::new().unwrap();
        let path = write_compressed(dir.path(), "frame.fits.bz2", |bytes| {
            let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            encoder.write_all(bytes).unwrap();
            encoder.finish().unwrap()
        });

        let record = read_exposure(&path, &tables()).unwrap();
        assert_eq!(record.filter, "V");
    }

    #[test]
    fn test_missing_exptime_and_observer_default() {
        let header = header("2021-06-01T23:59:59", None, Some("Ring Nebula"));
        let record = record_from_header(&header, &LookupTables::default()).unwrap();
        assert_eq!(record.exposure_seconds, 0.0);
        assert!(record.observers.is_empty());
        assert_eq!(record.object_name, "Ring Nebula");
        assert_eq!(record.timestamp.to_string(), "2021-06-01 23:59:59");
    }

    #[test]
    fn test_malformed_time_is_per_file_error() {
        let header = header("2021-06-01", Some("25:99:00"), Some("M31"));
        assert!(matches!(
            record_from_header(&header, &LookupTables::default()),
            Err(HeaderError::InvalidTimestamp(s)) if s == "2021-06-01T25:99:00"
        ));
    }

    #[test]
    fn test_missing_object_is_per_file_error() {
        let header = header("2021-06-01T20:00:00", None, None);
        assert!(matches!(
            record_from_header(&header, &LookupTables::default()),
            Err(HeaderError::MissingKeyword("OBJECT"))
        ));
    }

    #[test]
    fn test_unopenable_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = read_exposure(&dir.path().join("missing.fits"), &LookupTables::default());
        assert!(matches!(result, Err(HeaderError::Io(_))));
    }
}
