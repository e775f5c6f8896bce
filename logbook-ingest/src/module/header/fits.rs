//! Primary header access through cfitsio

use fitsio::FitsFile;
use fitsio::hdu::FitsHdu;
use std::path::Path;

use super::types::ObservationHeader;
use crate::error::HeaderError;

/// Read the observation keywords from the primary HDU of a FITS file.
///
/// Missing or mistyped keywords come back as `None`; deciding which of them
/// are required is up to the caller.
pub fn read_observation_header(path: &Path) -> Result<ObservationHeader, HeaderError> {
    let mut fptr = FitsFile::open(path)
        .map_err(|e| HeaderError::Fits(format!("cannot open {}: {}", path.display(), e)))?;
    let hdu = fptr
        .primary_hdu()
        .map_err(|e| HeaderError::Fits(format!("no primary HDU: {}", e)))?;

    Ok(ObservationHeader {
        date_obs: read_text(&hdu, &mut fptr, "DATE-OBS"),
        time_obs: read_text(&hdu, &mut fptr, "TIME-OBS"),
        object: read_text(&hdu, &mut fptr, "OBJECT"),
        observer: read_text(&hdu, &mut fptr, "OBSERVER"),
        filter: read_text(&hdu, &mut fptr, "FILTER"),
        exptime: read_key_optional(&hdu, &mut fptr, "EXPTIME"),
    })
}

fn read_key_optional<T: fitsio::headers::ReadsKey>(hdu: &FitsHdu, fptr: &mut FitsFile, key: &str) -> Option<T> {
    hdu.read_key(fptr, key).ok()
}

/// String keyword, falling back to an integer card (`OBJECT = 1234` happens)
fn read_text(hdu: &FitsHdu, fptr: &mut FitsFile, key: &str) -> Option<String> {
    read_key_optional::<String>(hdu, fptr, key)
        .or_else(|| read_key_optional::<i64>(hdu, fptr, key).map(|v| v.to_string()))
        .map(|value| value.trim().to_string())
}
