// core/decoder.rs
//
// Transparent reader over plain, gzip, and zip log containers. Decoding
// never fails on malformed text (invalid bytes are replaced); it only fails
// when the container itself cannot be opened.

use crate::util::error::DecodeError;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;

/// Decode the full content of a log artifact into a single `String`.
///
/// Dispatch is by file extension: `.gz` is inflated, `.zip` yields the first
/// non-directory member, everything else is read as plain text. Invalid
/// UTF-8 is replaced rather than rejected (`String::from_utf8_lossy`), so
/// this only returns `Err` when the container structure itself is corrupt.
pub fn decode_file(path: &Path, bytes: &[u8]) -> Result<String, DecodeError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("gz") => decode_gzip(bytes),
        Some(ext) if ext.eq_ignore_ascii_case("zip") => decode_zip(bytes),
        _ => Ok(decode_plain(bytes)),
    }
}

fn decode_plain(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_gzip(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|source| DecodeError::Gzip { source })?;
    Ok(decode_plain(&raw))
}

fn decode_zip(bytes: &[u8]) -> Result<String, DecodeError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|source| DecodeError::Zip { source })?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|source| DecodeError::Zip { source })?;
        if entry.is_dir() {
            continue;
        }
        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|source| DecodeError::Io { source })?;
        return Ok(decode_plain(&raw));
    }

    // No non-directory member: yield empty content rather than an error.
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plain_text_replaces_invalid_bytes() {
        let bytes = b"valid line\n\xFF\xFEinvalid\n";
        let path = Path::new("app.log");
        let decoded = decode_file(path, bytes).unwrap();
        assert!(decoded.contains("valid line"));
        assert!(decoded.contains('\u{FFFD}'));
    }

    #[test]
    fn gzip_round_trips_plain_content() {
        let original = "24/01/28 10:30:45 INFO SparkContext: started\n";
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(original.as_bytes()).unwrap();
        let gz_bytes = encoder.finish().unwrap();

        let path = Path::new("app.log.gz");
        let decoded = decode_file(path, &gz_bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn zip_returns_first_non_directory_member() {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
            writer.start_file("driver.log", options).unwrap();
            writer
                .write_all(b"24/01/28 10:30:45 INFO Driver: hello\n")
                .unwrap();
            writer.finish().unwrap();
        }

        let path = Path::new("bundle.zip");
        let decoded = decode_file(path, &buf).unwrap();
        assert!(decoded.contains("Driver: hello"));
    }

    #[test]
    fn corrupt_gzip_is_a_decode_error() {
        let path = Path::new("app.log.gz");
        let result = decode_file(path, b"not actually gzip");
        assert!(matches!(result, Err(DecodeError::Gzip { .. })));
    }
}
