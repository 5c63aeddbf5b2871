// platform/fs.rs
//
// Small filesystem helpers shared by the ingestion coordinator and rule
// set manager.

use std::io;
use std::path::Path;

/// I/O buffer size for network-efficient reads.
const IO_BUFFER_SIZE: usize = 128 * 1024;

/// Read the first N lines of a file, for sampling before full decode.
/// Handles encoding errors gracefully (skips lines with invalid UTF-8).
pub fn read_first_lines(path: &Path, max_lines: usize) -> io::Result<Vec<String>> {
    use std::io::BufRead;
    let file = std::fs::File::open(path)?;
    let reader = io::BufReader::with_capacity(IO_BUFFER_SIZE, file);

    let mut lines = Vec::with_capacity(max_lines);
    for line_result in reader.lines().take(max_lines) {
        match line_result {
            Ok(line) => lines.push(line),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::debug!(path = %path.display(), "Skipping line with encoding error");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(lines)
}

/// Read the full content of a file as a string.
///
/// For files with invalid UTF-8, uses lossy conversion.
pub fn read_file_lossy(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}
