//! Writing programs and previews to disk.
//!
//! G-code files always carry the `.gcode` extension; any other extension
//! on the requested path is replaced.

use std::path::{Path, PathBuf};

use crate::CliError;

/// Required extension for G-code files.
pub const GCODE_EXTENSION: &str = "gcode";

/// Return `path` with a `.gcode` extension.
///
/// An existing extension that already reads `gcode` in any letter case
/// is kept as is; anything else is replaced.
#[must_use]
pub fn with_gcode_extension(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(GCODE_EXTENSION) => path.to_path_buf(),
        _ => path.with_extension(GCODE_EXTENSION),
    }
}

/// Default output location: the input's file stem with `.gcode`, next to
/// the input.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    with_gcode_extension(input)
}

/// Write a G-code program, enforcing the extension. Returns the path
/// actually written.
///
/// # Errors
///
/// Returns [`CliError::Write`] if the file cannot be written.
pub fn save_gcode(gcode: &str, requested: &Path) -> Result<PathBuf, CliError> {
    let path = with_gcode_extension(requested);
    write_text(&path, gcode)?;
    Ok(path)
}

/// Write a text file.
///
/// # Errors
///
/// Returns [`CliError::Write`] if the file cannot be written.
pub fn write_text(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
