//! Utilities pertaining to the filesystem
//!

use camino::Utf8Path;
use simple_error::{SimpleResult, bail};

/// Create a directory path if it does not exist already
///
/// If the directory already exists no operations are performed
///
/// * `label` - used to describe the directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) -> SimpleResult<()> {
    if !dir.is_dir() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            bail!("Can't create new {label} directory at '{dir}': {e}");
        }
    }
    Ok(())
}
