//! Location of the bundled OpenAPI document.

use std::io;
use std::path::{Path, PathBuf};

/// File name of the bundled document.
pub const SPEC_FILE_NAME: &str = "openapi.json";

/// Absolute path of the document shipped next to the running executable.
///
/// The file is not checked for existence; loading it reports that.
///
/// # Errors
///
/// Fails if the executable's own path cannot be determined.
pub fn locate_spec() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"))?;
    locate_spec_from(dir)
}

/// Absolute path of the document inside `dir`.
///
/// # Errors
///
/// Fails if `dir` is relative and the current directory cannot be read.
pub fn locate_spec_from(dir: &Path) -> io::Result<PathBuf> {
    std::path::absolute(dir.join(SPEC_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lives_next_to_executable() {
        let path = locate_spec().unwrap();
        assert!(path.is_absolute());
        assert_eq!(path.file_name().unwrap(), SPEC_FILE_NAME);

        let exe = std::env::current_exe().unwrap();
        assert_eq!(path.parent(), exe.parent());
    }

    #[test]
    fn test_relative_dir_is_made_absolute() {
        let path = locate_spec_from(Path::new("dist")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("dist/openapi.json"));
    }
}
