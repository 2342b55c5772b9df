use std::fs;
use std::io;
use std::path::Path;

/// Writes `contents` to `path`, creating any missing parent directories and
/// overwriting whatever was there before.
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    create_path_to_file(path)?;
    fs::write(path, contents)
}

/// Makes sure every directory leading up to `path` exists.
pub fn create_path_to_file(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
