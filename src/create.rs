//! Creates empty posts with the metadata block already filled in.

use crate::permalink::derive_slug;
use crate::post::DATE_FORMAT;
use chrono::NaiveDateTime;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Creates `{content_dir}/{YYYY-MM-DD}-{slug}.md` holding a metadata block
/// for a post titled `title` dated `now`, and returns its path. Refuses to
/// overwrite an existing file.
pub fn create_post(title: &str, content_dir: &Path, now: &NaiveDateTime) -> Result<PathBuf> {
    let path = content_dir.join(format!(
        "{}-{}.md",
        now.format("%Y-%m-%d"),
        derive_slug(title)
    ));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|err| match err.kind() {
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(path.clone()),
            _ => Error::Io {
                path: path.clone(),
                err,
            },
        })?;
    write!(
        file,
        "title: {}\ndate: {}\ncategories:\n",
        title,
        now.format(DATE_FORMAT)
    )
    .map_err(|err| Error::Io {
        path: path.clone(),
        err,
    })?;
    Ok(path)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a post.
#[derive(Debug)]
pub enum Error {
    /// Returned when the post file already exists.
    AlreadyExists(PathBuf),

    /// Returned for other I/O errors.
    Io { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AlreadyExists(path) => write!(f, "[{}] already exists", path.display()),
            Error::Io { path, err } => write!(f, "Creating '{}': {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::AlreadyExists(_) => None,
            Error::Io { err, .. } => Some(err),
        }
    }
}
