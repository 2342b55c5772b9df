//! Defines the [`Parser`] and [`Error`] types: the logic for loading
//! [`Post`]s from a content directory into memory.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::read_dir,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use tracing::debug;
use url::Url;

use crate::{
    category::Category,
    markdown::{self, Metadata},
    permalink::{category_url, derive_relative_path, derive_slug, root_join},
    post::{Post, DATE_FORMAT},
};

const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `blog_prefix` is the path segment under which posts are written,
    /// relative to the output directory (e.g., `blog`). May be empty.
    blog_prefix: &'a str,

    /// `blog_root` is the mount point of the generated site below the
    /// domain (e.g., `marketing` when the site is served from
    /// `https://example.com/marketing/`). It only affects URLs, never file
    /// paths. May be empty.
    blog_root: &'a str,

    /// `canonical_base` is the site's base URL without a trailing slash. A
    /// post's canonical URL is `{canonical_base}{relative_url}`.
    canonical_base: String,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(blog_prefix: &'a str, canonical_base: &Url, blog_root: &'a str) -> Parser<'a> {
        Parser {
            blog_prefix,
            blog_root,
            canonical_base: canonical_base.as_str().trim_end_matches('/').to_owned(),
        }
    }

    /// Searches `source_directory` (non-recursively) for post files
    /// (extension `.md`; everything else is ignored) and parses each into a
    /// [`Post`]. Files are visited in file-name order, but the returned
    /// posts are not sorted; see [`crate::assemble::sort_by_date_descending`].
    ///
    /// Each post file starts with a metadata block holding `title`, `date`
    /// (`YYYY-MM-DD HH:MM`) and optionally `categories`, followed by a blank
    /// line and the Markdown body:
    ///
    /// ```md
    /// title: Hello, world!
    /// date: 2021-04-16 09:30
    /// categories: greet rust
    ///
    /// # Hello
    ///
    /// World
    /// <!--more-->
    /// The rest.
    /// ```
    ///
    /// Two posts deriving the same relative path (same slug, same day) are
    /// rejected with [`Error::DuplicatePath`].
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<Post>> {
        let mut paths = Vec::new();
        for result in read_dir(source_directory).map_err(|err| Error::Io {
            path: source_directory.to_owned(),
            err,
        })? {
            let entry = result.map_err(|err| Error::Io {
                path: source_directory.to_owned(),
                err,
            })?;
            let path = entry.path();
            if path.is_file()
                && path.extension().map_or(false, |ext| ext == MARKDOWN_EXTENSION)
            {
                paths.push(path);
            }
        }
        paths.sort();

        let mut posts = Vec::with_capacity(paths.len());
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        for path in paths {
            let post = self.parse_post(&path)?;
            if let Some(first) = seen.insert(post.relative_path.clone(), path.clone()) {
                return Err(Error::DuplicatePath {
                    relative_path: post.relative_path,
                    first,
                    second: path,
                });
            }
            posts.push(post);
        }
        Ok(posts)
    }

    /// Parses a single [`Post`] from the file at `path`.
    fn parse_post(&self, path: &Path) -> Result<Post> {
        debug!(path = %path.display(), "parsing post");
        let bytes = std::fs::read(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        let contents = String::from_utf8(bytes).map_err(|err| Error::Encoding {
            path: path.to_owned(),
            err,
        })?;

        let (metadata, body) = markdown::split_metadata(&contents);
        let title = required(&metadata, "title", path)?.to_owned();
        let date_text = required(&metadata, "date", path)?.trim();
        let date = NaiveDateTime::parse_from_str(date_text, DATE_FORMAT).map_err(|err| {
            Error::DateParse {
                path: path.to_owned(),
                value: date_text.to_owned(),
                err,
            }
        })?;

        let slug = derive_slug(&title);
        let dated_path = derive_relative_path(&title, &date);
        let relative_path = match self.blog_prefix.trim_matches('/') {
            "" => dated_path,
            prefix => format!("{}/{}", prefix, dated_path),
        };
        let relative_url = root_join(&[self.blog_root, &relative_path]);
        let canonical_url = format!("{}{}", self.canonical_base, relative_url);

        let mut html = String::new();
        markdown::to_html(&mut html, body, &format!("{}/", relative_url)).map_err(|err| {
            Error::Io {
                path: path.to_owned(),
                err,
            }
        })?;

        Ok(Post {
            source_path: path.to_owned(),
            title,
            date,
            categories: self.categories(&metadata, path)?,
            body: html,
            slug,
            relative_path,
            relative_url,
            canonical_url,
            previous: None,
        })
    }

    /// Reads the whitespace-separated `categories` field. A missing field
    /// means no categories; a category declared twice is only kept once.
    /// Category names become directory names, so names that would leave
    /// the categories directory are rejected.
    fn categories(&self, metadata: &Metadata, path: &Path) -> Result<Vec<Category>> {
        let names = match metadata.get("categories") {
            Some(values) => values.join(" "),
            None => return Ok(Vec::new()),
        };

        let mut seen: HashSet<Category> = HashSet::new();
        let mut categories = Vec::new();
        for name in names.split_whitespace() {
            if name == "." || name == ".." || name.contains(|c: char| c == '/' || c == '\\') {
                return Err(Error::InvalidCategory {
                    path: path.to_owned(),
                    name: name.to_owned(),
                });
            }
            let category = Category {
                name: name.to_owned(),
                url: category_url(self.blog_root, self.blog_prefix, name),
            };
            if seen.insert(category.clone()) {
                categories.push(category);
            }
        }
        Ok(categories)
    }
}

/// Returns the first value of a required metadata field.
fn required<'m>(metadata: &'m Metadata, key: &'static str, path: &Path) -> Result<&'m str> {
    metadata
        .get(key)
        .and_then(|values| values.first())
        .map(String::as_str)
        .ok_or_else(|| Error::MissingMetadata {
            path: path.to_owned(),
            key,
        })
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object. Every variant names the
/// source file involved.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post is missing its `title` or `date` field.
    MissingMetadata { path: PathBuf, key: &'static str },

    /// Returned when a post's `date` field isn't `YYYY-MM-DD HH:MM`.
    DateParse {
        path: PathBuf,
        value: String,
        err: chrono::ParseError,
    },

    /// Returned when a source file isn't valid UTF-8.
    Encoding {
        path: PathBuf,
        err: std::string::FromUtf8Error,
    },

    /// Returned when a category name isn't usable as a directory name
    /// (`.`, `..`, or anything containing a path separator).
    InvalidCategory { path: PathBuf, name: String },

    /// Returned when two posts would be written to the same location.
    DuplicatePath {
        relative_path: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned for I/O errors reading the content directory or a post.
    Io { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingMetadata { path, key } => {
                write!(f, "Post '{}' is missing `{}`", path.display(), key)
            }
            Error::DateParse { path, value, err } => write!(
                f,
                "Post '{}': date '{}' doesn't match YYYY-MM-DD HH:MM: {}",
                path.display(),
                value,
                err
            ),
            Error::Encoding { path, err } => {
                write!(f, "Post '{}' isn't valid UTF-8: {}", path.display(), err)
            }
            Error::InvalidCategory { path, name } => {
                write!(f, "Post '{}': invalid category '{}'", path.display(), name)
            }
            Error::DuplicatePath {
                relative_path,
                first,
                second,
            } => write!(
                f,
                "Posts '{}' and '{}' both map to '{}'",
                first.display(),
                second.display(),
                relative_path
            ),
            Error::Io { path, err } => write!(f, "Reading '{}': {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingMetadata { .. } => None,
            Error::DateParse { err, .. } => Some(err),
            Error::Encoding { err, .. } => Some(err),
            Error::InvalidCategory { .. } => None,
            Error::DuplicatePath { .. } => None,
            Error::Io { err, .. } => Some(err),
        }
    }
}
