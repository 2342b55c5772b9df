//! Defines the [`Post`] type and the logic for converting posts into template
//! values.

use crate::category::Category;
use chrono::{NaiveDateTime, TimeZone, Utc};
use gtmpl::Value;
use std::collections::HashMap;
use std::path::PathBuf;

/// The literal marker separating a post's teaser from the rest of its body.
pub const MORE_MARKER: &str = "<!--more-->";

/// The format of the `date` metadata field.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Represents a blog post. Everything but `previous` is fixed once the post
/// has been parsed; `previous` is filled in by
/// [`crate::assemble::link_previous`].
#[derive(Clone, Debug)]
pub struct Post {
    /// The source file the post was parsed from.
    pub source_path: PathBuf,

    /// The title of the post.
    pub title: String,

    /// The date of the post.
    pub date: NaiveDateTime,

    /// The categories the post declares, in declaration order.
    pub categories: Vec<Category>,

    /// The full rendered HTML of the post.
    pub body: String,

    /// The file-name slug derived from the title.
    pub slug: String,

    /// `{blog_prefix}/YYYY/MM/DD/{slug}`, relative to the output directory.
    pub relative_path: String,

    /// `relative_path` rooted at `/`, under the `blog_root` mount point if
    /// there is one.
    pub relative_url: String,

    /// The site's base URL followed by `relative_url`.
    pub canonical_url: String,

    /// The index of the next-older post in the date-sorted post list.
    pub previous: Option<usize>,
}

impl Post {
    /// Returns the teaser: the body up to the first [`MORE_MARKER`], or the
    /// whole body if there is no marker.
    pub fn teaser(&self) -> &str {
        split_teaser(&self.body)
    }

    /// Returns true if the post has content beyond its teaser.
    pub fn has_more(&self) -> bool {
        self.teaser().len() < self.body.len()
    }

    /// Converts the post into a template [`Value`]. The result is a
    /// [`Value::Object`] with the fields `title`, `date`, `date_iso`,
    /// `date_display`, `categories`, `body`, `teaser`, `has_more`,
    /// `relative_path`, `relative_url` and `canonical_url`.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), (&self.title).into());
        m.insert(
            "date".to_owned(),
            self.date.format(DATE_FORMAT).to_string().into(),
        );
        m.insert(
            "date_iso".to_owned(),
            Utc.from_utc_datetime(&self.date).to_rfc3339().into(),
        );
        m.insert(
            "date_display".to_owned(),
            self.date.format("%B %d, %Y").to_string().into(),
        );
        m.insert(
            "categories".to_owned(),
            Value::Array(self.categories.iter().map(Value::from).collect()),
        );
        m.insert("body".to_owned(), (&self.body).into());
        m.insert("teaser".to_owned(), self.teaser().into());
        m.insert("has_more".to_owned(), Value::Bool(self.has_more()));
        m.insert("relative_path".to_owned(), (&self.relative_path).into());
        m.insert("relative_url".to_owned(), (&self.relative_url).into());
        m.insert("canonical_url".to_owned(), (&self.canonical_url).into());
        Value::Object(m)
    }
}

/// Returns the part of `body` before the first [`MORE_MARKER`], or all of
/// `body` if the marker is absent.
pub fn split_teaser(body: &str) -> &str {
    match body.find(MORE_MARKER) {
        Some(i) => &body[..i],
        None => body,
    }
}
