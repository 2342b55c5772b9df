//! The library code for the `blug` static blog generator. A build runs in
//! three steps:
//!
//! 1. Parsing posts from Markdown source files on disk ([`crate::parser`])
//! 2. Assembling them into a site: date order, `previous` links, category
//!    buckets and pagination ([`crate::assemble`])
//! 3. Rendering every page through its template and writing the result to
//!    disk ([`crate::write`])
//!
//! [`crate::build`] ties the steps together. It also wipes the output
//! directory and copies the static assets before anything is written, so the
//! output only ever holds what the current sources produce.
//!
//! Where things go is decided in one place:
//! [`crate::permalink`] maps a post's title and date to its slug, path and
//! URL, and every other module goes through it.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod assemble;
pub mod build;
pub mod category;
pub mod config;
pub mod create;
pub mod markdown;
pub mod parser;
pub mod permalink;
pub mod post;
pub mod templates;
pub mod util;
pub mod value;
pub mod write;
