//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::parser`]), assembling them ([`crate::assemble`]), wiping the
//! output directory, copying the static assets into it, and rendering every
//! page ([`crate::write`]).
//!
//! **The output directory is deleted on every build.** Everything in it is
//! regenerated from the content, template and static directories, so
//! nothing placed there by hand survives a build.

use crate::assemble::{link_previous, sort_by_date_descending, Site};
use crate::config::Config;
use crate::parser::{Error as ParseError, Parser as PostParser};
use crate::templates::{self, Error as TemplateError, Templates};
use crate::write::{self, write_site, Error as WriteError};
use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Builds the site from a [`Config`], stamping the feeds with the current
/// time. See [`build_site_at`].
pub fn build_site(config: &Config) -> Result<()> {
    build_site_at(config, &Utc::now().to_rfc3339())
}

/// Builds the site from a [`Config`]. Posts and templates are loaded and
/// checked before anything is deleted, so a broken post leaves the previous
/// output in place. Then the output directory is removed, the static
/// directory is copied in its place, and all pages are written. `now` ends
/// up in the feeds only.
pub fn build_site_at(config: &Config, now: &str) -> Result<()> {
    info!(content = %config.content_dir.display(), "generating");

    let post_parser = PostParser::new(&config.blog_prefix, &config.url, &config.blog_root);
    let mut posts = post_parser.parse_posts(&config.content_dir)?;
    sort_by_date_descending(&mut posts);
    link_previous(&mut posts);
    write::check_content(&posts)?;
    let site = Site::new(&posts, config.page_size);

    let templates = Templates::load(
        &config.template_dir,
        &config.template_partials,
        templates::REQUIRED.iter().copied().chain(
            config
                .additional_pages
                .iter()
                .map(|page| page.template.as_str()),
        ),
    )?;

    warn!(path = %config.output_dir.display(), "removing old content");
    rmdir(&config.output_dir)?;
    copy_static(&config.static_dir, &config.output_dir)?;

    write_site(config, &templates, &site, now)?;
    info!(output = %config.output_dir.display(), "complete");
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

// Copies the tree under `src` to `dst`. A missing `src` just means the site
// has no static assets.
fn copy_static(src: &Path, dst: &Path) -> Result<()> {
    let copy_err = |path: &Path, err: std::io::Error| Error::CopyStatic {
        path: path.to_owned(),
        err,
    };

    if !src.is_dir() {
        warn!(path = %src.display(), "no static directory");
        return std::fs::create_dir_all(dst).map_err(|err| copy_err(dst, err));
    }

    for result in WalkDir::new(src).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
        let entry = result?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|err| copy_err(&target, err))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|err| copy_err(entry.path(), err))?;
        }
    }
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, loading
/// templates, writing, cleaning the output directory, or copying static
/// assets.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned for errors loading template files.
    Template(TemplateError),

    /// Returned for errors writing [`crate::post::Post`]s to disk as HTML
    /// files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while copying static assets.
    CopyStatic { path: PathBuf, err: std::io::Error },

    /// Returned for errors walking the static directory.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "{}", err),
            Error::Template(err) => write!(f, "{}", err),
            Error::Write(err) => write!(f, "{}", err),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::CopyStatic { path, err } => {
                write!(f, "Copying static file '{}': {}", path.display(), err)
            }
            Error::WalkDir(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::CopyStatic { path: _, err } => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<TemplateError> for Error {
    /// Converts [`TemplateError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator while walking the static directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::PROJECT_FILE;
    use std::fs;
    use tempfile::TempDir;

    const LIST: &str = "{{range .current_posts}}<a href=\"{{.relative_url}}\">{{.title}}</a>{{.teaser}}{{end}}{{if .next_page}}<a href=\"/blog/page/{{.next_page}}/\">older</a>{{end}}";

    fn project(root: &Path, posts: usize) {
        fs::write(
            root.join(PROJECT_FILE),
            "url: https://example.com/\nblog_prefix: blog\ntitle: Example\nadditional_pages:\n  projects:\n    template: projects.html\n",
        )
        .unwrap();

        let template_dir = root.join("templates");
        fs::create_dir_all(&template_dir).unwrap();
        for (name, source) in [
            (templates::LIST, LIST),
            (templates::ARCHIVES, "{{.category}}:{{range .all_posts}}{{.title}},{{end}}"),
            (templates::ATOM, "<updated>{{.now}}</updated>{{range .all_posts}}<id>{{.canonical_url}}</id>{{end}}"),
            (templates::ABOUT, "<h1>About {{.title}}</h1>"),
            (templates::POST, "<h1>{{.post.title}}</h1>{{.post.body}}<a href=\"{{.post_previous.relative_url}}\">previous</a>"),
            ("projects.html", "<h1>{{.page_name}}</h1>{{.canonical_url}}"),
        ]
        .iter()
        {
            fs::write(template_dir.join(name), source).unwrap();
        }

        let static_dir = root.join("static/css");
        fs::create_dir_all(&static_dir).unwrap();
        fs::write(static_dir.join("site.css"), "body {}").unwrap();

        let content = root.join("content");
        fs::create_dir_all(&content).unwrap();
        for i in 0..posts {
            fs::write(
                content.join(format!("post-{:02}.md", i)),
                format!(
                    "title: Post {}\ndate: 2024-01-{:02} 08:00\ncategories: {}\n\nIntro {}.\n\n<!--more-->\n\nRest {}.\n",
                    i,
                    i + 1,
                    if i % 2 == 0 { "even all" } else { "odd all" },
                    i,
                    i
                ),
            )
            .unwrap();
        }
        fs::write(content.join("notes.txt"), "ignored").unwrap();
    }

    fn read(root: &Path, relative: &str) -> String {
        let path = root.join("generated").join(relative);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        project(root, 12);
        let stale = root.join("generated/stale.html");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "stale").unwrap();

        let config = Config::from_directory(root, None).unwrap();
        build_site_at(&config, "2024-06-01T00:00:00+00:00")?;

        assert!(!stale.exists());
        assert_eq!("body {}", read(root, "css/site.css"));

        let index = read(root, "index.html");
        assert!(index.starts_with("<a href=\"/blog/2024/01/12/post-11\">Post 11</a><p>Intro 11.</p>"));
        assert!(index.ends_with("<a href=\"/blog/page/1/\">older</a>"));
        assert!(!index.contains("Rest 11"));
        assert_eq!(index, read(root, "blog/index.html"));

        let page1 = read(root, "blog/page/1/index.html");
        assert!(page1.contains("Post 6<") && page1.contains("Post 2<"));
        assert!(page1.ends_with("/blog/page/2/\">older</a>"));
        let page2 = read(root, "blog/page/2/index.html");
        assert!(page2.contains("Post 1<") && page2.contains("Post 0<"));
        assert!(!page2.contains("older"));
        assert!(!root.join("generated/blog/page/3").exists());

        let post = read(root, "blog/2024/01/01/post-0/index.html");
        assert!(post.starts_with("<h1>Post 0</h1><p>Intro 0.</p>"));
        assert!(post.contains("<p>Rest 0.</p>"));
        assert!(post.ends_with("<a href=\"/blog/2024/01/12/post-11\">previous</a>"));
        assert!(read(root, "blog/2024/01/12/post-11/index.html")
            .ends_with("<a href=\"/blog/2024/01/11/post-10\">previous</a>"));

        assert_eq!(
            ":Post 11,Post 10,Post 9,Post 8,Post 7,Post 6,Post 5,Post 4,Post 3,Post 2,Post 1,Post 0,",
            read(root, "blog/archives/index.html")
        );
        assert_eq!(
            "odd:Post 11,Post 9,Post 7,Post 5,Post 3,Post 1,",
            read(root, "blog/categories/odd/index.html")
        );
        assert!(read(root, "blog/categories/all/atom.xml")
            .starts_with("<updated>2024-06-01T00:00:00+00:00</updated><id>https://example.com/blog/2024/01/12/post-11</id>"));
        assert!(read(root, "atom.xml").contains("<id>https://example.com/blog/2024/01/01/post-0</id>"));
        assert_eq!("<h1>About Example</h1>", read(root, "about-me/index.html"));
        assert_eq!(
            "<h1>projects</h1>https://example.com/projects/",
            read(root, "projects/index.html")
        );
        Ok(())
    }

    #[test]
    fn test_build_site_is_reproducible() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        project(root, 7);
        let config = Config::from_directory(root, None).unwrap();

        let snapshot = || -> Vec<(PathBuf, Vec<u8>)> {
            let out = root.join("generated");
            WalkDir::new(&out)
                .sort_by(|a, b| a.file_name().cmp(b.file_name()))
                .into_iter()
                .map(|entry| entry.unwrap())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| {
                    (
                        entry.path().strip_prefix(&out).unwrap().to_owned(),
                        fs::read(entry.path()).unwrap(),
                    )
                })
                .collect()
        };

        build_site_at(&config, "2024-06-01T00:00:00+00:00")?;
        let first = snapshot();
        build_site_at(&config, "2024-06-01T00:00:00+00:00")?;
        assert_eq!(first, snapshot());
        Ok(())
    }

    #[test]
    fn test_build_site_empty_post_keeps_old_output() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        project(root, 3);
        let config = Config::from_directory(root, None).unwrap();
        build_site_at(&config, "now").unwrap();

        fs::write(
            root.join("content/empty.md"),
            "title: Empty\ndate: 2024-02-01 10:00\n\n",
        )
        .unwrap();
        match build_site_at(&config, "now") {
            Err(err @ Error::Write(WriteError::EmptyContent { .. })) => {
                let message = err.to_string();
                assert!(message.contains("blog/2024/02/01/empty"));
                assert!(message.contains("empty.md"));
            }
            other => panic!("expected EmptyContent, got {:?}", other),
        }
        assert!(!root.join("generated/blog/2024/02/01/empty").exists());
        assert!(root.join("generated/blog/2024/01/01/post-0/index.html").exists());
    }

    #[test]
    fn test_build_site_rejects_escaping_category() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");
        fs::create_dir_all(&root).unwrap();
        project(&root, 1);
        fs::write(
            root.join("content/escape.md"),
            "title: Escape\ndate: 2024-02-01 10:00\ncategories: ../../../escaped\n\nBody.\n",
        )
        .unwrap();
        let config = Config::from_directory(&root, None).unwrap();

        assert!(matches!(
            build_site_at(&config, "now"),
            Err(Error::Parse(ParseError::InvalidCategory { .. }))
        ));
        assert!(!root.join("escaped").exists());
        assert!(!dir.path().join("escaped").exists());
    }

    #[test]
    fn test_build_site_missing_metadata() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        project(root, 1);
        fs::write(root.join("content/broken.md"), "title: Broken\n\nNo date.\n").unwrap();
        let config = Config::from_directory(root, None).unwrap();

        match build_site_at(&config, "now") {
            Err(err @ Error::Parse(ParseError::MissingMetadata { .. })) => {
                assert!(err.to_string().contains("broken.md"))
            }
            other => panic!("expected MissingMetadata, got {:?}", other),
        }
    }
}
