//! Renders every page of an assembled [`Site`] through the templates and
//! writes the results below the output directory.

use crate::assemble::{PageWindow, Site};
use crate::config::Config;
use crate::post::Post;
use crate::templates::{self, Templates};
use crate::util::write_file;
use crate::value;
use gtmpl::Value;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INDEX_FILE: &str = "index.html";
const FEED_FILE: &str = "atom.xml";

/// Renders and writes all pages of `site`:
///
/// * `/index.html` and `{blog}/index.html` with the latest posts
/// * `{blog}/page/{n}/index.html` for each further listing page
/// * `/about-me/index.html`
/// * `{blog}/archives/index.html` and `/atom.xml`
/// * `{blog}/categories/{name}/index.html` and `atom.xml` for each category
/// * `{relative_path}/index.html` for each post
/// * `{path}/index.html` for each additional page
///
/// `now` is exposed to the feed templates only, which keeps every other
/// page byte-identical between runs. Nothing is written if any post has an
/// empty body.
pub fn write_site(config: &Config, templates: &Templates, site: &Site, now: &str) -> Result<()> {
    check_content(site.posts)?;

    let writer = Writer {
        config,
        templates,
        now,
        site_values: site_values(config, site),
    };
    writer.write_additional_pages()?;
    writer.write_indices(site)?;
    writer.write_about()?;
    writer.write_archives(site)?;
    writer.write_categories(site)?;
    writer.write_pagination(&site.pages)?;
    writer.write_posts(site)?;
    info!(posts = site.posts.len(), "wrote site");
    Ok(())
}

/// Fails with [`Error::EmptyContent`] for the first post without a body.
pub fn check_content(posts: &[Post]) -> Result<()> {
    match posts.iter().find(|post| post.body.is_empty()) {
        Some(post) => Err(Error::EmptyContent {
            relative_path: post.relative_path.clone(),
            path: post.source_path.clone(),
        }),
        None => Ok(()),
    }
}

/// The variables every template receives: the extra project settings plus
/// the URL settings and the category list.
fn site_values(config: &Config, site: &Site) -> HashMap<String, Value> {
    let mut m: HashMap<String, Value> = config
        .extra
        .iter()
        .map(|(key, yaml)| (key.clone(), value::from_yaml(yaml)))
        .collect();
    m.insert("url".to_owned(), config.canonical_base().into());
    m.insert("blog_prefix".to_owned(), (&config.blog_prefix).into());
    m.insert("blog_root".to_owned(), (&config.blog_root).into());
    m.insert("blog_url".to_owned(), config.blog_url().into());
    m.insert(
        "categories".to_owned(),
        Value::Array(
            site.categories
                .iter()
                .map(|(name, posts)| {
                    let mut c: HashMap<String, Value> = HashMap::new();
                    c.insert("name".to_owned(), name.into());
                    c.insert(
                        "url".to_owned(),
                        crate::permalink::category_url(
                            &config.blog_root,
                            &config.blog_prefix,
                            name,
                        )
                        .into(),
                    );
                    c.insert("count".to_owned(), Value::from(posts.len() as u64));
                    Value::Object(c)
                })
                .collect(),
        ),
    );
    m
}

/// Writes pages from templates. Holds everything shared between pages.
struct Writer<'a> {
    config: &'a Config,
    templates: &'a Templates,
    now: &'a str,
    site_values: HashMap<String, Value>,
}

impl Writer<'_> {
    /// Renders `template` with the site values overlaid by `page` and writes
    /// the result to `file_path`.
    fn write_page(&self, template: &str, page: Vec<(&str, Value)>, file_path: &Path) -> Result<()> {
        let mut m = self.site_values.clone();
        for (key, value) in page {
            m.insert(key.to_owned(), value);
        }
        let rendered = self.templates.render(template, Value::Object(m))?;
        write_file(file_path, &rendered).map_err(|err| Error::Io {
            path: file_path.to_owned(),
            err,
        })?;
        debug!(path = %file_path.display(), template, "wrote page");
        Ok(())
    }

    fn write_additional_pages(&self) -> Result<()> {
        for page in &self.config.additional_pages {
            let canonical_url = format!(
                "{}/",
                crate::permalink::root_join(&[&self.config.blog_root, &page.path])
            );
            self.write_page(
                &page.template,
                vec![
                    ("page_name", page.name.as_str().into()),
                    (
                        "canonical_url",
                        format!("{}{}", self.config.canonical_base(), canonical_url).into(),
                    ),
                ],
                &self.config.output_dir.join(&page.path).join(INDEX_FILE),
            )?;
        }
        Ok(())
    }

    /// The front page and the blog index show the same posts.
    fn write_indices(&self, site: &Site) -> Result<()> {
        let latest = || {
            vec![
                ("current_posts", value::posts(site.latest())),
                ("next_page", value::page_number(site.next_page())),
            ]
        };

        let mut front = latest();
        front.push(("canonical_url", self.config.canonical_base().into()));
        self.write_page(
            templates::LIST,
            front,
            &self.config.output_dir.join(INDEX_FILE),
        )?;

        let mut blog = latest();
        blog.push(("canonical_url", self.config.blog_url().into()));
        self.write_page(
            templates::LIST,
            blog,
            &self.config.blog_dir.join(INDEX_FILE),
        )
    }

    fn write_about(&self) -> Result<()> {
        self.write_page(
            templates::ABOUT,
            vec![(
                "canonical_url",
                format!("{}/about-me/", self.config.canonical_base()).into(),
            )],
            &self.config.output_dir.join("about-me").join(INDEX_FILE),
        )
    }

    /// Writes the blog archive and the site feed, both listing every post.
    fn write_archives(&self, site: &Site) -> Result<()> {
        self.write_page(
            templates::ARCHIVES,
            vec![
                ("category", "".into()),
                ("all_posts", value::posts(site.posts)),
                (
                    "canonical_url",
                    format!("{}archives/", self.config.blog_url()).into(),
                ),
            ],
            &self.config.blog_dir.join("archives").join(INDEX_FILE),
        )?;

        self.write_page(
            templates::ATOM,
            vec![
                ("category", "".into()),
                ("all_posts", value::posts(site.posts)),
                ("current_posts", value::posts(site.latest())),
                ("now", self.now.into()),
                ("canonical_url", self.config.canonical_base().into()),
            ],
            &self.config.output_dir.join(FEED_FILE),
        )
    }

    /// Writes an archive page and a feed for each category, side by side in
    /// the category's directory.
    fn write_categories(&self, site: &Site) -> Result<()> {
        for (name, posts) in site.categories.iter() {
            let dir = self.config.blog_dir.join("categories").join(name);
            let canonical_url = format!("{}categories/{}/", self.config.blog_url(), name);
            let all_posts = value::posts(posts.iter().copied());

            self.write_page(
                templates::ARCHIVES,
                vec![
                    ("category", name.into()),
                    ("all_posts", all_posts.clone()),
                    ("canonical_url", canonical_url.as_str().into()),
                ],
                &dir.join(INDEX_FILE),
            )?;
            self.write_page(
                templates::ATOM,
                vec![
                    ("category", name.into()),
                    ("all_posts", all_posts),
                    ("now", self.now.into()),
                    ("canonical_url", canonical_url.as_str().into()),
                ],
                &dir.join(FEED_FILE),
            )?;
        }
        Ok(())
    }

    fn write_pagination(&self, pages: &[PageWindow]) -> Result<()> {
        for page in pages {
            self.write_page(
                templates::LIST,
                vec![
                    ("current_posts", value::posts(page.posts)),
                    ("page", Value::from(page.number as u64)),
                    ("next_page", value::page_number(page.next_page)),
                    ("previous_page", Value::from(page.previous_page() as u64)),
                    (
                        "canonical_url",
                        format!("{}page/{}/", self.config.blog_url(), page.number).into(),
                    ),
                ],
                &self
                    .config
                    .blog_dir
                    .join("page")
                    .join(page.number.to_string())
                    .join(INDEX_FILE),
            )?;
        }
        Ok(())
    }

    fn write_posts(&self, site: &Site) -> Result<()> {
        for post in site.posts {
            self.write_post(post, site.previous(post))?;
        }
        Ok(())
    }

    fn write_post(&self, post: &Post, previous: Option<&Post>) -> Result<()> {
        self.write_page(
            templates::POST,
            vec![
                ("post", post.to_value()),
                (
                    "post_previous",
                    previous.map_or(Value::Nil, Post::to_value),
                ),
                ("canonical_url", (&post.canonical_url).into()),
            ],
            &self
                .config
                .output_dir
                .join(&post.relative_path)
                .join(INDEX_FILE),
        )
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post has no content. Names the post's relative path
    /// and its source file.
    EmptyContent {
        relative_path: String,
        path: PathBuf,
    },

    /// An error during templating.
    Template(templates::Error),

    /// An error writing an output file.
    Io { path: PathBuf, err: io::Error },
}

impl From<templates::Error> for Error {
    /// Converts a [`templates::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for fallible template operations.
    fn from(err: templates::Error) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyContent {
                relative_path,
                path,
            } => write!(
                f,
                "No content for post [{}] found in '{}'",
                relative_path,
                path.display()
            ),
            Error::Template(err) => write!(f, "{}", err),
            Error::Io { path, err } => write!(f, "Writing '{}': {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::EmptyContent { .. } => None,
            Error::Template(err) => Some(err),
            Error::Io { err, .. } => Some(err),
        }
    }
}
