//! Loads the immutable site [`Config`] from a `blug.yaml` project file.

use crate::permalink::root_join;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "blug.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(5)
    }
}

#[derive(Deserialize)]
struct PageEntry {
    template: String,

    #[serde(default)]
    path: Option<String>,
}

#[derive(Deserialize)]
struct Project {
    url: Url,

    #[serde(default)]
    blog_prefix: String,

    #[serde(default)]
    blog_root: String,

    #[serde(default = "default_content_dir")]
    content_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,

    #[serde(default = "default_template_dir")]
    template_dir: PathBuf,

    #[serde(default = "default_static_dir")]
    static_dir: PathBuf,

    #[serde(default)]
    template_partials: Vec<PathBuf>,

    #[serde(default)]
    page_size: PageSize,

    #[serde(default)]
    additional_pages: BTreeMap<String, PageEntry>,

    /// Everything else is handed to the templates untouched.
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// A page rendered from its own template with only the site variables and
/// its `page_name`, e.g. a projects page. Written to
/// `{output_dir}/{path}/index.html`.
#[derive(Clone, Debug)]
pub struct AdditionalPage {
    pub name: String,
    pub template: String,
    pub path: String,
}

/// The site configuration. Built once at startup and never modified; every
/// component borrows what it needs from it.
#[derive(Debug)]
pub struct Config {
    /// The canonical base URL of the site, e.g. `https://example.com`.
    pub url: Url,

    /// The path segment the blog lives under, relative to the site root.
    pub blog_prefix: String,

    /// The mount point of the site below the domain. Only affects URLs.
    pub blog_root: String,

    pub content_dir: PathBuf,

    /// The output directory. It is deleted and recreated on every build.
    pub output_dir: PathBuf,

    /// `{output_dir}/{blog_prefix}`.
    pub blog_dir: PathBuf,

    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
    pub template_partials: Vec<PathBuf>,

    /// The number of posts on each listing page.
    pub page_size: usize,

    /// Extra pages, in name order.
    pub additional_pages: Vec<AdditionalPage>,

    /// Site settings that have no meaning to the generator itself but are
    /// passed to every template (`title`, `author`, ...).
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Config {
    /// Looks for [`PROJECT_FILE`] in `dir` and then in each of its parents,
    /// and loads the first one found. See [`Config::from_project_file`].
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
            current = dir.parent();
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    /// Loads the project file at `path`. Relative directories are resolved
    /// against the directory containing the file. `output_directory`, if
    /// given, replaces the configured `output_dir`.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Yaml {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Config::from_project(project, project_root, output_directory)
    }

    fn from_project(
        project: Project,
        project_root: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        if project.page_size.0 == 0 {
            return Err(Error::Invalid(String::from("`page_size` must be at least 1")));
        }

        let output_dir = match output_directory {
            Some(dir) => dir.to_owned(),
            None => project_root.join(&project.output_dir),
        };
        let blog_prefix = project.blog_prefix.trim_matches('/').to_owned();
        let template_dir = project_root.join(&project.template_dir);
        let template_partials = project
            .template_partials
            .iter()
            .map(|relpath| template_dir.join(relpath))
            .collect();

        Ok(Config {
            blog_dir: output_dir.join(&blog_prefix),
            output_dir,
            url: project.url,
            blog_prefix,
            blog_root: project.blog_root,
            content_dir: project_root.join(&project.content_dir),
            template_dir,
            static_dir: project_root.join(&project.static_dir),
            template_partials,
            page_size: project.page_size.0,
            additional_pages: project
                .additional_pages
                .into_iter()
                .map(|(name, entry)| AdditionalPage {
                    path: entry.path.unwrap_or_else(|| name.clone()),
                    template: entry.template,
                    name,
                })
                .collect(),
            extra: project.extra,
        })
    }

    /// The base URL without a trailing slash, e.g. `https://example.com`.
    pub fn canonical_base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    /// The canonical URL of the blog index, with a trailing slash, e.g.
    /// `https://example.com/blog/`.
    pub fn blog_url(&self) -> String {
        let root = root_join(&[&self.blog_root, &self.blog_prefix]);
        match root.as_str() {
            "/" => format!("{}/", self.canonical_base()),
            _ => format!("{}{}/", self.canonical_base(), root),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or its parents.
    NotFound(PathBuf),

    /// Returned when the project file can't be read.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid YAML or is missing `url`.
    Yaml { path: PathBuf, err: serde_yaml::Error },

    /// Returned for values that parse but make no sense.
    Invalid(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(dir) => write!(
                f,
                "Could not find `{}` in '{}' or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Io { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Yaml { path, err } => {
                write!(f, "Loading project file '{}': {}", path.display(), err)
            }
            Error::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::Io { err, .. } => Some(err),
            Error::Yaml { err, .. } => Some(err),
            Error::Invalid(_) => None,
        }
    }
}
