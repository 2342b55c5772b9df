//! Loads the site's `gtmpl` templates and renders pages from them.

use gtmpl::{Context, Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The template for the front page, the blog index and its pagination pages.
pub const LIST: &str = "list.html";
/// The template for the blog archive and each category archive.
pub const ARCHIVES: &str = "archives.html";
/// The template for the site feed and each category feed.
pub const ATOM: &str = "atom.xml";
/// The template for the About page.
pub const ABOUT: &str = "about.html";
/// The template for individual posts.
pub const POST: &str = "post_index.html";

/// The templates every site needs.
pub const REQUIRED: [&str; 5] = [LIST, ARCHIVES, ATOM, ABOUT, POST];

/// Parsed templates, keyed by file name relative to the template directory.
pub struct Templates {
    templates: HashMap<String, Template>,
}

impl Templates {
    /// Loads and parses each of `names` from `template_dir`. The contents of
    /// every file in `partials` are prepended to each template, which lets
    /// themes share `{{define}}` blocks.
    pub fn load<'n>(
        template_dir: &Path,
        partials: &[PathBuf],
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<Templates> {
        let mut shared = String::new();
        for partial in partials {
            read_into(&mut shared, partial)?;
            shared.push(' ');
        }

        let mut templates = HashMap::new();
        for name in names {
            if templates.contains_key(name) {
                continue;
            }
            let mut contents = shared.clone();
            read_into(&mut contents, &template_dir.join(name))?;

            let mut template = Template::default();
            template
                .parse(&contents)
                .map_err(|err| Error::ParseTemplate {
                    name: name.to_owned(),
                    err,
                })?;
            templates.insert(name.to_owned(), template);
        }
        Ok(Templates { templates })
    }

    /// Renders the template `name` with `value` as its data (`.`).
    pub fn render(&self, name: &str, value: Value) -> Result<String> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| Error::UnknownTemplate(name.to_owned()))?;
        let render_err = |err: String| Error::Render {
            name: name.to_owned(),
            err,
        };

        let context = Context::from(value).map_err(render_err)?;
        let mut output: Vec<u8> = Vec::new();
        template.execute(&mut output, &context).map_err(render_err)?;
        String::from_utf8(output).map_err(|err| render_err(err.to_string()))
    }
}

// Appends the contents of the file at `path` to `contents`.
fn read_into(contents: &mut String, path: &Path) -> Result<()> {
    use std::io::Read;
    File::open(path)
        .and_then(|mut file| file.read_to_string(contents))
        .map_err(|err| Error::OpenTemplateFile {
            path: path.to_owned(),
            err,
        })?;
    Ok(())
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for loading and rendering templates.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate { name: String, err: String },

    /// Returned when rendering a template that was never loaded.
    UnknownTemplate(String),

    /// Returned for errors executing a template.
    Render { name: String, err: String },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "Parsing template '{}': {}", name, err)
            }
            Error::UnknownTemplate(name) => write!(f, "Unknown template '{}'", name),
            Error::Render { name, err } => {
                write!(f, "Rendering template '{}': {}", name, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { err, .. } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_render() -> Result<()> {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.html"), r#"{{define "greet"}}Hi {{.}}{{end}}"#).unwrap();
        fs::write(dir.path().join("page.html"), r#"{{template "greet" .name}}!"#).unwrap();

        let templates = Templates::load(
            dir.path(),
            &[dir.path().join("base.html")],
            vec!["page.html"],
        )?;
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), Value::from("Jo"));
        let rendered = templates.render("page.html", Value::Object(m))?;
        assert_eq!("Hi Jo!", rendered.trim());
        Ok(())
    }

    #[test]
    fn test_missing_template_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Templates::load(dir.path(), &[], vec!["list.html"]),
            Err(Error::OpenTemplateFile { .. })
        ));
    }

    #[test]
    fn test_unknown_template() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let templates = Templates::load(dir.path(), &[], Vec::new())?;
        assert!(matches!(
            templates.render("nope.html", Value::Nil),
            Err(Error::UnknownTemplate(_))
        ));
        Ok(())
    }
}
