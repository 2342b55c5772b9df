//! Defines the [`Category`] type, which represents a [`crate::post::Post`]
//! category.

use gtmpl::Value;
use std::hash::{Hash, Hasher};

/// Represents a [`crate::post::Post`] category. Categories are declared as
/// whitespace-separated tokens in a post's metadata and are used verbatim as
/// a directory name, so `rust` ends up at `{blog}/categories/rust/`. Two
/// categories are the same category when their names match.
#[derive(Clone, Debug)]
pub struct Category {
    /// The category's name as written in the post's metadata.
    pub name: String,

    /// The root-relative URL of the category's archive page, e.g.
    /// `/blog/categories/rust/`.
    pub url: String,
}

impl Hash for Category {
    /// Implements [`Hash`] for [`Category`] by delegating directly to the
    /// `name` field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Category {
    /// Implements [`PartialEq`] and [`Eq`] for [`Category`] by delegating
    /// directly to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Category {}

impl From<&Category> for Value {
    /// Converts [`Category`]s into [`Value`]s for templating.
    fn from(c: &Category) -> Value {
        use std::collections::HashMap;
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), (&c.name).into());
        m.insert("url".to_owned(), (&c.url).into());
        Value::Object(m)
    }
}
