use crate::post::Post;
use gtmpl_value::Value;
use std::collections::HashMap;

/// Converts a list of posts into a template array. Each post goes through
/// [`Post::to_value`].
pub fn posts<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Value {
    Value::Array(posts.into_iter().map(Post::to_value).collect())
}

/// Converts a page number into a template value; `None` becomes nil so that
/// `{{if .next_page}}` works as expected.
pub fn page_number(page: Option<usize>) -> Value {
    match page {
        Some(page) => Value::from(page as u64),
        None => Value::Nil,
    }
}

/// Converts a value from the YAML project file into a template value, so that
/// arbitrary site settings (`title`, `author`, ...) reach the templates.
pub fn from_yaml(yaml: &serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match yaml {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => Value::from(u),
            (None, Some(i), _) => Value::from(i),
            (None, None, Some(f)) => Value::from(f),
            (None, None, None) => Value::Nil,
        },
        Yaml::String(s) => Value::from(s.as_str()),
        Yaml::Sequence(items) => Value::Array(items.iter().map(from_yaml).collect()),
        Yaml::Mapping(mapping) => {
            let mut m: HashMap<String, Value> = HashMap::new();
            for (key, value) in mapping.iter() {
                if let Some(key) = key.as_str() {
                    m.insert(key.to_owned(), from_yaml(value));
                }
            }
            Value::Object(m)
        }
    }
}
