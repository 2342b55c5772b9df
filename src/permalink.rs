//! Pure functions deriving the slug, relative path and root-relative URL of a
//! post. Nothing here touches the filesystem, so the same title and date
//! always map to the same location.

use chrono::NaiveDateTime;

/// Derives the file-name slug for a post title: the title is lower-cased,
/// every character that isn't alphanumeric, a space or a hyphen is dropped,
/// and each space becomes a hyphen (e.g., `Hello, World!` becomes
/// `hello-world`). Keeping hyphens makes the function idempotent, so a slug
/// maps to itself; it also means `Foo-Bar` becomes `foo-bar` rather than
/// `foobar`. Distinct titles may share a slug; collisions are detected by
/// [`crate::parser::Parser`], not here.
pub fn derive_slug(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-')
        .map(|c| if c == ' ' { '-' } else { c })
        .collect()
}

/// Derives the dated relative path for a post, `YYYY/MM/DD/{slug}`.
pub fn derive_relative_path(title: &str, date: &NaiveDateTime) -> String {
    format!("{}/{}", date.format("%Y/%m/%d"), derive_slug(title))
}

/// Joins path segments under the site root. Empty segments are skipped and
/// stray slashes are trimmed, so `root_join(&["", "blog", "2024/03/07/x"])`
/// is `/blog/2024/03/07/x`.
pub fn root_join(segments: &[&str]) -> String {
    let mut joined = String::from("/");
    for segment in segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
    {
        if joined.len() > 1 {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}

/// The root-relative URL of a category's archive page, with a trailing
/// slash, e.g. `/blog/categories/rust/`.
pub fn category_url(blog_root: &str, blog_prefix: &str, category: &str) -> String {
    format!(
        "{}/",
        root_join(&[blog_root, blog_prefix, "categories", category])
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_derive_slug() {
        assert_eq!("hello-world", derive_slug("Hello, World!"));
        assert_eq!("rust-2018-edition", derive_slug("Rust 2018 Edition"));
        assert_eq!("", derive_slug(""));
        assert_eq!("", derive_slug("?!"));
    }

    #[test]
    fn test_derive_slug_keeps_hyphens() {
        assert_eq!("foo-bar", derive_slug("Foo-Bar"));
        assert_eq!("a-b-c", derive_slug("a-b c"));
    }

    #[test]
    fn test_derive_slug_keeps_repeated_spaces() {
        assert_eq!("a--b", derive_slug("a  b"));
    }

    #[test]
    fn test_derive_slug_idempotent() {
        for title in &["Hello, World!", "My Post", "C++ & Rust: a love story"] {
            let once = derive_slug(title);
            assert_eq!(once, derive_slug(&once));
        }
    }

    #[test]
    fn test_derive_relative_path() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        assert_eq!("2024/03/07/my-post", derive_relative_path("My Post", &date));
    }

    #[test]
    fn test_category_url() {
        assert_eq!("/blog/categories/rust/", category_url("", "blog", "rust"));
        assert_eq!("/categories/rust/", category_url("", "", "rust"));
    }

    #[test]
    fn test_root_join() {
        assert_eq!("/", root_join(&[]));
        assert_eq!("/2024/03/07/x", root_join(&["", "2024/03/07/x"]));
        assert_eq!(
            "/marketing/blog/2024/03/07/x",
            root_join(&["/marketing/", "blog", "2024/03/07/x"])
        );
    }
}
