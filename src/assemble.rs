//! Turns the flat list of parsed posts into the structures the pages are
//! rendered from: a date-ordered post list with `previous` links, a
//! [`CategoryIndex`], and the [`PageWindow`]s of the paginated blog index.

use crate::post::Post;
use std::collections::BTreeMap;

/// Sorts posts by date, most recent first. The sort is stable, so posts with
/// identical timestamps keep their relative order.
pub fn sort_by_date_descending(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Returns the index of the post linked as "previous" from the post at
/// `index` in a date-sorted list of `len` posts. This is the next-older
/// post, except for the oldest post which links back around to the newest.
pub fn previous_index(index: usize, len: usize) -> Option<usize> {
    match index + 1 < len {
        true => Some(index + 1),
        false if len > 0 => Some(0),
        false => None,
    }
}

/// Sets `previous` on every post of a date-sorted list. See
/// [`previous_index`].
pub fn link_previous(posts: &mut [Post]) {
    let len = posts.len();
    for (i, post) in posts.iter_mut().enumerate() {
        post.previous = previous_index(i, len);
    }
}

/// Maps each category name to the posts declaring it. Each bucket keeps the
/// order of the post list it was built from.
pub struct CategoryIndex<'a> {
    buckets: BTreeMap<&'a str, Vec<&'a Post>>,
}

impl<'a> CategoryIndex<'a> {
    /// Indexes a date-sorted list of posts in a single pass. Posts without
    /// categories are skipped.
    pub fn build(posts: &'a [Post]) -> CategoryIndex<'a> {
        let mut buckets: BTreeMap<&'a str, Vec<&'a Post>> = BTreeMap::new();
        for post in posts {
            for category in post.categories.iter() {
                buckets.entry(category.name.as_str()).or_default().push(post);
            }
        }
        CategoryIndex { buckets }
    }

    /// Returns the posts for `category`, if any post declares it.
    pub fn get(&self, category: &str) -> Option<&[&'a Post]> {
        self.buckets.get(category).map(Vec::as_slice)
    }

    /// Iterates categories in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &[&'a Post])> + '_ {
        self.buckets
            .iter()
            .map(|(name, posts)| (*name, posts.as_slice()))
    }
}

/// One page of the paginated blog index beyond the first.
#[derive(Debug)]
pub struct PageWindow<'a> {
    /// The page number; page `k` is written to `{blog}/page/{k}/`.
    pub number: usize,

    /// The posts on the page.
    pub posts: &'a [Post],

    /// The number of the page with older posts, if there is one.
    pub next_page: Option<usize>,
}

impl PageWindow<'_> {
    /// The number of the page with newer posts. `0` is the blog index
    /// itself.
    pub fn previous_page(&self) -> usize {
        self.number - 1
    }
}

/// Splits a date-sorted list of posts into pages of `page_size`. The first
/// `page_size` posts belong to the index pages and are not returned; window
/// `k` (starting at 1) holds `posts[k * page_size..(k + 1) * page_size]`.
/// A window's `next_page` is `None` once the following window would be the
/// last non-empty one or beyond (`k * page_size >= len - page_size`).
pub fn paginate(posts: &[Post], page_size: usize) -> Vec<PageWindow> {
    if page_size == 0 {
        return Vec::new();
    }

    posts
        .chunks(page_size)
        .enumerate()
        .skip(1)
        .map(|(number, chunk)| PageWindow {
            number,
            posts: chunk,
            next_page: match number * page_size + page_size >= posts.len() {
                true => None,
                false => Some(number + 1),
            },
        })
        .collect()
}

/// The assembled site: the date-sorted posts together with their category
/// index and pagination.
pub struct Site<'a> {
    /// All posts, most recent first, with `previous` links set.
    pub posts: &'a [Post],

    pub categories: CategoryIndex<'a>,

    /// The listing pages after the first; see [`paginate`].
    pub pages: Vec<PageWindow<'a>>,

    page_size: usize,
}

impl<'a> Site<'a> {
    /// Assembles a site from posts already passed through
    /// [`sort_by_date_descending`] and [`link_previous`].
    pub fn new(posts: &'a [Post], page_size: usize) -> Site<'a> {
        Site {
            posts,
            categories: CategoryIndex::build(posts),
            pages: paginate(posts, page_size),
            page_size,
        }
    }

    /// The posts shown on the front page and the blog index.
    pub fn latest(&self) -> &'a [Post] {
        &self.posts[..self.posts.len().min(self.page_size)]
    }

    /// The page the front page and blog index link to for older posts.
    pub fn next_page(&self) -> Option<usize> {
        self.pages.first().map(|page| page.number)
    }

    /// The post linked as "previous" from `post`.
    pub fn previous(&self, post: &Post) -> Option<&'a Post> {
        post.previous.and_then(|i| self.posts.get(i))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::category::Category;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn post(title: &str, date: (i32, u32, u32), categories: &[&str]) -> Post {
        Post {
            source_path: PathBuf::from(format!("{}.md", title)),
            title: title.to_owned(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
            categories: categories
                .iter()
                .map(|name| Category {
                    name: (*name).to_owned(),
                    url: format!("/categories/{}/", name),
                })
                .collect(),
            body: format!("<p>{}</p>", title),
            slug: title.to_owned(),
            relative_path: title.to_owned(),
            relative_url: format!("/{}", title),
            canonical_url: format!("https://example.com/{}", title),
            previous: None,
        }
    }

    fn titles<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<&'a str> {
        posts.into_iter().map(|p| p.title.as_str()).collect()
    }

    fn many(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| post(&format!("p{}", i), (2024, 1, 1), &[]))
            .collect()
    }

    #[test]
    fn test_sort_is_stable() {
        let mut posts = vec![
            post("old", (2023, 12, 31), &[]),
            post("first", (2024, 1, 1), &[]),
            post("second", (2024, 1, 1), &[]),
        ];
        sort_by_date_descending(&mut posts);
        assert_eq!(vec!["first", "second", "old"], titles(&posts));
    }

    #[test]
    fn test_category_index_order() {
        let posts = vec![
            post("p1", (2024, 2, 1), &["a"]),
            post("p2", (2024, 1, 1), &["a", "b"]),
            post("p3", (2023, 1, 1), &[]),
        ];
        let index = CategoryIndex::build(&posts);
        assert_eq!(2, index.iter().count());
        assert_eq!(vec!["p1", "p2"], titles(index.get("a").unwrap().iter().copied()));
        assert_eq!(vec!["p2"], titles(index.get("b").unwrap().iter().copied()));
        assert!(index.get("c").is_none());
        assert_eq!(
            vec!["a", "b"],
            index.iter().map(|(name, _)| name).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_link_previous_wraps_around() {
        let mut posts = vec![
            post("p1", (2024, 3, 1), &[]),
            post("p2", (2024, 2, 1), &[]),
            post("p3", (2024, 1, 1), &[]),
        ];
        link_previous(&mut posts);
        assert_eq!(
            vec![Some(1), Some(2), Some(0)],
            posts.iter().map(|p| p.previous).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_previous_index_single_post() {
        assert_eq!(Some(0), previous_index(0, 1));
        assert_eq!(None, previous_index(0, 0));
    }

    #[test]
    fn test_paginate_twelve_posts() {
        let posts = many(12);
        let windows = paginate(&posts, 5);
        assert_eq!(2, windows.len());

        assert_eq!(1, windows[0].number);
        assert_eq!(vec!["p5", "p6", "p7", "p8", "p9"], titles(windows[0].posts));
        assert_eq!(Some(2), windows[0].next_page);
        assert_eq!(0, windows[0].previous_page());

        assert_eq!(2, windows[1].number);
        assert_eq!(vec!["p10", "p11"], titles(windows[1].posts));
        assert_eq!(None, windows[1].next_page);
        assert_eq!(1, windows[1].previous_page());
    }

    #[test]
    fn test_paginate_exact_multiple() {
        let posts = many(15);
        let windows = paginate(&posts, 5);
        assert_eq!(2, windows.len());
        assert_eq!(Some(2), windows[0].next_page);
        assert_eq!(None, windows[1].next_page);
        assert_eq!(5, windows[1].posts.len());
    }

    #[test]
    fn test_site() {
        let mut posts = many(7);
        link_previous(&mut posts);
        let site = Site::new(&posts, 5);
        assert_eq!(5, site.latest().len());
        assert_eq!(Some(1), site.next_page());
        assert_eq!("p1", site.previous(&posts[0]).unwrap().title);
        assert_eq!("p0", site.previous(&posts[6]).unwrap().title);

        let few = many(2);
        let site = Site::new(&few, 5);
        assert_eq!(2, site.latest().len());
        assert_eq!(None, site.next_page());
    }

    #[test]
    fn test_paginate_single_page() {
        assert!(paginate(&many(5), 5).is_empty());
        assert!(paginate(&many(3), 5).is_empty());
        assert!(paginate(&[], 5).is_empty());
    }

    #[test]
    fn test_paginate_one_extra_page() {
        let posts = many(6);
        let windows = paginate(&posts, 5);
        assert_eq!(1, windows.len());
        assert_eq!(vec!["p5"], titles(windows[0].posts));
        assert_eq!(None, windows[0].next_page);
    }
}
