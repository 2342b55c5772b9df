//! Adapts `pulldown_cmark` into the Markdown engine the post parser relies
//! on: [`split_metadata`] pulls the leading metadata block off a source file
//! and [`to_html`] renders the remaining body.

use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use std::collections::HashMap;
use std::io;

/// Metadata as read from the head of a post. Every key maps to one value
/// per source line (continuation lines add further values), so even a
/// single-line `title: Foo` arrives as `["Foo"]`.
pub type Metadata = HashMap<String, Vec<String>>;

/// Splits a source file into its metadata block and its Markdown body.
///
/// The block is a run of `key: value` lines at the very top of the file,
/// optionally wrapped in `---` fences. Keys are lower-cased. A line indented
/// by four or more spaces continues the previous key. The block ends at the
/// first blank line, at a closing `---` or `...` fence, or at the first line
/// that fits none of the above, which is left in the body.
///
/// ```md
/// title: Hello, world!
/// date: 2021-04-16 09:30
/// categories: greet rust
///
/// # Hello
/// ```
pub fn split_metadata(input: &str) -> (Metadata, &str) {
    let mut metadata = Metadata::new();
    let mut offset = 0;
    let mut last_key: Option<String> = None;
    let mut lines = input.split_inclusive('\n').peekable();

    if let Some(first) = lines.peek().copied() {
        if is_fence(trim_newline(first), "---") {
            offset += first.len();
            lines.next();
        }
    }

    for line in lines {
        let trimmed = trim_newline(line);
        if trimmed.trim().is_empty()
            || is_fence(trimmed, "---")
            || is_fence(trimmed, "...")
        {
            offset += line.len();
            break;
        }

        if let Some((key, value)) = metadata_line(trimmed) {
            metadata.entry(key.clone()).or_default().push(value);
            last_key = Some(key);
        } else {
            match (&last_key, continuation_line(trimmed)) {
                (Some(key), Some(value)) => {
                    metadata.entry(key.clone()).or_default().push(value);
                }
                _ => break,
            }
        }
        offset += line.len();
    }

    (metadata, &input[offset..])
}

fn trim_newline(line: &str) -> &str {
    line.trim_end_matches(|c: char| c == '\n' || c == '\r')
}

fn is_fence(line: &str, fence: &str) -> bool {
    match line.strip_prefix(fence) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

fn metadata_line(line: &str) -> Option<(String, String)> {
    let stripped = line.trim_start_matches(' ');
    if line.len() - stripped.len() > 3 {
        return None;
    }
    let (key, value) = stripped.split_once(':')?;
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_key {
        return None;
    }
    Some((key.to_lowercase(), value.trim().to_owned()))
}

fn continuation_line(line: &str) -> Option<String> {
    match line.starts_with("    ") {
        true => Some(line.trim().to_owned()),
        false => None,
    }
}

/// Converts markdown to HTML, appending the result to `w`.
///
/// * `markdown` is the post body, without its metadata block.
/// * `footnote_prefix` is prepended to footnote reference links (e.g., the
///   post's URL) so that the links still resolve when the teaser is shown on
///   a listing page while the footnote itself lives on the post page.
pub fn to_html(w: &mut String, markdown: &str, footnote_prefix: &str) -> io::Result<()> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut footnotes = FootnoteLinker::new(footnote_prefix);
    let events = Parser::new_ext(markdown, options)
        .map(|ev| footnotes.convert(ev))
        .collect::<io::Result<Vec<Event>>>()?;
    html::push_html(w, events.into_iter());
    Ok(())
}

/// Rewrites footnote references and definitions into raw HTML so references
/// carry `footnote_prefix`. Numbers are assigned in order of first
/// appearance, the same as `pulldown_cmark`'s own renderer.
struct FootnoteLinker<'a> {
    prefix: &'a str,
    numbers: HashMap<String, usize>,
}

impl<'a> FootnoteLinker<'a> {
    fn new(prefix: &'a str) -> Self {
        FootnoteLinker {
            prefix,
            numbers: HashMap::new(),
        }
    }

    fn number(&mut self, name: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(name.to_owned()).or_insert(next)
    }

    fn convert<'b>(&mut self, ev: Event<'b>) -> io::Result<Event<'b>> {
        Ok(match ev {
            Event::FootnoteReference(name) => {
                let number = self.number(&name);
                let mut html = String::from("<sup class=\"footnote-reference\"><a href=\"");
                escape_href(&mut html, self.prefix)?;
                html.push('#');
                escape_html(&mut html, &name)?;
                html.push_str(&format!("\">{}</a></sup>", number));
                Event::Html(CowStr::Boxed(html.into_boxed_str()))
            }
            Event::Start(Tag::FootnoteDefinition(name)) => {
                let number = self.number(&name);
                let mut html = String::from("\n<div class=\"footnote-definition\" id=\"");
                escape_html(&mut html, &name)?;
                html.push_str(&format!(
                    "\"><sup class=\"footnote-definition-label\">{}</sup>",
                    number
                ));
                Event::Html(CowStr::Boxed(html.into_boxed_str()))
            }
            Event::End(Tag::FootnoteDefinition(_)) => {
                Event::Html(CowStr::Borrowed("</div>\n"))
            }
            _ => ev,
        })
    }
}
