use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ParseError;

const HEADING: &str = "div#content h1";
const COVER: &str = "div.bookimage a img[src]";
const COMMENTS: &str = "div.texts span.black";
const GENRES: &str = "span.d_book a";
const TITLE_AUTHOR_SEPARATOR: &str = "::";

/// Fields read from a book detail page. The cover `src` is left relative;
/// the caller resolves it against the URL the page was served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBook {
    pub title: String,
    pub author: String,
    pub cover_src: Option<String>,
    pub comments: Vec<String>,
    pub genres: Vec<String>,
}

pub fn parse_book_page(html: &str) -> Result<ParsedBook, ParseError> {
    let doc = Html::parse_document(html);

    let heading = doc
        .select(&selector(HEADING)?)
        .next()
        .map(|node| element_text(&node))
        .ok_or(ParseError::MissingHeading)?;
    let (title, author) = split_heading(&heading)?;

    let cover_src = doc
        .select(&selector(COVER)?)
        .next()
        .and_then(|node| node.value().attr("src"))
        .map(|src| src.trim().to_owned())
        .filter(|src| !src.is_empty());

    let comments = select_texts(&doc, COMMENTS)?;
    let genres = select_texts(&doc, GENRES)?;

    Ok(ParsedBook {
        title,
        author,
        cover_src,
        comments,
        genres,
    })
}

/// Splits `"Title :: Author"` on the first separator.
pub fn split_heading(heading: &str) -> Result<(String, String), ParseError> {
    let (title, author) = heading.split_once(TITLE_AUTHOR_SEPARATOR).ok_or_else(|| {
        ParseError::MissingSeparator {
            heading: heading.trim().to_owned(),
        }
    })?;

    let title = title.trim();
    let author = author.trim();
    if title.is_empty() {
        return Err(ParseError::EmptyField { field: "title" });
    }
    if author.is_empty() {
        return Err(ParseError::EmptyField { field: "author" });
    }

    Ok((title.to_owned(), author.to_owned()))
}

/// Reads the numeric id out of a detail page URL such as `/b239/`.
pub fn book_id_from_url(url: &Url) -> Result<u64, ParseError> {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .and_then(|segment| segment.strip_prefix('b'))
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| ParseError::MissingItemId { url: url.clone() })
}

pub fn book_page_url(site: &Url, id: u64) -> Result<Url, url::ParseError> {
    site.join(&format!("b{id}/"))
}

pub fn book_text_url(site: &Url, id: u64) -> Result<Url, url::ParseError> {
    let mut url = site.join("txt.php")?;
    url.query_pairs_mut().append_pair("id", &id.to_string());
    Ok(url)
}

pub(crate) fn selector(css: &'static str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector { css })
}

pub(crate) fn element_text(node: &ElementRef<'_>) -> String {
    node.text().collect::<String>()
}

fn select_texts(doc: &Html, css: &'static str) -> Result<Vec<String>, ParseError> {
    Ok(doc
        .select(&selector(css)?)
        .map(|node| element_text(&node).trim().to_owned())
        .collect())
}
