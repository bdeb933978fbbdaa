use scraper::Html;
use url::Url;

use crate::error::{CatalogError, ParseError};
use crate::extract::{book_id_from_url, element_text, selector};
use crate::fetch::{PageFetcher, Transport};

/// Number of cards on a full genre listing page.
pub const BOOKS_PER_PAGE: usize = 25;

const CARDS: &str = "table.d_book";
const CARD_LINKS: &str = "a[href]";
const PAGE_LINKS: &str = "a.npage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPage {
    pub genre_id: u32,
    pub page_number: u32,
    pub item_urls: Vec<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub item_urls: Vec<Url>,
    /// Highest page number linked from the pager, if there is a pager.
    pub last_page: Option<u32>,
}

pub fn genre_page_url(site: &Url, genre_id: u32, page: u32) -> Result<Url, url::ParseError> {
    site.join(&format!("l{genre_id}/{page}/"))
}

pub fn parse_listing(html: &str, site: &Url) -> Result<Listing, ParseError> {
    let doc = Html::parse_document(html);
    let link_selector = selector(CARD_LINKS)?;

    let mut item_urls = Vec::new();
    for card in doc.select(&selector(CARDS)?) {
        let book_url = card
            .select(&link_selector)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| site.join(href.trim()).ok())
            .find(|url| book_id_from_url(url).is_ok());
        match book_url {
            Some(url) => item_urls.push(url),
            None => tracing::debug!(card = %element_text(&card).trim(), "listing card without book link"),
        }
    }

    let last_page = doc
        .select(&selector(PAGE_LINKS)?)
        .filter_map(|link| element_text(&link).trim().parse::<u32>().ok())
        .max();

    Ok(Listing {
        item_urls,
        last_page,
    })
}

/// Walks the listing pages of one genre in order.
///
/// The walk ends on whichever comes first: the caller's end page, the last
/// page declared by the pager, or a page with fewer than
/// [`BOOKS_PER_PAGE`] cards. A failed page is not consumed, so calling
/// [`CatalogWalker::next_page`] again retries it; call
/// [`CatalogWalker::finish`] to give up instead.
pub struct CatalogWalker<'a, T> {
    fetcher: &'a PageFetcher<T>,
    genre_id: u32,
    next_page: u32,
    end_page: Option<u32>,
    declared_last: Option<u32>,
    finished: bool,
}

impl<'a, T: Transport> CatalogWalker<'a, T> {
    pub fn new(
        fetcher: &'a PageFetcher<T>,
        genre_id: u32,
        start_page: u32,
        end_page: Option<u32>,
    ) -> Self {
        Self {
            fetcher,
            genre_id,
            next_page: start_page,
            end_page,
            declared_last: None,
            finished: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub async fn next_page(&mut self) -> Option<Result<CatalogPage, CatalogError>> {
        if self.finished {
            return None;
        }
        let page_number = self.next_page;
        let past_end = self.end_page.is_some_and(|end| page_number > end);
        let past_last = self.declared_last.is_some_and(|last| page_number > last);
        if past_end || past_last {
            self.finished = true;
            return None;
        }

        let url = match genre_page_url(self.fetcher.home(), self.genre_id, page_number) {
            Ok(url) => url,
            Err(err) => return Some(Err(err.into())),
        };
        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(err) => return Some(Err(err.into())),
        };
        let listing = match parse_listing(&page.text(), self.fetcher.home()) {
            Ok(listing) => listing,
            Err(err) => return Some(Err(err.into())),
        };

        if let Some(last) = listing.last_page {
            self.declared_last = Some(self.declared_last.map_or(last, |seen| seen.max(last)));
        }
        if listing.item_urls.len() < BOOKS_PER_PAGE {
            self.finished = true;
        }
        self.next_page = page_number.saturating_add(1);

        tracing::debug!(
            genre_id = self.genre_id,
            page = page_number,
            items = listing.item_urls.len(),
            declared_last = ?self.declared_last,
            "listing page parsed"
        );

        Some(Ok(CatalogPage {
            genre_id: self.genre_id,
            page_number,
            item_urls: listing.item_urls,
        }))
    }
}
