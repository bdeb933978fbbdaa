use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::Context as _;
use url::Url;

use crate::catalog::CatalogWalker;
use crate::cli::{GenreArgs, IdsArgs};
use crate::config::CrawlConfig;
use crate::download::{AssetDownloader, Download, filename_from_url};
use crate::error::{DownloadError, FetchError, ItemError, RangeError};
use crate::extract::{book_id_from_url, book_page_url, book_text_url, parse_book_page};
use crate::fetch::{HttpTransport, PageFetcher, Transport};
use crate::formats::{BookRecord, write_books_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    start: u64,
    stop: u64,
}

impl IdRange {
    pub fn new(start: u64, stop: u64) -> Result<Self, RangeError> {
        if start == 0 {
            return Err(RangeError::Zero { flag: "--start-id" });
        }
        if stop < start {
            return Err(RangeError::Ids { start, stop });
        }
        Ok(Self { start, stop })
    }

    pub fn ids(&self) -> RangeInclusive<u64> {
        self.start..=self.stop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: Option<u32>,
}

impl PageRange {
    pub fn new(start: u32, end: Option<u32>) -> Result<Self, RangeError> {
        if start == 0 {
            return Err(RangeError::Zero {
                flag: "--start-page",
            });
        }
        if let Some(end) = end
            && end < start
        {
            return Err(RangeError::Pages { start, end });
        }
        Ok(Self { start, end })
    }
}

#[derive(Debug, Default)]
pub struct CrawlReport {
    pub books: Vec<BookRecord>,
    pub visited: usize,
    pub dropped: usize,
}

impl CrawlReport {
    fn record(&mut self, outcome: Option<BookRecord>) {
        self.visited += 1;
        match outcome {
            Some(book) => self.books.push(book),
            None => self.dropped += 1,
        }
    }
}

pub async fn run(args: IdsArgs) -> anyhow::Result<()> {
    let range = IdRange::new(args.start_id, args.stop_id)?;
    let mut config = CrawlConfig::from_env().context("load config")?;
    config.apply_output_args(&args.output);

    let transport = HttpTransport::new(config.request_timeout)?;
    let crawler = Crawler::new(transport, config);
    let report = crawler.crawl_ids(range).await;
    crawler.save(&report)
}

pub async fn run_genre(args: GenreArgs) -> anyhow::Result<()> {
    let pages = PageRange::new(args.start_page, args.end_page)?;
    let mut config = CrawlConfig::from_env().context("load config")?;
    config.apply_output_args(&args.output);
    let genre_id = args.genre_id.unwrap_or(config.genre_id);

    let transport = HttpTransport::new(config.request_timeout)?;
    let crawler = Crawler::new(transport, config);
    let report = crawler.crawl_genre(genre_id, pages).await;
    crawler.save(&report)
}

/// Sequential crawl: one book is fetched, parsed and downloaded before the
/// next one starts.
pub struct Crawler<T> {
    fetcher: PageFetcher<T>,
    config: CrawlConfig,
}

impl<T: Transport> Crawler<T> {
    pub fn new(transport: T, config: CrawlConfig) -> Self {
        let fetcher = PageFetcher::new(transport, config.site_url.clone());
        Self { fetcher, config }
    }

    pub async fn crawl_ids(&self, range: IdRange) -> CrawlReport {
        let mut report = CrawlReport::default();
        for id in range.ids() {
            let url = match book_page_url(&self.config.site_url, id) {
                Ok(url) => url,
                Err(err) => {
                    tracing::warn!(id, ?err, "cannot build book url; skipping");
                    report.record(None);
                    continue;
                }
            };
            report.record(self.crawl_book(&url).await);
        }
        report
    }

    pub async fn crawl_genre(&self, genre_id: u32, pages: PageRange) -> CrawlReport {
        let mut report = CrawlReport::default();
        let mut walker = CatalogWalker::new(&self.fetcher, genre_id, pages.start, pages.end);
        let mut attempt = 0;

        while let Some(result) = walker.next_page().await {
            match result {
                Ok(page) => {
                    attempt = 0;
                    tracing::info!(
                        genre_id,
                        page = page.page_number,
                        books = page.item_urls.len(),
                        "walking listing page"
                    );
                    for url in &page.item_urls {
                        report.record(self.crawl_book(url).await);
                    }
                }
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        genre_id,
                        kind = err.kind(),
                        error = %err,
                        attempt,
                        delay_secs = self.config.retry_delay.as_secs(),
                        "listing page failed; retrying after delay"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => {
                    tracing::warn!(
                        genre_id,
                        kind = err.kind(),
                        error = %err,
                        "listing page failed; stopping genre walk"
                    );
                    walker.finish();
                }
            }
        }

        report
    }

    /// Writes the result JSON and logs a summary.
    pub fn save(&self, report: &CrawlReport) -> anyhow::Result<()> {
        write_books_json(&self.config.json_path, &report.books).context("write books json")?;
        tracing::info!(
            visited = report.visited,
            saved = report.books.len(),
            dropped = report.dropped,
            json = %self.config.json_path.display(),
            "crawl complete"
        );
        Ok(())
    }

    async fn crawl_book(&self, url: &Url) -> Option<BookRecord> {
        if !self.config.request_delay.is_zero() {
            tokio::time::sleep(self.config.request_delay).await;
        }

        let mut attempt = 0;
        loop {
            tracing::debug!(%url, attempt, "fetching book");
            match self.process_book(url).await {
                Ok(book) => {
                    tracing::info!(%url, id = book.id, title = %book.title, "book saved");
                    return Some(book);
                }
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        %url,
                        kind = err.kind(),
                        error = %error_chain(&err),
                        attempt,
                        delay_secs = self.config.retry_delay.as_secs(),
                        "network failure; retrying after delay"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => {
                    log_dropped(url, &err);
                    return None;
                }
            }
        }
    }

    async fn process_book(&self, url: &Url) -> Result<BookRecord, ItemError> {
        let page = self.fetcher.fetch(url).await.map_err(ItemError::Page)?;
        let parsed = parse_book_page(&page.text())?;
        let id = book_id_from_url(url)?;

        // Cover src is relative to the URL the page was actually served from.
        let cover = match &parsed.cover_src {
            Some(src) if !self.config.skip_imgs => {
                let url = page.url.join(src)?;
                filename_from_url(&url).map(|filename| (url, filename))
            }
            _ => None,
        };

        let downloader = AssetDownloader::new(&self.fetcher)
            .with_placeholder(self.config.placeholder_image.as_deref())
            .with_skip_existing(self.config.skip_existing);

        let text = if self.config.skip_txt {
            None
        } else {
            let text_url = book_text_url(&self.config.site_url, id)?;
            let filename = format!("{id}. {}.txt", parsed.title);
            let text = downloader
                .download(&text_url, &self.config.txt_folder, &filename)
                .await
                .map_err(at_stage(ItemError::Text))?;
            Some(text)
        };

        let img_src = match cover {
            Some((cover_url, filename)) => {
                match downloader
                    .download(&cover_url, &self.config.img_folder, &filename)
                    .await
                {
                    Ok(image) => image.path().map(display_path),
                    Err(err) => {
                        if let Some(Download::Written(path)) = &text {
                            remove_orphan(path);
                        }
                        return Err(at_stage(ItemError::Image)(err));
                    }
                }
            }
            None => None,
        };
        let book_path = text.as_ref().and_then(Download::path).map(display_path);

        Ok(BookRecord {
            id,
            title: parsed.title,
            author: parsed.author,
            img_src,
            book_path,
            comments: parsed.comments,
            genres: parsed.genres,
        })
    }
}

fn at_stage(stage: fn(FetchError) -> ItemError) -> impl Fn(DownloadError) -> ItemError {
    move |err| match err {
        DownloadError::Fetch(err) => stage(err),
        DownloadError::Io { path, source } => ItemError::Io { path, source },
    }
}

/// Removes a text file whose book is being dropped.
fn remove_orphan(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), %err, "cannot remove text of dropped book");
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn log_dropped(url: &Url, err: &ItemError) {
    match err {
        ItemError::Page(FetchError::Redirect { .. }) => {
            tracing::info!(%url, "no book at this url; skipping");
        }
        ItemError::Text(FetchError::Redirect { .. }) => {
            tracing::info!(%url, "book has no text file; skipping");
        }
        _ => {
            tracing::warn!(%url, kind = err.kind(), error = %error_chain(err), "book dropped");
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
