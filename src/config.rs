use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::cli::OutputArgs;
use crate::download::PLACEHOLDER_IMAGE;

pub const DEFAULT_SITE_URL: &str = "https://tululu.org/";
/// Science fiction.
pub const DEFAULT_GENRE_ID: u32 = 55;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub site_url: Url,
    pub txt_folder: PathBuf,
    pub img_folder: PathBuf,
    pub json_path: PathBuf,
    pub retry_delay: Duration,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub request_delay: Duration,
    pub genre_id: u32,
    pub skip_txt: bool,
    pub skip_imgs: bool,
    pub skip_existing: bool,
    /// Cover file name that is never downloaded; `None` downloads every cover.
    pub placeholder_image: Option<String>,
}

impl CrawlConfig {
    pub fn new(site_url: Url) -> Self {
        Self {
            site_url,
            txt_folder: PathBuf::from("books"),
            img_folder: PathBuf::from("images"),
            json_path: PathBuf::from("books.json"),
            retry_delay: Duration::from_secs(5),
            max_retries: 3,
            request_timeout: Duration::from_secs(30),
            request_delay: Duration::ZERO,
            genre_id: DEFAULT_GENRE_ID,
            skip_txt: false,
            skip_imgs: false,
            skip_existing: false,
            placeholder_image: Some(PLACEHOLDER_IMAGE.to_owned()),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let raw_site = get("BOOKSCRAPE_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_owned());
        let site_url = parse_site_url(&raw_site)
            .with_context(|| format!("invalid BOOKSCRAPE_SITE_URL={raw_site:?}"))?;
        let mut config = Self::new(site_url);

        if let Some(raw) = get("BOOKSCRAPE_TXT_FOLDER") {
            config.txt_folder = PathBuf::from(raw);
        }
        if let Some(raw) = get("BOOKSCRAPE_IMAGE_FOLDER") {
            config.img_folder = PathBuf::from(raw);
        }
        if let Some(raw) = get("BOOKSCRAPE_JSON_PATH") {
            config.json_path = PathBuf::from(raw);
        }
        if let Some(raw) = get("BOOKSCRAPE_DELAY_SECS") {
            config.retry_delay = Duration::from_secs(parse_number(&raw, "BOOKSCRAPE_DELAY_SECS")?);
        }
        if let Some(raw) = get("BOOKSCRAPE_MAX_RETRIES") {
            config.max_retries = parse_number(&raw, "BOOKSCRAPE_MAX_RETRIES")?;
        }
        if let Some(raw) = get("BOOKSCRAPE_TIMEOUT_SECS") {
            let secs: u64 = parse_number(&raw, "BOOKSCRAPE_TIMEOUT_SECS")?;
            if secs == 0 {
                anyhow::bail!("BOOKSCRAPE_TIMEOUT_SECS must be positive");
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("BOOKSCRAPE_GENRE_ID") {
            config.genre_id = parse_number(&raw, "BOOKSCRAPE_GENRE_ID")?;
        }
        if let Some(raw) = get("BOOKSCRAPE_PLACEHOLDER_IMAGE") {
            config.placeholder_image = Some(raw);
        }

        Ok(config)
    }

    /// Applies command line overrides on top of the environment.
    pub fn apply_output_args(&mut self, args: &OutputArgs) {
        if let Some(folder) = &args.txt_folder {
            self.txt_folder = folder.clone();
        }
        if let Some(folder) = &args.img_folder {
            self.img_folder = folder.clone();
        }
        if let Some(path) = &args.json_path {
            self.json_path = path.clone();
        }
        if let Some(delay_ms) = args.delay_ms {
            self.request_delay = Duration::from_millis(delay_ms);
        }
        if let Some(max_retries) = args.max_retries {
            self.max_retries = max_retries;
        }
        self.skip_txt |= args.skip_txt;
        self.skip_imgs |= args.skip_imgs;
        self.skip_existing |= args.skip_existing;
        if args.keep_placeholder {
            self.placeholder_image = None;
        }
    }
}

fn parse_site_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw).context("parse url")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("site url must be http/https: {url}");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn parse_number<N>(raw: &str, key: &str) -> anyhow::Result<N>
where
    N: std::str::FromStr,
    N::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<N>()
        .with_context(|| format!("invalid {key}={raw:?}: expected a non-negative integer"))
}
