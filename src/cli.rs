use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download books by an inclusive range of site ids.
    Ids(IdsArgs),
    /// Download every book listed under a genre.
    Genre(GenreArgs),
}

#[derive(Debug, Args)]
pub struct IdsArgs {
    /// First book id to fetch.
    #[arg(long, default_value_t = 1)]
    pub start_id: u64,

    /// Last book id to fetch (inclusive).
    #[arg(long, default_value_t = 10)]
    pub stop_id: u64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct GenreArgs {
    /// Genre id (default: BOOKSCRAPE_GENRE_ID, or 55 for science fiction).
    #[arg(long)]
    pub genre_id: Option<u32>,

    /// First listing page to walk.
    #[arg(long, default_value_t = 1)]
    pub start_page: u32,

    /// Last listing page to walk (inclusive; default: until the genre ends).
    #[arg(long)]
    pub end_page: Option<u32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Default, Args)]
pub struct OutputArgs {
    /// Folder for book texts (overrides BOOKSCRAPE_TXT_FOLDER).
    #[arg(long)]
    pub txt_folder: Option<PathBuf>,

    /// Folder for cover images (overrides BOOKSCRAPE_IMAGE_FOLDER).
    #[arg(long)]
    pub img_folder: Option<PathBuf>,

    /// Output file for the JSON list of books (overrides BOOKSCRAPE_JSON_PATH).
    #[arg(long)]
    pub json_path: Option<PathBuf>,

    /// Do not download book texts.
    #[arg(long)]
    pub skip_txt: bool,

    /// Do not download cover images.
    #[arg(long)]
    pub skip_imgs: bool,

    /// Keep files that already exist instead of downloading them again.
    #[arg(long)]
    pub skip_existing: bool,

    /// Download covers even when they are the site's placeholder image.
    #[arg(long)]
    pub keep_placeholder: bool,

    /// Pause before each book (politeness).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Retries after a connection error or timeout (overrides BOOKSCRAPE_MAX_RETRIES).
    #[arg(long)]
    pub max_retries: Option<u32>,
}
