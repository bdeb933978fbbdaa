use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookscrape::logging::init().context("init logging")?;

    let cli = bookscrape::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        bookscrape::cli::Command::Ids(args) => {
            bookscrape::crawl::run(args).await.context("crawl ids")?;
        }
        bookscrape::cli::Command::Genre(args) => {
            bookscrape::crawl::run_genre(args)
                .await
                .context("crawl genre")?;
        }
    }

    Ok(())
}
