#![forbid(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod download;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod logging;
pub mod paths;

#[cfg(test)]
mod testing;
