pub mod boss;
pub mod crawl;
pub mod progress;
pub mod writer;

mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use crawl::{run_crawl, CrawlJob, CrawlSummary};
pub use types::{Error, Result};
