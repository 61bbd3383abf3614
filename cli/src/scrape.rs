use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use listing_scraper::boss::fetcher::HttpFetcher;
use listing_scraper::boss::types::{Continuation, CrawlOptions, CrawlRequest};
use listing_scraper::progress::ProgressStore;
use listing_scraper::writer::Encoding;
use listing_scraper::{run_crawl, CrawlJob};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Listing search url, query parameters such as city and keyword included
    #[arg(long, env = "LISTING_URL")]
    url: String,
    /// First page to crawl, inclusive
    #[arg(long)]
    start: u32,
    /// Last page to crawl, inclusive
    #[arg(long)]
    end: u32,
    /// Directory the `<crawl id>.csv` file is created in
    #[arg(long, env = "LISTING_OUTPUT_DIR", default_value = "tmp")]
    output_dir: PathBuf,
    /// Explicit output file, overrides `--output-dir`
    #[arg(long)]
    output: Option<PathBuf>,
    /// Pause between two requests in milliseconds
    #[arg(long, env = "LISTING_REQUEST_DELAY_MS", default_value_t = 1000)]
    delay_ms: u64,
    /// Encoding label of the output file
    #[arg(long, env = "LISTING_OUTPUT_ENCODING", default_value = "gbk")]
    encoding: String,
    /// Keep crawling pages that no longer carry the listing marker
    #[arg(long)]
    always_continue: bool,
    /// Fetch every listing's detail page for the description column
    #[arg(long)]
    with_details: bool,
    /// User-Agent header sent with every request
    #[arg(long, env = "LISTING_USER_AGENT")]
    user_agent: Option<String>,
}

pub async fn scrape(args: ScrapeArgs) -> ExitCode {
    if args.start > args.end {
        log::error!("Invalid page range: {} > {}", args.start, args.end);
        return ExitCode::FAILURE;
    }
    let encoding = match Encoding::for_label(args.encoding.as_bytes()) {
        Some(encoding) => encoding,
        None => {
            log::error!("Unknown output encoding: {}", args.encoding);
            return ExitCode::FAILURE;
        }
    };
    let fetcher = match args.user_agent.as_deref() {
        Some(user_agent) => HttpFetcher::with_user_agent(user_agent),
        None => HttpFetcher::new(),
    };
    let fetcher = match fetcher {
        Ok(fetcher) => fetcher,
        Err(e) => {
            log::error!("Failed to build http client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let id = chrono::Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
    let output = match args.output {
        Some(output) => output,
        None => {
            if let Err(e) = tokio::fs::create_dir_all(&args.output_dir).await {
                log::error!("Failed to create {}: {}", args.output_dir.display(), e);
                return ExitCode::FAILURE;
            }
            args.output_dir.join(format!("{}.csv", id))
        }
    };
    let continuation = if args.always_continue {
        Continuation::AlwaysContinue
    } else {
        Continuation::StopWhenMarkerMissing
    };
    let job = CrawlJob {
        id: id.clone(),
        request: CrawlRequest::new(&args.url, args.start, args.end),
        options: CrawlOptions {
            delay: Duration::from_millis(args.delay_ms),
            continuation,
            with_details: args.with_details,
        },
        output,
        encoding,
    };

    let store = Arc::new(ProgressStore::new());
    let sink = store.clone();
    let mut handle = tokio::spawn(async move { run_crawl(&fetcher, &job, sink).await });
    log::info!("Created crawl task {}", id);

    let mut poll = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            result = &mut handle => {
                if let Some(state) = store.remove(&id) {
                    print_progress(&state);
                }
                return match result {
                    Ok(Ok(summary)) => {
                        log::info!(
                            "Crawled {} pages, {} listings saved to {}",
                            summary.pages,
                            summary.records,
                            summary.path.display()
                        );
                        ExitCode::SUCCESS
                    }
                    Ok(Err(e)) => {
                        log::error!("Crawl {} failed: {}", id, e);
                        ExitCode::FAILURE
                    }
                    Err(e) => {
                        log::error!("Crawl task {} panicked: {}", id, e);
                        ExitCode::FAILURE
                    }
                };
            }
            _ = poll.tick() => {
                if let Some(state) = store.snapshot(&id) {
                    print_progress(&state);
                }
            }
            _ = &mut ctrl_c => {
                log::warn!("Interrupted, stopping crawl {}", id);
                handle.abort();
                // the aborted task drops its writer, flushing the rows written so far
                let _ = handle.await;
                return ExitCode::FAILURE;
            }
        }
    }
}

fn print_progress(state: &listing_scraper::progress::ProgressState) {
    match serde_json::to_string(state) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize progress: {}", e),
    }
}
