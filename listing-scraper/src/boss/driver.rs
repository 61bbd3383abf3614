use async_stream::stream;
use futures::Stream;
use std::time::Duration;
use tokio::time::sleep;

use crate::boss::extractor::{extract, extract_detail};
use crate::boss::fetcher::PageFetcher;
use crate::boss::types::{CrawlOptions, CrawlRequest, ListingRecord, PageBatch};
use crate::boss::BASE_URL;

/// Walk the page range of `request`, one fetch at a time, yielding one batch per page.
///
/// The sequence ends early on a transport failure, a non-2xx status, or when the
/// continuation policy rejects a page body. Backwards ranges yield nothing and
/// never touch the fetcher.
pub fn crawl<'a, F>(
    fetcher: &'a F,
    request: &'a CrawlRequest,
    options: &'a CrawlOptions,
) -> impl Stream<Item = PageBatch> + 'a
where
    F: PageFetcher + ?Sized,
{
    stream! {
        if request.is_backwards() {
            log::error!(
                "refusing to crawl backwards page range {}..={}",
                request.start,
                request.end
            );
        } else {
            for (index, page) in (request.start..=request.end).enumerate() {
                if index > 0 {
                    sleep(options.delay).await;
                }
                let url = request.page_url(page);
                let fetched = match fetcher.fetch(&url).await {
                    Ok(fetched) => fetched,
                    Err(e) => {
                        log::error!("Request failed: {}, url: {}, stopping the crawl", e, url);
                        break;
                    }
                };
                if !fetched.ok {
                    log::error!("Request not successful for page {}, stopping the crawl", page);
                    break;
                }
                if !options.continuation.should_continue(&fetched.body) {
                    log::info!("page {} has no more listings, stopping the crawl", page);
                    break;
                }
                let mut records = extract(&fetched.body);
                if options.with_details {
                    fill_details(fetcher, &mut records, options.delay).await;
                }
                log::info!("extracted {} records from page {}", records.len(), page);
                yield PageBatch {
                    index: index as u32,
                    page,
                    records,
                };
            }
        }
    }
}

async fn fill_details<F>(fetcher: &F, records: &mut [ListingRecord], delay: Duration)
where
    F: PageFetcher + ?Sized,
{
    for record in records.iter_mut() {
        sleep(delay).await;
        let url = format!("{}{}", BASE_URL, record.detail_path);
        match fetcher.fetch(&url).await {
            Ok(page) if page.ok => {
                log::debug!("scraped job detail for {}", url);
                record.detail = extract_detail(&page.body);
            }
            Ok(_) => log::error!("failed to scrape job detail for url: {}", url),
            Err(e) => log::error!("failed to scrape job detail for url: {}, error: {}", url, e),
        }
    }
}
