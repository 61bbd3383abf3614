use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::boss::driver::crawl;
use crate::boss::fetcher::PageFetcher;
use crate::boss::types::{CrawlOptions, CrawlRequest};
use crate::progress::{ProgressReporter, ProgressSink, ProgressState};
use crate::writer::{Encoding, RecordWriter};
use crate::{Error, Result};

/// Everything needed to run one crawl into one output file.
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// caller supplied key of the progress slot
    pub id: String,
    pub request: CrawlRequest,
    pub options: CrawlOptions,
    pub output: PathBuf,
    pub encoding: &'static Encoding,
}

#[derive(Debug)]
pub struct CrawlSummary {
    pub pages: u32,
    pub records: usize,
    pub path: PathBuf,
    pub progress: ProgressState,
}

/// Crawl the requested pages, stream the records into the output file and publish
/// progress after every page.
pub async fn run_crawl<F>(
    fetcher: &F,
    job: &CrawlJob,
    sink: Arc<dyn ProgressSink>,
) -> Result<CrawlSummary>
where
    F: PageFetcher + ?Sized,
{
    let request = &job.request;
    log::info!(
        "Crawl {} url: {} start: {} end: {} file: {}",
        job.id,
        request.page_url(request.start),
        request.start,
        request.end,
        job.output.display()
    );
    let mut progress = ProgressReporter::new(job.id.as_str(), request.total_pages(), sink);
    if request.is_backwards() {
        progress.finish();
        return Err(Error::InvalidPageRange {
            start: request.start,
            end: request.end,
        });
    }

    let mut writer = RecordWriter::create(&job.output, job.encoding)?;
    let batches = crawl(fetcher, request, &job.options);
    tokio::pin!(batches);
    let mut pages = 0;
    while let Some(batch) = batches.next().await {
        writer.write_batch(&batch.records)?;
        log::debug!(
            "wrote {} records from page {}",
            batch.records.len(),
            batch.page
        );
        pages += 1;
        progress.page_completed(batch.index);
    }
    let state = progress.finish();
    let records = writer.records();
    let path = writer.finish()?;
    log::info!(
        "Crawl {} finished: {} pages, {} records written to {}",
        job.id,
        pages,
        records,
        path.display()
    );
    Ok(CrawlSummary {
        pages,
        records,
        path,
        progress: state,
    })
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::test_support::{listing_page, RecordingSink, ScriptedFetcher};
    use crate::writer::UTF_8;

    fn job(url: &str, start: u32, end: u32, output: &Path) -> CrawlJob {
        CrawlJob {
            id: "job-1".to_owned(),
            request: CrawlRequest::new(url, start, end),
            options: CrawlOptions {
                delay: Duration::ZERO,
                ..CrawlOptions::default()
            },
            output: output.to_path_buf(),
            encoding: UTF_8,
        }
    }

    #[tokio::test]
    async fn test_single_page_single_card() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let fetcher = ScriptedFetcher::default().page(listing_page(&["Rust 开发"]));
        let sink = Arc::new(RecordingSink::default());

        let summary = run_crawl(
            &fetcher,
            &job("https://example.test/search", 1, 1, &output),
            sink.clone(),
        )
        .await
        .unwrap();

        assert_eq!(summary.pages, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(fetcher.requested(), vec!["https://example.test/search?page=1"]);
        let content = std::fs::read_to_string(&output).unwrap();
        let lines = content.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let fields = lines[1].split(',').collect::<Vec<_>>();
        assert_eq!(fields.len(), 10);
        assert_eq!(fields[0], "Rust 开发");
        assert_eq!(fields[9], "");
    }

    #[tokio::test]
    async fn test_backwards_range() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let fetcher = ScriptedFetcher::default().page(listing_page(&["a"]));
        let sink = Arc::new(RecordingSink::default());

        let result = run_crawl(
            &fetcher,
            &job("https://example.test/search", 3, 2, &output),
            sink.clone(),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::InvalidPageRange { start: 3, end: 2 })
        ));
        assert!(fetcher.requested().is_empty());
        assert!(!output.exists());
        let updates = sink.updates();
        assert_eq!(updates.len(), 1);
        let state = updates[0].1;
        assert!(state.done);
        assert_eq!(state.current, 0);
        assert!(state.total <= 0);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let fetcher = ScriptedFetcher::default()
            .page(listing_page(&["a"]))
            .page(listing_page(&["b", "c"]))
            .page(listing_page(&["d"]));
        let sink = Arc::new(RecordingSink::default());

        let summary = run_crawl(
            &fetcher,
            &job("https://example.test/search", 1, 3, &output),
            sink.clone(),
        )
        .await
        .unwrap();

        assert_eq!(summary.records, 4);
        let updates = sink.updates();
        let (last, pages) = updates.split_last().unwrap();
        let currents = pages.iter().map(|(_, s)| s.current).collect::<Vec<_>>();
        assert_eq!(currents, vec![0, 1, 2]);
        assert!(pages.iter().all(|(_, s)| !s.done && s.total == 3));
        assert_eq!(
            last.1,
            ProgressState {
                current: 2,
                total: 3,
                done: true
            }
        );
        assert_eq!(summary.progress, last.1);
    }

    #[tokio::test]
    async fn test_failure_keeps_written_pages() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let fetcher = ScriptedFetcher::default()
            .page(listing_page(&["a"]))
            .page(listing_page(&["b", "c"]))
            .failure();
        let sink = Arc::new(RecordingSink::default());

        let summary = run_crawl(
            &fetcher,
            &job("https://example.test/search", 1, 5, &output),
            sink.clone(),
        )
        .await
        .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(fetcher.requested().len(), 3);
        assert_eq!(
            summary.progress,
            ProgressState {
                current: 1,
                total: 5,
                done: true
            }
        );
        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_unavailable_output_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("out.csv");
        let fetcher = ScriptedFetcher::default().page(listing_page(&["a"]));
        let sink = Arc::new(RecordingSink::default());

        let result = run_crawl(
            &fetcher,
            &job("https://example.test/search", 1, 1, &output),
            sink.clone(),
        )
        .await;

        assert!(matches!(result, Err(Error::IoError(_))));
        assert!(fetcher.requested().is_empty());
        assert!(sink.updates().is_empty());
    }
}
