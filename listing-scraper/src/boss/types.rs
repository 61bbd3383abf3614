use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::boss::CONTINUE_MARKER;

/// One job posting taken from a listing card.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub title: String,
    pub salary: String,
    pub address: String,
    pub experience: String,
    pub education: String,
    pub company_name: String,
    pub company_category: String,
    pub employee_count: String,
    /// `#` when the card only carries category and employee bracket
    pub financing: String,
    pub detail_path: String,
    pub detail: Option<String>,
}

impl ListingRecord {
    /// Field values in output column order.
    pub fn columns(&self) -> [&str; 10] {
        [
            &self.title,
            &self.salary,
            &self.address,
            &self.experience,
            &self.education,
            &self.company_name,
            &self.company_category,
            &self.financing,
            &self.employee_count,
            self.detail.as_deref().unwrap_or(""),
        ]
    }
}

/// Decides whether the crawl goes on after a page body was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Continuation {
    /// Stop as soon as a page no longer carries the marker.
    #[default]
    StopWhenMarkerMissing,
    /// Ignore the marker and walk the whole page range.
    AlwaysContinue,
}

impl Continuation {
    pub fn should_continue(&self, body: &str) -> bool {
        match self {
            Continuation::StopWhenMarkerMissing => body.contains(CONTINUE_MARKER),
            Continuation::AlwaysContinue => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Pause between two consecutive requests
    pub delay: Duration,
    pub continuation: Continuation,
    /// Fetch every record's detail page and fill `ListingRecord::detail`
    pub with_details: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            continuation: Continuation::default(),
            with_details: false,
        }
    }
}

/// Listing URL plus an inclusive page range.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    url_base: String,
    pub start: u32,
    pub end: u32,
}

impl CrawlRequest {
    pub fn new(url: &str, start: u32, end: u32) -> Self {
        let separator = if url.find('?').map_or(false, |i| i > 0) {
            '&'
        } else {
            '?'
        };
        Self {
            url_base: format!("{}{}page=", url, separator),
            start,
            end,
        }
    }

    pub fn page_url(&self, page: u32) -> String {
        format!("{}{}", self.url_base, page)
    }

    pub fn is_backwards(&self) -> bool {
        self.start > self.end
    }

    /// `end - start + 1`, zero or negative for backwards ranges.
    pub fn total_pages(&self) -> i64 {
        i64::from(self.end) - i64::from(self.start) + 1
    }
}

/// Records extracted from one result page.
#[derive(Debug)]
pub struct PageBatch {
    /// zero based position of the page within the crawl
    pub index: u32,
    pub page: u32,
    pub records: Vec<ListingRecord>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_page_url_appends_query() {
        let request = CrawlRequest::new("https://example.test/search", 1, 2);
        assert_eq!(request.page_url(1), "https://example.test/search?page=1");

        let request = CrawlRequest::new("https://example.test/job_detail/?city=101010100", 1, 2);
        assert_eq!(
            request.page_url(7),
            "https://example.test/job_detail/?city=101010100&page=7"
        );
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(CrawlRequest::new("u", 1, 1).total_pages(), 1);
        assert_eq!(CrawlRequest::new("u", 2, 10).total_pages(), 9);
        assert_eq!(CrawlRequest::new("u", 3, 2).total_pages(), 0);
        assert!(CrawlRequest::new("u", 5, 2).total_pages() < 0);
        assert!(CrawlRequest::new("u", 3, 2).is_backwards());
    }

    #[test]
    fn test_columns_order() {
        let record = ListingRecord {
            title: "t".into(),
            salary: "s".into(),
            address: "a".into(),
            experience: "x".into(),
            education: "e".into(),
            company_name: "c".into(),
            company_category: "cat".into(),
            employee_count: "n".into(),
            financing: "f".into(),
            detail_path: "/p".into(),
            detail: None,
        };
        assert_eq!(
            record.columns(),
            ["t", "s", "a", "x", "e", "c", "cat", "f", "n", ""]
        );
    }

    #[test]
    fn test_marker_continuation() {
        let policy = Continuation::StopWhenMarkerMissing;
        assert!(policy.should_continue("<a>立即沟通</a>"));
        assert!(!policy.should_continue("<p>没有找到相关职位</p>"));
        assert!(Continuation::AlwaysContinue.should_continue(""));
    }
}
