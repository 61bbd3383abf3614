use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::boss::fetcher::{FetchedPage, PageFetcher};
use crate::progress::{ProgressSink, ProgressState};
use crate::{Error, Result};

enum Reply {
    Page(FetchedPage),
    Failure,
}

/// Serves canned replies in order and remembers every requested URL.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    replies: Mutex<VecDeque<Reply>>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub(crate) fn page(self, body: String) -> Self {
        self.push(Reply::Page(FetchedPage { body, ok: true }))
    }

    pub(crate) fn status_error(self, body: String) -> Self {
        self.push(Reply::Page(FetchedPage { body, ok: false }))
    }

    pub(crate) fn failure(self) -> Self {
        self.push(Reply::Failure)
    }

    fn push(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        self.requested.lock().unwrap().push(url.to_owned());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Page(page)) => Ok(page),
            Some(Reply::Failure) | None => Err(Error::RequestNotOk(url.to_owned())),
        }
    }
}

pub(crate) fn listing_card(title: &str) -> String {
    format!(
        r#"<li><div class="job-primary">
            <div class="info-primary">
                <h3 class="name"><a href="/job_detail/{title}.html"><div class="job-title">{title}</div><span class="red">10-15K</span></a></h3>
                <p>北京 海淀区<em class="vline"></em>1-3年<em class="vline"></em>本科</p>
            </div>
            <div class="info-company"><div class="company-text">
                <h3 class="name"><a href="/gongsi/1.html">某某科技</a></h3>
                <p>互联网<em class="vline"></em>B轮<em class="vline"></em>100-499人</p>
            </div></div>
        </div></li>"#,
        title = title
    )
}

/// A result page carrying the continuation marker and one valid card per title.
pub(crate) fn listing_page(titles: &[&str]) -> String {
    let cards = titles.iter().map(|t| listing_card(t)).collect::<String>();
    format!(
        r#"<html><body><div class="job-list"><ul>{}</ul></div><a class="btn btn-startchat">立即沟通</a></body></html>"#,
        cards
    )
}

/// Keeps every progress update in arrival order.
#[derive(Default)]
pub(crate) struct RecordingSink {
    updates: Mutex<Vec<(String, ProgressState)>>,
}

impl RecordingSink {
    pub(crate) fn updates(&self) -> Vec<(String, ProgressState)> {
        self.updates.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn update(&self, crawl_id: &str, state: ProgressState) {
        self.updates
            .lock()
            .unwrap()
            .push((crawl_id.to_owned(), state));
    }
}
