pub mod driver;
pub mod extractor;
pub mod fetcher;
pub mod types;

/// Host the relative detail paths of listing cards resolve against.
pub const BASE_URL: &str = "https://www.zhipin.com";

/// Text of the "chat now" button every non-exhausted result page carries.
pub const CONTINUE_MARKER: &str = "立即沟通";

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; en-us) \
AppleWebKit/534.50 (KHTML, like Gecko) Version/5.1 Safari/534.50";
