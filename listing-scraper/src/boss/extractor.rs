use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

use crate::boss::types::ListingRecord;

/// Stands in for `,` in free text so rows stay comma separated.
pub const FULLWIDTH_COMMA: &str = "，";

const NO_FINANCING: &str = "#";
const DETAIL_HEADING: &str = "职位描述";

lazy_static! {
    static ref CARD: Selector = Selector::parse("div.job-primary").unwrap();
    static ref JOB_TITLE: Selector = Selector::parse("div.job-title").unwrap();
    static ref SALARY: Selector = Selector::parse("span.red").unwrap();
    static ref COMPANY_NAME: Selector = Selector::parse("h3 > a").unwrap();
    static ref COMPANY_TAGS: Selector = Selector::parse("p").unwrap();
    static ref JOB_SECTION: Selector = Selector::parse("div.job-sec").unwrap();
}

/// Why a listing card did not make it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingField(&'static str),
    /// address/experience/education list with the wrong length
    JobTags(usize),
    /// company metadata list that is neither 2 nor 3 entries long
    CompanyTags(usize),
}

#[derive(Debug)]
pub enum Card {
    Listing(ListingRecord),
    Skipped(SkipReason),
}

impl From<Result<ListingRecord, SkipReason>> for Card {
    fn from(result: Result<ListingRecord, SkipReason>) -> Self {
        match result {
            Ok(record) => Card::Listing(record),
            Err(reason) => Card::Skipped(reason),
        }
    }
}

/// Extract every well formed listing of a result page, in markup order.
pub fn extract(body: &str) -> Vec<ListingRecord> {
    let doc = Html::parse_document(body);
    let records: Vec<ListingRecord> = doc
        .select(&CARD)
        .map(parse_card)
        .filter_map(|card| match card {
            Card::Listing(record) => Some(record),
            Card::Skipped(reason) => {
                log::debug!("skipping listing card: {:?}", reason);
                None
            }
        })
        .collect();
    records
}

pub fn parse_card(card: ElementRef) -> Card {
    extract_card(card).into()
}

fn extract_card(card: ElementRef) -> Result<ListingRecord, SkipReason> {
    let primary = child_elements(card, "div", Some("info-primary"))
        .next()
        .ok_or(SkipReason::MissingField("info-primary"))?;

    let title = required(
        primary.select(&JOB_TITLE).flat_map(|el| own_text(el)).next(),
        "title",
    )?;
    let salary = required(
        primary.select(&SALARY).flat_map(|el| own_text(el)).next(),
        "salary",
    )?;
    let detail_path = required(
        child_elements(primary, "h3", Some("name"))
            .flat_map(|h3| child_elements(h3, "a", None))
            .find_map(|a| a.value().attr("href")),
        "detail path",
    )?;

    let job_tags = child_elements(primary, "p", None)
        .flat_map(|p| own_text(p))
        .collect::<Vec<_>>();
    let [address, experience, education] = match job_tags.as_slice() {
        [address, experience, education] => [
            required(Some(*address), "address")?,
            required(Some(*experience), "experience")?,
            required(Some(*education), "education")?,
        ],
        other => return Err(SkipReason::JobTags(other.len())),
    };

    let company = child_elements(card, "div", Some("info-company"))
        .next()
        .ok_or(SkipReason::MissingField("info-company"))?;
    let company_name = required(
        company.select(&COMPANY_NAME).flat_map(|el| own_text(el)).next(),
        "company name",
    )?;
    let company_tags = company
        .select(&COMPANY_TAGS)
        .flat_map(|p| own_text(p))
        .map(normalize)
        .collect::<Vec<_>>();
    let (company_category, financing, employee_count) = match company_tags.as_slice() {
        [category, employees] => (category.as_str(), NO_FINANCING, employees.as_str()),
        [category, financing, employees] => {
            (category.as_str(), financing.as_str(), employees.as_str())
        }
        other => return Err(SkipReason::CompanyTags(other.len())),
    };

    Ok(ListingRecord {
        title: title.replace(',', FULLWIDTH_COMMA),
        salary,
        address,
        experience,
        education,
        company_name,
        company_category: company_category.to_owned(),
        employee_count: employee_count.to_owned(),
        financing: financing.replace(',', FULLWIDTH_COMMA),
        detail_path,
        detail: None,
    })
}

/// Text of the job description section of a detail page.
pub fn extract_detail(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    let section = doc.select(&JOB_SECTION).find(|section| {
        child_elements(*section, "h3", None)
            .flat_map(|h3| own_text(h3))
            .any(|text| text.trim() == DETAIL_HEADING)
    })?;
    let detail = child_elements(section, "div", Some("text"))
        .flat_map(|div| own_text(div))
        .map(normalize)
        .collect::<String>();
    Some(detail.replace(',', FULLWIDTH_COMMA))
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, SkipReason> {
    value
        .map(normalize)
        .filter(|v| !v.is_empty())
        .ok_or(SkipReason::MissingField(field))
}

/// Trim `text` and fold every line break, with the indentation around it, into one space.
fn normalize(text: &str) -> String {
    text.split(|c| c == '\r' || c == '\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'a str,
    class: Option<&'a str>,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| {
            el.value().name() == tag
                && class.map_or(true, |class| el.value().classes().any(|c| c == class))
        })
}

/// Direct text children only, nested elements are not descended into.
fn own_text<'a>(el: ElementRef<'a>) -> impl Iterator<Item = &'a str> + 'a {
    el.children()
        .filter_map(|node| node.value().as_text())
        .map(|text| &**text)
}
