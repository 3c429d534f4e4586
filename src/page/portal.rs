use std::sync::LazyLock;

use compact_str::CompactString;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::leading_text;
use crate::{Error, Result, session::last_token};

static SEL_TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static SEL_COURSE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[href*="/webclass/course.php/"]"#).unwrap());
static SEL_COURSE_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/webclass/course.php/"]"#).unwrap());
static ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]+").unwrap());

/// Glyphs in front of course names; `Â` is `»` read with the wrong charset.
const NAME_GLYPHS: [char; 2] = ['Â', '»'];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub ids: Vec<CompactString>,
    /// Fresh token carried by the first course link.
    pub token: Option<CompactString>,
}

/// Reads the enrolled-course table of the portal page.
pub fn parse_listing(html: &str) -> Result<Listing> {
    let document = Html::parse_document(html);

    let table = document
        .select(&SEL_TABLE)
        .next()
        .ok_or_else(|| Error::ScrapeStructure("course table not found".into()))?;

    let links = table.select(&SEL_COURSE).collect::<Vec<_>>();
    let Some(first) = links.first() else {
        return Err(Error::ScrapeStructure("no course links in table".into()));
    };

    let ids = links
        .iter()
        .filter_map(|link| {
            let label = leading_text(*link);
            let id = ALNUM.find_iter(&label).last()?;
            Some(CompactString::new(id.as_str()))
        })
        .collect();

    Ok(Listing {
        ids,
        token: last_token(&first.html()),
    })
}

/// Display name of the course link whose label mentions `id`, anywhere on
/// the page.
pub fn find_lecture_name(html: &str, id: &str) -> Option<CompactString> {
    let document = Html::parse_document(html);
    document
        .select(&SEL_COURSE_ANCHOR)
        .map(clean_name)
        .find(|name| name.contains(id))
}

fn clean_name(link: ElementRef) -> CompactString {
    let label = leading_text(link);
    label
        .trim()
        .trim_start_matches(NAME_GLYPHS)
        .trim()
        .into()
}
