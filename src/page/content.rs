use std::sync::LazyLock;

use compact_str::{CompactString, format_compact};
use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};

use crate::{
    Error, Result,
    content::{ContentItem, ContentSections},
};

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

selector!(SEL_CONTAINER, "div.col-xs-12.col-sm-8.col-md-9.col-lg-10");
selector!(SEL_FOLDER, "section.panel.panel-default.cl-contentsList_folder");
selector!(SEL_TITLE, "h4.panel-title");
selector!(SEL_GROUP_ITEM, "section.list-group-item.cl-contentsList_listGroupItem");
selector!(SEL_CONTENT, "div.cl-contentsList_content");
selector!(SEL_NAME, "h4.cm-contentsList_contentName");
selector!(SEL_CATEGORY, "div.cl-contentsList_categoryLabel");
selector!(SEL_DETAIL, "div.cm-contentsList_contentDetailListItemData");

/// Parses a lecture's content page. Items that cannot be read are logged
/// and left out; a page without the content column is an error.
pub fn parse_sections(html: &str, subject: &str) -> Result<ContentSections> {
    let document = Html::parse_document(html);

    let container = document
        .select(&SEL_CONTAINER)
        .next()
        .ok_or_else(|| Error::ScrapeStructure("lecture content container not found".into()))?;

    let mut sections = ContentSections::new();
    for (i, folder) in container.select(&SEL_FOLDER).enumerate() {
        let name = folder
            .select(&SEL_TITLE)
            .next()
            .map(|h4| h4.text().collect::<String>())
            .filter(|title| !title.is_empty())
            .map_or_else(|| format_compact!("section{i}"), CompactString::from);

        let mut items = IndexMap::new();
        let blocks = folder
            .select(&SEL_GROUP_ITEM)
            .flat_map(|group| group.select(&SEL_CONTENT));
        for (k, block) in blocks.enumerate() {
            match parse_item(block, subject) {
                Ok(item) => {
                    items.insert(format_compact!("item{}", items.len()), item);
                }
                Err(e) => tracing::warn!(target: "content", "[{subject}] {name} block {k} skipped: {e}"),
            }
        }

        // A repeated title replaces the earlier folder's items in place.
        sections.insert(name, items);
    }

    Ok(sections)
}

fn parse_item(block: ElementRef, subject: &str) -> Result<ContentItem> {
    let Some(name) = block.select(&SEL_NAME).next() else {
        return Err(Error::PartialParse(format!("no name: {}", block.html())));
    };
    let Some(category) = block.select(&SEL_CATEGORY).next() else {
        return Err(Error::PartialParse(format!("no category: {}", block.html())));
    };

    let name = name
        .text()
        .collect::<String>()
        .replace("New", "")
        .replace('\n', "");
    let category = category.text().collect::<String>();

    let (from, to) = block
        .select(&SEL_DETAIL)
        .last()
        .map(|detail| split_period(&detail.text().collect::<String>()))
        .unwrap_or_default();

    Ok(ContentItem {
        subject: subject.into(),
        name,
        category,
        from,
        to,
    })
}

/// Splits `"FROM - TO"`. Anything after a second separator is ignored.
fn split_period(period: &str) -> (Option<String>, Option<String>) {
    if period.is_empty() {
        return (None, None);
    }
    let mut parts = period.split(" - ");
    let from = parts.next().map(|s| s.trim_start().to_owned());
    let to = parts.next().map(|s| s.trim_start().to_owned());
    (from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = include_str!("../../tests/fixtures/content.html");

    #[test]
    fn sections_keep_page_order() {
        let sections = parse_sections(CONTENT, "線形代数学").unwrap();
        let names = sections.keys().map(CompactString::as_str).collect::<Vec<_>>();
        assert_eq!(names, ["第1回 行列", "section1"]);
    }

    #[test]
    fn item_fields() {
        let sections = parse_sections(CONTENT, "線形代数学").unwrap();
        let first = &sections["第1回 行列"]["item0"];
        assert_eq!(first.subject, "線形代数学");
        assert_eq!(first.name, "レポート課題1");
        assert_eq!(first.category, "レポート");
        assert_eq!(first.from.as_deref(), Some("2024/01/01 00:00"));
        assert_eq!(first.to.as_deref(), Some("2024/01/10 00:00"));

        let slides = &sections["第1回 行列"]["item1"];
        assert_eq!(slides.category, "資料");
        assert_eq!(slides.to.as_deref(), Some("2024/03/31 23:59"));
    }

    #[test]
    fn missing_details_leave_bounds_empty() {
        let sections = parse_sections(CONTENT, "s").unwrap();
        let survey = &sections["section1"]["item0"];
        assert_eq!(survey.name, "授業アンケート");
        assert!(survey.from.is_none());
        assert!(survey.to.is_none());
    }

    #[test]
    fn malformed_item_is_skipped_not_fatal() {
        let sections = parse_sections(CONTENT, "s").unwrap();
        let second = &sections["section1"];
        let slots = second.keys().map(CompactString::as_str).collect::<Vec<_>>();
        assert_eq!(slots, ["item0", "item1"]);
        assert_eq!(second["item0"].name, "授業アンケート");
        assert_eq!(second["item1"].name, "小テスト");
    }

    #[test]
    fn period_without_separator_has_no_end() {
        let sections = parse_sections(CONTENT, "s").unwrap();
        let quiz = &sections["section1"]["item1"];
        assert_eq!(quiz.from.as_deref(), Some("2024/02/01 09:00"));
        assert!(quiz.to.is_none());
    }

    #[test]
    fn missing_container_is_structure_error() {
        let html = "<html><body><div class=\"col-xs-12\">nothing</div></body></html>";
        assert!(matches!(
            parse_sections(html, "s"),
            Err(Error::ScrapeStructure(_))
        ));
    }

    #[test]
    fn repeated_title_overwrites_in_place() {
        let html = r#"<div class="col-xs-12 col-sm-8 col-md-9 col-lg-10">
            <section class="panel panel-default cl-contentsList_folder"><h4 class="panel-title">A</h4>
              <section class="list-group-item cl-contentsList_listGroupItem"><div class="cl-contentsList_content">
                <div class="cl-contentsList_categoryLabel">c</div><h4 class="cm-contentsList_contentName">old</h4>
              </div></section>
            </section>
            <section class="panel panel-default cl-contentsList_folder"><h4 class="panel-title">B</h4></section>
            <section class="panel panel-default cl-contentsList_folder"><h4 class="panel-title">A</h4>
              <section class="list-group-item cl-contentsList_listGroupItem"><div class="cl-contentsList_content">
                <div class="cl-contentsList_categoryLabel">c</div><h4 class="cm-contentsList_contentName">new</h4>
              </div></section>
            </section>
        </div>"#;
        let sections = parse_sections(html, "s").unwrap();
        assert_eq!(sections.keys().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(sections["A"]["item0"].name, "new");
        assert!(sections["B"].is_empty());
    }

    #[test]
    fn split_period_edges() {
        assert_eq!(split_period(""), (None, None));
        assert_eq!(
            split_period("2024/01/01 00:00 -  2024/01/02 00:00"),
            (
                Some("2024/01/01 00:00".to_owned()),
                Some("2024/01/02 00:00".to_owned())
            )
        );
        assert_eq!(split_period("a - b - c").1.as_deref(), Some("b"));
    }
}
