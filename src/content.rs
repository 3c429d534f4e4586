use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    Error, Result,
    directory::Lecture,
    page,
    session::{Session, ensure_alive},
};

/// One listed unit of a lecture page, assignment or material alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    pub subject: CompactString,
    pub name: String,
    pub category: String,
    /// `YYYY/MM/DD HH:MM`, exactly as printed.
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Section title → item slot (`item0`, `item1`, ...) → item, in page order.
pub type ContentSections = IndexMap<CompactString, IndexMap<CompactString, ContentItem>>;

pub fn items(sections: &ContentSections) -> impl Iterator<Item = &ContentItem> {
    sections.values().flat_map(IndexMap::values)
}

/// Enters `lecture` and reads its content page.
///
/// The lecture-scoped login runs first on every call; its token is the only
/// one the content page accepts. A page whose layout is not recognised gives
/// an empty map.
pub async fn fetch_content_sections(
    session: &mut Session,
    lecture: &Lecture,
) -> Result<ContentSections> {
    session.enter_lecture(&lecture.id).await?;

    let url = session.config().url(&format!(
        "/webclass/course.php/{}/?acs_={}",
        lecture.id,
        session.token()
    ));
    let body = session.get_text(url).await?;
    ensure_alive(&body)?;
    session.rotate(&body);

    match page::content::parse_sections(&body, lecture.subject()) {
        Ok(sections) => {
            tracing::info!(
                target: "content",
                "[{}] {} sections, {} items",
                lecture.id,
                sections.len(),
                items(&sections).count()
            );
            Ok(sections)
        }
        Err(e @ Error::ScrapeStructure(_)) => {
            tracing::warn!(target: "content", "[{}] {e}", lecture.id);
            Ok(ContentSections::new())
        }
        Err(e) => Err(e),
    }
}
