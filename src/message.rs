use chrono::NaiveDate;
use compact_str::CompactString;
use serde::Serialize;

use crate::{Error, Result, directory::Lecture, page, session::Session};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub subject: CompactString,
    pub body: String,
}

/// `newer_than` as the timeline API wants it: midnight of `since`, with a
/// literal `+` between date and time.
pub fn newer_than(since: NaiveDate) -> String {
    format!("{}+00:00:00", since.format("%Y-%m-%d"))
}

/// Announcements posted to `lecture` since midnight of `since`, in feed
/// order. Enters the lecture first, like the content scraper.
pub async fn fetch_messages(
    session: &mut Session,
    lecture: &Lecture,
    since: NaiveDate,
) -> Result<Vec<Message>> {
    session.enter_lecture(&lecture.id).await?;

    let url = session.config().url(&format!(
        "/webclass/course.php/{}/api/timeline/messages?head=0&filter=false&newer_than={}",
        lecture.id,
        newer_than(since)
    ));
    let body = session.get_text(url).await?;

    let bodies = match page::feed::parse_messages(&body) {
        Ok(bodies) => bodies,
        Err(e @ Error::ScrapeStructure(_)) => {
            tracing::warn!(target: "message", "[{}] {e}", lecture.id);
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    tracing::info!(target: "message", "[{}] found {} messages", lecture.id, bodies.len());
    Ok(bodies
        .into_iter()
        .map(|body| Message {
            subject: lecture.subject().into(),
            body,
        })
        .collect())
}
