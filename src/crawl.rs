//! One full pass over every enrolled lecture.
//!
//! Requests go out strictly one after another: each response may carry the
//! token the next request needs.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    Error, Result,
    assignment::{Assignment, collect_assignments, urgency_of},
    content::{ContentItem, fetch_content_sections, items},
    directory::{Lecture, list_lectures},
    message::{Message, fetch_messages},
    session::{Credentials, Session},
};

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub assignments: Vec<Assignment>,
    pub messages: Vec<Message>,
}

/// A lecture-local failure is logged and the lecture skipped. A lost login
/// or a lecture login without a token is passed up: the token is stale from
/// then on.
fn skip_lecture(lecture: &Lecture, what: &str, e: Error) -> Result<()> {
    if matches!(e, Error::NotAuthenticated | Error::TokenMissing(_)) {
        return Err(e);
    }
    tracing::warn!(target: "crawl", "[{}] {what} skipped: {e}", lecture.id);
    Ok(())
}

/// Crawls every lecture with an already logged-in `session`. Assignments
/// are those open at `now`, with urgency measured from `now` as well.
pub async fn crawl(session: &mut Session, now: NaiveDateTime) -> Result<Report> {
    session.require_login()?;

    let lectures = list_lectures(session).await?;
    if lectures.is_empty() {
        tracing::error!(target: "crawl", "lecture not found");
    }

    let since = session.config().since;
    let mut collected = Vec::<ContentItem>::new();
    let mut messages = Vec::new();

    for lecture in &lectures {
        tracing::info!(target: "crawl", "\x1b[36m[{}] {}\x1b[0m", lecture.id, lecture.subject());

        match fetch_content_sections(session, lecture).await {
            Ok(sections) => collected.extend(items(&sections).cloned()),
            Err(e) => skip_lecture(lecture, "content", e)?,
        }

        match fetch_messages(session, lecture, since).await {
            Ok(mut found) => messages.append(&mut found),
            Err(e) => skip_lecture(lecture, "messages", e)?,
        }
    }

    let assignments = collect_assignments(&collected, now)
        .into_iter()
        .map(|item| Assignment {
            urgency: urgency_of(&item, now),
            item,
        })
        .collect::<Vec<_>>();

    tracing::info!(
        target: "crawl",
        "{} lectures, {} assignments, {} messages",
        lectures.len(),
        assignments.len(),
        messages.len()
    );
    Ok(Report {
        assignments,
        messages,
    })
}

/// Logs in, crawls, and logs out again whatever the crawl returned. A
/// failed logout is only logged.
pub async fn run(
    session: &mut Session,
    credentials: &Credentials,
    now: NaiveDateTime,
) -> Result<Report> {
    session.login(credentials).await?;
    let report = crawl(session, now).await;
    if let Err(e) = session.logout().await {
        tracing::warn!(target: "crawl", "logout failed: {e}");
    }
    report
}
