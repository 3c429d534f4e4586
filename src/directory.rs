use compact_str::CompactString;
use serde::Serialize;

use crate::{
    Result,
    page::portal,
    session::{Session, ensure_alive},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lecture {
    pub id: CompactString,
    pub name: Option<CompactString>,
}

impl Lecture {
    /// The label records are filed under: the display name, or the id when
    /// the portal did not show one.
    pub fn subject(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

async fn fetch_portal(session: &Session) -> Result<String> {
    let url = session
        .config()
        .url(&format!("/webclass/?acs_={}", session.token()));
    let body = session.get_text(url).await?;
    ensure_alive(&body)?;
    Ok(body)
}

fn adopt_listing(session: &mut Session, body: &str) -> Vec<CompactString> {
    match portal::parse_listing(body) {
        Ok(listing) => {
            if let Some(token) = listing.token {
                session.set_token(token);
            }
            listing.ids
        }
        Err(e) => {
            tracing::error!(target: "directory", "lecture not found: {e}");
            Vec::new()
        }
    }
}

/// Ids of every enrolled lecture. A portal page without the course table
/// yields an empty list; an expired session is an error.
pub async fn list_lecture_ids(session: &mut Session) -> Result<Vec<CompactString>> {
    let body = fetch_portal(session).await?;
    let ids = adopt_listing(session, &body);
    tracing::info!(target: "directory", "found {} lectures", ids.len());
    Ok(ids)
}

pub async fn resolve_lecture_name(
    session: &mut Session,
    id: &str,
) -> Result<Option<CompactString>> {
    let body = fetch_portal(session).await?;
    if let Ok(portal::Listing {
        token: Some(token), ..
    }) = portal::parse_listing(&body)
    {
        session.set_token(token);
    }

    let name = portal::find_lecture_name(&body, id);
    if name.is_none() {
        tracing::warn!(target: "directory", "[{id}] lecture name not found");
    }
    Ok(name)
}

/// Ids and display names from a single portal fetch.
pub async fn list_lectures(session: &mut Session) -> Result<Vec<Lecture>> {
    let body = fetch_portal(session).await?;
    let lectures = adopt_listing(session, &body)
        .into_iter()
        .map(|id| {
            let name = portal::find_lecture_name(&body, &id);
            if name.is_none() {
                tracing::warn!(target: "directory", "[{id}] lecture name not found");
            }
            Lecture { id, name }
        })
        .collect::<Vec<_>>();

    tracing::info!(target: "directory", "found {} lectures", lectures.len());
    Ok(lectures)
}

impl From<CompactString> for Lecture {
    fn from(id: CompactString) -> Self {
        Self { id, name: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_falls_back_to_id() {
        let bare = Lecture::from(CompactString::const_new("CS101"));
        assert_eq!(bare.subject(), "CS101");
        let named = Lecture {
            id: "CS101".into(),
            name: Some("線形代数学 CS101".into()),
        };
        assert_eq!(named.subject(), "線形代数学 CS101");
    }
}
