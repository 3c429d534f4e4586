use compact_str::CompactString;

/// Everything that can go wrong while talking to WebClass.
///
/// Whether an error ends the run depends on where it surfaces: the crawler
/// treats anything raised inside one lecture as local to that lecture, except
/// [`Error::NotAuthenticated`] and [`Error::TokenMissing`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Username or password left empty. Raised before any request is built.
    #[error("username and password are required")]
    InvalidCredentials,

    /// Rejected credentials, a login response without a token, or a body too
    /// short to be a logged-in page.
    #[error("authentication failed: {0}")]
    Auth(CompactString),

    /// A lecture login answered without a fresh token. Every later request
    /// would carry a stale one.
    #[error("no token in response: {0}")]
    TokenMissing(CompactString),

    #[error("not logged in, call login() first")]
    NotAuthenticated,

    /// An expected container is missing from the page or feed.
    #[error("unexpected page structure: {0}")]
    ScrapeStructure(CompactString),

    /// One listed item could not be read.
    #[error("malformed item: {0}")]
    PartialParse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
