use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// Maximum length of a comment or report reason, in characters, after trimming
pub const MAX_CONTENT_LEN: usize = 500;

mod comment;
pub use comment::{Comment, CommentId, EditComment, NewComment};

mod error;
pub use error::Error;

mod page;
pub use page::{total_pages, ArticleId, CommentPage, PageRequest, SortMode};

mod service;
pub use service::CommentService;

mod user;
pub use user::{Author, AuthToken, UserId};

mod vote;
pub use vote::{Report, UserVote, VoteDirection, VoteRequest, VoteTally};

/// Returns the trimmed text if its length is within `1..=MAX_CONTENT_LEN` characters
///
/// This is the only text validation done client-side: everything else is left to
/// the server, which remains the authority on what gets accepted.
pub fn validate_content(text: &str) -> Result<String, Error> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_CONTENT_LEN {
        return Err(Error::InvalidContentLength(len));
    }
    Ok(String::from(trimmed))
}
