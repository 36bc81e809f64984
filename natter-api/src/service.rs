use async_trait::async_trait;

use crate::{Comment, CommentId, CommentPage, Error, NewComment, PageRequest, VoteDirection, VoteTally};

/// The remote comment service, as seen by one viewer
///
/// Implementations carry the viewer's credentials themselves; whether a call is
/// authenticated is decided by the service, not by the caller.
#[async_trait]
pub trait CommentService: Send + Sync {
    async fn list_comments(&self, req: PageRequest) -> Result<CommentPage, Error>;
    async fn create_comment(&self, c: NewComment) -> Result<Comment, Error>;
    async fn edit_comment(&self, id: CommentId, content: String) -> Result<Comment, Error>;
    async fn delete_comment(&self, id: CommentId) -> Result<(), Error>;
    async fn vote(&self, id: CommentId, direction: VoteDirection) -> Result<VoteTally, Error>;
    async fn report(&self, id: CommentId, reason: String) -> Result<(), Error>;
}
