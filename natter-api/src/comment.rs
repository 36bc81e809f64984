use uuid::Uuid;

use crate::{ArticleId, Author, Time, UserVote, VoteTally};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentId(pub Uuid);

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub article_id: ArticleId,

    /// None for top-level comments, the top-level comment for replies
    pub parent_id: Option<CommentId>,

    pub author: Author,
    pub content: String,
    pub created_at: Time,
    pub is_edited: bool,

    pub upvotes: u64,
    pub downvotes: u64,
    pub user_vote: UserVote,

    /// Replies in chronological order, always empty for replies themselves
    #[serde(default)]
    pub replies: Vec<Comment>,

    /// Number of replies on the server, whether or not they were loaded into `replies`
    #[serde(default)]
    pub reply_count: u64,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn score(&self) -> i128 {
        i128::from(self.upvotes) - i128::from(self.downvotes)
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally {
            upvotes: self.upvotes,
            downvotes: self.downvotes,
            user_vote: self.user_vote,
        }
    }

    pub fn set_tally(&mut self, tally: VoteTally) {
        self.upvotes = tally.upvotes;
        self.downvotes = tally.downvotes;
        self.user_vote = tally.user_vote;
    }

    pub fn find_in<'a>(comments: &'a [Comment], id: &CommentId) -> Option<&'a Comment> {
        for c in comments {
            if c.id == *id {
                return Some(c);
            }
            if let Some(res) = Comment::find_in(&c.replies, id) {
                return Some(res);
            }
        }
        None
    }

    pub fn find_in_mut<'a>(comments: &'a mut [Comment], id: &CommentId) -> Option<&'a mut Comment> {
        for c in comments.iter_mut() {
            if c.id == *id {
                return Some(c);
            }
            if let Some(res) = Comment::find_in_mut(&mut c.replies, id) {
                return Some(res);
            }
        }
        None
    }

    /// Removes the comment from whichever list holds it, returning it
    pub fn remove_from(comments: &mut Vec<Comment>, id: &CommentId) -> Option<Comment> {
        if let Some(pos) = comments.iter().position(|c| c.id == *id) {
            return Some(comments.remove(pos));
        }
        comments
            .iter_mut()
            .find_map(|c| Comment::remove_from(&mut c.replies, id))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub article_id: ArticleId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

impl NewComment {
    // See `validate_content`: this only checks what can be checked without the server
    pub fn validate(&self) -> Result<(), crate::Error> {
        crate::validate_content(&self.content).map(|_| ())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditComment {
    pub content: String,
}
