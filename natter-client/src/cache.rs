use std::{collections::HashSet, sync::Arc};

use crate::api::{ArticleId, Comment, CommentId, CommentPage, VoteTally};

/// The comments currently displayed for one article
///
/// Cloning is cheap, so that the cache can be handed out as a read-only snapshot.
/// Every mutation here is the application of an already-confirmed server answer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentCache {
    pub article_id: ArticleId,

    /// Top-level comments of the current page, replies nested inside
    pub comments: Arc<Vec<Comment>>,

    /// Number of top-level comments for the whole article
    pub total: u64,

    /// Top-level comments whose replies are currently shown
    pub expanded: Arc<HashSet<CommentId>>,
}

impl CommentCache {
    pub fn new(article_id: ArticleId) -> CommentCache {
        CommentCache {
            article_id,
            comments: Arc::new(Vec::new()),
            total: 0,
            expanded: Arc::new(HashSet::new()),
        }
    }

    pub fn find(&self, id: &CommentId) -> Option<&Comment> {
        Comment::find_in(&self.comments, id)
    }

    pub fn replies_visible(&self, id: &CommentId) -> bool {
        self.expanded.contains(id)
    }

    pub fn replace_page(&mut self, page: CommentPage) {
        self.comments = Arc::new(page.comments);
        self.total = page.total;
        let comments = &self.comments;
        Arc::make_mut(&mut self.expanded).retain(|id| comments.iter().any(|c| c.id == *id));
    }

    /// Returns false if the comment is a reply whose parent is not displayed
    pub fn insert_created(&mut self, c: Comment) -> bool {
        match c.parent_id {
            None => {
                Arc::make_mut(&mut self.comments).insert(0, c);
                self.total += 1;
                true
            }
            Some(parent_id) => {
                let comments = Arc::make_mut(&mut self.comments);
                match comments.iter_mut().find(|p| p.id == parent_id) {
                    Some(parent) => {
                        parent.replies.push(c);
                        parent.reply_count += 1;
                        true
                    }
                    None => false,
                }
            }
        }
    }

    pub fn apply_edit(&mut self, id: &CommentId, content: String) -> Option<&Comment> {
        let c = Comment::find_in_mut(Arc::make_mut(&mut self.comments).as_mut_slice(), id)?;
        c.content = content;
        c.is_edited = true;
        Some(&*c)
    }

    pub fn apply_tally(&mut self, id: &CommentId, tally: VoteTally) -> bool {
        match Comment::find_in_mut(Arc::make_mut(&mut self.comments).as_mut_slice(), id) {
            Some(c) => {
                c.set_tally(tally);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &CommentId) -> Option<Comment> {
        let removed = Comment::remove_from(Arc::make_mut(&mut self.comments), id)?;
        match removed.parent_id {
            None => {
                self.total = self.total.saturating_sub(1);
                Arc::make_mut(&mut self.expanded).remove(id);
            }
            Some(parent_id) => {
                if let Some(parent) = Arc::make_mut(&mut self.comments)
                    .iter_mut()
                    .find(|p| p.id == parent_id)
                {
                    parent.reply_count = parent.reply_count.saturating_sub(1);
                }
            }
        }
        Some(removed)
    }

    /// Only top-level comments have replies to show
    pub fn set_replies_visible(&mut self, id: &CommentId, visible: bool) -> bool {
        if !self.comments.iter().any(|c| c.id == *id) {
            return false;
        }
        let expanded = Arc::make_mut(&mut self.expanded);
        match visible {
            true => expanded.insert(*id),
            false => expanded.remove(id),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::api::{Author, UserId, UserVote, Uuid};

    fn comment(parent_id: Option<CommentId>) -> Comment {
        Comment {
            id: CommentId(Uuid::new_v4()),
            article_id: ArticleId::stub(),
            parent_id,
            author: Author::new(UserId::stub(), String::from("ann")),
            content: String::from("hello"),
            created_at: Utc::now(),
            is_edited: false,
            upvotes: 0,
            downvotes: 0,
            user_vote: UserVote::None,
            replies: Vec::new(),
            reply_count: 0,
        }
    }

    fn cache_with(comments: Vec<Comment>, total: u64) -> CommentCache {
        let mut cache = CommentCache::new(ArticleId::stub());
        cache.replace_page(CommentPage { comments, total });
        cache
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutations() {
        let mut cache = cache_with(vec![comment(None)], 1);
        let snapshot = cache.clone();
        cache.insert_created(comment(None));
        assert_eq!(snapshot.comments.len(), 1);
        assert_eq!(snapshot.total, 1);
        assert_eq!(cache.comments.len(), 2);
        assert_eq!(cache.total, 2);
    }

    #[test]
    fn top_level_comments_are_prepended() {
        let old = comment(None);
        let mut cache = cache_with(vec![old.clone()], 5);
        let new = comment(None);
        assert!(cache.insert_created(new.clone()));
        assert_eq!(cache.comments[0].id, new.id);
        assert_eq!(cache.comments[1].id, old.id);
        assert_eq!(cache.total, 6);
    }

    #[test]
    fn replies_are_appended_and_counted() {
        let mut parent = comment(None);
        parent.replies.push(comment(Some(parent.id)));
        parent.reply_count = 2;
        let mut cache = cache_with(vec![parent.clone()], 1);

        let reply = comment(Some(parent.id));
        assert!(cache.insert_created(reply.clone()));
        let parent = cache.find(&parent.id).unwrap();
        assert_eq!(parent.reply_count, 3);
        assert_eq!(parent.replies.last().map(|r| r.id), Some(reply.id));
        assert_eq!(cache.total, 1);

        assert!(!cache.insert_created(comment(Some(CommentId(Uuid::new_v4())))));
        assert_eq!(cache.total, 1);
    }

    #[test]
    fn edits_only_touch_content_and_flag() {
        let c = comment(None);
        let mut cache = cache_with(vec![c.clone()], 1);
        let edited = cache
            .apply_edit(&c.id, String::from("Updated text"))
            .unwrap()
            .clone();
        assert_eq!(
            edited,
            Comment {
                content: String::from("Updated text"),
                is_edited: true,
                ..c
            }
        );
    }

    #[test]
    fn tallies_reach_replies_without_touching_snapshots() {
        let mut parent = comment(None);
        let reply = comment(Some(parent.id));
        parent.replies.push(reply.clone());
        let mut cache = cache_with(vec![parent], 1);
        let before = cache.clone();

        let tally = VoteTally {
            upvotes: 4,
            downvotes: 1,
            user_vote: UserVote::Up,
        };
        assert!(cache.apply_tally(&reply.id, tally));
        assert_eq!(cache.find(&reply.id).unwrap().tally(), tally);
        assert_eq!(before.find(&reply.id).unwrap().tally(), reply.tally());
        assert!(!cache.apply_tally(&CommentId(Uuid::new_v4()), tally));
    }

    #[test]
    fn removing_updates_counters_and_flags() {
        let mut parent = comment(None);
        let reply = comment(Some(parent.id));
        parent.replies.push(reply.clone());
        parent.reply_count = 1;
        let other = comment(None);
        let mut cache = cache_with(vec![parent.clone(), other.clone()], 12);
        assert!(cache.set_replies_visible(&parent.id, true));

        assert_eq!(cache.remove(&reply.id).map(|r| r.id), Some(reply.id));
        assert_eq!(cache.find(&parent.id).unwrap().reply_count, 0);
        assert_eq!(cache.total, 12);

        cache.remove(&parent.id).unwrap();
        assert_eq!(cache.total, 11);
        assert!(!cache.replies_visible(&parent.id));
        assert!(cache.remove(&parent.id).is_none());
        assert_eq!(cache.comments.len(), 1);
    }

    #[test]
    fn reply_flags_only_on_displayed_top_level_comments() {
        let mut parent = comment(None);
        let reply = comment(Some(parent.id));
        parent.replies.push(reply.clone());
        let mut cache = cache_with(vec![parent.clone()], 1);
        assert!(!cache.set_replies_visible(&reply.id, true));
        assert!(cache.set_replies_visible(&parent.id, true));
        assert!(cache.replies_visible(&parent.id));

        cache.replace_page(CommentPage {
            comments: vec![comment(None)],
            total: 1,
        });
        assert!(!cache.replies_visible(&parent.id));
    }
}
