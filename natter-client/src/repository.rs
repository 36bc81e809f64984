use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    api::{
        self, ArticleId, Comment, CommentId, CommentPage, CommentService, Error, NewComment,
        PageRequest, SortMode, VoteDirection, VoteTally,
    },
    CommentCache,
};

/// Sole owner of the comment cache of one article
///
/// Nothing is ever applied to the cache before the server confirmed it, and what gets
/// applied is what the server answered. The cache lock is never held across a request,
/// so that independent mutations can be in flight at the same time.
pub struct CommentRepository {
    service: Arc<dyn CommentService>,
    cache: RwLock<CommentCache>,
}

impl CommentRepository {
    pub fn new(service: Arc<dyn CommentService>, article_id: ArticleId) -> CommentRepository {
        CommentRepository {
            service,
            cache: RwLock::new(CommentCache::new(article_id)),
        }
    }

    pub fn article_id(&self) -> ArticleId {
        self.cache.read().article_id
    }

    pub fn snapshot(&self) -> CommentCache {
        self.cache.read().clone()
    }

    pub fn total(&self) -> u64 {
        self.cache.read().total
    }

    pub fn get_by_id(&self, id: &CommentId) -> Result<Comment, Error> {
        self.cache.read().find(id).cloned().ok_or(Error::NotFound)
    }

    /// Fetches a page without touching the cache
    pub async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        sort: SortMode,
    ) -> Result<CommentPage, Error> {
        let req = PageRequest {
            article_id: self.article_id(),
            page,
            page_size,
            sort,
        };
        tracing::debug!(?req, "fetching comment page");
        self.service.list_comments(req).await
    }

    pub fn apply_page(&self, page: CommentPage) {
        tracing::debug!(
            num_comments = page.comments.len(),
            total = page.total,
            "replacing displayed comments"
        );
        self.cache.write().replace_page(page);
    }

    pub async fn load_page(
        &self,
        page: u32,
        page_size: u32,
        sort: SortMode,
    ) -> Result<CommentPage, Error> {
        let res = self.fetch_page(page, page_size, sort).await?;
        self.apply_page(res.clone());
        Ok(res)
    }

    pub async fn create(
        &self,
        content: &str,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, Error> {
        let content = api::validate_content(content)?;
        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.cache.read().find(&parent_id) {
                if !parent.is_top_level() {
                    return Err(Error::NestedReply(parent_id));
                }
            }
        }
        let created = self
            .service
            .create_comment(NewComment {
                article_id: self.article_id(),
                content,
                parent_id,
            })
            .await?;
        tracing::info!(comment = ?created.id, parent = ?created.parent_id, "comment created");
        if !self.cache.write().insert_created(created.clone()) {
            tracing::warn!(
                comment = ?created.id,
                parent = ?created.parent_id,
                "created a reply to a comment that is not displayed"
            );
        }
        Ok(created)
    }

    /// Returns the comment as now displayed, or as the server returned it if not displayed
    pub async fn edit(&self, id: CommentId, content: &str) -> Result<Comment, Error> {
        let content = api::validate_content(content)?;
        let edited = self.service.edit_comment(id, content).await?;
        tracing::info!(comment = ?id, "comment edited");
        let mut cache = self.cache.write();
        Ok(match cache.apply_edit(&id, edited.content.clone()) {
            Some(c) => c.clone(),
            None => edited,
        })
    }

    pub async fn remove(&self, id: CommentId) -> Result<(), Error> {
        self.service.delete_comment(id).await?;
        tracing::info!(comment = ?id, "comment deleted");
        self.cache.write().remove(&id);
        Ok(())
    }

    pub async fn report(&self, id: CommentId, reason: &str) -> Result<(), Error> {
        let reason = api::validate_content(reason)?;
        self.service.report(id, reason).await?;
        tracing::info!(comment = ?id, "comment reported");
        Ok(())
    }

    pub(crate) async fn submit_vote(
        &self,
        id: CommentId,
        direction: VoteDirection,
    ) -> Result<VoteTally, Error> {
        let tally = self.service.vote(id, direction).await?;
        tracing::debug!(comment = ?id, ?tally, "vote recorded");
        self.cache.write().apply_tally(&id, tally);
        Ok(tally)
    }

    /// Returns false if the comment is not a displayed top-level comment
    pub fn set_replies_visible(&self, id: &CommentId, visible: bool) -> bool {
        self.cache.write().set_replies_visible(id, visible)
    }

    /// Returns the new visibility, or None if the comment is not a displayed top-level comment
    pub fn toggle_replies(&self, id: &CommentId) -> Option<bool> {
        let mut cache = self.cache.write();
        let visible = !cache.replies_visible(id);
        cache.set_replies_visible(id, visible).then_some(visible)
    }
}
