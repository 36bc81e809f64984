use std::sync::Arc;

use crate::{
    api::{ArticleId, CommentService},
    CommentCache, CommentRepository, Composer, Identity, PageController, SessionConfig,
    VoteCoordinator,
};

/// Everything needed to display and interact with the comments of one article
///
/// Create one when the viewer opens an article and drop it when they leave: the
/// cache does not outlive it.
pub struct CommentSession {
    repo: Arc<CommentRepository>,
    pager: PageController,
    composer: Composer,
    votes: VoteCoordinator,
}

impl CommentSession {
    pub fn new(
        service: Arc<dyn CommentService>,
        identity: Arc<dyn Identity>,
        article_id: ArticleId,
        config: SessionConfig,
    ) -> anyhow::Result<CommentSession> {
        config.validate()?;
        let repo = Arc::new(CommentRepository::new(service, article_id));
        Ok(CommentSession {
            pager: PageController::new(
                repo.clone(),
                config.page_size,
                config.initial_sort,
                config.request_timeout,
            ),
            composer: Composer::new(repo.clone()),
            votes: VoteCoordinator::new(repo.clone(), identity),
            repo,
        })
    }

    pub fn repo(&self) -> &Arc<CommentRepository> {
        &self.repo
    }

    pub fn pager(&self) -> &PageController {
        &self.pager
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn votes(&self) -> &VoteCoordinator {
        &self.votes
    }

    pub fn snapshot(&self) -> CommentCache {
        self.repo.snapshot()
    }
}
