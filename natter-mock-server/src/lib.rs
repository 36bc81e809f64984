use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use natter_api::{
    ArticleId, AuthToken, Author, Comment, CommentId, CommentPage, CommentService, Error,
    NewComment, PageRequest, SortMode, Time, UserId, UserVote, Uuid, VoteDirection, VoteTally,
};
use parking_lot::Mutex;

mod seed;
pub use seed::{SeedReply, SeedThread};

/// In-memory comment service, with fault and latency injection for tests
pub struct MockServer(Mutex<ServerState>);

#[derive(Debug, Default)]
struct ServerState {
    users: HashMap<UserId, Author>,
    sessions: HashMap<AuthToken, UserId>,
    comments: Vec<StoredComment>,
    votes: HashMap<(CommentId, UserId), VoteDirection>,
    reports: Vec<(CommentId, UserId, String)>,
    faults: VecDeque<Error>,
    delays: VecDeque<Duration>,
    requests: usize,
}

#[derive(Clone, Debug)]
struct StoredComment {
    id: CommentId,
    article_id: ArticleId,
    parent_id: Option<CommentId>,
    author: UserId,
    content: String,
    created_at: Time,
    is_edited: bool,

    // votes cast by users that are not known to the server, used for seeding
    base_upvotes: u64,
    base_downvotes: u64,
}

impl ServerState {
    fn resolve(&self, tok: Option<AuthToken>) -> Result<UserId, Error> {
        tok.and_then(|t| self.sessions.get(&t).copied())
            .ok_or(Error::Unauthenticated)
    }

    fn stored(&self, id: &CommentId) -> Result<&StoredComment, Error> {
        self.comments
            .iter()
            .find(|c| c.id == *id)
            .ok_or(Error::NotFound)
    }

    fn tally(&self, c: &StoredComment, viewer: Option<UserId>) -> VoteTally {
        let mut tally = VoteTally {
            upvotes: c.base_upvotes,
            downvotes: c.base_downvotes,
            user_vote: UserVote::None,
        };
        for ((comment, user), dir) in self.votes.iter() {
            if *comment != c.id {
                continue;
            }
            match dir {
                VoteDirection::Up => tally.upvotes += 1,
                VoteDirection::Down => tally.downvotes += 1,
            }
            if Some(*user) == viewer {
                tally.user_vote = UserVote::from(*dir);
            }
        }
        tally
    }

    fn author(&self, id: UserId) -> Author {
        self.users
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Author::new(id, String::from("[deleted]")))
    }

    /// Renders a stored comment for `viewer`, with its replies if it is top-level
    fn render(&self, c: &StoredComment, viewer: Option<UserId>) -> Comment {
        let replies = match c.parent_id {
            Some(_) => Vec::new(),
            None => {
                let mut replies = self
                    .comments
                    .iter()
                    .filter(|r| r.parent_id == Some(c.id))
                    .collect::<Vec<_>>();
                replies.sort_by_key(|r| r.created_at);
                replies
                    .into_iter()
                    .map(|r| self.render(r, viewer))
                    .collect::<Vec<_>>()
            }
        };
        let mut res = Comment {
            id: c.id,
            article_id: c.article_id,
            parent_id: c.parent_id,
            author: self.author(c.author),
            content: c.content.clone(),
            created_at: c.created_at,
            is_edited: c.is_edited,
            upvotes: 0,
            downvotes: 0,
            user_vote: UserVote::None,
            reply_count: replies.len() as u64,
            replies,
        };
        res.set_tally(self.tally(c, viewer));
        res
    }

    fn insert(
        &mut self,
        author: UserId,
        article_id: ArticleId,
        parent_id: Option<CommentId>,
        content: String,
        created_at: Time,
    ) -> Result<CommentId, Error> {
        if let Some(parent) = parent_id {
            let parent = self.stored(&parent)?;
            if parent.article_id != article_id {
                return Err(Error::NotFound);
            }
            if parent.parent_id.is_some() {
                return Err(Error::Validation(String::from(
                    "replies cannot be replied to",
                )));
            }
        }
        let id = CommentId(Uuid::new_v4());
        self.comments.push(StoredComment {
            id,
            article_id,
            parent_id,
            author,
            content,
            created_at,
            is_edited: false,
            base_upvotes: 0,
            base_downvotes: 0,
        });
        Ok(id)
    }
}

fn server_side_validation(text: &str) -> Result<String, Error> {
    natter_api::validate_content(text).map_err(|e| Error::Validation(e.to_string()))
}

impl MockServer {
    pub fn new() -> Arc<MockServer> {
        Arc::new(MockServer(Mutex::new(ServerState::default())))
    }

    /// Creates a user and logs them in
    pub fn admin_create_user(&self, name: &str) -> (Author, AuthToken) {
        let mut s = self.0.lock();
        let author = Author::new(UserId(Uuid::new_v4()), String::from(name));
        let tok = AuthToken(Uuid::new_v4());
        s.users.insert(author.id, author.clone());
        s.sessions.insert(tok, author.id);
        (author, tok)
    }

    pub fn unauth(&self, tok: AuthToken) -> Result<(), Error> {
        self.0
            .lock()
            .sessions
            .remove(&tok)
            .map(|_| ())
            .ok_or(Error::Unauthenticated)
    }

    /// A handle on this server acting as the viewer holding `token`
    pub fn client(self: &Arc<Self>, token: Option<AuthToken>) -> MockClient {
        MockClient {
            server: self.clone(),
            token,
        }
    }

    /// Inserts a comment bypassing authentication, for test fixtures
    pub fn seed_comment(
        &self,
        author: UserId,
        article_id: ArticleId,
        parent_id: Option<CommentId>,
        content: &str,
        created_at: Time,
    ) -> Result<CommentId, Error> {
        self.0.lock().insert(
            author,
            article_id,
            parent_id,
            String::from(content),
            created_at,
        )
    }

    /// Adds anonymous votes to a comment, for test fixtures
    pub fn seed_votes(&self, id: CommentId, upvotes: u64, downvotes: u64) -> Result<(), Error> {
        let mut s = self.0.lock();
        let c = s
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::NotFound)?;
        c.base_upvotes += upvotes;
        c.base_downvotes += downvotes;
        Ok(())
    }

    /// Loads the JSON output of `generate-test-data` under `article_id`
    pub fn load_seed(&self, article_id: ArticleId, json: &str) -> anyhow::Result<usize> {
        let threads: Vec<SeedThread> = serde_json::from_str(json)?;
        let mut s = self.0.lock();
        let mut inserted = 0;
        for t in threads {
            let author = seed_author(&mut s, &t.author);
            let id = s.insert(author, article_id, None, t.content, t.created_at)?;
            if let Some(c) = s.comments.last_mut() {
                c.base_upvotes = t.upvotes;
                c.base_downvotes = t.downvotes;
            }
            inserted += 1;
            for r in t.replies {
                let author = seed_author(&mut s, &r.author);
                s.insert(author, article_id, Some(id), r.content, r.created_at)?;
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// The next request fails with `err` instead of being served
    pub fn fail_next(&self, err: Error) {
        self.0.lock().faults.push_back(err);
    }

    /// The next request only completes after `d`
    pub fn delay_next(&self, d: Duration) {
        self.0.lock().delays.push_back(d);
    }

    /// Number of requests received so far, including failed ones
    pub fn num_requests(&self) -> usize {
        self.0.lock().requests
    }

    pub fn num_reports(&self, id: CommentId) -> usize {
        self.0.lock().reports.iter().filter(|r| r.0 == id).count()
    }

    pub fn content_of(&self, id: CommentId) -> Option<String> {
        let s = self.0.lock();
        s.stored(&id).ok().map(|c| c.content.clone())
    }

    async fn enter(&self) -> Result<(), Error> {
        let (fault, delay) = {
            let mut s = self.0.lock();
            s.requests += 1;
            (s.faults.pop_front(), s.delays.pop_front())
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        match fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn seed_author(s: &mut ServerState, name: &str) -> UserId {
    if let Some(u) = s.users.values().find(|u| u.name == name) {
        return u.id;
    }
    let author = Author::new(UserId(Uuid::new_v4()), String::from(name));
    let id = author.id;
    s.users.insert(id, author);
    id
}

pub struct MockClient {
    server: Arc<MockServer>,
    token: Option<AuthToken>,
}

#[async_trait]
impl CommentService for MockClient {
    async fn list_comments(&self, req: PageRequest) -> Result<CommentPage, Error> {
        self.server.enter().await?;
        if req.page == 0 || req.page_size == 0 {
            return Err(Error::Validation(String::from(
                "page and page size must be positive",
            )));
        }
        let s = self.server.0.lock();
        let viewer = s.resolve(self.token).ok();
        let mut top = s
            .comments
            .iter()
            .filter(|c| c.article_id == req.article_id && c.parent_id.is_none())
            .map(|c| s.render(c, viewer))
            .collect::<Vec<_>>();
        match req.sort {
            SortMode::Newest => top.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortMode::Oldest => top.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortMode::Popular => top.sort_by(|a, b| {
                b.score()
                    .cmp(&a.score())
                    .then(b.created_at.cmp(&a.created_at))
            }),
        }
        let total = top.len() as u64;
        let comments = top
            .into_iter()
            .skip(req.offset())
            .take(req.page_size as usize)
            .collect();
        Ok(CommentPage { comments, total })
    }

    async fn create_comment(&self, c: NewComment) -> Result<Comment, Error> {
        self.server.enter().await?;
        let mut s = self.server.0.lock();
        let user = s.resolve(self.token)?;
        let content = server_side_validation(&c.content)?;
        let id = s.insert(user, c.article_id, c.parent_id, content, Utc::now())?;
        Ok(s.render(s.stored(&id)?, Some(user)))
    }

    async fn edit_comment(&self, id: CommentId, content: String) -> Result<Comment, Error> {
        self.server.enter().await?;
        let mut s = self.server.0.lock();
        let user = s.resolve(self.token)?;
        if s.stored(&id)?.author != user {
            return Err(Error::PermissionDenied);
        }
        let content = server_side_validation(&content)?;
        let c = s
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::NotFound)?;
        c.content = content;
        c.is_edited = true;
        Ok(s.render(s.stored(&id)?, Some(user)))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        self.server.enter().await?;
        let mut s = self.server.0.lock();
        let user = s.resolve(self.token)?;
        if s.stored(&id)?.author != user {
            return Err(Error::PermissionDenied);
        }
        let state = &mut *s;
        state
            .comments
            .retain(|c| c.id != id && c.parent_id != Some(id));
        let comments = &state.comments;
        state
            .votes
            .retain(|(c, _), _| comments.iter().any(|stored| stored.id == *c));
        Ok(())
    }

    async fn vote(&self, id: CommentId, direction: VoteDirection) -> Result<VoteTally, Error> {
        self.server.enter().await?;
        let mut s = self.server.0.lock();
        let user = s.resolve(self.token)?;
        s.stored(&id)?;
        // Voting twice the same way takes the vote back
        if s.votes.get(&(id, user)) == Some(&direction) {
            s.votes.remove(&(id, user));
        } else {
            s.votes.insert((id, user), direction);
        }
        Ok(s.tally(s.stored(&id)?, Some(user)))
    }

    async fn report(&self, id: CommentId, reason: String) -> Result<(), Error> {
        self.server.enter().await?;
        let mut s = self.server.0.lock();
        let user = s.resolve(self.token)?;
        s.stored(&id)?;
        let reason = server_side_validation(&reason)?;
        s.reports.push((id, user, reason));
        Ok(())
    }
}
