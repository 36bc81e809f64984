use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{
    api::{self, CommentPage, Error, SortMode},
    CommentRepository,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Stamp of a page fetch; only the latest issued one may update the cache
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RequestToken(u64);

/// A page fetch that was decided by a transition into `Loading`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ticket {
    pub token: RequestToken,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortMode,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadOutcome {
    /// The fetched page is now displayed
    Applied,

    /// A newer fetch was issued before this one resolved, its result was dropped
    Discarded,

    /// Nothing needed fetching
    Unchanged,
}

/// What to do with the result of a fetch
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resolution {
    /// A newer fetch was issued since, drop the result
    Stale,

    /// Display the fetched page
    Apply,

    /// The page is gone, keep displaying what was there
    Failed,

    /// Comments vanished and the fetched page is now past the end, fetch this one instead
    Refetch(Ticket),
}

/// Sort and pagination state, updated only through the transitions below
///
/// `current_page` is the page currently displayed, and only moves when a fetched page
/// gets applied. The total number of comments is not stored here: it belongs to the
/// repository, and is passed in whenever a transition depends on it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageState {
    pub sort: SortMode,
    pub current_page: u32,
    pub page_size: u32,
    pub status: LoadState,
    pub last_error: Option<Error>,

    /// Page targeted by the latest fetch, retried by `reload`
    requested: u32,
    latest: u64,
}

impl PageState {
    pub fn new(page_size: u32, sort: SortMode) -> PageState {
        PageState {
            sort,
            current_page: 1,
            page_size,
            status: LoadState::Idle,
            last_error: None,
            requested: 1,
            latest: 0,
        }
    }

    pub fn total_pages(&self, total: u64) -> u32 {
        api::total_pages(total, self.page_size)
    }

    fn last_page(&self, total: u64) -> u32 {
        self.total_pages(total).max(1)
    }

    fn issue(&mut self, page: u32) -> Ticket {
        self.latest += 1;
        self.requested = page;
        self.status = LoadState::Loading;
        Ticket {
            token: RequestToken(self.latest),
            page,
            page_size: self.page_size,
            sort: self.sort,
        }
    }

    /// Fetches again whatever was last asked for, eg. to retry after an error
    pub fn reload(&mut self) -> Ticket {
        self.issue(self.requested)
    }

    pub fn change_sort(&mut self, sort: SortMode) -> Option<Ticket> {
        if sort == self.sort {
            return None;
        }
        self.sort = sort;
        Some(self.issue(1))
    }

    pub fn go_to_page(&mut self, page: u32, total: u64) -> Option<Ticket> {
        if page < 1 || page > self.last_page(total) {
            return None;
        }
        // Going back to the displayed page still has to supersede a pending fetch
        if page == self.current_page && self.requested == self.current_page {
            return None;
        }
        Some(self.issue(page))
    }

    pub fn next_page(&mut self, total: u64) -> Option<Ticket> {
        self.go_to_page(self.current_page.saturating_add(1), total)
    }

    pub fn prev_page(&mut self, total: u64) -> Option<Ticket> {
        self.go_to_page(self.current_page.saturating_sub(1), total)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    /// Records the result of the fetch for `ticket`
    pub fn resolve(&mut self, ticket: &Ticket, res: Result<&CommentPage, &Error>) -> Resolution {
        if !self.is_latest(ticket.token) {
            return Resolution::Stale;
        }
        match res {
            Ok(page) => {
                let last = self.last_page(page.total);
                if ticket.page > last {
                    return Resolution::Refetch(self.issue(last));
                }
                self.status = LoadState::Loaded;
                self.last_error = None;
                self.current_page = ticket.page;
                Resolution::Apply
            }
            Err(e) => {
                self.status = LoadState::Errored;
                self.last_error = Some(e.clone());
                Resolution::Failed
            }
        }
    }
}

/// Drives page fetches through the repository, applying only the latest one
pub struct PageController {
    repo: Arc<CommentRepository>,
    state: Mutex<PageState>,
    timeout: Duration,
}

impl PageController {
    pub fn new(
        repo: Arc<CommentRepository>,
        page_size: u32,
        sort: SortMode,
        timeout: Duration,
    ) -> PageController {
        PageController {
            repo,
            state: Mutex::new(PageState::new(page_size, sort)),
            timeout,
        }
    }

    pub fn state(&self) -> PageState {
        self.state.lock().clone()
    }

    pub fn total_pages(&self) -> u32 {
        self.state.lock().total_pages(self.repo.total())
    }

    pub async fn reload(&self) -> Result<LoadOutcome, Error> {
        let ticket = self.state.lock().reload();
        self.run(Some(ticket)).await
    }

    pub async fn set_sort(&self, sort: SortMode) -> Result<LoadOutcome, Error> {
        let ticket = self.state.lock().change_sort(sort);
        self.run(ticket).await
    }

    pub async fn go_to_page(&self, page: u32) -> Result<LoadOutcome, Error> {
        let total = self.repo.total();
        let ticket = self.state.lock().go_to_page(page, total);
        self.run(ticket).await
    }

    pub async fn next_page(&self) -> Result<LoadOutcome, Error> {
        let total = self.repo.total();
        let ticket = self.state.lock().next_page(total);
        self.run(ticket).await
    }

    pub async fn prev_page(&self) -> Result<LoadOutcome, Error> {
        let total = self.repo.total();
        let ticket = self.state.lock().prev_page(total);
        self.run(ticket).await
    }

    async fn run(&self, ticket: Option<Ticket>) -> Result<LoadOutcome, Error> {
        let mut ticket = match ticket {
            Some(t) => t,
            None => return Ok(LoadOutcome::Unchanged),
        };
        loop {
            let fetch = self
                .repo
                .fetch_page(ticket.page, ticket.page_size, ticket.sort);
            let res = match tokio::time::timeout(self.timeout, fetch).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!(?ticket, "page fetch timed out");
                    Err(Error::Timeout)
                }
            };

            // Checking and applying under the same lock keeps a newer fetch from
            // sneaking in between
            let mut state = self.state.lock();
            match state.resolve(&ticket, res.as_ref()) {
                Resolution::Stale => {
                    tracing::warn!(?ticket, "discarding stale page fetch");
                    return Ok(LoadOutcome::Discarded);
                }
                Resolution::Apply | Resolution::Failed => {
                    self.repo.apply_page(res?);
                    return Ok(LoadOutcome::Applied);
                }
                Resolution::Refetch(next) => {
                    tracing::debug!(?ticket, ?next, "page is past the end, fetching the last one");
                    ticket = next;
                }
            }
        }
    }
}
