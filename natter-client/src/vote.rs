use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;

use crate::{
    api::{CommentId, Error, VoteDirection, VoteTally},
    CommentRepository, Identity,
};

/// Up/down voting for the current viewer
///
/// Whether a second identical vote takes the vote back is up to the server: the
/// resulting tally is always the server's answer, never computed here.
pub struct VoteCoordinator {
    repo: Arc<CommentRepository>,
    identity: Arc<dyn Identity>,
    in_flight: Arc<Mutex<HashSet<CommentId>>>,
}

// Releases the in-flight slot even if the vote future is dropped
struct InFlight {
    set: Arc<Mutex<HashSet<CommentId>>>,
    id: CommentId,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

impl VoteCoordinator {
    pub fn new(repo: Arc<CommentRepository>, identity: Arc<dyn Identity>) -> VoteCoordinator {
        VoteCoordinator {
            repo,
            identity,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_in_flight(&self, id: &CommentId) -> bool {
        self.in_flight.lock().contains(id)
    }

    pub async fn vote(&self, id: CommentId, direction: VoteDirection) -> Result<VoteTally, Error> {
        if !self.identity.is_authenticated() {
            return Err(Error::Unauthenticated);
        }
        if !self.in_flight.lock().insert(id) {
            return Err(Error::VoteInFlight(id));
        }
        let _slot = InFlight {
            set: self.in_flight.clone(),
            id,
        };
        self.repo.submit_vote(id, direction).await
    }
}
