use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    api::{Comment, CommentId, Error},
    CommentRepository,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    pub target: CommentId,
    pub text: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DraftKind {
    /// A new top-level comment
    New,
    Reply,
    Edit,
}

/// What the viewer is currently writing
///
/// At most one comment is being edited and at most one is being replied to, and
/// never both for the same comment: opening one of them closes whatever conflicts
/// with it, discarding its text.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ComposerState {
    pub draft: String,
    pub editing: Option<Draft>,
    pub replying: Option<Draft>,
}

impl ComposerState {
    pub fn start_edit(&mut self, target: CommentId, current_content: &str) {
        if self.is_replying_to(&target) {
            self.replying = None;
        }
        self.editing = Some(Draft {
            target,
            text: String::from(current_content),
        });
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Reopening the reply form on the same comment keeps its text
    pub fn start_reply(&mut self, parent: CommentId) {
        if self.is_editing(&parent) {
            self.editing = None;
        }
        if !self.is_replying_to(&parent) {
            self.replying = Some(Draft {
                target: parent,
                text: String::new(),
            });
        }
    }

    pub fn cancel_reply(&mut self) {
        self.replying = None;
    }

    pub fn is_editing(&self, id: &CommentId) -> bool {
        self.editing.as_ref().map_or(false, |d| d.target == *id)
    }

    pub fn is_replying_to(&self, id: &CommentId) -> bool {
        self.replying.as_ref().map_or(false, |d| d.target == *id)
    }

    pub fn text(&self, kind: DraftKind) -> Option<&str> {
        match kind {
            DraftKind::New => Some(&self.draft),
            DraftKind::Reply => self.replying.as_ref().map(|d| &d.text as &str),
            DraftKind::Edit => self.editing.as_ref().map(|d| &d.text as &str),
        }
    }

    /// Returns false if there is no open form of this kind
    pub fn set_text(&mut self, kind: DraftKind, text: String) -> bool {
        let slot = match kind {
            DraftKind::New => &mut self.draft,
            DraftKind::Reply => match &mut self.replying {
                Some(d) => &mut d.text,
                None => return false,
            },
            DraftKind::Edit => match &mut self.editing {
                Some(d) => &mut d.text,
                None => return false,
            },
        };
        *slot = text;
        true
    }
}

/// Form controller for new comments, replies and edits
///
/// Drafts are only cleared once the server accepted them; any error leaves them
/// in place for the viewer to retry. The state lock is never held across a request,
/// so that the viewer can keep interacting while a submission is in flight.
pub struct Composer {
    repo: Arc<CommentRepository>,
    state: Mutex<ComposerState>,
}

impl Composer {
    pub fn new(repo: Arc<CommentRepository>) -> Composer {
        Composer {
            repo,
            state: Mutex::new(ComposerState::default()),
        }
    }

    pub fn state(&self) -> ComposerState {
        self.state.lock().clone()
    }

    pub fn start_edit(&self, id: CommentId) -> Result<(), Error> {
        let c = self.repo.get_by_id(&id)?;
        self.state.lock().start_edit(id, &c.content);
        Ok(())
    }

    pub fn cancel_edit(&self) {
        self.state.lock().cancel_edit()
    }

    pub fn start_reply(&self, parent: CommentId) -> Result<(), Error> {
        if !self.repo.get_by_id(&parent)?.is_top_level() {
            return Err(Error::NestedReply(parent));
        }
        self.state.lock().start_reply(parent);
        Ok(())
    }

    pub fn cancel_reply(&self) {
        self.state.lock().cancel_reply()
    }

    pub fn set_text(&self, kind: DraftKind, text: impl Into<String>) -> bool {
        self.state.lock().set_text(kind, text.into())
    }

    /// Text typed in while the submission was in flight is kept
    pub async fn submit_new(&self) -> Result<Comment, Error> {
        let text = self.state.lock().draft.clone();
        let c = self.repo.create(&text, None).await?;
        let mut state = self.state.lock();
        if state.draft == text {
            state.draft.clear();
        }
        Ok(c)
    }

    /// Returns None if no reply form is open
    pub async fn submit_reply(&self) -> Result<Option<Comment>, Error> {
        let draft = match self.state.lock().replying.clone() {
            Some(d) => d,
            None => return Ok(None),
        };
        let c = self.repo.create(&draft.text, Some(draft.target)).await?;
        let mut state = self.state.lock();
        if state.is_replying_to(&draft.target) {
            state.replying = None;
        }
        Ok(Some(c))
    }

    /// Returns None if no comment is being edited
    pub async fn submit_edit(&self) -> Result<Option<Comment>, Error> {
        let draft = match self.state.lock().editing.clone() {
            Some(d) => d,
            None => return Ok(None),
        };
        let c = self.repo.edit(draft.target, &draft.text).await?;
        let mut state = self.state.lock();
        if state.is_editing(&draft.target) {
            state.editing = None;
        }
        Ok(Some(c))
    }
}
