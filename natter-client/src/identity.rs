use crate::api::UserId;

/// Who is currently looking at the comments, as known by the identity provider
pub trait Identity: Send + Sync {
    fn current_user(&self) -> Option<UserId>;

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

impl Identity for Option<UserId> {
    fn current_user(&self) -> Option<UserId> {
        *self
    }
}

impl Identity for UserId {
    fn current_user(&self) -> Option<UserId> {
        Some(*self)
    }
}
