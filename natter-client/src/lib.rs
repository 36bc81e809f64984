mod cache;
pub use cache::CommentCache;

mod composer;
pub use composer::{Composer, ComposerState, Draft, DraftKind};

mod config;
pub use config::SessionConfig;

mod http;
pub use http::HttpCommentService;

mod identity;
pub use identity::Identity;

mod pager;
pub use pager::{
    LoadOutcome, LoadState, PageController, PageState, RequestToken, Resolution, Ticket,
};

mod repository;
pub use repository::CommentRepository;

mod session;
pub use session::CommentSession;

mod vote;
pub use vote::VoteCoordinator;


pub mod api {
    pub use natter_api::*;
}
