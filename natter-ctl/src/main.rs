use std::{sync::Arc, time::Duration};

use anyhow::Context;
use natter_client::{
    api::{
        ArticleId, AuthToken, Comment, CommentId, SortMode, UserId, UserVote, Uuid, VoteDirection,
    },
    CommentSession, DraftKind, HttpCommentService, Identity, SessionConfig,
};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    /// Article whose comments to act on
    #[structopt(short, long)]
    article: Uuid,

    #[structopt(long, default_value = "10")]
    page_size: u32,

    /// Give up on page fetches after this many seconds
    #[structopt(long, default_value = "10")]
    timeout_secs: u64,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// List one page of comments
    List {
        #[structopt(short, long, default_value = "1")]
        page: u32,

        /// newest, oldest or popular
        #[structopt(short, long, default_value = "newest")]
        sort: SortMode,
    },

    /// Post a new top-level comment
    Post { content: String },

    /// Reply to a top-level comment
    Reply { parent: Uuid, content: String },

    /// Replace the content of one of your comments
    Edit { id: Uuid, content: String },

    /// Delete one of your comments
    Delete { id: Uuid },

    /// Vote a comment up or down, voting the same way twice takes the vote back
    Vote { id: Uuid, direction: VoteDirection },

    /// Report a comment to the moderators
    Report { id: Uuid, reason: String },
}

/// The token only tells whether we are logged in, not as whom
struct Viewer(Option<AuthToken>);

impl Identity for Viewer {
    fn current_user(&self) -> Option<UserId> {
        None
    }

    fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

fn user_token() -> anyhow::Result<Option<AuthToken>> {
    let tok = match std::env::var("NATTER_TOKEN") {
        Ok(tok) => tok,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(e) => return Err(e).context("retrieving NATTER_TOKEN environment variable"),
    };
    let tok = Uuid::try_parse(&tok).context("parsing NATTER_TOKEN as an auth token")?;
    Ok(Some(AuthToken(tok)))
}

fn print_comment(c: &Comment, indent: &str) {
    let vote = match c.user_vote {
        UserVote::None => "",
        UserVote::Up => " (upvoted)",
        UserVote::Down => " (downvoted)",
    };
    let edited = if c.is_edited { " (edited)" } else { "" };
    println!(
        "{indent}[{}] {} at {}{edited}, +{} -{}{vote}",
        c.id.0, c.author.name, c.created_at, c.upvotes, c.downvotes
    );
    for line in c.content.lines() {
        println!("{indent}  {line}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let token = user_token()?;
    let sort = match opt.cmd {
        Command::List { sort, .. } => sort,
        _ => SortMode::default(),
    };
    let config = SessionConfig {
        page_size: opt.page_size,
        request_timeout: Duration::from_secs(opt.timeout_secs),
        initial_sort: sort,
    };
    let session = CommentSession::new(
        Arc::new(HttpCommentService::new(opt.host, token)),
        Arc::new(Viewer(token)),
        ArticleId(opt.article),
        config,
    )
    .context("setting up comment session")?;

    match opt.cmd {
        Command::List { page, .. } => {
            session.pager().reload().await?;
            if page != 1 {
                session.pager().go_to_page(page).await?;
            }
            let state = session.pager().state();
            let snapshot = session.snapshot();
            println!(
                "page {}/{} of {} comments, {} first",
                state.current_page,
                session.pager().total_pages().max(1),
                snapshot.total,
                state.sort,
            );
            for c in snapshot.comments.iter() {
                print_comment(c, "");
                for r in c.replies.iter() {
                    print_comment(r, "    ");
                }
                if c.reply_count as usize > c.replies.len() {
                    println!("    ({} more replies)", c.reply_count as usize - c.replies.len());
                }
            }
        }
        Command::Post { content } => {
            let composer = session.composer();
            composer.set_text(DraftKind::New, content);
            let c = composer.submit_new().await?;
            println!("{}", c.id.0);
        }
        Command::Reply { parent, content } => {
            let c = session
                .repo()
                .create(&content, Some(CommentId(parent)))
                .await?;
            println!("{}", c.id.0);
        }
        Command::Edit { id, content } => {
            let c = session.repo().edit(CommentId(id), &content).await?;
            print_comment(&c, "");
        }
        Command::Delete { id } => {
            session.repo().remove(CommentId(id)).await?;
        }
        Command::Vote { id, direction } => {
            let tally = session.votes().vote(CommentId(id), direction).await?;
            println!("+{} -{}", tally.upvotes, tally.downvotes);
        }
        Command::Report { id, reason } => {
            session.repo().report(CommentId(id), &reason).await?;
        }
    }

    Ok(())
}
