use std::fmt;

use uuid::Uuid;

use crate::{Comment, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct ArticleId(pub Uuid);

impl ArticleId {
    pub fn stub() -> ArticleId {
        ArticleId(STUB_UUID)
    }
}

/// Server-defined ordering of top-level comments
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    /// By net votes, highest first
    Popular,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Newest => "newest",
            SortMode::Oldest => "oldest",
            SortMode::Popular => "popular",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<SortMode, String> {
        match s {
            "newest" => Ok(SortMode::Newest),
            "oldest" => Ok(SortMode::Oldest),
            "popular" => Ok(SortMode::Popular),
            _ => Err(format!(
                "unknown sort mode {s:?}, expected newest, oldest or popular"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PageRequest {
    pub article_id: ArticleId,

    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub sort: SortMode,
}

impl PageRequest {
    /// Number of top-level comments to skip on the server side
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,

    /// Number of top-level comments for the whole article, replies excluded
    pub total: u64,
}

/// `ceil(total / page_size)`, with an empty article having zero pages
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = (total + u64::from(page_size) - 1) / u64::from(page_size);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
