use natter_api::Time;

/// A top-level comment and its replies, in the format produced by `generate-test-data`
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SeedThread {
    pub author: String,
    pub content: String,
    pub created_at: Time,
    #[serde(default)]
    pub upvotes: u64,
    #[serde(default)]
    pub downvotes: u64,
    #[serde(default)]
    pub replies: Vec<SeedReply>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SeedReply {
    pub author: String,
    pub content: String,
    pub created_at: Time,
}
