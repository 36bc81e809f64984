use crate::Error;

/// The current viewer's vote on a comment
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserVote {
    #[default]
    None,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl From<VoteDirection> for UserVote {
    fn from(d: VoteDirection) -> UserVote {
        match d {
            VoteDirection::Up => UserVote::Up,
            VoteDirection::Down => UserVote::Down,
        }
    }
}

impl std::str::FromStr for VoteDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<VoteDirection, String> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            _ => Err(format!("unknown vote direction {s:?}, expected up or down")),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

/// Vote counts of a comment as seen by one viewer, always taken verbatim from the server
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoteTally {
    pub upvotes: u64,
    pub downvotes: u64,
    pub user_vote: UserVote,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Report {
    pub reason: String,
}

impl Report {
    // Same bounds as comment content
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.reason).map(|_| ())
    }
}
