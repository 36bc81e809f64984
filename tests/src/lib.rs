use chrono::Duration;
use natter_api::{Time, MAX_CONTENT_LEN};
use natter_mock_server::{SeedReply, SeedThread};
use rand::{seq::SliceRandom, Rng};

pub const NUM_USERS: usize = 8;
pub const MAX_WORDS: usize = 60;
pub const MAX_REPLIES: usize = 6;
pub const MAX_VOTES: u64 = 40;

fn gen_username(rng: &mut impl Rng) -> String {
    let word = lipsum::lipsum_words_from_seed(1, rng.gen());
    let word = word.trim_end_matches(|c: char| !c.is_alphanumeric());
    format!("{}{}", word.to_lowercase(), rng.gen_range(1..100))
}

fn gen_content(rng: &mut impl Rng) -> String {
    let n = rng.gen_range(1..=MAX_WORDS);
    let text = lipsum::lipsum_words_from_seed(n, rng.gen());
    text.chars().take(MAX_CONTENT_LEN).collect::<String>().trim().to_owned()
}

/// Random comment threads, all created within the `spread` leading up to `now`
///
/// Replies are always more recent than the comment they answer.
pub fn gen_threads(rng: &mut impl Rng, n: usize, now: Time, spread: Duration) -> Vec<SeedThread> {
    let users = (0..NUM_USERS).map(|_| gen_username(rng)).collect::<Vec<_>>();
    let spread = spread.num_seconds().max(1);
    (0..n)
        .map(|_| {
            let created_at = now - Duration::seconds(rng.gen_range(0..spread));
            let num_replies = rng.gen_range(0..=MAX_REPLIES);
            let mut replies = (0..num_replies)
                .map(|_| {
                    let since = (now - created_at).num_seconds().max(1);
                    SeedReply {
                        author: users.choose(rng).cloned().unwrap_or_default(),
                        content: gen_content(rng),
                        created_at: created_at + Duration::seconds(rng.gen_range(0..since)),
                    }
                })
                .collect::<Vec<_>>();
            replies.sort_by_key(|r| r.created_at);
            SeedThread {
                author: users.choose(rng).cloned().unwrap_or_default(),
                content: gen_content(rng),
                created_at,
                upvotes: rng.gen_range(0..=MAX_VOTES),
                downvotes: rng.gen_range(0..=MAX_VOTES / 4),
                replies,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use natter_api::{ArticleId, CommentService, PageRequest, SortMode, Uuid};
    use natter_mock_server::MockServer;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn generated_content_is_always_postable() {
        bolero::check!().with_type::<u64>().for_each(|seed| {
            let mut rng = StdRng::seed_from_u64(*seed);
            let now = Utc.with_ymd_and_hms(2022, 6, 1, 12, 0, 0).unwrap();
            for t in gen_threads(&mut rng, 3, now, Duration::days(7)) {
                assert!(natter_api::validate_content(&t.content).is_ok());
                assert!(t.created_at <= now);
                for r in t.replies {
                    assert!(natter_api::validate_content(&r.content).is_ok());
                    assert!(t.created_at <= r.created_at && r.created_at <= now);
                }
            }
        })
    }

    #[tokio::test]
    async fn generated_data_loads_into_the_mock_server() {
        let mut rng = StdRng::seed_from_u64(42);
        let threads = gen_threads(&mut rng, 25, Utc::now(), Duration::days(30));
        let num_replies = threads.iter().map(|t| t.replies.len()).sum::<usize>();
        let json = serde_json::to_string(&threads).unwrap();

        let server = MockServer::new();
        let article = ArticleId(Uuid::new_v4());
        assert_eq!(server.load_seed(article, &json).unwrap(), 25 + num_replies);

        let page = server
            .client(None)
            .list_comments(PageRequest {
                article_id: article,
                page: 3,
                page_size: 10,
                sort: SortMode::Popular,
            })
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.comments.len(), 5);
        assert!(page
            .comments
            .windows(2)
            .all(|w| w[0].score() >= w[1].score()));
        for c in page.comments.iter() {
            assert_eq!(c.reply_count as usize, c.replies.len());
        }
    }
}
