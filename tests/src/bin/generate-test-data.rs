use chrono::{Duration, Utc};

const NUM_THREADS: usize = 150;
const SPREAD_DAYS: i64 = 30;

fn main() -> anyhow::Result<()> {
    let threads = tests::gen_threads(
        &mut rand::thread_rng(),
        NUM_THREADS,
        Utc::now(),
        Duration::days(SPREAD_DAYS),
    );
    println!("{}", serde_json::to_string_pretty(&threads)?);
    Ok(())
}
