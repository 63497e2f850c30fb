//! Replay source – feeds recorded samples onto the [`SampleBus`].
//!
//! Input is line oriented: `<key> <json payload>`.  Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! # camera + a LiDAR reading
//! cam/switch {"camera_id": 1}
//! lidar/force_vector {"linear": 1.5, "angular": -0.2}
//! ```

use std::path::Path;

use roboapp_middleware::SampleBus;
use roboapp_types::{DashError, Sample};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

/// Split one input line into a sample.
///
/// Returns `Ok(None)` for lines that carry no sample.
pub fn parse_line(line: &str) -> Result<Option<Sample>, DashError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    match line.split_once(char::is_whitespace) {
        Some((key, payload)) if !payload.trim().is_empty() => {
            Ok(Some(Sample::new(key, payload.trim())))
        }
        _ => Err(DashError::Decode(format!("missing payload after key `{line}`"))),
    }
}

/// Counters for one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub published: u64,
    pub skipped: u64,
}

/// Publish every sample in `reader` onto `bus`, pacing each publish so the
/// pump keeps up (see [`SampleBus::publish_paced`]).
///
/// The bus is dropped on return so that the pump on the other side sees the
/// channel close.
pub async fn feed<R>(reader: R, bus: SampleBus) -> std::io::Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = FeedStats::default();
    let mut lines = reader.lines();
    let mut line_no = 0_u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        match parse_line(&line) {
            Ok(Some(sample)) => match bus.publish_paced(sample).await {
                Ok(receivers) => {
                    stats.published += 1;
                    debug!(line = line_no, receivers, "sample published");
                }
                Err(e) => {
                    stats.skipped += 1;
                    warn!(line = line_no, error = %e, "sample dropped");
                }
            },
            Ok(None) => {}
            Err(e) => {
                stats.skipped += 1;
                warn!(line = line_no, error = %e, "unparseable line");
            }
        }
    }
    Ok(stats)
}

/// Replay `path`, or stdin when `path` is `None` or `-`.
pub async fn feed_source(path: Option<&Path>, bus: SampleBus) -> std::io::Result<FeedStats> {
    match path {
        Some(p) if p != Path::new("-") => {
            let file = tokio::fs::File::open(p).await?;
            feed(BufReader::new(file), bus).await
        }
        _ => feed(BufReader::new(tokio::io::stdin()), bus).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roboapp_middleware::{KeyTable, PumpStats, Router, pump};
    use roboapp_state::AppContext;
    use std::fmt::Write as _;

    #[test]
    fn parse_line_splits_key_and_payload() {
        let sample = parse_line(r#"  disk   {"left": 1, "right": 2}  "#)
            .unwrap()
            .unwrap();
        assert_eq!(sample.key, "disk");
        assert_eq!(sample.payload, r#"{"left": 1, "right": 2}"#);
    }

    #[test]
    fn parse_line_skips_blank_and_comment_lines() {
        assert!(parse_line("").unwrap().is_none());
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# flap {\"pitch\": 0}").unwrap().is_none());
    }

    #[test]
    fn parse_line_rejects_key_without_payload() {
        assert!(matches!(parse_line("flap"), Err(DashError::Decode(_))));
        assert!(matches!(parse_line("flap   "), Err(DashError::Decode(_))));
    }

    #[tokio::test]
    async fn feed_publishes_samples_in_order() {
        let bus = SampleBus::default();
        let mut rx = bus.subscribe();
        let input = "# header\ncam/switch {\"camera_id\": 2}\n\nbogus\nflap {\"pitch\": 1, \"yaw\": 2}\n";

        let stats = feed(input.as_bytes(), bus).await.unwrap();
        assert_eq!(stats, FeedStats { published: 2, skipped: 1 });

        assert_eq!(rx.recv().await.unwrap().key, "cam/switch");
        assert_eq!(rx.recv().await.unwrap().key, "flap");
        assert!(rx.recv().await.is_err(), "bus must be closed after feed");
    }

    #[tokio::test]
    async fn feed_without_listeners_counts_drops() {
        let bus = SampleBus::default();
        let stats = feed("disk {\"left\": 1, \"right\": 1}\n".as_bytes(), bus)
            .await
            .unwrap();
        assert_eq!(stats, FeedStats { published: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn feed_source_reads_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("session.log");
        std::fs::write(&path, "lidar/force_vector {\"linear\": 0.5, \"angular\": 90}\n")
            .expect("write");

        let bus = SampleBus::default();
        let mut rx = bus.subscribe();
        let stats = feed_source(Some(&path), bus).await.unwrap();

        assert_eq!(stats.published, 1);
        assert_eq!(rx.recv().await.unwrap().key, "lidar/force_vector");
    }

    #[tokio::test]
    async fn replay_longer_than_bus_capacity_loses_nothing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("long.log");
        let mut contents = String::new();
        for i in 0..2000 {
            writeln!(contents, "cam/switch {{\"camera_id\": {i}}}").expect("format");
        }
        std::fs::write(&path, contents).expect("write");

        let router = Router::new(AppContext::new(), KeyTable::new(""));
        let bus = SampleBus::default();
        assert!(bus.capacity() < 2000);
        let sub = bus.subscribe_prefix("");

        // Same shape as the CLI: producer spawned, pump on the runtime thread.
        let producer = tokio::spawn(async move { feed_source(Some(&path), bus).await });
        let stats = pump(sub, &router).await;
        let feed = producer.await.expect("join").expect("read");

        assert_eq!(feed, FeedStats { published: 2000, skipped: 0 });
        assert_eq!(stats, PumpStats { routed: 2000, rejected: 0, lagged: 0 });
        assert_eq!(router.context().camera_id().get(), 1999);
    }
}
