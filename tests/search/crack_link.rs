//! End-to-end: decode a locked link and recover its passphrase with real
//! PBKDF2 + AES-GCM trial decryption.

use std::time::Duration;

use linklock::{
    Charset, LinkOracle, ProgressReporter, SearchConfig, SearchCoordinator, SearchOutcome,
    SearchReport, StatusLine,
};
use linklock_crypto::encrypt_record;
use linklock_link::{decode_link, encode_link};

const REFERENCE_LINK: &str = "https://jstrieb.github.io/link-lock/#eyJlIjoiWEk0ZS9GQkcxcko5Y1JCRVovUzk4Sk5IeGJwN0ljRk5MZUhTcVNrTUlpbW1mOFp4WlJIclEyK0lmY1liY3hOKy84WmlhMHdQYWFxcFhOcz0iLCJzIjoiMlFDNkIrcHcxckw4S0RiV1MvdWZqZz09IiwiaSI6IndCYkZZdHI4UFlNUittYnQifQ==";

const LEGACY_LINK: &str = "https://jstrieb.github.io/link-lock/#eyJlIjoiMlhUL01ZUUdJTlZvQ2tlOTdCNFhIclhrcFp5K3dIUXhJOEUrL3h3TXBaZ3VGZFh2cEZkYTZyM3giLCJ2IjoiMC4wLjEifQ==";

fn config(symbols: &str, max_length: Option<usize>) -> SearchConfig {
    SearchConfig {
        charset: Charset::new(symbols).unwrap(),
        workers: 4,
        queue_capacity: 16,
        progress_interval: Duration::from_millis(200),
        shutdown_grace: Duration::from_secs(2),
        max_length,
    }
}

/// Run a full search and return its report plus the reporter's total.
async fn crack(link: &str, config: SearchConfig) -> (SearchReport, u64) {
    let record = decode_link(link).unwrap();
    let (progress, reporter) =
        ProgressReporter::spawn(config.progress_interval, StatusLine::new(Vec::new()));
    let coordinator = SearchCoordinator::new(config, LinkOracle::new(record), progress).unwrap();
    let report = coordinator.run().await.unwrap();
    drop(coordinator);
    let tally = tokio::time::timeout(Duration::from_secs(10), reporter)
        .await
        .unwrap()
        .unwrap();
    (report, tally.attempts())
}

#[tokio::test(flavor = "multi_thread")]
async fn cracks_reference_link() {
    let (report, counted) = crack(REFERENCE_LINK, config("tes", None)).await;

    let SearchOutcome::Found(found) = &report.outcome else {
        panic!("expected a match, got {:?}", report.outcome);
    };
    assert_eq!(found.password, "test");
    assert_eq!(found.length, 4);
    assert_eq!(
        found.plaintext_lossy(),
        "https://jstrieb.github.io/link-lock/create/"
    );

    let lengths: Vec<usize> = report.lengths.iter().map(|l| l.length).collect();
    assert_eq!(lengths, vec![0, 1, 2, 3, 4]);
    assert!(report.lengths[4].found());
    for exhausted in &report.lengths[..4] {
        assert!(exhausted.exhausted());
        assert_eq!(Some(exhausted.attempts as u128), exhausted.keyspace);
    }
    assert!(counted >= 1 + 3 + 9 + 27 + 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn cracks_legacy_link_with_default_salt_and_iv() {
    let (report, _) = crack(LEGACY_LINK, config("ab", None)).await;

    let SearchOutcome::Found(found) = report.outcome else {
        panic!("legacy link was not cracked");
    };
    assert_eq!(found.password, "ba");
    assert_eq!(found.plaintext, b"https://example.com/legacy");
}

#[tokio::test(flavor = "multi_thread")]
async fn cracks_freshly_locked_link() {
    let record = encrypt_record("cb", b"https://example.org/hidden").unwrap();
    let link = encode_link("https://jstrieb.github.io/link-lock/", &record).unwrap();

    let (report, _) = crack(&link, config("abc", None)).await;

    let SearchOutcome::Found(found) = report.outcome else {
        panic!("fresh link was not cracked");
    };
    assert_eq!(found.password, "cb");
    assert_eq!(found.plaintext, b"https://example.org/hidden");
}

#[tokio::test(flavor = "multi_thread")]
async fn gives_up_after_max_length() {
    let (report, counted) = crack(REFERENCE_LINK, config("xy", Some(2))).await;

    assert_eq!(report.outcome, SearchOutcome::Exhausted { max_length: 2 });
    assert_eq!(report.total_attempts(), 1 + 2 + 4);
    assert_eq!(counted, 7);
}
