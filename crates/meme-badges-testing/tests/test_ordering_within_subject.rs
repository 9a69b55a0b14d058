use meme_badges_testing::{addr, creator, ether, BadgeKind, FixtureStage, MintStatus, TestFixture};
use std::time::Duration;

/// Test FIFO ordering of mints for one subject
///
/// Requests of one subject are minted in the order they were queued. While
/// the oldest is waiting for a retry, younger requests of the same subject
/// wait behind it; other subjects are not held up.
///
/// **Test flow:**
/// 1. Queue TokenCreator and LaunchMaster for the creator, then WhaleCaller
///    for the creator and for another subject
/// 2. Make the first broadcast fail with a long retry delay
/// 3. Sweep and verify only the other subject was minted
/// 4. Verify the creator's younger requests are still pending and untouched
#[tokio::test]
async fn test_ordering_within_subject() {
    let mut config = TestFixture::fast_config();
    config.retry_delay = Duration::from_secs(3_600);
    let mut test = TestFixture::with_config(config);
    let other = addr(0xbb);

    // 1. Queue four mints
    test.jump_to(FixtureStage::MintsQueued).await;
    let creator_whale = test.chain.transfer(addr(0xcc), addr(0x01), creator(), ether(50));
    let other_whale = test.chain.transfer(addr(0xcc), addr(0x01), other, ether(50));
    test.deliver(&creator_whale).await;
    test.deliver(&other_whale).await;

    let queued: Vec<(_, _)> = test
        .requests()
        .await
        .iter()
        .map(|r| (r.recipient, r.badge_kind))
        .collect();
    assert_eq!(
        queued,
        vec![
            (creator(), BadgeKind::TokenCreator),
            (creator(), BadgeKind::LaunchMaster),
            (creator(), BadgeKind::WhaleCaller),
            (other, BadgeKind::WhaleCaller),
        ]
    );

    // 2-3. First broadcast fails
    test.chain.fail_next_submissions(1);
    let outcomes = test.sweep().await;
    assert_eq!(outcomes.len(), 2);

    let calls = test.chain.mint_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipient, other);

    println!("✅ {} was minted while {} waited for a retry", other, creator());

    // 4. Creator's queue is intact
    let requests = test.requests().await;
    assert_eq!(requests[0].status, MintStatus::Pending);
    assert_eq!(requests[0].retry_count, 1);
    assert_eq!(requests[1].status, MintStatus::Pending);
    assert_eq!(requests[1].retry_count, 0);
    assert_eq!(requests[2].status, MintStatus::Pending);
    assert_eq!(requests[3].status, MintStatus::Confirmed);
}

/// Without failures the creator's requests are minted in queue order
#[tokio::test]
async fn test_mints_follow_queue_order() {
    let mut test = TestFixture::new();
    test.jump_to(FixtureStage::MintsQueued).await;
    let whale = test.chain.transfer(addr(0xcc), addr(0x01), creator(), ether(10));
    test.deliver(&whale).await;

    test.sweep().await;

    let kinds: Vec<BadgeKind> = test.chain.mint_calls().iter().map(|c| c.badge_kind).collect();
    assert_eq!(
        kinds,
        vec![
            BadgeKind::TokenCreator,
            BadgeKind::LaunchMaster,
            BadgeKind::WhaleCaller
        ]
    );
}
