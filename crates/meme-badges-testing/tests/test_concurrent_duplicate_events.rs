use futures::future::join_all;
use meme_badges_testing::{addr, creator, ether, BadgeKind, FixtureStage, TestFixture};

/// Test concurrent handling of the same event
///
/// Eight copies of one launch event and eight manual checks are evaluated
/// at the same time. The transactional enqueue must admit exactly one
/// request per (subject, kind).
///
/// **Test flow:**
/// 1. Launch a token
/// 2. Handle sixteen evaluations concurrently
/// 3. Verify exactly two requests exist
/// 4. Sweep and verify exactly two mints
#[tokio::test]
async fn test_concurrent_duplicate_events() {
    let mut test = TestFixture::new();
    test.jump_to(FixtureStage::TokenLaunched).await;
    let launch = test.launch_event().cloned().expect("launch event");

    // 2. Concurrent evaluations
    let deliveries = (0..8).map(|_| test.deliver(&launch));
    let checks = (0..8).map(|_| test.check_badges(creator(), None));
    let (delivered, checked) = futures::join!(join_all(deliveries), join_all(checks));

    let queued: usize = delivered.iter().chain(checked.iter()).map(Vec::len).sum();
    assert_eq!(queued, 2, "exactly one request per kind may win");

    // 3. Queue
    assert_eq!(test.requests().await.len(), 2);

    println!("✅ 16 concurrent evaluations queued {} requests", queued);

    // 4. Mints
    test.sweep().await;
    assert_eq!(test.chain.mints_of(creator(), BadgeKind::TokenCreator), 1);
    assert_eq!(test.chain.mints_of(creator(), BadgeKind::LaunchMaster), 1);
}

/// Concurrent events for different subjects do not block one another
#[tokio::test]
async fn test_concurrent_events_for_distinct_subjects() {
    let test = TestFixture::new();
    let transfers: Vec<_> = (0..6u8)
        .map(|i| test.chain.transfer(addr(0xcc), addr(0x01), addr(0xb0 + i), ether(11)))
        .collect();

    let results = join_all(transfers.iter().map(|event| test.deliver(event))).await;
    assert!(results.iter().all(|queued| queued.len() == 1));

    let outcomes = test.sweep().await;
    assert_eq!(outcomes.len(), 6);
    assert_eq!(test.store().count_badges().await.unwrap(), 6);
}
