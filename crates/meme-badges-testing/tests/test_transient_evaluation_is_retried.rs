use meme_badges_testing::{addr, ether, BadgeKind, MintStatus, TestFixture};

/// Test that a transient chain failure during evaluation is not lost
///
/// The badge ownership read fails while a 15 ETH transfer to 0xbb is
/// handled. The cursor still moves past the event, so the evaluation is
/// kept aside and repeated by the sweeps until it reaches a verdict.
///
/// **Test flow:**
/// 1. Make the next two badge reads fail
/// 2. Deliver the transfer and verify nothing is queued yet
/// 3. Verify the cursor moved and one evaluation is deferred
/// 4. Sweep while the read still fails; the evaluation stays deferred
/// 5. Sweep again and verify `WhaleCaller` is queued and minted
#[tokio::test]
async fn test_transient_evaluation_is_retried() {
    let test = TestFixture::new();
    let (sender, whale, token) = (addr(0x01), addr(0xbb), addr(0xcc));

    // 1-2. Deliver with a flaky badge contract
    test.chain.fail_next_badge_checks(2);
    let event = test.chain.transfer(token, sender, whale, ether(15));
    assert!(test.deliver(&event).await.is_empty());

    // 3. Cursor and deferral
    let cursor = test.store().read_cursor().await.unwrap();
    assert_eq!(cursor, Some(event.block_number()));
    assert_eq!(test.deferred_count().await, 1);

    println!("✅ Evaluation deferred, cursor at block {:?}", cursor);

    // 4. Still failing
    assert!(test.sweep().await.is_empty());
    let deferred = test.store().due_evaluations(10).await.unwrap();
    assert_eq!(deferred.len(), 1);
    assert_eq!(deferred[0].attempts, 2);
    assert_eq!(deferred[0].transfer_value, Some(ether(15)));
    assert!(test.requests().await.is_empty());

    // 5. Recovered
    let outcomes = test.sweep().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].request().status, MintStatus::Confirmed);
    assert_eq!(test.deferred_count().await, 0);

    let badges = test.badges(whale).await;
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].badge_kind, BadgeKind::WhaleCaller);
    assert_eq!(test.chain.mints_of(whale, BadgeKind::WhaleCaller), 1);

    println!("✅ WhaleCaller minted for {} after the chain recovered", whale);
}

/// An evaluation that never stops failing is dropped after the configured
/// number of attempts instead of being retried forever
#[tokio::test]
async fn test_deferred_evaluation_gives_up() {
    let test = TestFixture::new();
    let attempts = test.engine.config().max_evaluation_attempts;

    test.chain.fail_next_badge_checks(u32::MAX);
    let event = test.chain.transfer(addr(0xcc), addr(0x01), addr(0xbb), ether(15));
    test.deliver(&event).await;
    assert_eq!(test.deferred_count().await, 1);

    for _ in 1..attempts {
        test.sweep().await;
    }

    assert_eq!(test.deferred_count().await, 0);
    assert!(test.requests().await.is_empty());
    assert!(test.chain.mint_calls().is_empty());

    println!("✅ Gave up after {} attempts", attempts);
}
