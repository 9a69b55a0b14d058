use meme_badges_testing::{addr, creator, ether, BadgeKind, FixtureStage, MintStatus, TestFixture};

/// Test at-least-once delivery from the reader
///
/// The reader may replay events after a restart. Delivering the same event
/// again, before or after its mints resolved, must not create new requests.
///
/// **Test flow:**
/// 1. Deliver a launch event twice before any sweep
/// 2. Verify only the first delivery queued requests
/// 3. Sweep, then deliver the event a third time
/// 4. Verify no new requests and an advanced cursor
#[tokio::test]
async fn test_event_redelivery_is_idempotent() {
    let mut test = TestFixture::new();
    test.jump_to(FixtureStage::TokenLaunched).await;
    let launch = test.launch_event().cloned().expect("launch event");

    // 1-2. Two deliveries before the sweep
    let first = test.deliver(&launch).await;
    let second = test.deliver(&launch).await;
    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
    assert_eq!(test.requests().await.len(), 2);

    println!("✅ Replayed event before sweep queued nothing");

    // 3. Resolve, then replay
    test.sweep().await;
    assert_eq!(test.requests_with(MintStatus::Confirmed).await.len(), 2);
    assert!(test.deliver(&launch).await.is_empty());

    // 4. Cursor and queue
    assert_eq!(test.requests().await.len(), 2);
    assert_eq!(
        test.store().read_cursor().await.unwrap(),
        Some(launch.block_number())
    );

    println!("✅ Replayed event after sweep queued nothing");
}

/// A replayed transfer is as harmless as a replayed launch
#[tokio::test]
async fn test_transfer_redelivery_is_idempotent() {
    let test = TestFixture::new();
    let transfer = test.chain.transfer(addr(0xcc), addr(0x01), addr(0xbb), ether(20));

    assert_eq!(test.deliver(&transfer).await.len(), 1);
    assert!(test.deliver(&transfer).await.is_empty());
    test.sweep().await;
    assert!(test.deliver(&transfer).await.is_empty());

    assert_eq!(test.chain.mints_of(addr(0xbb), BadgeKind::WhaleCaller), 1);
    assert!(test.badges(creator()).await.is_empty());
}
