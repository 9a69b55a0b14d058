use meme_badges_testing::{addr, ether, BadgeKind, MintStatus, TestFixture};

/// Test the large-transfer path
///
/// A 15 ETH transfer to 0xbb on token 0xcc unlocks `WhaleCaller` for the
/// receiver, with the transfer value as achievement value.
///
/// **Test flow:**
/// 1. Emit a 15 ETH transfer from 0x01 to 0xbb on 0xcc
/// 2. Deliver it and verify one `WhaleCaller` request for 0xbb
/// 3. Verify the sender gets nothing
/// 4. Sweep and verify the mint call and ledger record
#[tokio::test]
async fn test_large_transfer_scenario() {
    let test = TestFixture::new();
    let (sender, whale, token) = (addr(0x01), addr(0xbb), addr(0xcc));

    // 1-2. Deliver
    let event = test.chain.transfer(token, sender, whale, ether(15));
    let queued = test.deliver(&event).await;

    assert_eq!(queued.len(), 1);
    let request = &queued[0];
    assert_eq!(request.recipient, whale);
    assert_eq!(request.badge_kind, BadgeKind::WhaleCaller);
    assert_eq!(request.related_token, Some(token));
    assert_eq!(request.achievement_value, ether(15));
    assert_eq!(request.status, MintStatus::Pending);

    println!("✅ WhaleCaller queued for {} at {}", whale, request.achievement_value);

    // 3. Sender
    assert!(test.badges(sender).await.is_empty());
    assert_eq!(test.requests().await.len(), 1);

    // 4. Sweep
    test.sweep().await;

    let calls = test.chain.mint_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args(), (whale, 6u8, token, ether(15)));

    let badges = test.badges(whale).await;
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].badge_kind, BadgeKind::WhaleCaller);

    println!("✅ WhaleCaller minted for {}", whale);
}

/// Transfers below the requirement do not qualify; the boundary does
#[tokio::test]
async fn test_whale_threshold_boundary() {
    let test = TestFixture::new();

    let small = test.chain.transfer(addr(0xcc), addr(0x01), addr(0xb1), ether(9));
    assert!(test.deliver(&small).await.is_empty());

    let exact = test.chain.transfer(addr(0xcc), addr(0x01), addr(0xb2), ether(10));
    assert_eq!(test.deliver(&exact).await.len(), 1);

    println!("✅ 9 ETH rejected, 10 ETH accepted");
}
