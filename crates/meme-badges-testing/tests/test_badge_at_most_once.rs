use meme_badges_testing::{creator, launched_token, BadgeKind, FixtureStage, TestFixture};

/// Test that a subject holds at most one badge of each kind
///
/// Every path that can ask for a badge (chain events, manual checks and
/// repeated sweeps) is driven several times. The ledger and the mint-call
/// log must each show exactly one mint per kind.
///
/// **Test flow:**
/// 1. Mint the creator's badges through the staged fixture
/// 2. Re-deliver the launch event and request manual checks
/// 3. Sweep repeatedly
/// 4. Verify one ledger record and one broadcast per kind
#[tokio::test]
async fn test_badge_at_most_once() {
    let mut test = TestFixture::new();

    // 1. Mint
    test.jump_to(FixtureStage::BadgesMinted).await;
    let launch = test.launch_event().cloned().expect("launch event");

    // 2. Ask again, every way we can
    for _ in 0..3 {
        assert!(test.deliver(&launch).await.is_empty());
        assert!(test
            .check_badges(creator(), Some(launched_token()))
            .await
            .is_empty());
    }

    // 3. Sweep
    for _ in 0..3 {
        assert!(test.sweep().await.is_empty());
    }

    // 4. One of each
    for kind in [BadgeKind::TokenCreator, BadgeKind::LaunchMaster] {
        assert_eq!(test.chain.mints_of(creator(), kind), 1);
    }
    let badges = test.badges(creator()).await;
    assert_eq!(badges.len(), 2);

    println!("✅ {} badges, {} mint calls", badges.len(), test.chain.mint_calls().len());
}
