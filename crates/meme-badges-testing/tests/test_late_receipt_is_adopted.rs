use meme_badges_engine::SubmissionOutcome;
use meme_badges_testing::{addr, ether, BadgeKind, Confirmation, MintStatus, TestFixture, U256};

/// Test a mint that lands after its confirmation wait gave up
///
/// The first broadcast is included only after the submitter stopped
/// waiting, so the request goes back to pending with its transaction hash.
/// On the next attempt the badge contract already reports the badge: the
/// request is confirmed from the earlier transaction and nothing is sent
/// again.
///
/// **Test flow:**
/// 1. Script a late confirmation and deliver a 15 ETH transfer to 0xbb
/// 2. Sweep and verify the attempt is counted as failed
/// 3. Sweep again and verify the request is confirmed without a new broadcast
/// 4. Verify the ledger records the earlier transaction and its token id
#[tokio::test]
async fn test_late_receipt_is_adopted() {
    let test = TestFixture::new();
    let whale = addr(0xbb);

    // 1. Late mint
    test.chain.script_confirmations([Confirmation::LateConfirm]);
    let event = test.chain.transfer(addr(0xcc), addr(0x01), whale, ether(15));
    assert_eq!(test.deliver(&event).await.len(), 1);

    // 2. First sweep times out while the mint lands
    let outcomes = test.sweep().await;
    let SubmissionOutcome::Retrying { request } = &outcomes[0] else {
        panic!("expected a retry, got {:?}", outcomes[0]);
    };
    let first_tx = request.tx_hash.expect("broadcast hash is kept");
    assert_eq!(request.status, MintStatus::Pending);
    assert!(test.chain.holds_on_chain(whale, BadgeKind::WhaleCaller));
    assert!(test.badges(whale).await.is_empty());

    println!("✅ Wait gave up on {} but the mint landed", first_tx);

    // 3. Second sweep adopts the earlier mint
    let outcomes = test.sweep().await;
    let SubmissionOutcome::Confirmed { request, token_id } = &outcomes[0] else {
        panic!("expected a confirmation, got {:?}", outcomes[0]);
    };
    assert_eq!(request.status, MintStatus::Confirmed);
    assert_eq!(*token_id, Some(U256::from(1u64)));
    assert_eq!(test.chain.mint_calls().len(), 1);
    assert!(test.requests_with(MintStatus::Failed).await.is_empty());

    // 4. Ledger
    let badges = test.badges(whale).await;
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].tx_hash, Some(first_tx));
    assert_eq!(badges[0].token_id, *token_id);

    println!("✅ Request confirmed from {} with one broadcast", first_tx);
}

/// A transaction that never landed is broadcast again, not adopted
#[tokio::test]
async fn test_lost_transaction_is_rebroadcast() {
    let test = TestFixture::new();
    let whale = addr(0xbb);

    test.chain.script_confirmations([Confirmation::Timeout]);
    let event = test.chain.transfer(addr(0xcc), addr(0x01), whale, ether(15));
    test.deliver(&event).await;

    test.sweep().await;
    assert!(!test.chain.holds_on_chain(whale, BadgeKind::WhaleCaller));

    let outcomes = test.sweep().await;
    assert!(matches!(outcomes[0], SubmissionOutcome::Confirmed { .. }));
    assert_eq!(test.chain.mints_of(whale, BadgeKind::WhaleCaller), 2);
    assert_eq!(test.badges(whale).await.len(), 1);

    println!("✅ Lost transaction re-sent once");
}
