use meme_badges_chain::{BadgeMinter, MintCall};
use meme_badges_db::BadgeDatabase;
use meme_badges_engine::SubmissionOutcome;
use meme_badges_testing::{addr, ether, BadgeKind, Confirmation, MintStatus, MockChain, TestFixture};
use std::sync::Arc;

/// Test crash recovery of broadcast but unresolved mints
///
/// A process that dies between broadcasting a mint and seeing its receipt
/// leaves the request `Submitted`. The next process must wait for that
/// transaction instead of sending a second one.
///
/// **Test flow:**
/// 1. Queue a mint in a file database and broadcast it by hand
/// 2. Mark it submitted and drop the engine
/// 3. Reopen the database with a fresh engine and recover
/// 4. Verify the badge is recorded and nothing was sent twice
#[tokio::test]
async fn test_recover_submitted_requests() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("badges.db");
    let chain = Arc::new(MockChain::new());
    let whale = addr(0xbb);

    // 1-2. First process
    let stranded_id = {
        let db = BadgeDatabase::create_file(&path, false).unwrap();
        let test = TestFixture::with_database(chain.clone(), db, TestFixture::fast_config());

        let transfer = chain.transfer(addr(0xcc), addr(0x01), whale, ether(15));
        test.deliver(&transfer).await;

        let request = test.store().dequeue_next().await.unwrap().expect("queued request");
        let tx_hash = chain
            .submit_mint(&MintCall::from_request(&request))
            .await
            .unwrap();
        let submitted = test.store().mark_submitted(request.id, tx_hash).await.unwrap();
        assert_eq!(submitted.status, MintStatus::Submitted);

        println!("💥 Engine stopped with request {} in flight ({})", request.id, tx_hash);
        request.id
    };

    // 3. Second process
    let db = BadgeDatabase::open(&path).unwrap();
    let test = TestFixture::with_database(chain.clone(), db, TestFixture::fast_config());

    let outcomes = test.engine.submitter().recover_submitted().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], SubmissionOutcome::Confirmed { .. }));

    // 4. Resolved without a second broadcast
    let request = test.store().read_request(stranded_id).await.unwrap();
    assert_eq!(request.status, MintStatus::Confirmed);
    assert_eq!(test.badges(whale).await.len(), 1);
    assert_eq!(chain.mints_of(whale, BadgeKind::WhaleCaller), 1);

    println!("✅ Request {} confirmed after restart without re-sending", stranded_id);
}

/// A stranded transaction that never confirms goes back to the queue
#[tokio::test]
async fn test_recovery_requeues_unconfirmed_transaction() {
    let chain = Arc::new(MockChain::new());
    let test = TestFixture::with_database(
        chain.clone(),
        BadgeDatabase::create_in_memory().unwrap(),
        TestFixture::fast_config(),
    );

    let transfer = chain.transfer(addr(0xcc), addr(0x01), addr(0xbb), ether(15));
    test.deliver(&transfer).await;
    let request = test.store().dequeue_next().await.unwrap().expect("queued request");
    let tx_hash = chain
        .submit_mint(&MintCall::from_request(&request))
        .await
        .unwrap();
    test.store().mark_submitted(request.id, tx_hash).await.unwrap();

    chain.script_confirmations([Confirmation::Timeout]);
    let outcomes = test.engine.submitter().recover_submitted().await.unwrap();
    assert!(matches!(outcomes[0], SubmissionOutcome::Retrying { .. }));

    let request = test.store().read_request(request.id).await.unwrap();
    assert_eq!(request.status, MintStatus::Pending);
    assert_eq!(request.retry_count, 1);
    assert!(test.badges(addr(0xbb)).await.is_empty());
}
