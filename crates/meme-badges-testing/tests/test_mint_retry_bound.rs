use meme_badges_engine::SubmissionOutcome;
use meme_badges_testing::{addr, ether, MintStatus, TestFixture};

/// Test the retry bound for failing mints
///
/// With `max_retries = 3` a request whose broadcast keeps failing is
/// attempted three times, then parked as `Failed` and never sent again.
///
/// **Test flow:**
/// 1. Queue a WhaleCaller mint and make every broadcast fail
/// 2. Sweep three times
/// 3. Verify the request is terminally failed after three attempts
/// 4. Verify further sweeps leave it alone
/// 5. Verify the pair can be queued again once it is resolved as failed
#[tokio::test]
async fn test_mint_retry_bound() {
    let test = TestFixture::new();
    let whale = addr(0xbb);

    // 1. Queue, fail everything
    let transfer = test.chain.transfer(addr(0xcc), addr(0x01), whale, ether(12));
    test.deliver(&transfer).await;
    test.chain.fail_next_submissions(u32::MAX);

    // 2. Three attempts
    let mut outcomes = Vec::new();
    for _ in 0..3 {
        outcomes.extend(test.sweep().await);
    }
    assert!(matches!(outcomes[0], SubmissionOutcome::Retrying { .. }));
    assert!(matches!(outcomes[1], SubmissionOutcome::Retrying { .. }));
    assert!(matches!(outcomes[2], SubmissionOutcome::Failed { .. }));

    // 3. Terminal
    let request = test.store().read_request(outcomes[2].request().id).await.unwrap();
    assert_eq!(request.status, MintStatus::Failed);
    assert_eq!(request.retry_count, 3);
    assert!(request
        .last_error
        .as_deref()
        .is_some_and(|e| e.contains("nonce too low")));

    println!(
        "✅ Request {} failed after {} attempts: {:?}",
        request.id, request.retry_count, request.last_error
    );

    // 4. No more attempts
    assert!(test.sweep().await.is_empty());
    assert!(test.chain.mint_calls().is_empty());

    // 5. A failed request no longer blocks the pair
    test.chain.fail_next_submissions(0);
    let replay = test.deliver(&transfer).await;
    assert_eq!(replay.len(), 1);
    test.sweep().await;
    assert_eq!(test.badges(whale).await.len(), 1);

    println!("✅ Re-queued mint succeeded once the chain recovered");
}
