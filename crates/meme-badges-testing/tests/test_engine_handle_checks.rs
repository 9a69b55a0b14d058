use meme_badges_engine::engine_channel;
use meme_badges_testing::{creator, ether, launched_token, BadgeKind, TestFixture};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Test manual checks sent to a running loop through its handle
///
/// The token launch is never delivered as an event. A check sent through
/// the `EngineHandle` alone must get the creator's badges evaluated, queued
/// and minted by the loop's own sweeps.
///
/// **Test flow:**
/// 1. Start the loop with an idle event channel
/// 2. Launch a token on the chain without delivering the event
/// 3. Send a check for the creator through the handle
/// 4. Wait until both creator badges are minted, then shut down
#[tokio::test]
async fn test_engine_handle_checks() {
    let test = TestFixture::new();
    let config = test.engine.config().clone();

    // 1. Start
    let (_events_tx, events_rx) = mpsc::channel(config.event_buffer);
    let (handle, inputs_rx) = engine_channel(config.event_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine_task = tokio::spawn(test.engine.clone().run(events_rx, inputs_rx, shutdown_rx));

    // 2-3. Launch and check
    test.chain.launch_token(creator(), launched_token(), ether(2));
    handle.check_badges(creator(), Some(launched_token()));

    // 4. Wait for the sweeps
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if test.store().count_badges().await.unwrap() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("handle check should lead to minted badges");

    shutdown_tx.send(true).unwrap();
    engine_task.await.unwrap().unwrap();

    assert!(test.chain.holds_on_chain(creator(), BadgeKind::TokenCreator));
    assert!(test.chain.holds_on_chain(creator(), BadgeKind::LaunchMaster));
    assert_eq!(test.chain.mint_calls().len(), 2);

    println!("✅ Handle check minted {} badges", test.chain.mint_calls().len());
}
