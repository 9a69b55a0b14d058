use backoff::ExponentialBackoff;
use meme_badges_chain::{EventReader, ReaderConfig};
use meme_badges_db::BadgeDatabase;
use meme_badges_engine::engine_channel;
use meme_badges_testing::{
    addr, creator, ether, launched_token, BadgeKind, MockChain, TestFixture,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Test the running service: reader, automation loop and sweeps together
///
/// The reader polls the mock chain through a few failed head queries,
/// forwards events over a bounded channel, and the loop's periodic sweep
/// mints everything without any direct calls from the test.
///
/// **Test flow:**
/// 1. Start the reader and the loop against the mock chain
/// 2. Launch a token and send a large transfer
/// 3. Wait until the ledger holds all three badges
/// 4. Shut down and verify both tasks stop cleanly
/// 5. Verify the cursor reached the last event's block
#[tokio::test]
async fn test_automation_loop_end_to_end() {
    let chain = Arc::new(MockChain::new());
    let config = TestFixture::fast_config();
    let test = TestFixture::with_database(
        chain.clone(),
        BadgeDatabase::create_in_memory().unwrap(),
        config.clone(),
    );

    // 1. Start
    chain.fail_next_head_queries(2);
    let reader = EventReader::new(
        chain.clone(),
        ReaderConfig {
            poll_interval: Duration::from_millis(10),
            max_block_range: 2,
            start_block: Some(1),
            retry_backoff: ExponentialBackoff {
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(5),
                max_elapsed_time: None,
                ..Default::default()
            },
        },
    );

    let (events_tx, events_rx) = mpsc::channel(config.event_buffer);
    let (handle, inputs_rx) = engine_channel(config.event_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reader_task = tokio::spawn(reader.run(events_tx, shutdown_rx.clone()));
    let engine_task = tokio::spawn(test.engine.clone().run(events_rx, inputs_rx, shutdown_rx));

    // 2. Chain activity
    chain.launch_token(creator(), launched_token(), ether(2));
    let transfer = chain.transfer(addr(0xcc), addr(0x01), addr(0xbb), ether(15));
    handle.check_badges(addr(0xdd), None);

    // 3. Wait for the sweeps
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if test.store().count_badges().await.unwrap() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("all badges should be minted");

    println!("✅ Loop minted {} badges", test.chain.mint_calls().len());

    // 4. Shutdown
    shutdown_tx.send(true).unwrap();
    reader_task.await.unwrap().unwrap();
    engine_task.await.unwrap().unwrap();

    // 5. Cursor
    let cursor = test.store().read_cursor().await.unwrap();
    assert_eq!(cursor, Some(transfer.block_number()));

    assert!(chain.holds_on_chain(creator(), BadgeKind::TokenCreator));
    assert!(chain.holds_on_chain(creator(), BadgeKind::LaunchMaster));
    assert!(chain.holds_on_chain(addr(0xbb), BadgeKind::WhaleCaller));
    assert!(test.badges(addr(0xdd)).await.is_empty());

    println!("✅ Reader and loop stopped cleanly at block {:?}", cursor);
}
