//! WebSocket lifecycle integration tests.
//!
//! Tests the connection lifecycle against a mock realtime server:
//! - Connection establishment
//! - FIFO flush of commands queued while disconnected
//! - Tick flow into the price store
//! - Reconnect on abnormal close, no reconnect on normal close

mod integration;
use integration::common::mock_ws::MockWsServer;

use pulse_core::PriceTick;
use pulse_feed::PriceStore;
use pulse_ws::{ConnectionConfig, ConnectionManager, ConnectionState, OutboundCommand};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn fast_config(url: String) -> ConnectionConfig {
    ConnectionConfig {
        url,
        initial_backoff_ms: 100,
        max_backoff_ms: 1_000,
    }
}

fn spawn_manager(
    config: ConnectionConfig,
) -> (Arc<ConnectionManager>, mpsc::Receiver<Vec<PriceTick>>) {
    let (tick_tx, tick_rx) = mpsc::channel(100);
    (Arc::new(ConnectionManager::new(config, tick_tx)), tick_rx)
}

async fn wait_for_state(manager: &ConnectionManager, want: ConnectionState) {
    let reached = timeout(Duration::from_secs(2), async {
        loop {
            if manager.state() == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "should reach state {want} within timeout");
}

async fn wait_for_messages(server: &MockWsServer, count: usize) -> Vec<String> {
    let received = timeout(Duration::from_secs(2), async {
        loop {
            let messages = server.received_messages().await;
            if messages.len() >= count {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    received.unwrap_or_else(|_| panic!("should receive {count} messages within timeout"))
}

#[tokio::test]
async fn test_connects_to_server() {
    let server = MockWsServer::start().await;
    let (manager, _tick_rx) = spawn_manager(fast_config(server.url()));

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.connect(Some("test-token")).await })
    };

    wait_for_state(&manager, ConnectionState::Connected).await;
    assert_eq!(server.connection_count().await, 1);

    manager.teardown();
    let result = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    server.shutdown().await;
}

#[tokio::test]
async fn test_queued_commands_flush_in_fifo_order() {
    let server = MockWsServer::start().await;
    let (manager, _tick_rx) = spawn_manager(fast_config(server.url()));
    let handle = manager.handle();

    // Issued before any connection exists: must queue, not fail.
    handle.send(OutboundCommand::subscribe("AAPL")).unwrap();
    handle.send(OutboundCommand::subscribe("TSLA")).unwrap();
    assert_eq!(manager.pending_commands(), 2);

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.connect(Some("test-token")).await })
    };

    wait_for_state(&manager, ConnectionState::Connected).await;

    // A command issued after the open goes out behind the flushed queue.
    handle.send(OutboundCommand::UnsubscribeAll).unwrap();

    let messages = wait_for_messages(&server, 3).await;
    assert!(messages[0].contains("AAPL"));
    assert!(messages[1].contains("TSLA"));
    assert!(messages[2].contains("unsubscribe_all"));
    assert_eq!(manager.pending_commands(), 0);

    manager.teardown();
    let _ = timeout(Duration::from_secs(2), task).await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_ticks_flow_into_price_store() {
    let server = MockWsServer::start().await;
    let (manager, tick_rx) = spawn_manager(fast_config(server.url()));
    let store = Arc::new(PriceStore::new());
    let writer = tokio::spawn(store.clone().run_writer(tick_rx));

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.connect(Some("test-token")).await })
    };
    wait_for_state(&manager, ConnectionState::Connected).await;

    server.send_text(
        r#"[{"stock_ticker": "AAPL", "ltp": 189.75, "day_change": "-0.42"}]"#,
    );

    let stored = timeout(Duration::from_secs(2), async {
        loop {
            if let Some(tick) = store.get("AAPL") {
                return tick;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("tick should reach the store within timeout");
    assert_eq!(stored.last_traded_price.inner(), dec!(189.75));

    // A garbage frame must not kill the connection.
    server.send_text("not json at all");
    server.send_text(r#"[{"stock_ticker": "TSLA", "ltp": "244.10", "day_change": 1.8}]"#);

    let stored = timeout(Duration::from_secs(2), async {
        loop {
            if let Some(tick) = store.get("TSLA") {
                return tick;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("later ticks should still arrive after a garbage frame");
    assert_eq!(stored.last_traded_price.inner(), dec!(244.10));

    manager.teardown();
    let _ = timeout(Duration::from_secs(2), task).await;
    drop(manager);
    let _ = timeout(Duration::from_secs(2), writer).await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_reconnects_after_abnormal_close() {
    let server = MockWsServer::start().await;
    let (manager, _tick_rx) = spawn_manager(fast_config(server.url()));

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.connect(Some("test-token")).await })
    };
    wait_for_state(&manager, ConnectionState::Connected).await;

    // Server failure: internal error close code.
    server.close_all(1011);

    let reconnected = timeout(Duration::from_secs(3), async {
        loop {
            if server.connection_count().await >= 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(reconnected.is_ok(), "should reconnect after abnormal close");

    manager.teardown();
    let _ = timeout(Duration::from_secs(2), task).await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_normal_close_does_not_reconnect() {
    let server = MockWsServer::start().await;
    let (manager, _tick_rx) = spawn_manager(fast_config(server.url()));

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.connect(Some("test-token")).await })
    };
    wait_for_state(&manager, ConnectionState::Connected).await;

    server.close_all(1000);

    // connect() returns instead of scheduling a reconnect.
    let result = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    // Give a would-be reconnect timer time to fire; none should.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(server.connection_count().await, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_commands_survive_reconnect() {
    let server = MockWsServer::start().await;
    let (manager, _tick_rx) = spawn_manager(fast_config(server.url()));
    let handle = manager.handle();

    let task = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.connect(Some("test-token")).await })
    };
    wait_for_state(&manager, ConnectionState::Connected).await;

    server.close_all(1011);

    // While the socket is down, commands queue instead of erroring.
    let queued = timeout(Duration::from_secs(2), async {
        loop {
            if manager.state() != ConnectionState::Connected {
                handle.send(OutboundCommand::subscribe("MSFT")).unwrap();
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(queued.is_ok(), "should observe the disconnect");

    // After the reconnect the queued subscribe reaches the server.
    let messages = timeout(Duration::from_secs(3), async {
        loop {
            let messages = server.received_messages().await;
            if messages.iter().any(|m| m.contains("MSFT")) {
                return messages;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(messages.is_ok(), "queued command should flush after reconnect");

    manager.teardown();
    let _ = timeout(Duration::from_secs(2), task).await;
    server.shutdown().await;
}
