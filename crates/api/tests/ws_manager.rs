//! Tests for `WsManager`, exercised directly without HTTP upgrades.

use axum::extract::ws::Message;
use docflow_api::ws::{FeedMessage, WsManager};

fn text(msg: Message) -> serde_json::Value {
    match msg {
        Message::Text(t) => serde_json::from_str(t.as_str()).expect("feed message is JSON"),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn add_and_remove_track_connections() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _a = manager.add("conn-a".to_string(), 1).await;
    let _b = manager.add("conn-b".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("missing").await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-a").await;
    assert_eq!(manager.get_by_user(1).await, vec!["conn-b".to_string()]);
}

#[tokio::test]
async fn send_to_user_reaches_every_tab_of_that_user_only() {
    let manager = WsManager::new();
    let mut tab1 = manager.add("t1".to_string(), 7).await;
    let mut tab2 = manager.add("t2".to_string(), 7).await;
    let mut stranger = manager.add("s".to_string(), 8).await;

    let msg = FeedMessage::new("notification.created", serde_json::json!({ "id": 3 }));
    let delivered = manager.send_to_user(7, msg.to_ws_message()).await;

    assert_eq!(delivered, 2);
    for rx in [&mut tab1, &mut tab2] {
        let json = text(rx.try_recv().expect("message delivered"));
        assert_eq!(json["type"], "notification.created");
        assert_eq!(json["data"]["id"], 3);
        assert!(json["timestamp"].is_string());
    }
    assert!(stranger.try_recv().is_err());
}

#[tokio::test]
async fn send_to_user_without_connections_delivers_nothing() {
    let manager = WsManager::new();
    let _rx = manager.add("c".to_string(), 1).await;

    let delivered = manager
        .send_to_user(2, FeedMessage::new("x", serde_json::Value::Null).to_ws_message())
        .await;

    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn broadcast_reaches_all_connections() {
    let manager = WsManager::new();
    let mut a = manager.add("a".to_string(), 1).await;
    let mut b = manager.add("b".to_string(), 2).await;

    let sent = manager
        .broadcast(FeedMessage::new("templates.changed", serde_json::json!({})).to_ws_message())
        .await;

    assert_eq!(sent, 2);
    assert_eq!(text(a.try_recv().expect("a receives"))["type"], "templates.changed");
    assert_eq!(text(b.try_recv().expect("b receives"))["type"], "templates.changed");
}

#[tokio::test]
async fn broadcast_skips_closed_receivers() {
    let manager = WsManager::new();
    let closed = manager.add("closed".to_string(), 1).await;
    drop(closed);
    let mut open = manager.add("open".to_string(), 2).await;

    manager
        .broadcast(FeedMessage::new("templates.changed", serde_json::json!({})).to_ws_message())
        .await;

    assert!(open.try_recv().is_ok());
}

#[tokio::test]
async fn ping_all_sends_ping_frames() {
    let manager = WsManager::new();
    let mut rx = manager.add("c".to_string(), 1).await;

    manager.ping_all().await;

    assert!(matches!(rx.try_recv(), Ok(Message::Ping(_))));
}

#[tokio::test]
async fn shutdown_closes_and_clears() {
    let manager = WsManager::new();
    let mut rx = manager.add("c".to_string(), 1).await;

    manager.shutdown_all().await;

    assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
    assert_eq!(manager.connection_count().await, 0);
}
