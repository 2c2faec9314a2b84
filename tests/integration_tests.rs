// Session-level integration tests: handshake, election, gating, heartbeat,
// staleness, and the encrypted wire.

use lanbridge_integration_tests::{
    TestClient, device_msg, fast_timers, quiet_timers, spawn_daemon, wait_event, wait_restarted,
};
use lanbridge_core::UiEvent;
use lanbridge_core::apps::AppInventory;
use lanbridge_proto::{AppIconEntry, AppIcons, MacVolume, Message, PeerStatus, ToggleAppNotif};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Handshake
// ============================================================================

#[tokio::test]
async fn test_handshake_binds_primary_and_replies_mac_info() {
    let env = spawn_daemon(false, quiet_timers()).await;
    let mut events = env.daemon.subscribe();

    let mut client = TestClient::connect(&env).await;
    client.send_msg(&device_msg("Pixel", None)).await;

    // Exactly one macInfo reply with our advertised identity.
    let reply = client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;
    match reply {
        Message::MacInfo(info) => {
            assert_eq!(info.name, "test-desktop");
            assert!(!info.version.is_empty());
        }
        other => panic!("expected macInfo, got {}", other.kind()),
    }

    let paired = wait_event(&mut events, WAIT, |e| matches!(e, UiEvent::PeerPaired(_))).await;
    match paired {
        UiEvent::PeerPaired(peer) => assert_eq!(peer.name, "Pixel"),
        other => panic!("expected PeerPaired, got {other:?}"),
    }

    env.daemon.stop().await;
}

#[tokio::test]
async fn test_handshake_over_encrypted_wire() {
    let env = spawn_daemon(true, quiet_timers()).await;

    let mut client = TestClient::connect(&env).await;
    client.send_msg(&device_msg("Pixel", None)).await;

    let reply = client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;
    assert!(matches!(reply, Message::MacInfo(_)));

    env.daemon.stop().await;
}

#[tokio::test]
async fn test_plaintext_frame_dropped_on_encrypted_wire() {
    let env = spawn_daemon(true, quiet_timers()).await;
    let mut events = env.daemon.subscribe();

    let mut client = TestClient::connect(&env).await;
    // Well-formed JSON, but not sealed: must be dropped at the decode
    // boundary without touching state or the session.
    client
        .send_raw(r#"{"type":"device","data":{"name":"P","ipAddress":"127.0.0.1","port":1,"version":"2.0.0"}}"#)
        .await;

    lanbridge_integration_tests::assert_no_event(
        &mut events,
        Duration::from_millis(400),
        |e| matches!(e, UiEvent::PeerPaired(_)),
    )
    .await;

    // The session survives and a proper sealed handshake still works.
    client.send_msg(&device_msg("Pixel", None)).await;
    client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    env.daemon.stop().await;
}

// ============================================================================
// Election and gating
// ============================================================================

#[tokio::test]
async fn test_non_primary_session_is_mute() {
    let env = spawn_daemon(false, quiet_timers()).await;
    let mut events = env.daemon.subscribe();

    let mut primary = TestClient::connect(&env).await;
    primary.send_msg(&device_msg("Primary", None)).await;
    primary
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    // A rogue session sends a status frame: the daemon must not observe it.
    let mut rogue = TestClient::connect(&env).await;
    let status: PeerStatus = serde_json::from_str(
        r#"{"battery":{"level":1,"charging":false},"paired":true}"#,
    )
    .unwrap();
    rogue.send_msg(&Message::Status(status.clone())).await;

    lanbridge_integration_tests::assert_no_event(
        &mut events,
        Duration::from_millis(400),
        |e| matches!(e, UiEvent::PeerStatus(_)),
    )
    .await;

    // The same frame from the primary lands.
    primary.send_msg(&Message::Status(status)).await;
    wait_event(&mut events, WAIT, |e| matches!(e, UiEvent::PeerStatus(_))).await;

    env.daemon.stop().await;
}

#[tokio::test]
async fn test_private_target_preempts_public_primary() {
    let env = spawn_daemon(false, quiet_timers()).await;

    // Incumbent handshook declaring a non-private target address.
    let mut old = TestClient::connect(&env).await;
    old.send_msg(&device_msg("Old", Some("203.0.113.9"))).await;
    old.recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    // Newcomer declares a LAN target: it supersedes and the old session is
    // closed by the daemon.
    let mut new = TestClient::connect(&env).await;
    new.send_msg(&device_msg("New", Some("192.168.1.34"))).await;
    new.recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    old.wait_closed(WAIT).await;

    env.daemon.stop().await;
}

#[tokio::test]
async fn test_second_equal_handshake_is_ignored() {
    let env = spawn_daemon(false, quiet_timers()).await;
    let mut events = env.daemon.subscribe();

    let mut first = TestClient::connect(&env).await;
    first.send_msg(&device_msg("First", Some("192.168.1.34"))).await;
    first
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    let mut second = TestClient::connect(&env).await;
    second
        .send_msg(&device_msg("Second", Some("192.168.1.35")))
        .await;

    // No new pairing event; the first session stays primary.
    lanbridge_integration_tests::assert_no_event(
        &mut events,
        Duration::from_millis(400),
        |e| matches!(e, UiEvent::PeerPaired(p) if p.name == "Second"),
    )
    .await;

    env.daemon.stop().await;
}

// ============================================================================
// Heartbeat and staleness
// ============================================================================

#[tokio::test]
async fn test_heartbeat_pings_primary() {
    let env = spawn_daemon(false, fast_timers()).await;

    let mut client = TestClient::connect(&env).await;
    client.send_msg(&device_msg("Pixel", None)).await;
    client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    // Respond to pings so the session stays fresh, and count a few.
    for _ in 0..3 {
        client
            .recv_until(WAIT, |m| matches!(m, Message::Ping {}))
            .await;
        client.send_msg(&Message::Pong {}).await;
    }

    env.daemon.stop().await;
}

#[tokio::test]
async fn test_silent_session_goes_stale_and_transport_restarts() {
    let env = spawn_daemon(false, fast_timers()).await;
    let mut events = env.daemon.subscribe();

    let mut client = TestClient::connect(&env).await;
    client.send_msg(&device_msg("Pixel", None)).await;
    client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    // Never answer pings: with stale_after at 400 ms the session must be
    // force-closed well before the 5 s ceiling.
    client.wait_closed(WAIT).await;

    // Peer-derived state is cleared and the transport comes back up.
    wait_event(&mut events, WAIT, |e| matches!(e, UiEvent::PeerUnpaired)).await;
    let port = wait_restarted(&mut events).await;

    // The restarted listener accepts a fresh handshake.
    let env2 = lanbridge_integration_tests::TestEnv { port, ..env };
    let mut again = TestClient::connect(&env2).await;
    again.send_msg(&device_msg("Pixel", None)).await;
    again
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    env2.daemon.stop().await;
}

#[tokio::test]
async fn test_primary_disconnect_restarts_transport() {
    let env = spawn_daemon(false, quiet_timers()).await;
    let mut events = env.daemon.subscribe();

    {
        let mut client = TestClient::connect(&env).await;
        client.send_msg(&device_msg("Pixel", None)).await;
        client
            .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
            .await;
        // Dropped here: clean client disconnect.
    }

    wait_event(&mut events, WAIT, |e| matches!(e, UiEvent::PeerUnpaired)).await;
    wait_restarted(&mut events).await;

    env.daemon.stop().await;
}

// ============================================================================
// Operator-sent messages
// ============================================================================

#[tokio::test]
async fn test_send_message_reaches_peer() {
    let env = spawn_daemon(false, quiet_timers()).await;

    let mut client = TestClient::connect(&env).await;
    client.send_msg(&device_msg("Pixel", None)).await;
    client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    env.handle
        .send_message(Message::MacVolume(MacVolume { volume: 40 }))
        .unwrap();

    let frame = client
        .recv_until(WAIT, |m| matches!(m, Message::MacVolume(_)))
        .await;
    match frame {
        Message::MacVolume(report) => assert_eq!(report.volume, 40),
        other => panic!("expected macVolume, got {}", other.kind()),
    }

    env.daemon.stop().await;
}

#[tokio::test]
async fn test_toggle_app_notif_syncs_local_inventory() {
    let env = spawn_daemon(false, quiet_timers()).await;
    let mut events = env.daemon.subscribe();

    let mut client = TestClient::connect(&env).await;
    client.send_msg(&device_msg("Pixel", None)).await;
    client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    // Peer announces one app with forwarding off.
    let mut icons = AppIcons::new();
    icons.insert(
        "com.example.chat".to_string(),
        AppIconEntry {
            name: "Chat".to_string(),
            icon: None,
            system_app: false,
            listening: false,
        },
    );
    client.send_msg(&Message::AppIcons(icons)).await;
    wait_event(&mut events, WAIT, |e| matches!(e, UiEvent::AppsUpdated { .. })).await;

    env.handle
        .send_message(Message::ToggleAppNotif(ToggleAppNotif {
            package: "com.example.chat".to_string(),
            state: true,
        }))
        .unwrap();

    // The peer hears about the toggle.
    let frame = client
        .recv_until(WAIT, |m| matches!(m, Message::ToggleAppNotif(_)))
        .await;
    match frame {
        Message::ToggleAppNotif(toggle) => {
            assert_eq!(toggle.package, "com.example.chat");
            assert!(toggle.state);
        }
        other => panic!("expected toggleAppNotif, got {}", other.kind()),
    }

    // The flag was flipped and persisted before the frame went out, so the
    // on-disk inventory already agrees.
    let inventory = AppInventory::load(env.data.path().join("icons")).unwrap();
    assert!(inventory.get("com.example.chat").unwrap().listening);

    env.daemon.stop().await;
}

// ============================================================================
// Clipboard and outbound plumbing
// ============================================================================

#[tokio::test]
async fn test_clipboard_roundtrip() {
    let env = spawn_daemon(true, quiet_timers()).await;
    let mut events = env.daemon.subscribe();

    let mut client = TestClient::connect(&env).await;
    client.send_msg(&device_msg("Pixel", None)).await;
    client
        .recv_until(WAIT, |m| matches!(m, Message::MacInfo(_)))
        .await;

    // Peer pushes clipboard text to us.
    client
        .send_msg(&Message::ClipboardUpdate(lanbridge_proto::ClipboardUpdate {
            text: "from peer".to_string(),
        }))
        .await;
    let event = wait_event(&mut events, WAIT, |e| {
        matches!(e, UiEvent::ClipboardReceived { .. })
    })
    .await;
    match event {
        UiEvent::ClipboardReceived { text } => assert_eq!(text, "from peer"),
        other => panic!("unexpected event {other:?}"),
    }

    // We push clipboard text to the peer.
    env.handle.send_clipboard("from desktop".to_string()).unwrap();
    let frame = client
        .recv_until(WAIT, |m| matches!(m, Message::ClipboardUpdate(_)))
        .await;
    match frame {
        Message::ClipboardUpdate(update) => assert_eq!(update.text, "from desktop"),
        other => panic!("unexpected frame {}", other.kind()),
    }

    env.daemon.stop().await;
}
