//! Socket and channel wrappers driven through an in-memory transport.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{MockPresence, MockSocket};
use jwp_client::auth::ParamProvider;
use jwp_client::{
    connect, ClientConfig, ErrorKind, FileBackend, JwpError, KeyValueBackend, LogLevel, Logger,
    MemoryBackend, ProtocolError, Socket,
};
use serde_json::{json, Value};

fn config_with_memory() -> (ClientConfig, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    (ClientConfig::new().with_storage(backend.clone()), backend)
}

fn socket_params() -> Value {
    json!({"app_id": "a1", "auth": "t1"})
}

// =============================================================================
// Socket authentication
// =============================================================================

#[tokio::test]
async fn connect_fixes_params_then_delegates_once() {
    let socket = connect(MockSocket::default(), socket_params(), ClientConfig::new())
        .await
        .unwrap();

    assert_eq!(socket.transport().params(), Some(socket_params()));
    assert_eq!(socket.transport().connect_count(), 1);
    assert_eq!(socket.identity().unwrap().app_id, "a1");

    socket.connect().await.unwrap();
    assert_eq!(socket.transport().connect_count(), 2);
}

#[tokio::test]
async fn every_reconnect_negotiates_fresh_credentials() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let provider = ParamProvider::from_async(move |ctx: Value| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
            assert_eq!(ctx, json!({"auth_type": "socket"}));
            Ok(json!({"app_id": "a1", "auth": format!("t{n}")}))
        }
    });

    let socket = Socket::new(MockSocket::default(), provider, ClientConfig::new()).unwrap();
    socket.connect().await.unwrap();
    socket.connect().await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        socket.transport().params(),
        Some(json!({"app_id": "a1", "auth": "t2"}))
    );
}

#[tokio::test]
async fn missing_or_null_socket_params_fail_before_connecting() {
    let err = Socket::new(MockSocket::default(), None::<Value>, ClientConfig::new())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = Socket::new(MockSocket::default(), Value::Null, ClientConfig::new())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn invalid_socket_identity_never_reaches_transport() {
    for params in [json!({"auth": "t1"}), json!({"app_id": "a1"}), json!({"app_id": "a1", "auth": 3})] {
        let socket = Socket::new(MockSocket::default(), params, ClientConfig::new()).unwrap();
        let err = socket.connect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(socket.transport().connect_count(), 0);
        assert_eq!(socket.transport().params(), None);
        assert!(socket.identity().is_none());
    }
}

#[tokio::test]
async fn rejected_socket_negotiation_surfaces_server_message() {
    let provider = ParamProvider::from_async(|_ctx| async {
        Err::<Value, _>(JwpError::from(ProtocolError::Rejected("denied".into())))
    });
    let socket = Socket::new(MockSocket::default(), provider, ClientConfig::new()).unwrap();

    let err = socket.connect().await.unwrap_err();
    assert_eq!(err.to_string(), "denied");
    assert_eq!(socket.transport().connect_count(), 0);
}

#[tokio::test]
async fn disconnect_is_delegated_and_keeps_identity() {
    let socket = connect(MockSocket::default(), socket_params(), ClientConfig::new())
        .await
        .unwrap();

    socket.disconnect().await.unwrap();
    assert_eq!(socket.transport().disconnect_count(), 1);
    assert_eq!(socket.transport().connect_count(), 1);
    assert_eq!(socket.identity().unwrap().app_id, "a1");
}

#[tokio::test]
async fn transport_connect_failure_is_returned() {
    let transport = MockSocket::default();
    *transport.fail_connect.lock() = Some("refused".into());
    let socket = Socket::new(transport, socket_params(), ClientConfig::new()).unwrap();

    let err = socket.connect().await.unwrap_err();
    assert_eq!(err, JwpError::Transport("refused".into()));
}

// =============================================================================
// Channel join
// =============================================================================

#[tokio::test]
async fn join_payload_carries_history_and_channel_auth() {
    let (config, backend) = config_with_memory();
    backend.set_item("jsp_msgid__jwp:a1:room", "42".into()).unwrap();
    let socket = connect(MockSocket::default(), socket_params(), config).await.unwrap();

    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
    assert_eq!(channel.topic(), "__temporary__");

    channel.join().await.unwrap();
    assert_eq!(channel.topic(), "jwp:a1:room");
    assert_eq!(
        channel.transport().sent(),
        vec![(
            "jwp:a1:room".to_string(),
            json!({"last_message_id": 42, "auth": "t2"})
        )]
    );
}

#[tokio::test]
async fn rejoin_reads_current_history_and_renegotiates() {
    let (config, _backend) = config_with_memory();
    let socket = connect(MockSocket::default(), socket_params(), config).await.unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let provider = ParamProvider::sync(move |ctx| {
        assert_eq!(ctx, &json!({"auth_type": "channel", "channel_name": "room"}));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"auth": "t2"}))
    });
    let channel = socket.channel("room", provider).unwrap();

    socket.history().set("jwp:a1:room", &json!(42));
    channel.join().await.unwrap();
    socket.history().set("jwp:a1:room", &json!(43));
    channel.join().await.unwrap();

    let ids: Vec<Value> = channel
        .transport()
        .sent()
        .into_iter()
        .map(|(_, payload)| payload["last_message_id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(42), json!(43)]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn join_without_history_backend_sends_null_id() {
    let socket = connect(MockSocket::default(), socket_params(), ClientConfig::new())
        .await
        .unwrap();
    let channel = socket.channel("room", json!({"auth": "t2", "role": "reader"})).unwrap();

    let payload = channel.join_payload().await.unwrap();
    assert_eq!(
        payload,
        json!({"last_message_id": null, "auth": "t2", "role": "reader"})
    );
}

#[tokio::test]
async fn rejected_channel_negotiation_sends_nothing() {
    let socket = connect(MockSocket::default(), socket_params(), ClientConfig::new())
        .await
        .unwrap();
    let provider = ParamProvider::from_async(|_ctx| async {
        Err::<Value, _>(JwpError::from(ProtocolError::Rejected("denied".into())))
    });
    let channel = socket.channel("room", provider).unwrap();

    let err = channel.join().await.unwrap_err();
    assert_eq!(err.to_string(), "denied");
    assert!(channel.transport().sent().is_empty());
    assert_eq!(channel.topic(), "__temporary__");
}

#[tokio::test]
async fn channel_without_auth_fails_validation() {
    let socket = connect(MockSocket::default(), socket_params(), ClientConfig::new())
        .await
        .unwrap();
    let channel = socket.channel("room", json!({"token": "t2"})).unwrap();

    let err = channel.join().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(channel.transport().sent().is_empty());
    assert_eq!(channel.topic(), "__temporary__");
}

#[tokio::test]
async fn joining_before_connect_fails_validation() {
    let socket = Socket::new(MockSocket::default(), socket_params(), ClientConfig::new()).unwrap();
    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();

    let err = channel.join().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(channel.transport().sent().is_empty());
}

#[tokio::test]
async fn missing_or_null_channel_params_fail_synchronously() {
    let socket = Socket::new(MockSocket::default(), socket_params(), ClientConfig::new()).unwrap();
    assert_eq!(
        socket.channel("room", None::<Value>).unwrap_err().kind(),
        ErrorKind::Configuration
    );
    assert_eq!(
        socket.channel("room", Value::Null).unwrap_err().kind(),
        ErrorKind::Configuration
    );
}

#[tokio::test]
async fn leave_is_delegated_without_sending_a_join() {
    let socket = connect(MockSocket::default(), socket_params(), ClientConfig::new())
        .await
        .unwrap();
    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
    channel.join().await.unwrap();

    channel.leave().await.unwrap();
    assert_eq!(channel.transport().leave_count(), 1);
    assert_eq!(channel.transport().sent().len(), 1);
    assert_eq!(channel.topic(), "jwp:a1:room");
    assert_eq!(channel.name(), "room");
}

#[tokio::test]
async fn custom_namespace_prefixes_topic() {
    let socket = connect(
        MockSocket::default(),
        socket_params(),
        ClientConfig::new().with_namespace("tenant"),
    )
    .await
    .unwrap();
    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
    channel.join().await.unwrap();
    assert_eq!(channel.topic(), "tenant:a1:room");
}

// =============================================================================
// Inbound messages & resumption
// =============================================================================

#[tokio::test]
async fn enveloped_message_updates_history_and_is_unwrapped() {
    let (config, _backend) = config_with_memory();
    let socket = connect(MockSocket::default(), socket_params(), config).await.unwrap();
    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
    channel.join().await.unwrap();

    let forwarded = channel
        .transport()
        .deliver("msg", json!({"tid": 7, "data": {"x": 1}}));
    assert_eq!(forwarded, json!({"x": 1}));
    assert_eq!(socket.history().get("jwp:a1:room"), Some(json!(7)));

    channel.join().await.unwrap();
    let (_, payload) = channel.transport().sent().pop().unwrap();
    assert_eq!(payload["last_message_id"], json!(7));
}

#[tokio::test]
async fn plain_message_is_forwarded_unchanged() {
    let (config, backend) = config_with_memory();
    let socket = connect(MockSocket::default(), socket_params(), config).await.unwrap();
    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
    channel.join().await.unwrap();

    let forwarded = channel.transport().deliver("msg", json!({"body": "hi"}));
    assert_eq!(forwarded, json!({"body": "hi"}));
    assert!(backend.is_empty());
}

#[tokio::test]
async fn history_survives_a_restart_with_file_backend() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    {
        let backend = Arc::new(FileBackend::open(&path).unwrap());
        let config = ClientConfig::new().with_storage(backend);
        let socket = connect(MockSocket::default(), socket_params(), config).await.unwrap();
        let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
        channel.join().await.unwrap();
        channel
            .transport()
            .deliver("msg", json!({"tid": 9, "data": null}));
    }

    let backend = Arc::new(FileBackend::open(&path).unwrap());
    let config = ClientConfig::new().with_storage(backend);
    let socket = connect(MockSocket::default(), socket_params(), config).await.unwrap();
    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
    channel.join().await.unwrap();

    let (_, payload) = channel.transport().sent().pop().unwrap();
    assert_eq!(payload["last_message_id"], json!(9));
}

// =============================================================================
// Presence & diagnostics
// =============================================================================

#[tokio::test]
async fn presence_is_delegated_to_the_transport_channel() {
    let socket = connect(MockSocket::default(), socket_params(), ClientConfig::new())
        .await
        .unwrap();
    let channel = socket.channel("room", json!({"auth": "t2"})).unwrap();
    channel.join().await.unwrap();

    assert_eq!(
        channel.presence(),
        MockPresence {
            topic: "jwp:a1:room".into()
        }
    );
}

#[tokio::test]
async fn enable_debug_turns_on_logging_for_the_socket() {
    let logger = Logger::memory(LogLevel::Off);
    let config = ClientConfig::new().with_logger(logger.clone());
    let socket = Socket::new(MockSocket::default(), socket_params(), config).unwrap();

    socket.connect().await.unwrap();
    assert!(logger.entries().is_empty());

    socket.enable_debug();
    socket.connect().await.unwrap();
    assert!(logger
        .entries()
        .iter()
        .any(|entry| entry.message.contains("socket params")));
}
