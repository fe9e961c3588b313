//! Serialization tests for feed request types and wire names.

use perpboard::models::{Channel, ConnectionState, Method, SubscribeRequest, UnsubscribeRequest};

#[test]
fn test_channel_as_str_returns_correct_wire_names() {
    assert_eq!(Channel::TokenTrade.as_str(), "tokenTrade");
}

#[test]
fn test_method_as_str_returns_correct_wire_names() {
    assert_eq!(Method::SubscribeTokenTrade.as_str(), "subscribeTokenTrade");
    assert_eq!(Method::UnsubscribeTokenTrade.as_str(), "unsubscribeTokenTrade");
}

#[test]
fn test_subscribe_request_serializes() {
    let keys = vec!["MintAddress111".to_string()];
    let request = SubscribeRequest::new(&keys);

    let json = serde_json::to_string(&request).expect("Failed to serialize subscribe request");
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("Failed to parse serialized JSON");

    assert_eq!(
        value,
        serde_json::json!({ "method": "subscribeTokenTrade", "keys": ["MintAddress111"] })
    );
}

#[test]
fn test_unsubscribe_request_serializes() {
    let keys = vec!["MintA".to_string(), "MintB".to_string()];
    let request = UnsubscribeRequest::new(&keys);

    let json = serde_json::to_string(&request).expect("Failed to serialize unsubscribe request");
    let value: serde_json::Value =
        serde_json::from_str(&json).expect("Failed to parse serialized JSON");

    assert_eq!(value["method"], "unsubscribeTokenTrade");
    assert_eq!(value["keys"][0], "MintA");
    assert_eq!(value["keys"][1], "MintB");
}

#[test]
fn test_connection_state_names() {
    let states = [
        (ConnectionState::Idle, "idle"),
        (ConnectionState::Connecting, "connecting"),
        (ConnectionState::Connected, "connected"),
        (ConnectionState::Closed, "closed"),
        (ConnectionState::Errored, "errored"),
    ];

    for (state, name) in states {
        assert_eq!(state.as_str(), name);
        assert_eq!(state.to_string(), name);
        assert_eq!(serde_json::to_value(state).expect("serialize"), name);
    }
    assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    assert!(ConnectionState::Closed.is_terminal());
    assert!(ConnectionState::Errored.is_terminal());
    assert!(!ConnectionState::Connected.is_terminal());
}
