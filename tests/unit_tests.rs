use serde_json::json;
use shelly_panel::shelly::response::{BatchResponse, ErrorBody};
use shelly_panel::shelly::rpc::{build_request, RpcCall};
use shelly_panel::shelly::state::{extract_output_state, normalize_state, STATE_PATHS};
use shelly_panel::{
    Action, DeviceAuth, DeviceDescriptor, DeviceSet, DeviceState, DispatchMode, ErrorClass,
    ErrorCode, PanelConfig, PanelError, WebConfig, DEFAULT_WEB_PORT,
};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// Test web configuration defaults and builders
#[test]
fn test_web_config() {
    let config = WebConfig::default();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, DEFAULT_WEB_PORT);
    assert!(!config.enable_cors);
    assert!(config.static_path.is_none());

    let custom = WebConfig::new("127.0.0.1", 9000)
        .with_cors(true)
        .with_static_path(Some("./dashboard".to_string()));
    assert_eq!(custom.bind_address(), "127.0.0.1:9000");
    assert!(custom.enable_cors);
    assert_eq!(custom.static_path.as_deref(), Some("./dashboard"));
}

/// Test loading a configuration file from disk
#[test]
fn test_config_load_from_file() {
    let path = std::env::temp_dir().join(format!("shelly_panel_test_{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
            [server]
            port = 8181
            enable_cors = true

            [rpc]
            connect_timeout_ms = 1000
            max_in_flight = 2

            [[devices]]
            id = "porch_light"
            label = "Porch"
            host = "http://192.168.0.20"
            auth_key = "abc"
        "#,
    )
    .expect("Should write config file");

    let config = PanelConfig::load(Some(path.as_path()));
    std::fs::remove_file(&path).ok();
    let config = assert_ok!(config);

    assert_eq!(config.web.port, 8181);
    assert!(config.web.enable_cors);
    assert_eq!(config.rpc.connect_timeout, Duration::from_secs(1));
    assert_eq!(config.rpc.dispatch, DispatchMode::Auto);
    assert_eq!(config.rpc.dispatch_options().max_in_flight, 2);

    let porch = config.devices.get("porch_light").expect("Should find device");
    assert_eq!(porch.display_label(), "Porch");
    assert_eq!(porch.auth, DeviceAuth::Bearer { token: "abc".into() });
}

#[test]
fn test_config_errors() {
    let missing = PanelConfig::load(Some("/nonexistent/shelly_panel.toml".as_ref()));
    assert!(matches!(missing, Err(PanelError::Io(_))));

    let malformed = PanelConfig::from_toml_str("[server\nport = 1");
    assert!(matches!(malformed, Err(PanelError::ConfigParse(_))));

    let zero_timeout = PanelConfig::from_toml_str("[rpc]\nrequest_timeout_ms = 0");
    assert!(matches!(zero_timeout, Err(PanelError::Config(_))));

    assert_ok!(PanelConfig::load(None));
}

/// Test error taxonomy tags and classes
#[test]
fn test_error_codes() {
    let cases = [
        (ErrorCode::MissingHost, "missing_host", ErrorClass::Configuration),
        (ErrorCode::InvalidHost, "invalid_host", ErrorClass::Configuration),
        (ErrorCode::InvalidAuth, "invalid_auth", ErrorClass::Configuration),
        (ErrorCode::Transport("timed out".into()), "transport_error", ErrorClass::Upstream),
        (ErrorCode::Http { status: 404 }, "http_error", ErrorClass::Upstream),
        (ErrorCode::JsonDecode("eof".into()), "json_decode_error", ErrorClass::Upstream),
        (ErrorCode::InvalidAction("spin".into()), "invalid_action", ErrorClass::Validation),
        (ErrorCode::DeviceNotFound("x".into()), "device_not_found", ErrorClass::NotFound),
        (ErrorCode::MissingCapability("x".into()), "missing_capability", ErrorClass::Capability),
    ];

    for (code, tag, class) in cases {
        assert_eq!(code.tag(), tag);
        assert_eq!(code.class(), class);
        assert!(code.to_string().starts_with(tag));
    }
}

#[test]
fn test_device_set_rejects_duplicates() {
    let devices = vec![
        DeviceDescriptor::new("boiler", "", "http://10.0.0.5"),
        DeviceDescriptor::new("boiler", "", "http://10.0.0.6"),
    ];
    assert_err!(DeviceSet::new(devices));
}

#[test]
fn test_action_parsing() {
    assert_eq!(assert_ok!(" Toggle ".parse::<Action>()), Action::Toggle);
    assert_eq!(assert_ok!("OFF".parse::<Action>()), Action::Off);
    assert_eq!(
        assert_err!("spin".parse::<Action>()),
        ErrorCode::InvalidAction("spin".into())
    );
    assert_err!("".parse::<Action>());
}

/// Test state normalization across firmware answer shapes
#[test]
fn test_state_normalization() {
    assert_eq!(STATE_PATHS.len(), 6);
    assert_eq!(STATE_PATHS[0].name, "output");

    assert_eq!(normalize_state(&json!({"output": true})), DeviceState::On);
    assert_eq!(normalize_state(&json!({"ison": "off"})), DeviceState::Off);
    assert_eq!(normalize_state(&json!({"state": 1})), DeviceState::On);
    assert_eq!(
        normalize_state(&json!({"switch:0": {"on": "false"}})),
        DeviceState::Off
    );
    assert_eq!(normalize_state(&json!({"apower": 3.2})), DeviceState::Unknown);
    assert_eq!(normalize_state(&json!([true])), DeviceState::Unknown);

    // earlier paths win over later ones
    assert_eq!(
        extract_output_state(&json!({"output": false, "ison": true})),
        Some(false)
    );
}

#[test]
fn test_request_construction() {
    let device = DeviceDescriptor::new("gate", "Gate", "http://192.168.0.11/")
        .with_relay_id(2)
        .with_auth(DeviceAuth::Bearer { token: "t0k".into() });

    let request = assert_ok!(build_request(&device, &RpcCall::set(Action::Off)));
    assert_eq!(request.url.as_str(), "http://192.168.0.11/rpc/Switch.Set");
    assert_eq!(request.headers["authorization"], "Bearer t0k");
    assert_eq!(request.headers["content-type"], "application/json");

    let body: serde_json::Value = serde_json::from_slice(&request.body).expect("Should be JSON");
    assert_eq!(body, json!({"id": 2, "on": false}));

    let broken = DeviceDescriptor::new("gate", "Gate", "ftp://192.168.0.11");
    assert_eq!(
        assert_err!(build_request(&broken, &RpcCall::get_status())),
        ErrorCode::InvalidHost
    );
}

#[test]
fn test_auth_is_masked() {
    let auth = DeviceAuth::Basic {
        username: "admin".into(),
        password: "hunter2".into(),
    };
    assert!(!auth.describe().contains("hunter2"));
    assert!(!format!("{:?}", auth).contains("hunter2"));
    assert_eq!(DeviceAuth::default(), DeviceAuth::None);
}

#[test]
fn test_unavailable_batch_shape() {
    let value = serde_json::to_value(BatchResponse::unavailable(
        "missing_capability",
        "no HTTP client",
    ))
    .expect("Should serialize");

    assert_eq!(value["count"], 0);
    assert_eq!(value["hasErrors"], true);
    assert_eq!(value["devices"], json!([]));
    assert_eq!(value["error"], "missing_capability");
    assert_eq!(value["message"], "no HTTP client");

    let body = serde_json::to_value(ErrorBody::new("invalid_payload", "bad")).expect("Should serialize");
    assert_eq!(body, json!({"error": "invalid_payload", "message": "bad"}));
}
