//! End-to-end tests against a real listener.

#![allow(clippy::panic)]

use std::net::SocketAddr;

use lobby_gateway::api::build_app;
use lobby_gateway::api::dto::LobbyResponse;
use lobby_gateway::app_state::AppState;
use lobby_gateway::config::GatewayConfig;
use reqwest::StatusCode;

async fn spawn_gateway() -> (String, AppState) {
    let config = GatewayConfig::default();
    let state = AppState::from_config(&config);
    let app = build_app(state.clone(), &config);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn peers_discover_each_other_and_leave() {
    let (base, state) = spawn_gateway().await;
    let client = reqwest::Client::new();

    let Ok(response) = client.put(format!("{base}/arena-1/7777")).send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    let Ok(body) = response.json::<LobbyResponse>().await else {
        panic!("invalid body");
    };
    assert_eq!(body.ip, "127.0.0.1");
    assert_eq!(body.lobby.members.len(), 1);

    // Same host, second game port: a distinct member.
    let Ok(response) = client.put(format!("{base}/arena-1/7778")).send().await else {
        panic!("request failed");
    };
    let Ok(body) = response.json::<LobbyResponse>().await else {
        panic!("invalid body");
    };
    let mut ports: Vec<u16> = body.lobby.members.iter().map(|m| m.port).collect();
    ports.sort_unstable();
    assert_eq!(ports, vec![7777, 7778]);

    let Ok(response) = client.delete(format!("{base}/arena-1/7777")).send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), StatusCode::OK);

    let Ok(response) = client.delete(format!("{base}/arena-1/7778")).send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let Ok(response) = client.get(format!("{base}/arena-1/7777")).send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(state.lobby_service.registry().is_empty().await);
}

#[tokio::test]
async fn health_endpoint_is_served() {
    let (base, _) = spawn_gateway().await;
    let Ok(response) = reqwest::get(format!("{base}/health")).await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}
