//! Shared utilities for integration tests.

use frame_proxy::config::ProxyConfig;
use frame_proxy::store::MemoryStore;
use frame_proxy::{HttpServer, Shutdown};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use wiremock::MockServer;

/// A proxy running on an ephemeral port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<ProxyConfig>,
    pub client: reqwest::Client,
}

#[allow(dead_code)]
impl RunningProxy {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    /// Path and query of a proxy URL minted by this proxy.
    pub fn local_path(&self, proxy_url: &str) -> String {
        proxy_url
            .strip_prefix(&format!("http://{}", self.addr))
            .unwrap_or(proxy_url)
            .to_string()
    }

    /// Register `frame_url` and return its entry URL.
    pub async fn wrap(&self, frame_url: &str, api_key: &str, region: &str) -> String {
        let res = self
            .client
            .post(self.url("/api/frames"))
            .json(&json!({ "url": frame_url, "apiKey": api_key, "region": region }))
            .send()
            .await
            .expect("proxy unreachable");
        assert_eq!(res.status(), 200);
        res.text().await.unwrap()
    }
}

/// Config pointing every collaborator at mock servers.
pub fn config(analytics: &MockServer, hub: &MockServer) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.analytics.us_endpoint = analytics.uri();
    config.analytics.eu_endpoint = analytics.uri();
    config.hub.url = hub.uri();
    config.timeouts.origin_secs = 2;
    config.timeouts.hub_secs = 2;
    config.timeouts.analytics_secs = 2;
    config
}

/// Start the proxy with `config`; `public_url` is set to the bound address.
pub async fn spawn_proxy(mut config: ProxyConfig) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.proxy.public_url = format!("http://{}", addr);

    let store = Arc::new(MemoryStore::new(None));
    let server = HttpServer::new(config, store.clone()).expect("pipeline builds");
    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    RunningProxy {
        addr,
        store,
        shutdown,
        config_tx,
        client,
    }
}

/// A signed-action envelope as frame clients send it.
#[allow(dead_code)]
pub fn action_payload(fid: u64, button_index: u32) -> Value {
    json!({
        "untrustedData": {
            "fid": fid,
            "url": "https://example.com",
            "messageHash": "0xd2b1",
            "timestamp": 1706243218,
            "network": 1,
            "buttonIndex": button_index,
            "castId": { "fid": 226, "hash": "0xa48dd46161d8e57725f5e26e34ec19c13ff7f3b9" }
        },
        "trustedData": { "messageBytes": "0a0b0c" }
    })
}

/// Minimal frame document posting to `post_url` with `labels` as buttons.
#[allow(dead_code)]
pub fn frame_html(post_url: &str, labels: &[&str]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html><head>\n\
         <meta property=\"fc:frame\" content=\"vNext\"/>\n\
         <meta property=\"fc:frame:image\" content=\"https://example.com/img.png\"/>\n",
    );
    html.push_str(&format!("<meta property=\"fc:frame:post_url\" content=\"{}\"/>\n", post_url));
    for (i, label) in labels.iter().enumerate() {
        html.push_str(&format!("<meta property=\"fc:frame:button:{}\" content=\"{}\"/>\n", i + 1, label));
    }
    html.push_str("</head><body></body></html>");
    html
}
