//! Integration test harness for Customer Vault.
//!
//! Boots real nodes on ephemeral local ports, each over its own temporary
//! data directory, and talks to them over HTTP.
//!
//! ```rust,ignore
//! let (cloud, local) = spawn_pair().await;
//! let resp = client()
//!     .get(local.url("/health"))
//!     .send()
//!     .await
//!     .unwrap();
//! assert_eq!(resp.status(), 200);
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use customer_vault_node::config::{NodeConfig, NodeRole};
use customer_vault_node::routes;
use customer_vault_node::state::AppState;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// How long eventual replication is given before a test fails.
pub const SYNC_DEADLINE: Duration = Duration::from_secs(10);

/// A node serving on a local port for the lifetime of the value.
pub struct TestNode {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    _dir: TempDir,
    server: JoinHandle<()>,
}

impl TestNode {
    /// Absolute URL for `path` on this node.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Bind an ephemeral port.
pub async fn bind() -> TcpListener {
    TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener")
}

/// Serve a node on `listener`, letting `configure` adjust its config.
pub async fn serve_node(
    listener: TcpListener,
    role: NodeRole,
    configure: impl FnOnce(&mut NodeConfig),
) -> TestNode {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = dir.path().join("customer_data");
    let addr = listener.local_addr().expect("Listener has no address");

    let mut config = NodeConfig::local_defaults(&data_dir);
    config.role = role;
    config.port = addr.port();
    configure(&mut config);

    let state = AppState::new(config).expect("Failed to initialize node state");
    let app = routes::app(state);
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestNode {
        addr,
        data_dir,
        _dir: dir,
        server,
    }
}

/// Start a standalone node with no peer.
pub async fn spawn_node(role: NodeRole) -> TestNode {
    serve_node(bind().await, role, |_| {}).await
}

/// Start a cloud node and a local node pointed at each other.
///
/// Returns `(cloud, local)`.
pub async fn spawn_pair() -> (TestNode, TestNode) {
    let cloud_listener = bind().await;
    let local_listener = bind().await;
    let cloud_addr = cloud_listener.local_addr().expect("Listener has no address");
    let local_addr = local_listener.local_addr().expect("Listener has no address");

    let cloud = serve_node(cloud_listener, NodeRole::Cloud, |config| {
        config.peer.sync_url = Some(parse_url(&format!("http://{local_addr}/upload-profile")));
        config.peer.fetch_url = Some(parse_url(&format!("http://{local_addr}/push-to-peer")));
    })
    .await;
    let local = serve_node(local_listener, NodeRole::Local, |config| {
        config.peer.sync_url = Some(parse_url(&format!("http://{cloud_addr}/upload-profile")));
        config.peer.fetch_url = Some(parse_url(&format!("http://{cloud_addr}/push-to-peer")));
    })
    .await;

    (cloud, local)
}

/// A plain HTTP client for talking to test nodes.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

/// Upload `image` as the `file` field.
pub async fn upload_profile(node: &TestNode, raw_id: &str, image: Vec<u8>) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(image)
        .file_name("upload.png")
        .mime_str("image/png")
        .expect("Invalid mime type");
    let form = reqwest::multipart::Form::new().part("file", part);

    client()
        .post(node.url(&format!("/upload-profile/{raw_id}")))
        .multipart(form)
        .send()
        .await
        .expect("Upload request failed")
}

/// Poll `node` until it serves a profile for `id` or the deadline passes.
pub async fn wait_for_profile(node: &TestNode, id: &str, deadline: Duration) -> Option<Vec<u8>> {
    let poll = async {
        loop {
            let resp = client()
                .get(node.url(&format!("/profile/{id}")))
                .send()
                .await
                .expect("Profile request failed");
            if resp.status().is_success() {
                return resp.bytes().await.expect("Failed to read profile").to_vec();
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    };
    tokio::time::timeout(deadline, poll).await.ok()
}

/// A small PNG.
#[must_use]
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let shade = |n: u32| u8::try_from((n * 16) % 256).unwrap_or(u8::MAX);
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb([shade(x), shade(y), 128]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out.into_inner()
}

fn parse_url(raw: &str) -> Url {
    Url::parse(raw).expect("Invalid test URL")
}
