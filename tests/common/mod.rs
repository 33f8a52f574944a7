#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use form_service::config::{AppConfig, Environment};
use form_service::database::{DatabaseManager, PgFormStore};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_form-service"));
        cmd.args(["serve", "--host", "127.0.0.1", "--port", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL / APP_ENV; it migrates on startup
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Whether the URL variable the server will read for its `APP_ENV` is set
fn database_configured() -> bool {
    // The server loads .env itself; load it here too so both agree
    let _ = dotenvy::dotenv();
    let var = Environment::from_env().database_url_var();
    if std::env::var(var).is_err() {
        eprintln!("skipping: {} is not set", var);
        return false;
    }
    true
}

/// Start the shared server, or `None` when no database is configured
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    if !database_configured() {
        return Ok(None);
    }
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(Some(server))
}

/// Store over the same database the server uses, migrated, or `None` when no
/// database is configured
pub async fn store() -> Result<Option<PgFormStore>> {
    if !database_configured() {
        return Ok(None);
    }
    let config = AppConfig::from_env();
    let database = DatabaseManager::connect(&config.database).await?;
    database.migrate().await?;
    Ok(Some(PgFormStore::new(database)))
}

/// `count` pseudo-random field ids. Unsorted and spread over the whole u32
/// range so the encoded text does not compress.
pub fn scattered_fields(count: usize) -> Vec<u32> {
    let mut x = (uuid::Uuid::new_v4().as_u128() as u32) | 1;
    (0..count)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x
        })
        .collect()
}

/// A title no other test run will have used
pub fn unique_title(prefix: &str) -> String {
    format!("{} {}", prefix, uuid::Uuid::new_v4().simple())
}

/// An owner id unlikely to collide with rows left by earlier runs
pub fn unique_owner() -> i64 {
    (uuid::Uuid::new_v4().as_u128() % 1_000_000_000) as i64 + 1_000_000
}
