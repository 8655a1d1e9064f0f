//! End-to-end tests against a live mutual-TLS listener.

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use homebase_api::DistributionServer;
use homebase_config::ServerSettings;
use homebase_test_support::pki::{SERVER_DNS_NAME, TestPki};
use homebase_tls::{ClientAuthPolicy, ClientTlsOptions, ServerTlsOptions, build_client_config};
use reqwest::{Client, StatusCode};

fn settings(pki: &TestPki, upload_root: &Path, file_root: Option<&Path>) -> ServerSettings {
    ServerSettings {
        host: SERVER_DNS_NAME.to_string(),
        bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        tls: ServerTlsOptions {
            ca_cert: Some(pki.ca_cert.clone()),
            cert: pki.server_cert.clone(),
            key: pki.server_key.clone(),
            client_auth: ClientAuthPolicy::RequireAndVerifyClientCert,
        },
        file_root: file_root.map(Path::to_path_buf),
        upload_root: upload_root.to_path_buf(),
        shutdown_grace: Duration::from_secs(1),
        request_timeout: Duration::from_secs(10),
    }
}

fn client(pki: &TestPki, addr: SocketAddr, identity: Option<(&Path, &Path)>) -> Result<Client> {
    let tls = build_client_config(&ClientTlsOptions {
        ca_cert: pki.ca_cert.clone(),
        identity: identity.map(|(cert, key)| (cert.to_path_buf(), key.to_path_buf())),
        skip_hostname_verification: false,
    })?;
    Ok(Client::builder()
        .use_preconfigured_tls(tls)
        .resolve(SERVER_DNS_NAME, addr)
        .timeout(Duration::from_secs(10))
        .build()?)
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("https://{SERVER_DNS_NAME}:{}{path}", addr.port())
}

#[tokio::test]
async fn upload_round_trip_over_mutual_tls() -> Result<()> {
    let pki = TestPki::generate()?;
    let root = tempfile::tempdir()?;
    let server = DistributionServer::start(&settings(&pki, root.path(), None)).await?;
    let addr = server.local_addr();
    let client = client(&pki, addr, Some((&pki.client_cert, &pki.client_key)))?;

    let status = client.get(url(addr, "/")).send().await?;
    assert_eq!(status.status(), StatusCode::OK);
    assert_eq!(status.json::<String>().await?, "OK");

    let payload = b"Write-Output 'hello'\r\n".to_vec();
    let response = client
        .post(url(addr, "/upload"))
        .query(&[("directory", "a/b"), ("filename", "c.txt")])
        .body(payload.clone())
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(reqwest::header::CONTENT_TYPE).is_none());
    assert_eq!(
        response.text().await?,
        format!("{} bytes received.\n", payload.len())
    );
    assert_eq!(fs::read(root.path().join("a").join("b").join("c.txt"))?, payload);

    let traversal = client
        .post(url(addr, "/upload"))
        .query(&[("directory", "../outside"), ("filename", "x.txt")])
        .body("x")
        .send()
        .await?;
    assert_eq!(traversal.status(), StatusCode::BAD_REQUEST);
    assert!(!root.path().parent().is_some_and(|p| p.join("outside").exists()));

    let wrong_method = client.put(url(addr, "/upload/a.txt")).body("x").send().await?;
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        wrong_method
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );

    server.stop().await?;
    Ok(())
}

#[tokio::test]
async fn untrusted_and_anonymous_clients_are_refused() -> Result<()> {
    let pki = TestPki::generate()?;
    let root = tempfile::tempdir()?;
    let server = DistributionServer::start(&settings(&pki, root.path(), None)).await?;
    let addr = server.local_addr();

    let foreign = client(
        &pki,
        addr,
        Some((&pki.foreign_client_cert, &pki.foreign_client_key)),
    )?;
    assert!(foreign.get(url(addr, "/")).send().await.is_err());

    let anonymous = client(&pki, addr, None)?;
    assert!(anonymous.get(url(addr, "/")).send().await.is_err());

    server.stop().await?;
    Ok(())
}

#[tokio::test]
async fn file_server_mode_serves_uploads_back() -> Result<()> {
    let pki = TestPki::generate()?;
    let files = tempfile::tempdir()?;
    let unused_upload_root = tempfile::tempdir()?;
    let server = DistributionServer::start(&settings(
        &pki,
        unused_upload_root.path(),
        Some(files.path()),
    ))
    .await?;
    let addr = server.local_addr();
    let client = client(&pki, addr, Some((&pki.client_cert, &pki.client_key)))?;

    let upload = client
        .post(url(addr, "/upload/bundle.zip"))
        .body("PK-archive")
        .send()
        .await?;
    assert_eq!(upload.status(), StatusCode::OK);
    assert!(files.path().join("bundle.zip").is_file());
    assert!(fs::read_dir(unused_upload_root.path())?.next().is_none());

    let fetched = client.get(url(addr, "/files/bundle.zip")).send().await?;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(fetched.text().await?, "PK-archive");

    server.stop().await?;
    Ok(())
}

#[tokio::test]
async fn missing_ca_bundle_fails_at_startup() -> Result<()> {
    let pki = TestPki::generate()?;
    let root = tempfile::tempdir()?;
    let mut settings = settings(&pki, root.path(), None);
    settings.tls.ca_cert = Some(root.path().join("absent-ca.crt"));

    let result = DistributionServer::start(&settings).await;

    assert!(matches!(result, Err(homebase_api::ServerError::Tls { .. })));
    Ok(())
}
