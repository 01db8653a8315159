mod harness;

use harness::mock_registry::{MockRegistry, RegistryFixture};
use harness::server::TestServer;

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let registry = MockRegistry::start(RegistryFixture::default()).await.unwrap();
    let server = TestServer::start_with(&registry, |config| config).await.unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn health_endpoint_can_be_disabled() {
    let registry = MockRegistry::start(RegistryFixture::default()).await.unwrap();
    let server = TestServer::start_with(&registry, |config| config.without_health())
        .await
        .unwrap();

    let resp = server.client().get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
}
