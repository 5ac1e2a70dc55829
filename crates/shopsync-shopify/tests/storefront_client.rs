//! Integration tests for `ShopifyClient` against a `wiremock` Storefront API.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopsync_shopify::{ClientOptions, ShopifyClient, ShopifyError};

const GRAPHQL_PATH: &str = "/api/2024-01/graphql.json";
const PRODUCT_GID: &str = "gid://shopify/Product/1";

fn test_client(server: &MockServer, max_retries: u32) -> ShopifyClient {
    let options = ClientOptions {
        timeout_secs: 5,
        user_agent: "shopsync-test/0.1".to_owned(),
        max_retries,
        backoff_base_ms: 0,
    };
    ShopifyClient::with_base_url(&server.uri(), "storefront-token", "2024-01", &options)
        .expect("failed to build test ShopifyClient")
}

#[tokio::test]
async fn product_metafield_returns_value_and_sends_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("X-Shopify-Storefront-Access-Token", "storefront-token"))
        .and(body_partial_json(json!({
            "variables": { "id": PRODUCT_GID, "namespace": "custom", "key": "material" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "product": { "metafield": { "value": "wool", "type": "single_line_text_field" } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 0);
    let metafield = client
        .product_metafield(PRODUCT_GID, "custom", "material")
        .await
        .expect("metafield query");

    let metafield = metafield.expect("metafield should be present");
    assert_eq!(metafield.value, "wool");
    assert_eq!(metafield.kind.as_deref(), Some("single_line_text_field"));
}

#[tokio::test]
async fn product_metafield_missing_is_none_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "product": { "metafield": null } }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server, 0);
    let result = client.product_metafield(PRODUCT_GID, "custom", "nope").await;
    assert!(matches!(result, Ok(None)), "got: {result:?}");
}

#[tokio::test]
async fn product_seo_returns_none_for_unknown_product() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "product": null }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server, 0);
    let result = client.product_seo(PRODUCT_GID).await;
    assert!(matches!(result, Ok(None)), "got: {result:?}");
}

#[tokio::test]
async fn product_seo_parses_title_and_description() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "product": { "seo": { "title": "Warm Hat", "description": null } } }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server, 0);
    let seo = client
        .product_seo(PRODUCT_GID)
        .await
        .expect("seo query")
        .expect("seo present");
    assert_eq!(seo.title.as_deref(), Some("Warm Hat"));
    assert!(seo.description.is_none());
}

#[tokio::test]
async fn graphql_errors_surface_as_graphql_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Invalid global id" }, { "message": "second" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.product_seo(PRODUCT_GID).await.unwrap_err();
    match err {
        ShopifyError::GraphQl { messages, .. } => {
            assert_eq!(messages, "Invalid global id; second");
        }
        other => panic!("expected GraphQl error, got: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_status_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, 3);
    let err = client.product_seo(PRODUCT_GID).await.unwrap_err();
    assert!(
        matches!(err, ShopifyError::UnexpectedStatus { status: 401, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn rate_limited_requests_are_retried_until_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server, 2);
    let err = client.product_seo(PRODUCT_GID).await.unwrap_err();
    assert!(
        matches!(err, ShopifyError::RateLimited { retry_after_secs: 0 }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server, 0);
    let err = client.product_seo(PRODUCT_GID).await.unwrap_err();
    assert!(matches!(err, ShopifyError::Deserialize { .. }), "got: {err:?}");
}
