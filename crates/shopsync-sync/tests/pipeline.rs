//! End-to-end tests for `Syncer::run` with both the Storefront API and the
//! content lake served by `wiremock`.

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopsync_core::MetafieldKey;
use shopsync_sanity::{SanityClient, StoreOptions};
use shopsync_shopify::{ClientOptions, ShopifyClient};
use shopsync_sync::{SyncError, SyncOptions, SyncRequest, Syncer};

const GRAPHQL_PATH: &str = "/api/2024-01/graphql.json";
const QUERY_PATH: &str = "/v2024-01-01/data/query/production";
const MUTATE_PATH: &str = "/v2024-01-01/data/mutate/production";

struct Harness {
    shopify: MockServer,
    sanity: MockServer,
}

impl Harness {
    async fn start() -> Self {
        Self {
            shopify: MockServer::start().await,
            sanity: MockServer::start().await,
        }
    }

    fn syncer(&self, metafields: Vec<MetafieldKey>) -> Syncer {
        let shopify = ShopifyClient::with_base_url(
            &self.shopify.uri(),
            "storefront-token",
            "2024-01",
            &ClientOptions {
                timeout_secs: 5,
                user_agent: "shopsync-test/0.1".to_owned(),
                max_retries: 0,
                backoff_base_ms: 0,
            },
        )
        .expect("shopify client");
        let sanity = SanityClient::with_base_url(
            &self.sanity.uri(),
            "production",
            "sanity-token",
            "2024-01-01",
            &StoreOptions {
                timeout_secs: 5,
                user_agent: "shopsync-test/0.1".to_owned(),
            },
        )
        .expect("sanity client");
        Syncer::new(
            shopify,
            sanity,
            SyncOptions {
                metafields,
                ..SyncOptions::default()
            },
        )
    }

    async fn mount_seo(&self) {
        Mock::given(method("POST"))
            .and(path(GRAPHQL_PATH))
            .and(body_string_contains("ProductSeo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "product": { "seo": { "title": null, "description": null } } }
            })))
            .mount(&self.shopify)
            .await;
    }

    async fn mount_drafts(&self, found: Value) {
        Mock::given(method("POST"))
            .and(path(QUERY_PATH))
            .and(body_string_contains("_id in $ids"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": found })))
            .mount(&self.sanity)
            .await;
    }

    async fn mount_children(&self, rows: Value) {
        Mock::given(method("POST"))
            .and(path(QUERY_PATH))
            .and(body_string_contains("store.productId in $productIds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": rows })))
            .mount(&self.sanity)
            .await;
    }

    async fn mount_mutate(&self, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(MUTATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transactionId": "tx-1",
                "results": []
            })))
            .expect(expected_calls)
            .mount(&self.sanity)
            .await;
    }

    /// Every `mutations` array posted to the content lake, in order.
    async fn committed(&self) -> Vec<Vec<Value>> {
        self.sanity
            .received_requests()
            .await
            .expect("request recording enabled")
            .iter()
            .filter(|req| req.url.path() == MUTATE_PATH)
            .map(|req| {
                let body: Value = serde_json::from_slice(&req.body).expect("mutate body");
                body["mutations"].as_array().cloned().unwrap_or_default()
            })
            .collect()
    }
}

fn product(variant_ids: &[u32]) -> Value {
    product_with_id(100, variant_ids)
}

fn product_with_id(product_id: u32, variant_ids: &[u32]) -> Value {
    let variants: Vec<Value> = variant_ids
        .iter()
        .map(|id| {
            json!({
                "id": format!("gid://shopify/ProductVariant/{id}"),
                "title": format!("Variant {id}"),
                "price": "10.00"
            })
        })
        .collect();
    json!({
        "id": format!("gid://shopify/Product/{product_id}"),
        "title": "Wool Hat",
        "handle": "wool-hat",
        "tags": ["wool"],
        "variants": variants
    })
}

fn request(body: Value) -> SyncRequest {
    serde_json::from_value(body).expect("sync request")
}

fn patch_targets(mutations: &[Value]) -> Vec<&str> {
    mutations
        .iter()
        .filter_map(|m| m["patch"]["id"].as_str())
        .collect()
}

fn created_ids(mutations: &[Value]) -> Vec<&str> {
    mutations
        .iter()
        .filter_map(|m| m["createIfNotExists"]["_id"].as_str())
        .collect()
}

fn deleted_ids(mutations: &[Value]) -> Vec<&str> {
    mutations
        .iter()
        .filter_map(|m| m["delete"]["id"].as_str())
        .collect()
}

fn patch_for<'a>(mutations: &'a [Value], id: &str) -> &'a Value {
    mutations
        .iter()
        .find(|m| m["patch"]["id"] == id)
        .unwrap_or_else(|| panic!("no patch for {id}"))
}

#[tokio::test]
async fn existing_draft_receives_same_store_as_published() {
    let harness = Harness::start().await;
    harness.mount_seo().await;
    harness.mount_children(json!([])).await;
    harness
        .mount_drafts(json!(["drafts.shopifyProduct-100"]))
        .await;
    harness.mount_mutate(1).await;

    let summary = harness
        .syncer(Vec::new())
        .run(request(json!({ "action": "update", "products": [product(&[1])] })))
        .await
        .expect("sync");
    assert_eq!(summary.products, 1);
    assert_eq!(summary.variants, 1);
    assert_eq!(summary.transaction_id.as_deref(), Some("tx-1"));

    let commits = harness.committed().await;
    assert_eq!(commits.len(), 1, "one transaction per request");
    let mutations = &commits[0];

    let published = patch_for(mutations, "shopifyProduct-100");
    let draft = patch_for(mutations, "drafts.shopifyProduct-100");
    assert_eq!(published["patch"]["set"]["store"], draft["patch"]["set"]["store"]);
    assert_eq!(published["patch"]["set"]["store"]["title"], "Wool Hat");

    // Only published ids are ever created.
    assert!(created_ids(mutations).iter().all(|id| !id.starts_with("drafts.")));
}

#[tokio::test]
async fn missing_draft_is_never_created() {
    let harness = Harness::start().await;
    harness.mount_seo().await;
    harness.mount_children(json!([])).await;
    harness.mount_drafts(json!([])).await;
    harness.mount_mutate(1).await;

    harness
        .syncer(Vec::new())
        .run(request(json!({ "action": "create", "products": [product(&[1])] })))
        .await
        .expect("sync");

    let commits = harness.committed().await;
    let mutations = &commits[0];
    assert_eq!(
        created_ids(mutations),
        vec!["shopifyProductVariant-1", "shopifyProduct-100"]
    );
    assert!(patch_targets(mutations).iter().all(|id| !id.starts_with("drafts.")));
}

#[tokio::test]
async fn variant_missing_from_payload_is_tombstoned() {
    let harness = Harness::start().await;
    harness.mount_seo().await;
    harness
        .mount_children(json!([
            { "_id": "shopifyProductVariant-1", "productId": "100" },
            { "_id": "shopifyProductVariant-2", "productId": "100" }
        ]))
        .await;
    harness
        .mount_drafts(json!(["drafts.shopifyProductVariant-2"]))
        .await;
    harness.mount_mutate(1).await;

    let summary = harness
        .syncer(Vec::new())
        .run(request(json!({ "action": "sync", "products": [product(&[1])] })))
        .await
        .expect("sync");
    assert_eq!(summary.tombstoned_variants, 1);

    let commits = harness.committed().await;
    let mutations = &commits[0];
    for id in ["shopifyProductVariant-2", "drafts.shopifyProductVariant-2"] {
        assert_eq!(
            patch_for(mutations, id)["patch"]["set"]["store.isDeleted"],
            true,
            "{id} should be tombstoned"
        );
    }
    let v1 = patch_for(mutations, "shopifyProductVariant-1");
    assert!(v1["patch"]["set"].get("store.isDeleted").is_none());
    assert!(deleted_ids(mutations).is_empty(), "variants are never physically deleted");
}

#[tokio::test]
async fn rerun_with_same_input_commits_identical_mutations() {
    let harness = Harness::start().await;
    harness.mount_seo().await;
    harness.mount_children(json!([])).await;
    harness.mount_drafts(json!([])).await;
    harness.mount_mutate(2).await;

    let syncer = harness.syncer(Vec::new());
    let body = json!({ "action": "update", "products": [product(&[1, 2])] });
    syncer.run(request(body.clone())).await.expect("first run");
    syncer.run(request(body)).await.expect("second run");

    let commits = harness.committed().await;
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0], commits[1]);
}

#[tokio::test]
async fn metafield_failure_aborts_before_any_write() {
    let harness = Harness::start().await;
    harness.mount_seo().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("ProductMetafield"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.shopify)
        .await;
    harness.mount_mutate(0).await;

    let metafields = vec![MetafieldKey {
        namespace: "custom".to_owned(),
        key: "fabric".to_owned(),
    }];
    let err = harness
        .syncer(metafields)
        .run(request(json!({ "action": "update", "products": [product(&[1])] })))
        .await
        .expect_err("metafield failure must fail the request");
    assert!(matches!(err, SyncError::UpstreamFetchFailure(_)), "got {err:?}");
}

#[tokio::test]
async fn one_failing_product_aborts_the_whole_batch() {
    let harness = Harness::start().await;
    harness.mount_seo().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("ProductMetafield"))
        .and(body_partial_json(json!({ "variables": { "id": "gid://shopify/Product/200" } })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.shopify)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains("ProductMetafield"))
        .and(body_partial_json(json!({ "variables": { "id": "gid://shopify/Product/100" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "product": { "metafield": { "value": "merino", "type": "single_line_text_field" } } }
        })))
        .mount(&harness.shopify)
        .await;
    harness.mount_children(json!([])).await;
    harness.mount_drafts(json!([])).await;
    harness.mount_mutate(0).await;

    let metafields = vec![MetafieldKey {
        namespace: "custom".to_owned(),
        key: "fabric".to_owned(),
    }];
    let err = harness
        .syncer(metafields)
        .run(request(json!({
            "action": "sync",
            "products": [product_with_id(100, &[1]), product_with_id(200, &[2])]
        })))
        .await
        .expect_err("second product's metafield failure must fail the batch");
    assert!(matches!(err, SyncError::UpstreamFetchFailure(_)), "got {err:?}");
    assert!(harness.committed().await.is_empty());
}

#[tokio::test]
async fn null_variant_list_syncs_product_alone() {
    let harness = Harness::start().await;
    harness.mount_seo().await;
    harness.mount_children(json!([])).await;
    harness.mount_drafts(json!([])).await;
    harness.mount_mutate(1).await;

    let summary = harness
        .syncer(Vec::new())
        .run(request(json!({
            "action": "update",
            "products": [{
                "id": "gid://shopify/Product/100",
                "title": "Wool Hat",
                "images": null,
                "variants": null
            }]
        })))
        .await
        .expect("sync");
    assert_eq!(summary.products, 1);
    assert_eq!(summary.variants, 0);
}

#[tokio::test]
async fn run_future_can_be_spawned() {
    let harness = Harness::start().await;
    harness.mount_mutate(0).await;

    let syncer = harness.syncer(Vec::new());
    let handle = tokio::spawn(async move {
        syncer
            .run(request(json!({ "action": "sync", "products": [], "collections": [] })))
            .await
    });
    let summary = handle.await.expect("task joined").expect("empty sync");
    assert_eq!(summary.mutations, 0);
}

#[tokio::test]
async fn collections_are_upserted_with_draft_awareness() {
    let harness = Harness::start().await;
    harness
        .mount_drafts(json!(["drafts.shopifyCollection-7"]))
        .await;
    harness.mount_mutate(1).await;

    let summary = harness
        .syncer(Vec::new())
        .run(request(json!({
            "action": "update",
            "collections": [{ "id": "gid://shopify/Collection/7", "title": "Winter", "handle": "winter" }]
        })))
        .await
        .expect("sync");
    assert_eq!(summary.collections, 1);

    let commits = harness.committed().await;
    let mutations = &commits[0];
    assert_eq!(created_ids(mutations), vec!["shopifyCollection-7"]);
    assert_eq!(
        patch_targets(mutations),
        vec!["shopifyCollection-7", "drafts.shopifyCollection-7"]
    );
}

#[tokio::test]
async fn delete_removes_both_copies_and_tombstones_children() {
    let harness = Harness::start().await;
    harness
        .mount_children(json!([
            { "_id": "shopifyProductVariant-1", "productId": "100" }
        ]))
        .await;
    harness.mount_drafts(json!([])).await;
    harness.mount_mutate(1).await;

    let summary = harness
        .syncer(Vec::new())
        .run(request(json!({
            "action": "delete",
            "productIds": ["gid://shopify/Product/100"],
            "collectionIds": ["gid://shopify/Collection/7"]
        })))
        .await
        .expect("delete");
    assert_eq!(summary.products, 1);
    assert_eq!(summary.collections, 1);
    assert_eq!(summary.tombstoned_variants, 1);

    let commits = harness.committed().await;
    let mutations = &commits[0];
    assert_eq!(
        deleted_ids(mutations),
        vec![
            "shopifyProduct-100",
            "drafts.shopifyProduct-100",
            "shopifyCollection-7",
            "drafts.shopifyCollection-7"
        ]
    );
    assert_eq!(patch_targets(mutations), vec!["shopifyProductVariant-1"]);
}

#[tokio::test]
async fn unknown_action_is_rejected_without_io() {
    let harness = Harness::start().await;
    harness.mount_mutate(0).await;

    let err = harness
        .syncer(Vec::new())
        .run(request(json!({ "action": "archive" })))
        .await
        .expect_err("unknown action");
    assert!(matches!(err, SyncError::InvalidAction(ref a) if a == "archive"));
    assert!(err.is_client_error());
    assert!(harness.sanity.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn delete_without_ids_is_invalid_request() {
    let harness = Harness::start().await;
    harness.mount_mutate(0).await;

    let err = harness
        .syncer(Vec::new())
        .run(request(json!({ "action": "delete", "productIds": [] })))
        .await
        .expect_err("empty delete");
    assert!(matches!(err, SyncError::InvalidRequest(_)));
}

#[tokio::test]
async fn malformed_delete_id_fails_before_any_write() {
    let harness = Harness::start().await;
    harness.mount_mutate(0).await;

    let err = harness
        .syncer(Vec::new())
        .run(request(json!({ "action": "delete", "productIds": ["gid://shopify/Product/"] })))
        .await
        .expect_err("malformed id");
    assert!(matches!(err, SyncError::MalformedIdentifier(_)));
}

#[tokio::test]
async fn empty_batch_commits_nothing() {
    let harness = Harness::start().await;
    harness.mount_mutate(0).await;

    let summary = harness
        .syncer(Vec::new())
        .run(request(json!({ "action": "sync", "products": [], "collections": [] })))
        .await
        .expect("empty sync");
    assert_eq!(summary.mutations, 0);
    assert!(summary.transaction_id.is_none());
}
