//! Integration tests for the Dax HTTP and GraphQL API.
//!
//! Each test builds its own router over an in-memory database and drives it
//! with `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use dax_api::handlers::HealthResponse;
use dax_api::state::AppState;
use dax_api::{create_router, sdl};
use dax_core::config::DaxConfig;
use dax_storage::Database;

// =============================================================================
// Helpers
// =============================================================================

const TEST_TOKEN: &str = "test-token-12345";

/// Create a fresh AppState with an in-memory DB.
fn make_state() -> AppState {
    AppState::new(
        DaxConfig::default(),
        Database::in_memory().unwrap(),
        TEST_TOKEN.to_string(),
    )
}

/// Create a fresh router from a new state.
fn make_app() -> Router {
    create_router(make_state())
}

/// Build a POST request with auth header and JSON body.
fn authed_post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// Read full response body bytes.
async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

/// Execute a GraphQL operation and return the decoded response.
async fn gql(app: &Router, query: &str, variables: Value) -> Value {
    let body = json!({ "query": query, "variables": variables }).to_string();
    let resp = app
        .clone()
        .oneshot(authed_post_json("/query", &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

/// Assert the response has no errors and return its `data`.
fn data(resp: Value) -> Value {
    assert!(
        resp.get("errors").is_none(),
        "unexpected GraphQL errors: {}",
        resp["errors"]
    );
    resp["data"].clone()
}

/// `extensions.code` of the first error.
fn error_code(resp: &Value) -> &str {
    resp["errors"][0]["extensions"]["code"]
        .as_str()
        .unwrap_or_else(|| panic!("no error code in {}", resp))
}

async fn create_vault(app: &Router, name: &str) -> String {
    let resp = gql(
        app,
        "mutation($input: CreateVaultInput!) { createVault(input: $input) { id } }",
        json!({ "input": { "name": name } }),
    )
    .await;
    data(resp)["createVault"]["id"].as_str().unwrap().to_string()
}

async fn create_entry(app: &Router, vault_id: &str, heading: &str) -> Value {
    let resp = gql(
        app,
        "mutation($input: CreateEntryInput!) {
            createEntry(input: $input) { id heading createdAt updatedAt vault { id } }
        }",
        json!({ "input": { "vaultID": vault_id, "heading": heading } }),
    )
    .await;
    data(resp)["createEntry"].clone()
}

async fn create_user(app: &Router, username: &str, vault_ids: &[&str]) -> String {
    let resp = gql(
        app,
        "mutation($input: CreateUserInput!) { createUser(input: $input) { id } }",
        json!({ "input": { "username": username, "password": "pw", "vaultIDs": vault_ids } }),
    )
    .await;
    data(resp)["createUser"]["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Public endpoints (no auth required)
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let app = make_app();
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.schema_version, 1);
    assert_eq!(health.entries, 0);
}

#[tokio::test]
async fn test_health_counts_rows() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    create_entry(&app, &vault, "hello").await;

    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.vaults, 1);
    assert_eq!(health.entries, 1);
}

#[tokio::test]
async fn test_playground_served() {
    let app = make_app();
    let resp = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(html.contains("/query"));
}

#[tokio::test]
async fn test_playground_disabled() {
    let mut config = DaxConfig::default();
    config.server.playground = false;
    let state = AppState::new(
        config,
        Database::in_memory().unwrap(),
        TEST_TOKEN.to_string(),
    );
    let resp = create_router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_query_requires_auth() {
    let app = make_app();
    let resp = app
        .oneshot(
            Request::post("/query")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query":"{ __typename }"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_query_wrong_token() {
    let app = make_app();
    let resp = app
        .oneshot(
            Request::post("/query")
                .header("authorization", "Bearer nope")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query":"{ __typename }"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_query_with_token() {
    let app = make_app();
    let resp = gql(&app, "{ __typename }", json!({})).await;
    assert_eq!(data(resp)["__typename"], "QueryRoot");
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let app = make_app();
    let huge = format!(
        r#"{{"query":"{{ __typename }}","variables":{{"pad":"{}"}}}}"#,
        "x".repeat(2 * 1024 * 1024)
    );
    let resp = app
        .oneshot(authed_post_json("/query", &huge))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_create_user_and_sign_in() {
    let app = make_app();
    let vault = create_vault(&app, "journal").await;

    let resp = gql(
        &app,
        "mutation($input: CreateUserInput!) {
            createUser(input: $input) { id username settings vaults { id name } }
        }",
        json!({ "input": {
            "username": "greg",
            "password": "hunter2",
            "settings": { "theme": "dark" },
            "vaultIDs": [vault],
        }}),
    )
    .await;
    let user = data(resp)["createUser"].clone();
    assert_eq!(user["username"], "greg");
    assert_eq!(user["settings"]["theme"], "dark");
    assert_eq!(user["vaults"][0]["name"], "journal");
    assert!(user.get("hash").is_none());

    let sign_in = "mutation($u: String!, $p: String!) { signIn(username: $u, password: $p) { id } }";
    let resp = gql(&app, sign_in, json!({ "u": "greg", "p": "hunter2" })).await;
    assert_eq!(data(resp)["signIn"]["id"], user["id"]);

    let resp = gql(&app, sign_in, json!({ "u": "greg", "p": "wrong" })).await;
    assert_eq!(error_code(&resp), "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_duplicate_username_conflict() {
    let app = make_app();
    let create = "mutation($input: CreateUserInput!) { createUser(input: $input) { id } }";
    let input = json!({ "input": { "username": "greg", "password": "pw" } });

    data(gql(&app, create, input.clone()).await);
    let resp = gql(&app, create, input).await;
    assert_eq!(error_code(&resp), "CONFLICT");
}

#[tokio::test]
async fn test_create_user_empty_password() {
    let app = make_app();
    let resp = gql(
        &app,
        "mutation { createUser(input: { username: \"greg\", password: \"\" }) { id } }",
        json!({}),
    )
    .await;
    assert_eq!(error_code(&resp), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_update_user_edges() {
    let app = make_app();
    let a = create_vault(&app, "a").await;
    let b = create_vault(&app, "b").await;

    let resp = gql(
        &app,
        "mutation($input: CreateUserInput!) { createUser(input: $input) { id } }",
        json!({ "input": { "username": "greg", "password": "pw", "vaultIDs": [a] } }),
    )
    .await;
    let id = data(resp)["createUser"]["id"].as_str().unwrap().to_string();

    let resp = gql(
        &app,
        "mutation($id: ID!, $input: UpdateUserInput!) {
            updateUser(id: $id, input: $input) { username vaults { name } }
        }",
        json!({ "id": id, "input": {
            "username": "gregory",
            "addVaultIDs": [b],
            "removeVaultIDs": [a],
        }}),
    )
    .await;
    let user = data(resp)["updateUser"].clone();
    assert_eq!(user["username"], "gregory");
    assert_eq!(user["vaults"], json!([{ "name": "b" }]));

    let resp = gql(
        &app,
        "mutation($id: ID!) { deleteUser(id: $id) }",
        json!({ "id": id }),
    )
    .await;
    assert_eq!(data(resp)["deleteUser"], json!(id));

    let resp = gql(
        &app,
        "mutation($id: ID!) { deleteUser(id: $id) }",
        json!({ "id": id }),
    )
    .await;
    assert_eq!(error_code(&resp), "NOT_FOUND");
}

#[tokio::test]
async fn test_update_user_active_at() {
    let app = make_app();
    let id = create_user(&app, "greg", &[]).await;

    let resp = gql(
        &app,
        "mutation($id: ID!, $input: UpdateUserInput!) {
            updateUser(id: $id, input: $input) { activeAt }
        }",
        json!({ "id": id, "input": { "activeAt": "2020-01-01T00:00:00Z" } }),
    )
    .await;
    let active_at = data(resp)["updateUser"]["activeAt"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(active_at.starts_with("2020-01-01T00:00:00"), "got {}", active_at);

    let resp = gql(
        &app,
        "query($id: ID!) { node(id: $id) { ... on User { activeAt } } }",
        json!({ "id": id }),
    )
    .await;
    assert_eq!(data(resp)["node"]["activeAt"], json!(active_at));
}

// =============================================================================
// Vaults and entries
// =============================================================================

#[tokio::test]
async fn test_update_vault() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    create_vault(&app, "archive").await;
    let alice = create_user(&app, "alice", &[&vault]).await;
    let bob = create_user(&app, "bob", &[]).await;

    let update = "mutation($id: ID!, $input: UpdateVaultInput!) {
        updateVault(id: $id, input: $input) { name settings users { username } }
    }";

    let resp = gql(
        &app,
        update,
        json!({ "id": vault, "input": {
            "name": "notes",
            "settings": { "color": "teal" },
            "addUserIDs": [bob],
            "removeUserIDs": [alice],
        }}),
    )
    .await;
    let updated = data(resp)["updateVault"].clone();
    assert_eq!(updated["name"], "notes");
    assert_eq!(updated["settings"]["color"], "teal");
    assert_eq!(updated["users"], json!([{ "username": "bob" }]));

    let resp = gql(
        &app,
        update,
        json!({ "id": vault, "input": { "clearSettings": true, "clearUsers": true } }),
    )
    .await;
    let cleared = data(resp)["updateVault"].clone();
    assert!(cleared["settings"].is_null());
    assert_eq!(cleared["users"], json!([]));

    let resp = gql(
        &app,
        update,
        json!({ "id": vault, "input": { "name": "archive" } }),
    )
    .await;
    assert_eq!(error_code(&resp), "CONFLICT");

    let resp = gql(
        &app,
        update,
        json!({ "id": vault, "input": { "settings": { "color": 1 } } }),
    )
    .await;
    assert_eq!(error_code(&resp), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_delete_entry() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    let entry = create_entry(&app, &vault, "temporary").await;
    let delete = "mutation($id: ID!) { deleteEntry(id: $id) }";

    let resp = gql(&app, delete, json!({ "id": entry["id"] })).await;
    assert_eq!(data(resp)["deleteEntry"], entry["id"]);

    let resp = gql(
        &app,
        "query($id: ID!) { node(id: $id) { __typename } }",
        json!({ "id": entry["id"] }),
    )
    .await;
    assert!(data(resp)["node"].is_null());

    let resp = gql(&app, delete, json!({ "id": entry["id"] })).await;
    assert_eq!(error_code(&resp), "NOT_FOUND");

    // The vault itself survives.
    let resp = gql(
        &app,
        "query($id: ID!) { node(id: $id) { __typename } }",
        json!({ "id": vault }),
    )
    .await;
    assert_eq!(data(resp)["node"]["__typename"], "Vault");
}

#[tokio::test]
async fn test_vaults_has_user_with() {
    let app = make_app();
    let shared = create_vault(&app, "shared").await;
    let mine = create_vault(&app, "mine").await;
    create_vault(&app, "nobody").await;
    let greg = create_user(&app, "greg", &[&shared, &mine]).await;
    create_user(&app, "ann", &[&shared]).await;

    let resp = gql(
        &app,
        "query($id: ID!) { vaults(where: { hasUserWith: $id }) { totalCount nodes { name } } }",
        json!({ "id": greg }),
    )
    .await;
    let vaults = data(resp)["vaults"].clone();
    assert_eq!(vaults["totalCount"], 2);
    assert_eq!(vaults["nodes"], json!([{ "name": "shared" }, { "name": "mine" }]));
}

#[tokio::test]
async fn test_vault_settings_validation() {
    let app = make_app();
    let resp = gql(
        &app,
        "mutation($input: CreateVaultInput!) { createVault(input: $input) { id settings } }",
        json!({ "input": { "name": "inbox", "settings": { "color": "teal" } } }),
    )
    .await;
    assert_eq!(data(resp)["createVault"]["settings"]["color"], "teal");

    let resp = gql(
        &app,
        "mutation($input: CreateVaultInput!) { createVault(input: $input) { id } }",
        json!({ "input": { "name": "other", "settings": { "color": 7 } } }),
    )
    .await;
    assert_eq!(error_code(&resp), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_create_entry_unknown_vault() {
    let app = make_app();
    let resp = gql(
        &app,
        "mutation($input: CreateEntryInput!) { createEntry(input: $input) { id } }",
        json!({ "input": { "vaultID": "4294967999", "heading": "orphan" } }),
    )
    .await;
    assert_eq!(error_code(&resp), "NOT_FOUND");
}

#[tokio::test]
async fn test_update_entry_clear_and_refresh() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    let entry = create_entry(&app, &vault, "Draft").await;
    assert_eq!(entry["vault"]["id"], json!(vault));

    let resp = gql(
        &app,
        "mutation($id: ID!, $input: UpdateEntryInput!) {
            updateEntry(id: $id, input: $input) { heading body attributes createdAt updatedAt }
        }",
        json!({ "id": entry["id"], "input": {
            "clearHeading": true,
            "body": "text",
            "attributes": { "pinned": true },
        }}),
    )
    .await;
    let updated = data(resp)["updateEntry"].clone();
    assert!(updated["heading"].is_null());
    assert_eq!(updated["body"], "text");
    assert_eq!(updated["attributes"]["pinned"], true);
    assert_eq!(updated["createdAt"], entry["createdAt"]);
    assert_ne!(updated["updatedAt"], entry["updatedAt"]);
}

#[tokio::test]
async fn test_delete_vault_removes_entries() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    let entry = create_entry(&app, &vault, "doomed").await;

    let resp = gql(
        &app,
        "mutation($id: ID!) { deleteVault(id: $id) }",
        json!({ "id": vault }),
    )
    .await;
    data(resp);

    let resp = gql(
        &app,
        "query($id: ID!) { node(id: $id) { __typename } }",
        json!({ "id": entry["id"] }),
    )
    .await;
    assert!(data(resp)["node"].is_null());
}

#[tokio::test]
async fn test_node_lookup() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    let entry = create_entry(&app, &vault, "hello").await;

    let resp = gql(
        &app,
        "query($ids: [ID!]!) {
            nodes(ids: $ids) {
                __typename
                ... on Vault { name }
                ... on Entry { heading }
            }
        }",
        json!({ "ids": [vault, entry["id"], "999"] }),
    )
    .await;
    let nodes = data(resp)["nodes"].clone();
    assert_eq!(nodes[0]["__typename"], "Vault");
    assert_eq!(nodes[0]["name"], "inbox");
    assert_eq!(nodes[1]["__typename"], "Entry");
    assert_eq!(nodes[1]["heading"], "hello");
    assert!(nodes[2].is_null());

    let resp = gql(&app, "{ node(id: \"abc\") { __typename } }", json!({})).await;
    assert_eq!(error_code(&resp), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_entries_pagination() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    for i in 0..5 {
        create_entry(&app, &vault, &format!("entry {}", i)).await;
    }

    let page_query = "query($after: String) {
        entries(first: 2, after: $after, orderBy: { field: CREATED_AT, direction: ASC }) {
            totalCount
            pageInfo { hasNextPage hasPreviousPage endCursor }
            edges { cursor node { heading } }
        }
    }";

    let resp = gql(&app, page_query, json!({ "after": null })).await;
    let first = data(resp)["entries"].clone();
    assert_eq!(first["totalCount"], 5);
    assert_eq!(first["pageInfo"]["hasNextPage"], true);
    assert_eq!(first["pageInfo"]["hasPreviousPage"], false);
    assert_eq!(first["edges"][0]["node"]["heading"], "entry 0");
    assert_eq!(first["edges"][1]["node"]["heading"], "entry 1");

    let cursor = first["pageInfo"]["endCursor"].clone();
    let resp = gql(&app, page_query, json!({ "after": cursor })).await;
    let second = data(resp)["entries"].clone();
    assert_eq!(second["edges"][0]["node"]["heading"], "entry 2");
    assert_eq!(second["pageInfo"]["hasPreviousPage"], true);

    let resp = gql(
        &app,
        "{ entries(last: 1, orderBy: { field: CREATED_AT, direction: ASC }) {
            pageInfo { hasNextPage }
            edges { node { heading } }
        } }",
        json!({}),
    )
    .await;
    let last = data(resp)["entries"].clone();
    assert_eq!(last["edges"][0]["node"]["heading"], "entry 4");
    assert_eq!(last["pageInfo"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_entries_backward_pagination() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    for i in 0..5 {
        create_entry(&app, &vault, &format!("entry {}", i)).await;
    }

    let page_query = "query($before: String) {
        entries(last: 2, before: $before, orderBy: { field: CREATED_AT, direction: ASC }) {
            totalCount
            pageInfo { hasNextPage hasPreviousPage startCursor }
            edges { node { heading } }
        }
    }";

    let resp = gql(&app, page_query, json!({ "before": null })).await;
    let tail = data(resp)["entries"].clone();
    assert_eq!(tail["totalCount"], 5);
    assert_eq!(tail["edges"][0]["node"]["heading"], "entry 3");
    assert_eq!(tail["edges"][1]["node"]["heading"], "entry 4");
    assert_eq!(tail["pageInfo"]["hasPreviousPage"], true);
    assert_eq!(tail["pageInfo"]["hasNextPage"], false);

    let cursor = tail["pageInfo"]["startCursor"].clone();
    let resp = gql(&app, page_query, json!({ "before": cursor })).await;
    let middle = data(resp)["entries"].clone();
    assert_eq!(middle["edges"][0]["node"]["heading"], "entry 1");
    assert_eq!(middle["edges"][1]["node"]["heading"], "entry 2");
    assert_eq!(middle["pageInfo"]["hasNextPage"], true);

    let cursor = middle["pageInfo"]["startCursor"].clone();
    let resp = gql(&app, page_query, json!({ "before": cursor })).await;
    let head = data(resp)["entries"].clone();
    assert_eq!(head["edges"].as_array().unwrap().len(), 1);
    assert_eq!(head["edges"][0]["node"]["heading"], "entry 0");
    assert_eq!(head["pageInfo"]["hasPreviousPage"], false);
}

#[tokio::test]
async fn test_entries_where_filters() {
    let app = make_app();
    let home = create_vault(&app, "home").await;
    let work = create_vault(&app, "work").await;
    create_entry(&app, &home, "Weekly planning").await;
    create_entry(&app, &work, "Weekly review").await;
    create_entry(&app, &work, "Standup").await;

    let resp = gql(
        &app,
        "query($where: EntryWhereInput) { entries(where: $where) { totalCount } }",
        json!({ "where": { "headingContains": "weekly" } }),
    )
    .await;
    assert_eq!(data(resp)["entries"]["totalCount"], 2);

    let resp = gql(
        &app,
        "query($id: ID!) {
            node(id: $id) { ... on Vault { entries(where: { headingContains: \"weekly\" }) { totalCount } } }
        }",
        json!({ "id": work }),
    )
    .await;
    assert_eq!(data(resp)["node"]["entries"]["totalCount"], 1);
}

#[tokio::test]
async fn test_search_entries() {
    let app = make_app();
    let vault = create_vault(&app, "inbox").await;
    let target = create_entry(&app, &vault, "grocery list").await;
    create_entry(&app, &vault, "tax return").await;

    let resp = gql(
        &app,
        "query($q: String!) { searchEntries(query: $q) { score entry { id heading } } }",
        json!({ "q": "grocery lsit" }),
    )
    .await;
    let hits = data(resp)["searchEntries"].clone();
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["entry"]["id"], target["id"]);
    let score = hits[0]["score"].as_f64().unwrap();
    assert!(score > 0.3 && score < 1.0);

    let resp = gql(
        &app,
        "{ searchEntries(query: \"grocery\", threshold: 2.0) { score } }",
        json!({}),
    )
    .await;
    assert_eq!(error_code(&resp), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_users_and_vaults_connections() {
    let app = make_app();
    let vault = create_vault(&app, "shared").await;
    create_vault(&app, "private").await;
    data(
        gql(
            &app,
            "mutation($input: CreateUserInput!) { createUser(input: $input) { id } }",
            json!({ "input": { "username": "greg", "password": "pw", "vaultIDs": [vault] } }),
        )
        .await,
    );

    let resp = gql(
        &app,
        "{ vaults(where: { nameContains: \"priv\" }) { totalCount edges { node { name } } } }",
        json!({}),
    )
    .await;
    let vaults = data(resp)["vaults"].clone();
    assert_eq!(vaults["totalCount"], 1);
    assert_eq!(vaults["edges"][0]["node"]["name"], "private");

    let resp = gql(
        &app,
        "query($id: ID!) { users(where: { hasVaultWith: $id }) { totalCount nodes { username } } }",
        json!({ "id": vault }),
    )
    .await;
    let users = data(resp)["users"].clone();
    assert_eq!(users["totalCount"], 1);
    assert_eq!(users["nodes"][0]["username"], "greg");
}

// =============================================================================
// Schema
// =============================================================================

#[test]
fn test_sdl_exports_types() {
    let schema = sdl();
    for needle in [
        "type User",
        "type Vault",
        "type Entry",
        "union Node",
        "scalar JSON",
        "input UpdateEntryInput",
        "searchEntries",
    ] {
        assert!(schema.contains(needle), "SDL missing {}", needle);
    }
}
