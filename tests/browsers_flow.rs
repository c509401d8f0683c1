//! Integration tests for the browser endpoints using wiremock.
//!
//! - GET    devices/chromebrowsers       : list-browsers (paginated)
//! - GET    devices/chromebrowsers/{id}  : get-browser
//! - PUT    devices/chromebrowsers/{id}  : update-browser
//! - DELETE devices/chromebrowsers/{id}  : delete-browser

use cbcm::browsers::*;
use cbcm::cli::{Command, DeleteBrowserArgs, GetBrowserArgs, ListBrowsersArgs, UpdateBrowserArgs};
use cbcm::client::{CbcmClient, RetryPolicy};
use cbcm::commands::{Context, execute};
use cbcm::error::CbcmError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BROWSERS: &str = "/customer/my_customer/devices/chromebrowsers";

fn mock_client(server: &MockServer) -> CbcmClient {
    CbcmClient::with_base_url(&format!("{}/", server.uri()), "my_customer", "mock-token")
        .unwrap()
        .with_retry_policy(RetryPolicy::immediate())
}

async fn run(server: &MockServer, command: Command) -> (Result<(), CbcmError>, String) {
    let ctx = Context::new(mock_client(server));
    let mut out = Vec::new();
    let result = execute(&ctx, &command, &mut out).await;
    (result, String::from_utf8(out).unwrap())
}

// ── list-browsers ──────────────────────────────────────────────────────

#[tokio::test]
async fn list_browsers_drains_every_page_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(BROWSERS))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "browsers": [{"deviceId": "d1"}, {"deviceId": "d2"}],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(BROWSERS))
        .and(query_param("pageToken", "page-2"))
        .and(query_param("projection", "BASIC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "browsers": [{"deviceId": "d3"}],
            "nextPageToken": "page-3"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(BROWSERS))
        .and(query_param("pageToken", "page-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "browsers": [{"deviceId": "d4"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = ListBrowsersQuery {
        projection: Some(Projection::Basic),
        ..Default::default()
    };
    let browsers = list_browsers(&mock_client(&server), &query).await.unwrap();
    let ids: Vec<&str> = browsers
        .iter()
        .map(|b| b["deviceId"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["d1", "d2", "d3", "d4"]);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn list_browsers_empty_first_page_is_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BROWSERS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"kind": "admin#directory#browserdevices"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (result, out) = run(
        &server,
        Command::ListBrowsers(ListBrowsersArgs {
            orgunit: None,
            orderby: None,
            projection: Projection::Basic,
            query: None,
            sortorder: SortOrder::Ascending,
            fields: None,
        }),
    )
    .await;
    result.unwrap();
    assert_eq!(out, "[]\n");
}

#[tokio::test]
async fn list_browsers_sends_only_supplied_flags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BROWSERS))
        .and(query_param("orgUnitPath", "/Sales"))
        .and(query_param("projection", "FULL"))
        .and(query_param("sortOrder", "DESCENDING"))
        .and(query_param_is_missing("fields"))
        .and(query_param_is_missing("query"))
        .and(query_param_is_missing("orderBy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "browsers": [{"orgUnitPath": "/Sales", "deviceId": "d1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (result, out) = run(
        &server,
        Command::ListBrowsers(ListBrowsersArgs {
            orgunit: Some("/Sales".into()),
            orderby: None,
            projection: Projection::Full,
            query: None,
            sortorder: SortOrder::Descending,
            fields: None,
        }),
    )
    .await;
    result.unwrap();
    assert_eq!(
        out,
        "[\n  {\n    \"deviceId\": \"d1\",\n    \"orgUnitPath\": \"/Sales\"\n  }\n]\n"
    );
}

#[tokio::test]
async fn list_browsers_error_page_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BROWSERS))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Not Authorized to access this resource/api"}
        })))
        .mount(&server)
        .await;

    let err = list_browsers(&mock_client(&server), &ListBrowsersQuery::default())
        .await
        .unwrap_err();
    match err {
        CbcmError::Api { status, body } => {
            assert_eq!(status.as_u16(), 403);
            assert!(body.contains("Not Authorized"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── get-browser ────────────────────────────────────────────────────────

#[tokio::test]
async fn get_browser_sends_auth_and_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BROWSERS}/dev-42")))
        .and(header("authorization", "Bearer mock-token"))
        .and(header("accept", "application/json"))
        .and(query_param("fields", "deviceId,osVersion"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "osVersion": "10.0.22631",
            "deviceId": "dev-42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (result, out) = run(
        &server,
        Command::GetBrowser(GetBrowserArgs {
            id: "dev-42".into(),
            projection: None,
            fields: Some("deviceId,osVersion".into()),
        }),
    )
    .await;
    result.unwrap();
    assert_eq!(
        out,
        "{\n  \"deviceId\": \"dev-42\",\n  \"osVersion\": \"10.0.22631\"\n}\n"
    );
}

#[tokio::test]
async fn get_browser_without_fields_omits_the_param() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BROWSERS}/dev-1")))
        .and(query_param_is_missing("fields"))
        .and(query_param_is_missing("projection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deviceId": "dev-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let browser = get_browser(&mock_client(&server), "dev-1", None, None)
        .await
        .unwrap();
    assert_eq!(browser["deviceId"], "dev-1");
}

#[tokio::test]
async fn get_browser_not_found_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BROWSERS}/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Resource Not Found: deviceId"}
        })))
        .mount(&server)
        .await;

    let (result, out) = run(
        &server,
        Command::GetBrowser(GetBrowserArgs {
            id: "missing".into(),
            projection: None,
            fields: None,
        }),
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("404"));
    assert_eq!(err.exit_code(), 1);
    assert!(out.is_empty(), "no data should be printed on error");
}

// ── update-browser ─────────────────────────────────────────────────────

#[tokio::test]
async fn update_browser_puts_only_supplied_annotations() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{BROWSERS}/dev-7")))
        .and(body_json(json!({
            "deviceId": "dev-7",
            "annotatedUser": "alice",
            "annotatedNotes": "loaner"
        })))
        .and(query_param_is_missing("fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "deviceId": "dev-7",
            "annotatedUser": "alice",
            "annotatedNotes": "loaner"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (result, out) = run(
        &server,
        Command::UpdateBrowser(UpdateBrowserArgs {
            id: "dev-7".into(),
            user: Some("alice".into()),
            location: None,
            notes: Some("loaner".into()),
            assetid: None,
            fields: None,
        }),
    )
    .await;
    result.unwrap();
    let printed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(printed["annotatedUser"], "alice");
}

// ── delete-browser ─────────────────────────────────────────────────────

#[tokio::test]
async fn delete_browser_with_empty_body_prints_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{BROWSERS}/dev-gone")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (result, out) = run(
        &server,
        Command::DeleteBrowser(DeleteBrowserArgs {
            id: "dev-gone".into(),
        }),
    )
    .await;
    result.unwrap();
    assert_eq!(out, "200 OK\n");
}

#[tokio::test]
async fn delete_browser_with_body_prints_json() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{BROWSERS}/dev-gone")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (result, out) = run(
        &server,
        Command::DeleteBrowser(DeleteBrowserArgs {
            id: "dev-gone".into(),
        }),
    )
    .await;
    result.unwrap();
    assert_eq!(out, "{}\n");
}

#[tokio::test]
async fn delete_browser_failure_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{BROWSERS}/dev-x")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = delete_browser(&mock_client(&server), "dev-x")
        .await
        .unwrap_err();
    assert!(matches!(err, CbcmError::Api { .. }));
}

#[tokio::test]
async fn device_id_is_escaped_in_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{BROWSERS}/a%2Fb%3Fc")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BROWSERS}/a%2Fb%3Fc")))
        .and(query_param("fields", "deviceId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deviceId": "a/b?c"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    delete_browser(&client, "a/b?c").await.unwrap();
    let browser = get_browser(&client, "a/b?c", None, Some("deviceId")).await.unwrap();
    assert_eq!(browser["deviceId"], "a/b?c");
}
