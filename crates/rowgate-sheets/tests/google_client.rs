mod common;

use std::time::Duration;

use assert_json_diff::assert_json_eq;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use rowgate_sheets::{
    A1Range, Column, GoogleSheetsStore, SPREADSHEETS_SCOPE, ServiceAccountKey, SheetStore,
    SheetsError,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SPREADSHEET_ID: &str = "sheet-123";
const JWT_BEARER_FORM: &str = "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";

fn store_for(server: &MockServer) -> GoogleSheetsStore {
    let key = ServiceAccountKey::from_json(&common::service_account_json(&format!(
        "{}/token",
        server.uri()
    )))
    .expect("valid key");
    GoogleSheetsStore::builder(SPREADSHEET_ID, key)
        .base_url(format!("{}/v4/", server.uri()))
        .timeout(Some(Duration::from_secs(5)))
        .build()
        .expect("build store")
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(JWT_BEARER_FORM))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn append_posts_raw_values_with_bearer_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    let remote_result = json!({
        "spreadsheetId": SPREADSHEET_ID,
        "tableRange": "Sheet1!A1:B3",
        "updates": {
            "spreadsheetId": SPREADSHEET_ID,
            "updatedRange": "Sheet1!A4:B4",
            "updatedRows": 1,
            "updatedColumns": 2,
            "updatedCells": 2
        }
    });
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A1:B1:append"))
        .and(query_param("valueInputOption", "RAW"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({"values": [["Ana", "a@x.com"]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_result.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::row_span("Sheet1", 1, Column::A, Column::B).unwrap();
    let result = store
        .append_rows(&range, &[vec![json!("Ana"), json!("a@x.com")]])
        .await
        .expect("append succeeds");

    assert_json_eq!(result, remote_result);
}

#[tokio::test]
async fn token_is_reused_across_calls() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A1:Z"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:Z1000",
            "majorDimension": "ROWS",
            "values": [["Ana", "a@x.com"], ["Bo", "b@x.com"]]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::open_rows("Sheet1", 1, Column::A, Column::Z).unwrap();

    let first = store.read_rows(&range).await.unwrap();
    let second = store.read_rows(&range).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first[1], vec![json!("Bo"), json!("b@x.com")]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn assertion_is_signed_for_the_token_endpoint() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A1:Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"range": "Sheet1!A1:Z1000"})))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::open_rows("Sheet1", 1, Column::A, Column::Z).unwrap();
    store.read_rows(&range).await.unwrap();

    let requests = server.received_requests().await.expect("recording enabled");
    let token_request = requests
        .iter()
        .find(|r| r.url.path() == "/token")
        .expect("token request sent");
    let assertion = url::form_urlencoded::parse(&token_request.body)
        .find(|(k, _)| k == "assertion")
        .map(|(_, v)| v.into_owned())
        .expect("assertion field");

    let token_uri = format!("{}/token", server.uri());
    let header = decode_header(&assertion).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some(common::PRIVATE_KEY_ID));

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[token_uri.as_str()]);
    let decoding_key = DecodingKey::from_rsa_pem(common::test_key().public_pem.as_bytes()).unwrap();
    let claims = decode::<Value>(&assertion, &decoding_key, &validation)
        .expect("assertion verifies")
        .claims;

    assert_eq!(claims["iss"], common::CLIENT_EMAIL);
    assert_eq!(claims["scope"], SPREADSHEETS_SCOPE);
    assert_eq!(
        claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(),
        3600
    );
}

#[tokio::test]
async fn read_without_values_is_empty() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Empty!A1:Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Empty!A1:Z1000",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::open_rows("Empty", 1, Column::A, Column::Z).unwrap();

    assert!(store.read_rows(&range).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_puts_values_into_the_addressed_row() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-123/values/Leads!A3:Z3"))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_json(json!({"values": [["Bo", "b@y.com", 42]]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": SPREADSHEET_ID,
            "updatedRange": "Leads!A3:C3",
            "updatedRows": 1,
            "updatedColumns": 3,
            "updatedCells": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::row_span("Leads", 3, Column::A, Column::Z).unwrap();
    let result = store
        .update_rows(&range, &[vec![json!("Bo"), json!("b@y.com"), json!(42)]])
        .await
        .unwrap();

    assert_eq!(result["updatedRange"], "Leads!A3:C3");
}

#[tokio::test]
async fn sheet_names_are_quoted_and_percent_encoded() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/'My%20Sheet'!A1:Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"values": [["x"]]})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::open_rows("My Sheet", 1, Column::A, Column::Z).unwrap();

    assert_eq!(store.read_rows(&range).await.unwrap(), vec![vec![json!("x")]]);
}

#[tokio::test]
async fn api_errors_carry_the_remote_message() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Nope!A1:Z"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Unable to parse range: Nope!A1:Z",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::open_rows("Nope", 1, Column::A, Column::Z).unwrap();
    let err = store.read_rows(&range).await.unwrap_err();

    match err {
        SheetsError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Unable to parse range: Nope!A1:Z");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_token_exchange_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A1:B1:append"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::row_span("Sheet1", 1, Column::A, Column::B).unwrap();
    let err = store
        .append_rows(&range, &[vec![json!("Ana"), json!("a@x.com")]])
        .await
        .unwrap_err();

    assert!(matches!(err, SheetsError::Auth { .. }));
    assert_eq!(
        err.to_string(),
        "Authentication failed: invalid_grant: Invalid JWT Signature."
    );
}

#[tokio::test]
async fn unauthorized_response_forces_a_fresh_token() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-123/values/Sheet1!A1:Z"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials."}
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let range = A1Range::open_rows("Sheet1", 1, Column::A, Column::Z).unwrap();

    assert!(store.read_rows(&range).await.is_err());
    let err = store.read_rows(&range).await.unwrap_err();
    assert!(matches!(err, SheetsError::Api { status: 401, .. }));
}

#[tokio::test]
async fn stalled_token_endpoint_respects_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "late", "expires_in": 3599}))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let key = ServiceAccountKey::from_json(&common::service_account_json(&format!(
        "{}/token",
        server.uri()
    )))
    .expect("valid key");
    let store = GoogleSheetsStore::builder(SPREADSHEET_ID, key)
        .base_url(format!("{}/v4/", server.uri()))
        .timeout(Some(Duration::from_millis(200)))
        .build()
        .expect("build store");
    let range = A1Range::open_rows("Sheet1", 1, Column::A, Column::Z).unwrap();

    let started = std::time::Instant::now();
    let err = store.read_rows(&range).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(err, SheetsError::Auth { .. }));
    assert!(err.to_string().contains("token endpoint unreachable"));
}

#[test]
fn empty_spreadsheet_id_is_rejected() {
    let key = ServiceAccountKey::from_json(&common::service_account_json(
        "https://oauth2.googleapis.com/token",
    ))
    .unwrap();
    let err = GoogleSheetsStore::builder("  ", key).build().unwrap_err();
    assert!(matches!(err, SheetsError::Credentials { .. }));
}
