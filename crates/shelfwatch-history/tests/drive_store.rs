//! Integration tests for `DriveStore` against a wiremock Drive API.

use serde_json::json;
use wiremock::matchers::{body_string, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfwatch_core::SchemaDrift;
use shelfwatch_history::{sync_history, DriveStore, FileHandle, HistoryError, HistoryStore, Table};

const FOLDER: &str = "folder-123";
const TOKEN: &str = "ya29.test-token";

fn store(server: &MockServer, max_retries: u32) -> DriveStore {
    DriveStore::with_base_url(&server.uri(), TOKEN, FOLDER, max_retries, 0)
        .expect("failed to build test DriveStore")
}

fn csv_file(id: &str) -> FileHandle {
    FileHandle {
        id: id.to_owned(),
        name: "ebooks_mediamarkt.csv".to_owned(),
        mime_type: Some("text/csv".to_owned()),
    }
}

#[tokio::test]
async fn find_by_name_queries_folder_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param(
            "q",
            "name = 'ebooks_mediamarkt.csv' and 'folder-123' in parents and trashed = false",
        ))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"id": "file-1", "name": "ebooks_mediamarkt.csv", "mimeType": "text/csv"},
                {"id": "file-2", "name": "ebooks_mediamarkt.csv", "mimeType": "text/csv"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let found = store(&server, 0)
        .find_by_name("ebooks_mediamarkt.csv")
        .await
        .unwrap()
        .expect("file should be found");
    assert_eq!(found.id, "file-1");
    assert_eq!(found.mime_type.as_deref(), Some("text/csv"));
}

#[tokio::test]
async fn find_by_name_returns_none_for_empty_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .mount(&server)
        .await;

    let found = store(&server, 0).find_by_name("missing.csv").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn download_fetches_raw_media_for_csv_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file-1"))
        .and(query_param("alt", "media"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"id\nabc\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = store(&server, 0).download(&csv_file("file-1")).await.unwrap();
    assert_eq!(bytes, b"id\nabc\n");
}

#[tokio::test]
async fn download_exports_spreadsheets_after_metadata_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/sheet-9"))
        .and(query_param("fields", "id,name,mimeType"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sheet-9",
            "name": "ebooks_mediamarkt.csv",
            "mimeType": "application/vnd.google-apps.spreadsheet"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/sheet-9/export"))
        .and(query_param("mimeType", "text/csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("id\nfrom-sheet\n"))
        .expect(1)
        .mount(&server)
        .await;

    let file = FileHandle {
        id: "sheet-9".to_owned(),
        name: "ebooks_mediamarkt.csv".to_owned(),
        mime_type: None,
    };
    let bytes = store(&server, 0).download(&file).await.unwrap();
    assert_eq!(bytes, b"id\nfrom-sheet\n");
}

#[tokio::test]
async fn download_of_deleted_file_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server, 3).download(&csv_file("gone")).await.unwrap_err();
    assert!(matches!(err, HistoryError::NotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn upload_updates_existing_file_in_place() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/upload/drive/v3/files/file-1"))
        .and(query_param("uploadType", "media"))
        .and(header("content-type", "text/csv"))
        .and(body_string("id\nabc\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-1", "name": "ebooks_mediamarkt.csv", "mimeType": "text/csv"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let written = store(&server, 0)
        .upload(
            "ebooks_mediamarkt.csv",
            b"id\nabc\n".to_vec(),
            Some(&csv_file("file-1")),
        )
        .await
        .unwrap();
    assert_eq!(written.id, "file-1");
}

#[tokio::test]
async fn upload_creates_file_in_folder_with_multipart_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(body_string_contains("\"parents\":[\"folder-123\"]"))
        .and(body_string_contains("\"name\":\"ebooks_mediamarkt.csv\""))
        .and(body_string_contains("id\nabc\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "new-file", "name": "ebooks_mediamarkt.csv", "mimeType": "text/csv"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let written = store(&server, 0)
        .upload("ebooks_mediamarkt.csv", b"id\nabc\n".to_vec(), None)
        .await
        .unwrap();
    assert_eq!(written.id, "new-file");
}

#[tokio::test]
async fn transient_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": []})))
        .expect(1)
        .mount(&server)
        .await;

    let found = store(&server, 2).find_by_name("x.csv").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = store(&server, 3).find_by_name("x.csv").await.unwrap_err();
    assert!(
        matches!(err, HistoryError::UnexpectedStatus { status: 401, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn sync_appends_to_drive_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{"id": "file-1", "name": "h.csv", "mimeType": "text/csv"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/v3/files/file-1"))
        .and(query_param("alt", "media"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("fecha_extraccion,id\n2026-10-18,aaa\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/upload/drive/v3/files/file-1"))
        .and(body_string("fecha_extraccion,id\n2026-10-18,aaa\n2026-10-19,aaa\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "file-1", "name": "h.csv", "mimeType": "text/csv"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let new = Table {
        columns: vec!["fecha_extraccion".to_owned(), "id".to_owned()],
        rows: vec![vec!["2026-10-19".to_owned(), "aaa".to_owned()]],
    };
    let report = sync_history(&store(&server, 0), "h.csv", &new, SchemaDrift::Intersection)
        .await
        .unwrap();
    assert!(!report.created);
    assert_eq!(report.stats.final_rows, 2);
}
