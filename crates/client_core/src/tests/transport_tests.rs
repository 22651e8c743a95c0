use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{Position, PositionDraft, PositionId, Teacher, TeacherDraft, TeacherId},
    error::{ApiError, ErrorKind, Operation},
};
use tokio::{net::TcpListener, sync::Mutex};

use crate::{
    api::{AttachmentUpload, RecordApi, RecordPayload},
    transport::{form_fields, HttpRecordApi},
};

#[derive(Debug, Clone, PartialEq)]
struct CapturedFile {
    field: String,
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
enum Captured {
    Json {
        path: String,
        body: Value,
    },
    Multipart {
        path: String,
        fields: BTreeMap<String, String>,
        files: Vec<CapturedFile>,
    },
    Delete {
        path: String,
    },
}

#[derive(Clone, Default)]
struct Capture {
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl Capture {
    async fn take(&self) -> Vec<Captured> {
        std::mem::take(&mut *self.requests.lock().await)
    }
}

async fn spawn_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn list_positions() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [
            { "id": 1, "name": "Teacher", "created_at": "2024-06-01T08:00:00.000Z", "updated_at": null },
            { "id": 2, "name": "Dean" }
        ]
    }))
}

async fn create_position(State(capture): State<Capture>, Json(body): Json<Value>) -> Json<Value> {
    let name = body["name"].clone();
    capture.requests.lock().await.push(Captured::Json {
        path: "/positions".into(),
        body,
    });
    Json(json!({ "success": true, "data": { "id": 3, "name": name } }))
}

async fn update_position(
    State(capture): State<Capture>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    capture.requests.lock().await.push(Captured::Json {
        path: format!("/positions/{id}"),
        body,
    });
    Json(json!({ "success": false }))
}

async fn delete_position(State(capture): State<Capture>, Path(id): Path<i64>) -> Json<Value> {
    capture.requests.lock().await.push(Captured::Delete {
        path: format!("/positions/{id}"),
    });
    Json(json!({ "success": true }))
}

async fn capture_teacher_multipart(
    State(capture): State<Capture>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut fields = BTreeMap::new();
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("next field") {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(filename) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.expect("file bytes").to_vec();
            files.push(CapturedFile {
                field: name,
                filename,
                content_type,
                bytes,
            });
        } else {
            fields.insert(name, field.text().await.expect("text field"));
        }
    }
    capture.requests.lock().await.push(Captured::Multipart {
        path: format!("/teachers/{id}"),
        fields,
        files,
    });
    Json(json!({ "success": true }))
}

async fn spawn_directory_server() -> (String, Capture) {
    let capture = Capture::default();
    let app = Router::new()
        .route("/positions", get(list_positions).post(create_position))
        .route("/positions/:id", put(update_position).delete(delete_position))
        .route("/teachers/:id", put(capture_teacher_multipart))
        .with_state(capture.clone());
    (spawn_server(app).await, capture)
}

#[tokio::test]
async fn list_returns_records_in_server_order() {
    let (base_url, _capture) = spawn_directory_server().await;
    let api = HttpRecordApi::<Position>::new(base_url);

    let positions = api.list().await.expect("list");

    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0].id, PositionId(1));
    assert_eq!(positions[0].name, "Teacher");
    assert_eq!(
        positions[0].created_at.as_deref(),
        Some("2024-06-01T08:00:00.000Z")
    );
    assert_eq!(positions[1].name, "Dean");
    assert_eq!(positions[1].updated_at, None);
}

#[tokio::test]
async fn create_sends_scalar_record_as_json() {
    let (base_url, capture) = spawn_directory_server().await;
    let api = HttpRecordApi::<Position>::new(format!("{base_url}/"));

    let created = api
        .create(RecordPayload::fields_only(PositionDraft {
            name: "Registrar".into(),
        }))
        .await
        .expect("create");

    assert_eq!(created.map(|p| p.name), Some("Registrar".to_string()));
    assert_eq!(
        capture.take().await,
        vec![Captured::Json {
            path: "/positions".into(),
            body: json!({ "name": "Registrar" }),
        }]
    );
}

#[tokio::test]
async fn update_rejected_by_success_flag_is_server_rejected() {
    let (base_url, capture) = spawn_directory_server().await;
    let api = HttpRecordApi::<Position>::new(base_url);

    let err = api
        .update(
            PositionId(5),
            RecordPayload::fields_only(PositionDraft { name: "X".into() }),
        )
        .await
        .expect_err("must be rejected");

    assert_eq!(err.kind(), ErrorKind::ServerRejected);
    assert_eq!(err.operation(), Operation::Update);
    assert_eq!(
        capture.take().await,
        vec![Captured::Json {
            path: "/positions/5".into(),
            body: json!({ "name": "X" }),
        }]
    );
}

#[tokio::test]
async fn delete_addresses_item_path() {
    let (base_url, capture) = spawn_directory_server().await;
    let api = HttpRecordApi::<Position>::new(base_url);

    api.delete(PositionId(5)).await.expect("delete");

    assert_eq!(
        capture.take().await,
        vec![Captured::Delete {
            path: "/positions/5".into()
        }]
    );
}

fn teacher_draft() -> TeacherDraft {
    TeacherDraft {
        name: "Somchai".into(),
        address: "Bangkok".into(),
        telephone: "0812345678".into(),
        position_id: Some(PositionId(2)),
    }
}

#[tokio::test]
async fn update_with_pending_file_sends_multipart_fields_and_file() {
    let (base_url, capture) = spawn_directory_server().await;
    let api = HttpRecordApi::<Teacher>::new(base_url);

    let updated = api
        .update(
            TeacherId(7),
            RecordPayload {
                fields: teacher_draft(),
                attachment: Some(AttachmentUpload {
                    filename: "somchai.png".into(),
                    mime_type: Some("image/png".into()),
                    bytes: b"\x89PNG".to_vec(),
                }),
            },
        )
        .await
        .expect("update");
    assert_eq!(updated, None);

    let requests = capture.take().await;
    let [Captured::Multipart {
        path,
        fields,
        files,
    }] = requests.as_slice()
    else {
        panic!("expected one multipart request, got {requests:?}");
    };
    assert_eq!(path, "/teachers/7");
    assert_eq!(fields.get("name").map(String::as_str), Some("Somchai"));
    assert_eq!(fields.get("address").map(String::as_str), Some("Bangkok"));
    assert_eq!(
        fields.get("telephone").map(String::as_str),
        Some("0812345678")
    );
    assert_eq!(fields.get("position_id").map(String::as_str), Some("2"));
    assert_eq!(
        files,
        &vec![CapturedFile {
            field: "img".into(),
            filename: "somchai.png".into(),
            content_type: Some("image/png".into()),
            bytes: b"\x89PNG".to_vec(),
        }]
    );
}

#[tokio::test]
async fn update_without_pending_file_sends_scalar_parts_only() {
    let (base_url, capture) = spawn_directory_server().await;
    let api = HttpRecordApi::<Teacher>::new(base_url);

    api.update(TeacherId(7), RecordPayload::fields_only(teacher_draft()))
        .await
        .expect("update");

    let requests = capture.take().await;
    let [Captured::Multipart { fields, files, .. }] = requests.as_slice() else {
        panic!("expected one multipart request, got {requests:?}");
    };
    assert!(files.is_empty());
    assert!(!fields.contains_key("img"));
    assert_eq!(fields.len(), 4);
}

#[tokio::test]
async fn non_json_error_page_is_server_rejected_with_status() {
    let app = Router::new().route(
        "/positions",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>") }),
    );
    let base_url = spawn_server(app).await;
    let api = HttpRecordApi::<Position>::new(base_url);

    let err = api.list().await.expect_err("must fail");
    assert!(
        matches!(
            err,
            ApiError::ServerRejected {
                operation: Operation::List,
                status: 500,
                ..
            }
        ),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn list_without_data_is_rejected() {
    let app = Router::new().route("/positions", get(|| async { Json(json!({ "success": true })) }));
    let base_url = spawn_server(app).await;
    let api = HttpRecordApi::<Position>::new(base_url);

    let err = api.list().await.expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::ServerRejected);
}

#[tokio::test]
async fn unreachable_server_is_network_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let api = HttpRecordApi::<Position>::new(format!("http://{addr}"));
    let err = api.delete(PositionId(1)).await.expect_err("must fail");

    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert_eq!(err.operation(), Operation::Delete);
}

#[test]
fn form_fields_skip_absent_values_and_stringify_numbers() {
    let mut draft = teacher_draft();
    let fields = form_fields(&draft, Operation::Create).expect("fields");
    assert!(fields.contains(&("position_id".to_string(), "2".to_string())));

    draft.position_id = None;
    let fields = form_fields(&draft, Operation::Create).expect("fields");
    assert!(fields.iter().all(|(name, _)| name != "position_id"));
}

#[test]
fn draft_that_is_not_an_object_fails_before_sending() {
    let err = form_fields(&"just a string", Operation::Update).expect_err("must fail");
    assert!(
        matches!(
            err,
            ApiError::InvalidRequest {
                operation: Operation::Update,
                ..
            }
        ),
        "unexpected error: {err:?}"
    );
    assert_eq!(err.kind(), ErrorKind::ServerRejected);
}
