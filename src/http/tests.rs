//! Router tests over in-memory adapters.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::{AppState, STAFF_ID_HEADER, STAFF_NAME_HEADER, STAFF_ROLE_HEADER, router};
use crate::activity::adapters::memory::InMemoryActivityLog;
use crate::notification::{
    adapters::memory::{InMemoryLedger, RecordingEmailProvider, RecordingSmsProvider},
    services::{DispatcherConfig, MessageTemplates, NotificationDispatcher},
};
use crate::task::{
    adapters::memory::{InMemoryContactDirectory, InMemoryTaskStore},
    domain::{ContactSnapshot, PersistedTaskData, SiteAddress, Task, TaskId, TaskStatus},
};
use crate::workflow::{
    adapters::memory::InMemoryWorkflowStore,
    services::{
        EngineParts, ExpiryPolicy, OsRngTokenSource, PublicLinks, TokenIssuer, WorkflowEngine,
    },
};

struct TestApp {
    router: Router,
    tasks: Arc<InMemoryTaskStore>,
    sms: RecordingSmsProvider,
}

impl TestApp {
    fn seed_task(&self) -> TaskId {
        let now = Utc::now();
        let id = TaskId::new();
        self.tasks
            .insert(Task::from_persisted(PersistedTaskData {
                id,
                task_number: Some("T-2001".to_owned()),
                status: TaskStatus::AwaitingConfirmation,
                address: SiteAddress::new("Vestergade 12", "8000", "Aarhus C"),
                company_name: None,
                contact: ContactSnapshot {
                    contact_id: None,
                    name: Some("Anne Lund".to_owned()),
                    email: Some("anne@example.com".to_owned()),
                    phone: Some("+4520304050".to_owned()),
                },
                owners: Vec::new(),
                summary: None,
                damages: Vec::new(),
                mirror: Default::default(),
                created_at: now,
                updated_at: now,
            }))
            .expect("task stored");
        id
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }
}

#[fixture]
fn app() -> TestApp {
    let clock = Arc::new(DefaultClock);
    let tasks = Arc::new(InMemoryTaskStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let sms = RecordingSmsProvider::new();
    let dispatcher = NotificationDispatcher::new(
        Arc::new(sms.clone()),
        Arc::new(RecordingEmailProvider::new()),
        ledger.clone(),
        clock.clone(),
        DispatcherConfig::default(),
    );
    let engine = Arc::new(WorkflowEngine::new(EngineParts {
        store: Arc::new(InMemoryWorkflowStore::new()),
        tasks: tasks.clone(),
        contacts: Arc::new(InMemoryContactDirectory::new()),
        activity: Arc::new(InMemoryActivityLog::new()),
        clock: clock.clone(),
        issuer: TokenIssuer::new(Arc::new(OsRngTokenSource), clock, ExpiryPolicy::default()),
        dispatcher,
        templates: Arc::new(MessageTemplates::new("SMARTREP").expect("templates parse")),
        links: PublicLinks::new("https://portal.example.com"),
    }));
    TestApp {
        router: router(AppState::new(&engine, ledger)),
        tasks,
        sms,
    }
}

fn staff_request(method: Method, uri: &str, role: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(STAFF_ID_HEADER, "staff-7")
        .header(STAFF_NAME_HEADER, "Jonas Berg")
        .header(STAFF_ROLE_HEADER, role);
    with_body(builder, body)
}

fn public_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    with_body(Request::builder().method(method).uri(uri), body)
}

fn with_body(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

fn token_of(body: &Value) -> String {
    body["record"]["token"]
        .as_str()
        .expect("record carries its token")
        .to_owned()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_reports_ok(app: TestApp) {
    let (status, body) = app
        .call(public_request(Method::GET, "/health", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn staff_routes_require_an_identity(app: TestApp) {
    let task_id = app.seed_task();
    let (status, body) = app
        .call(public_request(
            Method::POST,
            "/order-confirmation/send",
            Some(json!({ "taskId": task_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[rstest]
#[case("technician", StatusCode::FORBIDDEN)]
#[case("janitor", StatusCode::FORBIDDEN)]
#[case("technician_admin", StatusCode::OK)]
#[tokio::test(flavor = "multi_thread")]
async fn order_desk_roles_gate_sending(
    app: TestApp,
    #[case] role: &str,
    #[case] expected: StatusCode,
) {
    let task_id = app.seed_task();
    let (status, _) = app
        .call(staff_request(
            Method::POST,
            "/order-confirmation/send",
            role,
            Some(json!({ "taskId": task_id })),
        ))
        .await;
    assert_eq!(status, expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn order_confirmation_round_trip(app: TestApp) {
    let task_id = app.seed_task();
    let (status, sent) = app
        .call(staff_request(
            Method::POST,
            "/order-confirmation/send",
            "admin",
            Some(json!({
                "taskId": task_id,
                "serviceZone": "extended",
                "addGlassRisk": true,
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["success"], true);
    assert!(
        sent["notifications"]["sms"]
            .as_str()
            .is_some_and(|label| label.starts_with("sent to"))
    );
    let token = token_of(&sent);
    assert!(
        sent["publicUrl"]
            .as_str()
            .is_some_and(|url| url.ends_with(&token))
    );
    assert_eq!(app.sms.sent().len(), 1);

    let (status, view) = app
        .call(public_request(
            Method::GET,
            &format!("/order-confirmation/public/{token}"),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(view.get("token").is_none());
    assert_eq!(view["items"].as_array().map(Vec::len), Some(3));
    assert_eq!(view["taskInfo"]["city"], "Aarhus C");

    let answer = json!({
        "items": [
            { "type": "standard", "accepted": true },
            { "type": "extended_zone", "accepted": true },
            { "type": "glass_risk", "accepted": false },
        ]
    });
    let respond_uri = format!("/order-confirmation/public/{token}/respond");
    let (status, responded) = app
        .call(public_request(Method::POST, &respond_uri, Some(answer.clone())))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(responded["status"], "response_received");
    assert_eq!(responded["overallAccepted"], true);

    let (status, again) = app
        .call(public_request(Method::POST, &respond_uri, Some(answer)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(again["code"], "BAD_REQUEST");

    let (status, activated) = app
        .call(staff_request(
            Method::POST,
            "/order-confirmation/activate",
            "admin",
            Some(json!({ "taskId": task_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["status"], "activated");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_tokens_are_not_found(app: TestApp) {
    for uri in [
        "/order-confirmation/public/nope",
        "/bygherre/public/nope",
        "/photoreports/public/nope",
    ] {
        let (status, body) = app.call(public_request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_bodies_are_bad_requests(app: TestApp) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/order-confirmation/public/whatever/respond")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request builds");
    let (status, body) = app.call(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activation_without_a_confirmation_is_not_found(app: TestApp) {
    let task_id = app.seed_task();
    let (status, body) = app
        .call(staff_request(
            Method::POST,
            "/order-confirmation/activate",
            "admin",
            Some(json!({ "taskId": task_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app
        .call(staff_request(
            Method::GET,
            &format!("/order-confirmation/task/{task_id}"),
            "technician",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn photo_report_review_flow(app: TestApp) {
    let task_id = app.seed_task();
    let (status, draft) = app
        .call(staff_request(
            Method::POST,
            "/photoreports",
            "technician",
            Some(json!({
                "taskId": task_id,
                "damages": [
                    { "id": "d1", "item": "Vindue", "type": "ridse" },
                    { "id": "d2", "item": "Dør", "type": "bule" },
                ],
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["status"], "draft");
    let id = draft["id"].as_str().expect("report id").to_owned();

    let (status, sent) = app
        .call(staff_request(
            Method::POST,
            &format!("/photoreports/{id}/send"),
            "technician",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = token_of(&sent);

    let (status, public) = app
        .call(public_request(
            Method::GET,
            &format!("/photoreports/public/{token}"),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(public.get("token").is_none());
    assert_eq!(public["task"]["taskNumber"], "T-2001");

    let (status, receipt) = app
        .call(public_request(
            Method::POST,
            &format!("/photoreports/public/{token}/submit"),
            Some(json!({
                "damages": [
                    { "id": "d1", "status": "approved" },
                    { "id": "d2", "status": "rejected", "customerNote": "Var der før" },
                ],
                "reviewerName": "Anne Lund",
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["approvedCount"], 1);
    assert_eq!(receipt["totalCount"], 2);

    let (status, _) = app
        .call(staff_request(
            Method::PUT,
            &format!("/photoreports/{id}"),
            "technician",
            Some(json!({ "notes": "too late" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bygherre_sending_is_admin_only(app: TestApp) {
    let task_id = app.seed_task();
    let (status, body) = app
        .call(staff_request(
            Method::POST,
            "/bygherre/send",
            "technician_admin",
            Some(json!({ "taskId": task_id, "type": "confirm_task" })),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn communications_list_carries_a_task_summary(app: TestApp) {
    let task_id = app.seed_task();
    let (status, _) = app
        .call(staff_request(
            Method::POST,
            "/order-confirmation/send",
            "admin",
            Some(json!({ "taskId": task_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(staff_request(
            Method::GET,
            &format!("/communications?taskId={task_id}"),
            "technician",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["summary"]["smsSent"], true);
    assert_eq!(body["summary"]["emailSent"], true);

    let (status, all) = app
        .call(staff_request(
            Method::GET,
            "/communications?limit=1",
            "technician",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["entries"].as_array().map(Vec::len), Some(1));
    assert!(all.get("summary").is_none());
}
