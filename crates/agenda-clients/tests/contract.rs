//! HTTP contract tests for the upstream clients.
//!
//! Each test stands up a mock upstream and checks the exact request shape
//! (method, path, query, headers, body) and the decoding of its answer.

use agenda_clients::{EmailClient, TasksClient, UsersClient};
use agenda_core::error::AgendaError;
use agenda_core::traits::{AuthService, NotificationService, TaskService, UserService};
use agenda_core::types::{
    BearerToken, LoginRequest, NotificationRequest, NotificationStatus, Phone, TaskRequest, TimeWindow,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn task_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "nomeTarefa": "Standup",
        "descricao": "Daily sync",
        "dataEvento": "18-10-2026 10:30:00",
        "emailUsuario": "ana@example.com",
        "statusNotificacaoEnum": "PENDENTE"
    })
}

fn tasks_client(server: &MockServer) -> TasksClient {
    TasksClient::new(format!("{}/tarefas", server.uri()), reqwest::Client::new())
}

fn token() -> BearerToken {
    BearerToken::new("Bearer jwt-123")
}

// ────────────────────────────────────────────────────────────────────────────
// Task service
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_window_query_sends_iso_bounds_and_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tarefas/eventos"))
        .and(query_param("dataInicial", "2026-10-18T10:00:00"))
        .and(query_param("dataFinal", "2026-10-18T11:00:00"))
        .and(header("Authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json("A"), task_json("B")])))
        .expect(1)
        .mount(&server)
        .await;

    let window = TimeWindow::lookahead(at(10, 0), Duration::hours(1));
    let tasks = tasks_client(&server).tasks_in_window(&window, &token()).await.unwrap();

    let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["A", "B"]);
    assert_eq!(tasks[0].event_at, Some(at(10, 30)));
}

#[tokio::test]
async fn test_status_patch_uses_query_parameters() {
    let server = MockServer::start().await;

    let mut patched = task_json("A");
    patched["statusNotificacaoEnum"] = json!("NOTIFICADO");

    Mock::given(method("PATCH"))
        .and(path("/tarefas"))
        .and(query_param("status", "NOTIFICADO"))
        .and(query_param("id", "A"))
        .and(header("Authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patched))
        .expect(1)
        .mount(&server)
        .await;

    let task = tasks_client(&server)
        .update_status(NotificationStatus::Notified, "A", &token())
        .await
        .unwrap();
    assert_eq!(task.status, NotificationStatus::Notified);
}

#[tokio::test]
async fn test_create_task_sends_wire_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tarefas"))
        .and(body_json(json!({
            "nomeTarefa": "Standup",
            "descricao": "Daily sync",
            "dataEvento": "18-10-2026 10:30:00"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json("new-id")))
        .expect(1)
        .mount(&server)
        .await;

    let request = TaskRequest {
        name: "Standup".into(),
        description: "Daily sync".into(),
        event_at: Some(at(10, 30)),
    };
    let task = tasks_client(&server).create_task(&request, &token()).await.unwrap();
    assert_eq!(task.id, "new-id");
}

#[tokio::test]
async fn test_delete_of_missing_task_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/tarefas"))
        .and(query_param("id", "gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Tarefa não encontrada"))
        .expect(1)
        .mount(&server)
        .await;

    let err = tasks_client(&server).delete_task("gone", &token()).await.unwrap_err();
    assert!(matches!(err, AgendaError::NotFound(ref m) if m.contains("encontrada")));
}

#[tokio::test]
async fn test_server_error_is_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tarefas"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = tasks_client(&server).tasks_for_owner(&token()).await.unwrap_err();
    assert!(matches!(err, AgendaError::Upstream { status: Some(500), .. }));
}

#[tokio::test]
async fn test_undecodable_body_is_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tarefas"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = tasks_client(&server).tasks_for_owner(&token()).await.unwrap_err();
    assert!(matches!(err, AgendaError::Upstream { status: None, .. }));
}

#[tokio::test]
async fn test_unreachable_service_is_upstream_failure() {
    let client = TasksClient::new("http://127.0.0.1:1/tarefas", reqwest::Client::new());
    let err = client.tasks_for_owner(&token()).await.unwrap_err();
    assert!(matches!(err, AgendaError::Upstream { status: None, .. }));
}

// ────────────────────────────────────────────────────────────────────────────
// User service
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_token_text() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usuario/login"))
        .and(body_json(json!({"email": "robot@example.com", "senha": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("Bearer abc.def.ghi\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = UsersClient::new(server.uri(), reqwest::Client::new());
    let token = client
        .login(&LoginRequest::new("robot@example.com", "s3cret"))
        .await
        .unwrap();
    assert_eq!(token.header_value(), "Bearer abc.def.ghi");
}

#[tokio::test]
async fn test_login_rejected_is_auth_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usuario/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Credenciais inválidas"))
        .mount(&server)
        .await;

    let client = UsersClient::new(server.uri(), reqwest::Client::new());
    let err = client
        .login(&LoginRequest::new("robot@example.com", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AgendaError::AuthFailed(ref m) if m == "Credenciais inválidas"));
    assert_eq!(err.kind(), "auth_failed");
}

#[tokio::test]
async fn test_find_user_by_email() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/usuario"))
        .and(query_param("email", "ana@example.com"))
        .and(header("Authorization", "Bearer jwt-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nome": "Ana",
            "email": "ana@example.com",
            "enderecos": [{"id": 7, "rua": "Rua A", "numero": 10, "cidade": "Recife", "estado": "PE", "cep": "50000-000"}],
            "telefones": [{"id": 3, "numero": "99999-0000", "ddd": "81"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = UsersClient::new(server.uri(), reqwest::Client::new());
    let user = client.find_by_email("ana@example.com", &token()).await.unwrap();
    assert_eq!(user.name, "Ana");
    assert_eq!(user.addresses[0].id, Some(7));
    assert_eq!(user.phones[0].area_code, "81");
}

#[tokio::test]
async fn test_delete_user_puts_email_in_path() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/usuario/ana@example.com"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = UsersClient::new(server.uri(), reqwest::Client::new());
    client.delete_by_email("ana@example.com", &token()).await.unwrap();
}

#[tokio::test]
async fn test_update_phone_sends_id_query() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/usuario/telefone"))
        .and(query_param("id", "3"))
        .and(body_partial_json(json!({"numero": "98888-1111", "ddd": "81"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "numero": "98888-1111", "ddd": "81"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = UsersClient::new(server.uri(), reqwest::Client::new());
    let phone = Phone {
        id: None,
        number: "98888-1111".into(),
        area_code: "81".into(),
    };
    let updated = client.update_phone(3, &phone, &token()).await.unwrap();
    assert_eq!(updated.id, Some(3));
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/usuario"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Email já cadastrado"))
        .mount(&server)
        .await;

    let client = UsersClient::new(server.uri(), reqwest::Client::new());
    let err = client.register(&Default::default()).await.unwrap_err();
    assert!(matches!(err, AgendaError::Conflict(_)));
}

// ────────────────────────────────────────────────────────────────────────────
// Notification service
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_notify_posts_task_projection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/email"))
        .and(body_partial_json(json!({
            "id": "A",
            "emailUsuario": "ana@example.com",
            "nomeTarefa": "Standup",
            "dataEvento": "18-10-2026 10:30:00"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = EmailClient::new(format!("{}/email", server.uri()), reqwest::Client::new());
    let request = NotificationRequest {
        id: "A".into(),
        owner_email: "ana@example.com".into(),
        name: "Standup".into(),
        description: "Daily sync".into(),
        event_at: Some(at(10, 30)),
        status: NotificationStatus::Pending,
    };
    client.notify(&request).await.unwrap();
}

#[tokio::test]
async fn test_notify_failure_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = EmailClient::new(server.uri(), reqwest::Client::new());
    let request = NotificationRequest {
        id: "A".into(),
        owner_email: "ana@example.com".into(),
        name: "Standup".into(),
        description: String::new(),
        event_at: None,
        status: NotificationStatus::Pending,
    };
    let err = client.notify(&request).await.unwrap_err();
    assert!(matches!(err, AgendaError::Upstream { status: Some(503), .. }));
}
