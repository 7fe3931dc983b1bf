//! Session/participant API round-trips against a single-node mock
//! coordinator. The node reports itself as leader, so every business call
//! routes straight to it; failover behavior is covered in
//! `tests/connection.rs`.

use serde_json::json;
use tokio_test::assert_ok;
use txcoord_client::{Client, Error, ParticipantCommit, ParticipantJoin};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn data(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": body }))
}

/// Boot a mock node that is the leader of a one-member replica set and
/// return a connected client for it.
async fn single_node_client(server: &MockServer) -> Client {
    let host = server.address().to_string();
    let member = json!({ "ID": "n1", "Host": host });

    Mock::given(method("GET"))
        .and(path("/api/sys/nconf"))
        .respond_with(data(member.clone()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sys/rsconf"))
        .respond_with(data(json!({
            "RsName": "rs0",
            "Nodes": [member.clone()],
            "Leader": member,
        })))
        .mount(server)
        .await;

    Client::connect(&format!("http://{}", host)).await.unwrap()
}

fn session_body(id: &str, state: &str) -> serde_json::Value {
    json!({
        "id": id,
        "state": state,
        "timeout": 60,
        "retries": 0,
        "createdAt": "2024-03-01T10:00:00Z",
    })
}

#[tokio::test]
async fn start_session_posts_the_default_body() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .and(body_json(json!({})))
        .respond_with(data(session_body("s-1", "Started")))
        .expect(1)
        .mount(&server)
        .await;

    let session = assert_ok!(client.start_session().await);
    assert_eq!(session.id, "s-1");
    assert_eq!(session.state, "Started");
    assert_eq!(session.timeout, 60);
}

#[tokio::test]
async fn session_from_id_fetches_by_path() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sessions/s-7"))
        .respond_with(data(session_body("s-7", "Started")))
        .mount(&server)
        .await;

    let session = assert_ok!(client.session_from_id("s-7").await);
    assert_eq!(session.id, "s-7");
}

#[tokio::test]
async fn join_sends_client_and_request_ids() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-1/join"))
        .and(body_json(json!({
            "clientId": "svc-orders",
            "requestId": "req-99",
        })))
        .respond_with(data(json!({
            "id": 7,
            "sessionId": "s-1",
            "clientId": "svc-orders",
            "requestId": "req-99",
            "state": "Joined",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let participant = assert_ok!(
        client
            .join_session(
                "s-1",
                &ParticipantJoin {
                    client_id: "svc-orders".into(),
                    request_id: "req-99".into(),
                },
            )
            .await
    );
    assert_eq!(participant.id, 7);
    assert_eq!(participant.session_id, "s-1");
    assert_eq!(participant.state, "Joined");
}

#[tokio::test]
async fn partial_commit_carries_the_participant_actions() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-1/partial-commit"))
        .and(body_json(json!({
            "participantId": 7,
            "compensate": {
                "data": {"orderId": 1842},
                "uri": "http://svc-orders/compensate",
                "status": "",
                "invokedCount": 0,
            },
            "complete": null,
        })))
        .respond_with(data(json!({
            "id": 7,
            "sessionId": "s-1",
            "clientId": "svc-orders",
            "requestId": "req-99",
            "state": "PartialCommitted",
            "compensateAction": {
                "data": {"orderId": 1842},
                "uri": "http://svc-orders/compensate",
                "status": "Pending",
                "invokedCount": 0,
            },
        })))
        .mount(&server)
        .await;

    let body = ParticipantCommit {
        id: 7,
        compensate: Some(txcoord_client::ParticipantAction {
            data: json!({"orderId": 1842}),
            uri: Some("http://svc-orders/compensate".into()),
            ..Default::default()
        }),
        complete: None,
    };

    let participant = assert_ok!(client.partial_commit("s-1", &body).await);
    assert_eq!(participant.state, "PartialCommitted");
    let action = participant.compensate_action.unwrap();
    assert_eq!(action.status, "Pending");
    assert_eq!(action.data["orderId"], 1842);
}

#[tokio::test]
async fn commit_and_abort_return_the_final_session_state() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-1/commit"))
        .and(body_json(json!({})))
        .respond_with(data(session_body("s-1", "Committed")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-2/abort"))
        .and(body_json(json!({})))
        .respond_with(data(session_body("s-2", "Aborted")))
        .mount(&server)
        .await;

    assert_eq!(
        client.commit_session("s-1").await.unwrap().state,
        "Committed"
    );
    assert_eq!(client.abort_session("s-2").await.unwrap().state, "Aborted");
}

#[tokio::test]
async fn server_errors_surface_verbatim_without_retry() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sessions/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "err": "session not found",
            "msg": "no session with id missing",
        })))
        .expect(1) // terminal: exactly one attempt
        .mount(&server)
        .await;

    match client.session_from_id("missing").await {
        Err(Error::Server { status, err, msg }) => {
            assert_eq!(status, 404);
            assert_eq!(err, "session not found");
            assert_eq!(msg, "no session with id missing");
        }
        other => panic!("expected server error, got {:?}", other.map(|s| s.id)),
    }
}

#[tokio::test]
async fn malformed_envelopes_are_terminal_decode_errors() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sessions/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .expect(1)
        .mount(&server)
        .await;

    assert!(matches!(
        client.session_from_id("s-1").await,
        Err(Error::Decode(_))
    ));
}

#[tokio::test]
async fn full_commit_lifecycle_against_one_coordinator() {
    let server = MockServer::start().await;
    let client = single_node_client(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sessions"))
        .respond_with(data(session_body("s-9", "Started")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-9/join"))
        .respond_with(data(json!({
            "id": 1,
            "sessionId": "s-9",
            "clientId": "c-1",
            "requestId": "1",
            "state": "Joined",
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-9/partial-commit"))
        .respond_with(data(json!({
            "id": 1,
            "sessionId": "s-9",
            "clientId": "c-1",
            "requestId": "1",
            "state": "PartialCommitted",
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sessions/s-9/commit"))
        .respond_with(data(session_body("s-9", "Committed")))
        .mount(&server)
        .await;

    let session = client.start_session().await.unwrap();
    for (client_id, request_id) in [("c-1", "1"), ("c-2", "2"), ("c-3", "3")] {
        let participant = client
            .join_session(
                &session.id,
                &ParticipantJoin {
                    client_id: client_id.into(),
                    request_id: request_id.into(),
                },
            )
            .await
            .unwrap();
        client
            .partial_commit(
                &session.id,
                &ParticipantCommit {
                    id: participant.id,
                    compensate: None,
                    complete: None,
                },
            )
            .await
            .unwrap();
    }
    let done = client.commit_session(&session.id).await.unwrap();
    assert_eq!(done.state, "Committed");
}
