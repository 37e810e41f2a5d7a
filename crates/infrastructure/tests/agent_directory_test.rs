use mockito::{Matcher, Server};
use serde_json::json;

use allocator_core::{
    config::DirectoryConfig,
    traits::{AgentDirectory, AssignCommand},
    AllocatorError,
};
use allocator_infrastructure::HttpAgentDirectory;

fn directory_for(server: &Server) -> HttpAgentDirectory {
    let config = DirectoryConfig {
        base_url: server.url(),
        app_id: "app-1".to_string(),
        secret_key: "secret-1".to_string(),
        request_timeout_seconds: 2,
        ..Default::default()
    };
    HttpAgentDirectory::new(&config).unwrap()
}

#[tokio::test]
async fn test_agent_load_reads_first_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/admin/agents/get_by_ids")
        .match_query(Matcher::UrlEncoded("ids[]".into(), "42".into()))
        .match_header("Qiscus-App-Id", "app-1")
        .match_header("Qiscus-Secret-Key", "secret-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "data": [
                    {"id": 42, "name": "Alice", "current_customer_count": 1, "email": "a@example.com"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let agent = directory_for(&server).agent_load(42).await.unwrap();

    assert_eq!(agent.id, 42);
    assert_eq!(agent.name, "Alice");
    assert_eq!(agent.current_customer_count, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_agent_load_empty_data_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/admin/agents/get_by_ids")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"data": []}).to_string())
        .create_async()
        .await;

    let result = directory_for(&server).agent_load(9).await;

    assert!(matches!(result, Err(AllocatorError::AgentNotFound { id: 9 })));
}

#[tokio::test]
async fn test_non_200_maps_to_directory_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/admin/agents/get_by_ids")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let result = directory_for(&server).agent_load(1).await;

    match result {
        Err(AllocatorError::DirectoryStatus { status, operation }) => {
            assert_eq!(status, 503);
            assert_eq!(operation, "get_by_ids");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_available_agents_preserves_directory_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v2/admin/service/available_agents")
        .match_query(Matcher::UrlEncoded("room_id".into(), "r1".into()))
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "agents": [
                        {"id": 1, "name": "A", "current_customer_count": 5},
                        {"id": 2, "name": "B", "current_customer_count": 2},
                        {"id": 3, "name": "C", "current_customer_count": 1}
                    ]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let agents = directory_for(&server).available_agents("r1").await.unwrap();

    let ids: Vec<i64> = agents.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_malformed_body_is_directory_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v2/admin/service/available_agents")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let result = directory_for(&server).available_agents("r1").await;

    assert!(matches!(result, Err(AllocatorError::Directory(_))));
}

#[tokio::test]
async fn test_assign_posts_form_fields() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/admin/service/assign_agent")
        .match_header("Qiscus-App-Id", "app-1")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("agent_id".into(), "42".into()),
            Matcher::UrlEncoded("room_id".into(), "r1".into()),
        ]))
        .with_status(200)
        .create_async()
        .await;

    directory_for(&server)
        .assign(&AssignCommand::new("r1", 42))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_assign_forwards_ceiling_when_set() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/admin/service/assign_agent")
        .match_body(Matcher::UrlEncoded("max_agent".into(), "3".into()))
        .with_status(200)
        .create_async()
        .await;

    directory_for(&server)
        .assign(&AssignCommand::new("r1", 7).with_max_agent(3))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_assign_failure_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/admin/service/assign_agent")
        .with_status(422)
        .create_async()
        .await;

    let error = directory_for(&server)
        .assign(&AssignCommand::new("r1", 42))
        .await
        .unwrap_err();

    assert!(error.is_transient());
    assert_eq!(error.to_string(), "坐席目录 assign_agent 返回状态码 422");
}
