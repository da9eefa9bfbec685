//! Project and task tests, including the project access gate

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::*;

struct Fixture {
    app: TestApp,
    manager: User,
    member: User,
    outsider: User,
    team: Team,
    project: Project,
}

fn fixture() -> Fixture {
    let app = TestApp::new();
    let conn = app.conn();
    let manager = create_test_user(&conn, "Max", "max@example.com", UserRole::Manager);
    let member = create_test_user(&conn, "Mia", "mia@example.com", UserRole::Member);
    let outsider = create_test_user(&conn, "Olaf", "olaf@example.com", UserRole::Member);
    let team = create_test_team(&conn, "Core", &manager);
    queries::add_team_member(&conn, &team.id, &member.id, Some("dev")).unwrap();
    let project = create_test_project(&conn, "Apollo", &team);
    drop(conn);

    Fixture {
        app,
        manager,
        member,
        outsider,
        team,
        project,
    }
}

#[tokio::test]
async fn create_project_defaults_to_in_progress() {
    let f = fixture();

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            Some(&f.app.token_for(&f.manager)),
            Some(json!({ "name": "Gemini", "description": "Second stage", "teamId": f.team.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["project"]["status"], "in_progress");
    assert_eq!(body["project"]["managerId"], f.manager.id.as_str());
    assert_eq!(body["project"]["teamId"], f.team.id.as_str());
}

#[tokio::test]
async fn create_project_validation() {
    let f = fixture();
    let token = f.app.token_for(&f.manager);

    let cases = [
        (json!({ "name": "Gemini" }), StatusCode::BAD_REQUEST, "name and teamId are required"),
        (
            json!({ "name": "Gemini", "teamId": f.team.id, "status": "archived" }),
            StatusCode::BAD_REQUEST,
            "Invalid status",
        ),
        (
            json!({ "name": "Gemini", "teamId": "missing" }),
            StatusCode::NOT_FOUND,
            "Team not found or not managed by you",
        ),
    ];

    for (body, status, message) in cases {
        let response = f
            .app
            .router()
            .oneshot(json_request("POST", "/api/projects", Some(&token), Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), status);
        assert_eq!(body_json(response).await["message"], message);
    }

    // Members are not allowed at all
    let response = f
        .app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            Some(&f.app.token_for(&f.member)),
            Some(json!({ "name": "Gemini", "teamId": f.team.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn another_managers_team_is_not_found() {
    let f = fixture();
    let other = create_test_user(&f.app.conn(), "Oz", "oz@example.com", UserRole::Manager);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/projects",
            Some(&f.app.token_for(&other)),
            Some(json!({ "name": "Hijack", "teamId": f.team.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn project_gate() {
    let f = fixture();
    let uri = format!("/api/projects/{}", f.project.id);

    for user in [&f.manager, &f.member] {
        let response = f
            .app
            .router()
            .oneshot(json_request("GET", &uri, Some(&f.app.token_for(user)), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["project"]["name"], "Apollo");
        assert_eq!(body["project"]["team"]["members"][0]["roleInTeam"], "dev");
        assert!(body["project"]["tasks"].as_array().unwrap().is_empty());
    }

    let response = f
        .app
        .router()
        .oneshot(json_request("GET", &uri, Some(&f.app.token_for(&f.outsider)), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "GET",
            "/api/projects/missing/tasks",
            Some(&f.app.token_for(&f.manager)),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Project not found");

    let response = f
        .app
        .router()
        .oneshot(json_request("GET", &uri, None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn project_listing_covers_managed_and_member_projects() {
    let f = fixture();

    for (user, expected) in [(&f.manager, 1), (&f.member, 1), (&f.outsider, 0)] {
        let response = f
            .app
            .router()
            .oneshot(json_request("GET", "/api/projects", Some(&f.app.token_for(user)), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["projects"].as_array().unwrap().len(), expected);
    }
}

#[tokio::test]
async fn only_the_project_manager_updates_the_project() {
    let f = fixture();
    let uri = format!("/api/projects/{}", f.project.id);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&f.app.token_for(&f.member)),
            Some(json!({ "status": "completed" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&f.app.token_for(&f.manager)),
            Some(json!({ "status": "on_hold", "description": "Paused" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["project"]["status"], "on_hold");
    assert_eq!(body["project"]["description"], "Paused");

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&f.app.token_for(&f.manager)),
            Some(json!({ "description": null })),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["project"]["description"].is_null());
    assert_eq!(body["project"]["status"], "on_hold");

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &uri,
            Some(&f.app.token_for(&f.manager)),
            Some(json!({ "status": "archived" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn task_lifecycle() {
    let f = fixture();
    let member_token = f.app.token_for(&f.member);
    let tasks_uri = format!("/api/projects/{}/tasks", f.project.id);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "POST",
            &tasks_uri,
            Some(&member_token),
            Some(json!({ "title": "Write docs", "assignedTo": f.member.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["task"]["status"], "todo");
    assert_eq!(body["task"]["createdBy"], f.member.id.as_str());
    assert_eq!(body["task"]["assignedTo"], f.member.id.as_str());
    let task_id = body["task"]["id"].as_str().unwrap().to_string();
    let task_uri = format!("{}/{}", tasks_uri, task_id);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &task_uri,
            Some(&member_token),
            Some(json!({ "status": "done", "assignedTo": null })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["task"]["status"], "done");
    assert!(body["task"]["assignedTo"].is_null());

    let response = f
        .app
        .router()
        .oneshot(json_request("GET", &tasks_uri, Some(&member_token), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);

    let response = f
        .app
        .router()
        .oneshot(json_request("DELETE", &task_uri, Some(&member_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = f
        .app
        .router()
        .oneshot(json_request("DELETE", &task_uri, Some(&member_token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Task not found");
}

#[tokio::test]
async fn tasks_only_assignable_to_team_members() {
    let f = fixture();
    let token = f.app.token_for(&f.manager);
    let tasks_uri = format!("/api/projects/{}/tasks", f.project.id);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "POST",
            &tasks_uri,
            Some(&token),
            Some(json!({ "title": "Audit", "assignedTo": f.outsider.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "assignedTo must be a team member");

    let task = queries::create_task(
        &f.app.conn(),
        &f.project.id,
        &NewTask {
            title: "Audit".into(),
            status: TaskStatus::Todo,
            created_by: f.manager.id.clone(),
            assigned_to: None,
        },
    )
    .unwrap();

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &format!("{}/{}", tasks_uri, task.id),
            Some(&token),
            Some(json!({ "assignedTo": f.outsider.id })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &format!("{}/{}", tasks_uri, task.id),
            Some(&token),
            Some(json!({ "status": "blocked" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid status");

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "POST",
            &tasks_uri,
            Some(&token),
            Some(json!({ "title": "  " })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "title is required");
}

#[tokio::test]
async fn tasks_are_scoped_to_their_project() {
    let f = fixture();
    let other_project = create_test_project(&f.app.conn(), "Zephyr", &f.team);
    let task = queries::create_task(
        &f.app.conn(),
        &f.project.id,
        &NewTask {
            title: "Scoped".into(),
            status: TaskStatus::Todo,
            created_by: f.manager.id.clone(),
            assigned_to: None,
        },
    )
    .unwrap();

    let response = f
        .app
        .router()
        .oneshot(json_request(
            "PATCH",
            &format!("/api/projects/{}/tasks/{}", other_project.id, task.id),
            Some(&f.app.token_for(&f.manager)),
            Some(json!({ "status": "done" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
