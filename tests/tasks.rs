mod common;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{rt, test, App, HttpServer};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::TcpListener;
use taskdesk::models::Task;

use common::{context, register_user, TestUser};

async fn create_task(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    user: &TestUser,
    payload: Value,
) -> Task {
    let req = test::TestRequest::post()
        .uri("/tasks")
        .insert_header(user.bearer())
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "payload {}", payload);
    test::read_body_json(resp).await
}

#[actix_rt::test]
async fn test_create_task_unauthorized() {
    let ctx = context();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let server_state = ctx.state.clone();
    let server_handle = rt::spawn(async move {
        HttpServer::new(move || {
            let state = server_state.clone();
            App::new()
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .configure(move |cfg| state.configure(cfg))
        })
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let request_url = format!("http://127.0.0.1:{}/tasks", port);

    let resp = client
        .post(&request_url)
        .json(&json!({ "description": "Unauthorized task" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("json error body");
    assert_eq!(body, json!({ "error": "Please authenticate." }));

    let resp = client
        .get(&request_url)
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    server_handle.abort();
}

#[actix_rt::test]
async fn test_task_crud_flow() {
    let ctx = context();
    let state = ctx.state.clone();
    let app = test::init_service(
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| state.configure(cfg)),
    )
    .await;

    let user = register_user(&app, "Ada", "ada@example.com", "secret12")
        .await
        .unwrap();

    let created = create_task(&app, &user, json!({ "description": "  Write report  " })).await;
    assert_eq!(created.description, "Write report");
    assert!(!created.completed);
    assert_eq!(created.owner.to_string(), user.user["id"].as_str().unwrap());

    // Read back
    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Task = test::read_body_json(resp).await;
    assert_eq!(fetched.id, created.id);

    // Invalid field
    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(user.bearer())
        .set_json(&json!({ "completed": true, "owner": "someone-else" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid updates!");

    // Valid update
    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(user.bearer())
        .set_json(&json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Task = test::read_body_json(resp).await;
    assert!(updated.completed);
    assert_eq!(updated.description, "Write report");

    // Empty description is rejected
    let req = test::TestRequest::patch()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(user.bearer())
        .set_json(&json!({ "description": "   " }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    // Delete returns the task, then it's gone
    let req = test::TestRequest::delete()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted: Task = test::read_body_json(resp).await;
    assert_eq!(deleted.id, created.id);

    let req = test::TestRequest::get()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/tasks/{}", created.id))
        .insert_header(user.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_task_validation() {
    let ctx = context();
    let state = ctx.state.clone();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let user = register_user(&app, "Ada", "ada@example.com", "secret12")
        .await
        .unwrap();

    let cases = [
        (json!({ "description": "" }), StatusCode::UNPROCESSABLE_ENTITY),
        (json!({ "description": "x".repeat(1001) }), StatusCode::UNPROCESSABLE_ENTITY),
        (json!({}), StatusCode::BAD_REQUEST),
        (json!({ "description": "ok", "owner": "me" }), StatusCode::BAD_REQUEST),
    ];
    for (payload, expected) in cases {
        let req = test::TestRequest::post()
            .uri("/tasks")
            .insert_header(user.bearer())
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), expected, "payload {}", payload);
    }
}

#[actix_rt::test]
async fn test_task_ownership_and_authorization() {
    let ctx = context();
    let state = ctx.state.clone();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let owner = register_user(&app, "Owner", "owner@example.com", "secret12")
        .await
        .unwrap();
    let intruder = register_user(&app, "Intruder", "intruder@example.com", "secret12")
        .await
        .unwrap();

    let task = create_task(&app, &owner, json!({ "description": "private" })).await;
    let uri = format!("/tasks/{}", task.id);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(intruder.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(intruder.bearer())
        .set_json(&json!({ "completed": true }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(intruder.bearer())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/tasks")
        .insert_header(intruder.bearer())
        .to_request();
    let listed: Vec<Task> = test::read_body_json(test::call_service(&app, req).await).await;
    assert!(listed.is_empty());

    // Still intact for its owner.
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(owner.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Task = test::read_body_json(resp).await;
    assert!(!fetched.completed);

    let req = test::TestRequest::get().uri(&uri).to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[test_log::test(actix_rt::test)]
async fn test_list_tasks_filter_sort_and_page() {
    let ctx = context();
    let state = ctx.state.clone();
    let app = test::init_service(App::new().configure(|cfg| state.configure(cfg))).await;

    let user = register_user(&app, "Ada", "ada@example.com", "secret12")
        .await
        .unwrap();
    for (description, completed) in [("b", true), ("a", false), ("d", true), ("c", false)] {
        create_task(
            &app,
            &user,
            json!({ "description": description, "completed": completed }),
        )
        .await;
    }

    let list = |query: &str| {
        test::TestRequest::get()
            .uri(&format!("/tasks{}", query))
            .insert_header(user.bearer())
            .to_request()
    };
    let descriptions = |tasks: &[Task]| -> Vec<String> {
        tasks.iter().map(|task| task.description.clone()).collect()
    };

    let all: Vec<Task> = test::read_body_json(test::call_service(&app, list("")).await).await;
    assert_eq!(all.len(), 4);

    let done: Vec<Task> =
        test::read_body_json(test::call_service(&app, list("?completed=true")).await).await;
    assert_eq!(descriptions(&done).len(), 2);
    assert!(done.iter().all(|task| task.completed));

    let sorted: Vec<Task> = test::read_body_json(
        test::call_service(&app, list("?sortBy=description:desc")).await,
    )
    .await;
    assert_eq!(descriptions(&sorted), vec!["d", "c", "b", "a"]);

    let page: Vec<Task> = test::read_body_json(
        test::call_service(&app, list("?sortBy=description:asc&limit=2&skip=1")).await,
    )
    .await;
    assert_eq!(descriptions(&page), vec!["b", "c"]);

    for bad in ["?sortBy=owner:asc", "?limit=0", "?skip=-1", "?completed=maybe"] {
        let resp = test::call_service(&app, list(bad)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {}", bad);
    }
}
