use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use rusqlite::Connection;
use serde_json::{json, Value};

use std::sync::{Arc, Mutex};

use taskboard::data::init_schema;
use taskboard::store::adapter::SqliteStore;

fn client() -> Client {
    let connection = Connection::open_in_memory().unwrap();
    init_schema(&connection).unwrap();
    let adapter = SqliteStore::new(Arc::new(Mutex::new(connection)));
    Client::tracked(taskboard::rocket(adapter)).unwrap()
}

fn post_task(client: &Client, body: Value) -> rocket::local::blocking::LocalResponse {
    client
        .post("/tasks")
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
}

#[test]
fn create_list_and_toggle_a_task() {
    let client = client();

    let response = post_task(
        &client,
        json!({"title": "Buy milk", "dueDate": "2024-01-10", "category": "general"}),
    );
    assert_eq!(response.status(), Status::Created);
    let created: Value = response.into_json().unwrap();
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(created["priority"], "medium");
    assert_eq!(created["completed"], false);
    assert_eq!(created["completedAt"], Value::Null);

    let listed: Value = client.get("/tasks").dispatch().into_json().unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["title"], "Buy milk");

    // Toggle on: completed and completedAt move together.
    let response = client.patch(format!("/tasks/{}/complete", id)).dispatch();
    assert_eq!(response.status(), Status::NoContent);
    let listed: Value = client.get("/tasks").dispatch().into_json().unwrap();
    assert_eq!(listed[0]["completed"], true);
    assert!(listed[0]["completedAt"].is_string());

    // Toggle off clears the timestamp again.
    client.patch(format!("/tasks/{}/complete", id)).dispatch();
    let listed: Value = client.get("/tasks").dispatch().into_json().unwrap();
    assert_eq!(listed[0]["completed"], false);
    assert_eq!(listed[0]["completedAt"], Value::Null);
}

#[test]
fn invalid_task_body_returns_a_field_error_map() {
    let client = client();

    let response = post_task(&client, json!({"description": "no title"}));
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().unwrap();
    assert!(body["fieldErrors"]["title"][0]
        .as_str()
        .unwrap()
        .contains("required"));
    assert!(body["fieldErrors"]["dueDate"].is_array());

    let response = post_task(
        &client,
        json!({"title": "Buy milk", "dueDate": "2024-01-10", "priority": "urgent"}),
    );
    assert_eq!(response.status(), Status::BadRequest);

    assert!(client
        .get("/tasks")
        .dispatch()
        .into_json::<Value>()
        .unwrap()
        .as_array()
        .unwrap()
        .is_empty());
}

#[test]
fn search_matches_title_and_description() {
    let client = client();
    post_task(&client, json!({"title": "Buy milk", "dueDate": "2024-01-10"}));
    post_task(
        &client,
        json!({"title": "Laundry", "description": "wash the MILK jug", "dueDate": "2024-01-11"}),
    );
    post_task(&client, json!({"title": "Taxes", "dueDate": "2024-01-12"}));

    let found: Value = client
        .get("/tasks?search=milk")
        .dispatch()
        .into_json()
        .unwrap();
    assert_eq!(found.as_array().unwrap().len(), 2);
}

#[test]
fn update_and_delete_tasks() {
    let client = client();
    let created: Value = post_task(&client, json!({"title": "Buy milk", "dueDate": "2024-01-10"}))
        .into_json()
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = client
        .put(format!("/tasks/{}", id))
        .header(ContentType::JSON)
        .body(json!({"title": "Buy oat milk"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::NoContent);

    let listed: Value = client.get("/tasks").dispatch().into_json().unwrap();
    assert_eq!(listed[0]["title"], "Buy oat milk");
    assert_eq!(listed[0]["dueDate"], "2024-01-10");

    let response = client
        .put("/tasks/9999")
        .header(ContentType::JSON)
        .body(json!({"title": "Ghost"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::NotFound);

    let response = client.delete(format!("/tasks/{}", id)).dispatch();
    assert_eq!(response.status(), Status::NoContent);
    let listed: Value = client.get("/tasks").dispatch().into_json().unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

#[test]
fn schedule_crud_round_trip() {
    let client = client();

    let response = client
        .post("/schedules")
        .header(ContentType::JSON)
        .body(json!({"title": "Dentist", "date": "2024-02-01", "time": "14:30"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Created);
    let created: Value = response.into_json().unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["category"], "general");

    let response = client
        .post("/schedules")
        .header(ContentType::JSON)
        .body(json!({"title": "No time", "date": "2024-02-01"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);

    let response = client
        .put(format!("/schedules/{}", id))
        .header(ContentType::JSON)
        .body(json!({"time": "16:00"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::NoContent);

    client.patch(format!("/schedules/{}/complete", id)).dispatch();
    let listed: Value = client.get("/schedules").dispatch().into_json().unwrap();
    assert_eq!(listed[0]["time"], "16:00");
    assert_eq!(listed[0]["completed"], true);

    let response = client.delete(format!("/schedules/{}", id)).dispatch();
    assert_eq!(response.status(), Status::NoContent);
    let listed: Value = client.get("/schedules").dispatch().into_json().unwrap();
    assert!(listed.as_array().unwrap().is_empty());
}

#[test]
fn invalid_schedule_patch_is_rejected() {
    let client = client();

    let created: Value = client
        .post("/schedules")
        .header(ContentType::JSON)
        .body(json!({"title": "Dentist", "date": "2024-02-01", "time": "14:30"}).to_string())
        .dispatch()
        .into_json()
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = client
        .put(format!("/schedules/{}", id))
        .header(ContentType::JSON)
        .body(json!({"date": "not-a-date", "time": "25:99"}).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().unwrap();
    assert!(body["fieldErrors"]["date"].is_array());
    assert!(body["fieldErrors"]["time"].is_array());

    // The stored record is untouched.
    let listed: Value = client.get("/schedules").dispatch().into_json().unwrap();
    assert_eq!(listed[0]["date"], "2024-02-01");
    assert_eq!(listed[0]["time"], "14:30");
}

#[test]
fn responses_carry_permissive_cors_headers() {
    let client = client();

    let response = client.get("/tasks").dispatch();
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );

    let response = client.options("/tasks").dispatch();
    assert_eq!(response.status(), Status::NoContent);
    assert!(response
        .headers()
        .get_one("Access-Control-Allow-Methods")
        .unwrap()
        .contains("PATCH"));
}
