use claims::assert_some;
use serde_json::json;
use serde_json::Value;
use wiremock::matchers::any;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::assert_mailchimp_exception;
use crate::helpers::assert_member_not_found;
use crate::helpers::mailchimp_exception;
use crate::helpers::spawn_app;
use crate::helpers::TestApp;

/// Path of the created member on MailChimp
fn remote_path(created: &Value) -> String {
    format!(
        "/lists/{}/members/{}",
        created["mail_chimp_list_id"].as_str().unwrap(),
        created["mail_chimp_email_id"].as_str().unwrap()
    )
}

/// MailChimp's answer to a PATCH that keeps the member's remote ids
fn remote_member(created: &Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": created["mail_chimp_email_id"],
        "list_id": created["mail_chimp_list_id"],
    }))
}

async fn no_remote_calls(app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;
}

#[tokio::test]
async fn update_member_ok() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(path(remote_path(&created)))
        .and(method("PATCH"))
        .and(body_json(json!({
            "email_address": created["email_address"],
            "status": "subscribed",
            "email_type": "text",
        })))
        .respond_with(remote_member(&created))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let member_id = created["member_id"].as_str().unwrap();
    let resp = app.put_member(member_id, &json!({"email_type": "text"})).await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email_type"], "text");
    for unchanged in [
        "member_id",
        "list_id",
        "mail_chimp_list_id",
        "mail_chimp_email_id",
        "email_address",
        "status",
    ] {
        assert_eq!(body[unchanged], created[unchanged], "{unchanged}");
    }
    assert_eq!(body["pending_sync"], false);

    let saved: Value = app.get_member(member_id).await.json().await.unwrap();
    assert_eq!(saved, body);
}

#[tokio::test]
async fn update_member_ignores_ids() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(path(remote_path(&created)))
        .and(method("PATCH"))
        .respond_with(remote_member(&created))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let member_id = created["member_id"].as_str().unwrap();
    let resp = app
        .put_member(
            member_id,
            &json!({"member_id": "other", "list_id": "L2", "status": "unsubscribed"}),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["member_id"], member_id);
    assert_eq!(body["list_id"], "L1");
    assert_eq!(body["status"], "unsubscribed");
}

#[tokio::test]
async fn update_member_invalid() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;
    no_remote_calls(&app).await;

    let member_id = created["member_id"].as_str().unwrap();
    for (body, field) in [
        (json!({"status": "invalid"}), "status"),
        (json!({"email_type": "invalid"}), "email_type"),
        (json!({"email_address": "not-an-email"}), "email_address"),
        (json!({"email_address": null}), "email_address"),
    ] {
        let resp = app.put_member(member_id, &body).await;
        assert_eq!(resp.status().as_u16(), 400, "{body}");

        let resp: Value = resp.json().await.unwrap();
        assert_eq!(resp["message"], "Invalid data given");
        assert_some!(resp["errors"].get(field), "{body}");
    }

    // nothing was written
    let saved: Value = app.get_member(member_id).await.json().await.unwrap();
    assert_eq!(saved, created);
}

#[tokio::test]
async fn update_member_duplicate_email() {
    let app = spawn_app().await;
    let first = app.create_synced_member("L1").await;
    let second = app.create_synced_member("L1").await;
    no_remote_calls(&app).await;

    let resp = app
        .put_member(
            second["member_id"].as_str().unwrap(),
            &json!({"email_address": first["email_address"]}),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 400);

    let resp: Value = resp.json().await.unwrap();
    assert_eq!(
        resp["errors"]["email_address"],
        json!(["The email address has already been taken."])
    );
}

#[tokio::test]
async fn update_member_same_email_is_not_a_duplicate() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(path(remote_path(&created)))
        .and(method("PATCH"))
        .respond_with(remote_member(&created))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app
        .put_member(
            created["member_id"].as_str().unwrap(),
            &json!({"email_address": created["email_address"], "status": "cleaned"}),
        )
        .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn update_member_not_found() {
    let app = spawn_app().await;
    no_remote_calls(&app).await;

    let resp = app
        .put_member("invalid-member-id", &json!({"status": "subscribed"}))
        .await;
    assert_member_not_found(resp, "invalid-member-id").await;
}

#[tokio::test]
async fn update_member_mailchimp_exception() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(path(remote_path(&created)))
        .and(method("PATCH"))
        .respond_with(mailchimp_exception())
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let member_id = created["member_id"].as_str().unwrap();
    let resp = app
        .put_member(member_id, &json!({"status": "unsubscribed"}))
        .await;
    assert_mailchimp_exception(resp).await;

    // the local change is kept, flagged for a later sync
    let saved: Value = app.get_member(member_id).await.json().await.unwrap();
    assert_eq!(saved["status"], "unsubscribed");
    assert_eq!(saved["pending_sync"], true);
    assert_eq!(saved["mail_chimp_email_id"], created["mail_chimp_email_id"]);
}

#[tokio::test]
async fn update_member_creates_unsynced_member_on_mailchimp() {
    let app = spawn_app().await;
    let member_id = app.create_pending_member("L1").await.to_string();

    Mock::given(path("/lists/L1/members"))
        .and(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "abc123", "list_id": "L1"})),
        )
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app
        .put_member(&member_id, &json!({"status": "pending"}))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["mail_chimp_email_id"], "abc123");
    assert_eq!(body["pending_sync"], false);
    assert!(body["last_synced_at"].is_string());
}

#[tokio::test]
async fn update_member_without_body_resyncs() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(path(remote_path(&created)))
        .and(method("PATCH"))
        .respond_with(remote_member(&created))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app
        .put_member(created["member_id"].as_str().unwrap(), &json!({}))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email_address"], created["email_address"]);
}

#[tokio::test]
async fn update_member_email_refreshes_remote_id() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(path(remote_path(&created)))
        .and(method("PATCH"))
        .and(body_json(json!({
            "email_address": "new@example.com",
            "status": "subscribed",
            "email_type": "html",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "new-remote-id", "list_id": "L1"})),
        )
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let member_id = created["member_id"].as_str().unwrap();
    let resp = app
        .put_member(member_id, &json!({"email_address": "new@example.com"}))
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email_address"], "new@example.com");
    assert_eq!(body["mail_chimp_email_id"], "new-remote-id");
    assert_eq!(body["pending_sync"], false);

    // later calls go to the new id
    Mock::given(path("/lists/L1/members/new-remote-id"))
        .and(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.delete_member(member_id).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert!(app.store.is_empty().await);
}
