use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::any;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::assert_mailchimp_exception;
use crate::helpers::assert_member_not_found;
use crate::helpers::mailchimp_exception;
use crate::helpers::spawn_app;

#[tokio::test]
async fn delete_member_ok() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(path(format!(
        "/lists/L1/members/{}",
        created["mail_chimp_email_id"].as_str().unwrap()
    )))
    .and(method("DELETE"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&app.mailchimp_server)
    .await;

    let member_id = created["member_id"].as_str().unwrap();
    let resp = app.delete_member(member_id).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "");

    assert!(app.store.is_empty().await);
    let resp = app.get_member(member_id).await;
    assert_member_not_found(resp, member_id).await;
}

#[tokio::test]
async fn delete_member_not_found() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.delete_member("invalid-member-id").await;
    assert_member_not_found(resp, "invalid-member-id").await;

    let unknown = Uuid::new_v4().to_string();
    let resp = app.delete_member(&unknown).await;
    assert_member_not_found(resp, &unknown).await;
}

#[tokio::test]
async fn delete_member_twice() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let member_id = created["member_id"].as_str().unwrap();
    assert_eq!(app.delete_member(member_id).await.status().as_u16(), 200);
    let resp = app.delete_member(member_id).await;
    assert_member_not_found(resp, member_id).await;
}

#[tokio::test]
async fn delete_member_mailchimp_exception() {
    let app = spawn_app().await;
    let created = app.create_synced_member("L1").await;

    Mock::given(method("DELETE"))
        .respond_with(mailchimp_exception())
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let member_id = created["member_id"].as_str().unwrap();
    let resp = app.delete_member(member_id).await;
    assert_mailchimp_exception(resp).await;

    // MailChimp still has it, so the local record stays too
    let resp = app.get_member(member_id).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.json::<serde_json::Value>().await.unwrap(), created);
}

#[tokio::test]
async fn delete_unsynced_member_is_local_only() {
    let app = spawn_app().await;
    let member_id = app.create_pending_member("L1").await.to_string();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.delete_member(&member_id).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert!(app.store.is_empty().await);
}
