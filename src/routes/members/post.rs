use actix_web::web;
use actix_web::HttpResponse;

use super::ensure_unique;
use super::into_map;
use super::sync_member;
use super::MemberError;
use super::MemberPayload;
use crate::domain::validation::validate;
use crate::domain::MailChimpMember;
use crate::domain::MemberFields;
use crate::mailchimp_client::MailChimpClient;
use crate::store::MemberStore;

/// `POST /mailchimp/members/{list_id}`
///
/// Success requires:
///     1. payload validated
///     2. member added to db (which assigns `member_id`)
///     3. member created on MailChimp, and its MailChimp ids saved
///
/// If 3. fails, the member stays in the db flagged as `pending_sync`, and the
/// MailChimp error is returned as 400.
///
/// # Request example
///
/// ```sh
///     curl -X POST -H 'Content-Type: application/json' \
///         --data '{"email_address": "john@foo.com", "status": "subscribed"}' \
///         http://127.0.0.1:8000/mailchimp/members/57afe96172
/// ```
#[tracing::instrument(name = "Adding new member", skip(payload, store, client))]
pub async fn create_member(
    list_id: web::Path<String>,
    payload: MemberPayload,
    store: web::Data<dyn MemberStore>,
    client: web::Data<MailChimpClient>,
) -> Result<HttpResponse, MemberError> {
    let payload = into_map(payload);
    validate(&payload, MailChimpMember::validation_rules()).map_err(MemberError::ValidationError)?;
    // cannot fail after validation, but a bug here should not panic the worker
    let fields = MemberFields::try_from(&payload).map_err(anyhow::Error::msg)?;

    ensure_unique(&**store, &list_id, &fields.email_address).await?;

    let mut member = store
        .insert(MailChimpMember::new(list_id.into_inner(), fields))
        .await?;
    tracing::info!(member_id = ?member.member_id(), "Added new member to db");

    sync_member(&**store, &client, &mut member).await?;
    Ok(HttpResponse::Ok().json(&member))
}
