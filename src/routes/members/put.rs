use actix_web::web;
use actix_web::HttpResponse;

use super::ensure_unique;
use super::find_member;
use super::into_map;
use super::sync_member;
use super::MemberError;
use super::MemberPayload;
use crate::domain::validation::validate;
use crate::domain::MailChimpMember;
use crate::domain::MemberFields;
use crate::mailchimp_client::MailChimpClient;
use crate::store::MemberStore;

/// `PUT /mailchimp/members/{member_id}`
///
/// Partial update: fields missing from the body keep their current value. The
/// body is laid over the current state and the result is validated as a
/// whole, so nothing is written unless the updated member would be valid.
/// `member_id` and `list_id` cannot be changed.
#[tracing::instrument(name = "Updating member", skip(payload, store, client))]
pub async fn update_member(
    member_id: web::Path<String>,
    payload: MemberPayload,
    store: web::Data<dyn MemberStore>,
    client: web::Data<MailChimpClient>,
) -> Result<HttpResponse, MemberError> {
    let (_, mut member) = find_member(&**store, &member_id).await?;
    let payload = into_map(payload);

    let rules = MailChimpMember::validation_rules();
    let mut merged = member.to_mapping();
    for rule in rules {
        if let Some(value) = payload.get(rule.field) {
            merged.insert(rule.field.to_string(), value.clone());
        }
    }
    validate(&merged, rules).map_err(MemberError::ValidationError)?;
    let fields = MemberFields::try_from(&merged).map_err(anyhow::Error::msg)?;

    if fields.email_address != *member.email_address() {
        ensure_unique(&**store, member.list_id(), &fields.email_address).await?;
    }

    member.apply(fields);
    store.update(&member).await?;

    sync_member(&**store, &client, &mut member).await?;
    Ok(HttpResponse::Ok().json(&member))
}
