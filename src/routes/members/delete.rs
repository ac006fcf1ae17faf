use actix_web::web;
use actix_web::HttpResponse;

use super::find_member;
use super::remote_list_id;
use super::MemberError;
use crate::mailchimp_client::MailChimpClient;
use crate::store::MemberStore;

/// `DELETE /mailchimp/members/{member_id}`
///
/// MailChimp goes first: if it refuses, the local member is left untouched, so
/// that no remote member is ever orphaned. Members that never made it to
/// MailChimp are only deleted locally.
#[tracing::instrument(name = "Removing member", skip(store, client))]
pub async fn delete_member(
    member_id: web::Path<String>,
    store: web::Data<dyn MemberStore>,
    client: web::Data<MailChimpClient>,
) -> Result<HttpResponse, MemberError> {
    let (id, member) = find_member(&**store, &member_id).await?;

    if let Some(remote_id) = member.mail_chimp_email_id() {
        client
            .delete_member(remote_list_id(&member), remote_id)
            .await?;
    }

    match store.delete(id).await? {
        true => Ok(HttpResponse::Ok().finish()),
        // deleted by a concurrent request in the meantime
        false => Err(MemberError::NotFound(member_id.into_inner())),
    }
}
