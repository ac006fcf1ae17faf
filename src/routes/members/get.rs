use actix_web::web;
use actix_web::HttpResponse;

use super::find_member;
use super::MemberError;
use crate::store::MemberStore;

/// `GET /mailchimp/members/{member_id}`
#[tracing::instrument(name = "Showing member", skip(store))]
pub async fn get_member(
    member_id: web::Path<String>,
    store: web::Data<dyn MemberStore>,
) -> Result<HttpResponse, MemberError> {
    let (_, member) = find_member(&**store, &member_id).await?;
    Ok(HttpResponse::Ok().json(&member))
}
