mod delete;
mod get;
mod post;
mod put;
use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use chrono::Utc;
pub use delete::*;
pub use get::*;
pub use post::*;
pub use put::*;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use super::error_chain_fmt;
use crate::domain::MailChimpMember;
use crate::domain::MemberEmail;
use crate::domain::ValidationErrors;
use crate::mailchimp_client::MailChimpClient;
use crate::mailchimp_client::SyncError;
use crate::store::MemberStore;
use crate::store::StoreError;

#[derive(thiserror::Error)]
pub enum MemberError {
    #[error("Invalid data given")]
    ValidationError(ValidationErrors),
    #[error("MailChimpMember[{0}] not found")]
    NotFound(String),
    #[error(transparent)]
    SyncError(#[from] SyncError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl MemberError {
    fn email_taken() -> Self {
        Self::ValidationError(ValidationErrors::single(
            "email_address",
            "The email address has already been taken.".to_string(),
        ))
    }
}

// a duplicate that slipped past `ensure_unique` (e.g. a concurrent request) is
// still the client's problem, not ours
impl From<StoreError> for MemberError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate { .. } => Self::email_taken(),
            StoreError::Unexpected(e) => Self::UnexpectedError(e),
        }
    }
}

impl Debug for MemberError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)?;
        Ok(())
    }
}

impl ResponseError for MemberError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) | Self::SyncError(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        match self {
            Self::ValidationError(errors) => HttpResponse::build(self.status_code()).json(json!({
                "message": self.to_string(),
                "errors": errors,
            })),
            Self::NotFound(_) | Self::SyncError(_) => {
                HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
            }
            // store failures are not the client's business
            Self::UnexpectedError(_) => HttpResponse::new(self.status_code()),
        }
    }
}

/// JSON body of a create/update request. A missing or unparsable body is
/// treated as empty, so that it fails validation with the usual per-field
/// messages instead of actix's default 400.
pub type MemberPayload = Option<web::Json<Map<String, Value>>>;

fn into_map(payload: MemberPayload) -> Map<String, Value> {
    payload.map(web::Json::into_inner).unwrap_or_default()
}

/// Look up a member by the raw id from the path. Ids that are not even UUIDs
/// cannot exist, and are reported the same way as unknown ones.
async fn find_member(
    store: &dyn MemberStore,
    raw_id: &str,
) -> Result<(Uuid, MailChimpMember), MemberError> {
    let not_found = || MemberError::NotFound(raw_id.to_string());
    let id = Uuid::parse_str(raw_id).map_err(|_| not_found())?;
    let member = store.find(id).await?.ok_or_else(not_found)?;
    Ok((id, member))
}

async fn ensure_unique(
    store: &dyn MemberStore,
    list_id: &str,
    email_address: &MemberEmail,
) -> Result<(), MemberError> {
    match store.find_by_list_and_email(list_id, email_address).await? {
        Some(_) => Err(MemberError::email_taken()),
        None => Ok(()),
    }
}

/// The list id MailChimp knows the member by
fn remote_list_id(member: &MailChimpMember) -> &str {
    member
        .mail_chimp_list_id()
        .unwrap_or_else(|| member.list_id())
}

/// Push the current state of an already persisted member to MailChimp, and
/// persist the outcome.
///
/// Members that were never synced are created remotely, all others are
/// updated. On failure the local state is kept as-is and only flagged with
/// `pending_sync`; the next successful sync clears the flag.
#[tracing::instrument(
    name = "Syncing member to MailChimp",
    skip_all,
    fields(member_id = ?member.member_id(), status = %member.status())
)]
async fn sync_member(
    store: &dyn MemberStore,
    client: &MailChimpClient,
    member: &mut MailChimpMember,
) -> Result<(), MemberError> {
    let outcome = match member.mail_chimp_email_id() {
        Some(remote_id) => {
            client
                .update_member(remote_list_id(member), remote_id, member)
                .await
        }
        None => client.create_member(member.list_id(), member).await,
    };
    // MailChimp derives the member id from the email address, so it changes
    // along with it
    let outcome = outcome.map(|remote| {
        let list_id = remote
            .list_id
            .unwrap_or_else(|| remote_list_id(member).to_string());
        member
            .set_mail_chimp_email_id(remote.id)
            .set_mail_chimp_list_id(list_id);
    });

    match outcome {
        Ok(()) => {
            member.mark_synced(Utc::now());
            store.update(member).await?;
            Ok(())
        }
        Err(e) => {
            tracing::warn!(
                error.cause_chain=?e,
                error.message=%e,
                "MailChimp rejected member, flagging as pending sync"
            );
            member.mark_sync_pending();
            store.update(member).await?;
            Err(e.into())
        }
    }
}
