use std::time::Duration;

use reqwest::Client;
use reqwest::Response;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::MailChimpMember;

/// Any failure talking to MailChimp. Deliberately opaque: the message is
/// surfaced to API clients as-is, and nothing about it is retried.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct SyncError(String);

impl From<reqwest::Error> for SyncError {
    fn from(value: reqwest::Error) -> Self { Self(value.to_string()) }
}

/// Identifiers MailChimp holds a member under; returned by both create and
/// update
#[derive(Debug, Deserialize)]
pub struct RemoteMember {
    pub id: String,
    pub list_id: Option<String>,
}

/// Body of MailChimp's problem responses; only `detail` is of interest
#[derive(Deserialize)]
struct RemoteProblem {
    detail: Option<String>,
}

/// The subset of member fields mirrored to MailChimp
#[derive(Serialize)]
struct RemoteMemberBody<'a> {
    email_address: &'a str,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email_type: Option<&'a str>,
}

impl<'a> From<&'a MailChimpMember> for RemoteMemberBody<'a> {
    fn from(value: &'a MailChimpMember) -> Self {
        Self {
            email_address: value.email_address().as_ref(),
            status: value.status().as_str(),
            email_type: value.email_type().map(|t| t.as_str()),
        }
    }
}

/// Client for the member endpoints of the MailChimp Marketing API.
///
/// A single `reqwest::Client` (and thus its connection pool) is reused for all
/// requests; the client is shared across workers via `web::Data`.
#[derive(Debug)]
pub struct MailChimpClient {
    http_client: Client,
    /// e.g. `https://us1.api.mailchimp.com/3.0`
    base_url: String,
    api_key: Secret<String>,
}

impl MailChimpClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }

    fn members_url(
        &self,
        list_id: &str,
    ) -> String {
        format!(
            "{}/lists/{}/members",
            self.base_url,
            urlencoding::encode(list_id)
        )
    }

    fn member_url(
        &self,
        list_id: &str,
        remote_member_id: &str,
    ) -> String {
        format!(
            "{}/{}",
            self.members_url(list_id),
            urlencoding::encode(remote_member_id)
        )
    }

    /// Turn non-2xx responses into `SyncError`, preferring MailChimp's own
    /// explanation of what went wrong.
    async fn check(resp: Response) -> Result<Response, SyncError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp
            .json::<RemoteProblem>()
            .await
            .ok()
            .and_then(|p| p.detail);
        Err(SyncError(
            detail.unwrap_or_else(|| format!("MailChimp responded with {status}")),
        ))
    }

    /// `POST /lists/{list_id}/members`
    #[tracing::instrument(name = "Creating member on MailChimp", skip(self, member))]
    pub async fn create_member(
        &self,
        list_id: &str,
        member: &MailChimpMember,
    ) -> Result<RemoteMember, SyncError> {
        let resp = self
            .http_client
            .post(self.members_url(list_id))
            .basic_auth("apikey", Some(self.api_key.expose_secret()))
            .json(&RemoteMemberBody::from(member))
            .send()
            .await?;
        let remote = Self::check(resp).await?.json::<RemoteMember>().await?;
        Ok(remote)
    }

    /// `PATCH /lists/{list_id}/members/{remote_member_id}`
    ///
    /// The returned id differs from `remote_member_id` when the email address
    /// changed.
    #[tracing::instrument(name = "Updating member on MailChimp", skip(self, member))]
    pub async fn update_member(
        &self,
        list_id: &str,
        remote_member_id: &str,
        member: &MailChimpMember,
    ) -> Result<RemoteMember, SyncError> {
        let resp = self
            .http_client
            .patch(self.member_url(list_id, remote_member_id))
            .basic_auth("apikey", Some(self.api_key.expose_secret()))
            .json(&RemoteMemberBody::from(member))
            .send()
            .await?;
        let remote = Self::check(resp).await?.json::<RemoteMember>().await?;
        Ok(remote)
    }

    /// `DELETE /lists/{list_id}/members/{remote_member_id}`
    #[tracing::instrument(name = "Deleting member on MailChimp", skip(self))]
    pub async fn delete_member(
        &self,
        list_id: &str,
        remote_member_id: &str,
    ) -> Result<(), SyncError> {
        let resp = self
            .http_client
            .delete(self.member_url(list_id, remote_member_id))
            .basic_auth("apikey", Some(self.api_key.expose_secret()))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
