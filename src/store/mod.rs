mod in_memory;
mod postgres;

use async_trait::async_trait;
pub use in_memory::InMemoryMemberStore;
pub use postgres::PgMemberStore;
use uuid::Uuid;

use crate::domain::MailChimpMember;
use crate::domain::MemberEmail;

/// Failures of the writes that can collide with another member
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// `(list_id, email_address)` belongs to another member
    #[error("{email_address} is already a member of list {list_id}")]
    Duplicate {
        list_id: String,
        email_address: String,
    },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl StoreError {
    pub(crate) fn duplicate(member: &MailChimpMember) -> Self {
        Self::Duplicate {
            list_id: member.list_id().to_string(),
            email_address: member.email_address().to_string(),
        }
    }
}

/// Owner of the canonical copy of every `MailChimpMember`.
///
/// Route handlers only ever see `dyn MemberStore`, so the same handlers run
/// against Postgres in production and against memory in the API tests.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Persist a new member, assigning its `member_id`. Fails if the member
    /// already has one, or with `StoreError::Duplicate` if
    /// `(list_id, email_address)` is taken.
    async fn insert(
        &self,
        member: MailChimpMember,
    ) -> Result<MailChimpMember, StoreError>;

    async fn find(
        &self,
        member_id: Uuid,
    ) -> Result<Option<MailChimpMember>, anyhow::Error>;

    async fn find_by_list_and_email(
        &self,
        list_id: &str,
        email_address: &MemberEmail,
    ) -> Result<Option<MailChimpMember>, anyhow::Error>;

    /// Overwrite every mutable field of an already persisted member. Same
    /// uniqueness rule as `insert`.
    async fn update(
        &self,
        member: &MailChimpMember,
    ) -> Result<(), StoreError>;

    /// Returns `false` if there was nothing to delete
    async fn delete(
        &self,
        member_id: Uuid,
    ) -> Result<bool, anyhow::Error>;
}
