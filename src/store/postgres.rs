use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::MemberStore;
use super::StoreError;
use crate::domain::EmailType;
use crate::domain::MailChimpMember;
use crate::domain::MemberEmail;
use crate::domain::MemberFields;
use crate::domain::MemberStatus;

/// `MemberStore` backed by the `mail_chimp_members` table.
///
/// Queries are checked at runtime (`sqlx::query_as`) rather than with
/// `sqlx::query!`, so building the crate does not require a live database or a
/// `.sqlx` directory.
pub struct PgMemberStore {
    pool: PgPool,
}

impl PgMemberStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    list_id: String,
    mail_chimp_list_id: Option<String>,
    mail_chimp_email_id: Option<String>,
    email_address: String,
    email_type: Option<String>,
    status: String,
    pending_sync: bool,
    last_synced_at: Option<DateTime<Utc>>,
}

// rows were parsed on the way in, but we cannot assume they are (still) valid
// on the way out, so parsing errors are propagated rather than unwrapped
impl TryFrom<MemberRow> for MailChimpMember {
    type Error = anyhow::Error;
    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let fields = MemberFields {
            email_address: MemberEmail::parse(row.email_address).map_err(anyhow::Error::msg)?,
            status: MemberStatus::try_from(row.status).map_err(anyhow::Error::msg)?,
            email_type: row
                .email_type
                .map(|t| EmailType::try_from(t))
                .transpose()
                .map_err(anyhow::Error::msg)?,
        };
        let mut member = MailChimpMember::new(row.list_id, fields).with_member_id(row.id);
        if let Some(id) = row.mail_chimp_list_id {
            member.set_mail_chimp_list_id(id);
        }
        if let Some(id) = row.mail_chimp_email_id {
            member.set_mail_chimp_email_id(id);
        }
        if let Some(at) = row.last_synced_at {
            member.mark_synced(at);
        }
        if row.pending_sync {
            member.mark_sync_pending();
        }
        Ok(member)
    }
}

/// Writes that break `UNIQUE (list_id, email_address)` are reported as
/// `StoreError::Duplicate`; this also covers a concurrent insert that got there
/// first.
fn write_error(
    e: sqlx::Error,
    member: &MailChimpMember,
) -> StoreError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::duplicate(member),
        e => {
            tracing::error!("bad query: {e:?}");
            StoreError::Unexpected(e.into())
        }
    }
}

const SELECT_MEMBER: &str = r#"
    SELECT id, list_id, mail_chimp_list_id, mail_chimp_email_id, email_address,
        email_type, status, pending_sync, last_synced_at
    FROM mail_chimp_members
"#;

#[async_trait]
impl MemberStore for PgMemberStore {
    #[tracing::instrument(name = "INSERTing new member into db", skip_all)]
    async fn insert(
        &self,
        member: MailChimpMember,
    ) -> Result<MailChimpMember, StoreError> {
        if let Some(id) = member.member_id() {
            return Err(anyhow::anyhow!("MailChimpMember[{id}] has already been persisted").into());
        }
        let member = member.with_member_id(Uuid::new_v4());
        sqlx::query(
            r#"
        INSERT INTO mail_chimp_members
            (id, list_id, mail_chimp_list_id, mail_chimp_email_id, email_address,
            email_type, status, pending_sync, last_synced_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    "#,
        )
        .bind(member.member_id())
        .bind(member.list_id())
        .bind(member.mail_chimp_list_id())
        .bind(member.mail_chimp_email_id())
        .bind(member.email_address().as_ref())
        .bind(member.email_type().map(|t| t.as_str()))
        .bind(member.status().as_str())
        .bind(member.pending_sync())
        .bind(member.last_synced_at())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &member))?;
        Ok(member)
    }

    #[tracing::instrument(name = "SELECTing member by id", skip(self))]
    async fn find(
        &self,
        member_id: Uuid,
    ) -> Result<Option<MailChimpMember>, anyhow::Error> {
        let row = sqlx::query_as::<_, MemberRow>(&format!("{SELECT_MEMBER} WHERE id = $1"))
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| MailChimpMember::try_from(r)).transpose()
    }

    #[tracing::instrument(name = "SELECTing member by list and email", skip(self))]
    async fn find_by_list_and_email(
        &self,
        list_id: &str,
        email_address: &MemberEmail,
    ) -> Result<Option<MailChimpMember>, anyhow::Error> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "{SELECT_MEMBER} WHERE list_id = $1 AND email_address = $2"
        ))
        .bind(list_id)
        .bind(email_address.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| MailChimpMember::try_from(r)).transpose()
    }

    #[tracing::instrument(name = "UPDATing member in db", skip_all)]
    async fn update(
        &self,
        member: &MailChimpMember,
    ) -> Result<(), StoreError> {
        let Some(id) = member.member_id() else {
            return Err(anyhow::anyhow!("cannot update a member that was never persisted").into());
        };
        // list_id is never updated
        let result = sqlx::query(
            r#"
        UPDATE mail_chimp_members SET
            mail_chimp_list_id = $2,
            mail_chimp_email_id = $3,
            email_address = $4,
            email_type = $5,
            status = $6,
            pending_sync = $7,
            last_synced_at = $8
        WHERE id = $1
    "#,
        )
        .bind(id)
        .bind(member.mail_chimp_list_id())
        .bind(member.mail_chimp_email_id())
        .bind(member.email_address().as_ref())
        .bind(member.email_type().map(|t| t.as_str()))
        .bind(member.status().as_str())
        .bind(member.pending_sync())
        .bind(member.last_synced_at())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, member))?;
        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("MailChimpMember[{id}] not found").into());
        }
        Ok(())
    }

    #[tracing::instrument(name = "DELETing member from db", skip(self))]
    async fn delete(
        &self,
        member_id: Uuid,
    ) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM mail_chimp_members WHERE id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
