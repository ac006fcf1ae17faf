use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::MemberStore;
use super::StoreError;
use crate::domain::MailChimpMember;
use crate::domain::MemberEmail;

/// `MemberStore` backed by a map; all writes are serialised by the mutex.
#[derive(Default)]
pub struct InMemoryMemberStore {
    members: Mutex<HashMap<Uuid, MailChimpMember>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.members.lock().await.len() }

    pub async fn is_empty(&self) -> bool { self.len().await == 0 }

    /// Snapshot of every stored member, in no particular order
    pub async fn members(&self) -> Vec<MailChimpMember> {
        self.members.lock().await.values().cloned().collect()
    }
}

fn same_member(
    a: &MailChimpMember,
    list_id: &str,
    email_address: &MemberEmail,
) -> bool {
    a.list_id() == list_id && a.email_address() == email_address
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn insert(
        &self,
        member: MailChimpMember,
    ) -> Result<MailChimpMember, StoreError> {
        if let Some(id) = member.member_id() {
            return Err(anyhow::anyhow!("MailChimpMember[{id}] has already been persisted").into());
        }
        let mut members = self.members.lock().await;
        if members
            .values()
            .any(|m| same_member(m, member.list_id(), member.email_address()))
        {
            return Err(StoreError::duplicate(&member));
        }
        let id = Uuid::new_v4();
        let member = member.with_member_id(id);
        members.insert(id, member.clone());
        Ok(member)
    }

    async fn find(
        &self,
        member_id: Uuid,
    ) -> Result<Option<MailChimpMember>, anyhow::Error> {
        Ok(self.members.lock().await.get(&member_id).cloned())
    }

    async fn find_by_list_and_email(
        &self,
        list_id: &str,
        email_address: &MemberEmail,
    ) -> Result<Option<MailChimpMember>, anyhow::Error> {
        Ok(self
            .members
            .lock()
            .await
            .values()
            .find(|m| same_member(m, list_id, email_address))
            .cloned())
    }

    async fn update(
        &self,
        member: &MailChimpMember,
    ) -> Result<(), StoreError> {
        let Some(id) = member.member_id() else {
            return Err(anyhow::anyhow!("cannot update a member that was never persisted").into());
        };
        let mut members = self.members.lock().await;
        if members
            .iter()
            .any(|(k, m)| *k != id && same_member(m, member.list_id(), member.email_address()))
        {
            return Err(StoreError::duplicate(member));
        }
        match members.get_mut(&id) {
            Some(stored) => {
                *stored = member.clone();
                Ok(())
            }
            None => Err(anyhow::anyhow!("MailChimpMember[{id}] not found").into()),
        }
    }

    async fn delete(
        &self,
        member_id: Uuid,
    ) -> Result<bool, anyhow::Error> {
        Ok(self.members.lock().await.remove(&member_id).is_some())
    }
}
