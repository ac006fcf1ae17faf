use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use uuid::Uuid;

use super::validation::FieldRules;
use super::validation::Rule;
use super::EmailType;
use super::MemberEmail;
use super::MemberStatus;

/// Fields of a member that clients are allowed to set, parsed from a payload
/// that has already passed `MailChimpMember::validation_rules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFields {
    pub email_address: MemberEmail,
    pub status: MemberStatus,
    pub email_type: Option<EmailType>,
}

fn optional_str<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v) => Err(format!("{key} is not a string: {v}")),
    }
}

fn required_str<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, String> {
    optional_str(map, key)?.ok_or(format!("{key} is missing"))
}

impl TryFrom<&Map<String, Value>> for MemberFields {
    type Error = String;
    fn try_from(value: &Map<String, Value>) -> Result<Self, Self::Error> {
        let email_address = MemberEmail::parse(required_str(value, "email_address")?.to_string())?;
        let status = MemberStatus::try_from(required_str(value, "status")?)?;
        let email_type = optional_str(value, "email_type")?
            .map(|t| EmailType::try_from(t))
            .transpose()?;
        Ok(Self {
            email_address,
            status,
            email_type,
        })
    }
}

/// Local copy of a single MailChimp list member.
///
/// `member_id` is only ever assigned by a `MemberStore`, and the `mail_chimp_*`
/// ids only from a successful MailChimp response; everything else is driven by
/// client payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailChimpMember {
    member_id: Option<Uuid>,
    list_id: String,
    mail_chimp_list_id: Option<String>,
    mail_chimp_email_id: Option<String>,
    email_address: MemberEmail,
    email_type: Option<EmailType>,
    status: MemberStatus,
    pending_sync: bool,
    last_synced_at: Option<DateTime<Utc>>,
}

const MEMBER_RULES: &[FieldRules] = &[
    FieldRules {
        field: "email_address",
        rules: &[Rule::Required, Rule::String, Rule::Email],
    },
    FieldRules {
        field: "status",
        rules: &[Rule::Required, Rule::String, Rule::In(MemberStatus::VALUES)],
    },
    FieldRules {
        field: "email_type",
        rules: &[Rule::String, Rule::In(EmailType::VALUES)],
    },
    FieldRules {
        field: "mail_chimp_list_id",
        rules: &[Rule::String],
    },
    FieldRules {
        field: "mail_chimp_email_id",
        rules: &[Rule::String],
    },
];

impl MailChimpMember {
    /// Serialized keys, in output order. `to_mapping` emits exactly these.
    pub const FIELDS: [&'static str; 9] = [
        "member_id",
        "list_id",
        "mail_chimp_list_id",
        "mail_chimp_email_id",
        "email_address",
        "email_type",
        "status",
        "pending_sync",
        "last_synced_at",
    ];

    /// A member that has been neither persisted nor synced
    pub fn new(
        list_id: String,
        fields: MemberFields,
    ) -> Self {
        Self {
            member_id: None,
            list_id,
            mail_chimp_list_id: None,
            mail_chimp_email_id: None,
            email_address: fields.email_address,
            email_type: fields.email_type,
            status: fields.status,
            pending_sync: false,
            last_synced_at: None,
        }
    }

    /// Rules that a create/update payload must pass before any of its values
    /// reach a member.
    pub fn validation_rules() -> &'static [FieldRules] { MEMBER_RULES }

    pub fn member_id(&self) -> Option<Uuid> { self.member_id }

    pub fn list_id(&self) -> &str { &self.list_id }

    pub fn mail_chimp_list_id(&self) -> Option<&str> { self.mail_chimp_list_id.as_deref() }

    pub fn mail_chimp_email_id(&self) -> Option<&str> { self.mail_chimp_email_id.as_deref() }

    pub fn email_address(&self) -> &MemberEmail { &self.email_address }

    pub fn email_type(&self) -> Option<EmailType> { self.email_type }

    pub fn status(&self) -> MemberStatus { self.status }

    /// `true` if the last MailChimp call for this member failed
    pub fn pending_sync(&self) -> bool { self.pending_sync }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> { self.last_synced_at }

    /// Only a store may assign ids; see `MemberStore::insert`.
    pub(crate) fn with_member_id(
        mut self,
        member_id: Uuid,
    ) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn set_mail_chimp_list_id(
        &mut self,
        mail_chimp_list_id: String,
    ) -> &mut Self {
        self.mail_chimp_list_id = Some(mail_chimp_list_id);
        self
    }

    pub fn set_mail_chimp_email_id(
        &mut self,
        mail_chimp_email_id: String,
    ) -> &mut Self {
        self.mail_chimp_email_id = Some(mail_chimp_email_id);
        self
    }

    pub fn set_email_address(
        &mut self,
        email_address: MemberEmail,
    ) -> &mut Self {
        self.email_address = email_address;
        self
    }

    pub fn set_email_type(
        &mut self,
        email_type: Option<EmailType>,
    ) -> &mut Self {
        self.email_type = email_type;
        self
    }

    pub fn set_status(
        &mut self,
        status: MemberStatus,
    ) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_list_id(
        &mut self,
        list_id: String,
    ) -> &mut Self {
        self.list_id = list_id;
        self
    }

    /// Overwrite every client-settable field
    pub fn apply(
        &mut self,
        fields: MemberFields,
    ) -> &mut Self {
        self.set_email_address(fields.email_address)
            .set_email_type(fields.email_type)
            .set_status(fields.status)
    }

    pub fn mark_synced(
        &mut self,
        at: DateTime<Utc>,
    ) -> &mut Self {
        self.pending_sync = false;
        self.last_synced_at = Some(at);
        self
    }

    pub fn mark_sync_pending(&mut self) -> &mut Self {
        self.pending_sync = true;
        self
    }

    /// snake_case representation of every field in `FIELDS`; absent optionals
    /// become `null`.
    pub fn to_mapping(&self) -> Map<String, Value> {
        let values = [
            json!(self.member_id),
            json!(self.list_id),
            json!(self.mail_chimp_list_id),
            json!(self.mail_chimp_email_id),
            json!(self.email_address.as_ref()),
            json!(self.email_type.map(|t| t.as_str())),
            json!(self.status.as_str()),
            json!(self.pending_sync),
            json!(self.last_synced_at),
        ];
        Self::FIELDS
            .iter()
            .map(|k| k.to_string())
            .zip(values)
            .collect()
    }
}

impl Serialize for MailChimpMember {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_mapping().serialize(serializer)
    }
}

/// Rebuild a member from `to_mapping` output (or any mapping of the same
/// shape).
impl TryFrom<&Map<String, Value>> for MailChimpMember {
    type Error = String;
    fn try_from(value: &Map<String, Value>) -> Result<Self, Self::Error> {
        let fields = MemberFields::try_from(value)?;
        let list_id = required_str(value, "list_id")?.to_string();

        let member_id = optional_str(value, "member_id")?
            .map(|id| Uuid::parse_str(id).map_err(|e| format!("Invalid member_id: {e}")))
            .transpose()?;
        let last_synced_at = optional_str(value, "last_synced_at")?
            .map(|t| {
                DateTime::parse_from_rfc3339(t)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| format!("Invalid last_synced_at: {e}"))
            })
            .transpose()?;
        let pending_sync = match value.get("pending_sync") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(v) => return Err(format!("pending_sync is not a bool: {v}")),
        };

        Ok(Self {
            member_id,
            list_id,
            mail_chimp_list_id: optional_str(value, "mail_chimp_list_id")?.map(str::to_string),
            mail_chimp_email_id: optional_str(value, "mail_chimp_email_id")?.map(str::to_string),
            email_address: fields.email_address,
            email_type: fields.email_type,
            status: fields.status,
            pending_sync,
            last_synced_at,
        })
    }
}
