use std::fmt::Display;

/// Subscription state of a member, as understood by MailChimp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Subscribed,
    Unsubscribed,
    Cleaned,
    Pending,
}

impl MemberStatus {
    /// Every accepted wire value, in declaration order. Also consumed by the
    /// `in` rule of the member validation table.
    pub const VALUES: &'static [&'static str] = &["subscribed", "unsubscribed", "cleaned", "pending"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Cleaned => "cleaned",
            Self::Pending => "pending",
        }
    }
}

impl Display for MemberStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for MemberStatus {
    type Error = String;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        // matching is exact: "Subscribed" is not a status MailChimp accepts
        match value {
            "subscribed" => Ok(Self::Subscribed),
            "unsubscribed" => Ok(Self::Unsubscribed),
            "cleaned" => Ok(Self::Cleaned),
            "pending" => Ok(Self::Pending),
            e => Err(format!("Invalid status: {e:?}")),
        }
    }
}

impl TryFrom<String> for MemberStatus {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.as_str().try_into() }
}
