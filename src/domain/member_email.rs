use validator::ValidateEmail;

/// A syntactically valid email address of a list member.
///
/// Must be instantiated with `MemberEmail::parse`; the field is left private so
/// that an unchecked address can never end up on a `MailChimpMember`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEmail(String);

impl MemberEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        match ValidateEmail::validate_email(&email) {
            true => Ok(Self(email)),
            false => Err(format!("Invalid email: {email:?}")),
        }
    }
}

impl AsRef<str> for MemberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for MemberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
