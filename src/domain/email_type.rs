/// Preferred email format of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailType {
    Html,
    Text,
}

impl EmailType {
    pub const VALUES: &'static [&'static str] = &["html", "text"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
        }
    }
}

impl TryFrom<&str> for EmailType {
    type Error = String;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "html" => Ok(Self::Html),
            "text" => Ok(Self::Text),
            e => Err(format!("Invalid email type: {e:?}")),
        }
    }
}

impl TryFrom<String> for EmailType {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.as_str().try_into() }
}
