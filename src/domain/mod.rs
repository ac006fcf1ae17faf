mod email_type;
mod member;
mod member_email;
mod member_status;
pub mod validation;
// allow external `use` statements to skip `member` etc
pub use email_type::EmailType;
pub use member::MailChimpMember;
pub use member::MemberFields;
pub use member_email::MemberEmail;
pub use member_status::MemberStatus;
pub use validation::ValidationErrors;
