mod delete_member;
mod update_member;
