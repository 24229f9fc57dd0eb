//! Bot commands and the replies for allow-list administration.

use teloxide::utils::command::BotCommands;

use crate::repository::{AccessError, AllowList};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
    #[command(description = "show your Telegram id")]
    MyId,
    #[command(description = "grant access: /add_user <id> (admin)")]
    AddUser(String),
    #[command(description = "revoke access: /remove_user <id> (admin)")]
    RemoveUser(String),
    #[command(description = "list users with access (admin)")]
    ListUsers,
}

impl Command {
    /// Commands that only the administrator may run.
    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Command::AddUser(_) | Command::RemoveUser(_) | Command::ListUsers
        )
    }
}

/// Problems with a user id argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdArgError {
    Missing,
    Invalid,
}

/// Parse the single user id argument of an admin command.
pub fn parse_user_id(arg: &str) -> Result<u64, IdArgError> {
    let mut parts = arg.split_whitespace();
    let id = parts.next().ok_or(IdArgError::Missing)?;
    if parts.next().is_some() {
        return Err(IdArgError::Missing);
    }
    id.parse().map_err(|_| IdArgError::Invalid)
}

pub const NOT_ADMIN: &str = "❌ Not enough rights. Only the administrator can manage users.";
const INVALID_ID: &str = "❌ Invalid id. The id must be a number.";

/// Label stored for users added through `/add_user`.
pub fn default_label(user_id: u64) -> String {
    format!("user_{}", user_id)
}

pub fn add_user_reply(list: &mut AllowList, arg: &str) -> String {
    let user_id = match parse_user_id(arg) {
        Ok(id) => id,
        Err(IdArgError::Missing) => {
            return "ℹ️ Usage: /add_user <user_id>\n\n\
                    Ask the user to send /my_id to find out their id."
                .to_string()
        }
        Err(IdArgError::Invalid) => return INVALID_ID.to_string(),
    };

    let label = default_label(user_id);
    match list.grant(user_id, label.clone()) {
        Ok(()) => {
            tracing::info!("Granted access to {} ({})", label, user_id);
            format!("✅ User {} added", label)
        }
        Err(AccessError::AlreadyAllowed(_)) => "ℹ️ This user already has access.".to_string(),
        Err(AccessError::LimitReached(max)) => {
            format!("❌ The allow-list is full ({} users).", max)
        }
        Err(e) => {
            tracing::error!("Failed to grant access to {}: {}", user_id, e);
            "❌ Could not save the allow-list.".to_string()
        }
    }
}

pub fn remove_user_reply(list: &mut AllowList, arg: &str) -> String {
    let user_id = match parse_user_id(arg) {
        Ok(id) => id,
        Err(IdArgError::Missing) => return "ℹ️ Usage: /remove_user <user_id>".to_string(),
        Err(IdArgError::Invalid) => return INVALID_ID.to_string(),
    };

    match list.revoke(user_id) {
        Ok(label) => {
            tracing::info!("Revoked access from {} ({})", label, user_id);
            format!("🗑️ User {} removed", label)
        }
        Err(AccessError::CannotRemoveAdmin) => {
            "❌ The administrator cannot be removed.".to_string()
        }
        Err(AccessError::NotFound(_)) => "ℹ️ User not found.".to_string(),
        Err(e) => {
            tracing::error!("Failed to revoke access from {}: {}", user_id, e);
            "❌ Could not save the allow-list.".to_string()
        }
    }
}

pub fn list_users_reply(list: &AllowList) -> String {
    if list.is_empty() {
        return "📝 The allow-list is empty.".to_string();
    }

    let mut text = String::from("👥 Allowed users:\n\n");
    for (id, label) in list.entries() {
        text.push_str(&format!("🆔 {} - {}\n", id, label));
    }
    text.push_str(&format!("\n📊 Total: {} users", list.len()));
    text
}
