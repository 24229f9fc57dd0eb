//! Persistent state owned by the bot.

pub mod allow_list;

pub use allow_list::{AccessError, AllowList, ADMIN_LABEL};
