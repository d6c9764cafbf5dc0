//! One module per `vaultzero` subcommand.

pub mod add;
pub mod backup;
pub mod card;
pub mod change_password;
pub mod delete;
pub mod destroy;
pub mod export;
pub mod favorite;
pub mod generate;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod search;
pub mod serve;
pub mod show;
pub mod update;
