//! API modules.

mod auth;
mod group;
mod message;
mod role;
mod user;

pub use auth::{AuthApi, RegisterBuilder};
pub use group::{GroupApi, GroupListBuilder};
pub use message::{
    HistoryBuilder, HistoryPage, HistoryQuery, MessageApi, SendMessageBuilder, DEFAULT_PAGE_SIZE,
};
pub use role::RoleApi;
pub use user::UserApi;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Pull a list out of an envelope payload such as `{"grupos": [...]}`.
///
/// A missing or null key is an empty list.
pub(crate) fn extract_list<T: DeserializeOwned>(mut data: Value, key: &str) -> Result<Vec<T>> {
    match data.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list)
            .map_err(|e| Error::parse(format!("invalid `{key}` list: {e}"))),
    }
}
