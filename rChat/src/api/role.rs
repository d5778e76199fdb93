//! Role API.

use std::sync::Arc;

use crate::{client::ChatClientInner, error::Result, models::Role};

use super::extract_list;

/// API for role lookups. Available without a session, since registration
/// needs it.
pub struct RoleApi {
    client: Arc<ChatClientInner>,
}

impl RoleApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// List the roles a new user can take.
    pub async fn list(&self) -> Result<Vec<Role>> {
        let data = self.client.get("roles/obtenerRoles", &[]).await?;
        extract_list(data, "roles")
    }
}
