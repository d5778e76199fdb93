//! User API.

use std::sync::Arc;

use crate::{
    client::ChatClientInner,
    error::{Error, Result},
    models::User,
    session::SessionProvider,
};

use super::extract_list;

/// API for user operations.
pub struct UserApi {
    client: Arc<ChatClientInner>,
}

impl UserApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// List registered users.
    pub async fn list(&self, page: u32, limit: u32) -> Result<Vec<User>> {
        let page = page.max(1).to_string();
        let limit = limit.max(1).to_string();

        let data = self
            .client
            .get_authed(
                "login/obtenerUsuarios",
                &[("pagina", &page), ("limite", &limit)],
            )
            .await?;

        extract_list(data, "usuarios")
    }

    /// Get the logged-in user.
    pub fn me(&self) -> Result<User> {
        self.client
            .session
            .session()
            .map(|s| s.user)
            .ok_or(Error::AuthRequired)
    }
}
