//! Group API.

use std::sync::Arc;

use crate::{client::ChatClientInner, error::Result, models::Group};

use super::extract_list;

/// API for group operations.
pub struct GroupApi {
    client: Arc<ChatClientInner>,
}

impl GroupApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// List groups.
    pub fn list(&self) -> GroupListBuilder {
        GroupListBuilder {
            client: self.client.clone(),
            page: 1,
            limit: 10,
        }
    }
}

/// Builder for group list requests.
pub struct GroupListBuilder {
    client: Arc<ChatClientInner>,
    page: u32,
    limit: u32,
}

impl GroupListBuilder {
    /// Set the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Execute the request.
    pub async fn send(self) -> Result<Vec<Group>> {
        let page = self.page.to_string();
        let limit = self.limit.to_string();

        let data = self
            .client
            .get_authed(
                "grupos/obtenerGrupos/",
                &[("pagina", &page), ("limite", &limit)],
            )
            .await?;

        extract_list(data, "grupos")
    }
}
