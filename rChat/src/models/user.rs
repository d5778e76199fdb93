//! User, group and role models.

use serde::{Deserialize, Serialize};

use super::{GroupId, RoleId, UserId};

/// A chat group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID.
    #[serde(rename = "id_grupo")]
    pub id: GroupId,
    /// Group name.
    #[serde(rename = "nombre", default)]
    pub name: String,
    /// Description.
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A user role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role ID.
    #[serde(rename = "id_rol")]
    pub id: RoleId,
    /// Role name.
    #[serde(rename = "nombre", default)]
    pub name: String,
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    #[serde(rename = "id_usuario")]
    pub id: UserId,
    /// Display name.
    #[serde(rename = "nombre", default)]
    pub name: String,
    /// Network user name used to log in.
    #[serde(rename = "usuario_red", default, skip_serializing_if = "Option::is_none")]
    pub network_user: Option<String>,
    /// Login domain.
    #[serde(rename = "dominio", default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Avatar path.
    #[serde(rename = "foto", default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Role ID.
    #[serde(rename = "roleIdRol", default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    /// Groups the user belongs to.
    #[serde(rename = "grupos", default)]
    pub groups: Vec<Group>,
}

impl User {
    /// The first group the user belongs to.
    pub fn primary_group(&self) -> Option<&GroupId> {
        self.groups.first().map(|g| &g.id)
    }
}
