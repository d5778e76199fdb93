//! Authentication API: login, logout and registration.

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    client::{ChatClientInner, Session},
    error::{Error, Result},
    models::{Group, RoleId, User},
};

/// API for account operations.
pub struct AuthApi {
    client: Arc<ChatClientInner>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    usuario_red: &'a str,
    password: &'a str,
}

impl AuthApi {
    pub(crate) fn new(client: Arc<ChatClientInner>) -> Self {
        Self { client }
    }

    /// Log in and install the returned session.
    pub async fn login(&self, network_user: &str, password: &str) -> Result<Session> {
        if network_user.trim().is_empty() || password.is_empty() {
            return Err(Error::invalid("User name and password are required"));
        }

        let data = self
            .client
            .executor()
            .post_json(
                "login/iniciarSesion",
                &Credentials {
                    usuario_red: network_user.trim(),
                    password,
                },
                None,
            )
            .await?
            .into_result()?;

        let session = parse_session(data)?;
        self.client.install_session(session.clone()).await?;
        log::debug!("Logged in as user {}", session.user.id);

        Ok(session)
    }

    /// Register a new account.
    pub fn register(&self) -> RegisterBuilder {
        RegisterBuilder {
            client: self.client.clone(),
            name: String::new(),
            network_user: String::new(),
            domain: String::new(),
            password: String::new(),
            role_id: None,
            photo: None,
        }
    }
}

/// Builder for account registration.
pub struct RegisterBuilder {
    client: Arc<ChatClientInner>,
    name: String,
    network_user: String,
    domain: String,
    password: String,
    role_id: Option<RoleId>,
    photo: Option<(String, Vec<u8>)>,
}

impl RegisterBuilder {
    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the network user name used to log in.
    pub fn network_user(mut self, user: impl Into<String>) -> Self {
        self.network_user = user.into();
        self
    }

    /// Set the login domain.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the role.
    pub fn role(mut self, role_id: impl Into<RoleId>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    /// Attach a profile photo.
    pub fn photo(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.photo = Some((file_name.into(), bytes));
        self
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("nombre", &self.name),
            ("usuario_red", &self.network_user),
            ("dominio", &self.domain),
            ("password", &self.password),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::invalid(format!("{field} is required")));
            }
        }

        match &self.role_id {
            Some(role) if !role.is_empty() => Ok(()),
            _ => Err(Error::invalid("roleIdRol is required")),
        }
    }

    /// Execute the request. Returns the server's description of the outcome.
    pub async fn send(self) -> Result<String> {
        self.validate()?;

        let role_id = self.role_id.map(|r| r.0).unwrap_or_default();

        let mut form = Form::new()
            .text("nombre", self.name)
            .text("usuario_red", self.network_user)
            .text("dominio", self.domain)
            .text("password", self.password)
            .text("roleIdRol", role_id);

        if let Some((file_name, bytes)) = self.photo {
            form = form.part("foto", Part::bytes(bytes).file_name(file_name));
        }

        let envelope = self
            .client
            .executor()
            .post_multipart("login/registrarUsuario", form, None)
            .await?;

        let description = envelope.descripcion.clone().unwrap_or_default();
        envelope.into_result()?;

        Ok(description)
    }
}

/// Build a session from a login payload.
///
/// The user may come flattened next to the token or nested under
/// `usuario`; groups may sit on either level.
fn parse_session(data: Value) -> Result<Session> {
    let token = data
        .get("token")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| Error::missing("token"))?;

    let outer_groups = data.get("grupos").cloned();
    let user_value = data
        .get("usuario")
        .filter(|v| v.is_object())
        .cloned()
        .unwrap_or(data);

    let mut user: User =
        serde_json::from_value(user_value).map_err(|e| Error::parse(e.to_string()))?;

    if user.groups.is_empty() {
        if let Some(groups) = outer_groups {
            user.groups = serde_json::from_value::<Vec<Group>>(groups).unwrap_or_default();
        }
    }

    let session = Session::new(token, user);
    if !session.is_valid() {
        return Err(Error::missing("id_usuario"));
    }

    Ok(session)
}
