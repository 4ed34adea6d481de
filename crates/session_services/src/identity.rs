use kheyma_api::AuthResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Administrator with access to user management
    Admin,
    /// Regular customer
    User,
    /// Identity without any recognizable role
    Guest,
}

impl Role {
    /// Parse a role marker as found in `roles`, `role` or persisted state.
    /// Both the bare (`ADMIN`) and Spring-prefixed (`ROLE_ADMIN`) spellings
    /// are accepted.
    pub fn from_marker(marker: &str) -> Option<Role> {
        let marker = marker.trim();
        let bare = marker.strip_prefix("ROLE_").unwrap_or(marker);

        if bare.eq_ignore_ascii_case("ADMIN") {
            Some(Role::Admin)
        } else if bare.eq_ignore_ascii_case("USER") {
            Some(Role::User)
        } else if bare.eq_ignore_ascii_case("GUEST") {
            Some(Role::Guest)
        } else {
            None
        }
    }

    /// Canonical name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }

    /// Whether the role grants admin pages
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized user record
///
/// Fields the client does not model are kept in `extra` so that a
/// normalized identity can be persisted and normalized again without loss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    /// Email address of the user
    pub email: String,

    /// Display name of the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Resolved role
    pub role: Role,

    /// Remaining fields as sent by the backend
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// JSON form used for persistence
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// The user shapes the backend has shipped, in precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserShape<'a> {
    /// `roles: ["ROLE_ADMIN", ...]` containing at least one known marker
    RolesArray(Vec<&'a str>),
    /// Legacy `type: "ADMIN" | "USER"`
    LegacyType(&'a str),
    /// Already normalized record carrying `role`
    Canonical(Role),
    /// Nothing that identifies a role
    Bare,
}

impl<'a> UserShape<'a> {
    /// Classify a user object
    pub fn classify(record: &'a Map<String, Value>) -> Self {
        if let Some(Value::Array(items)) = record.get("roles") {
            let roles: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            let has_marker = roles
                .iter()
                .any(|r| matches!(Role::from_marker(r), Some(Role::Admin | Role::User)));
            if has_marker {
                return UserShape::RolesArray(roles);
            }
        }

        if let Some(legacy) = record.get("type").and_then(Value::as_str) {
            return UserShape::LegacyType(legacy);
        }

        match record
            .get("role")
            .and_then(Value::as_str)
            .and_then(Role::from_marker)
        {
            Some(role) => UserShape::Canonical(role),
            None => UserShape::Bare,
        }
    }

    /// Role implied by the shape
    pub fn role(&self) -> Role {
        match self {
            UserShape::RolesArray(roles) => {
                let resolved: Vec<Role> = roles.iter().filter_map(|r| Role::from_marker(r)).collect();
                if resolved.contains(&Role::Admin) {
                    Role::Admin
                } else {
                    Role::User
                }
            }
            UserShape::LegacyType(legacy) => {
                if legacy.trim().eq_ignore_ascii_case("ADMIN") {
                    Role::Admin
                } else {
                    Role::User
                }
            }
            UserShape::Canonical(role) => *role,
            UserShape::Bare => Role::Guest,
        }
    }
}

/// Map any backend user value onto the canonical [`Identity`]
///
/// Total and idempotent: `normalize(&normalize(x).to_value()) == normalize(x)`.
pub fn normalize(raw: &Value) -> Identity {
    let empty = Map::new();
    let record = raw.as_object().unwrap_or(&empty);
    let role = UserShape::classify(record).role();

    let mut extra = record.clone();
    extra.remove("role");

    let email = match extra.remove("email") {
        Some(Value::String(email)) => email,
        _ => String::new(),
    };

    let name = match extra.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => Some(name),
        _ => None,
    };

    Identity {
        email,
        name,
        role,
        extra,
    }
}

/// Identity carried by a login, register or refresh response
///
/// Responses without a `user` object fall back to the top-level `email`
/// and `userType` fields.
pub fn identity_from_auth(response: &AuthResponse) -> Identity {
    match response.user {
        Some(ref user) if user.is_object() => normalize(user),
        _ => {
            let mut record = Map::new();
            if let Some(ref email) = response.email {
                record.insert("email".into(), Value::String(email.clone()));
            }
            if let Some(ref user_type) = response.user_type {
                record.insert("type".into(), Value::String(user_type.clone()));
            }
            normalize(&Value::Object(record))
        }
    }
}
