//! Static section registry for Atrium.
//!
//! The registry is the compiled-in catalog of configuration sections: which
//! external services exist, which fields each one has, which of those fields
//! are secrets, and how to probe the service for connectivity. It is built
//! once at startup and never persisted — the schema is versioned with the
//! deployment, not with the data.

use serde::Serialize;

/// The type of a configuration field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Free-form text.
    Text,
    /// Numeric value (stored as its string representation).
    Number,
    /// A URL.
    Url,
    /// A secret. Lives only in the secret store, masked on display.
    Secret,
}

/// Schema for a single configuration field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    /// Stable machine name, unique within its section.
    pub key: String,
    /// Human-readable label for the admin console.
    pub label: String,
    /// Value type. `Secret` fields never reach the plaintext document.
    pub value_type: ValueType,
    /// Whether a save must leave this field non-empty.
    pub required: bool,
    /// Default shown and resolved when the field is unset.
    pub default_value: Option<String>,
    /// Operator-facing help text.
    pub description: String,
}

impl FieldSpec {
    fn new(key: &str, label: &str, value_type: ValueType) -> Self {
        Self {
            key: key.to_owned(),
            label: label.to_owned(),
            value_type,
            required: false,
            default_value: None,
            description: String::new(),
        }
    }

    /// A free-form text field.
    #[must_use]
    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, ValueType::Text)
    }

    /// A numeric field.
    #[must_use]
    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, ValueType::Number)
    }

    /// A URL field.
    #[must_use]
    pub fn url(key: &str, label: &str) -> Self {
        Self::new(key, label, ValueType::Url)
    }

    /// A secret field.
    #[must_use]
    pub fn secret(key: &str, label: &str) -> Self {
        Self::new(key, label, ValueType::Secret)
    }

    /// Mark the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value used when the field is unset.
    #[must_use]
    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_owned());
        self
    }

    /// Set the operator-facing description.
    #[must_use]
    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }
}

/// How to run a live connectivity check for a section.
#[derive(Debug, Clone)]
pub enum ProbeKind {
    /// TCP connect against the host and port named by two field keys.
    Tcp { host_key: String, port_key: String },
    /// HTTP GET against the URL named by `url_key`. If `auth_header` is
    /// set, the named secret field's resolved value is sent in that
    /// request header.
    Http {
        url_key: String,
        /// `(header name, field key)` — e.g. `("api-key", "SEARCH_API_KEY")`.
        auth_header: Option<(String, String)>,
    },
    /// No live probe is defined for this section.
    None,
}

/// A named group of configuration fields for one external dependency.
#[derive(Debug, Clone)]
pub struct Section {
    /// Stable section identifier (e.g. `database`).
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Ordered field schemas. Order here is display order.
    pub fields: Vec<FieldSpec>,
    /// Connectivity probe definition.
    pub probe: ProbeKind,
}

impl Section {
    /// Look up a field spec by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// The ordered catalog of configuration sections.
///
/// Iteration order is declaration order — operators expect consistent
/// grouping, so the overview is never re-sorted.
#[derive(Debug, Clone)]
pub struct Registry {
    sections: Vec<Section>,
}

impl Registry {
    /// Build a registry from an explicit section list.
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// The built-in Atrium catalog: one section per external service the
    /// assistant platform depends on.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Section {
                id: "database".to_owned(),
                label: "Database".to_owned(),
                fields: vec![
                    FieldSpec::text("SQL_SERVER", "Server host")
                        .required()
                        .describe("Hostname of the SQL server"),
                    FieldSpec::number("SQL_PORT", "Server port")
                        .with_default("1433")
                        .describe("TCP port of the SQL server"),
                    FieldSpec::text("SQL_DATABASE", "Database name").required(),
                    FieldSpec::text("SQL_USERNAME", "Username").required(),
                    FieldSpec::secret("SQL_PASSWORD", "Password")
                        .required()
                        .describe("Stored in the secret store, never in plaintext config"),
                ],
                probe: ProbeKind::Tcp {
                    host_key: "SQL_SERVER".to_owned(),
                    port_key: "SQL_PORT".to_owned(),
                },
            },
            Section {
                id: "model-provider".to_owned(),
                label: "Model Provider".to_owned(),
                fields: vec![
                    FieldSpec::url("OPENAI_ENDPOINT", "Endpoint").required(),
                    FieldSpec::secret("OPENAI_API_KEY", "API key").required(),
                    FieldSpec::text("OPENAI_DEPLOYMENT", "Deployment name").required(),
                    FieldSpec::text("OPENAI_API_VERSION", "API version")
                        .with_default("2024-06-01"),
                ],
                probe: ProbeKind::Http {
                    url_key: "OPENAI_ENDPOINT".to_owned(),
                    auth_header: Some(("api-key".to_owned(), "OPENAI_API_KEY".to_owned())),
                },
            },
            Section {
                id: "object-storage".to_owned(),
                label: "Object Storage".to_owned(),
                fields: vec![
                    FieldSpec::url("STORAGE_ENDPOINT", "Endpoint").required(),
                    FieldSpec::secret("STORAGE_ACCESS_KEY", "Access key").required(),
                    FieldSpec::text("STORAGE_CONTAINER", "Container")
                        .required()
                        .with_default("documents"),
                ],
                probe: ProbeKind::Http {
                    url_key: "STORAGE_ENDPOINT".to_owned(),
                    auth_header: None,
                },
            },
            Section {
                id: "identity".to_owned(),
                label: "Identity".to_owned(),
                fields: vec![
                    FieldSpec::url("IDENTITY_AUTHORITY", "Authority URL").required(),
                    FieldSpec::text("IDENTITY_CLIENT_ID", "Client ID").required(),
                    FieldSpec::secret("IDENTITY_CLIENT_SECRET", "Client secret").required(),
                    FieldSpec::text("IDENTITY_TENANT", "Tenant"),
                ],
                probe: ProbeKind::Http {
                    url_key: "IDENTITY_AUTHORITY".to_owned(),
                    auth_header: None,
                },
            },
            Section {
                id: "search".to_owned(),
                label: "Search".to_owned(),
                fields: vec![
                    FieldSpec::url("SEARCH_ENDPOINT", "Endpoint").required(),
                    FieldSpec::secret("SEARCH_API_KEY", "API key").required(),
                    FieldSpec::text("SEARCH_INDEX", "Index name")
                        .required()
                        .with_default("assistant-index"),
                ],
                probe: ProbeKind::Http {
                    url_key: "SEARCH_ENDPOINT".to_owned(),
                    auth_header: Some(("api-key".to_owned(), "SEARCH_API_KEY".to_owned())),
                },
            },
            Section {
                id: "document-intelligence".to_owned(),
                label: "Document Intelligence".to_owned(),
                fields: vec![
                    FieldSpec::url("DOCINTEL_ENDPOINT", "Endpoint").required(),
                    FieldSpec::secret("DOCINTEL_API_KEY", "API key").required(),
                ],
                probe: ProbeKind::Http {
                    url_key: "DOCINTEL_ENDPOINT".to_owned(),
                    auth_header: Some((
                        "Ocp-Apim-Subscription-Key".to_owned(),
                        "DOCINTEL_API_KEY".to_owned(),
                    )),
                },
            },
        ])
    }

    /// Look up a section by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Iterate sections in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Number of sections in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_has_six_sections_in_declared_order() {
        let registry = Registry::builtin();
        let ids: Vec<&str> = registry.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "database",
                "model-provider",
                "object-storage",
                "identity",
                "search",
                "document-intelligence"
            ]
        );
    }

    #[test]
    fn field_keys_unique_within_each_section() {
        for section in Registry::builtin().iter() {
            let mut seen = HashSet::new();
            for field in &section.fields {
                assert!(
                    seen.insert(field.key.as_str()),
                    "duplicate field key '{}' in section '{}'",
                    field.key,
                    section.id
                );
            }
        }
    }

    #[test]
    fn every_secret_field_is_marked_secret() {
        let registry = Registry::builtin();
        let database = registry.get("database").unwrap();
        let pw = database.field("SQL_PASSWORD").unwrap();
        assert_eq!(pw.value_type, ValueType::Secret);
        assert!(pw.required);
    }

    #[test]
    fn probe_field_keys_exist_in_schema() {
        for section in Registry::builtin().iter() {
            match &section.probe {
                ProbeKind::Tcp { host_key, port_key } => {
                    assert!(section.field(host_key).is_some(), "{}", section.id);
                    assert!(section.field(port_key).is_some(), "{}", section.id);
                }
                ProbeKind::Http {
                    url_key,
                    auth_header,
                } => {
                    assert!(section.field(url_key).is_some(), "{}", section.id);
                    if let Some((_, field_key)) = auth_header {
                        let field = section.field(field_key).unwrap();
                        assert_eq!(field.value_type, ValueType::Secret);
                    }
                }
                ProbeKind::None => {}
            }
        }
    }

    #[test]
    fn unknown_section_lookup_returns_none() {
        assert!(Registry::builtin().get("telemetry").is_none());
    }

    #[test]
    fn defaults_only_on_optional_or_defaulted_fields() {
        let registry = Registry::builtin();
        let port = registry.get("database").unwrap().field("SQL_PORT").unwrap();
        assert_eq!(port.default_value.as_deref(), Some("1433"));
        assert!(!port.required);
    }
}
