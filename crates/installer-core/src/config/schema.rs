//! Declarative configuration schema
//!
//! The schema is a YAML data asset loaded once at start-up. Dependency edges
//! are checked at load time: every dependency points at an unconditional bool
//! entry of the flags domain, so the flags can always be resolved first and
//! every other entry afterwards in declaration order.

use crate::error::SchemaError;
use crate::product::ProductConfig;
use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

/// How an entry is asked and stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Bool,
}

/// One configuration key of the artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationEntry {
    /// Section of the artifact
    pub domain: String,

    /// Key, unique within its domain
    pub key: String,

    /// Label shown when prompting
    pub name: String,

    #[serde(rename = "type")]
    pub kind: ValueKind,

    /// Default answer; `y`/`n` for bool entries, may hold `{placeholder}`s
    #[serde(default)]
    pub default: String,

    /// Module flag that must be true for this entry to be asked and written
    #[serde(default)]
    pub depends_on: Option<String>,
}

/// Schema document as written in the YAML asset
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SchemaDocument {
    /// Installer version the schema was written for
    version: String,

    /// Domain holding the module flags
    flags_domain: String,

    /// Name of the generated configuration file
    file_name: String,

    entries: Vec<ConfigurationEntry>,
}

/// Validated, immutable schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    version: String,
    flags_domain: String,
    file_name: String,
    entries: Vec<ConfigurationEntry>,
}

impl Schema {
    /// Parse and validate a YAML schema
    pub fn from_yaml(content: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_yaml::from_str(content)?;
        let schema = Self {
            version: document.version,
            flags_domain: document.flags_domain,
            file_name: document.file_name,
            entries: document.entries,
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn flags_domain(&self) -> &str {
        &self.flags_domain
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn entries(&self) -> &[ConfigurationEntry] {
        &self.entries
    }

    /// Domains in order of first declaration
    pub fn domains(&self) -> Vec<&str> {
        domains_of(&self.entries)
    }

    /// Keys of the flags domain
    pub fn flags(&self) -> impl Iterator<Item = &ConfigurationEntry> {
        self.entries
            .iter()
            .filter(move |e| e.domain == self.flags_domain)
    }

    /// Every placeholder name referenced by a default
    pub fn placeholders(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for entry in &self.entries {
            if let Ok(found) = placeholder_names(&entry.default) {
                names.extend(found);
            }
        }
        names
    }

    /// Warning when the running installer is older than the schema expects
    pub fn compatibility_warning(
        &self,
        installer_version: &str,
        upgrade_command: &str,
    ) -> Option<String> {
        let running = Version::parse(installer_version).ok()?;
        let wanted = Version::parse(self.version.strip_prefix('v').unwrap_or(&self.version)).ok()?;

        (running < wanted).then(|| {
            format!(
                "This configuration schema targets installer {} or newer, you are running {}. \
                 Consider updating: {}",
                self.version, installer_version, upgrade_command
            )
        })
    }

    /// Substitute placeholders in every default, once
    pub fn bind(&self, context: &BTreeMap<String, String>) -> Result<BoundSchema, SchemaError> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let default = substitute(&entry.default, context).map_err(|e| match e {
                Placeholder::Malformed => SchemaError::MalformedPlaceholder {
                    domain: entry.domain.clone(),
                    key: entry.key.clone(),
                    default: entry.default.clone(),
                },
                Placeholder::Unknown(name) => SchemaError::UnknownPlaceholder {
                    domain: entry.domain.clone(),
                    key: entry.key.clone(),
                    name,
                },
            })?;
            entries.push(ConfigurationEntry {
                default,
                ..entry.clone()
            });
        }

        Ok(BoundSchema {
            flags_domain: self.flags_domain.clone(),
            file_name: self.file_name.clone(),
            entries,
        })
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let flags: HashSet<&str> = self.flags().map(|e| e.key.as_str()).collect();
        if flags.is_empty() {
            return Err(SchemaError::MissingFlagsDomain(self.flags_domain.clone()));
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for entry in &self.entries {
            if !seen.insert((entry.domain.as_str(), entry.key.as_str())) {
                return Err(SchemaError::DuplicateKey {
                    domain: entry.domain.clone(),
                    key: entry.key.clone(),
                });
            }

            if entry.domain == self.flags_domain {
                if entry.kind != ValueKind::Bool {
                    return Err(SchemaError::FlagNotBool {
                        key: entry.key.clone(),
                    });
                }
                if entry.depends_on.is_some() {
                    return Err(SchemaError::FlagHasDependency {
                        key: entry.key.clone(),
                    });
                }
            }

            if let Some(flag) = &entry.depends_on {
                if !flags.contains(flag.as_str()) {
                    return Err(SchemaError::UnknownDependency {
                        domain: entry.domain.clone(),
                        key: entry.key.clone(),
                        flag: flag.clone(),
                    });
                }
            }

            if entry.kind == ValueKind::Bool && !matches!(entry.default.as_str(), "y" | "n") {
                return Err(SchemaError::InvalidBoolDefault {
                    domain: entry.domain.clone(),
                    key: entry.key.clone(),
                    default: entry.default.clone(),
                });
            }

            if placeholder_names(&entry.default).is_err() {
                return Err(SchemaError::MalformedPlaceholder {
                    domain: entry.domain.clone(),
                    key: entry.key.clone(),
                    default: entry.default.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Schema whose defaults no longer contain placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSchema {
    flags_domain: String,
    file_name: String,
    entries: Vec<ConfigurationEntry>,
}

impl BoundSchema {
    pub fn flags_domain(&self) -> &str {
        &self.flags_domain
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn entries(&self) -> &[ConfigurationEntry] {
        &self.entries
    }

    pub fn domains(&self) -> Vec<&str> {
        domains_of(&self.entries)
    }

    pub fn entry(&self, domain: &str, key: &str) -> Option<&ConfigurationEntry> {
        self.entries
            .iter()
            .find(|e| e.domain == domain && e.key == key)
    }
}

/// Where the schema comes from
#[derive(Debug, Clone)]
pub enum SchemaSource {
    Embedded(&'static str),
    File(PathBuf),
}

impl SchemaSource {
    /// Explicit path first, then the product's environment variable, then the embedded asset
    pub fn from_config<C: ProductConfig>(config: &C, path: Option<PathBuf>) -> Self {
        path.or_else(|| std::env::var_os(config.schema_env()).map(PathBuf::from))
            .map(Self::File)
            .unwrap_or_else(|| Self::Embedded(config.default_schema()))
    }

    /// Read and validate the schema
    pub fn load(&self) -> Result<Schema> {
        match self {
            SchemaSource::Embedded(content) => {
                Schema::from_yaml(content).context("Embedded configuration schema is invalid")
            }
            SchemaSource::File(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read schema {}", path.display()))?;
                Schema::from_yaml(&content)
                    .with_context(|| format!("Invalid configuration schema {}", path.display()))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SchemaSource::Embedded(_) => "embedded schema".to_string(),
            SchemaSource::File(path) => path.display().to_string(),
        }
    }
}

fn domains_of(entries: &[ConfigurationEntry]) -> Vec<&str> {
    let mut domains: Vec<&str> = Vec::new();
    for entry in entries {
        if !domains.contains(&entry.domain.as_str()) {
            domains.push(&entry.domain);
        }
    }
    domains
}

#[derive(Debug, PartialEq, Eq)]
enum Placeholder {
    Malformed,
    Unknown(String),
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Piece of a default value
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Name(&'a str),
}

/// Split a default into literal text and `{name}` references
fn tokenize(template: &str) -> Result<Vec<Segment<'_>>, Placeholder> {
    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find(&['{', '}'][..]) {
        if rest[start..].starts_with('}') {
            return Err(Placeholder::Malformed);
        }
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or(Placeholder::Malformed)?;
        let name = &after[..end];
        if !is_placeholder_name(name) {
            return Err(Placeholder::Malformed);
        }
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        segments.push(Segment::Name(name));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Names referenced by `{name}` in a default
fn placeholder_names(template: &str) -> Result<Vec<String>, Placeholder> {
    Ok(tokenize(template)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Name(name) => Some(name.to_string()),
            Segment::Literal(_) => None,
        })
        .collect())
}

fn substitute(template: &str, context: &BTreeMap<String, String>) -> Result<String, Placeholder> {
    let mut out = String::with_capacity(template.len());
    for segment in tokenize(template)? {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Name(name) => out.push_str(
                context
                    .get(name)
                    .ok_or_else(|| Placeholder::Unknown(name.to_string()))?,
            ),
        }
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SCHEMA: &str = r#"
version: "0.1.0"
flags_domain: MODULES
file_name: app.conf
entries:
  - { domain: GLOBAL, key: exec_dir, name: Execution directory, type: text, default: "{exec_dir}/App" }
  - { domain: GLOBAL, key: machine_ip, name: Machine IP, type: text, default: auto }
  - { domain: MODULES, key: health, name: Use module health, type: bool, default: "y" }
  - { domain: MODULES, key: medias, name: Use module medias, type: bool, default: "y" }
  - { domain: HEALTH, key: database, name: Health database, type: text, default: "{data_dir}/health.db", depends_on: health }
  - { domain: HEALTH, key: interval, name: Collection interval, type: text, default: "5", depends_on: health }
  - { domain: MEDIAS, key: iso_base_path, name: ISO path, type: text, default: "/vm/iso", depends_on: medias }
  - { domain: MEDIAS, key: ssl_only, name: SSL only, type: bool, default: "n", depends_on: medias }
  - { domain: FEED, key: uuid, name: UUID, type: text, default: "{uuid}" }
"#;

    fn context() -> BTreeMap<String, String> {
        [
            ("exec_dir", "/usr/bin"),
            ("data_dir", "/var/lib/app"),
            ("uuid", "1234"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn with_entries(entries: &str) -> String {
        format!(
            "version: \"0.1.0\"\nflags_domain: MODULES\nfile_name: a.conf\nentries:\n{}",
            entries
        )
    }

    #[test]
    fn test_load_keeps_declaration_order() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        assert_eq!(
            schema.domains(),
            vec!["GLOBAL", "MODULES", "HEALTH", "MEDIAS", "FEED"]
        );
        assert_eq!(schema.flags().count(), 2);
        assert_eq!(schema.file_name(), "app.conf");
    }

    #[test]
    fn test_bind_substitutes_placeholders_once() {
        let bound = Schema::from_yaml(SCHEMA).unwrap().bind(&context()).unwrap();
        assert_eq!(bound.entry("GLOBAL", "exec_dir").unwrap().default, "/usr/bin/App");
        assert_eq!(
            bound.entry("HEALTH", "database").unwrap().default,
            "/var/lib/app/health.db"
        );
        assert_eq!(bound.entry("FEED", "uuid").unwrap().default, "1234");
    }

    #[test]
    fn test_bind_rejects_unknown_placeholder() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        let mut ctx = context();
        ctx.remove("uuid");
        let err = schema.bind(&ctx).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownPlaceholder { ref name, .. } if name == "uuid"));
    }

    #[test]
    fn test_placeholders_are_listed() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        let names: Vec<String> = schema.placeholders().into_iter().collect();
        assert_eq!(names, vec!["data_dir", "exec_dir", "uuid"]);
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let yaml = with_entries(
            "  - { domain: MODULES, key: health, name: H, type: bool, default: \"y\" }\n  - { domain: HEALTH, key: db, name: D, type: text, default: x, depends_on: nope }\n",
        );
        assert!(matches!(
            Schema::from_yaml(&yaml),
            Err(SchemaError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_dependency_on_non_flag_is_rejected() {
        let yaml = with_entries(
            "  - { domain: MODULES, key: health, name: H, type: bool, default: \"y\" }\n  - { domain: GLOBAL, key: ssl, name: S, type: bool, default: \"y\" }\n  - { domain: HEALTH, key: db, name: D, type: text, default: x, depends_on: ssl }\n",
        );
        assert!(matches!(
            Schema::from_yaml(&yaml),
            Err(SchemaError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_flag_rules_are_enforced() {
        let text_flag = with_entries("  - { domain: MODULES, key: health, name: H, type: text, default: x }\n");
        assert!(matches!(
            Schema::from_yaml(&text_flag),
            Err(SchemaError::FlagNotBool { .. })
        ));

        let chained = with_entries(
            "  - { domain: MODULES, key: a, name: A, type: bool, default: \"y\" }\n  - { domain: MODULES, key: b, name: B, type: bool, default: \"y\", depends_on: a }\n",
        );
        assert!(matches!(
            Schema::from_yaml(&chained),
            Err(SchemaError::FlagHasDependency { .. })
        ));

        let no_flags = with_entries("  - { domain: GLOBAL, key: a, name: A, type: text, default: x }\n");
        assert!(matches!(
            Schema::from_yaml(&no_flags),
            Err(SchemaError::MissingFlagsDomain(_))
        ));
    }

    #[test]
    fn test_duplicate_key_and_bad_defaults_are_rejected() {
        let duplicate = with_entries(
            "  - { domain: MODULES, key: a, name: A, type: bool, default: \"y\" }\n  - { domain: MODULES, key: a, name: A, type: bool, default: \"n\" }\n",
        );
        assert!(matches!(
            Schema::from_yaml(&duplicate),
            Err(SchemaError::DuplicateKey { .. })
        ));

        let bad_bool = with_entries("  - { domain: MODULES, key: a, name: A, type: bool, default: \"yes\" }\n");
        assert!(matches!(
            Schema::from_yaml(&bad_bool),
            Err(SchemaError::InvalidBoolDefault { .. })
        ));

        let bad_placeholder = with_entries(
            "  - { domain: MODULES, key: a, name: A, type: bool, default: \"y\" }\n  - { domain: G, key: p, name: P, type: text, default: \"{open/x\" }\n",
        );
        assert!(matches!(
            Schema::from_yaml(&bad_placeholder),
            Err(SchemaError::MalformedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_same_key_in_different_domains_is_allowed() {
        let yaml = with_entries(
            "  - { domain: MODULES, key: oom, name: O, type: bool, default: \"y\" }\n  - { domain: MODULES, key: sched, name: S, type: bool, default: \"y\" }\n  - { domain: OOMKILLER, key: database, name: D, type: text, default: a, depends_on: oom }\n  - { domain: SCHEDULER, key: database, name: D, type: text, default: b, depends_on: sched }\n",
        );
        assert!(Schema::from_yaml(&yaml).is_ok());
    }

    #[test]
    fn test_dollar_variables_are_left_alone() {
        let mut ctx = BTreeMap::new();
        ctx.insert("x".to_string(), "1".to_string());
        assert_eq!(
            substitute("Local VM Cast of $HOSTNAME", &ctx).unwrap(),
            "Local VM Cast of $HOSTNAME"
        );
        assert_eq!(substitute("{x}/{x}", &ctx).unwrap(), "1/1");
        assert_eq!(substitute("a}b", &ctx), Err(Placeholder::Malformed));
    }

    #[test]
    fn test_names_and_substitution_agree() {
        for template in ["{a}/x/{b_2}", "plain", "{a}{a}", "pre {b_2} post"] {
            let names = placeholder_names(template).unwrap();
            let ctx: BTreeMap<String, String> =
                names.iter().map(|n| (n.clone(), "v".to_string())).collect();
            assert!(substitute(template, &ctx).is_ok(), "{}", template);
        }
        assert_eq!(
            tokenize("{a}/x").unwrap(),
            vec![Segment::Name("a"), Segment::Literal("/x")]
        );

        for template in ["{a", "a}", "{}", "{Upper}"] {
            assert_eq!(placeholder_names(template), Err(Placeholder::Malformed));
            assert_eq!(substitute(template, &BTreeMap::new()), Err(Placeholder::Malformed));
        }
    }

    #[test]
    fn test_compatibility_warning() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        assert!(schema
            .compatibility_warning("0.0.9", "cargo install archipel-install --force")
            .is_some());
        assert!(schema.compatibility_warning("0.1.0", "x").is_none());
        assert!(schema.compatibility_warning("0.2.0", "x").is_none());
        assert!(schema.compatibility_warning("not-a-version", "x").is_none());
    }
}
