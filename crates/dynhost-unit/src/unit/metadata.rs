//! Identity metadata advertised by loadable units.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declares a fieldless enum with a stable `snake_case` string form.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable string form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(format!(
                        concat!("unknown ", stringify!($name), " '{}'"),
                        other
                    )),
                }
            }
        }
    };
}

named_enum! {
    /// Category a module places itself in.
    pub enum ModuleType {
        /// Public index / landing unit.
        Index => "index",
        /// Administration surface.
        Admin => "admin",
        /// System-level unit.
        System => "system",
        /// Background service.
        Service => "service",
        /// Default category.
        Default => "default",
        /// Anything else.
        Custom => "custom",
    }
}

named_enum! {
    /// Category a plugin places itself in.
    pub enum PluginType {
        /// Public index / landing unit.
        Index => "index",
        /// Administration surface.
        Admin => "admin",
        /// System-level unit.
        System => "system",
        /// Background service.
        Service => "service",
        /// Default category.
        Default => "default",
        /// Anything else.
        Custom => "custom",
        /// Root-level plugin.
        Root => "root",
        /// Scheduled job plugin.
        Cron => "cron",
        /// Core extension.
        Core => "core",
        /// Presentation theme.
        Theme => "theme",
    }
}

named_enum! {
    /// Access level a plugin asks for.
    pub enum Permission {
        /// Read-only access.
        ReadOnly => "read_only",
        /// May edit but not create or delete.
        EditableOnly => "editable_only",
        /// Restricted access.
        Restricted => "restricted",
        /// Unrestricted access.
        FullAccess => "full_access",
        /// Access decided by the owning service.
        ByService => "by_service",
    }
}

named_enum! {
    /// Lifecycle state a plugin reports for itself.
    pub enum PluginState {
        /// Enabled and serving.
        Active => "active",
        /// Installed but disabled.
        InActive => "in_active",
        /// Temporarily suspended.
        Suspended => "suspended",
    }
}

/// Identifier a unit may advertise in addition to its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeName {
    /// Numeric id.
    Numeric(u64),
    /// Free-form string id.
    Text(String),
}

impl fmt::Display for CodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for CodeName {
    fn from(id: u64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for CodeName {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

/// Type tag of a unit, carrying the kind-specific category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum UnitType {
    /// A module and its category.
    Module(ModuleType),
    /// A plugin and its category.
    Plugin(PluginType),
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(t) => write!(f, "module/{t}"),
            Self::Plugin(t) => write!(f, "plugin/{t}"),
        }
    }
}

/// Owned copy of everything a unit advertises about itself.
///
/// Only `unit_type` is mandatory. A `None` field means the unit left it
/// unspecified, which is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityMetadata {
    /// Optional numeric or string id.
    pub code_name: Option<CodeName>,
    /// Display name.
    pub name: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Build date string as reported by the unit.
    pub compiled_date: Option<String>,
    /// License tag.
    pub license: Option<String>,
    /// Version string.
    pub version: Option<String>,
    /// Author.
    pub author: Option<String>,
    /// Homepage.
    pub url: Option<String>,
    /// Kind and category.
    pub unit_type: UnitType,
    /// Requested permission (plugins only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    /// Reported lifecycle state (plugins only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PluginState>,
}

impl CapabilityMetadata {
    /// Metadata with only the type tag set.
    pub fn new(unit_type: UnitType) -> Self {
        Self {
            code_name: None,
            name: None,
            description: None,
            compiled_date: None,
            license: None,
            version: None,
            author: None,
            url: None,
            unit_type,
            permission: None,
            state: None,
        }
    }

    /// Whether this record describes a plugin.
    pub fn is_plugin(&self) -> bool {
        matches!(self.unit_type, UnitType::Plugin(_))
    }

    /// Display name, or `fallback` when the unit did not set one.
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_forms() {
        assert_eq!(Permission::FullAccess.to_string(), "full_access");
        assert_eq!("in_active".parse::<PluginState>(), Ok(PluginState::InActive));
        assert_eq!("theme".parse::<PluginType>(), Ok(PluginType::Theme));
        assert!("theme".parse::<ModuleType>().is_err());
    }

    #[test]
    fn test_plugin_type_extends_module_type() {
        for module_type in ModuleType::ALL {
            assert!(module_type.as_str().parse::<PluginType>().is_ok());
        }
        assert_eq!(PluginType::ALL.len(), ModuleType::ALL.len() + 4);
    }

    #[test]
    fn test_serde_shape() {
        let mut meta = CapabilityMetadata::new(UnitType::Plugin(PluginType::Cron));
        meta.code_name = Some(CodeName::Numeric(42));
        meta.permission = Some(Permission::ReadOnly);

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["unit_type"]["kind"], "plugin");
        assert_eq!(json["unit_type"]["type"], "cron");
        assert_eq!(json["code_name"], 42);
        assert_eq!(json["permission"], "read_only");
        assert!(json.get("state").is_none());

        let back: CapabilityMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_name_or() {
        let meta = CapabilityMetadata::new(UnitType::Module(ModuleType::Admin));
        assert_eq!(meta.name_or("libadmin.so"), "libadmin.so");
        assert!(!meta.is_plugin());
    }
}
