//! Sample dynhost plugin.
//!
//! Greets every name listed in `GREETER_NAMES` (comma separated), or
//! `world` when the variable is unset.

use dynhost_sdk::prelude::*;

const INFO: UnitInfo = unit_info!("greeter").with_code_name("greeter");

/// Environment variable holding the names to greet.
pub const NAMES_ENV: &str = "GREETER_NAMES";

/// Plugin that greets a fixed list of names.
#[derive(Debug, Clone)]
pub struct GreeterPlugin {
    names: Vec<String>,
}

impl GreeterPlugin {
    /// Creates a plugin greeting `names`.
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Reads the names from [`NAMES_ENV`].
    pub fn from_env() -> Self {
        let names = std::env::var(NAMES_ENV)
            .map(|raw| parse_names(&raw))
            .unwrap_or_default();
        if names.is_empty() {
            Self::new(vec!["world".to_string()])
        } else {
            Self::new(names)
        }
    }

    /// One greeting line per name.
    pub fn greetings(&self) -> Vec<String> {
        self.names.iter().map(|name| format!("Hello, {name}!")).collect()
    }

    fn greet(&self) -> Result<(), String> {
        if self.names.is_empty() {
            return Err("nobody to greet".to_string());
        }
        for line in self.greetings() {
            println!("[greeter] {line}");
        }
        Ok(())
    }
}

fn parse_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl_capability!(GreeterPlugin, INFO, |this| this.greet());

impl Plugin for GreeterPlugin {
    fn plugin_type(&self) -> PluginType {
        PluginType::Service
    }

    fn permission(&self) -> Option<Permission> {
        Some(Permission::ReadOnly)
    }

    fn state(&self) -> Option<PluginState> {
        Some(PluginState::Active)
    }
}

export_plugin!(GreeterPlugin, GreeterPlugin::from_env());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_names(" ada, ,grace ,"), vec!["ada", "grace"]);
        assert!(parse_names("").is_empty());
    }

    #[test]
    fn test_greetings() {
        let plugin = GreeterPlugin::new(vec!["ada".into(), "linus".into()]);
        assert_eq!(plugin.greetings(), vec!["Hello, ada!", "Hello, linus!"]);
        assert!(plugin.run().is_ok());
    }

    #[test]
    fn test_empty_list_fails() {
        let plugin = GreeterPlugin::new(Vec::new());
        assert_eq!(plugin.run(), Err("nobody to greet".to_string()));
    }

    #[test]
    fn test_metadata() {
        let meta = CapabilityMetadata::from_plugin(&GreeterPlugin::new(vec!["x".into()]));
        assert_eq!(meta.name.as_deref(), Some("greeter"));
        assert_eq!(meta.code_name, Some(CodeName::Text("greeter".into())));
        assert_eq!(meta.unit_type, UnitType::Plugin(PluginType::Service));
        assert_eq!(meta.permission, Some(Permission::ReadOnly));
        assert_eq!(meta.state, Some(PluginState::Active));
        assert_eq!(meta.author.as_deref(), Some("Dynhost Team"));
    }

    #[test]
    fn test_exports() {
        let plugin = CreatePlugin();
        assert!(!plugin.is_null());
        // SAFETY: the instance stays alive until DestroyPlugin below.
        let kind = unsafe { &*plugin }.plugin_type();
        assert_eq!(kind, PluginType::Service);
        DestroyPlugin();
    }
}
