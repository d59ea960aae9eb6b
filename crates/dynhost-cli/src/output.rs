//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use dynhost_unit::CapabilityMetadata;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Table
    }
}

/// One scanned or loaded library
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct UnitRow {
    /// Library path or name
    #[tabled(rename = "Library")]
    pub library: String,
    /// Advertised name
    #[tabled(rename = "Name")]
    pub name: String,
    /// Advertised version
    #[tabled(rename = "Version")]
    pub version: String,
    /// Kind and category
    #[tabled(rename = "Type")]
    pub unit_type: String,
    /// `ok` or the load error
    #[tabled(rename = "Status")]
    pub status: String,
}

impl UnitRow {
    /// Row for a library that loaded.
    pub fn loaded(library: &str, meta: &CapabilityMetadata) -> Self {
        Self {
            library: library.to_string(),
            name: dash(meta.name.as_deref()),
            version: dash(meta.version.as_deref()),
            unit_type: meta.unit_type.to_string(),
            status: "ok".to_string(),
        }
    }

    /// Row for a library that failed to load.
    pub fn failed(library: &str, error: impl std::fmt::Display) -> Self {
        Self {
            library: library.to_string(),
            name: "-".to_string(),
            version: "-".to_string(),
            unit_type: "-".to_string(),
            status: error.to_string(),
        }
    }

    /// Whether the library loaded.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

fn dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print unit metadata as key/value lines or JSON
pub fn print_metadata(library: &str, meta: &CapabilityMetadata, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{}:", library);
            print_kv("Name", &dash(meta.name.as_deref()));
            print_kv("Type", &meta.unit_type.to_string());
            print_kv(
                "Code Name",
                &meta
                    .code_name
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string),
            );
            print_kv("Version", &dash(meta.version.as_deref()));
            print_kv("Description", &dash(meta.description.as_deref()));
            print_kv("Author", &dash(meta.author.as_deref()));
            print_kv("License", &dash(meta.license.as_deref()));
            print_kv("URL", &dash(meta.url.as_deref()));
            print_kv("Compiled", &dash(meta.compiled_date.as_deref()));
            if let Some(permission) = meta.permission {
                print_kv("Permission", permission.as_str());
            }
            if let Some(state) = meta.state {
                print_kv("State", state.as_str());
            }
        }
        OutputFormat::Json => print_item(meta, format),
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynhost_unit::unit::{ModuleType, UnitType};

    #[test]
    fn test_rows() {
        let mut meta = CapabilityMetadata::new(UnitType::Module(ModuleType::Admin));
        meta.name = Some("admin".to_string());

        let row = UnitRow::loaded("libadmin.so", &meta);
        assert!(row.is_ok());
        assert_eq!(row.version, "-");
        assert_eq!(row.unit_type, "module/admin");

        let row = UnitRow::failed("libbad.so", "could not load library 'libbad.so'");
        assert!(!row.is_ok());
        assert_eq!(row.name, "-");
    }
}
