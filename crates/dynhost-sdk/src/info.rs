//! Static identity for unit implementations.

use dynhost_unit::unit::CodeName;

/// Compile-time identity of a unit.
///
/// Every field is optional. Build one with [`unit_info!`](crate::unit_info)
/// to pick up the package version, authors, license, homepage and
/// description from Cargo, then refine it with the `with_*` methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitInfo {
    /// Numeric (all digits) or text id.
    pub code_name: Option<&'static str>,
    /// Display name.
    pub name: Option<&'static str>,
    /// Free-form description.
    pub description: Option<&'static str>,
    /// Build date.
    pub compiled_date: Option<&'static str>,
    /// License tag.
    pub license: Option<&'static str>,
    /// Version string.
    pub version: Option<&'static str>,
    /// Author.
    pub author: Option<&'static str>,
    /// Homepage.
    pub url: Option<&'static str>,
}

impl UnitInfo {
    /// Identity with every field unset.
    pub const EMPTY: Self = Self {
        code_name: None,
        name: None,
        description: None,
        compiled_date: None,
        license: None,
        version: None,
        author: None,
        url: None,
    };

    /// Identity with only a name.
    pub const fn named(name: &'static str) -> Self {
        let mut info = Self::EMPTY;
        info.name = Some(name);
        info
    }

    /// Sets the code name.
    pub const fn with_code_name(mut self, code_name: &'static str) -> Self {
        self.code_name = Some(code_name);
        self
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Sets the build date.
    pub const fn with_compiled_date(mut self, date: &'static str) -> Self {
        self.compiled_date = Some(date);
        self
    }

    /// Sets the license.
    pub const fn with_license(mut self, license: &'static str) -> Self {
        self.license = Some(license);
        self
    }

    /// Sets the homepage.
    pub const fn with_url(mut self, url: &'static str) -> Self {
        self.url = Some(url);
        self
    }

    /// The code name as reported through the capability contract.
    pub fn code(&self) -> Option<CodeName> {
        self.code_name.map(|code| match code.parse::<u64>() {
            Ok(id) => CodeName::Numeric(id),
            Err(_) => CodeName::from(code),
        })
    }
}

#[doc(hidden)]
pub const fn non_empty(value: &'static str) -> Option<&'static str> {
    if value.is_empty() { None } else { Some(value) }
}

/// Builds a [`UnitInfo`] from the calling crate's Cargo metadata.
///
/// The build date is read from the `DYNHOST_COMPILED_DATE` environment
/// variable at compile time, when set.
#[macro_export]
macro_rules! unit_info {
    ($name:expr) => {
        $crate::info::UnitInfo {
            code_name: None,
            name: Some($name),
            description: $crate::info::non_empty(env!("CARGO_PKG_DESCRIPTION")),
            compiled_date: option_env!("DYNHOST_COMPILED_DATE"),
            license: $crate::info::non_empty(env!("CARGO_PKG_LICENSE")),
            version: $crate::info::non_empty(env!("CARGO_PKG_VERSION")),
            author: $crate::info::non_empty(env!("CARGO_PKG_AUTHORS")),
            url: $crate::info::non_empty(env!("CARGO_PKG_HOMEPAGE")),
        }
    };
}

/// Implements [`Capability`](dynhost_unit::unit::Capability) for `$ty`
/// from a [`UnitInfo`] constant and a `run` body.
///
/// The body receives `&$ty` under the given binding and returns
/// `Result<(), String>`.
#[macro_export]
macro_rules! impl_capability {
    ($ty:ty, $info:path, |$this:ident| $run:expr) => {
        impl $crate::prelude::Capability for $ty {
            fn code_name(&self) -> Option<$crate::prelude::CodeName> {
                $info.code()
            }

            fn name(&self) -> Option<&str> {
                $info.name
            }

            fn description(&self) -> Option<&str> {
                $info.description
            }

            fn compiled_date(&self) -> Option<&str> {
                $info.compiled_date
            }

            fn license(&self) -> Option<&str> {
                $info.license
            }

            fn version(&self) -> Option<&str> {
                $info.version
            }

            fn author(&self) -> Option<&str> {
                $info.author
            }

            fn url(&self) -> Option<&str> {
                $info.url
            }

            fn run(&self) -> Result<(), String> {
                let $this: &$ty = self;
                $run
            }
        }
    };
}
