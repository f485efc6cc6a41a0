//! CMake define formatting.

use std::fmt;

use crate::builder::ArgumentStyle;
use crate::core::spec::VariantValue;

/// A `-D` cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: String,
}

impl Define {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Define {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A boolean define spelled with the style's on/off values.
    pub fn switch(name: impl Into<String>, enabled: bool, style: &ArgumentStyle) -> Self {
        let value = if enabled { &style.on } else { &style.off };
        Define::new(name, value.clone())
    }
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-D{}={}", self.name, self.value)
    }
}

/// Define for a variant value.
///
/// Booleans become on/off; valued variants list their values joined by the
/// style's separator.
pub fn define_from_variant(name: impl Into<String>, value: &VariantValue, style: &ArgumentStyle) -> Define {
    match value {
        VariantValue::Bool(b) => Define::switch(name, *b, style),
        other => Define::new(name, other.tokens().join(&style.list_separator)),
    }
}
