//! Inline `style` attribute scanning.
//!
//! Blog exports carry presentation as inline CSS declarations. Only the
//! declaration list shape matters here: later duplicates of a property win,
//! values are kept raw (lower-cased with the rest of the attribute), and
//! anything that does not look like `name: value` is skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*([a-z\-]+)\s*:\s*(.+?)\s*(?:;|$)").expect("declaration pattern is valid")
});

/// Lower-cased property name → raw value mapping for one `style` attribute.
#[derive(Debug, Default)]
pub(crate) struct StyleMap {
    map: HashMap<String, String>,
}

impl StyleMap {
    /// Scan a raw `style` attribute value.
    pub(crate) fn parse(attr: &str) -> Self {
        let lowered = attr.to_lowercase();
        let mut map = HashMap::new();
        for caps in DECLARATION.captures_iter(&lowered) {
            map.insert(caps[1].to_string(), caps[2].to_string());
        }
        Self { map }
    }

    pub(crate) fn get(&self, property: &str) -> Option<&str> {
        self.map.get(property).map(String::as_str)
    }
}
