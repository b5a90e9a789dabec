//! Compute functions available to every profile.

use conflate_model::{ComputeFn, ComputeRegistry, Tags};

const HOUSENUMBER: &str = "addr:housenumber";

/// Registry holding all built-in compute functions.
pub fn default_registry() -> ComputeRegistry {
    ComputeRegistry::new()
        .with(ComputeFn::new("lowercase_housenumber", lowercase_housenumber))
        .with(ComputeFn::new("trim_housenumber", trim_housenumber))
}

/// `12A` -> `12a`, so letter suffixes compare equal across sources.
pub fn lowercase_housenumber(tags: &Tags) -> Option<String> {
    tags.get(HOUSENUMBER).map(|value| value.to_lowercase())
}

/// Removes all whitespace and NUL padding: `12 a` -> `12a`.
pub fn trim_housenumber(tags: &Tags) -> Option<String> {
    tags.get(HOUSENUMBER).map(|value| {
        value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\u{0}')
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn housenumber(value: &str) -> Tags {
        Tags::from([(HOUSENUMBER.to_string(), value.to_string())])
    }

    #[test]
    fn lowercases_letter_suffix() {
        assert_eq!(lowercase_housenumber(&housenumber("12A")), Some("12a".to_string()));
        assert_eq!(lowercase_housenumber(&Tags::new()), None);
    }

    #[test]
    fn trims_inner_whitespace() {
        assert_eq!(trim_housenumber(&housenumber(" 12 a\u{0}")), Some("12a".to_string()));
    }

    #[test]
    fn registry_resolves_builtins() {
        let registry = default_registry();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["lowercase_housenumber", "trim_housenumber"]);
        let function = registry.get("lowercase_housenumber").unwrap();
        assert_eq!(function.call(&housenumber("7B")), Some("7b".to_string()));
    }
}
