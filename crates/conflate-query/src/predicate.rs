//! Evaluation of OR-of-AND tag queries against feature tags.
//!
//! Value patterns are regular expressions matched against the whole tag value
//! (`^(?:pattern)$`). Keys are compared byte-wise and case-sensitively. A
//! condition without a pattern only requires the key to be present.

use regex::Regex;
use tracing::debug;

use conflate_model::{ConfigError, Feature, QueryGroup, Tags};

#[derive(Debug, Clone)]
struct CompiledCondition {
    key: String,
    pattern: Option<Regex>,
}

impl CompiledCondition {
    fn matches(&self, tags: &Tags) -> bool {
        match (tags.get(&self.key), &self.pattern) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(value), Some(pattern)) => pattern.is_match(value),
        }
    }
}

/// A compiled query. Cheap to evaluate repeatedly and safe to share across threads.
#[derive(Debug, Clone)]
pub struct Predicate {
    groups: Vec<Vec<CompiledCondition>>,
}

impl Predicate {
    /// Compiles all value patterns of `groups`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyQueryGroup`] for a group with no conditions and
    /// [`ConfigError::InvalidPattern`] for a pattern that is not a valid regex.
    pub fn compile(groups: &[QueryGroup]) -> Result<Self, ConfigError> {
        let mut compiled = Vec::with_capacity(groups.len());
        for (group_idx, group) in groups.iter().enumerate() {
            if group.conditions.is_empty() {
                return Err(ConfigError::EmptyQueryGroup { group: group_idx });
            }
            let mut conditions = Vec::with_capacity(group.conditions.len());
            for condition in group.iter() {
                let pattern = condition
                    .value_pattern
                    .as_deref()
                    .map(|pattern| {
                        Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                            ConfigError::InvalidPattern {
                                key: condition.key.clone(),
                                pattern: pattern.to_string(),
                                message: err.to_string(),
                            }
                        })
                    })
                    .transpose()?;
                conditions.push(CompiledCondition {
                    key: condition.key.clone(),
                    pattern,
                });
            }
            compiled.push(conditions);
        }
        debug!(
            groups = compiled.len(),
            conditions = compiled.iter().map(Vec::len).sum::<usize>(),
            "query compiled"
        );
        Ok(Self { groups: compiled })
    }

    /// True if any group has all of its conditions satisfied by `tags`.
    pub fn evaluate(&self, tags: &Tags) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|condition| condition.matches(tags)))
    }

    pub fn matches<I>(&self, feature: &Feature<I>) -> bool {
        self.evaluate(&feature.tags)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// One-shot evaluation of `groups` against `tags`.
///
/// Prefer [`Predicate::compile`] when evaluating many tag sets.
pub fn evaluate(groups: &[QueryGroup], tags: &Tags) -> Result<bool, ConfigError> {
    Ok(Predicate::compile(groups)?.evaluate(tags))
}

#[cfg(test)]
mod tests {
    use conflate_model::QueryCondition;

    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn key_only_condition_accepts_any_value() {
        let groups = vec![QueryGroup::new(vec![QueryCondition::key("addr:housenumber")])];
        assert!(evaluate(&groups, &tags(&[("addr:housenumber", "")])).unwrap());
        assert!(evaluate(&groups, &tags(&[("addr:housenumber", "12a")])).unwrap());
        assert!(!evaluate(&groups, &tags(&[("addr:street", "Main")])).unwrap());
    }

    #[test]
    fn patterns_match_the_whole_value() {
        let groups = vec![QueryGroup::new(vec![QueryCondition::matching(
            "amenity", "fuel",
        )])];
        assert!(evaluate(&groups, &tags(&[("amenity", "fuel")])).unwrap());
        assert!(!evaluate(&groups, &tags(&[("amenity", "biofuel")])).unwrap());
        assert!(!evaluate(&groups, &tags(&[("amenity", "fuel;shop")])).unwrap());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let groups = vec![QueryGroup::new(vec![QueryCondition::matching(
            "addr:housenumber",
            "[0-9]+a",
        )])];
        assert!(evaluate(&groups, &tags(&[("addr:housenumber", "12a")])).unwrap());
        assert!(!evaluate(&groups, &tags(&[("addr:housenumber", "12A")])).unwrap());
        let upper_key = tags(&[("Addr:Housenumber", "12a")]);
        assert!(!evaluate(&groups, &upper_key).unwrap());
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let groups = vec![QueryGroup::new(vec![QueryCondition::matching(
            "shop", "bakery|butcher",
        )])];
        assert!(evaluate(&groups, &tags(&[("shop", "butcher")])).unwrap());
        assert!(!evaluate(&groups, &tags(&[("shop", "bakery_outlet")])).unwrap());
    }

    #[test]
    fn groups_or_conditions_and() {
        let groups = vec![
            QueryGroup::new(vec![
                QueryCondition::matching("amenity", "fuel"),
                QueryCondition::key("ref:mise"),
            ]),
            QueryGroup::new(vec![QueryCondition::key("addr:street")]),
        ];
        assert!(!evaluate(&groups, &tags(&[("amenity", "fuel")])).unwrap());
        assert!(evaluate(&groups, &tags(&[("amenity", "fuel"), ("ref:mise", "9")])).unwrap());
        assert!(evaluate(&groups, &tags(&[("addr:street", "Main")])).unwrap());
    }

    #[test]
    fn no_groups_match_nothing() {
        let predicate = Predicate::compile(&[]).unwrap();
        assert!(!predicate.evaluate(&tags(&[("a", "b")])));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let groups = vec![QueryGroup::new(vec![QueryCondition::matching("a", "(")])];
        assert!(matches!(
            Predicate::compile(&groups),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn empty_group_is_rejected() {
        assert_eq!(
            Predicate::compile(&[QueryGroup::default()]).unwrap_err(),
            ConfigError::EmptyQueryGroup { group: 0 }
        );
    }
}
