use std::collections::BTreeMap;

use serde::Deserialize;

/// Mutate verbs accepted by the remote service.
///
/// The derived ordering (`Add < Set < Remove`) is the wire order: the
/// remote side gives no guarantee about mixed-action groups, so we pin one
/// instead of leaning on container iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    Add,
    Set,
    Remove,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "ADD",
            Action::Set => "SET",
            Action::Remove => "REMOVE",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities queued per action. Actions iterate in fixed priority order
/// (ADD, SET, REMOVE); entities within an action keep insertion order, which
/// becomes their wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMap<T> {
    entries: BTreeMap<Action, Vec<T>>,
}

impl<T> ActionMap<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, action: Action, entity: T) -> Self {
        self.push(action, entity);
        self
    }

    pub fn push(&mut self, action: Action, entity: T) {
        self.entries.entry(action).or_default().push(entity);
    }

    pub fn extend(&mut self, action: Action, entities: impl IntoIterator<Item = T>) {
        self.entries.entry(action).or_default().extend(entities);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// `(action, entity)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Action, &T)> {
        self.entries
            .iter()
            .flat_map(|(action, entities)| entities.iter().map(move |e| (*action, e)))
    }
}

impl<T> Default for ActionMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for ActionMap<T> {
    type Item = (Action, T);
    type IntoIter = std::vec::IntoIter<(Action, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .flat_map(|(action, entities)| entities.into_iter().map(move |e| (action, e)))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

/// Time-limited upload/download location issued by the job service. Opaque
/// here; the job-management side owns its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemporaryUrl {
    pub url: String,
    pub expiration: Option<String>,
}

impl TemporaryUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expiration: None,
        }
    }
}

/// Outcome of one submitted operation. Results arrive in submission order
/// and correspond to operations positionally, never by content.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MutateResult {
    pub index: Option<i64>,
    #[serde(rename = "errorList")]
    pub error_list: Option<ErrorList>,
}

impl MutateResult {
    /// Errors attached to this result; empty when the operation succeeded.
    pub fn errors(&self) -> &[EntityError] {
        self.error_list
            .as_ref()
            .map(|list| list.errors.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_success(&self) -> bool {
        self.errors().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ErrorList {
    pub errors: Vec<EntityError>,
}

/// One service-side error record from an `errorList`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EntityError {
    pub field_path: Option<String>,
    pub trigger: Option<String>,
    pub error_string: Option<String>,
    #[serde(rename = "ApiError.Type")]
    pub error_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_strings() {
        assert_eq!(Action::Add.as_str(), "ADD");
        assert_eq!(Action::Set.as_str(), "SET");
        assert_eq!(Action::Remove.as_str(), "REMOVE");
    }

    #[test]
    fn test_action_map_pins_action_order() {
        let map = ActionMap::new()
            .with(Action::Remove, "old")
            .with(Action::Add, "first")
            .with(Action::Add, "second");

        let order: Vec<_> = map.iter().collect();
        assert_eq!(
            order,
            vec![
                (Action::Add, &"first"),
                (Action::Add, &"second"),
                (Action::Remove, &"old"),
            ]
        );
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_mutate_result_errors_accessor() {
        let ok = MutateResult::default();
        assert!(ok.is_success());
        assert!(ok.errors().is_empty());

        let failed = MutateResult {
            index: Some(1),
            error_list: Some(ErrorList {
                errors: vec![EntityError {
                    error_string: Some("DistinctError.DUPLICATE_ELEMENT".to_string()),
                    ..Default::default()
                }],
            }),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.errors().len(), 1);
    }
}
