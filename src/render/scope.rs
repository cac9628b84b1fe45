//! Variable scope construction.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// String-keyed, JSON-like variables.
pub type Variables = BTreeMap<String, Value>;

/// Reserved variable holding the body placeholder.
pub const BODY_KEY: &str = "body";

/// Token a layout uses to mark where the wrapped content goes.
///
/// Rendered in place of `{{ body }}` and substituted after expansion.
/// Documents must not contain it literally.
pub const BODY_PLACEHOLDER: &str = "[[quire:body]]";

/// Variables visible to one expansion.
///
/// Built once per document level by [`merge`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariableScope(Variables);

impl VariableScope {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn variables(&self) -> &Variables {
        &self.0
    }
}

/// Merge front matter and caller variables into a scope.
///
/// The caller wins on collisions; `body` is then overwritten with
/// [`BODY_PLACEHOLDER`] whatever either side set.
pub fn merge(front_matter: &Variables, caller: &Variables) -> VariableScope {
    let mut variables = front_matter.clone();
    variables.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
    variables.insert(BODY_KEY.to_owned(), Value::from(BODY_PLACEHOLDER));
    VariableScope(variables)
}
