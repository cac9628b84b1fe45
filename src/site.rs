//! Site-wide context.
//!
//! Holds the variables from the `[site]` table of `quire.toml`. A `Site` is
//! owned by the [`Renderer`](crate::render::Renderer) and handed to every
//! compiler and template expansion, so nothing in the pipeline looks it up
//! globally.

use crate::render::Variables;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Site {
    variables: Variables,
}

impl Site {
    pub fn new(variables: Variables) -> Self {
        Self { variables }
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }
}

impl From<Variables> for Site {
    fn from(variables: Variables) -> Self {
        Self::new(variables)
    }
}
