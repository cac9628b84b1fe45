//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use crate::render::{DEFAULT_INCLUDES, DEFAULT_LAYOUTS};
    use std::path::PathBuf;

    pub fn root() -> PathBuf {
        ".".into()
    }

    pub fn layouts() -> PathBuf {
        DEFAULT_LAYOUTS.into()
    }

    pub fn includes() -> PathBuf {
        DEFAULT_INCLUDES.into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn extensions() -> Vec<String> {
        crate::resource::default_extensions()
    }
}

// ============================================================================
// [compilers] Section Defaults
// ============================================================================

pub mod compilers {
    pub mod markdown {
        pub fn extensions() -> Vec<String> {
            vec!["md".into(), "markdown".into()]
        }
    }

    pub mod script {
        pub fn input() -> String {
            "source".into()
        }

        pub fn output() -> String {
            "output".into()
        }
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    pub fn debounce_ms() -> u64 {
        300
    }
}
