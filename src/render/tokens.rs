//! `{name}` placeholder substitution.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

#[allow(clippy::expect_used)]
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("literal token pattern"));

/// Build-time values keyed by token name.
pub type TokenTable = BTreeMap<String, String>;

/// Result of substituting tokens into a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituted {
    /// Text with every known token replaced.
    pub text: String,
    /// Names of tokens left literal, in order of first appearance.
    pub unresolved: Vec<String>,
}

/// Replaces every `{name}` that has an entry in `tokens`.
///
/// Unknown tokens stay literal and are listed in [`Substituted::unresolved`].
#[must_use]
pub fn substitute(text: &str, tokens: &TokenTable) -> Substituted {
    let mut unresolved = Vec::new();
    let text = TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            if let Some(value) = tokens.get(name) {
                value.clone()
            } else {
                if !unresolved.iter().any(|n| n == name) {
                    unresolved.push(name.to_string());
                }
                caps[0].to_string()
            }
        })
        .into_owned();

    Substituted { text, unresolved }
}
