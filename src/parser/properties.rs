use std::sync::LazyLock;

use smallvec::SmallVec;

use super::keys::{KeyKind, classify};
use crate::error::SgfError;
use crate::game::{Game, Properties};
use crate::log;

// Stand-ins for `\[` and `\]` while matching, so an escaped bracket never
// closes a value group. Private-use code points do not occur in records.
const OPEN_PLACEHOLDER: char = '\u{E000}';
const CLOSE_PLACEHOLDER: char = '\u{E001}';

/// A key followed by one or more adjacent `[...]` groups.
static PROPERTY_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"([a-zA-Z]+)((?:\[[^\]]*\])+)").expect("valid property regex")
});

type PointList<'a> = SmallVec<[&'a str; 16]>;

/// One property as matched in a node token. `value` still carries the
/// escape placeholders and the inner `][` boundaries of multi-group values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawProperty<'a> {
    pub key: &'a str,
    /// Bracket groups with the outermost `[` and `]` stripped.
    pub value: &'a str,
    /// Bracket groups as matched.
    pub groups: &'a str,
    /// Whole matched text, key included.
    pub matched: &'a str,
}

/// Replaces escaped brackets with placeholders ahead of matching.
pub(crate) fn mask_escaped_brackets(token: &str) -> String {
    token
        .replace(r"\[", &OPEN_PLACEHOLDER.to_string())
        .replace(r"\]", &CLOSE_PLACEHOLDER.to_string())
}

/// Turns placeholders back into literal brackets.
pub(crate) fn restore_brackets(value: &str) -> String {
    if !value.contains([OPEN_PLACEHOLDER, CLOSE_PLACEHOLDER]) {
        return value.to_string();
    }
    value
        .replace(OPEN_PLACEHOLDER, "[")
        .replace(CLOSE_PLACEHOLDER, "]")
}

/// Matches every `KEY[...]...` pair in a masked node token. Text that does
/// not match is skipped.
pub(crate) fn extract(masked: &str) -> Vec<RawProperty<'_>> {
    PROPERTY_RE
        .captures_iter(masked)
        .filter_map(|caps| {
            let matched = caps.get(0)?.as_str();
            let key = caps.get(1)?.as_str();
            let groups = caps.get(2)?.as_str();
            // The group pattern guarantees a leading `[` and trailing `]`.
            let value = &groups[1..groups.len() - 1];
            Some(RawProperty {
                key,
                value,
                groups,
                matched,
            })
        })
        .collect()
}

/// Splits `aa][bb][cc` into its points.
pub(crate) fn split_point_list(value: &str) -> PointList<'_> {
    value.split("][").collect()
}

/// Unescapes `\;` in node-scope values.
pub(crate) fn unescape_node_value(value: &str) -> String {
    value.replace(r"\;", ";")
}

/// Parses one node token, storing game-scope properties on `game` and
/// returning the node-scope ones.
pub(crate) fn parse_properties(token: &str, game: &mut Game) -> Result<Properties, SgfError> {
    let masked = mask_escaped_brackets(token);
    let mut node_properties = Properties::default();

    for raw in extract(&masked) {
        match classify(raw.key) {
            KeyKind::PointList => {
                let points = split_point_list(raw.value);
                game.set_property(raw.key, restore_brackets(&points.join(",")));
            }
            KeyKind::Game => {
                game.set_property(raw.key, restore_brackets(raw.value));
            }
            KeyKind::Node => {
                let value = unescape_node_value(raw.value);
                node_properties.set(raw.key, restore_brackets(&value));
            }
            KeyKind::Legacy => {
                log::debug(format!("Not handling {} = {}", raw.key, raw.value));
            }
            KeyKind::Unsupported => {
                return Err(SgfError::UnsupportedProperty {
                    key: raw.key.to_string(),
                    value: restore_brackets(raw.groups),
                    token: restore_brackets(raw.matched),
                });
            }
        }
    }

    Ok(node_properties)
}
