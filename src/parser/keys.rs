//! Property key vocabulary.
//!
//! See <https://www.red-bean.com/sgf/properties.html> for the meaning of each key.

/// Keys recorded once for the whole game, independent of the node they appear on.
const GAME_KEYS: &[&str] = &[
    "AP",    // application that wrote the record
    "BR",    // black rank
    "WR",    // white rank
    "KM",    // komi
    "PB",    // black player
    "PW",    // white player
    "CA",    // charset
    "FF",    // file format version
    "GM",    // game type, 1 = Go
    "SZ",    // board size
    "AN",    // annotator
    "RU",    // rules
    "TM",    // time limit in seconds
    "OT",    // overtime method
    "DT",    // date
    "PC",    // place
    "RE",    // result
    "ST",    // how to show variations
    "PM",    // move number printing
    "FG",    // figure printing
    "GN",    // game name
    "TB",    // black territory
    "TW",    // white territory
    "HA",    // handicap stones
    "AB",    // add black stones
    "AW",    // add white stones
    "AE",    // add empty points
    "PL",    // player to move
    "KGSDE", // KGS dead stones
    "KGSSW", // KGS white score
    "KGSSB", // KGS black score
];

/// Keys recorded on the node being parsed.
const NODE_KEYS: &[&str] = &[
    "B",  // black move
    "W",  // white move
    "CR", // circle markers
    "MA", // cross markers
    "SL", // selected points
    "LB", // point labels
    "TR", // triangle markers
    "OW", // white stones left in byo-yomi period
    "OB", // black stones left in byo-yomi period
    "WL", // white time left
    "BL", // black time left
    "C",  // comment
];

/// FF[1]-FF[3] point labels, superseded by `LB`.
const LEGACY_LABEL_KEY: &str = "L";

/// Keys whose value is a list of points.
const POINT_LIST_KEYS: &[&str] = &["AB", "AW"];

/// How the parser handles one property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyKind {
    /// Point list stored comma-joined at game scope.
    PointList,
    Game,
    Node,
    /// Recognised but dropped.
    Legacy,
    Unsupported,
}

pub(crate) fn classify(key: &str) -> KeyKind {
    if POINT_LIST_KEYS.contains(&key) {
        KeyKind::PointList
    } else if GAME_KEYS.contains(&key) {
        KeyKind::Game
    } else if NODE_KEYS.contains(&key) {
        KeyKind::Node
    } else if key == LEGACY_LABEL_KEY {
        KeyKind::Legacy
    } else {
        KeyKind::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_sets_are_disjoint() {
        for key in GAME_KEYS {
            assert!(!NODE_KEYS.contains(key), "{key} is in both sets");
        }
        assert!(!GAME_KEYS.contains(&LEGACY_LABEL_KEY));
        assert!(!NODE_KEYS.contains(&LEGACY_LABEL_KEY));
    }

    #[test]
    fn test_point_list_keys_are_game_keys() {
        for key in POINT_LIST_KEYS {
            assert!(GAME_KEYS.contains(key));
        }
    }

    #[test]
    fn test_classify_routes_each_policy() {
        assert_eq!(classify("AB"), KeyKind::PointList);
        assert_eq!(classify("AW"), KeyKind::PointList);
        assert_eq!(classify("AE"), KeyKind::Game);
        assert_eq!(classify("PB"), KeyKind::Game);
        assert_eq!(classify("KGSSB"), KeyKind::Game);
        assert_eq!(classify("B"), KeyKind::Node);
        assert_eq!(classify("C"), KeyKind::Node);
        assert_eq!(classify("L"), KeyKind::Legacy);
        assert_eq!(classify("XX"), KeyKind::Unsupported);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(classify("pb"), KeyKind::Unsupported);
        assert_eq!(classify("b"), KeyKind::Unsupported);
    }
}
