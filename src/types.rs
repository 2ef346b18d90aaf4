use libduckdb_sys::duckdb_date;

/// One `read_sgf` row: the well-known game-scope properties of a record,
/// typed where SQL users expect it.
#[derive(Debug, Clone, Default)]
pub struct GameRecord {
    // Players
    pub black: Option<String>,
    pub white: Option<String>,
    pub black_rank: Option<String>,
    pub white_rank: Option<String>,

    // Setup
    pub komi: Option<f64>,
    pub handicap: Option<u32>,
    pub board_size: Option<u32>,
    pub rules: Option<String>,
    pub add_black: Option<String>,
    pub add_white: Option<String>,

    // Game info
    pub result: Option<String>,
    pub date: Option<duckdb_date>,
    pub game_name: Option<String>,
    pub place: Option<String>,
    pub application: Option<String>,

    // Tree summary
    pub move_count: Option<u32>,
    pub node_count: Option<u32>,
    pub mainline: Option<String>,
    pub properties: Option<String>,

    pub source: Option<String>,

    /// NULL for records that parsed and converted cleanly.
    pub parse_error: Option<String>,
}
