//! SGF game-record parsing, packaged as a DuckDB extension.
//!
//! [`parse`] turns one record into a [`Game`] tree. The extension exposes
//! the same parser to SQL through `read_sgf` and the `sgf_*` scalars.

pub mod error;
pub mod game;
pub mod parser;

mod duckdb_impl;
mod functions;
mod log;
mod reader;
mod record;
mod types;

pub use error::SgfError;
pub use game::{Color, Game, MainLine, Node, NodeId, Properties};
pub use parser::parse;

use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use functions::{
    SgfMainLineScalar, SgfMoveCountScalar, SgfNodeCountScalar, SgfNodesJsonScalar,
    SgfParseErrorScalar, SgfPropertiesJsonScalar,
};
use reader::ReadSgfVTab;
use std::error::Error;

#[duckdb_extension(name = "duckdb_sgf", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadSgfVTab>("read_sgf")?;

    // Scalar functions
    con.register_scalar_function::<SgfPropertiesJsonScalar>("sgf_properties_json")?;
    con.register_scalar_function::<SgfNodesJsonScalar>("sgf_nodes_json")?;
    con.register_scalar_function::<SgfMainLineScalar>("sgf_main_line")?;
    con.register_scalar_function::<SgfMoveCountScalar>("sgf_move_count")?;
    con.register_scalar_function::<SgfNodeCountScalar>("sgf_node_count")?;
    con.register_scalar_function::<SgfParseErrorScalar>("sgf_parse_error")?;

    Ok(())
}
