use std::error::Error;

use duckdb::{
    Result,
    core::{DataChunkHandle, LogicalTypeHandle, LogicalTypeId},
    vscalar::{ScalarFunctionSignature, VScalar},
    vtab::arrow::WritableVector,
};

use crate::duckdb_impl::scalar::{
    invoke_unary_varchar_to_u64_nullable, invoke_unary_varchar_to_varchar,
};
use crate::game::{Game, Properties};
use crate::log;
use crate::parser::parse;

fn json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Properties as a JSON object, keys in insertion order.
pub(crate) fn properties_json(properties: &Properties) -> String {
    let fields: Vec<String> = properties
        .iter()
        .map(|(key, value)| format!("{}:{}", json_string(key), json_string(value)))
        .collect();
    format!("{{{}}}", fields.join(","))
}

/// Every node in creation order as a flat JSON array of
/// `{"id","parent","move","properties"}` objects.
pub(crate) fn nodes_json(game: &Game) -> String {
    let nodes: Vec<String> = game
        .nodes()
        .map(|node| {
            let parent = node
                .parent()
                .map(|p| p.id().index().to_string())
                .unwrap_or_else(|| "null".to_string());
            let move_no = node
                .move_no()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "null".to_string());
            format!(
                r#"{{"id":{},"parent":{},"move":{},"properties":{}}}"#,
                node.id().index(),
                parent,
                move_no,
                properties_json(node.properties())
            )
        })
        .collect();
    format!("[{}]", nodes.join(","))
}

/// Main-line moves as `B[pd] W[dd] ...`. Passes keep their empty value.
pub(crate) fn main_line_text(game: &Game) -> String {
    let moves: Vec<String> = game
        .main_line()
        .filter_map(|node| {
            let color = node.color()?;
            Some(format!("{}[{}]", color.key(), node.coordinate().unwrap_or_default()))
        })
        .collect();
    moves.join(" ")
}

fn parse_or_warn(record: &str) -> Option<Game> {
    match parse(record) {
        Ok(game) => Some(game),
        Err(e) => {
            log::warn(format!("Error parsing SGF record: {}", e));
            None
        }
    }
}

fn varchar_to_varchar_signature() -> Vec<ScalarFunctionSignature> {
    vec![ScalarFunctionSignature::exact(
        vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
        LogicalTypeHandle::from(LogicalTypeId::Varchar),
    )]
}

fn varchar_to_ubigint_signature() -> Vec<ScalarFunctionSignature> {
    vec![ScalarFunctionSignature::exact(
        vec![LogicalTypeHandle::from(LogicalTypeId::Varchar)],
        LogicalTypeHandle::from(LogicalTypeId::UBigint),
    )]
}

pub struct SgfPropertiesJsonScalar;

impl VScalar for SgfPropertiesJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |record| {
            parse_or_warn(record).map(|game| properties_json(game.properties()))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar_signature()
    }
}

pub struct SgfNodesJsonScalar;

impl VScalar for SgfNodesJsonScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |record| {
            parse_or_warn(record).map(|game| nodes_json(&game))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar_signature()
    }
}

pub struct SgfMainLineScalar;

impl VScalar for SgfMainLineScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |record| {
            parse_or_warn(record).map(|game| main_line_text(&game))
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar_signature()
    }
}

pub struct SgfParseErrorScalar;

impl VScalar for SgfParseErrorScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_varchar(input, output, |record| {
            parse(record).err().map(|e| e.to_string())
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_varchar_signature()
    }
}

pub struct SgfMoveCountScalar;

impl VScalar for SgfMoveCountScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_u64_nullable(input, output, |record| {
            parse_or_warn(record).map(|game| game.move_count() as u64)
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_ubigint_signature()
    }
}

pub struct SgfNodeCountScalar;

impl VScalar for SgfNodeCountScalar {
    type State = ();

    unsafe fn invoke(
        _state: &Self::State,
        input: &mut DataChunkHandle,
        output: &mut dyn WritableVector,
    ) -> Result<(), Box<dyn Error>> {
        invoke_unary_varchar_to_u64_nullable(input, output, |record| {
            parse_or_warn(record).map(|game| game.node_count() as u64)
        })
    }

    fn signatures() -> Vec<ScalarFunctionSignature> {
        varchar_to_ubigint_signature()
    }
}
