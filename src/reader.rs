use crate::duckdb_impl::bind_info_ffi::{NamedParameterVarchar, get_named_parameter_varchar};
use crate::error::ErrorAccumulator;
use crate::log;
use crate::parser::parse;
use crate::record::{build_game_record, failed_game_record};
use crate::types::GameRecord;
use duckdb::{
    core::{DataChunkHandle, Inserter, LogicalTypeHandle, LogicalTypeId},
    vtab::{BindInfo, InitInfo, TableFunctionInfo, VTab},
};
use libduckdb_sys::duckdb_date;
use std::borrow::Cow;
use std::ffi::CString;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zstd::stream::read::Decoder as ZstdDecoder;

type SgfInput = Box<dyn Read + Send>;

#[repr(C)]
pub struct ReadSgfBindData {
    paths: Vec<PathBuf>,
    compression: CompressionMode,
}

#[repr(C)]
pub struct ReadSgfInitData {
    state: Mutex<SharedState>,
}

struct SharedState {
    next_path_idx: usize,
}

pub struct ReadSgfVTab;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CompressionMode {
    Plain,
    Zstd,
}

const PATH_PATTERN_PARAM_INDEX: u64 = 0;
const ROWS_PER_CHUNK: usize = 2048;
const READ_SGF_COLUMN_COUNT: usize = 21;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadSgfColumn {
    Black = 0,
    White = 1,
    BlackRank = 2,
    WhiteRank = 3,
    Komi = 4,
    Handicap = 5,
    BoardSize = 6,
    Result = 7,
    Date = 8,
    Rules = 9,
    GameName = 10,
    Place = 11,
    Application = 12,
    AddBlack = 13,
    AddWhite = 14,
    MoveCount = 15,
    NodeCount = 16,
    Mainline = 17,
    Properties = 18,
    ParseError = 19,
    Source = 20,
}

impl ReadSgfColumn {
    const fn index(self) -> usize {
        self as usize
    }

    fn name(self) -> &'static str {
        READ_SGF_COLUMNS[self.index()].name
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ReadSgfLogicalType {
    Varchar,
    UInteger,
    Double,
    Date,
}

impl ReadSgfLogicalType {
    fn to_handle(self) -> LogicalTypeHandle {
        match self {
            Self::Varchar => LogicalTypeHandle::from(LogicalTypeId::Varchar),
            Self::UInteger => LogicalTypeHandle::from(LogicalTypeId::UInteger),
            Self::Double => LogicalTypeHandle::from(LogicalTypeId::Double),
            Self::Date => LogicalTypeHandle::from(LogicalTypeId::Date),
        }
    }
}

struct ReadSgfColumnDef {
    name: &'static str,
    logical_type: ReadSgfLogicalType,
}

const fn column(name: &'static str, logical_type: ReadSgfLogicalType) -> ReadSgfColumnDef {
    ReadSgfColumnDef { name, logical_type }
}

const READ_SGF_COLUMNS: [ReadSgfColumnDef; READ_SGF_COLUMN_COUNT] = [
    column("Black", ReadSgfLogicalType::Varchar),
    column("White", ReadSgfLogicalType::Varchar),
    column("BlackRank", ReadSgfLogicalType::Varchar),
    column("WhiteRank", ReadSgfLogicalType::Varchar),
    column("Komi", ReadSgfLogicalType::Double),
    column("Handicap", ReadSgfLogicalType::UInteger),
    column("BoardSize", ReadSgfLogicalType::UInteger),
    column("Result", ReadSgfLogicalType::Varchar),
    column("Date", ReadSgfLogicalType::Date),
    column("Rules", ReadSgfLogicalType::Varchar),
    column("GameName", ReadSgfLogicalType::Varchar),
    column("Place", ReadSgfLogicalType::Varchar),
    column("Application", ReadSgfLogicalType::Varchar),
    column("AddBlack", ReadSgfLogicalType::Varchar),
    column("AddWhite", ReadSgfLogicalType::Varchar),
    column("MoveCount", ReadSgfLogicalType::UInteger),
    column("NodeCount", ReadSgfLogicalType::UInteger),
    column("mainline", ReadSgfLogicalType::Varchar),
    column("properties", ReadSgfLogicalType::Varchar),
    column("parse_error", ReadSgfLogicalType::Varchar),
    column("Source", ReadSgfLogicalType::Varchar),
];

impl CompressionMode {
    fn parse(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(
                "Invalid compression value ''. Supported values: 'zstd' or NULL/omitted."
                    .to_string()
                    .into(),
            );
        }

        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(format!(
                "Invalid compression value '{}'. Supported values: 'zstd' or NULL/omitted.",
                normalized
            )
            .into())
        }
    }

    fn resolve(param: NamedParameterVarchar) -> Result<Self, Box<dyn std::error::Error>> {
        match param {
            NamedParameterVarchar::Missing | NamedParameterVarchar::Null => Ok(Self::Plain),
            NamedParameterVarchar::Value(raw) if raw.trim().eq_ignore_ascii_case("null") => {
                Ok(Self::Plain)
            }
            NamedParameterVarchar::Value(raw) => Self::parse(&raw),
        }
    }
}

fn open_input_stream(path: &Path, compression: CompressionMode) -> Result<SgfInput, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as SgfInput)
            .map_err(|e| {
                format!(
                    "Failed to initialize zstd decoder for '{}': {}",
                    path.display(),
                    e
                )
            }),
    }
}

/// Reads a whole record into memory. Bytes that are not UTF-8 (legacy `CA`
/// charsets) are replaced lossily.
fn read_record(path: &Path, compression: CompressionMode) -> Result<String, String> {
    let mut input = open_input_stream(path, compression)?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read file '{}': {}", path.display(), e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parses one record into its row. A parse failure still yields a row.
fn record_from_text(text: &str, source: &Path) -> GameRecord {
    let source_name = source.display().to_string();
    match parse(text) {
        Ok(game) => build_game_record(&game, &source_name),
        Err(error) => {
            let error_msg = format!(
                "Parser-stage error: stage=parse; file='{}'; error={}",
                source_name, error
            );
            log::warn(&error_msg);
            failed_game_record(&source_name, error_msg)
        }
    }
}

fn sanitize_for_cstring<'a>(
    value: &'a str,
    field_name: &str,
    parse_error: &mut ErrorAccumulator,
) -> Cow<'a, str> {
    if value.contains('\0') {
        parse_error.push(&format!("Sanitized interior NUL in {}", field_name));
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn sanitize_for_cstring_silent(value: &str) -> Cow<'_, str> {
    if value.contains('\0') {
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}

struct ChunkWriter<'a> {
    output: &'a mut DataChunkHandle,
    row_count: usize,
}

impl<'a> ChunkWriter<'a> {
    fn new(output: &'a mut DataChunkHandle) -> Self {
        Self {
            output,
            row_count: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.row_count >= ROWS_PER_CHUNK
    }

    fn write_row(&mut self, game: &GameRecord) -> Result<(), Box<dyn std::error::Error>> {
        let row_idx = self.row_count;
        let mut row_parse_error = ErrorAccumulator::default();
        if let Some(parse_error) = game.parse_error.as_deref() {
            row_parse_error.push(parse_error);
        }

        let varchar_columns = [
            (ReadSgfColumn::Black, game.black.as_deref()),
            (ReadSgfColumn::White, game.white.as_deref()),
            (ReadSgfColumn::BlackRank, game.black_rank.as_deref()),
            (ReadSgfColumn::WhiteRank, game.white_rank.as_deref()),
            (ReadSgfColumn::Result, game.result.as_deref()),
            (ReadSgfColumn::Rules, game.rules.as_deref()),
            (ReadSgfColumn::GameName, game.game_name.as_deref()),
            (ReadSgfColumn::Place, game.place.as_deref()),
            (ReadSgfColumn::Application, game.application.as_deref()),
            (ReadSgfColumn::AddBlack, game.add_black.as_deref()),
            (ReadSgfColumn::AddWhite, game.add_white.as_deref()),
            (ReadSgfColumn::Mainline, game.mainline.as_deref()),
            (ReadSgfColumn::Properties, game.properties.as_deref()),
            (ReadSgfColumn::Source, game.source.as_deref()),
        ];
        for (column, value) in varchar_columns {
            self.write_optional_varchar(column, row_idx, value, &mut row_parse_error)?;
        }

        self.write_optional_double(ReadSgfColumn::Komi, row_idx, game.komi);
        self.write_optional_uinteger(ReadSgfColumn::Handicap, row_idx, game.handicap);
        self.write_optional_uinteger(ReadSgfColumn::BoardSize, row_idx, game.board_size);
        self.write_optional_date(ReadSgfColumn::Date, row_idx, game.date);
        self.write_optional_uinteger(ReadSgfColumn::MoveCount, row_idx, game.move_count);
        self.write_optional_uinteger(ReadSgfColumn::NodeCount, row_idx, game.node_count);

        let mut parse_error_vec = self.output.flat_vector(ReadSgfColumn::ParseError.index());
        if row_parse_error.is_empty() {
            parse_error_vec.set_null(row_idx);
        } else {
            let parse_error = row_parse_error.take().unwrap_or_default();
            let parse_error = sanitize_for_cstring_silent(parse_error.as_str());
            parse_error_vec.insert(row_idx, CString::new(parse_error.as_ref())?);
        }

        self.row_count += 1;
        Ok(())
    }

    fn set_output_len(&mut self) {
        self.output.set_len(self.row_count);
    }

    fn write_optional_varchar(
        &mut self,
        column: ReadSgfColumn,
        row_idx: usize,
        value: Option<&str>,
        parse_error: &mut ErrorAccumulator,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut vector = self.output.flat_vector(column.index());
        if let Some(value) = value {
            let sanitized = sanitize_for_cstring(value, column.name(), parse_error);
            vector.insert(row_idx, CString::new(sanitized.as_ref())?);
        } else {
            vector.set_null(row_idx);
        }
        Ok(())
    }

    fn write_optional_uinteger(
        &mut self,
        column: ReadSgfColumn,
        row_idx: usize,
        value: Option<u32>,
    ) {
        let mut vector = self.output.flat_vector(column.index());
        if let Some(value) = value {
            vector.as_mut_slice::<u32>()[row_idx] = value;
        } else {
            vector.set_null(row_idx);
        }
    }

    fn write_optional_double(&mut self, column: ReadSgfColumn, row_idx: usize, value: Option<f64>) {
        let mut vector = self.output.flat_vector(column.index());
        if let Some(value) = value {
            vector.as_mut_slice::<f64>()[row_idx] = value;
        } else {
            vector.set_null(row_idx);
        }
    }

    fn write_optional_date(
        &mut self,
        column: ReadSgfColumn,
        row_idx: usize,
        value: Option<duckdb_date>,
    ) {
        let mut vector = self.output.flat_vector(column.index());
        if let Some(value) = value {
            vector.as_mut_slice::<duckdb_date>()[row_idx] = value;
        } else {
            vector.set_null(row_idx);
        }
    }
}

/// Claims the next unread path, if any.
fn next_path_idx(
    init_data: &ReadSgfInitData,
    bind_data: &ReadSgfBindData,
) -> Result<Option<usize>, Box<dyn std::error::Error>> {
    let mut state = init_data
        .state
        .lock()
        .map_err(|_| "read_sgf scan state lock poisoned")?;

    if state.next_path_idx < bind_data.paths.len() {
        let path_idx = state.next_path_idx;
        state.next_path_idx += 1;
        Ok(Some(path_idx))
    } else {
        Ok(None)
    }
}

impl VTab for ReadSgfVTab {
    type InitData = ReadSgfInitData;
    type BindData = ReadSgfBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn std::error::Error>> {
        let pattern = bind.get_parameter(PATH_PATTERN_PARAM_INDEX).to_string();
        let compression =
            CompressionMode::resolve(get_named_parameter_varchar(bind, "compression")?)?;

        // Expand glob pattern to get list of files (single file or glob pattern)
        let paths: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
            glob::glob(&pattern)?
                .filter_map(|entry| entry.ok())
                .collect()
        } else {
            vec![PathBuf::from(pattern)]
        };

        for column in READ_SGF_COLUMNS.iter() {
            bind.add_result_column(column.name, column.logical_type.to_handle());
        }

        Ok(ReadSgfBindData { paths, compression })
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn std::error::Error>> {
        Ok(ReadSgfInitData {
            state: Mutex::new(SharedState { next_path_idx: 0 }),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let init_data = func.get_init_data();
        let bind_data = func.get_bind_data();
        let mut chunk_writer = ChunkWriter::new(output);

        while !chunk_writer.is_full() {
            let Some(path_idx) = next_path_idx(init_data, bind_data)? else {
                break;
            };

            let path = &bind_data.paths[path_idx];
            let text = match read_record(path, bind_data.compression) {
                Ok(text) => text,
                Err(err_msg) => {
                    if bind_data.paths.len() == 1 {
                        log::error(&err_msg);
                        return Err(err_msg.into());
                    }

                    log::warn(&err_msg);
                    continue;
                }
            };

            chunk_writer.write_row(&record_from_text(&text, path))?;
        }

        chunk_writer.set_output_len();
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            LogicalTypeHandle::from(LogicalTypeId::Varchar), // path pattern (required)
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![(
            "compression".to_string(),
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        )])
    }
}
