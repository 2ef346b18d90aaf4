use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use libduckdb_sys::duckdb_date;

use crate::error::ErrorAccumulator;
use crate::functions::{main_line_text, properties_json};
use crate::game::Game;
use crate::types::GameRecord;

static EPOCH: LazyLock<NaiveDate> =
    LazyLock::new(|| NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid epoch date"));

/// Builds the `read_sgf` row for a parsed record.
///
/// Conversion failures leave the column NULL and are reported in
/// `parse_error`; they never drop the row.
pub fn build_game_record(game: &Game, source: &str) -> GameRecord {
    let mut parse_error = ErrorAccumulator::default();
    let text = |key: &str| game.property(key).map(str::to_string);

    let komi = parse_f64_field(game.property("KM"), "Komi", &mut parse_error);
    let handicap = parse_uinteger_field(game.property("HA"), "Handicap", &mut parse_error);
    let board_size = parse_uinteger_field(game.property("SZ"), "BoardSize", &mut parse_error);
    let date = game
        .property("DT")
        .and_then(|raw| parse_date_field(raw, "Date", &mut parse_error));

    GameRecord {
        black: text("PB"),
        white: text("PW"),
        black_rank: text("BR"),
        white_rank: text("WR"),
        komi,
        handicap,
        board_size,
        rules: text("RU"),
        add_black: text("AB"),
        add_white: text("AW"),
        result: text("RE"),
        date,
        game_name: text("GN"),
        place: text("PC"),
        application: text("AP"),
        move_count: u32::try_from(game.move_count()).ok(),
        node_count: u32::try_from(game.node_count()).ok(),
        mainline: Some(main_line_text(game)),
        properties: Some(properties_json(game.properties())),
        source: Some(source.to_string()),
        parse_error: parse_error.take(),
    }
}

/// Row for a record that could not be read or parsed at all.
pub fn failed_game_record(source: &str, error_msg: String) -> GameRecord {
    GameRecord {
        source: Some(source.to_string()),
        parse_error: Some(error_msg),
        ..GameRecord::default()
    }
}

fn parse_uinteger_field(
    raw: Option<&str>,
    label: &str,
    parse_error: &mut ErrorAccumulator,
) -> Option<u32> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<u32>() {
        Ok(v) => Some(v),
        Err(_) => {
            parse_error.push(&format!("Conversion error: {label}='{s}'"));
            None
        }
    }
}

fn parse_f64_field(
    raw: Option<&str>,
    label: &str,
    parse_error: &mut ErrorAccumulator,
) -> Option<f64> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            parse_error.push(&format!("Conversion error: {label}='{s}'"));
            None
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first_day_next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?
    };

    first_day_next_month.pred_opt().map(|d| d.day())
}

/// Converts an SGF `DT` value to a DuckDB date.
///
/// Only the first date of a list (`1996-05-06,07`) is used. `YYYY` and
/// `YYYY-MM` default the missing parts to 01; a day past the end of its
/// month is clamped to the last day.
fn parse_date_field(raw: &str, label: &str, parse_error: &mut ErrorAccumulator) -> Option<duckdb_date> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let first = s.split(',').next().unwrap_or_default().trim();
    let parts: Vec<&str> = first.split('-').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        parse_error.push(&format!("Conversion error: {label}='{s}'"));
        return None;
    }

    let mut fields = [1i64; 3];
    for (slot, part) in fields.iter_mut().zip(parts.iter()) {
        match part.parse::<i64>() {
            Ok(v) => *slot = v,
            Err(e) => {
                parse_error.push(&format!("Conversion error: {label}='{s}' ({e})"));
                return None;
            }
        }
    }

    let (Ok(year), Ok(month), Ok(mut day)) = (
        i32::try_from(fields[0]),
        u32::try_from(fields[1]),
        u32::try_from(fields[2]),
    ) else {
        parse_error.push(&format!("Conversion error: {label}='{s}' (out of range)"));
        return None;
    };

    let Some(last_day) = last_day_of_month(year, month) else {
        parse_error.push(&format!(
            "Conversion error: {label}='{s}' (chrono: input is out of range)"
        ));
        return None;
    };

    if day > last_day {
        day = last_day;
    }

    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        parse_error.push(&format!(
            "Conversion error: {label}='{s}' (chrono: input is out of range)"
        ));
        return None;
    };

    if date.year() <= 0 {
        parse_error.push(&format!(
            "Conversion error: {label}='{s}' (chrono: year must be >= 1)"
        ));
        return None;
    }

    let days_i64 = date.signed_duration_since(*EPOCH).num_days();
    let Ok(days) = i32::try_from(days_i64) else {
        parse_error.push(&format!(
            "Conversion error: {label}='{s}' (chrono: date out of range)"
        ));
        return None;
    };

    Some(duckdb_date { days })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn days_from_civil(year: i32, month: u32, day: u32) -> i32 {
        let y = year - if month <= 2 { 1 } else { 0 };
        let era = if y >= 0 { y } else { y - 399 } / 400;
        let yoe = y - era * 400;
        let m = month as i32;
        let doy = (153 * (m + if m > 2 { -3 } else { 9 }) + 2) / 5 + day as i32 - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146097 + doe - 719468
    }

    fn record(sgf: &str) -> GameRecord {
        let game = parse(sgf).expect("record parses");
        build_game_record(&game, "inline.sgf")
    }

    #[test]
    fn test_record_maps_game_properties() {
        let game = record(
            "(;GM[1]FF[4]SZ[19]PB[Shusaku]PW[Gennan]BR[4d]WR[8d]KM[0]HA[0]RE[B+2]\
             DT[1846-09-11]RU[Japanese]GN[Ear-reddening game]PC[Osaka]AP[Test:1.0]\
             ;B[qd];W[dc];B[pq])",
        );

        assert_eq!(game.black.as_deref(), Some("Shusaku"));
        assert_eq!(game.white.as_deref(), Some("Gennan"));
        assert_eq!(game.black_rank.as_deref(), Some("4d"));
        assert_eq!(game.white_rank.as_deref(), Some("8d"));
        assert_eq!(game.komi, Some(0.0));
        assert_eq!(game.handicap, Some(0));
        assert_eq!(game.board_size, Some(19));
        assert_eq!(game.result.as_deref(), Some("B+2"));
        assert_eq!(game.date.map(|d| d.days), Some(days_from_civil(1846, 9, 11)));
        assert_eq!(game.rules.as_deref(), Some("Japanese"));
        assert_eq!(game.game_name.as_deref(), Some("Ear-reddening game"));
        assert_eq!(game.place.as_deref(), Some("Osaka"));
        assert_eq!(game.application.as_deref(), Some("Test:1.0"));
        assert_eq!(game.move_count, Some(3));
        assert_eq!(game.node_count, Some(4));
        assert_eq!(game.mainline.as_deref(), Some("B[qd] W[dc] B[pq]"));
        assert_eq!(game.source.as_deref(), Some("inline.sgf"));
        assert!(game.parse_error.is_none());
    }

    #[test]
    fn test_record_missing_properties_are_null() {
        let game = record("(;GM[1];B[aa])");

        assert!(game.black.is_none());
        assert!(game.komi.is_none());
        assert!(game.date.is_none());
        assert!(game.add_black.is_none());
        assert!(game.parse_error.is_none());
    }

    #[test]
    fn test_record_setup_stones() {
        let game = record("(;GM[1]HA[2]AB[dd][pp];W[dp])");
        assert_eq!(game.handicap, Some(2));
        assert_eq!(game.add_black.as_deref(), Some("dd,pp"));
        assert!(game.add_white.is_none());
    }

    #[test]
    fn test_record_fractional_komi() {
        assert_eq!(record("(;KM[6.5])").komi, Some(6.5));
        assert_eq!(record("(;KM[-7.5])").komi, Some(-7.5));
    }

    #[test]
    fn test_record_conversion_errors_are_accumulated() {
        let game = record("(;KM[six]HA[many]SZ[19:13]DT[someday])");

        assert!(game.komi.is_none());
        assert!(game.handicap.is_none());
        assert!(game.board_size.is_none());
        assert!(game.date.is_none());

        let err = game.parse_error.expect("conversion errors");
        assert!(err.contains("Conversion error: Komi='six'"));
        assert!(err.contains("Conversion error: Handicap='many'"));
        assert!(err.contains("Conversion error: BoardSize='19:13'"));
        assert!(err.contains("Conversion error: Date='someday'"));
    }

    #[test]
    fn test_date_partial_values_default_to_first_day() {
        let mut parse_error = ErrorAccumulator::default();

        let year_only = parse_date_field("1996", "Date", &mut parse_error).unwrap();
        assert_eq!(year_only.days, days_from_civil(1996, 1, 1));

        let year_month = parse_date_field("1996-05", "Date", &mut parse_error).unwrap();
        assert_eq!(year_month.days, days_from_civil(1996, 5, 1));
        assert!(parse_error.is_empty());
    }

    #[test]
    fn test_date_list_uses_first_entry() {
        let mut parse_error = ErrorAccumulator::default();
        let date = parse_date_field("1996-05-06,07", "Date", &mut parse_error).unwrap();
        assert_eq!(date.days, days_from_civil(1996, 5, 6));
        assert!(parse_error.is_empty());
    }

    #[test]
    fn test_date_clamps_day_past_month_end() {
        let mut parse_error = ErrorAccumulator::default();

        let november = parse_date_field("2015-11-31", "Date", &mut parse_error).unwrap();
        assert_eq!(november.days, days_from_civil(2015, 11, 30));

        let leap = parse_date_field("2000-02-30", "Date", &mut parse_error).unwrap();
        assert_eq!(leap.days, days_from_civil(2000, 2, 29));

        let non_leap = parse_date_field("1997-02-29", "Date", &mut parse_error).unwrap();
        assert_eq!(non_leap.days, days_from_civil(1997, 2, 28));
        assert!(parse_error.is_empty());
    }

    #[test]
    fn test_date_invalid_month_records_chrono_error() {
        let mut parse_error = ErrorAccumulator::default();
        assert!(parse_date_field("2000-13-01", "Date", &mut parse_error).is_none());

        let err = parse_error.take().unwrap();
        assert!(err.contains("Date='2000-13-01'"));
        assert!(err.contains("chrono:"));
    }

    #[test]
    fn test_date_year_zero_is_rejected() {
        let mut parse_error = ErrorAccumulator::default();
        assert!(parse_date_field("0000-01-01", "Date", &mut parse_error).is_none());
        assert!(parse_error.take().unwrap().contains("year must be >= 1"));
    }

    #[test]
    fn test_date_empty_is_null_without_error() {
        let mut parse_error = ErrorAccumulator::default();
        assert!(parse_date_field("  ", "Date", &mut parse_error).is_none());
        assert!(parse_error.is_empty());
    }

    #[test]
    fn test_failed_record_carries_only_source_and_error() {
        let game = failed_game_record("broken.sgf", "boom".to_string());

        assert_eq!(game.source.as_deref(), Some("broken.sgf"));
        assert_eq!(game.parse_error.as_deref(), Some("boom"));
        assert!(game.black.is_none());
        assert!(game.node_count.is_none());
        assert!(game.mainline.is_none());
    }
}
