use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nutrilog_core::models::{FoodLog, FoodSearchResult, Nutrient};

/// Parse a serving amount like "150" or "150g". The unit, if given, is only
/// checked against the food's reference unit by the caller.
pub(crate) fn parse_serving(s: &str) -> Result<(f64, Option<String>)> {
    let s = s.trim();
    let (num_part, unit_part) = s.split_at(numeric_prefix_len(s));
    let value: f64 = num_part.trim().parse().with_context(|| {
        format!("Invalid serving size: '{s}'. Use a number like '150' or '150g'")
    })?;
    if !value.is_finite() || value <= 0.0 {
        bail!("Serving size must be greater than 0");
    }
    let unit = unit_part.trim();
    Ok((value, (!unit.is_empty()).then(|| unit.to_lowercase())))
}

/// Length of the leading number in `s`, exponent included ("1e2g" -> 3).
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = bytes
        .iter()
        .position(|b| !(b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+')))
        .unwrap_or(bytes.len());
    if i > 0 && matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-' | b'+')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            i = j + bytes[j..]
                .iter()
                .position(|b| !b.is_ascii_digit())
                .unwrap_or(bytes.len() - j);
        }
    }
    i
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_search_table(foods: &[FoodSearchResult]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "FDC ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Brand")]
        brand: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Per")]
        serving: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.id.clone(),
            name: truncate(&f.name, 40),
            brand: f
                .brand
                .as_deref()
                .map(|b| truncate(b, 20))
                .unwrap_or_default(),
            calories: format!("{:.0}", f.calories),
            serving: format_amount(f.serving_size, &f.serving_unit),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_nutrient_table(nutrients: &[Nutrient]) {
    #[derive(Tabled)]
    struct NutrientRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Nutrient")]
        name: String,
        #[tabled(rename = "Amount")]
        value: String,
    }

    let rows: Vec<NutrientRow> = nutrients
        .iter()
        .map(|n| NutrientRow {
            id: n.id,
            name: truncate(&n.name, 45),
            value: format!("{:.2} {}", n.value, n.unit.to_lowercase()),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// "150g", "1.5 cup": no space for short symbolic units, one space otherwise.
pub(crate) fn format_amount(value: f64, unit: &str) -> String {
    let qty = if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    };
    if unit.chars().count() <= 2 {
        format!("{qty}{}", unit.to_lowercase())
    } else {
        format!("{qty} {}", unit.to_lowercase())
    }
}

pub(crate) fn describe_entry(log: &FoodLog) -> String {
    let name = &log.food.name;
    let brand = log
        .food
        .brand
        .as_ref()
        .map(|b| format!(" ({b})"))
        .unwrap_or_default();
    let amount = format_amount(log.serving_size, &log.food.serving_unit);
    let cal = no_neg_zero(log.calories());
    format!("{name}{brand} {amount} — {cal:.0} kcal")
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serving() {
        let (v, unit) = parse_serving("150").unwrap();
        assert!((v - 150.0).abs() < f64::EPSILON);
        assert!(unit.is_none());

        let (v, unit) = parse_serving("150g").unwrap();
        assert!((v - 150.0).abs() < f64::EPSILON);
        assert_eq!(unit.as_deref(), Some("g"));

        let (v, unit) = parse_serving(" 2.5 ML ").unwrap();
        assert!((v - 2.5).abs() < f64::EPSILON);
        assert_eq!(unit.as_deref(), Some("ml"));
    }

    #[test]
    fn test_parse_serving_exponent() {
        let (v, unit) = parse_serving("1e2").unwrap();
        assert!((v - 100.0).abs() < f64::EPSILON);
        assert!(unit.is_none());

        let (v, unit) = parse_serving("1.5E1g").unwrap();
        assert!((v - 15.0).abs() < f64::EPSILON);
        assert_eq!(unit.as_deref(), Some("g"));

        let (v, unit) = parse_serving("2 each").unwrap();
        assert!((v - 2.0).abs() < f64::EPSILON);
        assert_eq!(unit.as_deref(), Some("each"));
    }

    #[test]
    fn test_parse_serving_invalid() {
        assert!(parse_serving("abc").is_err());
        assert!(parse_serving("").is_err());
        assert!(parse_serving("0").is_err());
        assert!(parse_serving("-50g").is_err());
    }

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(150.0, "g"), "150g");
        assert_eq!(format_amount(2.5, "ml"), "2.5ml");
        assert_eq!(format_amount(1.0, "cup"), "1 cup");
        assert_eq!(format_amount(100.0, "GRM"), "100 grm");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("nope"), r#"{"error":"nope"}"#);
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
    }
}
