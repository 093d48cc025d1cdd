use polars::prelude::*;

/// Reinterprets text columns such as `"1,234.5"` as `Float64`.
///
/// A column is converted only when it has at least one non-null value and every non-null
/// value parses as a number once `,` is removed. Anything else is left exactly as loaded.
pub(crate) fn coerce_thousands_columns(df: &mut DataFrame) -> Result<Vec<String>, PolarsError> {
    let candidates: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|column| column.dtype() == &DataType::String)
        .map(|column| column.name().clone())
        .collect();

    let mut converted = Vec::new();
    for name in candidates {
        let parsed = {
            let values = df.column(name.as_str())?.str()?;
            parse_text_column(values)
        };
        if let Some(values) = parsed {
            df.with_column(Series::new(name.clone(), values))?;
            converted.push(name.to_string());
        }
    }

    Ok(converted)
}

fn parse_text_column(values: &StringChunked) -> Option<Vec<Option<f64>>> {
    let mut parsed = Vec::with_capacity(values.len());
    let mut any_value = false;
    for value in values.iter() {
        match value {
            None => parsed.push(None),
            Some(text) => {
                parsed.push(Some(parse_grouped_number(text)?));
                any_value = true;
            }
        }
    }
    any_value.then_some(parsed)
}

/// Parses `text` as a number after dropping thousands separators.
pub(crate) fn parse_grouped_number(text: &str) -> Option<f64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    // Rust accepts "inf" and "nan"; point names like that must stay text.
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
