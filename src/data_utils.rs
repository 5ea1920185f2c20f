use crate::error::Result;
use polars::prelude::*;

/// Zero-fill policy for numeric cells: missing, non-numeric and NaN all count as 0
pub fn coerce_numeric(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Integer view of a coerced numeric cell (fraction truncated toward zero)
pub fn coerce_integer(value: Option<f64>) -> i64 {
    coerce_numeric(value).trunc() as i64
}

/// Column cells as text; nulls stay `None`
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|cell| cell.map(|s| s.trim().to_string()))
        .collect();
    Ok(values)
}

/// Column cells as numbers; cells that cannot be read as a number are `None`
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?;
    // Text cells may carry padding the cast would reject
    let series = if series.dtype() == &DataType::String {
        let trimmed: Vec<Option<String>> = series
            .str()?
            .into_iter()
            .map(|cell| cell.map(|s| s.trim().to_string()))
            .collect();
        Series::new(name, trimmed).cast(&DataType::Float64)?
    } else {
        series.cast(&DataType::Float64)?
    };
    let values = series
        .f64()?
        .into_iter()
        .map(|cell| cell.filter(|v| !v.is_nan()))
        .collect();
    Ok(values)
}

/// Non-negative counts (group sizes); nulls become 0
pub fn count_values(df: &DataFrame, name: &str) -> Result<Vec<u64>> {
    let series = df.column(name)?.cast(&DataType::UInt64)?;
    let values = series.u64()?.into_iter().map(|cell| cell.unwrap_or(0)).collect();
    Ok(values)
}

/// Day keys written by the scorer; nulls mark unparseable dates
pub fn day_key_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i32>>> {
    let series = df.column(name)?.cast(&DataType::Int32)?;
    let values = series.i32()?.into_iter().collect();
    Ok(values)
}
