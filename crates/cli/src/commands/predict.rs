//! Queries against a running pricing service

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use tabled::Tabled;

#[derive(Tabled)]
struct SimilarRow {
    #[tabled(rename = "Carat")]
    carat: String,
    #[tabled(rename = "Cut")]
    cut: String,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "Clarity")]
    clarity: String,
    #[tabled(rename = "Depth")]
    depth: String,
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Price")]
    price: String,
}

impl SimilarRow {
    // Columns follow the dataset order: carat, cut, color, clarity, depth, table, price, x, y, z
    fn from_values(values: &[Value]) -> Self {
        let cell = |i: usize| match values.get(i) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "-".to_string(),
            Some(v) => v.to_string(),
        };
        let price = values
            .get(6)
            .and_then(Value::as_f64)
            .map(output::format_price)
            .unwrap_or_else(|| "-".to_string());

        Self {
            carat: cell(0),
            cut: cell(1),
            color: cell(2),
            clarity: cell(3),
            depth: cell(4),
            table: cell(5),
            price,
        }
    }
}

fn parse_data(data: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(data).context("--data must be a JSON object")?;
    if !value.is_object() {
        anyhow::bail!("--data must be a JSON object");
    }
    Ok(value)
}

/// Predict the price of the diamond described by `data`
pub async fn predict_price(
    client: &ApiClient,
    data: &str,
    model: Option<&str>,
    version: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let data = parse_data(data)?;
    let price = client.predict(&data, model, version).await?;

    match format {
        OutputFormat::Json => output::print_json(&json!({ "result": [price] })),
        OutputFormat::Table => {
            let source = match (model, version) {
                (Some(m), Some(v)) => format!(" ({} v{})", m, v),
                (Some(m), None) => format!(" ({}, latest)", m),
                (None, Some(v)) => format!(" (default model v{})", v),
                (None, None) => String::new(),
            };
            output::print_success(&format!(
                "Predicted price: {}{}",
                output::format_price(price),
                source
            ));
        }
    }

    Ok(())
}

/// Show dataset diamonds of the same grade with the nearest carat
pub async fn similar_diamonds(
    client: &ApiClient,
    data: &str,
    count: usize,
    format: OutputFormat,
) -> Result<()> {
    let data = parse_data(data)?;
    let rows = client.similar(&data, count).await?;

    if rows.is_empty() && format == OutputFormat::Table {
        output::print_warning("No diamonds of the same grade found");
        return Ok(());
    }

    let table: Vec<SimilarRow> = rows.iter().map(|r| SimilarRow::from_values(r)).collect();
    output::print_table(table, &json!({ "result": rows }), format);

    Ok(())
}
