use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

use table::{Table, TableOptions};

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(to_table(serde_json::to_value(value)?).render(options())),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn options() -> TableOptions {
    let prefs = ui::prefs();
    TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

/// Objects become key/value rows, arrays of objects one row per element.
fn to_table(value: Value) -> Table {
    match value {
        Value::Object(map) => {
            let mut table = Table::new(vec!["key".into(), "value".into()]);
            let mut entries = map.into_iter().collect::<Vec<_>>();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, value) in entries {
                table.push(vec![key, cell(&value)]);
            }
            table
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let mut headers = Vec::<String>::new();
            for key in items.iter().filter_map(Value::as_object).flat_map(|m| m.keys()) {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            let rows = items
                .iter()
                .filter_map(Value::as_object)
                .map(|map| {
                    headers
                        .iter()
                        .map(|h| map.get(h).map_or_else(|| "-".to_string(), cell))
                        .collect()
                })
                .collect::<Vec<Vec<String>>>();
            let mut table = Table::new(headers);
            for row in rows {
                table.push(row);
            }
            table
        }
        Value::Array(items) => {
            let mut table = Table::new(vec!["value".into()]);
            for item in &items {
                table.push(vec![cell(item)]);
            }
            table
        }
        scalar => {
            let mut table = Table::new(vec!["value".into()]);
            table.push(vec![cell(&scalar)]);
            table
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::render;
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Counts {
        mode: Option<&'static str>,
        resolved: u64,
    }

    #[derive(Serialize)]
    struct Pending {
        name: &'static str,
        candidate_ids: Vec<u64>,
    }

    #[test]
    fn json_render_is_pretty_json() {
        let value = Counts {
            mode: Some("incremental"),
            resolved: 7,
        };
        let out = render(&value, OutputFormat::Json).expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["mode"], "incremental");
        assert_eq!(parsed["resolved"], 7);
        assert!(out.contains('\n'));
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let value = Counts {
            mode: None,
            resolved: 0,
        };
        let out = render(&value, OutputFormat::Raw).expect("raw render should work");
        assert!(!out.contains('\n'));
        assert!(out.contains("\"mode\":null"));
    }

    #[test]
    fn report_renders_as_key_value_rows() {
        let value = Counts {
            mode: None,
            resolved: 12,
        };
        let out = render(&value, OutputFormat::Table).expect("table render should work");
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("key"));
        assert!(lines[2].starts_with("mode") && lines[2].trim_end().ends_with('-'));
        assert!(lines[3].starts_with("resolved") && lines[3].trim_end().ends_with("12"));
    }

    #[test]
    fn list_renders_one_row_per_entry() {
        let value = vec![
            Pending {
                name: "Hyades Sector X",
                candidate_ids: vec![20, 21],
            },
            Pending {
                name: "Sol",
                candidate_ids: vec![1, 2],
            },
        ];
        let out = render(&value, OutputFormat::Table).expect("table render should work");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("name") && lines[0].contains("candidate_ids"));
        assert!(lines[2].contains("[20,21]"));
    }

    #[test]
    fn empty_list_says_so() {
        let value: Vec<Pending> = Vec::new();
        let out = render(&value, OutputFormat::Table).expect("table render should work");
        assert_eq!(out, "(no rows)");
    }
}
