use crate::error::Result;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::fs;

    #[derive(Serialize)]
    struct Row {
        name: String,
        value: Option<f64>,
    }

    #[test]
    fn csv_export_keeps_missing_cells_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = vec![
            Row {
                name: "Alpha".to_string(),
                value: Some(1.5),
            },
            Row {
                name: "Beta".to_string(),
                value: None,
            },
        ];
        write_csv(path.to_str().unwrap(), &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Alpha,1.5"));
        // A missing value exports as an empty field, not a zero.
        assert!(text.contains("Beta,\n") || text.ends_with("Beta,"));
    }

    #[test]
    fn json_export_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let rows = Row {
            name: "Alpha".to_string(),
            value: Some(2.0),
        };
        write_json(path.to_str().unwrap(), &rows).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"name\": \"Alpha\""));
    }
}
