// src/output.rs
use crate::mc::mc_engine::Estimate;
use std::fs::File;
use std::io::{self, Write};

/// One line of an estimator comparison
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub label: String,
    pub price: f64,
    pub stderr: f64,
    pub elapsed_secs: f64,
}

impl ComparisonRow {
    pub fn new(label: &str, estimate: &Estimate, elapsed_secs: f64) -> Self {
        ComparisonRow {
            label: label.to_string(),
            price: estimate.price,
            stderr: estimate.stderr,
            elapsed_secs,
        }
    }
}

/// Markdown table of prices, standard errors and computation time relative
/// to the first row
pub fn format_comparison_table(rows: &[ComparisonRow]) -> String {
    let baseline = rows
        .first()
        .map(|r| r.elapsed_secs)
        .filter(|t| *t > 0.0)
        .unwrap_or(1.0);

    let mut table = String::new();
    table.push_str("|                      | Call Option Price  | Call Option Std. Err. | Relative Comp. Time |\n");
    table.push_str("| -------------------- | ------------------ | --------------------- | ------------------- |\n");
    for row in rows {
        table.push_str(&format!(
            "| {:<20} | {:<18.4} | {:<21.4} | {:<19.4} |\n",
            row.label,
            row.price,
            row.stderr,
            row.elapsed_secs / baseline
        ));
    }
    table
}

pub fn write_comparison_to_csv(filename: &str, rows: &[ComparisonRow]) -> io::Result<()> {
    let mut file = File::create(filename)?;
    let generated_at = chrono::Utc::now().to_rfc3339();
    writeln!(file, "generated_at,label,price,stderr,elapsed_secs")?;
    for row in rows {
        writeln!(
            file,
            "{},{},{},{},{}",
            generated_at, row.label, row.price, row.stderr, row.elapsed_secs
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<ComparisonRow> {
        vec![
            ComparisonRow {
                label: "Pathwise Monte Carlo".to_string(),
                price: 5.1234,
                stderr: 0.0712,
                elapsed_secs: 2.0,
            },
            ComparisonRow {
                label: "Control Variate".to_string(),
                price: 5.5012,
                stderr: 0.0031,
                elapsed_secs: 3.0,
            },
        ]
    }

    #[test]
    fn test_table_layout() {
        let table = format_comparison_table(&rows());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("5.1234"));
        assert!(lines[2].contains("1.0000"));
        assert!(lines[3].contains("1.5000"));
        assert!(lines.iter().all(|l| l.starts_with('|') && l.ends_with('|')));
    }

    #[test]
    fn test_csv_export() {
        let path = std::env::temp_dir().join(format!("asian_mc_output_{}.csv", std::process::id()));
        let filename = path.to_string_lossy().to_string();
        write_comparison_to_csv(&filename, &rows()).expect("temp dir is writable");

        let contents = std::fs::read_to_string(&path).expect("file written");
        let _ = std::fs::remove_file(&path);
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("generated_at,label"));
        assert!(lines[2].contains("Control Variate,5.5012,0.0031,3"));
    }
}
