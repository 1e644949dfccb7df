//! Text, Markdown and CSV summaries of benchmark logs.

use std::cmp::Ordering;

use fen_core::stats::{count_in_range, HalfmoveRange, VerdictField};
use fen_core::ExperimentRecord;

/// Per-range counts and percentages for a single log.
pub fn format_analysis(
    name: &str,
    records: &[ExperimentRecord],
    ranges: &[HalfmoveRange],
) -> String {
    let mut lines = vec![format!("{name}\n")];

    for range in ranges {
        let (counts, mean_halfmoves) = count_in_range(records, *range);
        lines.push(format!(
            "Range: {range} moves (n={}, mean_halfmoves={mean_halfmoves:.1})",
            counts.n
        ));
        for field in VerdictField::ALL {
            lines.push(format!(
                "    {:16}: {:4} ({:.1}%)",
                field.key(),
                counts.get(field),
                counts.percentage(field)
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// One model's accuracy per stratum; `None` where the stratum is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub provider: String,
    pub model: String,
    pub percentages: Vec<Option<f64>>,
}

impl ResultRow {
    pub fn from_records(
        records: &[ExperimentRecord],
        field: VerdictField,
        strata: &[HalfmoveRange],
    ) -> Option<Self> {
        let first = records.first()?;
        let percentages = strata
            .iter()
            .map(|range| {
                let (counts, _) = count_in_range(records, *range);
                (counts.n > 0).then(|| (counts.percentage(field) * 10.0).round() / 10.0)
            })
            .collect();

        Some(Self {
            provider: first.model_info.provider.clone(),
            model: first.model_info.model.clone(),
            percentages,
        })
    }
}

/// Build rows for every non-empty log, sorted best first (stratum by stratum).
pub fn results_table(
    logs: &[Vec<ExperimentRecord>],
    field: VerdictField,
    strata: &[HalfmoveRange],
) -> Vec<ResultRow> {
    let mut rows: Vec<ResultRow> = logs
        .iter()
        .filter_map(|records| ResultRow::from_records(records, field, strata))
        .collect();
    rows.sort_by(|a, b| compare_desc(&b.percentages, &a.percentages));
    rows
}

/// Order percentage vectors lexicographically, empty strata lowest.
fn compare_desc(a: &[Option<f64>], b: &[Option<f64>]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (x, y) {
            (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn stratum_headers(strata: &[HalfmoveRange]) -> Vec<String> {
    strata.iter().map(|r| format!("{r} moves")).collect()
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}

pub fn to_markdown(rows: &[ResultRow], strata: &[HalfmoveRange]) -> String {
    let mut headers = vec!["provider".to_string(), "model".to_string()];
    headers.extend(stratum_headers(strata));

    let mut out = format!("| {} |\n", headers.join(" | "));
    out.push_str(&format!("|{}\n", ":---|".repeat(2) + &"---:|".repeat(strata.len())));
    for row in rows {
        let mut cells = vec![row.provider.clone(), row.model.clone()];
        cells.extend(row.percentages.iter().map(|p| cell(*p)));
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

pub fn to_csv(rows: &[ResultRow], strata: &[HalfmoveRange]) -> String {
    let mut headers = vec!["provider".to_string(), "model".to_string()];
    headers.extend(stratum_headers(strata));

    let mut out = headers.join(",");
    out.push('\n');
    for row in rows {
        let mut cells = vec![row.provider.clone(), row.model.clone()];
        cells.extend(row.percentages.iter().map(|p| cell(*p)));
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}
