use std::collections::BTreeMap;

use framebench_core::{round2, Metric, MetricSet};

const COLUMN_WIDTH: usize = 12;
/// Best and second-best value of a column.
const RANK_COLORS: [&str; 2] = ["\x1b[92m", "\x1b[93m"];
const RESET: &str = "\x1b[0m";

/// Renders runs as a table, highlighting the two best values of each column.
pub struct Presenter {
    color: bool,
}

impl Presenter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn print(&self, runs: &BTreeMap<String, MetricSet>) {
        println!("{}", self.render(runs));
    }

    pub fn render(&self, runs: &BTreeMap<String, MetricSet>) -> String {
        let metrics = Metric::all();
        let run_width = runs
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0)
            .max(3)
            + 2;

        let mut out = format!("{:<run_width$}", "Run");
        for metric in &metrics {
            out.push_str(&format!("{:<COLUMN_WIDTH$}", metric.label()));
        }
        out.push('\n');

        let ranks: Vec<Vec<f64>> = metrics.iter().map(|m| top_values(*m, runs)).collect();

        for (run, set) in runs {
            out.push_str(&format!("{:<run_width$}", run));
            for (metric, top) in metrics.iter().zip(&ranks) {
                let value = round2(set.get(*metric));
                let cell = format!("{:<COLUMN_WIDTH$}", format!("{:.2}", value));

                let rank = top.iter().position(|v| *v == value);
                match rank {
                    Some(i) if self.color => {
                        out.push_str(RANK_COLORS[i]);
                        out.push_str(&cell);
                        out.push_str(RESET);
                    }
                    _ => out.push_str(&cell),
                }
            }
            out.push('\n');
        }

        out
    }
}

/// Distinct rounded values of `metric`, best first, at most one per rank colour.
fn top_values(metric: Metric, runs: &BTreeMap<String, MetricSet>) -> Vec<f64> {
    let mut values: Vec<f64> = runs.values().map(|m| round2(m.get(metric))).collect();
    if metric.higher_is_better() {
        values.sort_by(|a, b| b.total_cmp(a));
    } else {
        values.sort_by(|a, b| a.total_cmp(b));
    }
    values.dedup();
    values.truncate(RANK_COLORS.len());
    values
}
