use rand::Rng;

use super::ChartData;

pub(super) fn random_values(count: usize, low: i64, high: i64) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(low..high) as f64).collect()
}

pub(super) fn bar_data() -> ChartData {
    let categories: Vec<String> = ["A", "B", "C", "D", "E"]
        .iter()
        .map(|g| format!("Group {}", g))
        .collect();
    ChartData {
        values: random_values(categories.len(), 10, 100),
        categories,
    }
}

pub(super) fn custom_data() -> ChartData {
    ChartData {
        categories: (1..=5).map(|i| format!("Sample {}", i)).collect(),
        values: random_values(5, 20, 100),
    }
}
