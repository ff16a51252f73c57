//! Synthetic data shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Rows whose `age` cell is left empty.
pub const MISSING_AGE_ROWS: [usize; 5] = [3, 23, 43, 63, 83];

pub fn age_at(row: usize) -> f64 {
    10.0 + row as f64 * 80.0 / 99.0
}

/// 100 rows: numeric `age` (10..90, 5 missing), categorical `gender` (M/F)
/// and `stroke` with 80 zeros and 20 ones (the 20 oldest rows).
pub fn synthetic_stroke_csv() -> String {
    let mut out = String::from("age,gender,stroke\n");
    for row in 0..100 {
        let age = if MISSING_AGE_ROWS.contains(&row) {
            String::new()
        } else {
            format!("{}", age_at(row))
        };
        let gender = if row % 2 == 0 { "M" } else { "F" };
        let stroke = if row >= 80 { 1 } else { 0 };
        out.push_str(&format!("{},{},{}\n", age, gender, stroke));
    }
    out
}

const WORK_TYPES: [&str; 5] = ["Private", "Self-employed", "Govt_job", "children", "Never_worked"];
const SMOKING: [&str; 4] = ["never smoked", "formerly smoked", "smokes", "Unknown"];

/// 200 rows laid out like the public stroke table: five categorical
/// columns (one `gender` row is `Other`), `bmi` with `N/A` gaps and a
/// noisy label driven mostly by age, glucose and hypertension (62 positives).
pub fn health_records_csv() -> String {
    let mut out = String::from(
        "gender,age,hypertension,heart_disease,ever_married,work_type,\
         Residence_type,avg_glucose_level,bmi,smoking_status,stroke\n",
    );
    for r in 0..200usize {
        let age = 18 + (r * 37 + 11) % 65;
        let glucose = 60 + (r * 53 + 7) % 150;
        let bmi = if r % 17 == 4 {
            "N/A".to_string()
        } else {
            (18 + (r * 29 + 5) % 20).to_string()
        };
        let hypertension = usize::from((r * 13) % 7 == 0);
        let heart_disease = usize::from((r * 11) % 9 == 0);
        let gender = match r {
            57 => "Other",
            _ if r % 2 == 0 => "Male",
            _ => "Female",
        };
        let married = if age > 30 && r % 5 != 0 { "Yes" } else { "No" };
        let work = WORK_TYPES[(r * 3 + r / 7) % 5];
        let residence = if (r * 5) % 3 != 0 { "Urban" } else { "Rural" };
        let smoking = SMOKING[(r * 7 + r / 5) % 4];

        let noise = (((r * 71 + 3) % 41) as f64 - 20.0) / 10.0;
        let score = 0.06 * (age as f64 - 50.0)
            + 0.015 * (glucose as f64 - 130.0)
            + 0.8 * hypertension as f64
            + 0.5 * heart_disease as f64
            + noise;
        let stroke = u8::from(score > 1.0);

        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            gender,
            age,
            hypertension,
            heart_disease,
            married,
            work,
            residence,
            glucose,
            bmi,
            smoking,
            stroke
        ));
    }
    out
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
