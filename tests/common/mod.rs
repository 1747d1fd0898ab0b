#![allow(dead_code)]

use career_ml::core::model::{CareerModel, ForestParams};
use career_ml::TomlConfig;
use std::path::Path;

pub const DATASET: &str = "\
education,skills,interests,career_label
BSc Computer Science,python sql machine learning,data analysis,Data Scientist
MSc Statistics,python statistics modeling,research data,Data Scientist
BA Design,figma sketching typography,visual arts,UX Designer
BFA Graphic Design,illustrator figma prototyping,user research,UX Designer
";

/// Nothing listens on port 1, so fetching fails fast with a connection error.
pub const UNREACHABLE_EXPORT: &str = "http://127.0.0.1:1/api/evaluation/export";

pub fn config_for(model_dir: &Path, endpoint: &str, merge: bool) -> TomlConfig {
    TomlConfig::from_toml_str(&format!(
        "[artifacts]\nmodel_dir = {:?}\n\n[export]\nendpoint = {:?}\ntimeout_seconds = 1\nmerge = {}\n",
        model_dir.to_str().unwrap(),
        endpoint,
        merge
    ))
    .unwrap()
}

pub fn write_dataset(model_dir: &Path) {
    std::fs::write(model_dir.join("dataset.csv"), DATASET).unwrap();
}

/// Small forest over two labels; enough to serve predictions in tests.
pub fn tiny_model_bytes(labels: [&str; 2]) -> Vec<u8> {
    let documents = vec![
        "bsc python sql data".to_string(),
        "msc python statistics".to_string(),
        "ba figma typography".to_string(),
        "bfa illustrator figma".to_string(),
    ];
    let targets = vec![
        labels[0].to_string(),
        labels[0].to_string(),
        labels[1].to_string(),
        labels[1].to_string(),
    ];
    let params = ForestParams {
        n_estimators: 5,
        ..ForestParams::default()
    };
    CareerModel::fit(&documents, &targets, params)
        .unwrap()
        .to_bytes()
        .unwrap()
}

pub fn artifact_files(model_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(model_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("career_model_") && n.ends_with(".pkl"))
        .collect();
    names.sort();
    names
}
