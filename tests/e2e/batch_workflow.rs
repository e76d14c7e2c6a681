//! CSV batch ingestion end to end.

use super::fixture::E2EFixture;

const RESUMES_CSV: &str = "\
ID,Resume_str,Category
10,\"Alan Turing
alan@example.com
Machine learning researcher with Python and TensorFlow. 8 years of experience.\",INFORMATION-TECHNOLOGY
11,\"HR generalist, recruiting and payroll. Experience: 4 years\",HR
12,\"\",HR
13,\"Java and Kubernetes platform engineer, alan@example.com\",ENGINEERING
";

#[test]
fn batch_skips_bad_rows_and_embeds_the_rest() {
    let mut fixture = E2EFixture::new("batch_skips_bad_rows_and_embeds_the_rest");

    fixture.log_step("init");
    fixture.run_robot(&["init"]);

    fixture.log_step("batch ingest");
    let csv = fixture.write_input("resumes.csv", RESUMES_CSV);
    let json = fixture.run_robot_with_path(&["batch"], &csv);
    assert_eq!(json["data"]["total"], 4);
    assert_eq!(json["data"]["processed"], 2);
    assert_eq!(json["data"]["skipped"], 2);
    // row 3 is empty, row 4 reuses row 1's email
    let rows: Vec<i64> = json["data"]["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["row"].as_i64().unwrap())
        .collect();
    assert_eq!(rows, vec![3, 4]);
    assert_eq!(json["data"]["precompute"]["count"], 2);
    assert_eq!(fixture.count("candidates"), 2);

    fixture.log_step("stats");
    let stats = fixture.run_robot(&["stats"]);
    assert_eq!(stats["data"]["embeddings"]["count"], 2);
    assert_eq!(stats["data"]["unembedded"], 0);
    assert_eq!(stats["data"]["database"]["categories"].as_array().unwrap().len(), 2);

    fixture.log_step("show named and unnamed candidates");
    let search = fixture.run_robot(&["search"]);
    let names: Vec<&str> = search["data"]["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Alan Turing"));
    assert!(names.contains(&"Candidate_11"));
}

#[test]
fn batch_no_precompute_leaves_store_empty() {
    let mut fixture = E2EFixture::new("batch_no_precompute_leaves_store_empty");
    fixture.run_robot(&["init"]);

    fixture.log_step("batch ingest without precompute");
    let csv = fixture.write_input("resumes.csv", RESUMES_CSV);
    let json = fixture.run_robot_with_path(&["batch", "--no-precompute"], &csv);
    assert!(json["data"]["precompute"].is_null());

    fixture.log_step("stats shows unembedded candidates");
    let stats = fixture.run_robot(&["stats"]);
    assert_eq!(stats["data"]["embeddings"]["exists"], false);
    assert_eq!(stats["data"]["unembedded"], 2);
}

#[test]
fn batch_with_custom_resume_column() {
    let mut fixture = E2EFixture::new("batch_with_custom_resume_column");
    fixture.run_robot(&["init"]);

    fixture.log_step("missing default column fails up front");
    let csv = fixture.write_input("custom.csv", "text,label\n\"Rust and Go developer\",IT\n");
    let output = fixture
        .command()
        .arg("--robot")
        .arg("batch")
        .arg(&csv)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert_eq!(fixture.count("candidates"), 0);

    fixture.log_step("explicit column names");
    let json = fixture.run_robot_with_path(
        &[
            "batch",
            "--resume-column",
            "text",
            "--category-column",
            "label",
        ],
        &csv,
    );
    assert_eq!(json["data"]["processed"], 1);
    assert_eq!(fixture.count("candidates"), 1);
}
