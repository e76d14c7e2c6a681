//! Ingest, precompute and match end to end.

use super::fixture::E2EFixture;

const CANDIDATES: &[&str] = &[
    "Ada Lovelace\nada@example.com\nSenior Python developer. 6 years of experience with AWS, Docker and SQL.",
    "Grace Hopper\ngrace@example.com\nCOBOL compiler engineer and mainframe specialist.",
    "Linus Torvalds\nlinus@example.com\nC and Linux kernel maintainer, git author.",
];

fn seed(fixture: &mut E2EFixture) {
    fixture.log_step("init and ingest candidates");
    fixture.run_robot(&["init"]);
    for resume in CANDIDATES {
        fixture.run_robot(&["ingest", resume, "--category", "IT"]);
    }
    assert_eq!(fixture.count("candidates"), 3);
}

#[test]
fn hybrid_match_ranks_relevant_candidate_first() {
    let mut fixture = E2EFixture::new("hybrid_match_ranks_relevant_candidate_first");
    seed(&mut fixture);

    fixture.log_step("hybrid match");
    let json = fixture.run_robot(&["match", "Python developer with AWS and SQL"]);
    let results = json["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["name"], "Ada Lovelace");

    let combined: Vec<f64> = results
        .iter()
        .map(|r| r["combined_score"].as_f64().unwrap())
        .collect();
    assert!(combined.windows(2).all(|w| w[0] >= w[1]));
    assert!(json.get("warnings").is_none());
}

#[test]
fn recorded_match_is_persisted() {
    let mut fixture = E2EFixture::new("recorded_match_is_persisted");
    seed(&mut fixture);

    fixture.log_step("match with --record");
    let json = fixture.run_robot(&[
        "match",
        "Python engineer who knows Docker",
        "--record",
        "--title",
        "Backend engineer",
        "--limit",
        "2",
    ]);
    let job_id = json["data"]["job_id"].as_i64().unwrap();

    fixture.log_step("verify audit rows");
    let db = fixture.db();
    let (title, skills): (String, Option<String>) = db
        .query_row(
            "SELECT title, required_skills FROM job_descriptions WHERE id = ?",
            [job_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(title, "Backend engineer");
    let skills = skills.unwrap();
    assert!(skills.contains("python"));
    assert!(skills.contains("docker"));
    assert_eq!(fixture.count("matching_results"), 2);
}

#[test]
fn changed_embedding_model_is_reported_not_mixed() {
    let mut fixture = E2EFixture::new("changed_embedding_model_is_reported_not_mixed");
    seed(&mut fixture);

    fixture.log_step("match with a different embedding dimension");
    let output = fixture
        .command()
        .env("CVM_EMBEDDING_DIMS", "128")
        .args(["--robot", "match", "python"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["data"]["results"].as_array().unwrap().len(), 0);
    assert_eq!(json["data"]["diagnostics"]["model_mismatch"], 3);
    assert!(
        json["warnings"][0]
            .as_str()
            .unwrap()
            .contains("cvm precompute")
    );

    fixture.log_step("precompute with the new model restores ranking");
    let pre = fixture
        .command()
        .env("CVM_EMBEDDING_DIMS", "128")
        .args(["--robot", "precompute"])
        .output()
        .unwrap();
    assert!(pre.status.success());
    let output = fixture
        .command()
        .env("CVM_EMBEDDING_DIMS", "128")
        .args(["--robot", "match", "python"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["data"]["results"].as_array().unwrap().len(), 3);
    assert_eq!(json["data"]["diagnostics"]["model_mismatch"], 0);

    fixture.log_step("ingest under the old model is rejected");
    let output = fixture
        .command()
        .args(["--robot", "ingest", "Alan Turing\nPython researcher"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn semantic_mode_omits_keyword_scores() {
    let mut fixture = E2EFixture::new("semantic_mode_omits_keyword_scores");
    seed(&mut fixture);

    let json = fixture.run_robot(&["match", "kernel maintainer", "--mode", "semantic"]);
    assert_eq!(json["data"]["mode"], "semantic");
    assert!(json["data"].get("weights").is_none());
    for result in json["data"]["results"].as_array().unwrap() {
        assert!(result["keyword_score"].is_null());
        assert_eq!(result["semantic_score"], result["combined_score"]);
    }
}

#[test]
fn query_without_terms_warns_instead_of_dropping_candidates() {
    let mut fixture = E2EFixture::new("query_without_terms_warns_instead_of_dropping_candidates");
    seed(&mut fixture);

    let json = fixture.run_robot(&["match", "C / R"]);
    let results = json["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["combined_score"] == 0.0));
    assert_eq!(json["data"]["diagnostics"]["invalid_vector"], 0);
    assert_eq!(json["data"]["diagnostics"]["query_degenerate"], true);
    assert!(
        json["warnings"][0]
            .as_str()
            .unwrap()
            .contains("no embeddable terms")
    );
}
