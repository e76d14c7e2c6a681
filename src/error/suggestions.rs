//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints that
//! use the error's JSON context.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
///
/// Falls back to [`ErrorCode::suggestion`] when the context carries nothing
/// useful.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::CandidateNotFound => suggest_candidate_not_found(context),
        ErrorCode::WeightsInvalid => suggest_weights_invalid(context),
        ErrorCode::DimensionMismatch => suggest_dimension_mismatch(context),
        ErrorCode::ModelMismatch => suggest_model_mismatch(context),
        ErrorCode::ConfigMissingRequired => suggest_config_missing_required(context),
        _ => code.suggestion().to_string(),
    }
}

fn suggest_candidate_not_found(context: Option<&Value>) -> String {
    let Some(id) = context
        .and_then(|c| c.get("candidate_id"))
        .and_then(Value::as_i64)
    else {
        return ErrorCode::CandidateNotFound.suggestion().to_string();
    };

    format!(
        "Candidate {id} not found. Try:\n  - `cvm search` to list stored candidates\n  - `cvm stats` to check the database is the one you expect"
    )
}

fn suggest_weights_invalid(context: Option<&Value>) -> String {
    let semantic = context
        .and_then(|c| c.get("semantic_weight"))
        .and_then(Value::as_f64);
    let keyword = context
        .and_then(|c| c.get("keyword_weight"))
        .and_then(Value::as_f64);

    match (semantic, keyword) {
        (Some(semantic), Some(keyword)) if semantic.is_finite() => format!(
            "Weights {semantic:.2} + {keyword:.2} = {:.2}. Pass --semantic-weight {semantic:.2} --keyword-weight {:.2} instead",
            semantic + keyword,
            1.0 - semantic
        ),
        _ => ErrorCode::WeightsInvalid.suggestion().to_string(),
    }
}

fn suggest_dimension_mismatch(context: Option<&Value>) -> String {
    let expected = context
        .and_then(|c| c.get("expected"))
        .and_then(Value::as_u64);
    let actual = context.and_then(|c| c.get("actual")).and_then(Value::as_u64);

    match (expected, actual) {
        (Some(expected), Some(actual)) => format!(
            "Expected {expected}-dimensional vectors but found {actual}. Check search.embedding_dims and run `cvm precompute`"
        ),
        _ => ErrorCode::DimensionMismatch.suggestion().to_string(),
    }
}

fn suggest_model_mismatch(context: Option<&Value>) -> String {
    let expected = context
        .and_then(|c| c.get("expected"))
        .and_then(Value::as_str);
    let actual = context.and_then(|c| c.get("actual")).and_then(Value::as_str);

    match (expected, actual) {
        (Some(expected), Some(actual)) => format!(
            "Stored embeddings come from '{actual}' but the active model is '{expected}'. Run `cvm precompute` to rebuild them"
        ),
        _ => ErrorCode::ModelMismatch.suggestion().to_string(),
    }
}

fn suggest_config_missing_required(context: Option<&Value>) -> String {
    context
        .and_then(|c| c.get("config_key"))
        .and_then(Value::as_str)
        .map_or_else(
            || ErrorCode::ConfigMissingRequired.suggestion().to_string(),
            |key| format!("Set '{key}' in config.toml or export the matching CVM_* variable"),
        )
}
