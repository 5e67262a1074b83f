//! Script submission workflow.
//!
//! A signed-in, non-admin user describes a strategy; the workflow validates
//! the form and creates exactly one `pending` script document. Ownership
//! fields are copied from the identity at submission time and the creation
//! timestamp is assigned by the store. There is no uniqueness constraint
//! and no rate limiting: a user may submit as many strategies as they like.

use crate::error::{AppError, Result};
use crate::models::{Identity, Script};
use crate::storage::{NewScript, Storage};
use tracing::info;

/// Form contents as the user typed them.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    pub title: String,
    pub description: String,
    pub indicators_csv: String,
    /// Optional inline data-URL screenshot.
    pub screenshot: Option<String>,
}

/// Split an indicators CSV on commas, trimming each segment. Empty segments
/// are kept as typed and nothing is deduplicated.
pub fn parse_indicators(csv: &str) -> Vec<String> {
    csv.split(',').map(|s| s.trim().to_string()).collect()
}

/// Submit a strategy. Validation failures never reach the store; an absent
/// identity is refused before anything else.
pub fn submit(storage: &Storage, identity: Option<&Identity>, form: SubmissionForm) -> Result<Script> {
    let identity = identity.ok_or(AppError::Unauthenticated)?;
    if form.title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if form.description.is_empty() {
        return Err(AppError::Validation("description is required".to_string()));
    }
    if form.indicators_csv.is_empty() {
        return Err(AppError::Validation(
            "indicators used are required".to_string(),
        ));
    }

    let script = storage.create_script(NewScript {
        title: form.title,
        description: form.description,
        indicators: parse_indicators(&form.indicators_csv),
        user_id: identity.id.clone(),
        user_email: Some(identity.email.clone()),
        screenshot: form.screenshot,
    })?;
    info!(script = %script.id, user = %identity.id, "strategy submitted");
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScriptStatus;
    use std::fs;

    fn temp_storage(name: &str) -> (Storage, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        let storage = Storage::open(dir.to_str().unwrap()).expect("open storage");
        (storage, dir)
    }

    fn trader() -> Identity {
        Identity {
            id: "uid-1".to_string(),
            email: "trader@example.com".to_string(),
        }
    }

    fn form(title: &str, description: &str, indicators: &str) -> SubmissionForm {
        SubmissionForm {
            title: title.to_string(),
            description: description.to_string(),
            indicators_csv: indicators.to_string(),
            screenshot: None,
        }
    }

    #[test]
    fn test_indicator_parsing_trims_and_keeps_order() {
        assert_eq!(
            parse_indicators("RSI, MACD ,  Bollinger Bands"),
            vec!["RSI", "MACD", "Bollinger Bands"]
        );
        // Empty segments are retained, nothing is deduplicated.
        assert_eq!(parse_indicators("RSI,,RSI"), vec!["RSI", "", "RSI"]);
    }

    #[test]
    fn test_unauthenticated_submission_creates_nothing() {
        let (storage, dir) = temp_storage("tradeflow_test_submit_anon");

        let err = submit(&storage, None, form("Breakout", "desc", "RSI")).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        assert!(storage.list_scripts().unwrap().is_empty());
        assert_eq!(storage.admin_config().unwrap().scripts_count, 0);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_empty_fields_never_reach_the_store() {
        let (storage, dir) = temp_storage("tradeflow_test_submit_empty");
        let identity = trader();

        for bad in [
            form("", "desc", "RSI"),
            form("Breakout", "", "RSI"),
            form("Breakout", "desc", ""),
        ] {
            let err = submit(&storage, Some(&identity), bad).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(storage.list_scripts().unwrap().is_empty());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_successful_submission_is_pending_and_owned() {
        let (storage, dir) = temp_storage("tradeflow_test_submit_ok");
        let identity = trader();

        let script = submit(
            &storage,
            Some(&identity),
            SubmissionForm {
                title: "Breakout".to_string(),
                description: "Detects key level breaks".to_string(),
                indicators_csv: "RSI, MACD".to_string(),
                screenshot: Some("data:image/png;base64,AAAA".to_string()),
            },
        )
        .expect("submit");

        assert_eq!(script.status, ScriptStatus::Pending);
        assert_eq!(script.user_id, identity.id);
        assert_eq!(script.user_email.as_deref(), Some("trader@example.com"));
        assert_eq!(script.indicators, vec!["RSI", "MACD"]);
        assert!(script.pine_script.is_none());
        assert!(script.created_at.is_some());
        assert_eq!(storage.admin_config().unwrap().scripts_count, 1);

        // No uniqueness constraint: the same form can be submitted again.
        let again = submit(
            &storage,
            Some(&identity),
            form("Breakout", "Detects key level breaks", "RSI, MACD"),
        )
        .expect("resubmit");
        assert_ne!(again.id, script.id);
        assert_eq!(storage.list_scripts().unwrap().len(), 2);

        let _ = fs::remove_dir_all(dir);
    }
}
