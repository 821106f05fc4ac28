use reach_core::{Category, CoreError};
use reach_payout::{validate_payout, PayoutFields, PayoutTerms, PayoutType};
use tracing::error;

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

/// Turn a driver failure into the core taxonomy; the cause is logged, not returned
pub(crate) fn map_db_error(action: &str, err: sqlx::Error) -> CoreError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return CoreError::Conflict(format!("Duplicate record: {}", action));
        }
        if db.is_foreign_key_violation() {
            return CoreError::NotFound("Referenced record".to_string());
        }
    }
    error!("Database error during {}: {}", action, err);
    CoreError::InternalError(action.to_string())
}

/// ILIKE pattern matching `needle` anywhere, with wildcards escaped
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Rebuild validated terms from stored columns.
///
/// Rows are validated on the way in, so a failure here means the table was
/// edited behind the service's back.
pub(crate) fn stored_terms(
    payout_type: &str,
    cpa_amount: Option<f64>,
    fixed_amount: Option<f64>,
) -> Result<PayoutTerms, CoreError> {
    let payout_type: PayoutType = payout_type.parse().map_err(|e: String| {
        error!("Corrupt payout row: {}", e);
        CoreError::InternalError("corrupt payout row".to_string())
    })?;

    validate_payout(PayoutFields {
        payout_type,
        cpa_amount,
        fixed_amount,
    })
    .map_err(|e| {
        error!("Corrupt payout row: {}", e);
        CoreError::InternalError("corrupt payout row".to_string())
    })
}

pub(crate) fn stored_category(raw: &str) -> Result<Category, CoreError> {
    raw.parse().map_err(|e: String| {
        error!("Corrupt category row: {}", e);
        CoreError::InternalError("corrupt category row".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("gaming"), "%gaming%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_stored_terms() {
        assert_eq!(
            stored_terms("CPA_AND_FIXED", Some(5.0), Some(100.0)).unwrap(),
            PayoutTerms::CpaAndFixed { cpa: 5.0, fixed: 100.0 }
        );
        assert!(matches!(
            stored_terms("CPA", None, None),
            Err(CoreError::InternalError(_))
        ));
        assert!(matches!(
            stored_terms("PER_CLICK", Some(1.0), None),
            Err(CoreError::InternalError(_))
        ));
    }

    #[test]
    fn test_stored_category() {
        assert_eq!(stored_category("Health").unwrap(), Category::Health);
        assert!(stored_category("health").is_err());
    }
}
