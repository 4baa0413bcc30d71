//! Helpers shared by the PostgreSQL repositories.

use localhub_core::error::DomainError;
use localhub_shared::types::{Page, Pagination};
use tracing::{error, warn};

/// Maps a sqlx error to a domain error. Unique violations become
/// `Conflict`; everything else is logged and reported as a database error.
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                warn!(context, constraint = db.constraint().unwrap_or("unknown"), "Unique constraint violated");
                return DomainError::Conflict(conflict_message(db.constraint()).to_string());
            }
        }
        error!("Database error {}: {}", context, e);
        DomainError::DatabaseError(e.to_string())
    }
}

fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("uq_users_email") => "Email is already registered",
        Some("uq_tenants_slug") => "Tenant slug is already taken",
        Some("uq_workspaces_slug") => "Workspace slug is already taken in this tenant",
        Some("uq_workspace_members") => "User is already a member of this workspace",
        Some("uq_regions_slug") => "Region slug is already taken under this parent",
        Some("uq_businesses_slug") => "Business slug is already taken",
        Some("uq_posts_slug") => "Post slug is already taken",
        Some("uq_coupons_code") => "Coupon code is already used by this business",
        Some("uq_coupon_claims") => "Coupon already claimed",
        Some("uq_customers_email") => "A customer with this email already exists",
        Some("uq_stores_slug") => "Store slug is already taken",
        Some("uq_products_slug") => "Product slug is already taken in this store",
        Some("uq_organizations_slug") => "Organization slug is already taken",
        Some("uq_rollouts_feature_key") => "Feature key is already used by another rollout",
        _ => "Record already exists",
    }
}

/// Turns a guarded write that matched no row into a `Conflict`.
pub(crate) fn require_affected(rows_affected: u64, conflict: &str) -> Result<(), DomainError> {
    if rows_affected == 0 {
        warn!(conflict, "Guarded write matched no row");
        return Err(DomainError::Conflict(conflict.to_string()));
    }
    Ok(())
}

/// Parses a text column into one of the domain's string enums.
pub(crate) fn decode<T>(column: &'static str, value: &str, parse: fn(&str) -> Option<T>) -> Result<T, DomainError> {
    parse(value).ok_or_else(|| {
        error!(column, value, "Unknown enum value in database");
        DomainError::DatabaseError(format!("unknown {} value '{}'", column, value))
    })
}

/// Converts fetched rows and a total into a page.
pub(crate) fn into_page<R, T>(rows: Vec<R>, pagination: Pagination, total: i64) -> Result<Page<T>, DomainError>
where
    T: TryFrom<R, Error = DomainError>,
{
    let items = rows.into_iter().map(T::try_from).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(items, pagination, total.max(0) as u64))
}

/// `ILIKE` pattern for an optional free-text search.
pub(crate) fn like_pattern(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use localhub_core::domain::PostStatus;

    #[test]
    fn test_require_affected() {
        assert!(require_affected(1, "gone").is_ok());
        match require_affected(0, "Tickets were sold while deleting the plan") {
            Err(DomainError::Conflict(message)) => assert!(message.contains("sold")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(&Some(" 50% off ".into())).as_deref(), Some("%50\\% off%"));
        assert_eq!(like_pattern(&Some("   ".into())), None);
        assert_eq!(like_pattern(&None), None);
    }

    #[test]
    fn test_decode_unknown_value() {
        assert_eq!(decode("status", "published", PostStatus::from_str).unwrap(), PostStatus::Published);
        assert!(matches!(
            decode("status", "bogus", PostStatus::from_str),
            Err(DomainError::DatabaseError(_))
        ));
    }

    #[test]
    fn test_conflict_messages() {
        assert_eq!(conflict_message(Some("uq_coupon_claims")), "Coupon already claimed");
        assert_eq!(conflict_message(None), "Record already exists");
    }
}
