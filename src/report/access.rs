use crate::config::HttpSettings;

/// Caller role, decoupled from any user-object shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Visitor,
    Paid,
    Admin,
}

/// Paid subscribers and admins can read market reports.
pub fn can_view_reports(role: Role) -> bool {
    matches!(role, Role::Paid | Role::Admin)
}

/// Only admins can trigger recomputation or ingest listings.
pub fn can_manage_market_data(role: Role) -> bool {
    matches!(role, Role::Admin)
}

impl Role {
    /// Resolve the role of an API key against the configured key lists.
    /// Absent or unknown keys are visitors.
    pub fn from_api_key(settings: &HttpSettings, key: Option<&str>) -> Role {
        let key = match key {
            Some(k) if !k.is_empty() => k,
            _ => return Role::Visitor,
        };

        if settings.admin_api_keys.iter().any(|k| k == key) {
            Role::Admin
        } else if settings.paid_api_keys.iter().any(|k| k == key) {
            Role::Paid
        } else {
            Role::Visitor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> HttpSettings {
        HttpSettings {
            admin_api_keys: vec!["admin-key".to_string()],
            paid_api_keys: vec!["paid-key".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn capability_matrix() {
        assert!(!can_view_reports(Role::Visitor));
        assert!(can_view_reports(Role::Paid));
        assert!(can_view_reports(Role::Admin));

        assert!(!can_manage_market_data(Role::Visitor));
        assert!(!can_manage_market_data(Role::Paid));
        assert!(can_manage_market_data(Role::Admin));
    }

    #[test]
    fn role_resolution_from_key() {
        let s = settings();
        assert_eq!(Role::from_api_key(&s, Some("admin-key")), Role::Admin);
        assert_eq!(Role::from_api_key(&s, Some("paid-key")), Role::Paid);
        assert_eq!(Role::from_api_key(&s, Some("wrong")), Role::Visitor);
        assert_eq!(Role::from_api_key(&s, Some("")), Role::Visitor);
        assert_eq!(Role::from_api_key(&s, None), Role::Visitor);
    }
}
