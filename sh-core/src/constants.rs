//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "ServiceHub";

/// Directory name used under the platform data/config dirs.
pub const APP_DIR_NAME: &str = "ServiceHub";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// REST path prefix of the hosted backend.
pub const REST_PREFIX: &str = "/rest/v1";

/// Default backend API timeout in milliseconds.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 30_000;

/// Snapshot database schema version.
pub const SNAPSHOT_SCHEMA_VERSION: i32 = 1;

/// Maximum toasts kept by the notification center.
pub const MAX_TOASTS: usize = 50;

/// Remote table names.
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const PROVIDER_PROFILES: &str = "provider_profiles";
    pub const SERVICES: &str = "services";
    pub const CONVERSATIONS: &str = "conversations";
    pub const MESSAGES: &str = "messages";
    pub const BOOKINGS: &str = "bookings";
    pub const INVOICES: &str = "invoices";
    pub const WITHDRAWALS: &str = "withdrawals";
    pub const COUNTRIES: &str = "countries";
    pub const CITIES: &str = "cities";

    /// All tables in foreign-key order (parents before children).
    pub const ALL: &[&str] = &[
        COUNTRIES,
        CITIES,
        PROFILES,
        PROVIDER_PROFILES,
        SERVICES,
        CONVERSATIONS,
        MESSAGES,
        BOOKINGS,
        INVOICES,
        WITHDRAWALS,
    ];

    /// Whether `name` is a known remote table.
    pub fn is_known(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// Remote stored procedures.
pub mod rpc {
    /// Cities within a radius of a city: `(p_city_id, p_radius_km)`.
    pub const CITIES_WITHIN_RADIUS: &str = "cities_within_radius";
    /// Providers within a radius of a city: `(p_city_id, p_radius_km)`.
    pub const PROVIDERS_WITHIN_RADIUS: &str = "providers_within_radius";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_parents_first() {
        let pos = |t: &str| tables::ALL.iter().position(|x| *x == t).unwrap();
        assert!(pos(tables::PROFILES) < pos(tables::PROVIDER_PROFILES));
        assert!(pos(tables::CONVERSATIONS) < pos(tables::MESSAGES));
        assert!(pos(tables::BOOKINGS) < pos(tables::INVOICES));
        assert!(pos(tables::CITIES) < pos(tables::PROFILES));
    }

    #[test]
    fn test_is_known() {
        assert!(tables::is_known("bookings"));
        assert!(!tables::is_known("chats"));
    }
}
