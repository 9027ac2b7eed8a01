//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations in application order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_study_definitions",
            sql: include_str!("../../migrations/001_study_definitions.sql"),
        },
        Migration {
            id: "002_study_designs",
            sql: include_str!("../../migrations/002_study_designs.sql"),
        },
        Migration {
            id: "003_soa_snapshots",
            sql: include_str!("../../migrations/003_soa_snapshots.sql"),
        },
        Migration {
            id: "004_soa_row_visibility",
            sql: include_str!("../../migrations/004_soa_row_visibility.sql"),
        },
    ]
}
