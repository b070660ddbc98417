/// Database connection and pool configuration tests
pub mod db_tests;

/// CRUD operations against the portal entities
pub mod crud_tests;
