//! Column metadata used by the service layer's schema-drift fallbacks.

use sea_orm::Value;

/// An entity whose table may lag behind the current column set.
///
/// `OPTIONAL_COLUMNS` are the columns a write can skip and apply later; every
/// other column belongs to the core set that every deployed schema carries.
pub trait SchemaTolerant: Clone {
    const TABLE: &'static str;
    const OPTIONAL_COLUMNS: &'static [&'static str];

    /// Reset `column` to what the table default would have stored.
    fn clear_column(&mut self, column: &str);

    /// Copy the value of `column` from `source`.
    fn copy_column(&mut self, source: &Self, column: &str);

    /// Value a read selects in place of `column` when the table lacks it.
    fn column_default(column: &str) -> Option<Value>;
}
