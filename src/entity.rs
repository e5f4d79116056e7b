//! Entity trait binding query wrappers to database tables.

/// A type that maps to a database table.
///
/// The query builder only needs the table name; row mapping is handled
/// by `sqlx::FromRow` bounds on the executor methods.
///
/// # Examples
///
/// ```
/// use smart_query::Entity;
///
/// struct User {
///     name: String,
/// }
///
/// impl Entity for User {
///     fn table_name() -> &'static str {
///         "users"
///     }
/// }
///
/// assert_eq!(User::table_name(), "users");
/// ```
pub trait Entity {
	/// Name of the table this entity is stored in
	fn table_name() -> &'static str;
}
