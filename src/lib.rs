//! Type-safe lambda-style query building for Postgres.
//!
//! Queries are described against entity accessor methods instead of
//! column-name strings, so the compiler catches a renamed field before
//! the database ever sees the query. A [`QueryWrapper`] accumulates
//! conditions through a fluent API with conditional-append semantics
//! (null scalars and empty sequences are silently skipped), and
//! [`LambdaQueryExecutor`] translates the accumulated conditions into
//! SQL via `sea-query` and runs them on a `sqlx` pool.
//!
//! # Examples
//!
//! ```
//! use smart_query::{Entity, QueryWrapper, field};
//!
//! #[derive(Clone)]
//! struct User {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl Entity for User {
//!     fn table_name() -> &'static str {
//!         "users"
//!     }
//! }
//!
//! impl User {
//!     fn get_name(&self) -> &str {
//!         &self.name
//!     }
//!     fn get_age(&self) -> i64 {
//!         self.age
//!     }
//! }
//!
//! let wrapper = QueryWrapper::<User>::of()
//!     .eq(field!(User::get_name), "张三")
//!     .gt(field!(User::get_age), 18)
//!     .order_by_desc(field!(User::get_age));
//!
//! assert_eq!(wrapper.len(), 3);
//! ```

pub mod condition;
pub mod entity;
pub mod error;
pub mod executor;
pub mod field;
pub mod join;
pub mod monitor;
pub mod operator;
pub mod wrapper;

pub use condition::{Payload, QueryCondition, QueryValue};
pub use entity::Entity;
pub use error::{QueryError, Result};
pub use executor::{LambdaQueryExecutor, build_count, build_page, build_select};
pub use field::FieldRef;
pub use join::{JoinCondition, JoinType};
pub use monitor::{QueryPerformanceMonitor, QueryStatsSnapshot};
pub use operator::{Clause, QueryOperator};
pub use wrapper::QueryWrapper;

/// Commonly used items, for glob import.
pub mod prelude {
	pub use crate::condition::{Payload, QueryCondition, QueryValue};
	pub use crate::entity::Entity;
	pub use crate::error::{QueryError, Result};
	pub use crate::executor::{LambdaQueryExecutor, build_count, build_page, build_select};
	pub use crate::field;
	pub use crate::field::FieldRef;
	pub use crate::join::{JoinCondition, JoinType};
	pub use crate::monitor::QueryPerformanceMonitor;
	pub use crate::operator::QueryOperator;
	pub use crate::wrapper::QueryWrapper;
}
