//! Join descriptors recorded by the wrapper and attached by the executor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The supported join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
	Inner,
	Left,
	Right,
	Full,
}

/// An immutable record of one table join: kind, target table, alias and
/// the ON expression.
///
/// The wrapper only records joins; the executor attaches them to the
/// root selection when building the criteria tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinCondition {
	join_type: JoinType,
	target_table: String,
	alias: String,
	on: String,
}

impl JoinCondition {
	/// Create a join record.
	pub fn new(
		join_type: JoinType,
		target_table: impl Into<String>,
		alias: impl Into<String>,
		on: impl Into<String>,
	) -> Self {
		Self {
			join_type,
			target_table: target_table.into(),
			alias: alias.into(),
			on: on.into(),
		}
	}

	/// `INNER JOIN target alias ON condition`
	pub fn inner(
		target_table: impl Into<String>,
		alias: impl Into<String>,
		on: impl Into<String>,
	) -> Self {
		Self::new(JoinType::Inner, target_table, alias, on)
	}

	/// `LEFT JOIN target alias ON condition`
	pub fn left(
		target_table: impl Into<String>,
		alias: impl Into<String>,
		on: impl Into<String>,
	) -> Self {
		Self::new(JoinType::Left, target_table, alias, on)
	}

	/// `RIGHT JOIN target alias ON condition`
	pub fn right(
		target_table: impl Into<String>,
		alias: impl Into<String>,
		on: impl Into<String>,
	) -> Self {
		Self::new(JoinType::Right, target_table, alias, on)
	}

	/// `FULL JOIN target alias ON condition`
	pub fn full(
		target_table: impl Into<String>,
		alias: impl Into<String>,
		on: impl Into<String>,
	) -> Self {
		Self::new(JoinType::Full, target_table, alias, on)
	}

	pub const fn join_type(&self) -> JoinType {
		self.join_type
	}

	pub fn target_table(&self) -> &str {
		&self.target_table
	}

	pub fn alias(&self) -> &str {
		&self.alias
	}

	/// The ON condition as a SQL expression string, e.g.
	/// `"users.id = orders.user_id"`.
	pub fn on_condition(&self) -> &str {
		&self.on
	}
}

impl fmt::Display for JoinCondition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"JoinCondition{{type={:?}, target={}, alias='{}', condition='{}'}}",
			self.join_type, self.target_table, self.alias, self.on
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn factories_record_their_kind() {
		assert_eq!(
			JoinCondition::inner("orders", "o", "users.id = o.user_id").join_type(),
			JoinType::Inner
		);
		assert_eq!(
			JoinCondition::left("orders", "o", "users.id = o.user_id").join_type(),
			JoinType::Left
		);
		assert_eq!(
			JoinCondition::right("orders", "o", "users.id = o.user_id").join_type(),
			JoinType::Right
		);
		assert_eq!(
			JoinCondition::full("orders", "o", "users.id = o.user_id").join_type(),
			JoinType::Full
		);
	}

	#[test]
	fn joins_are_value_like() {
		let a = JoinCondition::inner("orders", "o", "users.id = o.user_id");
		let b = JoinCondition::inner("orders", "o", "users.id = o.user_id");
		let c = JoinCondition::inner("orders", "o2", "users.id = o2.user_id");

		assert_eq!(a, b);
		assert_ne!(a, c);
	}
}
