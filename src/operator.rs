//! The closed catalog of query operators and their clause classes.

use serde::{Deserialize, Serialize};

/// Every operator the query wrapper can record.
///
/// Each operator belongs to exactly one clause class; see
/// [`QueryOperator::clause`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryOperator {
	/// `field = value`
	Eq,
	/// `field <> value`
	Ne,
	/// `field > value`
	Gt,
	/// `field >= value`
	Ge,
	/// `field < value`
	Lt,
	/// `field <= value`
	Le,
	/// `field LIKE '%value%'`
	Like,
	/// `field LIKE '%value'`
	LeftLike,
	/// `field LIKE 'value%'`
	RightLike,
	/// `field IN (v1, v2, ...)`
	In,
	/// `field NOT IN (v1, v2, ...)`
	NotIn,
	/// `field IS NULL`
	IsNull,
	/// `field IS NOT NULL`
	IsNotNull,
	/// `field BETWEEN v1 AND v2`
	Between,
	/// `field NOT BETWEEN v1 AND v2`
	NotBetween,
	/// `ORDER BY field ASC`
	OrderByAsc,
	/// `ORDER BY field DESC`
	OrderByDesc,
	/// `GROUP BY field`
	GroupBy,
	/// `HAVING field <op> value`
	Having,
	/// Positional OR marker
	Or,
	/// Positional AND marker
	And,
	/// Parenthesized group of nested predicates
	Nest,
	/// Raw SQL fragment with positional parameters
	Apply,
}

/// The clause a condition contributes to when translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clause {
	/// Contributes to the WHERE conjunction
	WherePredicate,
	/// Contributes to ORDER BY
	Order,
	/// Contributes to GROUP BY
	Group,
	/// Contributes to HAVING
	Having,
	/// OR / AND connective markers
	Logical,
	/// NEST / APPLY structural tokens
	Structural,
}

impl QueryOperator {
	/// The clause class this operator belongs to.
	pub const fn clause(self) -> Clause {
		match self {
			Self::Eq
			| Self::Ne
			| Self::Gt
			| Self::Ge
			| Self::Lt
			| Self::Le
			| Self::Like
			| Self::LeftLike
			| Self::RightLike
			| Self::In
			| Self::NotIn
			| Self::IsNull
			| Self::IsNotNull
			| Self::Between
			| Self::NotBetween => Clause::WherePredicate,
			Self::OrderByAsc | Self::OrderByDesc => Clause::Order,
			Self::GroupBy => Clause::Group,
			Self::Having => Clause::Having,
			Self::Or | Self::And => Clause::Logical,
			Self::Nest | Self::Apply => Clause::Structural,
		}
	}

	/// Whether translating this operator contributes to the WHERE clause.
	pub const fn is_where_predicate(self) -> bool {
		matches!(self.clause(), Clause::WherePredicate)
	}

	/// Whether this operator may be used as the sub-operator of HAVING.
	pub const fn is_comparison(self) -> bool {
		matches!(
			self,
			Self::Eq | Self::Ne | Self::Gt | Self::Ge | Self::Lt | Self::Le
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_operator_has_exactly_one_clause() {
		let operators = [
			QueryOperator::Eq,
			QueryOperator::Ne,
			QueryOperator::Gt,
			QueryOperator::Ge,
			QueryOperator::Lt,
			QueryOperator::Le,
			QueryOperator::Like,
			QueryOperator::LeftLike,
			QueryOperator::RightLike,
			QueryOperator::In,
			QueryOperator::NotIn,
			QueryOperator::IsNull,
			QueryOperator::IsNotNull,
			QueryOperator::Between,
			QueryOperator::NotBetween,
			QueryOperator::OrderByAsc,
			QueryOperator::OrderByDesc,
			QueryOperator::GroupBy,
			QueryOperator::Having,
			QueryOperator::Or,
			QueryOperator::And,
			QueryOperator::Nest,
			QueryOperator::Apply,
		];

		let where_count = operators
			.iter()
			.filter(|op| op.clause() == Clause::WherePredicate)
			.count();
		assert_eq!(where_count, 15);

		assert_eq!(QueryOperator::OrderByAsc.clause(), Clause::Order);
		assert_eq!(QueryOperator::GroupBy.clause(), Clause::Group);
		assert_eq!(QueryOperator::Having.clause(), Clause::Having);
		assert_eq!(QueryOperator::Or.clause(), Clause::Logical);
		assert_eq!(QueryOperator::Nest.clause(), Clause::Structural);
	}

	#[test]
	fn comparisons_are_the_having_sub_operators() {
		assert!(QueryOperator::Gt.is_comparison());
		assert!(QueryOperator::Le.is_comparison());
		assert!(!QueryOperator::Like.is_comparison());
		assert!(!QueryOperator::In.is_comparison());
	}
}
