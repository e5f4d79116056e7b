//! Condition records: the neutral, serializable query description.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::operator::QueryOperator;

/// A scalar value carried by a query condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryValue {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Bytes(Vec<u8>),
	Timestamp(chrono::DateTime<chrono::Utc>),
	Uuid(Uuid),
}

impl QueryValue {
	/// Whether this value is the null marker.
	pub const fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}
}

// Floats compare and hash by bit pattern so conditions stay value-like
// even when a payload carries NaN.
impl PartialEq for QueryValue {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
			(Self::String(a), Self::String(b)) => a == b,
			(Self::Bytes(a), Self::Bytes(b)) => a == b,
			(Self::Timestamp(a), Self::Timestamp(b)) => a == b,
			(Self::Uuid(a), Self::Uuid(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for QueryValue {}

impl Hash for QueryValue {
	fn hash<H: Hasher>(&self, state: &mut H) {
		std::mem::discriminant(self).hash(state);
		match self {
			Self::Null => {}
			Self::Bool(b) => b.hash(state),
			Self::Int(i) => i.hash(state),
			Self::Float(f) => f.to_bits().hash(state),
			Self::String(s) => s.hash(state),
			Self::Bytes(b) => b.hash(state),
			Self::Timestamp(ts) => ts.hash(state),
			Self::Uuid(u) => u.hash(state),
		}
	}
}

/// Renders the scalar the way it is spliced into LIKE patterns.
impl fmt::Display for QueryValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => Ok(()),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Float(v) => write!(f, "{v}"),
			Self::String(s) => f.write_str(s),
			Self::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
			Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
			Self::Uuid(u) => write!(f, "{u}"),
		}
	}
}

impl From<&str> for QueryValue {
	fn from(s: &str) -> Self {
		Self::String(s.to_string())
	}
}

impl From<String> for QueryValue {
	fn from(s: String) -> Self {
		Self::String(s)
	}
}

impl From<i64> for QueryValue {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<i32> for QueryValue {
	fn from(i: i32) -> Self {
		Self::Int(i64::from(i))
	}
}

impl From<f64> for QueryValue {
	fn from(f: f64) -> Self {
		Self::Float(f)
	}
}

impl From<bool> for QueryValue {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<Vec<u8>> for QueryValue {
	fn from(b: Vec<u8>) -> Self {
		Self::Bytes(b)
	}
}

impl From<chrono::DateTime<chrono::Utc>> for QueryValue {
	fn from(ts: chrono::DateTime<chrono::Utc>) -> Self {
		Self::Timestamp(ts)
	}
}

impl From<Uuid> for QueryValue {
	fn from(u: Uuid) -> Self {
		Self::Uuid(u)
	}
}

/// `None` is the null marker, which the builder treats as "omit this
/// condition" for scalar predicates.
impl<V> From<Option<V>> for QueryValue
where
	V: Into<QueryValue>,
{
	fn from(value: Option<V>) -> Self {
		match value {
			Some(v) => v.into(),
			None => Self::Null,
		}
	}
}

/// The payload shapes a condition can carry, one per operator family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Payload {
	/// No payload (ordering, grouping, connectives)
	None,
	/// A single scalar
	Value(QueryValue),
	/// A finite sequence of scalars
	Values(Vec<QueryValue>),
	/// HAVING sub-operator and comparison value
	Having {
		op: QueryOperator,
		value: QueryValue,
	},
	/// The frozen condition sequence of a nested wrapper
	Nested(Vec<QueryCondition>),
	/// Raw SQL fragment with `?` placeholders and positional parameters
	Raw {
		fragment: String,
		params: Vec<QueryValue>,
	},
}

/// One token of a query specification: an immutable
/// {field, operator, payload} triple.
///
/// The field name is empty for connectives and structural tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryCondition {
	field: String,
	operator: QueryOperator,
	payload: Payload,
}

impl QueryCondition {
	/// Create a condition record.
	pub fn new(field: impl Into<String>, operator: QueryOperator, payload: Payload) -> Self {
		Self {
			field: field.into(),
			operator,
			payload,
		}
	}

	/// The resolved attribute name (empty for connectives/structural).
	pub fn field(&self) -> &str {
		&self.field
	}

	/// The recorded operator.
	pub const fn operator(&self) -> QueryOperator {
		self.operator
	}

	/// The condition payload.
	pub const fn payload(&self) -> &Payload {
		&self.payload
	}
}

impl fmt::Display for QueryCondition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"QueryCondition{{field='{}', operator={:?}, payload={:?}}}",
			self.field, self.operator, self.payload
		)
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;
	use std::collections::hash_map::DefaultHasher;
	use std::hash::{Hash, Hasher};

	use super::*;

	fn hash_of<T: Hash>(value: &T) -> u64 {
		let mut hasher = DefaultHasher::new();
		value.hash(&mut hasher);
		hasher.finish()
	}

	#[test]
	fn equal_conditions_hash_identically() {
		let a = QueryCondition::new(
			"name",
			QueryOperator::Eq,
			Payload::Value(QueryValue::from("张三")),
		);
		let b = QueryCondition::new(
			"name",
			QueryOperator::Eq,
			Payload::Value(QueryValue::from("张三")),
		);

		assert_eq!(a, b);
		assert_eq!(hash_of(&a), hash_of(&b));
	}

	#[test]
	fn equality_is_reflexive_symmetric_transitive() {
		let make = || {
			QueryCondition::new(
				"age",
				QueryOperator::Between,
				Payload::Values(vec![QueryValue::Int(18), QueryValue::Int(65)]),
			)
		};
		let (a, b, c) = (make(), make(), make());

		assert_eq!(a, a);
		assert_eq!(a, b);
		assert_eq!(b, a);
		assert_eq!(b, c);
		assert_eq!(a, c);
	}

	#[test]
	fn differing_components_are_unequal() {
		let base = QueryCondition::new(
			"age",
			QueryOperator::Gt,
			Payload::Value(QueryValue::Int(18)),
		);
		let other_field = QueryCondition::new(
			"size",
			QueryOperator::Gt,
			Payload::Value(QueryValue::Int(18)),
		);
		let other_op = QueryCondition::new(
			"age",
			QueryOperator::Ge,
			Payload::Value(QueryValue::Int(18)),
		);
		let other_value = QueryCondition::new(
			"age",
			QueryOperator::Gt,
			Payload::Value(QueryValue::Int(19)),
		);

		assert_ne!(base, other_field);
		assert_ne!(base, other_op);
		assert_ne!(base, other_value);
	}

	#[test]
	fn nan_payloads_stay_usable_as_keys() {
		let nan = QueryCondition::new(
			"score",
			QueryOperator::Eq,
			Payload::Value(QueryValue::Float(f64::NAN)),
		);
		let mut set = HashSet::new();
		set.insert(nan.clone());
		assert!(set.contains(&nan));
	}

	#[test]
	fn option_none_converts_to_null() {
		assert!(QueryValue::from(None::<i64>).is_null());
		assert_eq!(QueryValue::from(Some(7)), QueryValue::Int(7));
	}

	#[test]
	fn display_renders_like_pattern_text() {
		assert_eq!(QueryValue::from("abc").to_string(), "abc");
		assert_eq!(QueryValue::Int(42).to_string(), "42");
		assert_eq!(QueryValue::Bool(true).to_string(), "true");
	}
}
