//! The fluent query wrapper: an ordered accumulator of conditions and
//! joins.
//!
//! A wrapper is built by one caller, then handed to the executor which
//! treats it as read-only. Insertion order is significant: it decides
//! the relative order of ORDER BY and GROUP BY columns and the infix
//! position of the OR/AND markers.

use std::marker::PhantomData;

use smallvec::SmallVec;

use crate::condition::{Payload, QueryCondition, QueryValue};
use crate::entity::Entity;
use crate::field::FieldRef;
use crate::join::{JoinCondition, JoinType};
use crate::operator::QueryOperator;

/// Type-safe query condition builder for entity `T`.
///
/// Fields are identified with the [`field!`](crate::field!) macro rather
/// than string literals, so a renamed accessor is a compile error
/// instead of a silent mismatch.
///
/// # Examples
///
/// ```
/// use smart_query::{Entity, QueryWrapper, field};
///
/// #[derive(Clone)]
/// struct User {
///     name: String,
///     age: i64,
/// }
///
/// impl Entity for User {
///     fn table_name() -> &'static str {
///         "users"
///     }
/// }
///
/// impl User {
///     fn get_name(&self) -> &str {
///         &self.name
///     }
///     fn get_age(&self) -> i64 {
///         self.age
///     }
/// }
///
/// let wrapper = QueryWrapper::<User>::of()
///     .eq(field!(User::get_name), "张三")
///     .gt(field!(User::get_age), 18)
///     .order_by_desc(field!(User::get_age));
///
/// assert_eq!(wrapper.len(), 3);
/// ```
#[derive(Clone)]
pub struct QueryWrapper<T>
where
	T: Entity,
{
	conditions: SmallVec<[QueryCondition; 8]>,
	joins: Vec<JoinCondition>,
	_phantom: PhantomData<fn() -> T>,
}

impl<T> QueryWrapper<T>
where
	T: Entity,
{
	/// Create an empty wrapper.
	pub fn new() -> Self {
		Self {
			conditions: SmallVec::new(),
			joins: Vec::new(),
			_phantom: PhantomData,
		}
	}

	/// Static factory, reads better at the head of a fluent chain.
	pub fn of() -> Self {
		Self::new()
	}

	fn push(&mut self, field: impl Into<String>, operator: QueryOperator, payload: Payload) {
		self.conditions
			.push(QueryCondition::new(field, operator, payload));
	}

	fn push_scalar(mut self, field: FieldRef<T>, operator: QueryOperator, value: QueryValue) -> Self {
		if !value.is_null() {
			self.push(field.into_name(), operator, Payload::Value(value));
		}
		self
	}

	fn push_values(
		mut self,
		field: FieldRef<T>,
		operator: QueryOperator,
		values: Vec<QueryValue>,
	) -> Self {
		if !values.is_empty() {
			self.push(field.into_name(), operator, Payload::Values(values));
		}
		self
	}

	/// `field = value`. A null value omits the condition.
	///
	/// `Option::None` converts to the null marker, so optional request
	/// parameters can be passed straight through:
	///
	/// ```
	/// # use smart_query::{Entity, QueryWrapper, field};
	/// # #[derive(Clone)]
	/// # struct User { name: String }
	/// # impl Entity for User {
	/// #     fn table_name() -> &'static str { "users" }
	/// # }
	/// # impl User {
	/// #     fn get_name(&self) -> &str { &self.name }
	/// # }
	/// let wrapper = QueryWrapper::<User>::of().eq(field!(User::get_name), None::<&str>);
	/// assert!(wrapper.is_empty());
	/// ```
	pub fn eq<V>(self, field: FieldRef<T>, value: V) -> Self
	where
		V: Into<QueryValue>,
	{
		self.push_scalar(field, QueryOperator::Eq, value.into())
	}

	/// `field <> value`. A null value omits the condition.
	pub fn ne<V>(self, field: FieldRef<T>, value: V) -> Self
	where
		V: Into<QueryValue>,
	{
		self.push_scalar(field, QueryOperator::Ne, value.into())
	}

	/// `field > value`. A null value omits the condition.
	pub fn gt<V>(self, field: FieldRef<T>, value: V) -> Self
	where
		V: Into<QueryValue>,
	{
		self.push_scalar(field, QueryOperator::Gt, value.into())
	}

	/// `field < value`. A null value omits the condition.
	pub fn lt<V>(self, field: FieldRef<T>, value: V) -> Self
	where
		V: Into<QueryValue>,
	{
		self.push_scalar(field, QueryOperator::Lt, value.into())
	}

	/// `field >= value` over the first element of `values`. An empty
	/// sequence omits the condition.
	pub fn ge<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::Ge, values)
	}

	/// `field <= value` over the first element of `values`. An empty
	/// sequence omits the condition.
	pub fn le<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::Le, values)
	}

	/// `field LIKE '%value%'`. A null value omits the condition.
	pub fn like<V>(self, field: FieldRef<T>, value: V) -> Self
	where
		V: Into<QueryValue>,
	{
		self.push_scalar(field, QueryOperator::Like, value.into())
	}

	/// Matches any of the patterns: a parenthesized disjunction of
	/// `field LIKE '%v%'` over the sequence. Empty sequences are
	/// omitted.
	pub fn like_any<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::Like, values)
	}

	/// Disjunction of `field LIKE '%v'` (suffix match) over the
	/// sequence. Empty sequences are omitted.
	pub fn left_like<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::LeftLike, values)
	}

	/// Disjunction of `field LIKE 'v%'` (prefix match) over the
	/// sequence. Empty sequences are omitted.
	pub fn right_like<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::RightLike, values)
	}

	/// `field IN (v1, v2, ...)`. An empty sequence omits the condition.
	pub fn is_in<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::In, values)
	}

	/// `field NOT IN (v1, v2, ...)`. An empty sequence omits the
	/// condition.
	pub fn not_in<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::NotIn, values)
	}

	/// `field BETWEEN v1 AND v2` over the first two elements. An empty
	/// sequence omits the condition; a single-element sequence is
	/// dropped at translation time.
	pub fn between<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::Between, values)
	}

	/// `field NOT BETWEEN v1 AND v2` over the first two elements.
	pub fn not_between<V, I>(self, field: FieldRef<T>, values: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		let values = values.into_iter().map(Into::into).collect();
		self.push_values(field, QueryOperator::NotBetween, values)
	}

	/// `field IS NULL`. Always appended.
	pub fn is_null(mut self, field: FieldRef<T>) -> Self {
		self.push(field.into_name(), QueryOperator::IsNull, Payload::None);
		self
	}

	/// `field IS NOT NULL`. Always appended.
	pub fn is_not_null(mut self, field: FieldRef<T>) -> Self {
		self.push(field.into_name(), QueryOperator::IsNotNull, Payload::None);
		self
	}

	/// `ORDER BY field ASC`. Always appended, in call order.
	pub fn order_by_asc(mut self, field: FieldRef<T>) -> Self {
		self.push(field.into_name(), QueryOperator::OrderByAsc, Payload::None);
		self
	}

	/// `ORDER BY field DESC`. Always appended, in call order.
	pub fn order_by_desc(mut self, field: FieldRef<T>) -> Self {
		self.push(field.into_name(), QueryOperator::OrderByDesc, Payload::None);
		self
	}

	/// `GROUP BY field`. Always appended, in call order.
	pub fn group_by(mut self, field: FieldRef<T>) -> Self {
		self.push(field.into_name(), QueryOperator::GroupBy, Payload::None);
		self
	}

	/// `GROUP BY f1, f2, ...`: one condition per field, in order.
	pub fn group_by_fields<I>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = FieldRef<T>>,
	{
		for field in fields {
			self.push(field.into_name(), QueryOperator::GroupBy, Payload::None);
		}
		self
	}

	/// `HAVING field <op> value`. The sub-operator must be one of the
	/// six comparisons; anything else is rejected at translation time.
	pub fn having<V>(mut self, field: FieldRef<T>, op: QueryOperator, value: V) -> Self
	where
		V: Into<QueryValue>,
	{
		self.push(
			field.into_name(),
			QueryOperator::Having,
			Payload::Having {
				op,
				value: value.into(),
			},
		);
		self
	}

	/// Positional OR marker: the next predicate is combined with the
	/// previous one by `OR` instead of the default `AND`.
	pub fn or(mut self) -> Self {
		self.push("", QueryOperator::Or, Payload::None);
		self
	}

	/// Positional AND marker. Conjunction is the default, so this is a
	/// readability aid.
	pub fn and(mut self) -> Self {
		self.push("", QueryOperator::And, Payload::None);
		self
	}

	/// Incorporate another wrapper as a parenthesized predicate group.
	///
	/// Ordering and grouping conditions of the inner wrapper are
	/// discarded at translation time; only its predicates survive.
	pub fn nest(mut self, inner: QueryWrapper<T>) -> Self {
		self.push(
			"",
			QueryOperator::Nest,
			Payload::Nested(inner.conditions.into_vec()),
		);
		self
	}

	/// Append a raw SQL predicate with `?` placeholders substituted
	/// positionally from `params`.
	///
	/// The fragment is passed through to the database verbatim; it is
	/// the caller's responsibility to keep user input out of it.
	pub fn apply<V, I>(mut self, fragment: impl Into<String>, params: I) -> Self
	where
		V: Into<QueryValue>,
		I: IntoIterator<Item = V>,
	{
		self.push(
			"",
			QueryOperator::Apply,
			Payload::Raw {
				fragment: fragment.into(),
				params: params.into_iter().map(Into::into).collect(),
			},
		);
		self
	}

	/// Append a hand-built condition record.
	pub fn add_condition(mut self, condition: QueryCondition) -> Self {
		self.conditions.push(condition);
		self
	}

	/// `INNER JOIN` against the table of `R`.
	pub fn inner_join<R: Entity>(self, alias: impl Into<String>, on: impl Into<String>) -> Self {
		self.add_join(JoinCondition::new(JoinType::Inner, R::table_name(), alias, on))
	}

	/// `LEFT JOIN` against the table of `R`.
	pub fn left_join<R: Entity>(self, alias: impl Into<String>, on: impl Into<String>) -> Self {
		self.add_join(JoinCondition::new(JoinType::Left, R::table_name(), alias, on))
	}

	/// `RIGHT JOIN` against the table of `R`.
	pub fn right_join<R: Entity>(self, alias: impl Into<String>, on: impl Into<String>) -> Self {
		self.add_join(JoinCondition::new(JoinType::Right, R::table_name(), alias, on))
	}

	/// `FULL JOIN` against the table of `R`.
	pub fn full_join<R: Entity>(self, alias: impl Into<String>, on: impl Into<String>) -> Self {
		self.add_join(JoinCondition::new(JoinType::Full, R::table_name(), alias, on))
	}

	/// Append a pre-built join record.
	pub fn add_join(mut self, join: JoinCondition) -> Self {
		self.joins.push(join);
		self
	}

	/// Number of recorded conditions.
	pub fn len(&self) -> usize {
		self.conditions.len()
	}

	/// Whether no conditions have been recorded.
	pub fn is_empty(&self) -> bool {
		self.conditions.is_empty()
	}

	/// The recorded conditions, in insertion order.
	pub fn conditions(&self) -> &[QueryCondition] {
		&self.conditions
	}

	/// The recorded joins, in insertion order.
	pub fn join_conditions(&self) -> &[JoinCondition] {
		&self.joins
	}

	/// Whether any joins have been recorded.
	pub fn has_joins(&self) -> bool {
		!self.joins.is_empty()
	}

	/// The table name of the wrapped entity type.
	pub fn entity_table(&self) -> &'static str {
		T::table_name()
	}

	/// Remove every recorded condition; joins are untouched.
	pub fn clear(mut self) -> Self {
		self.conditions.clear();
		self
	}

	/// Remove every recorded join; conditions are untouched.
	pub fn clear_joins(mut self) -> Self {
		self.joins.clear();
		self
	}
}

impl<T> Default for QueryWrapper<T>
where
	T: Entity,
{
	fn default() -> Self {
		Self::new()
	}
}
