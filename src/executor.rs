//! Translation of condition sequences into SQL and their execution
//! against a connection pool.
//!
//! Translation is pure: [`build_select`], [`build_count`] and
//! [`build_page`] turn a wrapper into a [`SelectStatement`] without
//! touching the database, which is also how the tests assert on the
//! generated SQL. [`LambdaQueryExecutor`] renders those statements for
//! Postgres and runs them, recording elapsed time in the performance
//! monitor.

use sea_query::{
	Alias, Asterisk, Condition, Expr, ExprTrait, Func, Order, PostgresQueryBuilder, Query,
	SelectStatement,
};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::FromRow;
use tracing::debug;

use crate::condition::{Payload, QueryCondition, QueryValue};
use crate::entity::Entity;
use crate::error::{QueryError, Result};
use crate::join::{JoinCondition, JoinType};
use crate::monitor::QueryPerformanceMonitor;
use crate::operator::{Clause, QueryOperator};
use crate::wrapper::QueryWrapper;

/// Accumulates the clause fragments produced by one translation pass.
///
/// `pending_or` is set by an OR marker and consumed by the next
/// predicate, which is then combined with its predecessor by `OR`
/// instead of the default `AND`.
struct QueryContext {
	predicates: Vec<Expr>,
	orders: Vec<(String, Order)>,
	groups: Vec<String>,
	havings: Vec<Expr>,
	pending_or: bool,
}

impl QueryContext {
	fn new() -> Self {
		Self {
			predicates: Vec::new(),
			orders: Vec::new(),
			groups: Vec::new(),
			havings: Vec::new(),
			pending_or: false,
		}
	}

	fn push_predicate(&mut self, expr: Expr) {
		if self.pending_or {
			self.pending_or = false;
			if let Some(prev) = self.predicates.pop() {
				self.predicates.push(prev.or(expr));
				return;
			}
		}
		self.predicates.push(expr);
	}

	/// Fold the accumulated predicates into a single conjunction.
	fn into_predicate(self) -> Option<Expr> {
		self.predicates.into_iter().reduce(|acc, expr| acc.and(expr))
	}
}

fn translate(conditions: &[QueryCondition], where_only: bool) -> Result<QueryContext> {
	let mut ctx = QueryContext::new();
	for condition in conditions {
		apply_condition(condition, &mut ctx, where_only)?;
	}
	Ok(ctx)
}

/// Dispatch one condition to its clause. With `where_only` set (COUNT
/// queries and nested groups) everything outside the WHERE clause is
/// silently dropped.
fn apply_condition(
	condition: &QueryCondition,
	ctx: &mut QueryContext,
	where_only: bool,
) -> Result<()> {
	match condition.operator().clause() {
		Clause::WherePredicate => {
			if let Some(expr) = build_predicate(condition)? {
				ctx.push_predicate(expr);
			}
		}
		Clause::Order => {
			if !where_only {
				let order = if condition.operator() == QueryOperator::OrderByAsc {
					Order::Asc
				} else {
					Order::Desc
				};
				ctx.orders.push((condition.field().to_string(), order));
			}
		}
		Clause::Group => {
			if !where_only {
				ctx.groups.push(condition.field().to_string());
			}
		}
		Clause::Having => {
			if !where_only {
				ctx.havings.push(build_having(condition)?);
			}
		}
		Clause::Logical => {
			ctx.pending_or = condition.operator() == QueryOperator::Or;
		}
		Clause::Structural => match condition.operator() {
			QueryOperator::Nest => {
				let Payload::Nested(inner) = condition.payload() else {
					return Err(QueryError::MalformedPayload(
						"NEST requires a nested condition list".to_string(),
					));
				};
				// Nested groups contribute predicates only.
				let sub = translate(inner, true)?;
				if let Some(expr) = sub.into_predicate() {
					ctx.push_predicate(expr);
				}
			}
			QueryOperator::Apply => {
				let Payload::Raw { fragment, params } = condition.payload() else {
					return Err(QueryError::MalformedPayload(
						"APPLY requires a raw fragment payload".to_string(),
					));
				};
				let expr = if params.is_empty() {
					Expr::cust(fragment.clone())
				} else {
					Expr::cust_with_values(
						numbered_placeholders(fragment),
						params.iter().map(sea_value),
					)
				};
				ctx.push_predicate(expr);
			}
			other => {
				return Err(QueryError::UnsupportedOperator {
					operator: other,
					context: "structural position",
				});
			}
		},
	}
	Ok(())
}

/// Rewrite `?` placeholders to the numbered `$N` form the Postgres
/// builder substitutes values into.
fn numbered_placeholders(fragment: &str) -> String {
	let mut out = String::with_capacity(fragment.len() + 4);
	let mut index = 0u32;
	for ch in fragment.chars() {
		if ch == '?' {
			index += 1;
			out.push('$');
			out.push_str(&index.to_string());
		} else {
			out.push(ch);
		}
	}
	out
}

fn scalar(condition: &QueryCondition) -> Result<&QueryValue> {
	match condition.payload() {
		Payload::Value(value) => Ok(value),
		other => Err(QueryError::MalformedPayload(format!(
			"{:?} expects a single value, got {other:?}",
			condition.operator()
		))),
	}
}

fn sequence(condition: &QueryCondition) -> Result<Vec<&QueryValue>> {
	match condition.payload() {
		Payload::Values(values) => Ok(values.iter().collect()),
		Payload::Value(value) => Ok(vec![value]),
		other => Err(QueryError::MalformedPayload(format!(
			"{:?} expects a value sequence, got {other:?}",
			condition.operator()
		))),
	}
}

fn sea_value(value: &QueryValue) -> sea_query::Value {
	match value {
		QueryValue::Null => sea_query::Value::Int(None),
		QueryValue::Bool(b) => (*b).into(),
		QueryValue::Int(i) => (*i).into(),
		QueryValue::Float(f) => (*f).into(),
		QueryValue::String(s) => s.clone().into(),
		QueryValue::Bytes(b) => b.clone().into(),
		QueryValue::Timestamp(ts) => (*ts).into(),
		QueryValue::Uuid(u) => (*u).into(),
	}
}

fn like_pattern(operator: QueryOperator, value: &QueryValue) -> String {
	match operator {
		QueryOperator::LeftLike => format!("%{value}"),
		QueryOperator::RightLike => format!("{value}%"),
		_ => format!("%{value}%"),
	}
}

/// Build one WHERE predicate. `Ok(None)` means the condition carries
/// nothing translatable and is omitted, which keeps the conditional
/// append contract intact for records built by hand.
fn build_predicate(condition: &QueryCondition) -> Result<Option<Expr>> {
	let column = || Expr::col(Alias::new(condition.field()));
	let operator = condition.operator();

	let expr = match operator {
		QueryOperator::Eq => match scalar(condition)? {
			QueryValue::Null => column().is_null(),
			value => column().eq(sea_value(value)),
		},
		QueryOperator::Ne => match scalar(condition)? {
			QueryValue::Null => column().is_not_null(),
			value => column().ne(sea_value(value)),
		},
		QueryOperator::Gt => match scalar(condition)? {
			QueryValue::Null => return Ok(None),
			value => column().gt(sea_value(value)),
		},
		QueryOperator::Lt => match scalar(condition)? {
			QueryValue::Null => return Ok(None),
			value => column().lt(sea_value(value)),
		},
		QueryOperator::Ge => match sequence(condition)?.first().copied() {
			None | Some(QueryValue::Null) => return Ok(None),
			Some(value) => column().gte(sea_value(value)),
		},
		QueryOperator::Le => match sequence(condition)?.first().copied() {
			None | Some(QueryValue::Null) => return Ok(None),
			Some(value) => column().lte(sea_value(value)),
		},
		QueryOperator::Like | QueryOperator::LeftLike | QueryOperator::RightLike => {
			let patterns: Vec<String> = sequence(condition)?
				.into_iter()
				.filter(|value| !value.is_null())
				.map(|value| like_pattern(operator, value))
				.collect();
			match patterns
				.into_iter()
				.map(|pattern| column().like(pattern))
				.reduce(|acc, expr| acc.or(expr))
			{
				None => return Ok(None),
				Some(expr) => expr,
			}
		}
		QueryOperator::In => {
			let values = sequence(condition)?;
			if values.is_empty() {
				return Ok(None);
			}
			column().is_in(values.into_iter().map(sea_value))
		}
		QueryOperator::NotIn => {
			let values = sequence(condition)?;
			if values.is_empty() {
				return Ok(None);
			}
			column().is_not_in(values.into_iter().map(sea_value))
		}
		QueryOperator::IsNull => column().is_null(),
		QueryOperator::IsNotNull => column().is_not_null(),
		QueryOperator::Between => {
			let values = sequence(condition)?;
			match (values.first().copied(), values.get(1).copied()) {
				(Some(low), Some(high)) => column().between(sea_value(low), sea_value(high)),
				_ => return Ok(None),
			}
		}
		QueryOperator::NotBetween => {
			let values = sequence(condition)?;
			match (values.first().copied(), values.get(1).copied()) {
				(Some(low), Some(high)) => column().not_between(sea_value(low), sea_value(high)),
				_ => return Ok(None),
			}
		}
		other => {
			return Err(QueryError::UnsupportedOperator {
				operator: other,
				context: "WHERE clause",
			});
		}
	};
	Ok(Some(expr))
}

fn build_having(condition: &QueryCondition) -> Result<Expr> {
	let Payload::Having { op, value } = condition.payload() else {
		return Err(QueryError::MalformedPayload(
			"HAVING requires a sub-operator payload".to_string(),
		));
	};
	let column = Expr::col(Alias::new(condition.field()));
	let value = sea_value(value);
	let expr = match op {
		QueryOperator::Eq => column.eq(value),
		QueryOperator::Ne => column.ne(value),
		QueryOperator::Gt => column.gt(value),
		QueryOperator::Ge => column.gte(value),
		QueryOperator::Lt => column.lt(value),
		QueryOperator::Le => column.lte(value),
		other => {
			return Err(QueryError::UnsupportedOperator {
				operator: *other,
				context: "HAVING clause",
			});
		}
	};
	Ok(expr)
}

fn attach_joins(stmt: &mut SelectStatement, joins: &[JoinCondition]) {
	for join in joins {
		let join_type = match join.join_type() {
			JoinType::Inner => sea_query::JoinType::InnerJoin,
			JoinType::Left => sea_query::JoinType::LeftJoin,
			JoinType::Right => sea_query::JoinType::RightJoin,
			JoinType::Full => sea_query::JoinType::FullOuterJoin,
		};
		let on = Expr::cust(join.on_condition().to_string());
		if join.alias().is_empty() {
			stmt.join(join_type, Alias::new(join.target_table()), on);
		} else {
			stmt.join_as(
				join_type,
				Alias::new(join.target_table()),
				Alias::new(join.alias()),
				on,
			);
		}
	}
}

fn apply_context(stmt: &mut SelectStatement, ctx: QueryContext) {
	let QueryContext {
		predicates,
		orders,
		groups,
		havings,
		..
	} = ctx;

	if !predicates.is_empty() {
		let mut condition = Condition::all();
		for predicate in predicates {
			condition = condition.add(predicate);
		}
		stmt.cond_where(condition);
	}
	for group in groups {
		stmt.group_by_col(Alias::new(group));
	}
	for having in havings {
		stmt.and_having(having);
	}
	for (field, order) in orders {
		stmt.order_by(Alias::new(field), order);
	}
}

/// Build the `SELECT *` statement for a wrapper: joins, WHERE, GROUP
/// BY, HAVING and ORDER BY, in that clause order.
///
/// # Examples
///
/// ```
/// use sea_query::PostgresQueryBuilder;
/// use smart_query::executor::build_select;
/// use smart_query::{Entity, QueryWrapper, field};
///
/// # #[derive(Clone)]
/// # struct User { name: String }
/// # impl Entity for User {
/// #     fn table_name() -> &'static str { "users" }
/// # }
/// # impl User {
/// #     fn get_name(&self) -> &str { &self.name }
/// # }
/// let wrapper = QueryWrapper::<User>::of().eq(field!(User::get_name), "张三");
/// let sql = build_select(&wrapper).unwrap().to_string(PostgresQueryBuilder);
/// assert_eq!(sql, r#"SELECT * FROM "users" WHERE "name" = '张三'"#);
/// ```
pub fn build_select<T: Entity>(wrapper: &QueryWrapper<T>) -> Result<SelectStatement> {
	let ctx = translate(wrapper.conditions(), false)?;
	let mut stmt = Query::select();
	stmt.column(Asterisk).from(Alias::new(T::table_name()));
	attach_joins(&mut stmt, wrapper.join_conditions());
	apply_context(&mut stmt, ctx);
	Ok(stmt)
}

/// Build the `SELECT COUNT(*)` statement for a wrapper.
///
/// Only WHERE-clause conditions apply; ordering, grouping, HAVING and
/// joins are ignored so the count matches the unpaged row set.
pub fn build_count<T: Entity>(wrapper: &QueryWrapper<T>) -> Result<SelectStatement> {
	let ctx = translate(wrapper.conditions(), true)?;
	let mut stmt = Query::select();
	stmt.expr(Func::count(Expr::col(Asterisk)))
		.from(Alias::new(T::table_name()));
	apply_context(&mut stmt, ctx);
	Ok(stmt)
}

/// Build the paginated `SELECT *` for a zero-based `page` of `size`
/// rows, offset by `page * size`.
///
/// # Errors
///
/// Returns [`QueryError::IllegalPagination`] when `size` is zero or the
/// offset computation overflows.
pub fn build_page<T: Entity>(
	wrapper: &QueryWrapper<T>,
	page: u64,
	size: u64,
) -> Result<SelectStatement> {
	if size == 0 {
		return Err(QueryError::IllegalPagination { page, size });
	}
	let offset = page
		.checked_mul(size)
		.ok_or(QueryError::IllegalPagination { page, size })?;
	let mut stmt = build_select(wrapper)?;
	stmt.limit(size).offset(offset);
	Ok(stmt)
}

/// Executes wrapper-described queries against a Postgres pool.
///
/// The executor borrows the pool, so one pool serves any number of
/// executors. Every execution is timed and recorded under the query
/// type `"{table}.{verb}"`.
pub struct LambdaQueryExecutor<'a> {
	pool: &'a PgPool,
	monitor: &'a QueryPerformanceMonitor,
}

impl<'a> LambdaQueryExecutor<'a> {
	/// An executor recording into the process-wide monitor.
	pub fn new(pool: &'a PgPool) -> Self {
		Self {
			pool,
			monitor: QueryPerformanceMonitor::global(),
		}
	}

	/// An executor recording into a caller-owned monitor.
	pub fn with_monitor(pool: &'a PgPool, monitor: &'a QueryPerformanceMonitor) -> Self {
		Self { pool, monitor }
	}

	/// Fetch every row matching the wrapper.
	pub async fn list<T>(&self, wrapper: &QueryWrapper<T>) -> Result<Vec<T>>
	where
		T: Entity + for<'r> FromRow<'r, PgRow> + Send + Unpin,
	{
		let sql = build_select(wrapper)?.to_string(PostgresQueryBuilder);
		debug!(sql = %sql, "executing list query");
		let timer = self.monitor.start(format!("{}.list", T::table_name()));
		let rows = sqlx::query_as::<_, T>(&sql).fetch_all(self.pool).await;
		timer.finish();
		Ok(rows?)
	}

	/// Fetch one page of rows matching the wrapper.
	pub async fn list_with_pagination<T>(
		&self,
		wrapper: &QueryWrapper<T>,
		page: u64,
		size: u64,
	) -> Result<Vec<T>>
	where
		T: Entity + for<'r> FromRow<'r, PgRow> + Send + Unpin,
	{
		let sql = build_page(wrapper, page, size)?.to_string(PostgresQueryBuilder);
		debug!(sql = %sql, page, size, "executing page query");
		let timer = self.monitor.start(format!("{}.page", T::table_name()));
		let rows = sqlx::query_as::<_, T>(&sql).fetch_all(self.pool).await;
		timer.finish();
		Ok(rows?)
	}

	/// Count the rows matching the wrapper's WHERE conditions.
	pub async fn count<T>(&self, wrapper: &QueryWrapper<T>) -> Result<i64>
	where
		T: Entity,
	{
		let sql = build_count(wrapper)?.to_string(PostgresQueryBuilder);
		debug!(sql = %sql, "executing count query");
		let timer = self.monitor.start(format!("{}.count", T::table_name()));
		let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(self.pool).await;
		timer.finish();
		Ok(count?)
	}

	/// Fetch at most one row matching the wrapper.
	pub async fn get_one<T>(&self, wrapper: &QueryWrapper<T>) -> Result<Option<T>>
	where
		T: Entity + for<'r> FromRow<'r, PgRow> + Send + Unpin,
	{
		let mut stmt = build_select(wrapper)?;
		stmt.limit(1);
		let sql = stmt.to_string(PostgresQueryBuilder);
		debug!(sql = %sql, "executing get_one query");
		let timer = self.monitor.start(format!("{}.one", T::table_name()));
		let row = sqlx::query_as::<_, T>(&sql).fetch_optional(self.pool).await;
		timer.finish();
		Ok(row?)
	}

	/// Whether any row matches the wrapper's WHERE conditions.
	pub async fn exists<T>(&self, wrapper: &QueryWrapper<T>) -> Result<bool>
	where
		T: Entity,
	{
		let sql = build_count(wrapper)?.to_string(PostgresQueryBuilder);
		debug!(sql = %sql, "executing exists query");
		let timer = self.monitor.start(format!("{}.exists", T::table_name()));
		let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(self.pool).await;
		timer.finish();
		Ok(count? > 0)
	}
}
