//! End-to-end tests for the wrapper-to-SQL pipeline through the public API.

use sea_query::PostgresQueryBuilder;
use smart_query::prelude::*;

#[derive(Debug, Clone)]
struct User {
	id: i64,
	name: String,
	age: i64,
	email: Option<String>,
	department: String,
	salary: i64,
}

impl Entity for User {
	fn table_name() -> &'static str {
		"users"
	}
}

impl User {
	fn get_id(&self) -> i64 {
		self.id
	}

	fn get_name(&self) -> &str {
		&self.name
	}

	fn get_age(&self) -> i64 {
		self.age
	}

	fn get_email(&self) -> Option<&str> {
		self.email.as_deref()
	}

	fn get_department(&self) -> &str {
		&self.department
	}

	fn get_salary(&self) -> i64 {
		self.salary
	}

	fn get_create_time(&self) -> i64 {
		0
	}
}

#[derive(Debug, Clone)]
struct OrderRecord;

impl Entity for OrderRecord {
	fn table_name() -> &'static str {
		"orders"
	}
}

fn render<T: Entity>(wrapper: &QueryWrapper<T>) -> String {
	build_select(wrapper).unwrap().to_string(PostgresQueryBuilder)
}

#[test]
fn test_multi_condition_query_preserves_order() {
	let wrapper = QueryWrapper::<User>::of()
		.eq(field!(User::get_name), "张三")
		.gt(field!(User::get_age), 18)
		.like(field!(User::get_email), "@gmail.com")
		.order_by_desc(field!(User::get_create_time));

	assert_eq!(
		render(&wrapper),
		r#"SELECT * FROM "users" WHERE "name" = '张三' AND "age" > 18 AND "email" LIKE '%@gmail.com%' ORDER BY "create_time" DESC"#
	);
}

#[test]
fn test_optional_parameters_pass_through_as_no_ops() {
	// An optional request parameter that is absent leaves no trace in the SQL.
	let name_filter: Option<String> = None;
	let status_filter: Vec<i64> = Vec::new();

	let wrapper = QueryWrapper::<User>::of()
		.eq(field!(User::get_name), name_filter)
		.is_in(field!(User::get_age), status_filter)
		.gt(field!(User::get_age), Some(18));

	assert_eq!(render(&wrapper), r#"SELECT * FROM "users" WHERE "age" > 18"#);
}

#[test]
fn test_group_by_having_report_query() {
	let wrapper = QueryWrapper::<User>::of()
		.group_by_fields([field!(User::get_department)])
		.having(field!(User::get_salary), QueryOperator::Gt, 5000);

	assert_eq!(
		render(&wrapper),
		r#"SELECT * FROM "users" GROUP BY "department" HAVING "salary" > 5000"#
	);
}

#[test]
fn test_join_with_where_and_pagination() {
	let wrapper = QueryWrapper::<User>::of()
		.inner_join::<OrderRecord>("o", "users.id = o.user_id")
		.eq(field!(User::get_name), "张三");

	let sql = build_page(&wrapper, 1, 20)
		.unwrap()
		.to_string(PostgresQueryBuilder);

	assert_eq!(
		sql,
		r#"SELECT * FROM "users" INNER JOIN "orders" AS "o" ON users.id = o.user_id WHERE "name" = '张三' LIMIT 20 OFFSET 20"#
	);
}

#[test]
fn test_count_matches_where_conditions_of_the_page() {
	let wrapper = QueryWrapper::<User>::of()
		.eq(field!(User::get_department), "eng")
		.order_by_desc(field!(User::get_salary));

	let count_sql = build_count(&wrapper).unwrap().to_string(PostgresQueryBuilder);
	assert_eq!(
		count_sql,
		r#"SELECT COUNT(*) FROM "users" WHERE "department" = 'eng'"#
	);
}

#[test]
fn test_nested_disjunction_inside_conjunction() {
	let recent_or_senior = QueryWrapper::<User>::of()
		.gt(field!(User::get_age), 60)
		.or()
		.gt(field!(User::get_id), 100_000);
	let wrapper = QueryWrapper::<User>::of()
		.eq(field!(User::get_department), "eng")
		.nest(recent_or_senior);

	let sql = render(&wrapper);
	assert!(sql.contains(r#""department" = 'eng'"#), "{sql}");
	assert!(sql.contains(r#""age" > 60 OR "id" > 100000"#), "{sql}");
}

#[test]
fn test_raw_fragment_with_parameters() {
	let wrapper = QueryWrapper::<User>::of()
		.eq(field!(User::get_department), "eng")
		.apply("date_part('year', hired_at) = ?", [2024_i64]);

	let sql = render(&wrapper);
	assert!(sql.contains("date_part('year', hired_at) = 2024"), "{sql}");
	assert!(!sql.contains('?'), "{sql}");
}

#[test]
fn test_wrapper_survives_serialization() {
	// Condition records are plain data and round-trip through serde.
	let wrapper = QueryWrapper::<User>::of()
		.eq(field!(User::get_name), "张三")
		.between(field!(User::get_age), [18, 65]);

	let json = serde_json::to_string(wrapper.conditions()).unwrap();
	let restored: Vec<QueryCondition> = serde_json::from_str(&json).unwrap();

	assert_eq!(restored.as_slice(), wrapper.conditions());
}

#[test]
fn test_invalid_pagination_is_rejected_before_the_database() {
	let wrapper = QueryWrapper::<User>::of();
	assert!(matches!(
		build_page(&wrapper, 3, 0),
		Err(QueryError::IllegalPagination { page: 3, size: 0 })
	));
}
