//! Error types for query building and execution.

use crate::operator::QueryOperator;

/// Errors that can occur while resolving fields, building conditions,
/// or executing queries.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
	/// A field reference could not be resolved to a property name
	#[error("failed to resolve field reference: {0}")]
	ResolutionFailed(String),

	/// An operator appeared in a position the translator cannot place
	#[error("unsupported operator {operator:?} in {context}")]
	UnsupportedOperator {
		operator: QueryOperator,
		context: &'static str,
	},

	/// A condition payload does not match the shape its operator requires
	#[error("malformed payload: {0}")]
	MalformedPayload(String),

	/// Database error surfaced unchanged from the driver
	#[error("database error: {0}")]
	Backend(#[from] sqlx::Error),

	/// Negative or zero-sized pagination request
	#[error("illegal pagination: page={page}, size={size}")]
	IllegalPagination { page: u64, size: u64 },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_messages_are_descriptive() {
		let err = QueryError::ResolutionFailed("empty method name".to_string());
		assert_eq!(
			err.to_string(),
			"failed to resolve field reference: empty method name"
		);

		let err = QueryError::IllegalPagination { page: 0, size: 0 };
		assert_eq!(err.to_string(), "illegal pagination: page=0, size=0");
	}

	#[test]
	fn unsupported_operator_names_the_clause() {
		let err = QueryError::UnsupportedOperator {
			operator: QueryOperator::Nest,
			context: "HAVING",
		};
		assert!(err.to_string().contains("HAVING"));
	}
}
