//! Field references and accessor-name resolution.
//!
//! A [`FieldRef`] identifies one property of an entity by naming one of
//! its accessor methods. The [`field!`](crate::field!) macro checks at
//! compile time that the accessor exists, then resolves the method name
//! to the property name it reads: `get_name`/`getName` become `name`,
//! `is_active`/`isActive` become `active`, and anything that does not
//! follow the accessor conventions is kept as-is.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::error::{QueryError, Result};

/// Convert an accessor method name to the property name it reads.
///
/// The mapping is pure and deterministic. A `get` prefix is stripped
/// (with an optional `_` separator) and the first remaining character is
/// lowercased; the `is` prefix works the same way. A name that matches
/// neither convention, or that would become empty after stripping, is
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use smart_query::field::to_property_name;
///
/// assert_eq!(to_property_name("getName"), "name");
/// assert_eq!(to_property_name("get_name"), "name");
/// assert_eq!(to_property_name("isActive"), "active");
/// assert_eq!(to_property_name("is_active"), "active");
/// assert_eq!(to_property_name("name"), "name");
/// ```
pub fn to_property_name(method: &str) -> String {
	if let Some(rest) = method.strip_prefix("get") {
		decapitalize(rest).unwrap_or_else(|| method.to_string())
	} else if let Some(rest) = method.strip_prefix("is") {
		decapitalize(rest).unwrap_or_else(|| method.to_string())
	} else {
		method.to_string()
	}
}

/// Lowercase the first character, dropping one leading `_` separator.
/// Returns `None` when nothing remains after stripping.
fn decapitalize(rest: &str) -> Option<String> {
	let rest = rest.strip_prefix('_').unwrap_or(rest);
	let mut chars = rest.chars();
	let first = chars.next()?;
	Some(first.to_lowercase().chain(chars).collect())
}

/// A typed handle naming one property of entity `E`.
///
/// Prefer the [`field!`](crate::field!) macro, which verifies the
/// accessor exists on the entity type. [`FieldRef::resolve`] is the
/// runtime fallback for method names that only exist as strings.
pub struct FieldRef<E> {
	name: String,
	_marker: PhantomData<fn() -> E>,
}

// Manual impls so the phantom entity parameter carries no trait
// bounds: two references are equal when they name the same property.
impl<E> fmt::Debug for FieldRef<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FieldRef").field("name", &self.name).finish()
	}
}

impl<E> Clone for FieldRef<E> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			_marker: PhantomData,
		}
	}
}

impl<E> PartialEq for FieldRef<E> {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
	}
}

impl<E> Eq for FieldRef<E> {}

impl<E> Hash for FieldRef<E> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.name.hash(state);
	}
}

impl<E> FieldRef<E> {
	/// Resolve a field reference from an accessor method name.
	///
	/// # Errors
	///
	/// Returns [`QueryError::ResolutionFailed`] when the method name is
	/// empty.
	pub fn resolve(method: &str) -> Result<Self> {
		if method.is_empty() {
			return Err(QueryError::ResolutionFailed(
				"empty method name".to_string(),
			));
		}
		Ok(Self {
			name: to_property_name(method),
			_marker: PhantomData,
		})
	}

	// Macro-only constructor; `stringify!` of an identifier is never empty.
	#[doc(hidden)]
	pub fn from_accessor(method: &'static str) -> Self {
		Self {
			name: to_property_name(method),
			_marker: PhantomData,
		}
	}

	/// The resolved property name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Consume the reference, returning the property name.
	pub fn into_name(self) -> String {
		self.name
	}
}

/// Create a [`FieldRef`] from an accessor method of an entity.
///
/// The named method must exist on the entity type; a typo is a compile
/// error rather than a runtime failure.
///
/// # Examples
///
/// ```
/// use smart_query::field;
///
/// struct User {
///     name: String,
/// }
///
/// impl User {
///     fn get_name(&self) -> &str {
///         &self.name
///     }
/// }
///
/// let field = field!(User::get_name);
/// assert_eq!(field.name(), "name");
/// ```
#[macro_export]
macro_rules! field {
	($entity:ident :: $method:ident) => {{
		let _ = $entity::$method;
		$crate::field::FieldRef::<$entity>::from_accessor(stringify!($method))
	}};
}

#[cfg(test)]
mod tests {
	use super::*;

	struct User {
		age: i64,
		active: bool,
	}

	impl User {
		fn get_age(&self) -> i64 {
			self.age
		}

		fn is_active(&self) -> bool {
			self.active
		}

		fn email(&self) -> &'static str {
			"test@example.com"
		}
	}

	#[test]
	fn strips_get_prefix() {
		assert_eq!(to_property_name("getName"), "name");
		assert_eq!(to_property_name("getCreateTime"), "createTime");
		assert_eq!(to_property_name("get_create_time"), "create_time");
	}

	#[test]
	fn strips_is_prefix() {
		assert_eq!(to_property_name("isDeleted"), "deleted");
		assert_eq!(to_property_name("is_deleted"), "deleted");
	}

	#[test]
	fn single_character_property() {
		assert_eq!(to_property_name("getX"), "x");
		assert_eq!(to_property_name("isY"), "y");
	}

	#[test]
	fn non_accessor_names_pass_through() {
		assert_eq!(to_property_name("name"), "name");
		assert_eq!(to_property_name("fetchAll"), "fetchAll");
	}

	#[test]
	fn bare_prefix_is_not_an_accessor() {
		assert_eq!(to_property_name("get"), "get");
		assert_eq!(to_property_name("is"), "is");
		assert_eq!(to_property_name("get_"), "get_");
	}

	#[test]
	fn macro_resolves_accessor_names() {
		assert_eq!(field!(User::get_age).name(), "age");
		assert_eq!(field!(User::is_active).name(), "active");
		assert_eq!(field!(User::email).name(), "email");
	}

	#[test]
	fn resolve_rejects_empty_method_name() {
		let err = FieldRef::<User>::resolve("").unwrap_err();
		assert!(matches!(err, QueryError::ResolutionFailed(_)));
	}

	#[test]
	fn references_compare_without_entity_derives() {
		// User derives nothing; equality, hashing and formatting live
		// on the resolved name alone.
		let a = field!(User::get_age);
		let b = field!(User::get_age);
		let c = field!(User::is_active);

		assert_eq!(a, b);
		assert_ne!(a, c);
		assert_eq!(format!("{a:?}"), r#"FieldRef { name: "age" }"#);

		let mut set = std::collections::HashSet::new();
		set.insert(a.clone());
		assert!(set.contains(&b));
	}

	#[test]
	fn resolution_is_deterministic() {
		let a = FieldRef::<User>::resolve("getAge").unwrap();
		let b = FieldRef::<User>::resolve("getAge").unwrap();
		assert_eq!(a, b);
		assert_eq!(a.name(), "age");
	}

	mod properties {
		use proptest::prelude::*;

		use super::super::to_property_name;

		proptest! {
			// Resolution is a pure function: the same input always
			// produces the same output.
			#[test]
			fn deterministic(method in "[a-zA-Z_][a-zA-Z0-9_]{0,30}") {
				prop_assert_eq!(
					to_property_name(&method),
					to_property_name(&method)
				);
			}

			// get<X> always resolves to x for a non-empty uppercase-led X.
			#[test]
			fn get_prefix_decapitalizes(rest in "[A-Z][a-zA-Z0-9]{0,20}") {
				let method = format!("get{rest}");
				let mut expected = rest.clone();
				let first = expected.remove(0);
				let expected = format!("{}{}", first.to_lowercase(), expected);
				prop_assert_eq!(to_property_name(&method), expected);
			}
		}
	}
}
