//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - they represent
/// concepts where identity doesn't matter, only the attribute values do.
/// `Money { amount: 100, currency: "EUR" }` is a value object; a product with
/// an id is an entity. To "modify" a value object, construct a new one.
///
/// The trait bounds capture the minimum a value needs to behave like one:
///
/// - **Clone**: values are cheap to copy (they're values, not references)
/// - **PartialEq**: compared by their attribute values
/// - **Debug**: debuggable (helpful for logging, testing)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
