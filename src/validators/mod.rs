//! Built-in rule implementations
//!
//! Each rule lives in its own module and implements [`Rule`](crate::rule::Rule).
//! Rules are attached to paths through [`Rules`](crate::rules::Rules) or
//! [`RulesBuilder`](crate::rules::RulesBuilder); kind gating and error
//! collection are handled by the engine.

pub mod custom;
pub mod email;
pub mod length;
pub mod numeric;
pub mod pattern;
pub mod required;

pub use custom::CustomValidator;
pub use email::EmailValidator;
pub use length::LengthValidator;
pub use numeric::NumericValidator;
pub use pattern::PatternValidator;
pub use required::{NullableValidator, RequiredValidator};
