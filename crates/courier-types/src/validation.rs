//! Configuration validation for pluggable implementations.
//!
//! Each feed implementation is configured by a free-form TOML table. Before a
//! feed is built, its table is checked against the implementation's `Schema`:
//! required keys must be present, every known key must have the right type,
//! and optional per-field validators can enforce value constraints.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// A required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// A field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// A field has the wrong type.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// A strict schema received a key it does not know.
	#[error("Unknown field: {0}")]
	UnknownField(String),
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	/// Array whose elements all have the inner type.
	Array(Box<FieldType>),
	/// Nested table with its own schema.
	Table(Schema),
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
			FieldType::Array(_) => "array",
			FieldType::Table(_) => "table",
		}
	}
}

/// Custom check run after type validation succeeds.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Attaches a custom validator returning an error message on failure.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, path: &str, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(path, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: path.to_string(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Validation schema for a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
	/// Reject keys that are neither required nor optional.
	pub strict: bool,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self {
			required,
			optional,
			strict: false,
		}
	}

	/// Makes the schema reject unknown keys, catching typos in configuration.
	pub fn strict(mut self) -> Self {
		self.strict = true;
		self
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		self.validate_at("", config)
	}

	fn validate_at(&self, prefix: &str, config: &toml::Value) -> Result<(), ValidationError> {
		let path = |name: &str| {
			if prefix.is_empty() {
				name.to_string()
			} else {
				format!("{}.{}", prefix, name)
			}
		};

		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: if prefix.is_empty() {
					"root".to_string()
				} else {
					prefix.to_string()
				},
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(path(&field.name)))?;
			field.check(&path(&field.name), value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(&path(&field.name), value)?;
			}
		}

		if self.strict {
			let known = self.required.iter().chain(&self.optional);
			let known: Vec<&str> = known.map(|f| f.name.as_str()).collect();
			if let Some(unknown) = table.keys().find(|k| !known.contains(&k.as_str())) {
				return Err(ValidationError::UnknownField(path(unknown)));
			}
		}

		Ok(())
	}
}

fn validate_field_type(
	path: &str,
	value: &toml::Value,
	expected: &FieldType,
) -> Result<(), ValidationError> {
	let mismatch = || ValidationError::TypeMismatch {
		field: path.to_string(),
		expected: expected.name().to_string(),
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch());
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_integer().ok_or_else(mismatch)?;
			if let Some(min) = min {
				if int_val < *min {
					return Err(ValidationError::InvalidValue {
						field: path.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min),
					});
				}
			}
			if let Some(max) = max {
				if int_val > *max {
					return Err(ValidationError::InvalidValue {
						field: path.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max),
					});
				}
			}
		},
		FieldType::Array(inner) => {
			let items = value.as_array().ok_or_else(mismatch)?;
			for (i, item) in items.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", path, i), item, inner)?;
			}
		},
		FieldType::Table(schema) => schema.validate_at(path, value)?,
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
