use std::collections::BTreeMap;
use std::path::Path;

use crate::error::LaunchError;
use crate::model::ParamValue;
use crate::schema::Schema;

pub type SuppliedValues = BTreeMap<String, ParamValue>;

pub fn check_schema(schema: &Schema) -> Result<(), LaunchError> {
    for spec in schema.iter() {
        if let Some(default) = spec.default {
            if spec.required {
                return Err(LaunchError::SchemaConflict {
                    name: spec.name.to_string(),
                });
            }
            if default.value_type() != spec.value_type {
                return Err(LaunchError::DefaultTypeMismatch {
                    name: spec.name.to_string(),
                    expected: spec.value_type.as_str(),
                    found: default.value_type().as_str(),
                });
            }
        }

        for target in spec.necessary_if {
            let target_spec = schema
                .get(target)
                .map_err(|_| LaunchError::UnknownDependency {
                    name: spec.name.to_string(),
                    target: target.to_string(),
                })?;
            if !target_spec.is_boolean() {
                return Err(LaunchError::UnsupportedDependency {
                    name: spec.name.to_string(),
                    target: target.to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_invocation(
    schema: &Schema,
    continue_dir: Option<&Path>,
    supplied: &SuppliedValues,
) -> Result<(), LaunchError> {
    let is_set = |name: &str| {
        schema
            .get(name)
            .map(|spec| spec.is_set(supplied.get(name)))
    };

    for (name, value) in supplied {
        if matches!(value, ParamValue::Float(number) if !number.is_finite()) {
            return Err(LaunchError::NonFiniteValue { name: name.clone() });
        }
    }

    if continue_dir.is_some() {
        let mut conflicting = Vec::new();
        for spec in schema.iter() {
            if is_set(spec.name)? {
                conflicting.push(spec.name.to_string());
            }
        }
        if !conflicting.is_empty() {
            return Err(LaunchError::ConflictingMode {
                supplied: conflicting,
            });
        }
        return Ok(());
    }

    for spec in schema.iter() {
        if spec.necessary_if.is_empty() || !is_set(spec.name)? {
            continue;
        }
        for target in spec.necessary_if {
            if !is_set(*target)? {
                return Err(LaunchError::MissingDependency {
                    name: spec.name.to_string(),
                    target: target.to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn check_required(schema: &Schema, supplied: &SuppliedValues) -> Result<(), LaunchError> {
    let missing = schema
        .iter()
        .filter(|spec| spec.required && !supplied.contains_key(spec.name))
        .map(|spec| spec.name.to_string())
        .collect::<Vec<String>>();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LaunchError::MissingRequired { names: missing })
    }
}
