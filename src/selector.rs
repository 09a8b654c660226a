//! Translation of source label selectors into canonical selector
//! expressions, e.g. `env == 'prod' && has(app)`.

use crate::error::ConversionError;
use crate::kube::{LabelSelector, SelectorOperator, SelectorRequirement};

/// Translate a label selector into a selector expression. An empty selector
/// selects everything and translates to `all()`.
pub fn selector_expression(selector: &LabelSelector) -> Result<String, ConversionError> {
    selector_expression_with_prefix(selector, "")
}

/// Same as [`selector_expression`], with `prefix` prepended to every label
/// key. Used where a selector must match labels that conversion has
/// namespaced away from workload labels, e.g. the `kns.` labels a namespace
/// profile applies.
pub fn selector_expression_with_prefix(
    selector: &LabelSelector,
    prefix: &str,
) -> Result<String, ConversionError> {
    if selector.is_empty() {
        return Ok("all()".to_string());
    }

    let mut conjuncts = Vec::new();

    // BTreeMap iteration keeps the expression stable across conversions.
    for (key, value) in &selector.match_labels {
        conjuncts.push(format!("{}{} == '{}'", prefix, key, value));
    }
    for requirement in &selector.match_expressions {
        conjuncts.push(requirement_expression(requirement, prefix)?);
    }

    Ok(conjuncts.join(" && "))
}

fn requirement_expression(
    requirement: &SelectorRequirement,
    prefix: &str,
) -> Result<String, ConversionError> {
    match requirement.operator {
        SelectorOperator::In => Ok(format!(
            "{}{} in {{ {} }}",
            prefix,
            requirement.key,
            quoted_values(requirement)?
        )),
        SelectorOperator::NotIn => Ok(format!(
            "{}{} not in {{ {} }}",
            prefix,
            requirement.key,
            quoted_values(requirement)?
        )),
        SelectorOperator::Exists => {
            require_no_values(requirement)?;
            Ok(format!("has({}{})", prefix, requirement.key))
        }
        SelectorOperator::DoesNotExist => {
            require_no_values(requirement)?;
            Ok(format!("!has({}{})", prefix, requirement.key))
        }
    }
}

fn quoted_values(requirement: &SelectorRequirement) -> Result<String, ConversionError> {
    if requirement.values.is_empty() {
        return Err(ConversionError::InvalidSelector(format!(
            "operator {:?} requires at least one value for key {}",
            requirement.operator, requirement.key
        )));
    }
    let quoted: Vec<String> = requirement
        .values
        .iter()
        .map(|value| format!("'{}'", value))
        .collect();
    Ok(quoted.join(", "))
}

fn require_no_values(requirement: &SelectorRequirement) -> Result<(), ConversionError> {
    if requirement.values.is_empty() {
        Ok(())
    } else {
        Err(ConversionError::InvalidSelector(format!(
            "operator {:?} takes no values for key {}",
            requirement.operator, requirement.key
        )))
    }
}
