//! Processors that can be selected from a config file.

use crate::rules::rewriter::{NodeContext, Processor, ProcessorError, Scalar, TransformResult};

/// Multiplies values of selected units by a constant factor, optionally
/// switching them to another unit (e.g. `px` to `rem` with factor `1/16`).
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleProcessor {
	pub factor: f64,

	/// Units to scale. Empty means every unit.
	pub units: Vec<String>,

	/// Unit written in place of the original one.
	pub to: Option<String>,
}

impl ScaleProcessor {
	pub fn new(factor: f64) -> Self {
		ScaleProcessor {
			factor,
			units: Vec::new(),
			to: None,
		}
	}

	fn applies_to(&self, unit: &str) -> bool {
		self.units.is_empty() || self.units.iter().any(|u| u == unit)
	}
}

impl Processor for ScaleProcessor {
	fn process(
		&self,
		value: f64,
		unit: &str,
		_node: &NodeContext<'_>,
	) -> Result<TransformResult, ProcessorError> {
		if !self.applies_to(unit) {
			return Ok(TransformResult::Unrecognized);
		}

		Ok(TransformResult::Shaped {
			value: Some(Scalar::Number(value * self.factor)),
			unit: self.to.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_scale_all_units() {
		let scale = ScaleProcessor::new(2.0);
		let result = scale.process(10.0, "em", &NodeContext::detached()).unwrap();
		assert_eq!(result.normalize(10.0, "em"), (20.0, "em".to_string()));
	}

	#[test]
	fn test_scale_selected_units_to_new_unit() {
		let scale = ScaleProcessor {
			factor: 0.0625,
			units: vec!["px".to_string()],
			to: Some("rem".to_string()),
		};

		let px = scale.process(32.0, "px", &NodeContext::detached()).unwrap();
		assert_eq!(px.normalize(32.0, "px"), (2.0, "rem".to_string()));

		let em = scale.process(3.0, "em", &NodeContext::detached()).unwrap();
		assert_eq!(em, TransformResult::Unrecognized);
	}
}
