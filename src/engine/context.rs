use crate::stylesheet::NodeId;
use std::collections::HashSet;
use std::path::Path;

/// Counts of what one pass over a stylesheet changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
	/// The document matched the exclude rule and was left alone.
	pub excluded: bool,

	/// Declarations whose value was replaced in place.
	pub declarations_rewritten: usize,

	/// Declarations that received a rewritten sibling copy.
	pub declarations_cloned: usize,

	/// At-rules whose parameters were rewritten.
	pub at_rules_rewritten: usize,
}

impl ProcessReport {
	/// Whether the pass touched the document at all.
	pub fn changed(&self) -> bool {
		self.declarations_rewritten + self.declarations_cloned + self.at_rules_rewritten > 0
	}
}

/// State scoped to one pass over one document.
///
/// Tracks which nodes were already rewritten so a node, or the copy inserted
/// next to it, is never rewritten twice. A fresh context is created per pass
/// and never shared between documents.
#[derive(Debug)]
pub struct PassContext<'a> {
	file: Option<&'a Path>,
	processed: HashSet<NodeId>,
	report: ProcessReport,
}

impl<'a> PassContext<'a> {
	pub fn new(file: Option<&'a Path>, excluded: bool) -> Self {
		PassContext {
			file,
			processed: HashSet::new(),
			report: ProcessReport {
				excluded,
				..ProcessReport::default()
			},
		}
	}

	pub fn file(&self) -> Option<&'a Path> {
		self.file
	}

	pub fn is_excluded(&self) -> bool {
		self.report.excluded
	}

	pub fn is_processed(&self, id: NodeId) -> bool {
		self.processed.contains(&id)
	}

	/// Set the marker on `id`.
	pub fn mark(&mut self, id: NodeId) {
		self.processed.insert(id);
	}

	pub fn report_mut(&mut self) -> &mut ProcessReport {
		&mut self.report
	}

	pub fn into_report(self) -> ProcessReport {
		self.report
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stylesheet::IdAllocator;

	#[test]
	fn test_marker_is_per_pass() {
		let mut ids = IdAllocator::default();
		let id = ids.next_id();

		let mut first = PassContext::new(None, false);
		assert!(!first.is_processed(id));
		first.mark(id);
		assert!(first.is_processed(id));

		let second = PassContext::new(None, false);
		assert!(!second.is_processed(id));
	}

	#[test]
	fn test_report_changed() {
		let mut pass = PassContext::new(Some(Path::new("a.css")), false);
		assert!(!pass.report_mut().changed());
		pass.report_mut().at_rules_rewritten += 1;
		assert_eq!(pass.file(), Some(Path::new("a.css")));
		assert!(pass.into_report().changed());
	}
}
