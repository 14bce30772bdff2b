use std::fmt;

/// Identity of a node, unique within one stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Hands out fresh node ids.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
	next: u32,
}

impl IdAllocator {
	pub fn next_id(&mut self) -> NodeId {
		let id = NodeId(self.next);
		self.next += 1;
		id
	}
}

/// A parsed stylesheet. Printing it reproduces the source text, including
/// whitespace and comments, apart from any values that were changed.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
	pub nodes: Vec<Node>,

	/// Whitespace after the last node.
	pub after: String,

	ids: IdAllocator,
}

impl Stylesheet {
	pub(crate) fn from_parts(nodes: Vec<Node>, after: String, ids: IdAllocator) -> Self {
		Stylesheet { nodes, after, ids }
	}

	/// Split borrow of the top-level nodes and the id allocator.
	pub fn parts_mut(&mut self) -> (&mut Vec<Node>, &mut IdAllocator) {
		(&mut self.nodes, &mut self.ids)
	}

	/// All declarations in document order, including nested ones.
	pub fn declarations(&self) -> Vec<&Declaration> {
		let mut out = Vec::new();
		collect_declarations(&self.nodes, &mut out);
		out
	}

	/// All at-rules in document order, including nested ones.
	pub fn at_rules(&self) -> Vec<&AtRule> {
		let mut out = Vec::new();
		collect_at_rules(&self.nodes, &mut out);
		out
	}
}

fn collect_declarations<'a>(nodes: &'a [Node], out: &mut Vec<&'a Declaration>) {
	for node in nodes {
		match &node.data {
			NodeData::Declaration(decl) => out.push(decl),
			NodeData::Rule(rule) => collect_declarations(&rule.block.children, out),
			NodeData::AtRule(at_rule) => {
				if let Some(block) = &at_rule.block {
					collect_declarations(&block.children, out);
				}
			}
			NodeData::Comment(_) => {}
		}
	}
}

fn collect_at_rules<'a>(nodes: &'a [Node], out: &mut Vec<&'a AtRule>) {
	for node in nodes {
		match &node.data {
			NodeData::Rule(rule) => collect_at_rules(&rule.block.children, out),
			NodeData::AtRule(at_rule) => {
				out.push(at_rule);
				if let Some(block) = &at_rule.block {
					collect_at_rules(&block.children, out);
				}
			}
			NodeData::Declaration(_) | NodeData::Comment(_) => {}
		}
	}
}

/// One node with the whitespace that precedes it.
#[derive(Debug, Clone)]
pub struct Node {
	pub id: NodeId,
	pub before: String,
	pub data: NodeData,
}

#[derive(Debug, Clone)]
pub enum NodeData {
	Declaration(Declaration),
	Rule(StyleRule),
	AtRule(AtRule),
	/// Comment text including the `/*` and `*/` delimiters.
	Comment(String),
}

/// `prop: value;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
	pub prop: String,

	/// Everything between the property and the value, colon included.
	pub between: String,

	pub value: String,

	/// Whitespace between the value and the terminating `;`.
	pub trailing: String,

	/// Whether the declaration is terminated by `;`.
	pub semicolon: bool,
}

/// `selector { ... }`
#[derive(Debug, Clone)]
pub struct StyleRule {
	pub selector: String,
	pub between: String,
	pub block: Block,
}

/// `@name params { ... }` or `@name params;`
#[derive(Debug, Clone)]
pub struct AtRule {
	pub name: String,
	pub after_name: String,
	pub params: String,
	pub between: String,
	pub block: Option<Block>,
	pub semicolon: bool,
}

/// The children of a `{ }` block.
#[derive(Debug, Clone, Default)]
pub struct Block {
	pub children: Vec<Node>,

	/// Whitespace before the closing `}`.
	pub after: String,
}

impl fmt::Display for Stylesheet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for node in &self.nodes {
			write!(f, "{node}")?;
		}
		f.write_str(&self.after)
	}
}

impl fmt::Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.before)?;
		match &self.data {
			NodeData::Declaration(decl) => write!(f, "{decl}"),
			NodeData::Rule(rule) => write!(f, "{}{}{}", rule.selector, rule.between, rule.block),
			NodeData::AtRule(at_rule) => write!(f, "{at_rule}"),
			NodeData::Comment(text) => f.write_str(text),
		}
	}
}

impl fmt::Display for Declaration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}{}{}", self.prop, self.between, self.value, self.trailing)?;
		if self.semicolon {
			f.write_str(";")?;
		}
		Ok(())
	}
}

impl fmt::Display for AtRule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "@{}{}{}{}", self.name, self.after_name, self.params, self.between)?;
		if let Some(block) = &self.block {
			write!(f, "{block}")?;
		} else if self.semicolon {
			f.write_str(";")?;
		}
		Ok(())
	}
}

impl fmt::Display for Block {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		for node in &self.children {
			write!(f, "{node}")?;
		}
		write!(f, "{}}}", self.after)
	}
}
