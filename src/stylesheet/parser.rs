use crate::error::{Result, UnitError};
use crate::stylesheet::types::{
	AtRule, Block, Declaration, IdAllocator, Node, NodeData, StyleRule, Stylesheet,
};
use cssparser::{ParseError, Parser, ParserInput, Token};

/// Parse stylesheet text into a lossless node tree.
///
/// Only the block structure is recognized: rules, at-rules, declarations and
/// comments. Selectors, values and parameters are kept as raw text; the
/// tokenizer treats strings, escapes, comments and `()`/`[]`/`{}` blocks
/// inside them as opaque.
pub fn parse_stylesheet(input: &str) -> Result<Stylesheet> {
	let mut parser_input = ParserInput::new(input);
	let mut parser = Parser::new(&mut parser_input);
	let mut builder = TreeBuilder {
		input,
		ids: IdAllocator::default(),
	};
	let (nodes, after) = builder.parse_nodes(&mut parser, false)?;
	Ok(Stylesheet::from_parts(nodes, after, builder.ids))
}

/// Where a statement's text stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementEnd {
	/// A `;` at byte `usize` was consumed.
	Semicolon(usize),
	/// A `{` at byte `usize` opened a block that has not been entered yet.
	Block(usize),
	/// End of input, end of the enclosing block, or a stray `}`.
	Eof(usize),
}

impl StatementEnd {
	fn offset(self) -> usize {
		match self {
			StatementEnd::Semicolon(offset) | StatementEnd::Block(offset) | StatementEnd::Eof(offset) => {
				offset
			}
		}
	}
}

struct TreeBuilder<'a> {
	input: &'a str,
	ids: IdAllocator,
}

impl TreeBuilder<'_> {
	fn node(&mut self, before: String, data: NodeData) -> Node {
		Node {
			id: self.ids.next_id(),
			before,
			data,
		}
	}

	/// Parse nodes until the end of the current block (or of the input at
	/// the top level). Returns the nodes and the trailing raw text.
	fn parse_nodes<'i>(
		&mut self,
		parser: &mut Parser<'i, '_>,
		nested: bool,
	) -> Result<(Vec<Node>, String)> {
		let mut nodes = Vec::new();
		let mut before = String::new();

		loop {
			let state = parser.state();
			let start = parser.position();
			let token = match parser.next_including_whitespace_and_comments() {
				Ok(token) => token.clone(),
				Err(_) => return Ok((nodes, before)),
			};

			match token {
				// Stray semicolons carry no meaning; keep them as raw text.
				Token::WhiteSpace(_) | Token::Semicolon => before.push_str(parser.slice_from(start)),
				Token::Comment(_) => {
					let text = parser.slice_from(start);
					if text.len() < 4 || !text.ends_with("*/") {
						return Err(parse_error(start.byte_index(), "unclosed comment"));
					}
					let data = NodeData::Comment(text.to_string());
					nodes.push(self.node(std::mem::take(&mut before), data));
				}
				Token::CloseCurlyBracket if !nested => {
					return Err(parse_error(start.byte_index(), "unexpected '}'"));
				}
				Token::AtKeyword(_) => {
					let at_rule = self.parse_at_rule(parser, start.byte_index())?;
					nodes.push(self.node(std::mem::take(&mut before), NodeData::AtRule(at_rule)));
				}
				_ => {
					parser.reset(&state);
					let data = self.parse_statement(parser)?;
					nodes.push(self.node(std::mem::take(&mut before), data));
				}
			}
		}
	}

	/// Parse the children of the block whose `{` was just consumed.
	fn parse_block<'i>(&mut self, parser: &mut Parser<'i, '_>, open: usize) -> Result<Block> {
		let parsed = parser.parse_nested_block(|inner| {
			let result = self.parse_nodes(inner, true);
			let end = inner.position().byte_index();
			Ok::<_, ParseError<'i, ()>>((result, end))
		});
		let (result, end) = parsed.map_err(|_| parse_error(open, "malformed block"))?;
		let (children, after) = result?;

		// A closed block has consumed its `}`.
		if parser.position().byte_index() <= end {
			return Err(parse_error(open, "unclosed block"));
		}

		Ok(Block { children, after })
	}

	fn parse_at_rule<'i>(&mut self, parser: &mut Parser<'i, '_>, start: usize) -> Result<AtRule> {
		let name = self.input[start + 1..parser.position().byte_index()].to_string();

		let state = parser.state();
		let ws_start = parser.position();
		let after_name = if matches!(
			parser.next_including_whitespace_and_comments(),
			Ok(Token::WhiteSpace(_))
		) {
			parser.slice_from(ws_start).to_string()
		} else {
			parser.reset(&state);
			String::new()
		};

		let params_start = parser.position().byte_index();
		let (end, _) = scan_statement(parser);
		let (params, between) = split_trailing_whitespace(&self.input[params_start..end.offset()]);

		let mut at_rule = AtRule {
			name,
			after_name,
			params,
			between,
			block: None,
			semicolon: false,
		};

		match end {
			StatementEnd::Block(open) => at_rule.block = Some(self.parse_block(parser, open)?),
			StatementEnd::Semicolon(_) => at_rule.semicolon = true,
			StatementEnd::Eof(_) => {}
		}

		Ok(at_rule)
	}

	/// A rule (`selector { ... }`) or a declaration (`prop: value;`).
	fn parse_statement<'i>(&mut self, parser: &mut Parser<'i, '_>) -> Result<NodeData> {
		let start = parser.position().byte_index();
		let (end, colon) = scan_statement(parser);
		let text = &self.input[start..end.offset()];

		if let StatementEnd::Block(open) = end {
			let (selector, between) = split_trailing_whitespace(text);
			let block = self.parse_block(parser, open)?;
			return Ok(NodeData::Rule(StyleRule {
				selector,
				between,
				block,
			}));
		}

		let colon = colon
			.map(|offset| offset - start)
			.ok_or_else(|| parse_error(start, "expected ':' in declaration"))?;

		let prop = text[..colon].trim_end();
		if prop.is_empty() {
			return Err(parse_error(start, "empty property name"));
		}

		let after_colon = &text[colon + 1..];
		let value_start = colon + 1 + (after_colon.len() - after_colon.trim_start().len());
		let (value, trailing) = split_trailing_whitespace(&text[value_start..]);

		Ok(NodeData::Declaration(Declaration {
			prop: prop.to_string(),
			between: text[prop.len()..value_start].to_string(),
			value,
			trailing,
			semicolon: matches!(end, StatementEnd::Semicolon(_)),
		}))
	}
}

/// Consume tokens up to the first top-level `;` or `{` block. A custom
/// property (`--name: ...`) keeps `{}` blocks as part of its value.
fn scan_statement(parser: &mut Parser<'_, '_>) -> (StatementEnd, Option<usize>) {
	let mut colon = None;
	let mut custom_property = false;
	let mut first = true;

	loop {
		let state = parser.state();
		let token = match parser.next_including_whitespace_and_comments() {
			Ok(token) => token.clone(),
			Err(_) => return (StatementEnd::Eof(parser.position().byte_index()), colon),
		};
		// Every token that ends or splits a statement is one byte long. The
		// position is read after `next` because a pending block is only
		// skipped by the following call.
		let offset = parser.position().byte_index() - 1;

		match token {
			Token::Ident(name) if first && name.starts_with("--") => custom_property = true,
			Token::Colon if colon.is_none() => colon = Some(offset),
			Token::Semicolon => return (StatementEnd::Semicolon(offset), colon),
			Token::CurlyBracketBlock if !(custom_property && colon.is_some()) => {
				return (StatementEnd::Block(offset), colon);
			}
			Token::CloseCurlyBracket => {
				parser.reset(&state);
				return (StatementEnd::Eof(offset), colon);
			}
			_ => {}
		}
		first = false;
	}
}

fn parse_error(offset: usize, message: &str) -> UnitError {
	UnitError::StylesheetParse {
		offset,
		message: message.to_string(),
	}
}

fn split_trailing_whitespace(text: &str) -> (String, String) {
	let trimmed = text.trim_end();
	(trimmed.to_string(), text[trimmed.len()..].to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn round_trip(input: &str) {
		let sheet = parse_stylesheet(input).unwrap();
		assert_eq!(sheet.to_string(), input);
	}

	#[test]
	fn test_round_trip_preserves_text() {
		round_trip("div { width: 100px; }");
		round_trip("a{color:red}");
		round_trip("  /* lead */\n.a ,.b {\n  margin : 0 auto ;\n  /* inner */\n}\n\n");
		round_trip("@media (max-width: 600px) { div { width: 100px; } }");
		round_trip("@import url(\"a;b.css\");\n@charset 'utf-8';");
		round_trip(".x { content: \"a { b } ; c\"; background: url(data:image/png;base64,AA==); }");
		round_trip("a { b: 1px;; }");
		round_trip("");
	}

	#[test]
	fn test_parse_declarations() {
		let sheet = parse_stylesheet("div { width: 100px; height : 2em }").unwrap();
		let decls = sheet.declarations();
		assert_eq!(decls.len(), 2);

		assert_eq!(decls[0].prop, "width");
		assert_eq!(decls[0].between, ": ");
		assert_eq!(decls[0].value, "100px");
		assert!(decls[0].semicolon);

		assert_eq!(decls[1].prop, "height");
		assert_eq!(decls[1].between, " : ");
		assert_eq!(decls[1].value, "2em");
		assert_eq!(decls[1].trailing, " ");
		assert!(!decls[1].semicolon);
	}

	#[test]
	fn test_parse_at_rules() {
		let sheet =
			parse_stylesheet("@media screen and (min-width: 10px) { a { b: 1px } }").unwrap();
		let at_rules = sheet.at_rules();
		assert_eq!(at_rules.len(), 1);
		assert_eq!(at_rules[0].name, "media");
		assert_eq!(at_rules[0].params, "screen and (min-width: 10px)");
		assert_eq!(sheet.declarations().len(), 1);
	}

	#[test]
	fn test_custom_property_block_is_a_value() {
		let input = ".a { --mixin: { width: 1px }; width: 1px }";
		let sheet = parse_stylesheet(input).unwrap();
		assert_eq!(sheet.to_string(), input);

		let decls = sheet.declarations();
		assert_eq!(decls.len(), 2);
		assert_eq!(decls[0].prop, "--mixin");
		assert_eq!(decls[0].value, "{ width: 1px }");
		assert!(decls[0].semicolon);
		assert_eq!(decls[1].prop, "width");

		// No nested rule was created for the block.
		let NodeData::Rule(rule) = &sheet.nodes[0].data else {
			panic!("expected a rule");
		};
		assert!(rule
			.block
			.children
			.iter()
			.all(|child| matches!(child.data, NodeData::Declaration(_))));
	}

	#[test]
	fn test_function_values_are_complete() {
		let sheet = parse_stylesheet("a { b: calc(1px + 2px); c: var(--x) 1px; --d: { e: 1px }; f: 2px }").unwrap();
		let values: Vec<&str> = sheet.declarations().iter().map(|d| d.value.as_str()).collect();
		assert_eq!(values, vec!["calc(1px + 2px)", "var(--x) 1px", "{ e: 1px }", "2px"]);
	}

	#[test]
	fn test_nested_brackets_in_values() {
		round_trip("a { grid-template-areas: [a] \"b\"; b: calc((1px + 2px) * 3) }");
		round_trip("a:hover { b: 1px } @supports (display: grid) { a { b: 1px } }");
	}

	#[test]
	fn test_node_ids_are_unique() {
		let sheet = parse_stylesheet("a { b: 1px; c: 2px } d { e: 3px }").unwrap();
		let mut ids = Vec::new();
		for node in &sheet.nodes {
			ids.push(node.id);
			if let NodeData::Rule(rule) = &node.data {
				ids.extend(rule.block.children.iter().map(|child| child.id));
			}
		}
		let count = ids.len();
		ids.sort();
		ids.dedup();
		assert_eq!(ids.len(), count);
	}

	#[test]
	fn test_parse_errors() {
		assert!(matches!(
			parse_stylesheet("a { b: 1px"),
			Err(UnitError::StylesheetParse { .. })
		));
		assert!(matches!(
			parse_stylesheet("a { b: 1px } }"),
			Err(UnitError::StylesheetParse { .. })
		));
		assert!(matches!(
			parse_stylesheet("a { width }"),
			Err(UnitError::StylesheetParse { .. })
		));
		assert!(matches!(
			parse_stylesheet("/* open"),
			Err(UnitError::StylesheetParse { .. })
		));
	}
}
