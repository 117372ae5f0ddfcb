//! User-code preservation across regenerations.
//!
//! Hand-written code lives between a begin and an end marker keyed by the
//! handler method name. Both markers use the comment leader of the generated
//! language (`//` or `#`), indented like the surrounding code:
//!
//! ```text
//!         // -- BEGIN USER CODE: get_owner --
//!         // DEFAULT USER CODE: get_owner
//!         <generated placeholder>
//!         // -- END USER CODE: get_owner --
//! ```
//!
//! A block whose body still carries the default marker is regenerable; once
//! the marker line is removed the block is custom and is carried over into
//! every future rendering. The source is lexed line by line into [`Token`]s
//! and parsed into [`Segment`]s; no regular expressions are involved.
//!
//! Injection rules for every block of a fresh rendering:
//!
//! | prior block | fresh block | result                                   |
//! |-------------|-------------|------------------------------------------|
//! | none        | any         | fresh block                              |
//! | default     | default     | fresh block (formatting drift corrected) |
//! | custom      | default     | prior body, re-indented                  |
//! | any         | custom      | fresh block (template author's code)     |
//!
//! Prior blocks whose method is gone are appended to the end of the file
//! under [`UNMATCHED_HEADER`].

use std::fmt;
use tracing::warn;

const BEGIN_TAG: &str = "-- BEGIN USER CODE: ";
const END_TAG: &str = "-- END USER CODE: ";
const MARKER_CLOSE: &str = " --";
const DEFAULT_TAG: &str = "DEFAULT USER CODE: ";

/// Introduces the trailer holding blocks without a matching method.
pub const UNMATCHED_HEADER: &str = "--- Unmatched user code blocks from previous version ---";

/// Comment syntax a marker is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentLeader {
    Slashes,
    Hash,
}

impl CommentLeader {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentLeader::Slashes => "//",
            CommentLeader::Hash => "#",
        }
    }

    /// Split a comment line into its leader and the comment text.
    fn strip(line: &str) -> Option<(CommentLeader, &str)> {
        if let Some(rest) = line.strip_prefix("//") {
            Some((CommentLeader::Slashes, rest.strip_prefix(' ')?))
        } else {
            line.strip_prefix('#')
                .and_then(|rest| rest.strip_prefix(' '))
                .map(|rest| (CommentLeader::Hash, rest))
        }
    }
}

impl fmt::Display for CommentLeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_method_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// One lexed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Any line that is not a marker, newline included
    Text(&'a str),
    Begin {
        indent: &'a str,
        leader: CommentLeader,
        method: &'a str,
        line: &'a str,
    },
    End {
        method: &'a str,
        line: &'a str,
    },
}

fn marker<'a>(content: &'a str, tag: &str) -> Option<(CommentLeader, &'a str)> {
    let (leader, text) = CommentLeader::strip(content)?;
    let method = text.strip_prefix(tag)?.strip_suffix(MARKER_CLOSE)?;
    is_method_name(method).then_some((leader, method))
}

fn lex_line(line: &str) -> Token<'_> {
    let content = line.trim_end_matches(['\n', '\r']).trim_end();
    let trimmed = content.trim_start();
    let indent = &content[..content.len() - trimmed.len()];
    if let Some((leader, method)) = marker(trimmed, BEGIN_TAG) {
        return Token::Begin {
            indent,
            leader,
            method,
            line,
        };
    }
    if let Some((_, method)) = marker(trimmed, END_TAG) {
        return Token::End { method, line };
    }
    Token::Text(line)
}

/// Lex `source` into one token per line.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    source.split_inclusive('\n').map(lex_line).collect()
}

/// Method named by a default marker line, if `line` is one.
fn default_marker(line: &str) -> Option<&str> {
    let (_, text) = CommentLeader::strip(line.trim())?;
    let method = text.strip_prefix(DEFAULT_TAG)?.trim_end();
    is_method_name(method).then_some(method)
}

/// A delimited span of implementation code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCodeBlock {
    pub method: String,
    /// Indentation of the begin marker
    pub indent: String,
    pub leader: CommentLeader,
    /// Lines between the markers, verbatim
    pub body: String,
    /// Whether the body still carries the default marker
    pub is_default: bool,
}

impl UserCodeBlock {
    /// Body moved from this block's indentation to `indent`, relative
    /// indentation kept.
    pub fn reindented_body(&self, indent: &str) -> String {
        let mut out = String::with_capacity(self.body.len());
        for line in self.body.split_inclusive('\n') {
            if line.trim().is_empty() {
                out.push_str(if line.ends_with('\n') { "\n" } else { "" });
                continue;
            }
            let rest = line
                .strip_prefix(self.indent.as_str())
                .unwrap_or_else(|| line.trim_start());
            out.push_str(indent);
            out.push_str(rest);
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// The whole block, markers included, at `indent`.
    pub fn render(&self, indent: &str, leader: CommentLeader) -> String {
        format!(
            "{indent}{leader} {BEGIN_TAG}{method}{MARKER_CLOSE}\n{body}{indent}{leader} {END_TAG}{method}{MARKER_CLOSE}\n",
            indent = indent,
            leader = leader,
            method = self.method,
            body = self.reindented_body(indent),
        )
    }
}

/// A parsed source file: plain text and user-code blocks, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Block {
        block: UserCodeBlock,
        /// The end marker line as written
        end_line: String,
    },
}

struct OpenBlock<'a> {
    indent: &'a str,
    leader: CommentLeader,
    method: &'a str,
    begin_line: &'a str,
    body: String,
}

impl OpenBlock<'_> {
    /// An unterminated block is kept as plain text.
    fn abandon(self, segments: &mut Vec<Segment>) {
        warn!(method = %self.method, "user code block without end marker, kept as plain text");
        push_text(segments, self.begin_line);
        push_text(segments, &self.body);
    }
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(Segment::Text(existing)) => existing.push_str(text),
        _ => segments.push(Segment::Text(text.to_string())),
    }
}

/// Parse `source` into text and user-code blocks.
///
/// An end marker must name the method of the open block; any other end
/// marker is plain text. A begin marker inside an open block abandons the
/// open one, as does the end of input.
pub fn parse(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut open: Option<OpenBlock<'_>> = None;

    for token in tokenize(source) {
        match token {
            Token::Begin {
                indent,
                leader,
                method,
                line,
            } => {
                if let Some(previous) = open.take() {
                    previous.abandon(&mut segments);
                }
                open = Some(OpenBlock {
                    indent,
                    leader,
                    method,
                    begin_line: line,
                    body: String::new(),
                });
            }
            Token::End { method, line } if open.as_ref().map(|b| b.method) == Some(method) => {
                if let Some(block) = open.take() {
                    let is_default = block
                        .body
                        .lines()
                        .any(|l| default_marker(l) == Some(block.method));
                    segments.push(Segment::Block {
                        block: UserCodeBlock {
                            method: block.method.to_string(),
                            indent: block.indent.to_string(),
                            leader: block.leader,
                            body: block.body,
                            is_default,
                        },
                        end_line: line.to_string(),
                    });
                }
            }
            Token::Text(line) | Token::End { line, .. } => match open.as_mut() {
                Some(block) => block.body.push_str(line),
                None => push_text(&mut segments, line),
            },
        }
    }
    if let Some(block) = open {
        block.abandon(&mut segments);
    }
    segments
}

/// All complete user-code blocks of `source`, in order. A method appearing
/// twice keeps its last block at the position of its first.
pub fn extract_user_code_blocks(source: &str) -> Vec<UserCodeBlock> {
    let mut blocks: Vec<UserCodeBlock> = Vec::new();
    for segment in parse(source) {
        let Segment::Block { block, .. } = segment else {
            continue;
        };
        match blocks.iter_mut().find(|b| b.method == block.method) {
            Some(existing) => *existing = block,
            None => blocks.push(block),
        }
    }
    blocks
}

/// Result of merging prior blocks into a fresh rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Injection {
    pub text: String,
    /// Methods whose custom body was carried over
    pub preserved: Vec<String>,
    /// Methods whose prior default body was replaced by the fresh default
    pub refreshed: Vec<String>,
    /// Methods whose prior block went to the trailer
    pub unmatched: Vec<String>,
}

/// Merge `prior` blocks into the `rendered` source.
pub fn inject_user_code(rendered: &str, prior: &[UserCodeBlock]) -> Injection {
    let mut injection = Injection::default();
    let mut used = vec![false; prior.len()];

    for segment in parse(rendered) {
        match segment {
            Segment::Text(text) => injection.text.push_str(&text),
            Segment::Block { block, end_line } => {
                let found = prior.iter().position(|p| p.method == block.method);
                if let Some(index) = found {
                    used[index] = true;
                }
                match found.map(|i| &prior[i]) {
                    Some(previous) if block.is_default && !previous.is_default => {
                        injection
                            .text
                            .push_str(&previous.render(&block.indent, block.leader));
                        injection.preserved.push(block.method.clone());
                    }
                    other => {
                        if other.is_some() {
                            injection.refreshed.push(block.method.clone());
                        }
                        injection.text.push_str(&format!(
                            "{}{} {}{}{}\n",
                            block.indent, block.leader, BEGIN_TAG, block.method, MARKER_CLOSE
                        ));
                        injection.text.push_str(&block.body);
                        injection.text.push_str(&end_line);
                    }
                }
            }
        }
    }

    let leftovers: Vec<&UserCodeBlock> = prior
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(block, _)| block)
        .collect();
    if let Some(first) = leftovers.first() {
        if !injection.text.ends_with('\n') {
            injection.text.push('\n');
        }
        injection
            .text
            .push_str(&format!("\n{} {}\n", first.leader, UNMATCHED_HEADER));
        for block in leftovers {
            injection.text.push_str(&block.render(&block.indent, block.leader));
            injection.unmatched.push(block.method.clone());
        }
    }
    injection
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn stub(methods: &[&str]) -> String {
        let mut out = String::from("impl Handler for HandlerImpl {\n");
        for m in methods {
            out.push_str(&format!(
                "    fn {m}(&self) -> Result<(), HandlerError> {{\n        // -- BEGIN USER CODE: {m} --\n        // DEFAULT USER CODE: {m}\n        todo_default()\n        // -- END USER CODE: {m} --\n    }}\n"
            ));
        }
        out.push_str("}\n");
        out
    }

    fn customize(source: &str, method: &str, body: &str) -> String {
        let begin = format!("// -- BEGIN USER CODE: {} --\n", method);
        let end = format!("        // -- END USER CODE: {} --", method);
        let start = source.find(&begin).unwrap() + begin.len();
        let stop = source.find(&end).unwrap();
        format!("{}{}{}", &source[..start], body, &source[stop..])
    }

    #[test]
    fn test_tokenize_recognizes_both_leaders() {
        let tokens = tokenize("  # -- BEGIN USER CODE: a --\nx\n  # -- END USER CODE: a --\n// -- BEGIN USER CODE: b --\n");
        assert!(matches!(
            tokens[0],
            Token::Begin { indent: "  ", leader: CommentLeader::Hash, method: "a", .. }
        ));
        assert_eq!(tokens[1], Token::Text("x\n"));
        assert!(matches!(tokens[2], Token::End { method: "a", .. }));
        assert!(matches!(
            tokens[3],
            Token::Begin { leader: CommentLeader::Slashes, method: "b", .. }
        ));
    }

    #[test]
    fn test_malformed_markers_are_text() {
        for line in [
            "// -- BEGIN USER CODE: --\n",
            "// -- BEGIN USER CODE: a b --\n",
            "//-- BEGIN USER CODE: a --\n",
            "// -- BEGIN USER CODE: a\n",
        ] {
            assert_eq!(tokenize(line), vec![Token::Text(line)]);
        }
    }

    #[test]
    fn test_extract_flags_defaults() {
        let source = customize(&stub(&["get_owner", "delete_owner"]), "delete_owner", "        Ok(())\n");
        let blocks = extract_user_code_blocks(&source);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].method, "get_owner");
        assert!(blocks[0].is_default);
        assert_eq!(blocks[0].indent, "        ");
        assert!(!blocks[1].is_default);
        assert_eq!(blocks[1].body, "        Ok(())\n");
    }

    #[test]
    fn test_unterminated_block_is_plain_text() {
        let source = "a\n// -- BEGIN USER CODE: x --\nbody\n// -- END USER CODE: y --\n";
        assert!(extract_user_code_blocks(source).is_empty());
        assert_eq!(parse(source), vec![Segment::Text(source.to_string())]);
    }

    #[test]
    fn test_fresh_render_is_untouched_without_prior() {
        let fresh = stub(&["a", "b"]);
        let injection = inject_user_code(&fresh, &[]);
        assert_eq!(injection.text, fresh);
        assert!(injection.preserved.is_empty());
    }

    #[test]
    fn test_custom_code_survives_and_defaults_refresh() {
        let custom_body = "        let owner = load()?;\n        if owner.active {\n            return Ok(());\n        }\n\n        Err(gone())\n";
        let previous = customize(&stub(&["get_owner", "delete_owner"]), "get_owner", custom_body);
        // drift in a default block
        let previous = previous.replace("        todo_default()\n", "        todo_default( )\n");
        let prior = extract_user_code_blocks(&previous);

        let fresh = stub(&["get_owner", "delete_owner", "create_owner"]);
        let injection = inject_user_code(&fresh, &prior);
        assert_eq!(injection.preserved, vec!["get_owner"]);
        assert_eq!(injection.refreshed, vec!["delete_owner"]);
        assert!(injection.unmatched.is_empty());
        assert!(injection.text.contains(custom_body));
        assert!(!injection.text.contains("todo_default( )"));
        assert!(injection.text.contains("// DEFAULT USER CODE: create_owner"));

        // stable on a second regeneration
        let again = inject_user_code(&fresh, &extract_user_code_blocks(&injection.text));
        assert_eq!(again.text, injection.text);
    }

    #[test]
    fn test_removed_methods_go_to_trailer() {
        let previous = customize(&stub(&["get_owner", "legacy"]), "legacy", "        old_logic()\n");
        let prior = extract_user_code_blocks(&previous);
        let fresh = stub(&["get_owner"]);
        let injection = inject_user_code(&fresh, &prior);

        assert_eq!(injection.unmatched, vec!["legacy"]);
        let trailer = injection.text.split(UNMATCHED_HEADER).nth(1).unwrap();
        assert!(trailer.contains("        // -- BEGIN USER CODE: legacy --\n        old_logic()\n        // -- END USER CODE: legacy --\n"));

        // the trailer is carried, not duplicated, by the next run
        let next = inject_user_code(&fresh, &extract_user_code_blocks(&injection.text));
        assert_eq!(next.text, injection.text);
        assert_eq!(next.text.matches(UNMATCHED_HEADER).count(), 1);

        // and the block returns home when the method comes back
        let restored = inject_user_code(
            &stub(&["get_owner", "legacy"]),
            &extract_user_code_blocks(&next.text),
        );
        assert!(!restored.text.contains(UNMATCHED_HEADER));
        assert_eq!(restored.preserved, vec!["legacy"]);
    }

    #[test]
    fn test_reindent_keeps_relative_indentation() {
        let block = UserCodeBlock {
            method: "m".to_string(),
            indent: "    ".to_string(),
            leader: CommentLeader::Hash,
            body: "    if x:\n        y()\n\n  z()\n".to_string(),
            is_default: false,
        };
        assert_eq!(block.reindented_body("\t"), "\tif x:\n\t    y()\n\n\tz()\n");
    }
}
