//! Reading tree-set files into a [`TreeSet`].
//!
//! Two layouts are accepted:
//! - NEXUS/BEAST `.trees` files: `Tree <name> = <newick>;` lines, with an
//!   optional `Translate` block mapping numeric taxon ids to labels.
//! - Plain text with one Newick string per line.
//!
//! The Newick dialect is strictly binary with per-node annotations of the
//! form `[theta=<value>]` placed between a node and its `:length`. A
//! leading `&` inside the brackets (BEAST writes `[&...]`) is dropped.
//!
//! Leaf indices come from a single first-seen label map shared by every
//! tree in the file; internal nodes are numbered `num_leaves + postorder
//! counter` once the whole forest is parsed. Together this gives equal
//! topologies equal node indices, which the consensus stage depends on.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::AnalyseError;
use crate::tree::{Node, TreeSet};

/// Reads a tree-set file from disk. Files ending in `.gz` are
/// transparently gunzipped.
pub fn read_tree_set<P: AsRef<Path>>(path: P) -> Result<TreeSet, AnalyseError> {
    let p = path.as_ref();
    let mut content = String::new();
    if p.to_string_lossy().ends_with(".gz") {
        GzDecoder::new(File::open(p)?).read_to_string(&mut content)?;
    } else {
        File::open(p)?.read_to_string(&mut content)?;
    }
    parse_tree_set(&content)
}

/// Parses the textual content of a tree-set file.
pub fn parse_tree_set(content: &str) -> Result<TreeSet, AnalyseError> {
    let translate = parse_translate_block(content);
    let newicks = collect_newick_lines(content);

    let mut labels = LabelMap::default();
    let mut trees = Vec::with_capacity(newicks.len());
    for newick in &newicks {
        let mut parser = NewickParser {
            bytes: newick.as_bytes(),
            pos: 0,
            labels: &mut labels,
            translate: &translate,
        };
        trees.push(parser.parse_tree()?);
    }
    if trees.is_empty() {
        return Err(AnalyseError::EmptyInput);
    }

    // Internal nodes are numbered only now, when the leaf count is final.
    let num_leaves = labels.order.len();
    for tree in &mut trees {
        let mut next = num_leaves;
        number_internal(tree, &mut next);
    }

    Ok(TreeSet {
        trees,
        labels: labels.order,
    })
}

fn number_internal(node: &mut Node, next: &mut usize) {
    if let Some((left, right)) = node.children_mut() {
        number_internal(left, next);
        number_internal(right, next);
        node.index = *next;
        *next += 1;
    }
}

/// Pulls the Newick payloads out of the file, NEXUS `Tree` lines first,
/// falling back to one-Newick-per-line.
fn collect_newick_lines(content: &str) -> Vec<&str> {
    let nexus: Vec<&str> = content
        .lines()
        .skip_while(|line| !line.trim().to_ascii_uppercase().starts_with("TREE "))
        .take_while(|line| !line.trim().to_ascii_uppercase().starts_with("END;"))
        .filter_map(|line| line.splitn(2, '=').nth(1))
        .map(|body| {
            // BEAST writes a rootedness marker ([&R] / [&U]) before the
            // Newick proper.
            let body = body.trim();
            match body.strip_prefix('[') {
                Some(rest) => rest.split_once(']').map_or(body, |(_, after)| after.trim_start()),
                None => body,
            }
        })
        .collect();
    if !nexus.is_empty() {
        return nexus;
    }
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| line.starts_with('('))
        .collect()
}

/// Parses the optional NEXUS `Translate` block.
///
/// ```text
/// Translate
///    1 'A',
///    2 'B';
/// ```
fn parse_translate_block(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let mut in_block = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if !in_block {
            in_block = trimmed.to_ascii_uppercase().starts_with("TRANSLATE");
            continue;
        }
        if trimmed.starts_with(';') {
            break;
        }
        let entry = trimmed.trim_end_matches([',', ';']);
        let mut parts = entry.split_whitespace();
        if let (Some(id), Some(label)) = (parts.next(), parts.next()) {
            map.insert(id.to_string(), label.trim_matches('\'').to_string());
        }
        // The terminator may sit on the last entry line.
        if trimmed.ends_with(';') {
            break;
        }
    }
    map
}

/// First-seen interning of leaf labels; the intern index is the leaf's
/// node index in every tree of the set.
#[derive(Default)]
struct LabelMap {
    order: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelMap {
    fn intern(&mut self, label: &str) -> usize {
        if let Some(&idx) = self.index.get(label) {
            return idx;
        }
        let idx = self.order.len();
        self.order.push(label.to_string());
        self.index.insert(label.to_string(), idx);
        idx
    }
}

/// Recursive-descent parser for one annotated Newick string.
struct NewickParser<'a> {
    bytes: &'a [u8],
    pos: usize,
    labels: &'a mut LabelMap,
    translate: &'a HashMap<String, String>,
}

impl NewickParser<'_> {
    fn parse_tree(&mut self) -> Result<Node, AnalyseError> {
        let root = self.parse_clade()?;
        self.skip_ws();
        if self.peek() == Some(b';') {
            self.pos += 1;
        }
        self.skip_ws();
        if self.pos != self.bytes.len() {
            return Err(AnalyseError::newick(self.pos, "trailing characters"));
        }
        Ok(root)
    }

    fn parse_clade(&mut self) -> Result<Node, AnalyseError> {
        self.skip_ws();
        let mut node = if self.peek() == Some(b'(') {
            self.pos += 1;
            let left = self.parse_clade()?;
            self.expect(b',')?;
            let right = self.parse_clade()?;
            self.expect(b')')?;
            // Index is assigned later, when the leaf count is known.
            Node::internal(0, 0.0, "", left, right)
        } else {
            let label = self.parse_label()?;
            let index = self.labels.intern(&self.resolve_label(&label)?);
            Node::leaf(index, 0.0, "")
        };

        self.skip_ws();
        if self.peek() == Some(b'[') {
            node.metadata = self.parse_annotation()?;
            self.skip_ws();
        }
        if self.peek() == Some(b':') {
            self.pos += 1;
            node.length = self.parse_number()?;
        }
        Ok(node)
    }

    /// Maps a leaf token through the Translate block when one is present.
    fn resolve_label(&self, token: &str) -> Result<String, AnalyseError> {
        if self.translate.is_empty() {
            return Ok(token.to_string());
        }
        match self.translate.get(token) {
            Some(label) => Ok(label.clone()),
            // Numeric ids must resolve; anything else is taken verbatim.
            None if token.bytes().all(|b| b.is_ascii_digit()) => Err(AnalyseError::UnknownTaxon {
                id: token.to_string(),
            }),
            None => Ok(token.to_string()),
        }
    }

    fn parse_label(&mut self) -> Result<String, AnalyseError> {
        self.skip_ws();
        if self.peek() == Some(b'\'') {
            let start = self.pos + 1;
            self.pos = start;
            while self.peek().is_some_and(|b| b != b'\'') {
                self.pos += 1;
            }
            let label = self.bytes[start..self.pos].to_vec();
            self.expect(b'\'')?;
            return Ok(String::from_utf8_lossy(&label).into_owned());
        }
        let start = self.pos;
        while self.peek().is_some_and(|b| {
            !matches!(b, b'(' | b')' | b',' | b':' | b'[' | b';') && !b.is_ascii_whitespace()
        }) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(AnalyseError::newick(self.pos, "expected a leaf label"));
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    /// Bracketed annotation; the brackets and any leading `&` are not
    /// part of the stored metadata.
    fn parse_annotation(&mut self) -> Result<String, AnalyseError> {
        self.expect(b'[')?;
        let start = self.pos;
        while self.peek().is_some_and(|b| b != b']') {
            self.pos += 1;
        }
        let inner = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        self.expect(b']')?;
        Ok(inner.strip_prefix('&').unwrap_or(&inner).to_string())
    }

    fn parse_number(&mut self) -> Result<f64, AnalyseError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| matches!(b, b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E'))
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| AnalyseError::newick(start, "non-UTF-8 branch length"))?;
        text.parse()
            .map_err(|_| AnalyseError::newick(start, format!("invalid branch length {text:?}")))
    }

    fn expect(&mut self, byte: u8) -> Result<(), AnalyseError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(AnalyseError::newick(
                self.pos,
                format!("expected {:?}", byte as char),
            ))
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}
