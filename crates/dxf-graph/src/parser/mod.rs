//! DXF group-code text parser.
//!
//! DXF text files are strict two-line records: an integer group code on one
//! line, the associated value on the next. A code-0 record opens the next
//! syntactic unit (`SECTION`, `BLOCK`, `ENDBLK`, `ENDSEC`, `EOF`, or an
//! entity kind). The parser knows nothing about graphs or schemas; it turns
//! the record stream into typed [`Entity`] and [`Block`] values inside a
//! [`Document`].

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::ParseError;

/// One group code / value line pair, immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPair {
    pub code: i32,
    pub value: String,
}

/// A parsed drawing entity (`LINE`, `CIRCLE`, `INSERT`, ...).
///
/// `handle` (group code 5) and `layer` (group code 8) are promoted to
/// fields for O(1) access; every pair, including those two, is retained in
/// `data` in source order for later typed extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entity {
    pub kind: String,
    pub handle: String,
    pub layer: String,
    pub data: Vec<GroupPair>,
}

impl Entity {
    /// Returns the first value recorded for `code`, if any.
    pub fn string_value(&self, code: i32) -> Option<&str> {
        self.data
            .iter()
            .find(|pair| pair.code == code)
            .map(|pair| pair.value.as_str())
    }

    /// Strict read of `code` as a float.
    pub fn f64_value(&self, code: i32) -> Result<f64, ParseError> {
        let value = self.string_value(code).ok_or_else(|| ParseError::CodeNotFound {
            code,
            kind: self.kind.clone(),
        })?;
        value.parse().map_err(|_| ParseError::InvalidNumber {
            code,
            value: value.to_string(),
            target: "f64",
        })
    }

    /// Strict read of `code` as an integer.
    pub fn i64_value(&self, code: i32) -> Result<i64, ParseError> {
        let value = self.string_value(code).ok_or_else(|| ParseError::CodeNotFound {
            code,
            kind: self.kind.clone(),
        })?;
        value.parse().map_err(|_| ParseError::InvalidNumber {
            code,
            value: value.to_string(),
            target: "i64",
        })
    }
}

/// A named, reusable block definition with its nested entities.
///
/// `name` is document-unique but not globally unique across documents;
/// detecting content divergence between same-named blocks is the analysis
/// module's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    pub handle: String,
    pub entities: Vec<Entity>,
}

/// Where an entity lives inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntitySlot {
    Model(usize),
    InBlock { block: usize, entity: usize },
}

/// A fully parsed DXF document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Drawing version from the `$ACADVER` header variable, or empty when
    /// the header does not declare one.
    pub version: String,
    /// Entities from the `ENTITIES` section, in source order.
    pub entities: Vec<Entity>,
    /// Block definitions from the `BLOCKS` section, in source order.
    pub blocks: Vec<Block>,
    entity_by_handle: FxHashMap<String, EntitySlot>,
    block_by_name: FxHashMap<String, usize>,
}

impl Document {
    /// Looks up an entity by handle, covering both model-space and
    /// block-nested entities.
    pub fn entity(&self, handle: &str) -> Option<&Entity> {
        match self.entity_by_handle.get(handle)? {
            EntitySlot::Model(index) => self.entities.get(*index),
            EntitySlot::InBlock { block, entity } => {
                self.blocks.get(*block)?.entities.get(*entity)
            }
        }
    }

    /// Looks up a block definition by name.
    pub fn block(&self, name: &str) -> Option<&Block> {
        self.block_by_name.get(name).map(|index| &self.blocks[*index])
    }

    /// Rebuilds the handle and name lookups in one pass over the parsed
    /// structure. Entities with empty handles are not indexed.
    fn build_lookups(&mut self) {
        self.entity_by_handle.clear();
        self.block_by_name.clear();

        for (index, entity) in self.entities.iter().enumerate() {
            if !entity.handle.is_empty() {
                self.entity_by_handle
                    .insert(entity.handle.clone(), EntitySlot::Model(index));
            }
        }

        for (block_index, block) in self.blocks.iter().enumerate() {
            if !block.name.is_empty() {
                self.block_by_name.insert(block.name.clone(), block_index);
            }
            for (entity_index, entity) in block.entities.iter().enumerate() {
                if !entity.handle.is_empty() {
                    self.entity_by_handle.insert(
                        entity.handle.clone(),
                        EntitySlot::InBlock {
                            block: block_index,
                            entity: entity_index,
                        },
                    );
                }
            }
        }
    }
}

/// Parses a DXF file from disk. A missing or unreadable file is reported as
/// [`ParseError::FileNotFound`], distinct from malformed content.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document, ParseError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| ParseError::FileNotFound {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    parse_str(&text)
}

/// Parses a DXF document from in-memory text.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    Parser::new(input).parse()
}

struct Parser<'a> {
    lines: std::str::Lines<'a>,
    line: u64,
    pushback: Option<GroupPair>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines(),
            line: 0,
            pushback: None,
        }
    }

    fn parse(mut self) -> Result<Document, ParseError> {
        let mut document = Document::default();

        while let Some(pair) = self.read_pair()? {
            if pair.code != 0 {
                continue;
            }
            match pair.value.as_str() {
                "SECTION" => self.parse_section(&mut document)?,
                "EOF" => break,
                _ => {}
            }
        }

        document.build_lookups();
        Ok(document)
    }

    fn parse_section(&mut self, document: &mut Document) -> Result<(), ParseError> {
        let name_pair = self
            .read_pair()?
            .ok_or(ParseError::TruncatedRecord { line: self.line })?;
        if name_pair.code != 2 {
            return Err(ParseError::UnexpectedCode {
                context: "SECTION",
                expected: 2,
                found: name_pair.code,
                line: self.line,
            });
        }

        match name_pair.value.as_str() {
            "HEADER" => self.parse_header(document),
            "BLOCKS" => self.parse_blocks(document),
            "ENTITIES" => self.parse_entities(document),
            other => {
                debug!(section = other, "skipping unrecognized section");
                self.skip_section()
            }
        }
    }

    /// Scans forward to the matching `ENDSEC` without interpreting content.
    fn skip_section(&mut self) -> Result<(), ParseError> {
        while let Some(pair) = self.read_pair()? {
            if pair.code == 0 && pair.value == "ENDSEC" {
                break;
            }
        }
        Ok(())
    }

    fn parse_header(&mut self, document: &mut Document) -> Result<(), ParseError> {
        while let Some(pair) = self.read_pair()? {
            if pair.code == 0 && pair.value == "ENDSEC" {
                break;
            }
            // An absent $ACADVER is tolerated: version stays empty.
            if pair.code == 9 && pair.value == "$ACADVER" {
                if let Some(version_pair) = self.read_pair()? {
                    document.version = version_pair.value;
                }
            }
        }
        Ok(())
    }

    fn parse_blocks(&mut self, document: &mut Document) -> Result<(), ParseError> {
        while let Some(pair) = self.read_pair()? {
            if pair.code == 0 && pair.value == "ENDSEC" {
                break;
            }
            if pair.code != 0 || pair.value != "BLOCK" {
                continue;
            }

            let mut block = Block::default();
            while let Some(block_pair) = self.read_pair()? {
                match block_pair.code {
                    2 => block.name = block_pair.value,
                    5 => block.handle = block_pair.value,
                    0 if block_pair.value == "ENDBLK" => break,
                    0 => {
                        let entity = self.parse_entity(block_pair.value)?;
                        block.entities.push(entity);
                    }
                    _ => {}
                }
            }
            document.blocks.push(block);
        }
        Ok(())
    }

    fn parse_entities(&mut self, document: &mut Document) -> Result<(), ParseError> {
        while let Some(pair) = self.read_pair()? {
            if pair.code == 0 && pair.value == "ENDSEC" {
                break;
            }
            if pair.code == 0 {
                let entity = self.parse_entity(pair.value)?;
                document.entities.push(entity);
            }
        }
        Ok(())
    }

    /// Reads one entity body. The body ends at the next code-0 pair, which
    /// is pushed back so the caller can open the next unit.
    fn parse_entity(&mut self, kind: String) -> Result<Entity, ParseError> {
        let mut entity = Entity {
            kind,
            ..Entity::default()
        };

        while let Some(pair) = self.read_pair()? {
            if pair.code == 0 {
                self.pushback = Some(pair);
                break;
            }
            if pair.code == 5 {
                entity.handle = pair.value.clone();
            } else if pair.code == 8 {
                entity.layer = pair.value.clone();
            }
            entity.data.push(pair);
        }

        Ok(entity)
    }

    /// Reads the next group code / value pair, honoring the pushback slot.
    ///
    /// Returns `Ok(None)` on a clean end of input at a record boundary.
    /// Outer whitespace is stripped from both lines; interior whitespace in
    /// values is preserved.
    fn read_pair(&mut self) -> Result<Option<GroupPair>, ParseError> {
        if let Some(pair) = self.pushback.take() {
            return Ok(Some(pair));
        }

        let Some(code_line) = self.lines.next() else {
            return Ok(None);
        };
        self.line += 1;
        let code_text = code_line.trim();
        let code: i32 = code_text.parse().map_err(|_| ParseError::InvalidGroupCode {
            line: self.line,
            text: code_text.to_string(),
        })?;

        let Some(value_line) = self.lines.next() else {
            return Err(ParseError::TruncatedRecord { line: self.line });
        };
        self.line += 1;

        Ok(Some(GroupPair {
            code,
            value: value_line.trim().to_string(),
        }))
    }
}
