// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Boundary splitter for JSON lists and objects.
//!
//! The splitter locates the byte range of each direct child of a JSON
//! array or object without decoding the children. Dict keys are decoded as
//! they are reached; values are left as [`Boundary`]s for the native decoder
//! or a nested split.
//!
//! Scanning is lazy and restartable: [`Boundaries::iter`] starts a fresh scan
//! from the opening bracket, reads the source in chunks, and stops as soon as
//! the caller stops pulling. Structural errors in children never reached are
//! never reported.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use jsonplan::core::{DecodeOptions, Key};
//! use jsonplan::encoding::json::splitter::{SplitMode, Splitter};
//! use jsonplan::io::{Boundary, ByteSource};
//!
//! let source: Arc<dyn ByteSource> = Arc::new(br#"{"a":1,"b":2}"#.to_vec());
//! let splitter = Splitter::new(&DecodeOptions::default());
//! let boundaries = splitter
//!     .split(&source, Boundary::whole(), SplitMode::Dict)?
//!     .expect("not null");
//! let children: Vec<_> = boundaries.iter().collect::<Result<_, _>>()?;
//! assert_eq!(children[0], (Key::Name("a".into()), Boundary::new(5, Some(1))));
//! assert_eq!(children[1], (Key::Name("b".into()), Boundary::new(11, Some(1))));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::core::{CodecError, DecodeOptions, Key, Result};
use crate::io::source::{read_range, Boundary, ByteSource};

use super::native::NativeDecoder;

/// Which container the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitMode {
    /// JSON array; children keyed by position
    List,
    /// JSON object; children keyed by decoded member name
    Dict,
}

impl SplitMode {
    fn open(self) -> u8 {
        match self {
            SplitMode::List => b'[',
            SplitMode::Dict => b'{',
        }
    }

    fn close(self) -> u8 {
        match self {
            SplitMode::List => b']',
            SplitMode::Dict => b'}',
        }
    }

    fn name(self) -> &'static str {
        match self {
            SplitMode::List => "list",
            SplitMode::Dict => "dict",
        }
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn closer_for(open: u8) -> u8 {
    if open == b'[' {
        b']'
    } else {
        b'}'
    }
}

/// Runtime type name implied by the first byte of a JSON value.
fn observed_from_lead(b: u8) -> Option<&'static str> {
    match b {
        b'{' => Some("dict"),
        b'[' => Some("list"),
        b'"' => Some("string"),
        b't' | b'f' => Some("bool"),
        b'n' => Some("null"),
        b'-' | b'0'..=b'9' => Some("number"),
        _ => None,
    }
}

/// Splits list and dict ranges into child boundaries.
#[derive(Debug, Clone)]
pub struct Splitter {
    chunk_size: usize,
    max_depth: usize,
    max_snippet: usize,
    keys: NativeDecoder,
}

impl Splitter {
    /// Create a splitter from decode options.
    pub fn new(options: &DecodeOptions) -> Self {
        Self {
            chunk_size: options.chunk_size.max(1),
            max_depth: options.max_depth,
            max_snippet: options.max_snippet,
            keys: NativeDecoder::with_options(options),
        }
    }

    /// Split `range` into child boundaries.
    ///
    /// Returns `Ok(None)` if the range holds the JSON `null` literal. Fails
    /// with `UnexpectedValue` if the range holds a different kind of JSON
    /// value than `want`, and with `MalformedInput` if it is not JSON at all.
    pub fn split(
        &self,
        source: &Arc<dyn ByteSource>,
        range: Boundary,
        want: SplitMode,
    ) -> Result<Option<Boundaries>> {
        let mut reader = ChunkReader::new(source.as_ref(), range, self.chunk_size);
        reader.skip_ws()?;
        let start = reader.pos;
        let lead = match reader.peek()? {
            Some(b) => b,
            None => return Err(self.malformed(source.as_ref(), range, start, "empty input")),
        };

        if lead == want.open() {
            reader.bump();
            tracing::trace!(%range, mode = want.name(), "Splitting range");
            return Ok(Some(Boundaries {
                source: Arc::clone(source),
                range,
                body: reader.pos,
                mode: want,
                splitter: self.clone(),
            }));
        }

        if lead == b'n' && self.rest_is_null(&mut reader)? {
            return Ok(None);
        }

        match observed_from_lead(lead) {
            Some(observed) => Err(CodecError::unexpected_value(
                want.name(),
                observed,
                format!("range {range}"),
            )),
            None => Err(self.malformed(
                source.as_ref(),
                range,
                start,
                format!("unexpected byte '{}'", lead.escape_ascii()),
            )),
        }
    }

    /// Whether `range` holds exactly the JSON `null` literal.
    ///
    /// Only the leading bytes are read unless the range starts with `n`.
    pub fn is_null(&self, source: &dyn ByteSource, range: Boundary) -> Result<bool> {
        let mut reader = ChunkReader::new(source, range, self.chunk_size.min(64));
        reader.skip_ws()?;
        match reader.peek()? {
            Some(b'n') => self.rest_is_null(&mut reader),
            _ => Ok(false),
        }
    }

    fn rest_is_null(&self, reader: &mut ChunkReader<'_>) -> Result<bool> {
        for expected in b"null" {
            if reader.peek()? != Some(*expected) {
                return Ok(false);
            }
            reader.bump();
        }
        reader.skip_ws()?;
        Ok(reader.peek()?.is_none())
    }

    fn malformed(
        &self,
        source: &dyn ByteSource,
        range: Boundary,
        at: usize,
        message: impl fmt::Display,
    ) -> CodecError {
        let snippet = read_range(source, Boundary::new(at, Some(self.max_snippet)))
            .unwrap_or_default();
        CodecError::malformed(
            range,
            format!("{message} at byte {at}"),
            &snippet,
            self.max_snippet,
        )
    }
}

/// The children of one list or dict range.
///
/// Each call to [`iter`](Boundaries::iter) rescans from the opening bracket
/// and yields the same boundaries in the same order.
#[derive(Clone)]
pub struct Boundaries {
    source: Arc<dyn ByteSource>,
    range: Boundary,
    body: usize,
    mode: SplitMode,
    splitter: Splitter,
}

impl Boundaries {
    /// Container kind being split.
    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    /// The range that was split.
    pub fn range(&self) -> Boundary {
        self.range
    }

    /// The source the boundaries point into.
    pub fn source(&self) -> &Arc<dyn ByteSource> {
        &self.source
    }

    /// Start a scan over the children.
    pub fn iter(&self) -> BoundaryIter<'_> {
        let mut reader = ChunkReader::new(
            self.source.as_ref(),
            self.range,
            self.splitter.chunk_size,
        );
        reader.pos = self.body;
        BoundaryIter {
            owner: self,
            reader,
            index: 0,
            state: ScanState::First,
        }
    }
}

impl fmt::Debug for Boundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boundaries")
            .field("range", &self.range)
            .field("mode", &self.mode)
            .finish()
    }
}

impl<'a> IntoIterator for &'a Boundaries {
    type Item = Result<(Key, Boundary)>;
    type IntoIter = BoundaryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Right after the opening bracket
    First,
    /// Right after a separating comma
    Next,
    /// The closing bracket was consumed; only trailing whitespace may follow
    Closed,
    Done,
}

/// Iterator over the children of a [`Boundaries`].
pub struct BoundaryIter<'a> {
    owner: &'a Boundaries,
    reader: ChunkReader<'a>,
    index: usize,
    state: ScanState,
}

impl BoundaryIter<'_> {
    fn fail(&mut self, at: usize, message: impl fmt::Display) -> CodecError {
        self.state = ScanState::Done;
        self.owner
            .splitter
            .malformed(self.owner.source.as_ref(), self.owner.range, at, message)
    }

    fn step(&mut self) -> Result<Option<(Key, Boundary)>> {
        let close = self.owner.mode.close();
        loop {
            match self.state {
                ScanState::Done => return Ok(None),
                ScanState::Closed => {
                    self.reader.skip_ws()?;
                    if self.reader.peek()?.is_some() {
                        let at = self.reader.pos;
                        return Err(self.fail(at, "trailing content after closing bracket"));
                    }
                    self.state = ScanState::Done;
                    return Ok(None);
                }
                ScanState::First | ScanState::Next => {
                    self.reader.skip_ws()?;
                    let at = self.reader.pos;
                    match self.reader.peek()? {
                        None => {
                            return Err(self.fail(
                                at,
                                format!("missing closing '{}'", close as char),
                            ))
                        }
                        Some(b) if b == close => {
                            if self.state == ScanState::Next {
                                return Err(self.fail(at, "trailing comma"));
                            }
                            self.reader.bump();
                            self.state = ScanState::Closed;
                        }
                        Some(_) => return self.child().map(Some),
                    }
                }
            }
        }
    }

    fn child(&mut self) -> Result<(Key, Boundary)> {
        let key = match self.owner.mode {
            SplitMode::List => Key::Index(self.index),
            SplitMode::Dict => Key::Name(self.member_name()?),
        };
        self.index += 1;

        self.reader.skip_ws()?;
        let start = self.reader.pos;
        let (end, terminator) = self.scan_value()?;
        if end == start {
            return Err(self.fail(start, "expected value"));
        }

        self.state = if terminator == b',' {
            ScanState::Next
        } else {
            ScanState::Closed
        };
        Ok((key, Boundary::new(start, Some(end - start))))
    }

    /// Read `"name"` and the following `:`.
    fn member_name(&mut self) -> Result<String> {
        let start = self.reader.pos;
        if self.reader.peek()? != Some(b'"') {
            return Err(self.fail(start, "expected member name"));
        }
        self.reader.bump();

        let mut raw = vec![b'"'];
        loop {
            match self.reader.peek()? {
                None => return Err(self.fail(start, "unterminated string")),
                Some(b'\\') => {
                    raw.push(b'\\');
                    self.reader.bump();
                    match self.reader.peek()? {
                        Some(b) => {
                            raw.push(b);
                            self.reader.bump();
                        }
                        None => return Err(self.fail(start, "unterminated string")),
                    }
                }
                Some(b'"') => {
                    raw.push(b'"');
                    self.reader.bump();
                    break;
                }
                Some(b) => {
                    raw.push(b);
                    self.reader.bump();
                }
            }
        }

        let name_range = Boundary::new(start, Some(raw.len()));
        let name = self.owner.splitter.keys.decode_key(&raw, name_range)?;

        self.reader.skip_ws()?;
        let colon = self.reader.pos;
        if self.reader.peek()? != Some(b':') {
            return Err(self.fail(colon, "expected ':' after member name"));
        }
        self.reader.bump();
        Ok(name)
    }

    /// Scan one child value up to the `,` or closing bracket that ends it.
    ///
    /// Returns the exclusive end of the value with trailing whitespace
    /// trimmed, and the consumed terminator byte.
    fn scan_value(&mut self) -> Result<(usize, u8)> {
        let close = self.owner.mode.close();
        let max_depth = self.owner.splitter.max_depth;
        let mut stack: Vec<u8> = Vec::new();
        let mut in_string = false;
        let mut string_start = 0;
        let mut end = self.reader.pos;

        loop {
            let at = self.reader.pos;
            let b = match self.reader.peek()? {
                Some(b) => b,
                None if in_string => return Err(self.fail(string_start, "unterminated string")),
                None => {
                    let missing = stack.last().map(|o| closer_for(*o)).unwrap_or(close);
                    return Err(self.fail(at, format!("missing closing '{}'", missing as char)));
                }
            };
            self.reader.bump();

            if in_string {
                match b {
                    // The escaped byte can never end the string or open a bracket.
                    b'\\' => {
                        if self.reader.peek()?.is_none() {
                            return Err(self.fail(string_start, "unterminated string"));
                        }
                        self.reader.bump();
                    }
                    b'"' => {
                        in_string = false;
                        end = self.reader.pos;
                    }
                    _ => {}
                }
                continue;
            }

            match b {
                b'"' => {
                    in_string = true;
                    string_start = at;
                }
                b'[' | b'{' => {
                    stack.push(b);
                    if stack.len() + 1 > max_depth {
                        self.state = ScanState::Done;
                        return Err(CodecError::DepthExceeded {
                            limit: max_depth,
                            offset: at,
                        });
                    }
                    end = self.reader.pos;
                    continue;
                }
                b']' | b'}' => match stack.pop() {
                    Some(open) if closer_for(open) == b => {
                        end = self.reader.pos;
                        continue;
                    }
                    Some(open) => {
                        return Err(self.fail(
                            at,
                            format!(
                                "mismatched '{}', expected '{}'",
                                b as char,
                                closer_for(open) as char
                            ),
                        ))
                    }
                    None if b == close => return Ok((end, b)),
                    None => {
                        return Err(self.fail(
                            at,
                            format!("mismatched '{}', expected '{}'", b as char, close as char),
                        ))
                    }
                },
                b',' if stack.is_empty() => return Ok((end, b)),
                _ => {}
            }

            if !is_ws(b) {
                end = self.reader.pos;
            }
        }
    }
}

impl Iterator for BoundaryIter<'_> {
    type Item = Result<(Key, Boundary)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.state = ScanState::Done;
                Some(Err(e))
            }
        }
    }
}

/// Byte-at-a-time reader over a range, pulling fixed-size chunks.
struct ChunkReader<'a> {
    source: &'a dyn ByteSource,
    slice: Option<&'a [u8]>,
    buf: Vec<u8>,
    buf_start: usize,
    chunk_size: usize,
    pos: usize,
    end: usize,
}

impl<'a> ChunkReader<'a> {
    fn new(source: &'a dyn ByteSource, range: Boundary, chunk_size: usize) -> Self {
        Self {
            source,
            slice: source.as_slice(),
            buf: Vec::new(),
            buf_start: 0,
            chunk_size: chunk_size.max(1),
            pos: range.offset,
            end: range.end(source.len()),
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        if self.pos >= self.end {
            return Ok(None);
        }
        if let Some(data) = self.slice {
            return Ok(data.get(self.pos).copied());
        }
        if self.pos < self.buf_start || self.pos >= self.buf_start + self.buf.len() {
            self.fill()?;
        }
        Ok(self.buf.get(self.pos - self.buf_start).copied())
    }

    fn fill(&mut self) -> Result<()> {
        let want = self.chunk_size.min(self.end - self.pos);
        self.buf.resize(want, 0);
        let n = self.source.read_at(self.pos, &mut self.buf)?;
        self.buf.truncate(n);
        self.buf_start = self.pos;
        Ok(())
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_ws(&mut self) -> Result<()> {
        while let Some(b) = self.peek()? {
            if !is_ws(b) {
                break;
            }
            self.bump();
        }
        Ok(())
    }
}
