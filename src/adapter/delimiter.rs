// src/adapter/delimiter.rs
//! Delimiter-tracking indexing for C-family dialects.
//!
//! A lexical pre-pass blanks comments and string literals (offsets are
//! preserved), then a single scan pairs braces with the conditional or loop
//! keyword that opened them. `else if` runs are re-nested into else arms so
//! the resulting tree matches what the tree strategy reports. Braceless
//! single-statement bodies do not open blocks; that is inherent to the
//! strategy, not a defect of the input.

use crate::adapter::body_is_terminal;
use crate::dialect::Dialect;
use crate::error::{RefactorError, Result};
use crate::types::{Block, BlockKind, Branch, Span};

pub fn index(_dialect: Dialect, text: &str) -> Result<Block> {
    let cleaned = strip_noise(text);
    let lines = LineIndex::new(text);
    Scanner {
        text,
        cleaned: &cleaned,
        lines: &lines,
    }
    .run()
}

/// Replaces comment and string-literal bytes with spaces, keeping newlines
/// so byte and line offsets stay valid.
fn strip_noise(text: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Normal,
        Line,
        Block,
        Str,
        Chr,
    }

    let bytes = text.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Normal;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match state {
            State::Normal => match c {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    state = State::Line;
                    out[i] = b' ';
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = State::Block;
                    out[i] = b' ';
                }
                b'"' => {
                    state = State::Str;
                    out[i] = b' ';
                }
                b'\'' => {
                    state = State::Chr;
                    out[i] = b' ';
                }
                _ => {}
            },
            State::Line => {
                if c == b'\n' {
                    state = State::Normal;
                } else {
                    out[i] = b' ';
                }
            }
            State::Block => {
                if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 1;
                    state = State::Normal;
                } else if c != b'\n' {
                    out[i] = b' ';
                }
            }
            State::Str | State::Chr => {
                let quote = if state == State::Str { b'"' } else { b'\'' };
                if c == b'\\' {
                    out[i] = b' ';
                    if i + 1 < bytes.len() && bytes[i + 1] != b'\n' {
                        out[i + 1] = b' ';
                        i += 1;
                    }
                } else if c == quote {
                    out[i] = b' ';
                    state = State::Normal;
                } else if c != b'\n' {
                    out[i] = b' ';
                }
            }
        }
        i += 1;
    }
    // Lossless for valid UTF-8: only ASCII bytes were rewritten.
    String::from_utf8(out).unwrap_or_else(|_| text.to_string())
}

struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { starts }
    }

    fn line_of(&self, byte: usize) -> usize {
        self.starts.partition_point(|s| *s <= byte)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingKind {
    If,
    ElseIf,
    Else,
    Loop,
}

struct Pending {
    kind: PendingKind,
    header_start: usize,
    condition: String,
}

enum FrameKind {
    Root,
    Then {
        condition: String,
        header_start: usize,
        attach_else: bool,
    },
    ElseBody,
    Loop {
        header_start: usize,
    },
    Other,
}

struct Frame {
    kind: FrameKind,
    body_start: usize,
    children: Vec<Block>,
    /// An if/else-if run still accepting trailing arms, outermost first.
    open_chain: Vec<Block>,
}

impl Frame {
    fn new(kind: FrameKind, body_start: usize) -> Self {
        Self {
            kind,
            body_start,
            children: Vec::new(),
            open_chain: Vec::new(),
        }
    }

    fn commit_chain(&mut self) {
        if self.open_chain.is_empty() {
            return;
        }
        let mut chain = std::mem::take(&mut self.open_chain);
        while chain.len() > 1 {
            let Some(inner) = chain.pop() else { break };
            let Some(outer) = chain.last_mut() else { break };
            let mut body = Block::new(BlockKind::Other, inner.depth, inner.span);
            let end = inner.span;
            body.children = vec![inner];
            outer.branches.push(Branch {
                condition: String::new(),
                body,
                terminal: false,
            });
            if end.end > outer.span.end {
                outer.span.end = end.end;
                outer.span.line_end = end.line_end;
            }
        }
        if let Some(head) = chain.pop() {
            self.children.push(head);
        }
    }

    fn push_block(&mut self, block: Block) {
        self.commit_chain();
        self.children.push(block);
    }
}

struct Scanner<'a> {
    text: &'a str,
    cleaned: &'a str,
    lines: &'a LineIndex,
}

impl<'a> Scanner<'a> {
    fn run(&self) -> Result<Block> {
        let bytes = self.cleaned.as_bytes();
        let mut stack = vec![Frame::new(FrameKind::Root, 0)];
        let mut pending: Option<Pending> = None;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    let frame = self.open_frame(pending.take(), i);
                    stack.push(frame);
                    i += 1;
                }
                b'}' => {
                    self.close_frame(&mut stack, i)?;
                    pending = None;
                    i += 1;
                }
                b';' => {
                    pending = None;
                    i += 1;
                }
                c if is_word_byte(c) && self.word_starts_at(i) => {
                    let end = self.word_end(i);
                    i = self.handle_word(i, end, &mut pending);
                }
                _ => i += 1,
            }
        }

        if stack.len() != 1 {
            return Err(RefactorError::MalformedStructure(format!(
                "unbalanced delimiters: {} unclosed block(s)",
                stack.len() - 1
            )));
        }
        let Some(mut root_frame) = stack.pop() else {
            return Err(RefactorError::MalformedStructure("scanner lost root".into()));
        };
        root_frame.commit_chain();
        let mut root = Block::new(BlockKind::Other, 0, self.span(0, self.text.len()));
        root.children = root_frame.children;
        Ok(root)
    }

    fn handle_word(&self, start: usize, end: usize, pending: &mut Option<Pending>) -> usize {
        let word = &self.cleaned[start..end];
        match word {
            "if" => {
                let (condition, after) = self.capture_condition(end);
                let upgraded = matches!(pending.as_ref().map(|p| p.kind), Some(PendingKind::Else));
                let header_start = pending
                    .as_ref()
                    .filter(|p| p.kind == PendingKind::Else)
                    .map_or(start, |p| p.header_start);
                *pending = Some(Pending {
                    kind: if upgraded { PendingKind::ElseIf } else { PendingKind::If },
                    header_start,
                    condition,
                });
                after
            }
            "else" => {
                *pending = Some(Pending {
                    kind: PendingKind::Else,
                    header_start: start,
                    condition: String::new(),
                });
                end
            }
            "switch" => {
                let (condition, after) = self.capture_condition(end);
                *pending = Some(Pending {
                    kind: PendingKind::If,
                    header_start: start,
                    condition,
                });
                after
            }
            "for" | "while" => {
                let (_, after) = self.capture_condition(end);
                *pending = Some(Pending {
                    kind: PendingKind::Loop,
                    header_start: start,
                    condition: String::new(),
                });
                after
            }
            "do" => {
                *pending = Some(Pending {
                    kind: PendingKind::Loop,
                    header_start: start,
                    condition: String::new(),
                });
                end
            }
            _ => end,
        }
    }

    /// Extracts the parenthesized header following a keyword, returning the
    /// condition text (from the original source) and the resume offset. The
    /// scan resumes past the closing paren so nothing inside the header is
    /// mistaken for a block delimiter or statement boundary.
    fn capture_condition(&self, from: usize) -> (String, usize) {
        let bytes = self.cleaned.as_bytes();
        let mut i = from;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'(') {
            return (String::new(), from);
        }
        let open = i;
        let mut depth = 0usize;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = self.text.get(open + 1..i).unwrap_or_default();
                        return (inner.trim().to_string(), i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        (String::new(), from)
    }

    fn open_frame(&self, pending: Option<Pending>, brace: usize) -> Frame {
        let body_start = brace + 1;
        match pending {
            Some(p) => match p.kind {
                PendingKind::If | PendingKind::ElseIf => Frame::new(
                    FrameKind::Then {
                        condition: p.condition,
                        header_start: p.header_start,
                        attach_else: p.kind == PendingKind::ElseIf,
                    },
                    body_start,
                ),
                PendingKind::Else => Frame::new(FrameKind::ElseBody, body_start),
                PendingKind::Loop => Frame::new(
                    FrameKind::Loop {
                        header_start: p.header_start,
                    },
                    body_start,
                ),
            },
            None => Frame::new(FrameKind::Other, body_start),
        }
    }

    fn close_frame(&self, stack: &mut Vec<Frame>, close: usize) -> Result<()> {
        if stack.len() == 1 {
            return Err(RefactorError::MalformedStructure(
                "unbalanced delimiters: unexpected closing brace".into(),
            ));
        }
        let Some(mut frame) = stack.pop() else {
            return Ok(());
        };
        frame.commit_chain();
        let depth = stack.len();
        let Some(parent) = stack.last_mut() else {
            return Ok(());
        };

        let body_span = self.span(frame.body_start, close);
        let body_text = self.text.get(body_span.start..body_span.end).unwrap_or_default();

        match frame.kind {
            FrameKind::Root => {}
            FrameKind::Other => {
                let mut block = Block::new(BlockKind::Other, depth, body_span);
                block.children = frame.children;
                parent.push_block(block);
            }
            FrameKind::Loop { header_start } => {
                let mut block =
                    Block::new(BlockKind::Loop, depth, self.span(header_start, close + 1));
                block.children = frame.children;
                parent.push_block(block);
            }
            FrameKind::Then {
                condition,
                header_start,
                attach_else,
            } => {
                let mut body = Block::new(BlockKind::Other, depth + 1, body_span);
                body.children = frame.children;
                let terminal = body_is_terminal(body_text);
                let mut block =
                    Block::new(BlockKind::Conditional, depth, self.span(header_start, close + 1));
                block.branches.push(Branch {
                    condition,
                    body,
                    terminal,
                });
                if attach_else && !parent.open_chain.is_empty() {
                    parent.open_chain.push(block);
                } else {
                    parent.commit_chain();
                    parent.open_chain.push(block);
                }
            }
            FrameKind::ElseBody => {
                let mut body = Block::new(BlockKind::Other, depth + 1, body_span);
                body.children = frame.children;
                let terminal = body_is_terminal(body_text);
                if let Some(deepest) = parent.open_chain.last_mut() {
                    if body_span.end > deepest.span.end {
                        deepest.span.end = body_span.end + 1;
                        deepest.span.line_end = body_span.line_end;
                    }
                    deepest.branches.push(Branch {
                        condition: String::new(),
                        body,
                        terminal,
                    });
                    parent.commit_chain();
                } else {
                    // Stray else with no preceding if: keep its contents.
                    let mut block = Block::new(BlockKind::Other, depth, body_span);
                    block.children = body.children;
                    parent.push_block(block);
                }
            }
        }
        Ok(())
    }

    fn word_starts_at(&self, i: usize) -> bool {
        i == 0 || !is_word_byte(self.cleaned.as_bytes()[i - 1])
    }

    fn word_end(&self, start: usize) -> usize {
        let bytes = self.cleaned.as_bytes();
        let mut end = start;
        while end < bytes.len() && is_word_byte(bytes[end]) {
            end += 1;
        }
        end
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span::new(
            start,
            end,
            self.lines.line_of(start),
            self.lines.line_of(end.saturating_sub(1).max(start)),
        )
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
