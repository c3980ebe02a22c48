//! Discovery of `require` calls in Lua source.
//!
//! This is a lexical scan, not a parse: comments and string literals are
//! skipped so that `-- require("x")` or `"require 'x'"` are not reported, and
//! every remaining `require` identifier is classified by its argument.

/// Argument of a `require` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequireTarget {
  /// `require "a.b"`, `require("a.b")` or `require [[a.b]]`.
  Literal(String),
  /// Anything the scanner cannot resolve statically, e.g. `require(name)`.
  Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
  pub line: u32,
  pub target: RequireTarget,
}

/// Find every `require` in `source`, in order of appearance.
pub fn scan_requires(source: &str) -> Vec<Require> {
  let mut scanner = Scanner {
    src: source.as_bytes(),
    pos: 0,
    line: 1,
  };
  let mut requires = Vec::new();

  while let Some(c) = scanner.peek() {
    match c {
      b'-' if scanner.peek_at(1) == Some(b'-') => scanner.skip_comment(),
      b'"' | b'\'' => {
        scanner.bump();
        scanner.read_short_string(c);
      }
      b'[' if scanner.long_bracket_level().is_some() => {
        scanner.read_long_bracket();
      }
      c if is_ident_start(c) => {
        let start = scanner.pos;
        let line = scanner.line;
        let ident = scanner.read_ident();
        if ident == "require" && !scanner.is_member_access(start) {
          requires.push(Require {
            line,
            target: scanner.read_require_argument(),
          });
        }
      }
      c if c.is_ascii_digit() => {
        // Numbers like 1e5 or 0x1f must not start an identifier.
        while scanner.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == b'.') {
          scanner.bump();
        }
      }
      _ => {
        scanner.bump();
      }
    }
  }

  requires
}

fn is_ident_start(c: u8) -> bool {
  c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
  c.is_ascii_alphanumeric() || c == b'_'
}

struct Scanner<'a> {
  src: &'a [u8],
  pos: usize,
  line: u32,
}

impl Scanner<'_> {
  fn peek(&self) -> Option<u8> {
    self.src.get(self.pos).copied()
  }

  fn peek_at(&self, offset: usize) -> Option<u8> {
    self.src.get(self.pos + offset).copied()
  }

  fn bump(&mut self) -> Option<u8> {
    let c = self.peek()?;
    self.pos += 1;
    if c == b'\n' {
      self.line += 1;
    }
    Some(c)
  }

  fn read_ident(&mut self) -> String {
    let start = self.pos;
    while self.peek().is_some_and(is_ident_continue) {
      self.bump();
    }
    String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
  }

  /// Whether the identifier starting at `start` follows `.` or `:` (field or method access).
  fn is_member_access(&self, start: usize) -> bool {
    let mut i = start;
    while i > 0 && matches!(self.src[i - 1], b' ' | b'\t' | b'\r' | b'\n') {
      i -= 1;
    }
    match i.checked_sub(1).map(|j| self.src[j]) {
      Some(b':') => true,
      // `..` is concatenation, a single `.` is field access
      Some(b'.') => !(i >= 2 && self.src[i - 2] == b'.'),
      _ => false,
    }
  }

  fn skip_whitespace_and_comments(&mut self) {
    loop {
      match self.peek() {
        Some(c) if c.is_ascii_whitespace() => {
          self.bump();
        }
        Some(b'-') if self.peek_at(1) == Some(b'-') => self.skip_comment(),
        _ => return,
      }
    }
  }

  fn skip_comment(&mut self) {
    self.bump();
    self.bump();
    if self.peek() == Some(b'[') && self.long_bracket_level().is_some() {
      self.read_long_bracket();
      return;
    }
    while let Some(c) = self.peek() {
      if c == b'\n' {
        return;
      }
      self.bump();
    }
  }

  /// Level of a long bracket opening at the cursor: `[[` is 0, `[==[` is 2.
  fn long_bracket_level(&self) -> Option<usize> {
    if self.peek() != Some(b'[') {
      return None;
    }
    let mut level = 0;
    while self.peek_at(1 + level) == Some(b'=') {
      level += 1;
    }
    (self.peek_at(1 + level) == Some(b'[')).then_some(level)
  }

  /// Consume a long bracket string or comment body and return its content.
  fn read_long_bracket(&mut self) -> String {
    let Some(level) = self.long_bracket_level() else {
      return String::new();
    };
    for _ in 0..level + 2 {
      self.bump();
    }

    let start = self.pos;
    while self.peek().is_some() {
      if self.peek() == Some(b']')
        && (1..=level).all(|i| self.peek_at(i) == Some(b'='))
        && self.peek_at(level + 1) == Some(b']')
      {
        let content = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        for _ in 0..level + 2 {
          self.bump();
        }
        return content;
      }
      self.bump();
    }
    String::from_utf8_lossy(&self.src[start..]).into_owned()
  }

  /// Consume a quoted string whose opening quote was already consumed.
  fn read_short_string(&mut self, quote: u8) -> String {
    let mut content = Vec::new();
    while let Some(c) = self.peek() {
      if c == b'\n' {
        break;
      }
      self.bump();
      if c == quote {
        break;
      }
      if c == b'\\' {
        if let Some(escaped) = self.bump() {
          content.push(b'\\');
          content.push(escaped);
        }
        continue;
      }
      content.push(c);
    }
    String::from_utf8_lossy(&content).into_owned()
  }

  fn read_string_literal(&mut self) -> Option<String> {
    match self.peek() {
      Some(q @ (b'"' | b'\'')) => {
        self.bump();
        Some(self.read_short_string(q))
      }
      Some(b'[') if self.long_bracket_level().is_some() => Some(self.read_long_bracket()),
      _ => None,
    }
  }

  fn read_require_argument(&mut self) -> RequireTarget {
    self.skip_whitespace_and_comments();

    if self.peek() == Some(b'(') {
      self.bump();
      self.skip_whitespace_and_comments();
      let Some(name) = self.read_string_literal() else {
        return RequireTarget::Dynamic;
      };
      self.skip_whitespace_and_comments();
      if self.peek() != Some(b')') {
        return RequireTarget::Dynamic;
      }
      return literal(name);
    }

    match self.read_string_literal() {
      Some(name) => literal(name),
      None => RequireTarget::Dynamic,
    }
  }
}

fn literal(name: String) -> RequireTarget {
  if name.is_empty() || name.contains('\\') {
    RequireTarget::Dynamic
  } else {
    RequireTarget::Literal(name)
  }
}
