//! Splitting of raw markdown into regions macros may or may not touch.
//!
//! Macro expansion must never rewrite code, and the body of a `:::mermaid`
//! block must reach the diagram renderer verbatim. [`split_segments`] cuts
//! the source into [`Segment`]s without losing a single byte, so that the
//! concatenation of all segment texts is always the original input.
use std::sync::LazyLock;

use regex::Regex;

use super::compile_or_never;

/// State tracking for code fence detection in markdown.
///
/// This tracks whether we're currently inside a fenced code block and
/// maintains the fence character and count for proper closing detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceTracker {
  in_code_block:    bool,
  code_fence_char:  Option<char>,
  code_fence_count: usize,
}

impl FenceTracker {
  #[must_use]
  pub const fn new() -> Self {
    Self {
      in_code_block:    false,
      code_fence_char:  None,
      code_fence_count: 0,
    }
  }

  #[must_use]
  pub const fn in_code_block(&self) -> bool {
    self.in_code_block
  }

  /// Process a line and return the fence state after it.
  #[must_use]
  pub fn process_line(&self, line: &str) -> Self {
    let trimmed = line.trim_start();
    if !(trimmed.starts_with("```") || trimmed.starts_with("~~~")) {
      return *self;
    }
    let Some(fence_char) = trimmed.chars().next() else {
      return *self;
    };
    let fence_count = trimmed.chars().take_while(|&c| c == fence_char).count();

    if !self.in_code_block {
      return Self {
        in_code_block:    true,
        code_fence_char:  Some(fence_char),
        code_fence_count: fence_count,
      };
    }

    // A closing fence carries no info string.
    let rest = trimmed.trim_start_matches(fence_char).trim();
    if self.code_fence_char == Some(fence_char)
      && fence_count >= self.code_fence_count
      && rest.is_empty()
    {
      return Self::new();
    }

    *self
  }
}

/// What a region of the source is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
  /// Ordinary text, subject to macro expansion.
  Prose,
  /// A fenced code block, delimiters included.
  FencedCode,
  /// An inline code span, backticks included.
  InlineCode,
  /// A terminated `:::mermaid` block, delimiters included.
  Diagram,
}

/// A contiguous region of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
  pub kind: SegmentKind,
  pub text: &'a str,
}

static DIAGRAM_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("DIAGRAM_OPEN_RE", r"(?i)^[ \t]*:::[ \t]*mermaid[ \t]*\r?\n?$")
});

/// Whether `line` opens a `:::mermaid` block.
#[must_use]
pub fn is_diagram_open(line: &str) -> bool {
  DIAGRAM_OPEN_RE.is_match(line)
}

/// Whether `line` closes a `:::` block.
#[must_use]
pub fn is_diagram_close(line: &str) -> bool {
  line.trim_start().starts_with(":::")
}

/// Split `text` into prose, code and diagram segments.
///
/// An unterminated `:::mermaid` opener is left in the prose, where it stays
/// literal text. An unterminated code fence runs to the end of the input, as
/// it does for the markdown compiler.
#[must_use]
pub fn split_segments(text: &str) -> Vec<Segment<'_>> {
  let lines: Vec<(usize, &str)> = text
    .split_inclusive('\n')
    .scan(0usize, |offset, line| {
      let start = *offset;
      *offset += line.len();
      Some((start, line))
    })
    .collect();

  let mut segments = Vec::new();
  let mut prose_start = 0;
  let mut fence = FenceTracker::new();
  let mut fence_start = 0;
  let mut i = 0;

  while i < lines.len() {
    let (start, line) = lines[i];
    let end = start + line.len();

    if fence.in_code_block() {
      fence = fence.process_line(line);
      if !fence.in_code_block() {
        segments.push(Segment {
          kind: SegmentKind::FencedCode,
          text: &text[fence_start..end],
        });
        prose_start = end;
      }
      i += 1;
      continue;
    }

    let next = fence.process_line(line);
    if next.in_code_block() {
      split_inline(&text[prose_start..start], &mut segments);
      fence = next;
      fence_start = start;
      i += 1;
      continue;
    }

    if is_diagram_open(line) {
      if let Some(close) = (i + 1..lines.len()).find(|&j| is_diagram_close(lines[j].1)) {
        let (close_start, close_line) = lines[close];
        let close_end = close_start + close_line.len();
        split_inline(&text[prose_start..start], &mut segments);
        segments.push(Segment {
          kind: SegmentKind::Diagram,
          text: &text[start..close_end],
        });
        prose_start = close_end;
        i = close + 1;
        continue;
      }
    }

    i += 1;
  }

  if fence.in_code_block() {
    segments.push(Segment {
      kind: SegmentKind::FencedCode,
      text: &text[fence_start..],
    });
  } else {
    split_inline(&text[prose_start..], &mut segments);
  }

  segments
}

/// Split a prose region on inline code spans.
///
/// A span is a backtick run closed by a run of exactly the same length before
/// the next blank line; an unmatched run stays prose.
fn split_inline<'a>(text: &'a str, out: &mut Vec<Segment<'a>>) {
  if text.is_empty() {
    return;
  }

  let bytes = text.as_bytes();
  let mut prose_start = 0;
  let mut i = 0;

  while i < bytes.len() {
    if bytes[i] != b'`' {
      i += 1;
      continue;
    }
    let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
    match find_closing_run(text, i + run, run) {
      Some(close_end) => {
        if prose_start < i {
          out.push(Segment {
            kind: SegmentKind::Prose,
            text: &text[prose_start..i],
          });
        }
        out.push(Segment {
          kind: SegmentKind::InlineCode,
          text: &text[i..close_end],
        });
        prose_start = close_end;
        i = close_end;
      },
      None => i += run,
    }
  }

  if prose_start < text.len() {
    out.push(Segment {
      kind: SegmentKind::Prose,
      text: &text[prose_start..],
    });
  }
}

/// End offset of the first backtick run of exactly `len` at or after `from`.
fn find_closing_run(text: &str, from: usize, len: usize) -> Option<usize> {
  let bytes = text.as_bytes();
  let mut i = from;
  let mut line_blank = false;
  let mut at_line_start = false;

  while i < bytes.len() {
    match bytes[i] {
      b'`' => {
        let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
        if run == len {
          return Some(i + run);
        }
        i += run;
        at_line_start = false;
        continue;
      },
      b'\n' => {
        if at_line_start && line_blank {
          return None;
        }
        at_line_start = true;
        line_blank = true;
      },
      b' ' | b'\t' | b'\r' => {},
      _ => {
        at_line_start = false;
        line_blank = false;
      },
    }
    i += 1;
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(text: &str) -> Vec<(SegmentKind, &str)> {
    split_segments(text)
      .into_iter()
      .map(|s| (s.kind, s.text))
      .collect()
  }

  fn concat(text: &str) -> String {
    split_segments(text).iter().map(|s| s.text).collect()
  }

  #[test]
  fn test_fence_tracker() {
    let mut tracker = FenceTracker::new();
    tracker = tracker.process_line("```rust");
    assert!(tracker.in_code_block());
    tracker = tracker.process_line("~~~");
    assert!(tracker.in_code_block());
    tracker = tracker.process_line("````");
    assert!(!tracker.in_code_block());
  }

  #[test]
  fn test_split_is_lossless() {
    let inputs = [
      "",
      "plain",
      "a `code` b\n\n```\nfenced\n```\ntail",
      ":::mermaid\ngraph TD\n:::\nafter",
      ":::mermaid\nunterminated",
      "```\nunterminated fence\n@user",
      "``double `tick` span`` and `lone",
    ];
    for input in inputs {
      assert_eq!(concat(input), input);
    }
  }

  #[test]
  fn test_split_fenced_and_inline() {
    let segs = kinds("see `@a`\n```\n#1\n```\nend");
    assert_eq!(segs, vec![
      (SegmentKind::Prose, "see "),
      (SegmentKind::InlineCode, "`@a`"),
      (SegmentKind::Prose, "\n"),
      (SegmentKind::FencedCode, "```\n#1\n```\n"),
      (SegmentKind::Prose, "end"),
    ]);
  }

  #[test]
  fn test_split_diagram() {
    let segs = kinds("intro\n::: Mermaid\ngraph TD; A-->B\n:::\n");
    assert_eq!(segs, vec![
      (SegmentKind::Prose, "intro\n"),
      (SegmentKind::Diagram, "::: Mermaid\ngraph TD; A-->B\n:::\n"),
    ]);
  }

  #[test]
  fn test_unterminated_diagram_is_prose() {
    let segs = kinds(":::mermaid\ngraph TD");
    assert_eq!(segs, vec![(SegmentKind::Prose, ":::mermaid\ngraph TD")]);
  }

  #[test]
  fn test_inline_span_does_not_cross_blank_line() {
    let segs = kinds("a `b\n\nc` d");
    assert_eq!(segs, vec![(SegmentKind::Prose, "a `b\n\nc` d")]);
  }
}
