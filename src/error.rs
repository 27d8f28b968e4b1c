use std::fmt::Write as _;

use crate::style::Style;
use crate::token::Position;

/// A compilation diagnostic anchored at a source position. Diagnostics
/// chain: an outer frame may carry the inner cause that produced it,
/// and rendering emits one line per frame.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub pos: Position,
    pub message: String,
    pub inner: Option<Box<Diagnostic>>,
}

impl Diagnostic {
    pub fn new(pos: Position, message: impl Into<String>) -> Self {
        Diagnostic {
            pos,
            message: message.into(),
            inner: None,
        }
    }

    pub fn caused_by(mut self, inner: Diagnostic) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    /// Canonical form: `FILE:ROW:COL: error: MESSAGE`, inner causes one
    /// per line after the outer.
    pub fn render(&self, file_name: &str) -> String {
        let mut out = String::new();
        let mut frame = Some(self);
        while let Some(diag) = frame {
            let _ = writeln!(
                out,
                "{}:{}:{}: error: {}",
                file_name, diag.pos.row, diag.pos.col, diag.message
            );
            frame = diag.inner.as_deref();
        }
        out
    }

    /// Terminal extra: the offending source line with a caret
    /// underline, for printing after the canonical form.
    pub fn source_context(&self, source: &str) -> Option<String> {
        let line = source.lines().nth(self.pos.row.saturating_sub(1) as usize)?;
        let col = self.pos.col.saturating_sub(1) as usize;
        let len = (self.pos.len as usize).max(1);
        let underline = format!("{}{}", " ".repeat(col), "^".repeat(len));
        let row_label = Style::blue(&format!("{:4}", self.pos.row));
        let pipe = Style::blue("|");
        Some(format!(
            "{} {} {}\n     {} {}",
            row_label,
            pipe,
            line,
            pipe,
            Style::red(&underline)
        ))
    }
}
