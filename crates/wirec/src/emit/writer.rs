const INDENT: &str = "    ";

/// Line-oriented source buffer with block indentation.
#[derive(Debug, Default)]
pub(crate) struct SourceWriter {
    out: String,
    indent: usize,
}

impl SourceWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn line(&mut self, s: &str) {
        if !s.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str(INDENT);
            }
            self.out.push_str(s);
        }
        self.out.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    pub(crate) fn doc(&mut self, text: &str) {
        if text.is_empty() {
            self.line("///");
        } else {
            self.line(&format!("/// {text}"));
        }
    }

    /// Writes `header {` and indents; an empty header opens a bare block.
    pub(crate) fn open_block(&mut self, header: &str) {
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(&format!("{header} {{"));
        }
        self.indent += 1;
    }

    /// Indents continuation lines without opening a block.
    pub(crate) fn indent(&mut self) {
        self.indent += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub(crate) fn close_block(&mut self) {
        self.close_block_with("}");
    }

    /// Dedents and writes `closer`, e.g. `},` or `});`.
    pub(crate) fn close_block_with(&mut self, closer: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(closer);
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
