const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Line(String),
    /// A nested tree, rendered one indentation level deeper.
    Block(Output),
}

/// Generated Lua as a tree of lines and indented blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    elements: Vec<Element>,
}

impl Output {
    pub fn new() -> Self {
        Output::default()
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.elements.push(Element::Line(text.into()));
    }

    pub fn block(&mut self, block: Output) {
        self.elements.push(Element::Block(block));
    }

    /// Splice `other`'s elements in at the current level.
    pub fn append(&mut self, other: Output) {
        self.elements.extend(other.elements);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Render with four spaces per nesting level. Only the first physical line
    /// of a multi-line element is indented, so long strings keep their content.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        self.collect(0, &mut lines);
        lines.join("\n")
    }

    fn collect(&self, depth: usize, lines: &mut Vec<String>) {
        for element in &self.elements {
            match element {
                Element::Line(text) if text.is_empty() => lines.push(String::new()),
                Element::Line(text) => lines.push(format!("{}{}", INDENT.repeat(depth), text)),
                Element::Block(inner) => inner.collect(depth + 1, lines),
            }
        }
    }
}
