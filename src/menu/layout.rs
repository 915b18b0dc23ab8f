use std::marker::PhantomData;

pub trait BoxDrawing: Copy {
    const TOP_LEFT: &'static str;
    const TOP_RIGHT: &'static str;
    const BOTTOM_LEFT: &'static str;
    const BOTTOM_RIGHT: &'static str;
    const HORIZONTAL: &'static str;
    const VERTICAL: &'static str;
    const T_RIGHT: &'static str;
    const T_LEFT: &'static str;

    fn rule(left: &str, right: &str, width: usize) -> String {
        format!(
            "{}{}{}",
            left,
            Self::HORIZONTAL.repeat(width.saturating_sub(2)),
            right
        )
    }
}

#[derive(Debug, Copy, Clone)]
pub struct DoubleBox;

impl BoxDrawing for DoubleBox {
    const TOP_LEFT: &'static str = "╔";
    const TOP_RIGHT: &'static str = "╗";
    const BOTTOM_LEFT: &'static str = "╚";
    const BOTTOM_RIGHT: &'static str = "╝";
    const HORIZONTAL: &'static str = "═";
    const VERTICAL: &'static str = "║";
    const T_RIGHT: &'static str = "╠";
    const T_LEFT: &'static str = "╣";
}

#[derive(Debug, Copy, Clone)]
pub struct SingleBox;

impl BoxDrawing for SingleBox {
    const TOP_LEFT: &'static str = "┌";
    const TOP_RIGHT: &'static str = "┐";
    const BOTTOM_LEFT: &'static str = "└";
    const BOTTOM_RIGHT: &'static str = "┘";
    const HORIZONTAL: &'static str = "─";
    const VERTICAL: &'static str = "│";
    const T_RIGHT: &'static str = "├";
    const T_LEFT: &'static str = "┤";
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Pads or truncates `text` to exactly `width` characters.
pub fn fit_text(text: &str, width: usize, align: Align) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }

    let padding = width - len;
    let (left, right) = match align {
        Align::Left => (0, padding),
        Align::Right => (padding, 0),
        Align::Center => (padding / 2, padding - padding / 2),
    };

    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Accumulates a boxed screen line by line.
pub struct MenuBuilder<B: BoxDrawing> {
    width: usize,
    lines: Vec<String>,
    _style: PhantomData<B>,
}

impl<B: BoxDrawing> MenuBuilder<B> {
    pub const MIN_WIDTH: usize = 10;

    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(Self::MIN_WIDTH),
            lines: Vec::new(),
            _style: PhantomData,
        }
    }

    fn inner(&self) -> usize {
        self.width - 2
    }

    pub fn header(self, title: &str) -> Self {
        self.box_start().line(title, Align::Center).box_end()
    }

    pub fn box_start(mut self) -> Self {
        self.lines
            .push(B::rule(B::TOP_LEFT, B::TOP_RIGHT, self.width));
        self
    }

    pub fn box_end(mut self) -> Self {
        self.lines
            .push(B::rule(B::BOTTOM_LEFT, B::BOTTOM_RIGHT, self.width));
        self
    }

    pub fn divider(mut self) -> Self {
        self.lines.push(B::rule(B::T_RIGHT, B::T_LEFT, self.width));
        self
    }

    pub fn line(mut self, content: &str, align: Align) -> Self {
        let body = fit_text(content, self.inner(), align);
        self.lines.push(format!("{}{}{}", B::VERTICAL, body, B::VERTICAL));
        self
    }

    /// Label on the left, value right-aligned, inside the box.
    pub fn row(self, label: &str, value: &str) -> Self {
        let inner = self.inner();
        let label_width = label.chars().count().min(inner);
        let value_width = inner - label_width;
        let content = format!("{}{}", label, fit_text(value, value_width, Align::Right));
        self.line(&content, Align::Left)
    }

    pub fn plain(mut self, content: &str) -> Self {
        self.lines.push(content.to_string());
        self
    }

    pub fn blank(self) -> Self {
        self.plain("")
    }

    pub fn build(self) -> Vec<String> {
        self.lines
    }
}

pub type DoubleMenu = MenuBuilder<DoubleBox>;
pub type SingleMenu = MenuBuilder<SingleBox>;
