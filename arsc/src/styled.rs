use quick_xml::escape::{escape, partial_escape};
use std::cmp::Ordering;
use std::iter::Peekable;

/// A markup annotation over an inclusive range of UTF-16 code units.
///
/// `tag` is the raw pool string, `name;key=value;key=value`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Span {
    pub tag: String,
    pub first_char: u32,
    pub last_char: u32,
}

impl Span {
    pub fn new(tag: impl Into<String>, first_char: u32, last_char: u32) -> Self {
        Self {
            tag: tag.into(),
            first_char,
            last_char,
        }
    }

    pub fn name(&self) -> &str {
        match self.tag.split_once(';') {
            Some((name, _)) => name,
            None => &self.tag,
        }
    }

    /// Attributes in declaration order; a pair without `=` has an empty value.
    pub fn attributes(&self) -> Vec<(&str, &str)> {
        let Some((_, attrs)) = self.tag.split_once(';') else {
            return vec![];
        };
        attrs
            .split(';')
            .filter(|attr| !attr.is_empty())
            .map(|attr| attr.split_once('=').unwrap_or((attr, "")))
            .collect()
    }

    /// Exclusive end. A span whose last char precedes its first is empty.
    fn end(&self) -> usize {
        self.last_char.wrapping_add(1) as usize
    }
}

impl Ord for Span {
    /// Outer spans sort before the spans they contain: ascending start,
    /// then descending end, then descending tag.
    fn cmp(&self, other: &Self) -> Ordering {
        self.first_char
            .cmp(&other.first_char)
            .then_with(|| (other.last_char as i32).cmp(&(self.last_char as i32)))
            .then_with(|| other.tag.cmp(&self.tag))
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Escapes text content for an XML document.
pub fn escape_text(text: &str) -> String {
    partial_escape(text).into_owned()
}

/// Renders `text` with its spans as nested HTML-like tags.
///
/// Spans are nested by position: a span starting before the end of the
/// current one is rendered inside it. Spans running past the text are cut
/// at the text end.
pub fn render(text: &str, spans: &[Span]) -> String {
    let mut spans = spans.to_vec();
    spans.sort();
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut renderer = Renderer {
        text: &units,
        out: String::with_capacity(text.len() * 2),
        last: 0,
    };
    let mut it = spans.iter().peekable();
    while it.peek().is_some() {
        renderer.span(&mut it);
    }
    if renderer.last < units.len() {
        renderer.text(renderer.last, units.len());
    }
    renderer.out
}

struct Renderer<'a> {
    text: &'a [u16],
    out: String,
    last: usize,
}

impl Renderer<'_> {
    fn text(&mut self, from: usize, to: usize) {
        let to = to.min(self.text.len());
        if from >= to {
            return;
        }
        let text = String::from_utf16_lossy(&self.text[from..to]);
        self.out.push_str(&partial_escape(&text));
    }

    fn span<'s, I: Iterator<Item = &'s Span>>(&mut self, it: &mut Peekable<I>) {
        let Some(span) = it.next() else {
            return;
        };
        let name = span.name();
        let start = span.first_char as usize;
        let end = span.end();

        if start > self.last {
            self.text(self.last, start);
        }
        self.last = start;

        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in span.attributes() {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value));
            self.out.push('"');
        }
        if start == end {
            self.out.push_str("/>");
            return;
        }
        self.out.push('>');

        while it.peek().is_some_and(|next| (next.first_char as usize) < end) {
            self.span(it);
        }

        let len = self.text.len();
        if end > self.last && len >= end {
            self.text(self.last, end);
        } else if len >= self.last && len < end {
            tracing::warn!("span <{name}> ends at {end}, past text length {len}");
            self.text(self.last, len);
        }
        self.last = end;

        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }
}
