//! Converts service markup into inert text for display.
//!
//! Content returned by the service is never rendered as live markup. Only
//! text nodes survive; block elements and `<br>` split paragraphs and
//! `span.highlight` marks emphasized words. Everything else (attributes,
//! scripts, styles, embedded media) is dropped.

use scraper::{ElementRef, Html};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub spans: Vec<Span>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedContent {
    pub paragraphs: Vec<Paragraph>,
}

impl RenderedContent {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub fn render_markup(markup: &str) -> RenderedContent {
    let fragment = Html::parse_fragment(markup);
    let mut builder = Builder::default();
    walk(fragment.root_element(), false, &mut builder);
    builder.finish()
}

fn walk(element: ElementRef<'_>, highlighted: bool, out: &mut Builder) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_text(text, highlighted);
            continue;
        }
        let Some(child_element) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child_element.value().name();
        if is_dropped(name) {
            continue;
        }
        if name == "br" {
            out.break_paragraph();
            continue;
        }

        let block = is_block(name);
        if block {
            out.break_paragraph();
        }
        let child_highlighted = highlighted
            || child_element
                .value()
                .attr("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == "highlight"));
        walk(child_element, child_highlighted, out);
        if block {
            out.break_paragraph();
        }
    }
}

fn is_dropped(name: &str) -> bool {
    matches!(
        name,
        "script" | "style" | "template" | "noscript" | "iframe" | "object" | "embed" | "svg"
    )
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "pre"
            | "li"
            | "blockquote"
            | "section"
            | "article"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "tr"
    )
}

#[derive(Default)]
struct Builder {
    paragraphs: Vec<Paragraph>,
    current: Vec<Span>,
    pending_space: bool,
}

impl Builder {
    fn push_text(&mut self, raw: &str, highlighted: bool) {
        let words: Vec<&str> = raw.split_whitespace().collect();
        if words.is_empty() {
            if !raw.is_empty() && !self.current.is_empty() {
                self.pending_space = true;
            }
            return;
        }

        let mut text = String::new();
        if (self.pending_space || raw.starts_with(char::is_whitespace)) && !self.current.is_empty()
        {
            text.push(' ');
        }
        text.push_str(&words.join(" "));
        self.pending_space = raw.ends_with(char::is_whitespace);

        match self.current.last_mut() {
            Some(last) if last.highlighted == highlighted => last.text.push_str(&text),
            _ => self.current.push(Span { text, highlighted }),
        }
    }

    fn break_paragraph(&mut self) {
        self.pending_space = false;
        if self.current.is_empty() {
            return;
        }
        self.paragraphs.push(Paragraph {
            spans: std::mem::take(&mut self.current),
        });
    }

    fn finish(mut self) -> RenderedContent {
        self.break_paragraph();
        RenderedContent {
            paragraphs: self.paragraphs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_paragraphs_and_marks_highlights() {
        let rendered = render_markup(
            "<p>An <span class='highlight'>important</span> finding.</p><br/><p>Second one.</p>",
        );
        assert_eq!(rendered.paragraphs.len(), 2);
        assert_eq!(
            rendered.paragraphs[0].spans,
            vec![
                Span {
                    text: "An".to_string(),
                    highlighted: false
                },
                Span {
                    text: " important".to_string(),
                    highlighted: true
                },
                Span {
                    text: " finding.".to_string(),
                    highlighted: false
                },
            ]
        );
        assert_eq!(rendered.paragraphs[0].text(), "An important finding.");
        assert_eq!(rendered.paragraphs[1].text(), "Second one.");
    }

    #[test]
    fn drops_scripts_and_attributes() {
        let rendered = render_markup(
            "<p onclick=\"steal()\">safe text</p><script>alert('x')</script><img src=x onerror=alert(1)>",
        );
        assert_eq!(rendered.plain_text(), "safe text");
    }

    #[test]
    fn plain_text_without_tags_is_one_paragraph() {
        let rendered = render_markup("just   some\n text");
        assert_eq!(rendered.plain_text(), "just some text");
    }

    #[test]
    fn entities_are_decoded_not_interpreted() {
        let rendered = render_markup("<p>&lt;b&gt;bold?&lt;/b&gt;</p>");
        assert_eq!(rendered.plain_text(), "<b>bold?</b>");
    }

    #[test]
    fn empty_markup_renders_nothing() {
        assert!(render_markup("").is_empty());
        assert!(render_markup("<br/><br/>").is_empty());
    }
}
