//! Rich text to HTML

use super::{Block, BlockKind, LinkData, Span, SpanKind};
use crate::helpers::html_escape;

/// Serialize blocks to HTML
///
/// Consecutive list items are grouped into a single `<ul>` or `<ol>`.
pub fn as_html(blocks: &[Block]) -> String {
    let mut html = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        let list = match block.kind {
            BlockKind::ListItem | BlockKind::OrderedListItem => Some(block.kind),
            _ => None,
        };

        if open_list != list {
            if let Some(kind) = open_list {
                html.push_str(list_close(kind));
            }
            if let Some(kind) = list {
                html.push_str(list_open(kind));
            }
            open_list = list;
        }

        html.push_str(&serialize_block(block));
    }

    if let Some(kind) = open_list {
        html.push_str(list_close(kind));
    }

    html
}

fn list_open(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OrderedListItem {
        "<ol>"
    } else {
        "<ul>"
    }
}

fn list_close(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OrderedListItem {
        "</ol>"
    } else {
        "</ul>"
    }
}

fn serialize_block(block: &Block) -> String {
    let text = || serialize_spans(&block.text, &block.spans);
    match block.kind {
        BlockKind::Paragraph => format!("<p>{}</p>", text()),
        BlockKind::Heading1 => format!("<h1>{}</h1>", text()),
        BlockKind::Heading2 => format!("<h2>{}</h2>", text()),
        BlockKind::Heading3 => format!("<h3>{}</h3>", text()),
        BlockKind::Heading4 => format!("<h4>{}</h4>", text()),
        BlockKind::Heading5 => format!("<h5>{}</h5>", text()),
        BlockKind::Heading6 => format!("<h6>{}</h6>", text()),
        BlockKind::Preformatted => format!("<pre>{}</pre>", text()),
        BlockKind::ListItem | BlockKind::OrderedListItem => format!("<li>{}</li>", text()),
        BlockKind::Image => serialize_image(block),
        BlockKind::Embed => serialize_embed(block),
        BlockKind::Unknown if block.text.is_empty() => String::new(),
        BlockKind::Unknown => format!("<p>{}</p>", text()),
    }
}

fn serialize_image(block: &Block) -> String {
    let Some(url) = block.url.as_deref() else {
        return String::new();
    };

    let copyright = block
        .copyright
        .as_deref()
        .map(|c| format!(r#" copyright="{}""#, html_escape(c)))
        .unwrap_or_default();
    let img = format!(
        r#"<img src="{}" alt="{}"{} />"#,
        html_escape(url),
        html_escape(block.alt.as_deref().unwrap_or("")),
        copyright
    );

    let inner = match block.link_to.as_ref().and_then(|link| link.href()) {
        Some(href) => format!(
            r#"<a href="{}"{}>{}</a>"#,
            html_escape(&href),
            target_attrs(block.link_to.as_ref()),
            img
        ),
        None => img,
    };

    format!(r#"<p class="block-img">{}</p>"#, inner)
}

fn serialize_embed(block: &Block) -> String {
    let Some(embed) = block.oembed.as_ref() else {
        return String::new();
    };

    let mut attrs = String::new();
    if let Some(url) = embed.embed_url.as_deref() {
        attrs.push_str(&format!(r#" data-oembed="{}""#, html_escape(url)));
    }
    if let Some(kind) = embed.kind.as_deref() {
        attrs.push_str(&format!(r#" data-oembed-type="{}""#, html_escape(kind)));
    }
    if let Some(provider) = embed.provider_name.as_deref() {
        attrs.push_str(&format!(
            r#" data-oembed-provider="{}""#,
            html_escape(&provider.to_lowercase())
        ));
    }

    format!(
        "<div{}>{}</div>",
        attrs,
        embed.html.as_deref().unwrap_or("")
    )
}

fn target_attrs(link: Option<&LinkData>) -> &'static str {
    match link.and_then(|l| l.target.as_deref()) {
        Some(_) => r#" target="_blank" rel="noopener""#,
        None => "",
    }
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => match span.data.href() {
            Some(href) => format!(
                r#"<a href="{}"{}>"#,
                html_escape(&href),
                target_attrs(Some(&span.data))
            ),
            None => "<span>".to_string(),
        },
        SpanKind::Label => match span.data.label.as_deref() {
            Some(label) => format!(r#"<span class="{}">"#, html_escape(label)),
            None => "<span>".to_string(),
        },
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink if span.data.href().is_some() => "</a>",
        _ => "</span>",
    }
}

/// Writes text while keeping a stack of open spans well nested
struct SpanWriter<'a> {
    out: String,
    open: Vec<&'a Span>,
}

impl<'a> SpanWriter<'a> {
    /// Close every span ending at `pos`, reopening inner spans that continue
    fn close_ended(&mut self, pos: usize) {
        let mut reopen = Vec::new();
        while self.open.iter().any(|span| span.end <= pos) {
            let Some(span) = self.open.pop() else { break };
            self.out.push_str(close_tag(span));
            if span.end > pos {
                reopen.push(span);
            }
        }
        for span in reopen.into_iter().rev() {
            self.out.push_str(&open_tag(span));
            self.open.push(span);
        }
    }

    fn open(&mut self, span: &'a Span) {
        self.out.push_str(&open_tag(span));
        self.open.push(span);
    }

    fn push_char(&mut self, c: char) {
        match c {
            '\n' => self.out.push_str("<br />"),
            '&' => self.out.push_str("&amp;"),
            '<' => self.out.push_str("&lt;"),
            '>' => self.out.push_str("&gt;"),
            '"' => self.out.push_str("&quot;"),
            '\'' => self.out.push_str("&#39;"),
            c => self.out.push(c),
        }
    }

    fn finish(mut self) -> String {
        while let Some(span) = self.open.pop() {
            self.out.push_str(close_tag(span));
        }
        self.out
    }
}

fn serialize_spans(text: &str, spans: &[Span]) -> String {
    let text_len: usize = text.chars().map(char::len_utf16).sum();

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|span| span.start < span.end && span.start < text_len)
        .collect();
    // Outer spans first when two start together
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut writer = SpanWriter {
        out: String::with_capacity(text.len()),
        open: Vec::new(),
    };
    let mut pending = spans.into_iter().peekable();
    let mut pos = 0;

    for c in text.chars() {
        writer.close_ended(pos);
        while let Some(span) = pending.next_if(|span| span.start <= pos) {
            writer.open(span);
        }
        writer.push_char(c);
        pos += c.len_utf16();
    }

    writer.finish()
}
