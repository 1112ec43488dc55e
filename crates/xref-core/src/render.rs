//! HTML rendering of a highlighted file's contents.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::highlight::{FileContent, Link, Markup};
use crate::path_map::relative_href;
use crate::symbols::{SymbolDeclaration, SymbolRegistry};

/// Render `content` as HTML for the file at `output_path`.
///
/// Markups are applied in offset order; a markup that overlaps its
/// predecessor or falls outside the text is dropped. The anchor of a markup
/// swallowed by an enclosing one is kept as an empty `<a id>` in front of the
/// enclosing tag. Every line starts with an empty `<a id="L<n>">` anchor.
pub fn render_code(output_path: &Path, content: &FileContent, registry: &SymbolRegistry) -> String {
    let text = content.text.as_deref().unwrap_or("");
    let mut markups: Vec<&Markup> = content.markups.iter().collect();
    markups.sort_by(|a, b| a.begin.cmp(&b.begin).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len() * 2);
    let mut line = 1u32;
    out.push_str("<a id=\"L1\"></a>");

    let mut pos = 0usize;
    for (i, markup) in markups.iter().enumerate() {
        let (begin, end) = (markup.begin as usize, markup.end as usize);
        if begin < pos
            || end < begin
            || end > text.len()
            || !text.is_char_boundary(begin)
            || !text.is_char_boundary(end)
        {
            debug!(
                file = %output_path.display(),
                begin, end, "dropping markup that does not fit"
            );
            continue;
        }

        write_escaped(&mut out, &text[pos..begin], &mut line);
        for inner in markups[i + 1..].iter().take_while(|m| (m.begin as usize) < end) {
            if let Some(name) = anchor_name(inner) {
                out.push_str("<a id=\"");
                push_escaped_attr(&mut out, name);
                out.push_str("\"></a>");
            }
        }
        let close = open_tag(&mut out, markup, output_path, registry);
        write_escaped(&mut out, &text[begin..end], &mut line);
        out.push_str(close);
        pos = end;
    }
    write_escaped(&mut out, &text[pos..], &mut line);
    out
}

/// Write the opening tag for `markup` and return the matching closing tag.
fn open_tag(
    out: &mut String,
    markup: &Markup,
    output_path: &Path,
    registry: &SymbolRegistry,
) -> &'static str {
    let href = link_href(&markup.link, output_path, registry);
    let class = markup.kind.css_class();
    let anchor = anchor_name(markup);

    let tag = match (&href, class, anchor) {
        (Some(_), _, _) => "a",
        (None, None, None) => return "",
        (None, _, _) => "span",
    };

    out.push('<');
    out.push_str(tag);
    if let Some(href) = &href {
        out.push_str(" href=\"");
        push_escaped_attr(out, href);
        out.push('"');
    }
    if let Some(class) = class {
        let _ = write!(out, " class=\"{}\"", class);
    }
    if let Some(name) = anchor {
        out.push_str(" id=\"");
        push_escaped_attr(out, name);
        out.push('"');
    }
    out.push('>');

    if tag == "a" {
        "</a>"
    } else {
        "</span>"
    }
}

fn anchor_name(markup: &Markup) -> Option<&str> {
    markup
        .anchor
        .as_ref()
        .map(|d| d.file_unique_name())
        .filter(|name| !name.is_empty())
}

fn link_href(link: &Link, output_path: &Path, registry: &SymbolRegistry) -> Option<String> {
    match link {
        Link::None => None,
        Link::External(url) => Some(url.clone()),
        Link::Symbol(decl) => symbol_href(decl, output_path),
        Link::MissingDef(usr) => registry
            .find_missing_def(usr)
            .and_then(|decl| symbol_href(&decl, output_path)),
    }
}

fn symbol_href(decl: &Arc<SymbolDeclaration>, output_path: &Path) -> Option<String> {
    let entry = decl.file()?;
    let mut href = relative_href(output_path, entry.highlighted().output_path());
    if !decl.is_whole_file() {
        let name = decl.file_unique_name();
        if name.is_empty() {
            let _ = write!(href, "#L{}", decl.line());
        } else {
            href.push('#');
            href.push_str(name);
        }
    }
    Some(href)
}

fn write_escaped(out: &mut String, text: &str, line: &mut u32) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\n' => {
                *line += 1;
                let _ = write!(out, "\n<a id=\"L{}\"></a>", line);
            }
            c => out.push(c),
        }
    }
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
}
