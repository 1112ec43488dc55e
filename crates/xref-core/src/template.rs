//! Template collaborator used by the output phase.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::{CoreError, Result};

/// Values available to a template for one output file.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Display name of the source file.
    pub filename: &'a str,
    /// Relative URL from the output file to its output root.
    pub rootpath: &'a str,
    /// Highlighted HTML of the file's contents.
    pub code: &'a str,
}

impl RenderContext<'_> {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "filename" => Some(self.filename),
            "rootpath" => Some(self.rootpath),
            "code" => Some(self.code),
            _ => None,
        }
    }
}

/// Renders one highlighted file.
pub trait Template {
    fn render(&self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> io::Result<()>;
}

pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{filename}}</title>
<link rel="stylesheet" href="{{rootpath}}code.css">
</head>
<body>
<h1>{{filename}}</h1>
<pre class="code">{{code}}</pre>
</body>
</html>
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(String),
}

/// Plain text with `{{name}}` placeholders.
///
/// Unknown placeholders render as nothing; an unterminated `{{` is literal text.
#[derive(Debug, Clone)]
pub struct SimpleTemplate {
    segments: Vec<Segment>,
}

impl SimpleTemplate {
    pub fn parse(src: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = src;
        while let Some(open) = rest.find("{{") {
            let Some(close) = rest[open + 2..].find("}}") else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let name = rest[open + 2..open + 2 + close].trim();
            segments.push(Segment::Field(name.to_string()));
            rest = &rest[open + 2 + close + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Self { segments }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let src = fs::read_to_string(path).map_err(|source| CoreError::Template {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&src))
    }

    pub fn builtin() -> Self {
        Self::parse(DEFAULT_TEMPLATE)
    }
}

impl Default for SimpleTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Template for SimpleTemplate {
    fn render(&self, ctx: &RenderContext<'_>, out: &mut dyn Write) -> io::Result<()> {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.write_all(text.as_bytes())?,
                Segment::Field(name) => {
                    if let Some(value) = ctx.field(name) {
                        out.write_all(value.as_bytes())?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(tpl: &SimpleTemplate) -> String {
        let ctx = RenderContext {
            filename: "lib/a.c",
            rootpath: "../",
            code: "<b>x</b>",
        };
        let mut out = Vec::new();
        tpl.render(&ctx, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_placeholders() {
        let tpl = SimpleTemplate::parse("[{{filename}}|{{ rootpath }}|{{code}}]");
        assert_eq!(render(&tpl), "[lib/a.c|../|<b>x</b>]");
    }

    #[test]
    fn test_unknown_and_unterminated() {
        let tpl = SimpleTemplate::parse("a{{nope}}b{{code");
        assert_eq!(render(&tpl), "ab{{code");
    }

    #[test]
    fn test_builtin_mentions_all_fields() {
        let out = render(&SimpleTemplate::builtin());
        assert!(out.contains("<title>lib/a.c</title>"));
        assert!(out.contains("href=\"../code.css\""));
        assert!(out.contains("<pre class=\"code\"><b>x</b></pre>"));
    }

    #[test]
    fn test_missing_template_file() {
        let err = SimpleTemplate::from_file(Path::new("/nonexistent/tpl.html")).unwrap_err();
        assert!(matches!(err, CoreError::Template { .. }));
    }
}
