//! Production render backend.
//!
//! Built once per build from the site's `page` template and shared by
//! reference with every worker; there is no process-wide renderer state.
//!
//! Code blocks are tokenized with syntect into `<span>`s named after their
//! scopes (`string quoted double rust`, `comment line`, ...), inside a
//! `<div class="highlight">`. The syntax theme's selectors target those
//! scope names.

use super::backend::{MinifyError, MinifyKind, PageContext, RenderBackend, TemplateError};
use crate::config::SiteConfig;
use handlebars::Handlebars;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::fs;
use std::path::Path;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Name the page template is registered under.
pub const PAGE_TEMPLATE: &str = "page";

pub struct StandardBackend {
    templates: Handlebars<'static>,
    html_cfg: minify_html::Cfg,
    syntaxes: SyntaxSet,
}

impl StandardBackend {
    /// Load the `page` template from the site's template directory.
    pub fn from_config(config: &SiteConfig) -> Result<Self, TemplateError> {
        Self::from_template_file(&config.template_path())
    }

    pub fn from_template_file(path: &Path) -> Result<Self, TemplateError> {
        let source = fs::read_to_string(path).map_err(|_| TemplateError::Missing(path.into()))?;
        Self::from_template_str(&source)
    }

    pub fn from_template_str(source: &str) -> Result<Self, TemplateError> {
        let mut templates = Handlebars::new();
        // Missing fields are errors, not empty strings
        templates.set_strict_mode(true);
        templates
            .register_template_string(PAGE_TEMPLATE, source)
            .map_err(|e| TemplateError::Parse(e.to_string()))?;

        let mut html_cfg = minify_html::Cfg::new();
        html_cfg.keep_closing_tags = true;
        html_cfg.keep_html_and_head_opening_tags = true;
        html_cfg.keep_comments = false;
        html_cfg.minify_css = true;
        html_cfg.minify_js = true;
        html_cfg.remove_bangs = true;
        html_cfg.remove_processing_instructions = true;

        Ok(Self {
            templates,
            html_cfg,
            syntaxes: SyntaxSet::load_defaults_newlines(),
        })
    }

    /// A complete `.highlight` block for one code block's text.
    fn highlight_block(&self, lang: &str, code: &str) -> String {
        let body = self
            .classed_html(lang, code)
            .unwrap_or_else(|_| escape_html(code));
        let class = if lang.is_empty() {
            String::new()
        } else {
            format!(r#" class="language-{}""#, escape_html(lang))
        };
        format!(r#"<div class="highlight"><pre><code{class}>{body}</code></pre></div>"#)
    }

    fn classed_html(&self, lang: &str, code: &str) -> Result<String, syntect::Error> {
        let syntax = self
            .syntaxes
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl RenderBackend for StandardBackend {
    fn markdown(&self, source: &[u8]) -> Vec<u8> {
        let text = String::from_utf8_lossy(source);
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let mut events = Vec::new();
        // Language and buffered text of the code block being read
        let mut code: Option<(String, String)> = None;
        for event in Parser::new_ext(&text, options) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or("").to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    code = Some((lang, String::new()));
                }
                Event::Text(chunk) if code.is_some() => {
                    if let Some((_, buf)) = code.as_mut() {
                        buf.push_str(&chunk);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, buf)) = code.take() {
                        let block = self.highlight_block(&lang, &buf);
                        events.push(Event::Html(CowStr::from(block)));
                    }
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out.into_bytes()
    }

    fn render_page(&self, page: &PageContext<'_>) -> Result<Vec<u8>, TemplateError> {
        self.templates
            .render(PAGE_TEMPLATE, page)
            .map(String::into_bytes)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    fn minify(&self, kind: MinifyKind, input: &[u8]) -> Result<Vec<u8>, MinifyError> {
        match kind {
            MinifyKind::Html => Ok(minify_html::minify(input, &self.html_cfg)),
            MinifyKind::Css => minify_css(input).map_err(|reason| MinifyError { kind, reason }),
        }
    }
}

fn minify_css(input: &[u8]) -> Result<Vec<u8>, String> {
    let source = std::str::from_utf8(input).map_err(|e| e.to_string())?;
    let sheet = StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(printed.code.into_bytes())
}
