//! Link & asset rewriter
//!
//! Rewriting happens in two passes around the document converter.
//!
//! **Pass 1** (`prepare_markup`, on the fetched page source): every `<img>`
//! becomes `![alt](absolute-url)` and every `<a href>` becomes
//! `[text](absolute-url)`. Each snippet is kept aside and parked behind an
//! opaque token so the converter cannot escape or reflow it.
//!
//! **Pass 2** (`rewrite_markdown`, on the converter's output): Markdown
//! links the converter produced itself, and raw `<a href>` tags that
//! survived conversion, are pointed at local files. Code spans are left
//! alone.
//!
//! The parked snippets are then localized (`PreparedMarkup::localize`) and
//! put back (`PreparedMarkup::restore`). They are rewritten wherever the
//! converter placed their token, fenced code included, and are never
//! scanned a second time.
//!
//! Image references are pointed at mirrored assets and page links at the
//! filenames handed out by the path registry. Links to pages not crawled
//! yet are registered on the spot, so the page is saved under that name
//! later.

use crate::output::assets::AssetCache;
use crate::output::scan::{
    collapse_whitespace, escape_link_text, find_link_spans, format_destination, split_code_spans,
};
use crate::state::PathRegistry;
use crate::url::{reference_asset_name, Canonicalizer};
use html_escape::decode_html_entities;
use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, EndTag};
use lol_html::{element, end, text, EndTagHandler, HtmlRewriter, Settings};
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

const SNIPPET_PREFIX: &str = "MDXREF";
const CODE_PREFIX: &str = "MDXCODE";
const TOKEN_SUFFIX: char = 'Z';

const DEFAULT_ALT: &str = "image";
const DEFAULT_LINK_TEXT: &str = "link";

/// A Markdown link or image produced by pass 1
#[derive(Debug, Clone, PartialEq, Eq)]
enum Snippet {
    /// `alt` is already escaped
    Image { alt: String, dest: String },

    /// `label` is already escaped and may hold image tokens
    Link { label: String, dest: String },
}

impl Snippet {
    fn to_markdown(&self, expand_label: impl Fn(&str) -> String) -> String {
        match self {
            Snippet::Image { alt, dest } => format!("![{}]({})", alt, format_destination(dest)),
            Snippet::Link { label, dest } => {
                format!("[{}]({})", expand_label(label), format_destination(dest))
            }
        }
    }
}

/// Page source after pass 1
#[derive(Debug, Clone, Default)]
pub struct PreparedMarkup {
    /// Markup for the converter, with links and images replaced by tokens
    pub markup: String,

    /// Absolute URLs of every image, in document order
    pub images: Vec<Url>,

    snippets: Vec<Snippet>,
}

impl PreparedMarkup {
    /// Points every parked snippet at its local target
    ///
    /// Same rules as `rewrite_markdown`; snippets with no local target keep
    /// their absolute URL.
    pub fn localize(
        &mut self,
        page_url: &Url,
        canonicalizer: &Canonicalizer,
        registry: &mut PathRegistry,
        assets: &AssetCache,
    ) {
        let mut rewriter = LinkRewriter {
            page_url,
            canonicalizer,
            registry,
            assets,
        };

        for snippet in &mut self.snippets {
            let (dest, local) = match snippet {
                Snippet::Image { dest, .. } => {
                    let local = rewriter.image_destination(dest);
                    (dest, local)
                }
                Snippet::Link { dest, .. } => {
                    let local = rewriter.link_destination(dest);
                    (dest, local)
                }
            };
            if let Some(local) = local {
                *dest = local;
            }
        }
    }

    /// Replaces every token in `converted` with its Markdown snippet
    ///
    /// Tokens inside snippets (an image inside a link) are expanded too.
    /// Anything that only looks like a token is left alone.
    pub fn restore(&self, converted: &str) -> String {
        expand_tokens(converted, SNIPPET_PREFIX, |i| {
            // Labels only ever hold tokens with smaller indices
            self.snippets
                .get(i)
                .map(|snippet| snippet.to_markdown(|label| self.restore(label)))
        })
    }
}

/// Pass 1: rewrites `<img>` and `<a href>` tags into protected Markdown
///
/// Markup lol_html cannot rewrite is handed to the converter unchanged.
///
/// # Arguments
///
/// * `html` - The fetched page source
/// * `page_url` - URL the page was fetched from, used to absolutize references
///
/// # Example
///
/// ```
/// use md_crawler::output::prepare_markup;
/// use url::Url;
///
/// let page = Url::parse("https://ex.com/a/").unwrap();
/// let prepared = prepare_markup(r#"<p><a href="../b">B</a></p>"#, &page);
/// assert!(!prepared.markup.contains("<a"));
/// assert_eq!(prepared.restore(&prepared.markup), "<p>[B](https://ex.com/b)</p>");
/// ```
pub fn prepare_markup(html: &str, page_url: &Url) -> PreparedMarkup {
    match TagConverter::new(page_url, true).run(html) {
        Ok((markup, state)) => PreparedMarkup {
            markup,
            images: state.images,
            snippets: state.snippets,
        },
        Err(e) => {
            tracing::warn!("Could not rewrite tags in {}: {}", page_url, e);
            PreparedMarkup {
                markup: html.to_string(),
                ..PreparedMarkup::default()
            }
        }
    }
}

/// Pass 2: points links and images in `markdown` at local files
///
/// - Images whose basename matches a mirrored asset get its local path;
///   others are untouched.
/// - Links that canonicalize to an in-domain URL get the registry's
///   filename, registering it if needed; others are untouched.
/// - Raw `<a href>` tags that survived conversion are turned into Markdown
///   links first and rewritten the same way.
///
/// Code spans are never rewritten, but a label may contain one.
pub fn rewrite_markdown(
    markdown: &str,
    page_url: &Url,
    canonicalizer: &Canonicalizer,
    registry: &mut PathRegistry,
    assets: &AssetCache,
) -> String {
    let mut code_spans = Vec::new();
    let mut masked = String::with_capacity(markdown.len());
    for (range, is_code) in split_code_spans(markdown) {
        if is_code {
            masked.push_str(&token(CODE_PREFIX, code_spans.len()));
            code_spans.push(&markdown[range]);
        } else {
            masked.push_str(&markdown[range]);
        }
    }

    let masked = convert_residual_anchors(&masked, page_url);

    let mut rewriter = LinkRewriter {
        page_url,
        canonicalizer,
        registry,
        assets,
    };
    let rewritten = rewriter.rewrite_spans(&masked);

    expand_tokens(&rewritten, CODE_PREFIX, |i| {
        code_spans.get(i).map(|span| span.to_string())
    })
}

/// Turns raw `<a href>` tags left in Markdown into inline links
fn convert_residual_anchors(markdown: &str, page_url: &Url) -> String {
    if !markdown.to_ascii_lowercase().contains("<a") {
        return markdown.to_string();
    }
    match TagConverter::new(page_url, false).run(markdown) {
        Ok((converted, _)) => converted,
        Err(e) => {
            tracing::debug!("Leaving raw anchors in {}: {}", page_url, e);
            markdown.to_string()
        }
    }
}

/// Resolves a raw reference for pass 1; unresolvable values are kept as is
fn absolutize(page_url: &Url, raw: &str) -> (String, Option<Url>) {
    match page_url.join(raw) {
        Ok(url) => (url.to_string(), Some(url)),
        Err(_) => (raw.to_string(), None),
    }
}

fn token(prefix: &str, index: usize) -> String {
    format!("{}{}{}", prefix, index, TOKEN_SUFFIX)
}

/// Replaces `<prefix><index>Z` tokens using `lookup`
///
/// Tokens `lookup` does not know are copied through.
fn expand_tokens(text: &str, prefix: &str, lookup: impl Fn(usize) -> Option<String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find(prefix) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + prefix.len()..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let terminated = after[digits..].starts_with(TOKEN_SUFFIX);
        let replacement = after[..digits]
            .parse::<usize>()
            .ok()
            .filter(|_| terminated)
            .and_then(&lookup);

        match replacement {
            Some(replacement) => {
                out.push_str(&replacement);
                rest = &after[digits + TOKEN_SUFFIX.len_utf8()..];
            }
            None => {
                out.push_str(prefix);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Text collected for an `<a href>` whose end tag has not been seen yet
struct OpenAnchor {
    dest: String,
    text: String,
}

#[derive(Default)]
struct TagState {
    anchors: Vec<OpenAnchor>,
    snippets: Vec<Snippet>,
    images: Vec<Url>,
}

impl TagState {
    /// Parks `snippet` and returns its token, or renders it in place
    fn emit(&mut self, snippet: Snippet, protect: bool) -> String {
        if protect {
            self.snippets.push(snippet);
            token(SNIPPET_PREFIX, self.snippets.len() - 1)
        } else {
            snippet.to_markdown(str::to_string)
        }
    }
}

/// Rewrites HTML link and image tags into Markdown with lol_html
///
/// With `protect` set, snippets are replaced by tokens and images are
/// converted too; without it, only anchors are converted, inline.
struct TagConverter<'a> {
    page_url: &'a Url,
    protect: bool,
}

impl<'a> TagConverter<'a> {
    fn new(page_url: &'a Url, protect: bool) -> Self {
        Self { page_url, protect }
    }

    fn run(&self, html: &str) -> Result<(String, TagState), RewritingError> {
        let page_url = self.page_url;
        let protect = self.protect;
        let state = Rc::new(RefCell::new(TagState::default()));
        let mut output = Vec::with_capacity(html.len());

        let mut handlers = vec![
            element!("a[href]", |el| {
                let href = el
                    .get_attribute("href")
                    .map(|h| decode_html_entities(h.trim()).into_owned())
                    .unwrap_or_default();
                if href.is_empty() {
                    return Ok(());
                }
                let Some(end_handlers) = el.end_tag_handlers() else {
                    return Ok(());
                };

                let (dest, _) = absolutize(page_url, &href);
                state.borrow_mut().anchors.push(OpenAnchor {
                    dest,
                    text: String::new(),
                });

                let state = Rc::clone(&state);
                end_handlers.push(Box::new(move |end: &mut EndTag| {
                    let mut state = state.borrow_mut();
                    if let Some(anchor) = state.anchors.pop() {
                        let text = collapse_whitespace(&decode_html_entities(&anchor.text));
                        let label = if text.is_empty() {
                            DEFAULT_LINK_TEXT.to_string()
                        } else {
                            escape_link_text(&text)
                        };
                        let snippet = Snippet::Link {
                            label,
                            dest: anchor.dest,
                        };
                        let emitted = state.emit(snippet, protect);
                        // Tokens are plain text; inline Markdown must not be escaped
                        let content_type = if protect {
                            ContentType::Text
                        } else {
                            ContentType::Html
                        };
                        end.replace(&emitted, content_type);
                    }
                    Ok(())
                }) as EndTagHandler<'static>);

                el.remove_and_keep_content();
                Ok(())
            }),
            element!("a[href] *", |el| {
                if el.removed() || state.borrow().anchors.is_empty() {
                    return Ok(());
                }
                if el.tag_name() == "code" {
                    if let Some(end_handlers) = el.end_tag_handlers() {
                        push_anchor_text(&state, "`");
                        let state = Rc::clone(&state);
                        end_handlers.push(Box::new(move |_: &mut EndTag| {
                            push_anchor_text(&state, "`");
                            Ok(())
                        }) as EndTagHandler<'static>);
                    }
                }
                el.remove_and_keep_content();
                Ok(())
            }),
            text!("a[href]", |chunk| {
                let mut state = state.borrow_mut();
                if let Some(anchor) = state.anchors.last_mut() {
                    anchor.text.push_str(chunk.as_str());
                    chunk.remove();
                }
                Ok(())
            }),
        ];

        if protect {
            // Ahead of the descendant handler so images inside links become tokens
            handlers.insert(
                0,
                element!("img[src]", |el| {
                    let src = el
                        .get_attribute("src")
                        .map(|s| decode_html_entities(s.trim()).into_owned())
                        .unwrap_or_default();
                    if src.is_empty() {
                        return Ok(());
                    }

                    let (dest, resolved) = absolutize(page_url, &src);
                    let alt = el
                        .get_attribute("alt")
                        .map(|alt| collapse_whitespace(&decode_html_entities(&alt)))
                        .filter(|alt| !alt.is_empty())
                        .unwrap_or_else(|| DEFAULT_ALT.to_string());

                    let mut state = state.borrow_mut();
                    if let Some(url) = resolved {
                        if matches!(url.scheme(), "http" | "https") {
                            state.images.push(url);
                        }
                    }
                    let snippet = Snippet::Image {
                        alt: escape_link_text(&alt),
                        dest,
                    };
                    let emitted = state.emit(snippet, protect);

                    match state.anchors.last_mut() {
                        Some(anchor) => {
                            anchor.text.push_str(&emitted);
                            el.remove();
                        }
                        None => el.replace(&emitted, ContentType::Text),
                    }
                    Ok(())
                }),
            );
        }

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: handlers,
                document_content_handlers: vec![end!(|end| {
                    // Anchors never closed keep their text, just not their link
                    let mut state = state.borrow_mut();
                    for anchor in state.anchors.drain(..) {
                        tracing::debug!("Unclosed link to {}", anchor.dest);
                        end.append(&anchor.text, ContentType::Html);
                    }
                    Ok(())
                })],
                ..Settings::default()
            },
            |c: &[u8]| output.extend_from_slice(c),
        );

        rewriter.write(html.as_bytes())?;
        rewriter.end()?;

        let rewritten = String::from_utf8_lossy(&output).into_owned();
        let state = std::mem::take(&mut *state.borrow_mut());
        Ok((rewritten, state))
    }
}

fn push_anchor_text(state: &RefCell<TagState>, text: &str) {
    if let Some(anchor) = state.borrow_mut().anchors.last_mut() {
        anchor.text.push_str(text);
    }
}

/// Pass 2 state: everything needed to resolve one page's references
struct LinkRewriter<'a> {
    page_url: &'a Url,
    canonicalizer: &'a Canonicalizer,
    registry: &'a mut PathRegistry,
    assets: &'a AssetCache,
}

impl LinkRewriter<'_> {
    fn rewrite_spans(&mut self, markdown: &str) -> String {
        let mut out = String::with_capacity(markdown.len());
        let mut last = 0;

        for span in find_link_spans(markdown) {
            out.push_str(&markdown[last..span.span.start]);
            last = span.span.end;

            let label = self.rewrite_spans(&markdown[span.label.clone()]);
            let dest = &markdown[span.dest.clone()];
            let new_dest = if span.is_image {
                self.image_destination(dest)
            } else {
                self.link_destination(dest)
            };

            match new_dest {
                Some(new_dest) => {
                    if span.is_image {
                        out.push('!');
                    }
                    out.push('[');
                    out.push_str(&label);
                    out.push_str("](");
                    out.push_str(&format_destination(&new_dest));
                    if let Some(title) = span.title {
                        out.push(' ');
                        out.push_str(&markdown[title]);
                    }
                    out.push(')');
                }
                None => {
                    out.push_str(&markdown[span.span.start..span.label.start]);
                    out.push_str(&label);
                    out.push_str(&markdown[span.label.end..span.span.end]);
                }
            }
        }

        out.push_str(&markdown[last..]);
        out
    }

    fn image_destination(&self, dest: &str) -> Option<String> {
        let name = reference_asset_name(dest)?;
        self.assets.lookup(&name).map(str::to_string)
    }

    fn link_destination(&mut self, dest: &str) -> Option<String> {
        let url = self.canonicalizer.normalize(self.page_url, dest)?;
        Some(self.registry.path_for(&url).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::converter::{DocumentConverter, HtmdConverter};
    use reqwest::Client;
    use tempfile::TempDir;

    fn page() -> Url {
        Url::parse("https://ex.com/a/").unwrap()
    }

    fn canonicalizer() -> Canonicalizer {
        Canonicalizer::for_domain("ex.com")
    }

    fn pass_one(html: &str) -> String {
        let prepared = prepare_markup(html, &page());
        prepared.restore(&prepared.markup)
    }

    fn pass_two(md: &str, registry: &mut PathRegistry) -> String {
        rewrite_markdown(md, &page(), &canonicalizer(), registry, &AssetCache::disabled())
    }

    /// Pass 1, htmd, pass 2, localize and restore, as the crawler runs them
    fn full_pipeline(html: &str, registry: &mut PathRegistry) -> String {
        let mut prepared = prepare_markup(html, &page());
        let converted = HtmdConverter::new()
            .convert(&prepared.markup, "index.html")
            .unwrap();
        let assets = AssetCache::disabled();
        let body = rewrite_markdown(&converted, &page(), &canonicalizer(), registry, &assets);
        prepared.localize(&page(), &canonicalizer(), registry, &assets);
        prepared.restore(&body)
    }

    #[test]
    fn test_image_becomes_markdown() {
        assert_eq!(
            pass_one(r#"<img src="../img/logo.png" alt="Logo">"#),
            "![Logo](https://ex.com/img/logo.png)"
        );
    }

    #[test]
    fn test_default_alt_and_link_text() {
        assert_eq!(
            pass_one(r#"<img src="x.png">"#),
            "![image](https://ex.com/a/x.png)"
        );
        assert_eq!(pass_one(r#"<a href="/b"></a>"#), "[link](https://ex.com/b)");
    }

    #[test]
    fn test_link_text_cleanup() {
        assert_eq!(
            pass_one("<a href=\"/b\">\n  <span>Read</span> &amp; [learn]\n</a>"),
            r"[Read & \[learn\]](https://ex.com/b)"
        );
    }

    #[test]
    fn test_trailing_backslash_in_link_text() {
        let out = pass_one(r#"<a href="/b">C:\</a>"#);
        assert_eq!(out, r"[C:\\](https://ex.com/b)");

        let mut registry = PathRegistry::new();
        assert_eq!(pass_two(&out, &mut registry), r"[C:\\](b.md)");
    }

    #[test]
    fn test_image_inside_link() {
        assert_eq!(
            pass_one(r#"<a href="/home"><img src="/logo.png" alt="Home"></a>"#),
            "[![Home](https://ex.com/logo.png)](https://ex.com/home)"
        );
    }

    #[test]
    fn test_markup_hides_snippets_behind_tokens() {
        let prepared = prepare_markup(
            r#"<p>Go <a href="/b">there</a> <img src="/i.png"></p>"#,
            &page(),
        );
        assert_eq!(prepared.snippets.len(), 2);
        assert!(!prepared.markup.contains('['));
        assert!(prepared.markup.contains("MDXREF0Z"));
        assert_eq!(prepared.images.len(), 1);
        assert_eq!(prepared.images[0].as_str(), "https://ex.com/i.png");
    }

    #[test]
    fn test_untouched_tags() {
        let html = r#"<a name="top">Anchor</a><img alt="no src"><script>document.write('<a href="/x">x</a>')</script>"#;
        assert_eq!(pass_one(html), html);
    }

    #[test]
    fn test_unclosed_anchor_keeps_text() {
        let out = pass_one(r#"<p>Intro <a href="/b">never closed"#);
        assert!(out.starts_with("<p>Intro "));
        assert!(out.contains("never closed"));
    }

    #[test]
    fn test_restore_ignores_lookalikes() {
        let prepared = prepare_markup(r#"<a href="/b">b</a>"#, &page());
        assert_eq!(
            prepared.restore("MDXREF0Z MDXREF9Z MDXREF MDXREFxZ"),
            "[b](https://ex.com/b) MDXREF9Z MDXREF MDXREFxZ"
        );
    }

    #[test]
    fn test_tokens_survive_conversion() {
        let html = r#"<html><body><h1>Title</h1><p>See <a href="../b?x=1">the [B] page</a>.</p>
            <ul><li><a href="/c"><img src="/c.png" alt="C"></a></li></ul></body></html>"#;
        let prepared = prepare_markup(html, &page());
        let converted = HtmdConverter::new()
            .convert(&prepared.markup, "index.html")
            .unwrap();
        let restored = prepared.restore(&converted);

        assert!(restored.contains("# Title"));
        assert!(restored.contains(r"[the \[B\] page](https://ex.com/b?x=1)"));
        assert!(restored.contains("[![C](https://ex.com/c.png)](https://ex.com/c)"));
    }

    #[test]
    fn test_backticks_in_link_text() {
        let mut registry = PathRegistry::new();
        let out = full_pipeline(
            r#"<p>Call <a href="/api/run">the `run` method</a> first.</p>"#,
            &mut registry,
        );
        assert!(out.contains("[the `run` method](api_run.md)"), "{}", out);
    }

    #[test]
    fn test_inline_code_in_link_text() {
        let mut registry = PathRegistry::new();
        let out = full_pipeline(
            r#"<p>Call <a href="/api/run">the <code>run</code> method</a>.</p>"#,
            &mut registry,
        );
        assert!(out.contains("[the `run` method](api_run.md)"), "{}", out);
    }

    #[test]
    fn test_links_inside_preformatted_code() {
        let mut registry = PathRegistry::new();
        let out = full_pipeline(
            r#"<pre><code>use <a href="/std/vec">Vec</a>;</code></pre>"#,
            &mut registry,
        );
        assert!(out.contains("[Vec](std_vec.md)"), "{}", out);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_localize_leaves_remote_targets() {
        let mut registry = PathRegistry::new();
        let out = full_pipeline(
            r#"<p><a href="https://other.com/x">X</a> <img src="/pic.png" alt="P"></p>"#,
            &mut registry,
        );
        assert!(out.contains("[X](https://other.com/x)"));
        assert!(out.contains("![P](https://ex.com/pic.png)"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_link_rewritten_to_registry_filename() {
        let mut registry = PathRegistry::new();
        let out = pass_two("[B](https://ex.com/b?x=1)", &mut registry);
        let expected = crate::url::page_filename(&Url::parse("https://ex.com/b?x=1").unwrap());
        assert_eq!(out, format!("[B]({})", expected));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_forward_reference_matches_later_registration() {
        let mut registry = PathRegistry::new();
        let out = pass_two("[Guide](/guide/)", &mut registry);
        assert_eq!(out, "[Guide](guide_index.md)");

        let later = registry.path_for(&Url::parse("https://ex.com/guide/").unwrap());
        assert_eq!(&*later, "guide_index.md");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_relative_and_fragment_links() {
        let mut registry = PathRegistry::new();
        assert_eq!(pass_two("[C](c.html#part)", &mut registry), "[C](a_c_html.md)");
        assert_eq!(pass_two("[Top](#top)", &mut registry), "[Top](a_index.md)");
    }

    #[test]
    fn test_out_of_scope_links_untouched() {
        let mut registry = PathRegistry::new();
        let md = r#"[Other](https://other.com/x "Title") [Mail](mailto:me@ex.com) [Bad](http://[::1)"#;
        assert_eq!(pass_two(md, &mut registry), md);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_title_is_kept() {
        let mut registry = PathRegistry::new();
        assert_eq!(
            pass_two(r#"[B](/b "The B")"#, &mut registry),
            r#"[B](b.md "The B")"#
        );
    }

    #[test]
    fn test_code_span_in_converter_label() {
        let mut registry = PathRegistry::new();
        assert_eq!(
            pass_two("[the `run` method](/api/run)", &mut registry),
            "[the `run` method](api_run.md)"
        );
    }

    #[test]
    fn test_images_without_asset_untouched() {
        let mut registry = PathRegistry::new();
        let md = "![Logo](https://ex.com/img/logo.png)";
        assert_eq!(pass_two(md, &mut registry), md);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_images_point_at_mirrored_asset() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/logo.png"), b"png").unwrap();

        let mut assets = AssetCache::new(true, dir.path(), Client::new());
        let logo = Url::parse("https://cdn.ex.com/img/logo.png").unwrap();
        assets.localize(&logo).await.unwrap();

        let mut registry = PathRegistry::new();
        let md = "[![Home](https://cdn.ex.com/img/logo.png)](https://ex.com/) ![x](https://cdn.ex.com/other.png)";
        let out = rewrite_markdown(md, &page(), &canonicalizer(), &mut registry, &assets);
        assert_eq!(
            out,
            "[![Home](assets/logo.png)](index.md) ![x](https://cdn.ex.com/other.png)"
        );

        let mut prepared = prepare_markup(
            r#"<a href="/"><img src="https://cdn.ex.com/img/logo.png" alt="Home"></a>"#,
            &page(),
        );
        prepared.localize(&page(), &canonicalizer(), &mut registry, &assets);
        assert_eq!(
            prepared.restore(&prepared.markup),
            "[![Home](assets/logo.png)](index.md)"
        );
    }

    #[test]
    fn test_residual_anchor_rewritten() {
        let mut registry = PathRegistry::new();
        assert_eq!(
            pass_two(r#"Before <a href="/d">D page</a> after"#, &mut registry),
            "Before [D page](d.md) after"
        );
    }

    #[test]
    fn test_code_spans_untouched() {
        let mut registry = PathRegistry::new();
        let md = r#"Use `[x](/x)` or `<a href="/y">y</a>`, see [z](/z)"#;
        assert_eq!(
            pass_two(md, &mut registry),
            r#"Use `[x](/x)` or `<a href="/y">y</a>`, see [z](z.md)"#
        );
    }
}
