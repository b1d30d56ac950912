//! Viewer templating: fill the embedded HTML/CSS/JS templates for a run.
//!
//! The templates ship inside the binary (`include_str!`) and are compiled
//! once with [upon]. The only inputs are the page count, the page naming
//! convention, a title and a theme, so the same inputs always give
//! byte-identical files. Every reference in the output is relative to the
//! flipbook root; nothing points at the network.
//!
//! Output layout:
//!
//! ```text
//! index.html
//! assets/css/flipbook.css
//! assets/js/flipbook.js
//! ```

use crate::config::Theme;
use crate::error::FlipbookError;
use crate::pipeline::package::PAGES_DIR;
use crate::pipeline::sequence::PageNaming;
use serde::Serialize;
use tracing::debug;
use upon::{Engine, Template};

/// Entry document at the root of every flipbook.
pub const INDEX_FILE: &str = "index.html";

/// Stylesheet path, relative to the flipbook root.
pub const STYLESHEET_PATH: &str = "assets/css/flipbook.css";

/// Navigation script path, relative to the flipbook root.
pub const SCRIPT_PATH: &str = "assets/js/flipbook.js";

/// The viewer files in packaging order.
pub const VIEWER_FILES: [&str; 3] = [INDEX_FILE, STYLESHEET_PATH, SCRIPT_PATH];

/// Title used when neither the caller nor the document supplies one.
pub const DEFAULT_TITLE: &str = "PDF Flipbook";

/// Page-turn animation length.
const FLIP_MS: u32 = 600;

const INDEX_TEMPLATE: &str = include_str!("templates/index.html");
const STYLESHEET_TEMPLATE: &str = include_str!("templates/flipbook.css");
const SCRIPT_TEMPLATE: &str = include_str!("templates/flipbook.js");

/// Presentation options for the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerOptions {
    pub title: String,
    pub theme: Theme,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            theme: Theme::default(),
        }
    }
}

/// The three filled-in viewer files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerBundle {
    pub index_html: String,
    pub stylesheet: String,
    pub script: String,
}

impl ViewerBundle {
    /// `(relative path, contents)` for each file, in packaging order.
    pub fn files(&self) -> [(&'static str, &str); 3] {
        [
            (INDEX_FILE, self.index_html.as_str()),
            (STYLESHEET_PATH, self.stylesheet.as_str()),
            (SCRIPT_PATH, self.script.as_str()),
        ]
    }
}

/// Compiled viewer templates.
///
/// Compilation happens in [`ViewerTemplater::new`], so a broken embedded
/// template fails before any page is rendered.
pub struct ViewerTemplater {
    engine: Engine<'static>,
    index: Template<'static>,
    stylesheet: Template<'static>,
    script: Template<'static>,
}

impl ViewerTemplater {
    pub fn new() -> Result<Self, FlipbookError> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let compile = |name: &str, src: &'static str| {
            engine
                .compile(src)
                .map_err(|e| FlipbookError::Template(format!("{name}: {e}")))
        };
        let index = compile(INDEX_FILE, INDEX_TEMPLATE)?;
        let stylesheet = compile(STYLESHEET_PATH, STYLESHEET_TEMPLATE)?;
        let script = compile(SCRIPT_PATH, SCRIPT_TEMPLATE)?;
        Ok(Self {
            engine,
            index,
            stylesheet,
            script,
        })
    }

    /// Fill all three templates for a document of `page_count` pages.
    pub fn render(
        &self,
        page_count: usize,
        naming: &PageNaming,
        options: &ViewerOptions,
    ) -> Result<ViewerBundle, FlipbookError> {
        if page_count == 0 {
            return Err(FlipbookError::EmptyDocument);
        }
        let pages = (1..=page_count)
            .map(|ordinal| PageContext {
                ordinal,
                src: format!("{PAGES_DIR}/{}", naming.file_name(ordinal)),
            })
            .collect();
        let ctx = ViewerContext {
            title: &options.title,
            theme: options.theme.name(),
            stylesheet: STYLESHEET_PATH,
            script: SCRIPT_PATH,
            page_count,
            pages,
            palette: Palette::for_theme(options.theme),
            flip_ms: FLIP_MS,
        };

        let bundle = ViewerBundle {
            index_html: self.fill(INDEX_FILE, &self.index, &ctx)?,
            stylesheet: self.fill(STYLESHEET_PATH, &self.stylesheet, &ctx)?,
            script: self.fill(SCRIPT_PATH, &self.script, &ctx)?,
        };
        debug!(
            "Viewer rendered for {} pages ({} bytes of markup)",
            page_count,
            bundle.index_html.len()
        );
        Ok(bundle)
    }

    fn fill(
        &self,
        name: &str,
        template: &Template<'static>,
        ctx: &ViewerContext<'_>,
    ) -> Result<String, FlipbookError> {
        template
            .render(&self.engine, ctx)
            .to_string()
            .map_err(|e| FlipbookError::Template(format!("{name}: {e}")))
    }
}

#[derive(Serialize)]
struct ViewerContext<'a> {
    title: &'a str,
    theme: &'static str,
    stylesheet: &'static str,
    script: &'static str,
    page_count: usize,
    pages: Vec<PageContext>,
    palette: Palette,
    flip_ms: u32,
}

#[derive(Serialize)]
struct PageContext {
    ordinal: usize,
    src: String,
}

/// CSS colours for a theme.
#[derive(Serialize)]
struct Palette {
    backdrop: &'static str,
    frame: &'static str,
    stage: &'static str,
    text: &'static str,
    header: &'static str,
    accent: &'static str,
    accent_hover: &'static str,
    muted: &'static str,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Classic => Self {
                backdrop: "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
                frame: "#ffffff",
                stage: "#f8f9fa",
                text: "#333333",
                header: "#ffffff",
                accent: "#667eea",
                accent_hover: "#5a6fd8",
                muted: "#cccccc",
            },
            Theme::Dark => Self {
                backdrop: "#121212",
                frame: "#1e1e1e",
                stage: "#2a2a2a",
                text: "#e0e0e0",
                header: "#f5f5f5",
                accent: "#bb86fc",
                accent_hover: "#9a67ea",
                muted: "#444444",
            },
        }
    }
}

/// Extra [`upon`] formatters for the viewer templates.
mod addons {
    use std::fmt::Write;
    use upon::{fmt as upon_fmt, Engine, Value};

    /// Escapes a string for HTML text and double-quoted attribute values.
    fn html_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => f.write_str(&escape_html(s))?,
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(crate) fn escape_html(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
        }
        out
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("html", html_formatter);
    }
}
