//! Page template.
//!
//! The rendered body of each document is wrapped in a user-supplied
//! [Tera](https://keats.github.io/tera/) template (`template.html` by
//! default). The template context holds exactly two values:
//!
//! | Variable | Value |
//! |---|---|
//! | `body` | the sanitized HTML body |
//! | `date_modified` | source modification time, RFC 3339 in UTC |
//!
//! ```text
//! <main>{{ body | safe }}</main>
//! <time datetime="{{ date_modified }}">{{ date_modified | date(format="%d %B %Y") }}</time>
//! ```
//!
//! Autoescaping is off: the body is already sanitized and must reach the
//! page unchanged, so `{{ body }}` and `{{ body | safe }}` are equivalent.
//!
//! The template is compiled once up front, so a syntax error fails the run
//! before any page is written. Referencing anything other than the two
//! variables fails at render time, which is equally fatal.
//!
//! Run `mdpub --gen-template` for a ready-made starting point.

use chrono::{DateTime, SecondsFormat, Utc};
use maud::{DOCTYPE, PreEscaped, html};
use std::error::Error as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use thiserror::Error;

/// Name the page template is registered under.
const PAGE: &str = "page";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid template {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("cannot render template {origin}: {message}")]
    Render { origin: String, message: String },
}

/// A compiled page template.
#[derive(Debug, Clone)]
pub struct Template {
    tera: Tera,
    origin: String,
}

impl Template {
    /// Read and compile a template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::compile(&text, path.display().to_string())
    }

    /// Compile template text that did not come from a file.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        Self::compile(text, "<template>".to_string())
    }

    fn compile(text: &str, origin: String) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        if let Err(err) = tera.add_raw_template(PAGE, text) {
            return Err(TemplateError::Parse {
                origin,
                message: error_chain(&err),
            });
        }
        Ok(Self { tera, origin })
    }

    /// Produce the final page.
    pub fn render(&self, body: &str, modified: DateTime<Utc>) -> Result<String, TemplateError> {
        let mut context = Context::new();
        context.insert("body", body);
        context.insert(
            "date_modified",
            &modified.to_rfc3339_opts(SecondsFormat::Secs, true),
        );

        self.tera
            .render(PAGE, &context)
            .map_err(|err| TemplateError::Render {
                origin: self.origin.clone(),
                message: error_chain(&err),
            })
    }
}

/// Tera puts the useful detail (line, column, missing variable) in the
/// source chain rather than the top-level message.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

const STOCK_CSS: &str = "\
body { max-width: 46rem; margin: 2rem auto; padding: 0 1rem; font: 16px/1.6 system-ui, sans-serif; color: #111; }
pre, code { background: #f4f4f4; }
pre { padding: 0.75rem; overflow-x: auto; }
table { border-collapse: collapse; }
th, td { border: 1px solid #ddd; padding: 0.25rem 0.5rem; }
footer { margin-top: 3rem; color: #666; font-size: 0.875rem; }";

/// A complete default template, as printed by `--gen-template`.
pub fn stock_template() -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                style { (PreEscaped(STOCK_CSS)) }
            }
            body {
                main { (PreEscaped("{{ body | safe }}")) }
                footer {
                    "Last modified "
                    time datetime="{{ date_modified }}" {
                        (PreEscaped(r#"{{ date_modified | date(format="%Y-%m-%d") }}"#))
                    }
                }
            }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn when() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap()
    }

    fn render(template: &str, body: &str) -> String {
        Template::parse(template).unwrap().render(body, when()).unwrap()
    }

    #[test]
    fn body_is_inserted_verbatim() {
        assert_eq!(
            render("<main>{{ body }}</main>", "<p>a &amp; b</p>"),
            "<main><p>a &amp; b</p></main>"
        );
    }

    #[test]
    fn safe_filter_is_accepted() {
        assert_eq!(render("{{ body | safe }}", "<b>x</b>"), "<b>x</b>");
    }

    #[test]
    fn date_defaults_to_rfc3339() {
        assert_eq!(render("{{date_modified}}", ""), "2024-03-09T14:30:05Z");
    }

    #[test]
    fn date_filter_formats_timestamp() {
        assert_eq!(
            render(r#"{{ date_modified | date(format="%d %B %Y") }}"#, ""),
            "09 March 2024"
        );
    }

    #[test]
    fn literal_only_template() {
        assert_eq!(render("<p>static</p>", "ignored"), "<p>static</p>");
    }

    #[test]
    fn body_may_appear_twice() {
        assert_eq!(render("{{ body }}|{{ body }}", "x"), "x|x");
    }

    #[test]
    fn syntax_error_is_parse_error() {
        assert!(matches!(
            Template::parse("<p>{{ body </p>"),
            Err(TemplateError::Parse { .. })
        ));
        assert!(matches!(
            Template::parse("{% if body %}unclosed"),
            Err(TemplateError::Parse { .. })
        ));
    }

    #[test]
    fn unknown_variable_is_render_error() {
        let t = Template::parse("<title>{{ title }}</title>").unwrap();
        let err = t.render("", when()).unwrap_err();
        match err {
            TemplateError::Render { message, .. } => assert!(message.contains("title"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = Template::load(&tmp.path().join("template.html")).unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
    }

    #[test]
    fn load_reports_file_name_on_syntax_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.html");
        fs::write(&path, "{{ body }").unwrap();

        let err = Template::load(&path).unwrap_err().to_string();
        assert!(err.contains("page.html"), "{err}");
    }

    #[test]
    fn stock_template_compiles_and_renders() {
        let t = Template::parse(&stock_template()).unwrap();
        let page = t.render("<h1>Hi</h1>", when()).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<main><h1>Hi</h1></main>"));
        assert!(page.contains(r#"datetime="2024-03-09T14:30:05Z""#));
        assert!(page.contains("2024-03-09</time>"));
    }
}
