//! Verification-metadata rendering.
//!
//! Produces the `<component>` blocks a build tool's verification metadata
//! file expects, one per component, with one `<artifact>` block per file.
//! Rendering is a pure function of the aggregated components.

use std::fmt::{self, Write as _};

use crate::aggregate::{Artifact, Component};

const INDENT: &str = "    ";

/// Render `components` as verification-metadata text.
///
/// An empty slice renders as an empty string.
///
/// # Examples
///
/// ```
/// use verigen::aggregate::{Aggregator, Artifact, ComponentKey};
/// use verigen::digest::sha256_digest::Sha256Digest;
/// use verigen::metadata::render;
///
/// let mut aggregator = Aggregator::new();
/// let digest = Sha256Digest::of(b"foo-1.0.jar contents");
/// aggregator.record(
///     ComponentKey::new("com.example", "foo", "1.0"),
///     0,
///     Artifact::new("foo-1.0.jar", digest, "repo.maven.apache.org"),
/// );
///
/// let text = render(&aggregator.into_components());
/// assert!(text.starts_with(r#"<component group="com.example" name="foo" version="1.0">"#));
/// assert!(render(&[]).is_empty());
/// ```
#[must_use]
pub fn render(components: &[Component]) -> String {
    let mut out = String::new();
    for component in components {
        if render_component(&mut out, component).is_err() {
            // Writing into a String cannot fail.
        }
    }
    out
}

fn render_component(out: &mut String, component: &Component) -> fmt::Result {
    let key = component.key();
    writeln!(
        out,
        r#"<component group="{}" name="{}" version="{}">"#,
        escape_attr(&key.group),
        escape_attr(&key.name),
        escape_attr(&key.version)
    )?;
    for artifact in component.artifacts() {
        render_artifact(out, artifact)?;
    }
    writeln!(out, "</component>")
}

fn render_artifact(out: &mut String, artifact: &Artifact) -> fmt::Result {
    writeln!(
        out,
        r#"{INDENT}<artifact name="{}">"#,
        escape_attr(artifact.filename())
    )?;
    writeln!(
        out,
        r#"{INDENT}{INDENT}<sha256 value="{}" origin="{}"/>"#,
        artifact.sha256(),
        escape_attr(artifact.origin())
    )?;
    writeln!(out, "{INDENT}</artifact>")
}

/// Escape the characters that cannot appear raw in a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}
