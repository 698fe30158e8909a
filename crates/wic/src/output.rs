//! Rendering the result of a compile run: the resolved/merged/inlined
//! document serialized back to YAML on stdout, and a colorized warning
//! summary on stderr, in the teacher's `anstream`/`owo-colors` idiom.

use anstream::{eprintln, println};
use owo_colors::OwoColorize;
use wic_core::Document;
use wic_types::Warning;

pub fn render_document(document: &Document) -> anyhow::Result<()> {
    let rendered = serde_yaml::to_string(&document.to_value())?;
    println!("{rendered}");
    Ok(())
}

pub fn render_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    for warning in warnings {
        eprintln!("{}: {warning}", "warning".yellow().bold());
    }
}
