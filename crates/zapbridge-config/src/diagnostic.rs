// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics rendered through miette.
//!
//! Figment reports problems as a flat error chain. This module turns each
//! link into a [`ConfigError`] that points at the offending line of
//! `zapbridge.toml` when the file is known, and offers a nearby key name
//! when an unknown key looks like a typo.

#![allow(unused_assignments)] // emitted by the Diagnostic derive

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a candidate must beat before it is offered.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Key not accepted by the section it appears in.
    #[error("unknown key `{key}` in {}", section_label(section))]
    #[diagnostic(
        code(zapbridge::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted table path, empty at the top level.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(zapbridge::config::invalid_type), help("use {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` is required")]
    #[diagnostic(
        code(zapbridge::config::missing_key),
        help("set `{key}` in zapbridge.toml or through a ZAPBRIDGE_ variable")
    )]
    MissingKey { key: String },

    /// Parsed fine but the value is not usable.
    #[error("{message}")]
    #[diagnostic(
        code(zapbridge::config::validation),
        help("check `{key}` in zapbridge.toml")
    )]
    Validation { key: String, message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(zapbridge::config::other))]
    Other(String),
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top-level table".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("perhaps `{s}`? accepted keys: {valid_keys}"),
        None => format!("accepted keys: {valid_keys}"),
    }
}

/// Where a key lives in the loaded TOML text.
struct Located {
    span: SourceSpan,
    src: NamedSource<String>,
}

/// Expand a figment error chain into one diagnostic per problem.
///
/// `toml_sources` pairs each file path figment read with its contents,
/// and is used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(field, expected) => {
                    let located = locate(&error, &path, field, toml_sources);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: path.join("."),
                        suggestion: suggest_key(field, expected),
                        valid_keys: expected.join(", "),
                        span: located.as_ref().map(|l| l.span),
                        src: located.map(|l| l.src),
                    }
                }
                Kind::MissingField(field) => {
                    let mut full = path.clone();
                    full.push(field.to_string());
                    ConfigError::MissingKey {
                        key: full.join("."),
                    }
                }
                Kind::InvalidType(found, expected) => {
                    let located = path.split_last().and_then(|(field, section)| {
                        locate(&error, section, field, toml_sources)
                    });
                    ConfigError::InvalidType {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.clone(),
                        span: located.as_ref().map(|l| l.span),
                        src: located.map(|l| l.src),
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn locate(
    error: &figment::Error,
    section: &[String],
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<Located> {
    let origin = match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => path.display().to_string(),
        _ => return None,
    };
    let (name, content) = toml_sources.iter().find(|(name, _)| *name == origin)?;
    let offset = find_key_offset(content, section, field)?;
    Some(Located {
        span: SourceSpan::new(offset.into(), field.len()),
        src: NamedSource::new(name, content.clone()),
    })
}

/// Byte offset of `field` inside the table named by `section`.
///
/// Tracks `[table]` headers line by line so a key with the same name in a
/// different table is never matched. Comment lines are skipped.
pub fn find_key_offset(content: &str, section: &[String], field: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut current = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let body = line.trim_start();
        let indent = line.len() - body.len();
        if body.starts_with('#') {
            continue;
        }
        if let Some(rest) = body.strip_prefix('[') {
            if let Some(end) = rest.find(']') {
                current = rest[..end].trim().to_string();
                continue;
            }
        }
        if current != wanted {
            continue;
        }
        let Some(after) = body.strip_prefix(field) else {
            continue;
        };
        if after.trim_start().starts_with('=') {
            return Some(start + indent);
        }
    }

    None
}

/// Closest accepted key to `unknown`, if one is similar enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print every diagnostic to stderr, preceded by a count.
pub fn render_errors(errors: &[ConfigError]) {
    let plural = if errors.len() == 1 { "" } else { "s" };
    eprintln!("zapbridge.toml: {} problem{plural} found", errors.len());

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("  - {error}"),
        }
    }
}
