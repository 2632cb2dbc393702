pub mod document;
pub mod include;
pub mod loose;
pub mod reader;
pub mod security;
pub mod type_expr;
pub mod types;

use crate::error::ParseError;
use document::RamlDocument;
use include::{IncludeResolver, NoIncludes};

const SUPPORTED_VERSIONS: [&str; 2] = ["1.0", "0.8"];

/// Parse a self-contained RAML document.
pub fn from_raml(input: &str) -> Result<RamlDocument, ParseError> {
    from_raml_with_includes(input, &NoIncludes)
}

/// Parse a RAML document whose `!include` fragments come from `resolver`.
pub fn from_raml_with_includes(
    input: &str,
    resolver: &dyn IncludeResolver,
) -> Result<RamlDocument, ParseError> {
    let input = input.trim_start_matches('\u{feff}');
    let raml_version = read_header(input)?;
    let root: loose::Loose = serde_yaml_ng::from_str(&include::expand_tabs(input))?;
    let (root, repeated) = loose::into_document(root)?;
    let root = include::resolve_includes(root, resolver)?;
    let mut doc = reader::read_document(&root, raml_version)?;
    for (path, value) in repeated {
        let value = include::resolve_includes(value, resolver)?;
        doc.repeated_resources.push((path, value));
    }
    Ok(doc)
}

/// Parse raw bytes, rejecting anything that is not UTF-8.
pub fn from_bytes(bytes: &[u8], resolver: &dyn IncludeResolver) -> Result<RamlDocument, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    from_raml_with_includes(text, resolver)
}

/// Read the `#%RAML <version>` header. Returns `None` when it is missing.
fn read_header(input: &str) -> Result<Option<String>, ParseError> {
    let Some(first) = input.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(None);
    };
    let Some(rest) = first.strip_prefix("#%RAML") else {
        return Ok(None);
    };
    let version = rest.split_whitespace().next().unwrap_or_default().to_string();
    if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
        return Err(ParseError::UnsupportedVersion(version));
    }
    Ok(Some(version))
}
