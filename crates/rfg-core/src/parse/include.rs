use indexmap::IndexMap;
use serde_yaml_ng::{Mapping, Value};

use crate::error::ParseError;

/// Supplies the text of `!include` fragments by name.
///
/// The parser never touches the filesystem; callers hand it fragments through
/// this trait (an in-memory map, a directory reader, a closure).
pub trait IncludeResolver {
    fn resolve(&self, fragment: &str) -> Option<String>;
}

impl<F> IncludeResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, fragment: &str) -> Option<String> {
        self(fragment)
    }
}

/// Rejects every include.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&self, _fragment: &str) -> Option<String> {
        None
    }
}

/// An in-memory name → text fragment collection.
#[derive(Debug, Clone, Default)]
pub struct FragmentMap {
    fragments: IndexMap<String, String>,
}

impl FragmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.fragments.insert(name.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl IncludeResolver for FragmentMap {
    fn resolve(&self, fragment: &str) -> Option<String> {
        self.fragments.get(fragment).cloned()
    }
}

/// Names tried for a fragment, in order.
pub fn candidate_names(fragment: &str) -> Vec<String> {
    let name = fragment.trim().trim_start_matches("./");
    let mut candidates = vec![name.to_string()];
    if !has_extension(name) {
        candidates.push(format!("{name}.raml"));
    }
    for dir in ["datatypes", "types"] {
        candidates.push(format!("{dir}/{name}"));
        if !has_extension(name) {
            candidates.push(format!("{dir}/{name}.raml"));
        }
    }
    candidates
}

fn has_extension(name: &str) -> bool {
    name.rsplit('/')
        .next()
        .is_some_and(|file| file.contains('.'))
}

fn is_yaml_fragment(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".raml") || lower.ends_with(".yaml") || lower.ends_with(".yml")
}

/// Replace tab characters with two spaces; YAML forbids tabs in indentation.
pub fn expand_tabs(text: &str) -> String {
    text.replace('\t', "  ")
}

/// Replace every `!include` node in the tree with the fragment it names.
///
/// Other custom tags are dropped and their values kept.
pub fn resolve_includes(root: Value, resolver: &dyn IncludeResolver) -> Result<Value, ParseError> {
    let mut stack = Vec::new();
    walk(root, resolver, &mut stack, "$")
}

fn walk(
    value: Value,
    resolver: &dyn IncludeResolver,
    stack: &mut Vec<String>,
    location: &str,
) -> Result<Value, ParseError> {
    match value {
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            if tag.trim_start_matches('!') == "include" {
                let fragment = match &tagged.value {
                    Value::String(s) => s.trim().to_string(),
                    _ => {
                        return Err(ParseError::structure(
                            location,
                            "!include expects a fragment name",
                        ));
                    }
                };
                load_fragment(&fragment, resolver, stack, location)
            } else {
                log::debug!("ignoring tag {tag} at {location}");
                walk(tagged.value, resolver, stack, location)
            }
        }
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, child) in map {
                let child_location = match &key {
                    Value::String(s) => format!("{location}.{s}"),
                    other => format!("{location}.{}", scalar_label(other)),
                };
                let child = walk(child, resolver, stack, &child_location)?;
                out.insert(key, child);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| walk(item, resolver, stack, &format!("{location}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        other => Ok(other),
    }
}

fn load_fragment(
    fragment: &str,
    resolver: &dyn IncludeResolver,
    stack: &mut Vec<String>,
    location: &str,
) -> Result<Value, ParseError> {
    let found = candidate_names(fragment)
        .into_iter()
        .find_map(|name| resolver.resolve(&name).map(|text| (name, text)));
    let Some((name, text)) = found else {
        return Err(ParseError::UnresolvedInclude {
            location: location.to_string(),
            fragment: fragment.to_string(),
        });
    };

    if stack.contains(&name) {
        let mut chain = stack.clone();
        chain.push(name);
        return Err(ParseError::CircularInclude(chain.join(" -> ")));
    }

    if !is_yaml_fragment(&name) {
        return Ok(Value::String(text));
    }

    log::debug!("including fragment {name} at {location}");
    let parsed: Value = serde_yaml_ng::from_str(&expand_tabs(&text))?;
    stack.push(name);
    let resolved = walk(parsed, resolver, stack, location);
    stack.pop();
    resolved
}

fn scalar_label(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Value {
        serde_yaml_ng::from_str(text).unwrap()
    }

    #[test]
    fn test_candidate_names() {
        assert_eq!(
            candidate_names("user"),
            vec![
                "user",
                "user.raml",
                "datatypes/user",
                "datatypes/user.raml",
                "types/user",
                "types/user.raml"
            ]
        );
        assert_eq!(
            candidate_names("./user.raml"),
            vec!["user.raml", "datatypes/user.raml", "types/user.raml"]
        );
    }

    #[test]
    fn test_resolves_yaml_fragment() {
        let fragments = FragmentMap::new().with("types/user.raml", "type: object\nproperties:\n\tname: string\n");
        let root = parse("types:\n  User: !include user\n");
        let resolved = resolve_includes(root, &fragments).unwrap();
        let user = &resolved["types"]["User"];
        assert_eq!(user["type"].as_str(), Some("object"));
        assert_eq!(user["properties"]["name"].as_str(), Some("string"));
    }

    #[test]
    fn test_non_yaml_fragment_is_text() {
        let fragments = FragmentMap::new().with("schema.json", "{\"type\": \"object\"}");
        let root = parse("schema: !include schema.json\n");
        let resolved = resolve_includes(root, &fragments).unwrap();
        assert_eq!(resolved["schema"].as_str(), Some("{\"type\": \"object\"}"));
    }

    #[test]
    fn test_missing_fragment() {
        let root = parse("types:\n  User: !include user.raml\n");
        let err = resolve_includes(root, &NoIncludes).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnresolvedInclude { ref fragment, .. } if fragment == "user.raml"
        ));
    }

    #[test]
    fn test_circular_include() {
        let fragments = FragmentMap::new()
            .with("a.raml", "next: !include b.raml\n")
            .with("b.raml", "next: !include a.raml\n");
        let root = parse("start: !include a.raml\n");
        let err = resolve_includes(root, &fragments).unwrap_err();
        assert!(matches!(err, ParseError::CircularInclude(_)));
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| (name == "title.md").then(|| "Hello".to_string());
        let root = parse("description: !include title.md\n");
        let resolved = resolve_includes(root, &resolver).unwrap();
        assert_eq!(resolved["description"].as_str(), Some("Hello"));
    }
}
