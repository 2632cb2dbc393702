use rfg_core::error::ParseError;
use rfg_core::parse;
use rfg_core::parse::include::FragmentMap;
use rfg_core::parse::security::SecuredBy;
use rfg_core::parse::type_expr::TypeExpr;
use rfg_core::parse::types::{TypeBase, TypeDecl};

const LIBRARY: &str = include_str!("fixtures/library.raml");
const ITEMS: &str = include_str!("fixtures/items.raml");

#[test]
fn parse_library() {
    let doc = parse::from_raml(LIBRARY).unwrap();
    assert_eq!(doc.raml_version.as_deref(), Some("1.0"));
    assert_eq!(doc.title, "Library API");
    assert_eq!(doc.version, "v1");
    assert_eq!(doc.base_uri, "https://api.example.com/{version}");
    assert_eq!(doc.media_type, "application/json");
    assert_eq!(doc.protocols, vec!["HTTPS"]);

    let type_names: Vec<&String> = doc.types.keys().collect();
    assert_eq!(type_names, vec!["Entity", "Book", "Author", "Error"]);
    assert_eq!(doc.traits.len(), 2);
    assert_eq!(doc.resource_types.len(), 2);
    assert_eq!(doc.security_schemes.len(), 2);
    assert_eq!(doc.secured_by, vec![SecuredBy::Scheme("apiKey".into())]);

    let paths: Vec<&String> = doc.resources.keys().collect();
    assert_eq!(paths, vec!["/books", "/authors", "/health"]);
    assert!(doc.repeated_resources.is_empty());
}

#[test]
fn parse_type_declarations() {
    let doc = parse::from_raml(LIBRARY).unwrap();

    let TypeDecl::Full(book) = &doc.types["Book"] else {
        panic!("Book should be an expanded declaration");
    };
    assert!(matches!(
        &book.base,
        Some(TypeBase::Expr(TypeExpr::Name(name))) if name == "Entity"
    ));
    assert_eq!(book.description.as_deref(), Some("A book in the catalogue."));
    assert!(book.properties["title"].required);
    assert!(!book.properties["isbn"].required);
    assert!(!book.properties.contains_key("isbn?"));

    let TypeDecl::Full(genre) = &book.properties["genre"].decl else {
        panic!("genre should be an expanded declaration");
    };
    assert_eq!(genre.enum_values, vec!["fiction", "science", "history"]);

    assert!(matches!(
        &book.properties["tags"].decl,
        TypeDecl::Expr(TypeExpr::Array(inner)) if **inner == TypeExpr::Name("string".into())
    ));
}

#[test]
fn parse_security_schemes() {
    let doc = parse::from_raml(LIBRARY).unwrap();
    let api_key = &doc.security_schemes["apiKey"];
    assert_eq!(api_key.scheme_type, "Pass Through");
    let described = api_key.described_by.as_ref().unwrap();
    assert!(described.headers.contains_key("X-API-Key"));
    assert_eq!(doc.security_schemes["oauth"].scheme_type, "OAuth 2.0");
}

#[test]
fn parse_minimal_document() {
    let doc = parse::from_raml(ITEMS).unwrap();
    assert_eq!(doc.title, "Items");
    assert_eq!(doc.media_type, "application/json");
    assert!(doc.traits.is_empty());
    assert!(doc.secured_by.is_empty());
    assert_eq!(doc.resources.len(), 1);
}

#[test]
fn parse_defaults_for_missing_metadata() {
    let doc = parse::from_raml("#%RAML 1.0\n/ping:\n  get:\n").unwrap();
    assert_eq!(doc.title, "API");
    assert_eq!(doc.version, "1.0");
    assert_eq!(doc.base_uri, "/api");
}

#[test]
fn parse_missing_header_is_accepted() {
    let doc = parse::from_raml("title: Headless\n").unwrap();
    assert!(doc.raml_version.is_none());
    assert_eq!(doc.title, "Headless");
}

#[test]
fn parse_unsupported_version() {
    let err = parse::from_raml("#%RAML 2.0\ntitle: Future\n").unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedVersion(ref v) if v == "2.0"));
}

#[test]
fn parse_resolves_includes() {
    let fragments = FragmentMap::new()
        .with(
            "types/user.raml",
            "#%RAML 1.0 DataType\nproperties:\n  id: integer\n  email: string\n",
        )
        .with("notes.md", "Plain text notes.");
    let doc = parse::from_raml_with_includes(
        "#%RAML 1.0\ntitle: Users\ndescription: !include notes.md\ntypes:\n  User: !include types/user.raml\n",
        &fragments,
    )
    .unwrap();

    assert_eq!(doc.description.as_deref(), Some("Plain text notes."));
    let TypeDecl::Full(user) = &doc.types["User"] else {
        panic!("included type should be an expanded declaration");
    };
    assert_eq!(user.properties.len(), 2);
}

#[test]
fn parse_include_by_bare_name() {
    let fragments = FragmentMap::new().with("datatypes/Money.raml", "type: number\n");
    let doc = parse::from_raml_with_includes(
        "#%RAML 1.0\ntitle: Shop\ntypes:\n  Money: !include Money\n",
        &fragments,
    )
    .unwrap();
    assert!(doc.types.contains_key("Money"));
}

#[test]
fn parse_unresolved_include() {
    let err = parse::from_raml("#%RAML 1.0\ntitle: x\ntypes:\n  User: !include missing.raml\n")
        .unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnresolvedInclude { ref fragment, .. } if fragment == "missing.raml"
    ));
}

#[test]
fn parse_circular_include() {
    let fragments = FragmentMap::new()
        .with("a.raml", "nested: !include b.raml\n")
        .with("b.raml", "nested: !include a.raml\n");
    let err = parse::from_raml_with_includes(
        "#%RAML 1.0\ntitle: x\ntypes:\n  A: !include a.raml\n",
        &fragments,
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::CircularInclude(_)));
}

#[test]
fn parse_repeated_resource_is_kept() {
    let doc = parse::from_raml(
        "#%RAML 1.0\ntitle: x\n/users:\n  get:\n/users:\n  post:\n",
    )
    .unwrap();
    assert_eq!(doc.resources.len(), 1);
    assert_eq!(doc.repeated_resources.len(), 1);
    assert_eq!(doc.repeated_resources[0].0, "/users");
}

#[test]
fn parse_rejects_scalar_resource() {
    let err = parse::from_raml("#%RAML 1.0\ntitle: x\n/users: 42\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidStructure { .. }));
}

#[test]
fn parse_tabs_are_tolerated() {
    let doc = parse::from_raml("#%RAML 1.0\ntitle: Tabs\n/ping:\n\tget:\n").unwrap();
    assert_eq!(doc.resources.len(), 1);
}
