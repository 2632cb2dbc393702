use rfg_core::ir::TypeRef;
use rfg_core::parse::include::NoIncludes;
use rfg_core::transform;
use rfg_python::{TypeMapper, check_syntax};

const LIBRARY: &str = include_str!("../../rfg-core/tests/fixtures/library.raml");

fn library() -> TypeMapper {
    TypeMapper::new(&transform::load(LIBRARY, &NoIncludes).unwrap())
}

#[test]
fn models_follow_declaration_order() {
    let mapper = library();
    let classes: Vec<&str> = mapper.models().map(|m| m.class_name.as_str()).collect();
    assert_eq!(
        classes,
        vec![
            "Entity",
            "Book",
            "Author",
            "Error",
            "BooksBookIdPutRequestBody",
            "HealthGet200Response",
        ]
    );
    assert!(mapper.model("HealthGet200Response").unwrap().synthesized);
}

#[test]
fn book_inherits_entity_fields() {
    let mapper = library();
    let book = mapper.model("Book").unwrap();
    let fields: Vec<(&str, &str)> = book
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.annotation.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("id", "int"),
            ("created_at", "datetime | None"),
            ("title", "str"),
            ("isbn", "str | None"),
            ("genre", "str"),
            ("tags", "list[str]"),
        ]
    );
    assert_eq!(book.temporal, vec!["datetime"]);
    assert!(book.has_enums);
    assert_eq!(
        book.fields[1].schema_field,
        "fields.DateTime(allow_none=True, data_key=\"createdAt\")"
    );
    assert_eq!(
        book.fields[1].from_json,
        "None if data.get(\"createdAt\") is None else datetime.fromisoformat(data[\"createdAt\"])"
    );
}

#[test]
fn author_refers_to_book() {
    let mapper = library();
    let author = mapper.model("Author").unwrap();
    assert_eq!(author.refs.len(), 1);
    assert_eq!(author.refs[0].class_name, "Book");
    assert_eq!(author.refs[0].module, "book");

    let books = author.fields.iter().find(|f| f.name == "books").unwrap();
    assert_eq!(books.annotation, "list[Book] | None");
    assert_eq!(
        books.schema_field,
        "fields.List(fields.Nested(\"BookSchema\"), allow_none=True)"
    );
    assert_eq!(
        books.to_json,
        "None if self.books is None else [item0.to_dict() for item0 in self.books]"
    );
}

#[test]
fn request_body_sample_satisfies_required_fields() {
    let mapper = library();
    assert_eq!(
        mapper.sample(&TypeRef::Named("BooksBookIdPutRequestBody".into())),
        "{\"title\": \"string\"}"
    );
    insta::assert_snapshot!(
        mapper.sample(&TypeRef::Named("Book".into())),
        @r#"{"id": 1, "title": "string", "genre": "fiction", "tags": []}"#
    );
}

#[test]
fn library_maps_without_warnings() {
    assert!(library().warnings().is_empty());
}

#[test]
fn union_warning_names_the_operation() {
    let raml = "#%RAML 1.0\ntitle: x\n/things:\n  get:\n    queryParameters:\n      key: string | boolean\n";
    let mapper = TypeMapper::new(&transform::load(raml, &NoIncludes).unwrap());
    assert_eq!(mapper.warnings().len(), 1);
    assert_eq!(mapper.warnings()[0].location, "GET /things");
}

#[test]
fn samples_are_python_literals() {
    let mapper = library();
    for model in mapper.models() {
        let sample = mapper.sample(&TypeRef::Named(model.type_name.clone()));
        check_syntax(&format!("value = {sample}\n")).unwrap();
    }
}
