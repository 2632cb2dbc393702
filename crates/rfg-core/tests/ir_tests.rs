use rfg_core::error::{ResolveError, TransformError};
use rfg_core::ir::grouping::group_resources;
use rfg_core::ir::{
    ApiKeyLocation, HttpMethod, IrParameterLocation, IrTypeKind, PrimitiveKind, SecurityKind,
    TypeRef,
};
use rfg_core::parse;
use rfg_core::parse::include::NoIncludes;
use rfg_core::transform;

const LIBRARY: &str = include_str!("fixtures/library.raml");
const ITEMS: &str = include_str!("fixtures/items.raml");

fn load(input: &str) -> Result<rfg_core::ir::IrSpec, TransformError> {
    transform::load(input, &NoIncludes)
}

#[test]
fn transform_library() {
    let ir = load(LIBRARY).unwrap();

    assert_eq!(ir.info.title, "Library API");
    assert_eq!(ir.info.version, "v1");
    assert!(ir.warnings.is_empty(), "unexpected warnings: {:?}", ir.warnings);

    let paths: Vec<&str> = ir.all_resources().iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/books",
            "/books/{bookId}",
            "/authors",
            "/authors/{authorId}",
            "/authors/{authorId}/books",
            "/health",
        ]
    );

    let names: Vec<&str> = ir
        .all_methods()
        .iter()
        .map(|m| m.method.name.original.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "listBooks",
            "createBook",
            "getBook",
            "updateBook",
            "deleteBook",
            "listAuthors",
            "listAuthorBooks",
            "listHealth",
        ]
    );
}

#[test]
fn transform_resource_type_applies() {
    let ir = load(LIBRARY).unwrap();
    let books = &ir.resources[0];
    assert_eq!(books.description.as_deref(), Some("Collection of books"));

    let list = &books.methods[0];
    assert_eq!(list.verb, HttpMethod::Get);
    let ok = list.success_response().unwrap();
    assert_eq!(ok.status, "200");
    assert_eq!(
        ok.body.as_ref().unwrap().type_ref,
        TypeRef::Array(Box::new(TypeRef::Named("Book".into())))
    );

    let create = &books.methods[1];
    assert_eq!(create.verb, HttpMethod::Post);
    assert_eq!(create.description.as_deref(), Some("Add a Book via post"));
    assert_eq!(create.success_status(), 201);
    assert_eq!(
        create.body.as_ref().unwrap().type_ref,
        TypeRef::Named("Book".into())
    );

    // `post?` only applies where the resource declares it.
    let authors = &ir.resources[1];
    let verbs: Vec<HttpMethod> = authors.methods.iter().map(|m| m.verb).collect();
    assert_eq!(verbs, vec![HttpMethod::Get]);
}

#[test]
fn transform_traits_apply() {
    let ir = load(LIBRARY).unwrap();
    let list = &ir.resources[0].methods[0];

    let query: Vec<&str> = list.query_params().map(|p| p.original_name.as_str()).collect();
    assert_eq!(query, vec!["page", "size"]);
    let page = list.query_params().next().unwrap();
    assert!(!page.required);
    assert_eq!(page.type_ref, TypeRef::Primitive(PrimitiveKind::Integer));
    assert_eq!(page.description.as_deref(), Some("Page number"));

    let get_book = ir
        .all_methods()
        .into_iter()
        .find(|m| m.method.name.original == "getBook")
        .unwrap()
        .method;
    let statuses: Vec<&str> = get_book.responses.iter().map(|r| r.status.as_str()).collect();
    assert_eq!(statuses, vec!["200", "404"]);
    assert_eq!(
        get_book.responses[0].body.as_ref().unwrap().type_ref,
        TypeRef::Named("Book".into())
    );
    assert_eq!(
        get_book.responses[1].body.as_ref().unwrap().type_ref,
        TypeRef::Named("Error".into())
    );
}

#[test]
fn transform_path_parameters() {
    let ir = load(LIBRARY).unwrap();
    let book = &ir.resources[0].children[0];
    assert_eq!(book.segment, "/{bookId}");
    assert_eq!(book.uri_parameters.len(), 1);
    assert_eq!(book.uri_parameters[0].name.snake_case, "book_id");
    assert_eq!(
        book.uri_parameters[0].type_ref,
        TypeRef::Primitive(PrimitiveKind::Integer)
    );

    // Undeclared path parameters default to string and are inherited by children.
    let author_books = ir
        .all_methods()
        .into_iter()
        .find(|m| m.method.name.original == "listAuthorBooks")
        .unwrap()
        .method;
    let params: Vec<_> = author_books.path_params().collect();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].original_name, "authorId");
    assert_eq!(params[0].location, IrParameterLocation::Path);
    assert_eq!(params[0].type_ref, TypeRef::Primitive(PrimitiveKind::String));
    assert!(params[0].required);
}

#[test]
fn transform_types() {
    let ir = load(LIBRARY).unwrap();
    let names: Vec<&String> = ir.types.keys().collect();
    assert_eq!(
        names,
        vec![
            "Entity",
            "Book",
            "Author",
            "Error",
            "BooksBookIdPutRequestBody",
            "HealthGet200Response",
        ]
    );

    let book = ir.type_def("Book").unwrap();
    assert!(!book.synthesized);
    let object = book.as_object().unwrap();
    assert_eq!(object.parent.as_deref(), Some("Entity"));
    let genre = object.fields.iter().find(|f| f.original_name == "genre").unwrap();
    assert_eq!(genre.enum_values, vec!["fiction", "science", "history"]);

    let body = ir.type_def("BooksBookIdPutRequestBody").unwrap();
    assert!(body.synthesized);
    assert_eq!(body.as_object().unwrap().fields.len(), 2);
    assert_eq!(ir.object_types().count(), 6);
}

#[test]
fn transform_security() {
    let ir = load(LIBRARY).unwrap();

    assert_eq!(
        ir.security_schemes["apiKey"].kind,
        SecurityKind::ApiKey {
            location: ApiKeyLocation::Header,
            param_name: "X-API-Key".into()
        }
    );
    assert_eq!(ir.security_schemes["oauth"].kind, SecurityKind::OAuth2);

    let methods = ir.all_methods();
    let by_name = |name: &str| {
        methods
            .iter()
            .find(|m| m.method.name.original == name)
            .unwrap()
            .method
    };

    assert_eq!(by_name("listBooks").secured_by, vec!["apiKey"]);
    assert_eq!(by_name("createBook").secured_by, vec!["oauth"]);

    let author_books = by_name("listAuthorBooks");
    assert_eq!(author_books.secured_by, vec!["apiKey"]);
    assert!(author_books.allows_anonymous);

    let health = by_name("listHealth");
    assert!(!health.is_secured());
    assert!(health.allows_anonymous);
}

#[test]
fn transform_grouping() {
    let ir = load(LIBRARY).unwrap();
    let groups = group_resources(&ir);
    let names: Vec<&str> = groups.iter().map(|g| g.name.snake_case.as_str()).collect();
    assert_eq!(names, vec!["books", "authors", "health"]);
    assert_eq!(groups[0].methods.len(), 5);
    assert_eq!(groups[1].methods.len(), 2);
}

#[test]
fn transform_grouping_merges_equivalent_segments() {
    let ir = load(
        "#%RAML 1.0\ntitle: x\n/user-items:\n  get:\n/user_items:\n  post:\n/other:\n  get:\n",
    )
    .unwrap();
    let groups = group_resources(&ir);
    let names: Vec<&str> = groups.iter().map(|g| g.name.snake_case.as_str()).collect();
    assert_eq!(names, vec!["user_items", "other"]);
    assert_eq!(groups[0].name.original, "user-items");
    assert_eq!(groups[0].methods.len(), 2);
}

#[test]
fn transform_method_names_unique_in_snake_case() {
    let ir = load("#%RAML 1.0\ntitle: x\n/a-b-c:\n  get:\n/abc:\n  get:\n").unwrap();
    let snakes: Vec<String> = ir
        .all_methods()
        .into_iter()
        .map(|m| m.method.name.snake_case.clone())
        .collect();
    assert_eq!(snakes, vec!["list_abc", "list_abc2"]);
}

#[test]
fn transform_minimal() {
    let ir = load(ITEMS).unwrap();
    assert_eq!(ir.all_methods().len(), 2);
    let item = ir.type_def("Item").unwrap().as_object().unwrap();
    let required: Vec<bool> = item.fields.iter().map(|f| f.required).collect();
    assert_eq!(required, vec![true, true, false]);
}

#[test]
fn transform_empty_document_warns() {
    let ir = load("title: Nothing\n").unwrap();
    assert!(ir.resources.is_empty());
    let messages: Vec<&str> = ir.warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("header"));
    assert!(messages[1].contains("no resources"));
}

#[test]
fn transform_resource_without_methods_warns() {
    let ir = load("#%RAML 1.0\ntitle: x\n/empty:\n  description: nothing here\n").unwrap();
    assert_eq!(ir.resources.len(), 1);
    assert_eq!(ir.warnings.len(), 1);
    assert_eq!(ir.warnings[0].location, "/empty");
}

#[test]
fn transform_duplicate_method_repeated_key() {
    let err = load("#%RAML 1.0\ntitle: x\n/users:\n  get:\n  get:\n").unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::DuplicateMethod { ref method, ref path })
            if method == "GET" && path == "/users"
    ));
}

#[test]
fn transform_duplicate_method_across_declarations() {
    let err = load("#%RAML 1.0\ntitle: x\n/api/users:\n  get:\n/api:\n  /users:\n    get:\n")
        .unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::DuplicateMethod { ref path, .. }) if path == "/api/users"
    ));
}

#[test]
fn transform_split_declarations_merge() {
    let ir = load("#%RAML 1.0\ntitle: x\n/users:\n  get:\n/users:\n  post:\n").unwrap();
    assert_eq!(ir.resources.len(), 1);
    assert_eq!(ir.resources[0].methods.len(), 2);
}

#[test]
fn transform_unresolved_type() {
    let err = load(
        "#%RAML 1.0\ntitle: x\n/users:\n  get:\n    responses:\n      200:\n        body:\n          application/json: Ghost\n",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::UnresolvedType { ref type_name, .. }) if type_name == "Ghost"
    ));
}

#[test]
fn transform_unknown_security_scheme() {
    let err = load("#%RAML 1.0\ntitle: x\n/users:\n  get:\n    securedBy: [missing]\n").unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::UnknownSecurityScheme { ref scheme, ref context })
            if scheme == "missing" && context == "GET /users"
    ));
}

#[test]
fn transform_unknown_trait() {
    let err = load("#%RAML 1.0\ntitle: x\n/users:\n  get:\n    is: [paged]\n").unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::UnknownTrait { ref name, .. }) if name == "paged"
    ));
}

#[test]
fn transform_circular_resource_type() {
    let err = load(
        "#%RAML 1.0\ntitle: x\nresourceTypes:\n  a:\n    type: b\n  b:\n    type: a\n/users:\n  type: a\n",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::CircularResourceType(_))
    ));
}

#[test]
fn transform_circular_inheritance() {
    let err = load("#%RAML 1.0\ntitle: x\ntypes:\n  A:\n    type: B\n  B:\n    type: A\n").unwrap_err();
    assert!(matches!(
        err,
        TransformError::Resolve(ResolveError::CircularInheritance(ref cycle)) if cycle.contains("A -> B")
    ));
}

#[test]
fn transform_local_declaration_wins_over_trait() {
    let ir = load(
        "#%RAML 1.0\ntitle: x\ntraits:\n  first:\n    queryParameters:\n      q:\n        type: integer\n  second:\n    queryParameters:\n      q:\n        type: boolean\n      extra: string\n/search:\n  get:\n    is: [first, second]\n    queryParameters:\n      limit: integer\n",
    )
    .unwrap();
    let method = &ir.resources[0].methods[0];
    let params: Vec<(&str, &TypeRef)> = method
        .query_params()
        .map(|p| (p.original_name.as_str(), &p.type_ref))
        .collect();
    assert_eq!(
        params,
        vec![
            ("limit", &TypeRef::Primitive(PrimitiveKind::Integer)),
            ("q", &TypeRef::Primitive(PrimitiveKind::Integer)),
            ("extra", &TypeRef::Primitive(PrimitiveKind::String)),
        ]
    );
}

#[test]
fn transform_union_alias() {
    let ir = load(
        "#%RAML 1.0\ntitle: x\ntypes:\n  Cat:\n    properties:\n      meow: boolean\n  Dog:\n    properties:\n      bark: boolean\n  Pet: Cat | Dog\n",
    )
    .unwrap();
    assert!(matches!(&ir.type_def("Pet").unwrap().kind, IrTypeKind::Union(m) if m.len() == 2));
}

#[test]
fn transform_parse_then_transform() {
    let doc = parse::from_raml(ITEMS).unwrap();
    let ir = transform::transform(&doc).unwrap();
    assert_eq!(ir.info.base_uri, "http://localhost/api");
}
