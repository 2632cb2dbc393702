use rfg_core::config::{Facet, GenerationConfig};
use rfg_core::parse::include::NoIncludes;
use rfg_core::transform;
use rfg_core::{FacetTag, GeneratedFile};
use rfg_python::{FacetGenerator, GenerationContext, TypeMapper, check_syntax};
use rfg_python_client::{ClientGenerator, ClientTestsGenerator};

const LIBRARY: &str = include_str!("../../rfg-core/tests/fixtures/library.raml");
const ITEMS: &str = include_str!("../../rfg-core/tests/fixtures/items.raml");

fn generate(input: &str, config: &GenerationConfig) -> Vec<GeneratedFile> {
    let ir = transform::load(input, &NoIncludes).unwrap();
    let types = TypeMapper::new(&ir);
    let ctx = GenerationContext::new(&ir, &types, config);
    [&ClientGenerator as &dyn FacetGenerator, &ClientTestsGenerator]
        .iter()
        .flat_map(|g| g.generate(&ctx).unwrap())
        .collect()
}

fn client_config() -> GenerationConfig {
    GenerationConfig::with_facets([Facet::Client, Facet::Tests, Facet::Auth])
}

fn file<'a>(files: &'a [GeneratedFile], path: &str) -> &'a str {
    files
        .iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("missing {path}"))
        .content
        .as_str()
}

#[test]
fn client_layout() {
    let files = generate(LIBRARY, &client_config());
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "client/__init__.py",
            "client/api_client.py",
            "client/models.py",
            "client/exceptions.py",
            "client/pyproject.toml",
            "client/README.md",
            "client/tests/__init__.py",
            "client/tests/test_api_client.py",
        ]
    );
    assert!(files.iter().all(|f| f.path.starts_with("client/")));
    assert_eq!(files.iter().filter(|f| f.facet == FacetTag::ClientTests).count(), 2);
}

#[test]
fn generated_python_parses() {
    for input in [LIBRARY, ITEMS] {
        let files = generate(input, &client_config());
        for f in files.iter().filter(|f| f.path.ends_with(".py")) {
            if let Err(err) = check_syntax(&f.content) {
                panic!("{}: {err}\n{}", f.path, f.content);
            }
        }
    }
}

#[test]
fn one_method_per_endpoint() {
    let files = generate(LIBRARY, &client_config());
    let summary = check_syntax(file(&files, "client/api_client.py")).unwrap();
    let methods = &summary.class("ApiClient").unwrap().methods;
    for name in [
        "list_books",
        "create_book",
        "get_book",
        "update_book",
        "delete_book",
        "list_authors",
        "list_author_books",
        "list_health",
    ] {
        assert!(methods.iter().any(|m| m == name), "{name}");
    }

    let client = file(&files, "client/api_client.py");
    assert!(client.contains("    def get_book(self, book_id: int) -> Book:\n"));
    assert!(client.contains("            f\"/books/{book_id}\",\n"));
    assert!(client.contains("            params={\"page\": page, \"size\": size},\n"));
    assert!(client.contains("            json=body.to_dict(),\n"));
    assert!(client.contains("        return [Book.from_dict(item0) for item0 in data]\n"));
    assert!(client.contains("    def delete_book(self, book_id: int) -> None:\n"));
}

#[test]
fn models_share_server_names() {
    let files = generate(LIBRARY, &client_config());
    let summary = check_syntax(file(&files, "client/models.py")).unwrap();
    let classes: Vec<&str> = summary.classes.iter().map(|c| c.name.as_str()).collect();
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
    assert!(file(&files, "client/__init__.py").contains("    \"Book\",\n"));
}

#[test]
fn auth_options_follow_schemes() {
    let files = generate(LIBRARY, &client_config());
    let client = file(&files, "client/api_client.py");
    assert!(client.contains("        api_key: str | None = None,\n"));
    assert!(client.contains("            headers.setdefault(\"X-API-Key\", self.api_key)\n"));
    assert!(client.contains("        token: str | None = None,\n"));
    assert!(!client.contains("username"));

    let open = generate(LIBRARY, &GenerationConfig::with_facets([Facet::Client]));
    let client = file(&open, "client/api_client.py");
    assert!(!client.contains("api_key"));
    assert!(!client.contains("token"));
}

#[test]
fn tests_call_every_method() {
    let files = generate(LIBRARY, &client_config());
    let tests = file(&files, "client/tests/test_api_client.py");
    assert!(tests.contains("def test_list_books(client):"));
    assert!(tests.contains("        client.get_book(book_id=1)\n"));
    assert!(tests.contains("    assert url == BASE_URL + \"/books/1\"\n"));
    assert!(tests.contains("client.update_book(book_id=1, body=BooksBookIdPutRequestBody.from_dict({\"title\": \"string\"}))"));
    assert!(tests.contains("return_value=respond(None, 204)"));
    assert!(tests.contains("def test_not_found_raises(client):"));
    assert!(tests.contains("from client.models import Book, BooksBookIdPutRequestBody\n"));
}

#[test]
fn item_client_method() {
    let files = generate(ITEMS, &GenerationConfig::with_facets([Facet::Client]));
    let client = file(&files, "client/api_client.py");
    let start = client.find("    def create_item").unwrap();
    insta::assert_snapshot!(&client[start..], @r#"
        def create_item(self, body: Item) -> Item:
            """POST /items

            POST /items
            """
            data = self._request(
                "POST",
                "/items",
                json=body.to_dict(),
            )
            return Item.from_dict(data)
    "#);
}
