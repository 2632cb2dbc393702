use heck::{ToPascalCase, ToSnakeCase};

/// Reserved words that cannot be used as Python identifiers.
const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// A snake_case Python identifier for a field, parameter, or function.
///
/// `X-API-Key` → `x_api_key`, `class` → `class_`, `2fa` → `f_2fa`.
pub fn py_ident(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let mut ident = cleaned.to_snake_case();
    if ident.is_empty() {
        ident = "value".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident = format!("f_{ident}");
    }
    if is_keyword(&ident) {
        ident.push('_');
    }
    ident
}

/// A PascalCase Python class name.
pub fn py_class(name: &str) -> String {
    let mut class = name.to_pascal_case();
    if class.is_empty() {
        class = "Model".to_string();
    }
    if class.starts_with(|c: char| c.is_ascii_digit()) {
        class = format!("T{class}");
    }
    if is_keyword(&class) {
        class.push('_');
    }
    class
}

/// Module (file stem) for a class, e.g. `OrderItem` → `order_item`.
pub fn py_module(class: &str) -> String {
    py_ident(class)
}

/// A double-quoted Python string literal.
pub fn py_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Make text safe inside a `"""` docstring.
pub fn escape_docstring(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_py_ident() {
        assert_eq!(py_ident("bookId"), "book_id");
        assert_eq!(py_ident("X-API-Key"), "x_api_key");
        assert_eq!(py_ident("class"), "class_");
        assert_eq!(py_ident("from"), "from_");
        assert_eq!(py_ident("2fa"), "f_2fa");
        assert_eq!(py_ident("$$"), "value");
    }

    #[test]
    fn test_py_class() {
        assert_eq!(py_class("order_item"), "OrderItem");
        assert_eq!(py_class("Book"), "Book");
        assert_eq!(py_class("3d"), "T3d");
    }

    #[test]
    fn test_py_str() {
        assert_eq!(py_str("plain"), "\"plain\"");
        assert_eq!(py_str("say \"hi\"\n"), "\"say \\\"hi\\\"\\n\"");
        assert_eq!(py_str("a\\b"), "\"a\\\\b\"");
        assert_eq!(py_str("\u{1}"), "\"\\x01\"");
    }

    #[test]
    fn test_escape_docstring() {
        assert_eq!(escape_docstring("ends with \"\"\""), "ends with \\\"\\\"\\\"");
        assert_eq!(escape_docstring("C:\\path"), "C:\\\\path");
    }
}
