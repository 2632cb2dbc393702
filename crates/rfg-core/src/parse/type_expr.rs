use std::fmt;

/// A RAML type expression such as `User`, `string[]`, or `(Cat | Dog)[]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Name(String),
    Array(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Name(name) => f.write_str(name),
            TypeExpr::Array(inner) => match inner.as_ref() {
                TypeExpr::Union(_) => write!(f, "({inner})[]"),
                _ => write!(f, "{inner}[]"),
            },
            TypeExpr::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

/// Parse a type expression. Returns a human-readable message on failure.
pub fn parse_type_expr(input: &str) -> Result<TypeExpr, String> {
    let mut parser = ExprParser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let expr = parser.union()?;
    parser.skip_ws();
    if parser.pos < parser.chars.len() {
        return Err(format!(
            "unexpected `{}` in type expression `{input}`",
            parser.chars[parser.pos]
        ));
    }
    Ok(expr)
}

struct ExprParser {
    chars: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn union(&mut self) -> Result<TypeExpr, String> {
        let mut members = vec![self.postfix()?];
        while self.peek() == Some('|') {
            self.pos += 1;
            members.push(self.postfix()?);
        }
        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(TypeExpr::Union(members))
        }
    }

    fn postfix(&mut self) -> Result<TypeExpr, String> {
        let mut expr = self.atom()?;
        while self.peek() == Some('[') {
            if self.chars.get(self.pos + 1) != Some(&']') {
                return Err("expected `[]`".to_string());
            }
            self.pos += 2;
            expr = TypeExpr::Array(Box::new(expr));
        }
        Ok(expr)
    }

    fn atom(&mut self) -> Result<TypeExpr, String> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.union()?;
                if self.peek() != Some(')') {
                    return Err("unbalanced parenthesis in type expression".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(c) if is_name_char(c) => {
                let start = self.pos;
                while self.pos < self.chars.len() && is_name_char(self.chars[self.pos]) {
                    self.pos += 1;
                }
                Ok(TypeExpr::Name(self.chars[start..self.pos].iter().collect()))
            }
            Some(c) => Err(format!("unexpected `{c}` in type expression")),
            None => Err("empty type expression".to_string()),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}
