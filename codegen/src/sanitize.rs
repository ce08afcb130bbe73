//! Schema names to Rust identifiers.
//!
//! Both sanitizers are idempotent: feeding their output back in returns it
//! unchanged, so already sanitized names can be looked up again safely.

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Type names the generated module refers to unqualified.
const RESERVED_TYPES: &[&str] = &["Box", "Default", "Option", "Result", "Self", "String", "Vec"];

pub fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
}

/// `UpperCamelCase` identifier: every segment is title-cased, as is every
/// letter following a digit.
pub fn type_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());

    for segment in segments(name) {
        let mut upper_next = true;
        for c in segment.chars() {
            if upper_next {
                result.push(c.to_ascii_uppercase());
            } else {
                result.push(c);
            }
            upper_next = c.is_ascii_digit();
        }
    }

    if result.is_empty() {
        result.push_str("Unnamed");
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, 'N');
    }

    if is_keyword(&result) || RESERVED_TYPES.contains(&result.as_str()) {
        result.push_str("Type");
    }

    result
}

/// `snake_case` identifier for fields, parameters and functions.
pub fn field_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);

    for segment in segments(name) {
        if !result.is_empty() {
            result.push('_');
        }

        let chars = segment.chars().collect::<Vec<_>>();
        for (index, &c) in chars.iter().enumerate() {
            if c.is_ascii_uppercase() {
                let boundary = match index.checked_sub(1).map(|previous| chars[previous]) {
                    Some(previous) if previous.is_ascii_lowercase() || previous.is_ascii_digit() => {
                        true
                    }
                    Some(previous) if previous.is_ascii_uppercase() => chars
                        .get(index + 1)
                        .map_or(false, |next| next.is_ascii_lowercase()),
                    _ => false,
                };

                if boundary {
                    result.push('_');
                }
                result.push(c.to_ascii_lowercase());
            } else {
                result.push(c);
            }
        }
    }

    if result.is_empty() {
        result.push_str("field");
    }

    if result.starts_with(|c: char| c.is_ascii_digit()) {
        result.insert(0, '_');
    }

    if is_keyword(&result) {
        result.push('_');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "foo",
        "Foo",
        "fooBar",
        "foo_bar",
        "foo.bar-baz",
        "HTTPServer",
        "getHTTPResponse2Code",
        "ID",
        "1st",
        "9lives_2go",
        "type",
        "Self",
        "self",
        "String",
        "string",
        "match",
        "ns:Order",
        "A.B.C",
        "value2name",
        "__weird__",
        "Ünïcode",
    ];

    #[test]
    fn type_names() {
        assert_eq!(type_name("foo"), "Foo");
        assert_eq!(type_name("foo.bar-baz"), "FooBarBaz");
        assert_eq!(type_name("value2name"), "Value2Name");
        assert_eq!(type_name("1st"), "N1St");
        assert_eq!(type_name("String"), "StringType");
        assert_eq!(type_name("Self"), "SelfType");
        assert_eq!(type_name("ArrayOfstring"), "ArrayOfstring");
        assert_eq!(type_name(""), "Unnamed");
    }

    #[test]
    fn field_names() {
        assert_eq!(field_name("fooBar"), "foo_bar");
        assert_eq!(field_name("HTTPServer"), "http_server");
        assert_eq!(field_name("getHTTPResponse2Code"), "get_http_response2_code");
        assert_eq!(field_name("ID"), "id");
        assert_eq!(field_name("1st"), "_1st");
        assert_eq!(field_name("type"), "type_");
        assert_eq!(field_name("Self"), "self_");
        assert_eq!(field_name("foo.bar-baz"), "foo_bar_baz");
        assert_eq!(field_name(""), "field");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for sample in SAMPLES {
            let once = type_name(sample);
            assert_eq!(type_name(&once), once, "type name of {:?}", sample);

            let once = field_name(sample);
            assert_eq!(field_name(&once), once, "field name of {:?}", sample);
        }
    }

    #[test]
    fn keywords_are_avoided() {
        for keyword in KEYWORDS {
            assert!(!is_keyword(&field_name(keyword)), "{:?}", keyword);
            assert!(!is_keyword(&type_name(keyword)), "{:?}", keyword);
        }
    }
}
