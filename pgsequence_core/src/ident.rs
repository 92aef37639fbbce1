//! PostgreSQL identifier quoting.

/// Quote a single identifier part, doubling embedded double quotes.
pub fn quote_ident(part: &str) -> String {
    let mut quoted = String::with_capacity(part.len() + 2);
    quoted.push('"');
    for c in part.chars() {
        if c == '"' {
            quoted.push('"');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Split a possibly schema-qualified name on dots that are not inside
/// double quotes.
pub fn split_qualified_name(name: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (index, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                parts.push(&name[start..index]);
                start = index + 1;
            }
            _ => (),
        }
    }
    parts.push(&name[start..]);
    parts
}

// Inside a quoted identifier every double quote must be doubled.
fn is_escaped(inner: &str) -> bool {
    !inner.replace("\"\"", "").contains('"')
}

/// Quote a table-like name (table, sequence, view) for use in DDL.
///
/// `order_id_seq` becomes `"order_id_seq"`, `sales.order_id_seq` becomes
/// `"sales"."order_id_seq"`. Parts that are already correctly quoted are kept
/// as given; a quoted part with a stray quote inside is re-quoted as a whole.
pub fn quote_table_name(name: &str) -> String {
    split_qualified_name(name)
        .into_iter()
        .map(
            |part| match part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
                Some(inner) if is_escaped(inner) => part.to_string(),
                Some(inner) => quote_ident(inner),
                None => quote_ident(part),
            },
        )
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_name() {
        assert_eq!(quote_table_name("order_id_seq"), "\"order_id_seq\"");
    }

    #[test]
    fn quotes_schema_qualified_name() {
        assert_eq!(
            quote_table_name("sales.order_id_seq"),
            "\"sales\".\"order_id_seq\""
        );
    }

    #[test]
    fn keeps_quoted_parts() {
        assert_eq!(
            quote_table_name("\"Sales\".order_id_seq"),
            "\"Sales\".\"order_id_seq\""
        );
        assert_eq!(quote_table_name("\"odd.name\""), "\"odd.name\"");
    }

    #[test]
    fn keeps_escaped_quotes_in_quoted_parts() {
        assert_eq!(quote_table_name("\"we\"\"ird\""), "\"we\"\"ird\"");
        assert_eq!(quote_table_name("\"\"\"\""), "\"\"\"\"");
    }

    #[test]
    fn requotes_stray_quotes_in_quoted_parts() {
        assert_eq!(quote_table_name("\"a\"b\""), "\"a\"\"b\"");
        assert_eq!(
            quote_table_name("\"x\"; DROP TABLE t; --\""),
            "\"x\"\"; DROP TABLE t; --\""
        );
        assert_eq!(quote_table_name("\""), "\"\"\"\"");
        assert_eq!(quote_table_name("\"abc"), "\"\"\"abc\"");
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn split_ignores_dots_in_quotes() {
        assert_eq!(
            split_qualified_name("\"a.b\".c"),
            vec!["\"a.b\"", "c"]
        );
        assert_eq!(split_qualified_name("seq"), vec!["seq"]);
    }
}
