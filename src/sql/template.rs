//! Compile a SQL template into canonical SQL with `?` placeholders.
//!
//! Three parameter forms are recognised, scanned left to right:
//! - `${name}`: bind placeholder from the request body.
//! - `${stmt.field}`: bind placeholder from an earlier statement's result (contains a dot).
//! - `#{name}`: textual substitution, left in place for the resolver.
//!
//! Contents are matched non-greedily; nested braces are not supported. Any string parses.

use crate::config::{ParamKind, SqlParam, SqlTemplate};
use regex::Regex;
use std::sync::OnceLock;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([$#])\{(.*?)\}").expect("static token pattern"))
}

pub fn parse_template(raw: &str) -> SqlTemplate {
    let mut sql = String::with_capacity(raw.len());
    let mut bind_list = Vec::new();
    let mut text_subs = Vec::new();
    let mut last = 0;

    for caps in token_re().captures_iter(raw) {
        let (Some(whole), Some(sigil), Some(key)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let key = key.as_str().trim();
        sql.push_str(&raw[last..whole.start()]);
        if sigil.as_str() == "$" {
            let kind = if key.contains('.') {
                ParamKind::Result
            } else {
                ParamKind::Post
            };
            bind_list.push(SqlParam::new(kind, key));
            sql.push('?');
        } else {
            text_subs.push(SqlParam::new(ParamKind::Param, key));
            sql.push_str(whole.as_str());
        }
        last = whole.end();
    }
    sql.push_str(&raw[last..]);

    SqlTemplate {
        sql_origin: sql,
        bind_list,
        text_subs,
    }
}

/// Replace every `#{name}` token in `sql` with `lookup(name)`, whatever whitespace surrounds the name.
/// `${…}` tokens are left untouched.
pub fn substitute_text(sql: &str, mut lookup: impl FnMut(&str) -> String) -> String {
    token_re()
        .replace_all(sql, |caps: &regex::Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            match (caps.get(1).map(|m| m.as_str()), caps.get(2)) {
                (Some("#"), Some(key)) => lookup(key.as_str().trim()),
                _ => whole.to_string(),
            }
        })
        .into_owned()
}

/// If `s` contains a `${name}` token, return the first token's name.
pub fn bind_token(s: &str) -> Option<(&str, std::ops::Range<usize>)> {
    token_re()
        .captures_iter(s)
        .find(|c| c.get(1).map(|m| m.as_str()) == Some("$"))
        .and_then(|c| Some((c.get(2)?.as_str().trim(), c.get(0)?.range())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_the_three_forms() {
        let t = parse_template("INSERT INTO t(a, b, c) VALUES (${name}, ${u.id}, '#{tag}')");
        assert_eq!(t.sql_origin, "INSERT INTO t(a, b, c) VALUES (?, ?, '#{tag}')");
        assert_eq!(
            t.bind_list,
            vec![
                SqlParam::new(ParamKind::Post, "name"),
                SqlParam::new(ParamKind::Result, "u.id"),
            ]
        );
        assert_eq!(t.text_subs, vec![SqlParam::new(ParamKind::Param, "tag")]);
    }

    #[test]
    fn placeholder_count_matches_bind_list() {
        for raw in [
            "SELECT 1",
            "SELECT * FROM #{t} WHERE a = ${a} AND b = ${b} OR c = ${x.y}",
            "${a}${b}${c}",
            "UPDATE t SET v = ${v} ORDER BY #{col} #{dir}",
        ] {
            let t = parse_template(raw);
            assert_eq!(t.sql_origin.matches('?').count(), t.bind_list.len(), "{}", raw);
        }
    }

    #[test]
    fn matches_non_greedily() {
        let t = parse_template("${a}} and ${b}");
        assert_eq!(t.sql_origin, "?} and ?");
        assert_eq!(t.bind_list.len(), 2);
        assert_eq!(t.bind_list[0].key, "a");
    }

    #[test]
    fn no_parameters_gives_empty_lists() {
        let t = parse_template("SELECT COUNT(*) FROM users");
        assert_eq!(t.sql_origin, "SELECT COUNT(*) FROM users");
        assert!(t.bind_list.is_empty());
        assert!(t.text_subs.is_empty());
    }

    #[test]
    fn unterminated_token_is_literal() {
        let t = parse_template("SELECT '${oops' FROM t");
        assert_eq!(t.sql_origin, "SELECT '${oops' FROM t");
        assert!(t.bind_list.is_empty());
    }

    #[test]
    fn repeated_text_sub_is_listed_per_occurrence() {
        let t = parse_template("SELECT #{c} FROM t ORDER BY #{c}");
        assert_eq!(t.text_subs.len(), 2);
    }

    #[test]
    fn text_tokens_with_padding_are_substituted() {
        let t = parse_template("SELECT * FROM t ORDER BY #{ col } #{dir}");
        assert_eq!(t.text_subs[0].key, "col");
        let sql = substitute_text(&t.sql_origin, |k| match k {
            "col" => "name".into(),
            "dir" => "DESC".into(),
            _ => String::new(),
        });
        assert_eq!(sql, "SELECT * FROM t ORDER BY name DESC");
        assert_eq!(substitute_text("a = ${x}", |_| "no".into()), "a = ${x}");
    }

    #[test]
    fn finds_table_token() {
        assert_eq!(bind_token("${tbl}"), Some(("tbl", 0..6)));
        assert_eq!(bind_token("log_${month}").map(|(k, _)| k), Some("month"));
        assert_eq!(bind_token("users"), None);
        assert_eq!(bind_token("#{t}"), None);
    }
}
