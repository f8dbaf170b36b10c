//! Relaxed json: the json dialect the game stores rules and statistics in.
//! Object keys and string values that read back as themselves are written
//! without quotes, so `{"type":"dagger","begin":4}` is stored as
//! `{type:dagger,begin:4}`. Numbers keep their written form.

use crate::Error;
use serde_json::Value;
use std::fmt::Write;

#[inline]
fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | ':' | ',' | '"') || c.is_whitespace()
}

fn is_literal(token: &str) -> bool {
    matches!(token, "true" | "false" | "null")
}

fn is_number(token: &str) -> bool {
    serde_json::from_str::<serde_json::Number>(token).is_ok()
}

/// Returns true if the string is written without quotes. This is exactly
/// the set of tokens that `quote` turns back into the same string.
fn is_bare(data: &str) -> bool {
    !data.is_empty() && !data.contains(is_structural) && !is_literal(data) && !is_number(data)
}

/// Write a string as a quoted json string
fn push_quoted(out: &mut String, data: &str) {
    // a json string is always serializable
    let _ = write!(out, "{}", Value::String(data.to_string()));
}

/// Rewrite relaxed json into strict json by quoting every bare token that is
/// not a literal or a number. Quoted strings pass through untouched.
///
/// ```
/// use msav::relaxed;
/// assert_eq!(
///     relaxed::quote("{type:dagger,end:10,\"a b\":true}"),
///     r#"{"type":"dagger","end":10,"a b":true}"#,
/// );
/// ```
pub fn quote(data: &str) -> String {
    let mut out = String::with_capacity(data.len() + data.len() / 4);
    let mut rest = data;
    while let Some(c) = rest.chars().next() {
        if c == '"' {
            // copy up to and including the closing quote, minding escapes
            let mut escaped = false;
            let end = rest[1..]
                .char_indices()
                .find(|&(_, x)| {
                    let done = !escaped && x == '"';
                    escaped = !escaped && x == '\\';
                    done
                })
                .map_or(rest.len(), |(i, _)| i + 2);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
        } else if is_structural(c) {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        } else {
            let end = rest.find(is_structural).unwrap_or(rest.len());
            let token = &rest[..end];
            if is_literal(token) || is_number(token) {
                out.push_str(token);
            } else {
                push_quoted(&mut out, token);
            }
            rest = &rest[end..];
        }
    }

    out
}

/// Parse relaxed json
pub fn from_str(data: &str) -> Result<Value, Error> {
    let quoted = quote(data);
    Ok(serde_json::from_str(&quoted)?)
}

fn write_str(out: &mut String, data: &str) {
    if is_bare(data) {
        out.push_str(data);
    } else {
        push_quoted(out, data);
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(x) => out.push_str(if *x { "true" } else { "false" }),
        Value::Number(x) => {
            let _ = write!(out, "{}", x);
        }
        Value::String(x) => write_str(out, x),
        Value::Array(values) => {
            out.push('[');
            for (i, x) in values.iter().enumerate() {
                if i != 0 {
                    out.push(',');
                }
                write_value(out, x);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            out.push('{');
            for (i, (key, x)) in fields.iter().enumerate() {
                if i != 0 {
                    out.push(',');
                }
                write_str(out, key);
                out.push(':');
                write_value(out, x);
            }
            out.push('}');
        }
    }
}

/// Serialize a value as compact relaxed json
///
/// ```
/// use msav::relaxed;
/// use serde_json::json;
///
/// let value = json!({"type": "chaos-array", "scaling": 1.5, "label": "two words", "on": true});
/// assert_eq!(
///     relaxed::to_string(&value),
///     r#"{type:chaos-array,scaling:1.5,label:"two words",on:true}"#,
/// );
/// ```
pub fn to_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use rstest::*;
    use serde_json::json;

    #[rstest]
    #[case("{}", "{}")]
    #[case("{a:1}", r#"{"a":1}"#)]
    #[case("{a:-1.5e3,b:null}", r#"{"a":-1.5e3,"b":null}"#)]
    #[case("{a:[x,y-z,2]}", r#"{"a":["x","y-z",2]}"#)]
    #[case("{ a : b }", r#"{ "a" : "b" }"#)]
    #[case(r#"{a:"q\"uo:te",b:c}"#, r#"{"a":"q\"uo:te","b":"c"}"#)]
    #[case("{winWave:0,attackMode:false}", r#"{"winWave":0,"attackMode":false}"#)]
    #[case("{Infinity:NaN}", r#"{"Infinity":"NaN"}"#)]
    #[case(r"{path:C:\x}", r#"{"path":"C":"\\x"}"#)]
    #[case(r"{dir:a\b}", r#"{"dir":"a\\b"}"#)]
    fn test_quote(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quote(input), expected);
    }

    #[test]
    fn test_unquote_rules() {
        let value = json!({
            "waves": true,
            "spawns": [{"type": "dagger", "end": 10, "scaling": 2}],
            "name": "",
            "null": "true",
            "weird key": 1,
            "n2": "x1",
        });

        let text = to_string(&value);
        assert_eq!(
            text,
            r#"{waves:true,spawns:[{type:dagger,end:10,scaling:2}],name:"","null":"true","weird key":1,n2:x1}"#
        );
        assert_eq!(from_str(&text).unwrap(), value);
    }

    #[rstest]
    #[case("{spawns:[],name:map1,unit_cap:5,scale:1.0E10,x:2.50}")]
    #[case("{a:-0,b:1e-7,c:100000000000000000000000}")]
    #[case(r#"{a:"5",b:"1.0E10",c:-,d:x_y.z,e:"two words"}"#)]
    fn test_reencode_is_exact(#[case] text: &str) {
        let value = from_str(text).unwrap();
        assert_eq!(to_string(&value), text);
    }

    #[test]
    fn test_bare_tokens_read_back() {
        let value = json!({"name": "map1", "id": "5", "file": "a\\b", "ctl": "\u{1}"});
        let text = to_string(&value);
        assert!(text.starts_with(r#"{name:map1,id:"5","#));
        assert_eq!(from_str(&text).unwrap(), value);
    }

    #[test]
    fn test_key_order_is_preserved() {
        let text = "{zeta:1,alpha:2,mid:{b:1,a:2}}";
        let value = from_str(text).unwrap();
        assert_eq!(to_string(&value), text);
    }

    #[test]
    fn test_invalid() {
        assert!(from_str("{a:").is_err());
        assert!(from_str("{a b}").is_err());
    }

    #[quickcheck]
    fn string_values_round_trip(key: String, value: String, n: i32) -> bool {
        let value = json!({ key: [value, n, true] });
        from_str(&to_string(&value)).map_or(false, |x| x == value)
    }
}
