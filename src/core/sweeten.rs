//! Loosely-typed call-site arguments and their normalization into fields
//!
//! Logging verbs accept `&[Arg]`. The keyed-context verbs run those
//! arguments through [`sweeten`], which turns alternating keys and values
//! into [`Field`]s and reports malformed input as [`Diagnostic`]s instead of
//! failing. The positional and template verbs render arguments into the
//! message with [`render_message`] and [`render_template`].

use super::field::{Field, FieldValue};
use std::fmt::{self, Write as _};
use std::sync::Arc;

pub const ODD_NUMBER_MSG: &str = "Ignored key without a value.";
pub const NON_STRING_KEY_MSG: &str = "Ignored key-value pairs with non-string keys.";
pub const MULTIPLE_ERRORS_MSG: &str = "Multiple errors without a key.";

/// One argument passed to a logging verb
#[derive(Debug, Clone)]
pub enum Arg {
    /// A string; the only kind of argument usable as a key
    Str(String),
    /// Any other scalar or composite value
    Value(FieldValue),
    /// A field built by the caller, passed through untouched
    Field(Field),
    /// An error; becomes the `error` field
    Error(Arc<dyn std::error::Error + Send + Sync>),
}

impl Arg {
    /// Wrap an error value
    pub fn error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Arg::Error(Arc::new(err))
    }

    /// A pre-built `key=value` field
    pub fn field(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Arg::Field(Field::new(key, value))
    }

    /// The value this argument contributes when it sits in value position
    pub fn to_field_value(&self) -> FieldValue {
        match self {
            Arg::Str(s) => FieldValue::String(s.clone()),
            Arg::Value(v) => v.clone(),
            Arg::Field(f) => FieldValue::Object(vec![f.clone()]),
            Arg::Error(e) => FieldValue::String(e.to_string()),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(s) => f.write_str(s),
            Arg::Value(v) => write!(f, "{}", v),
            Arg::Field(field) => write!(f, "{}", field),
            Arg::Error(e) => write!(f, "{}", e),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Arg::Str(s.clone())
    }
}

impl From<Field> for Arg {
    fn from(field: Field) -> Self {
        Arg::Field(field)
    }
}

impl From<FieldValue> for Arg {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::String(s) => Arg::Str(s),
            other => Arg::Value(other),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Arg {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Arg::Error(Arc::from(err))
    }
}

macro_rules! arg_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Value(FieldValue::from(v))
                }
            }
        )*
    };
}

arg_from_value!(i32, i64, u32, u64, usize, f64, bool);

/// A side record produced while normalizing malformed arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: &'static str,
    pub fields: Vec<Field>,
}

impl Diagnostic {
    fn new(message: &'static str, fields: Vec<Field>) -> Self {
        Self { message, fields }
    }
}

/// Output of [`sweeten`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sweetened {
    pub fields: Vec<Field>,
    pub diagnostics: Vec<Diagnostic>,
}

struct InvalidPair<'a> {
    position: usize,
    key: &'a Arg,
    value: &'a Arg,
}

impl InvalidPair<'_> {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Object(vec![
            Field::new("position", self.position),
            Field::new("key", self.key.to_field_value()),
            Field::new("value", self.value.to_field_value()),
        ])
    }
}

/// Normalize a keyed-context argument list into ordered fields.
///
/// Never fails. Malformed input is dropped from the field set and described
/// by the returned diagnostics:
/// - a second error argument yields one [`MULTIPLE_ERRORS_MSG`] diagnostic each;
/// - a trailing key without a value yields [`ODD_NUMBER_MSG`] and ends the scan;
/// - every pair with a non-string key is aggregated into a single
///   [`NON_STRING_KEY_MSG`] diagnostic carrying an `invalid` array.
pub fn sweeten(args: &[Arg]) -> Sweetened {
    if args.is_empty() {
        return Sweetened::default();
    }

    // Worst case every argument is a pre-built field.
    let mut fields = Vec::with_capacity(args.len());
    let mut diagnostics = Vec::new();
    let mut invalid: Vec<InvalidPair<'_>> = Vec::new();
    let mut seen_error = false;

    let mut i = 0;
    while i < args.len() {
        match &args[i] {
            Arg::Field(field) => {
                fields.push(field.clone());
                i += 1;
                continue;
            }
            Arg::Error(err) => {
                let field = Field::error(err.as_ref());
                if seen_error {
                    diagnostics.push(Diagnostic::new(MULTIPLE_ERRORS_MSG, vec![field]));
                } else {
                    seen_error = true;
                    fields.push(field);
                }
                i += 1;
                continue;
            }
            Arg::Str(_) | Arg::Value(_) => {}
        }

        if i == args.len() - 1 {
            diagnostics.push(Diagnostic::new(
                ODD_NUMBER_MSG,
                vec![Field::new("ignored", args[i].to_field_value())],
            ));
            break;
        }

        let (key, value) = (&args[i], &args[i + 1]);
        match key {
            Arg::Str(key) => fields.push(Field::new(key.clone(), value.to_field_value())),
            _ => {
                if invalid.capacity() == 0 {
                    invalid.reserve(args.len() / 2);
                }
                invalid.push(InvalidPair {
                    position: i,
                    key,
                    value,
                });
            }
        }
        i += 2;
    }

    if !invalid.is_empty() {
        let pairs = invalid.into_iter().map(InvalidPair::into_field_value).collect();
        diagnostics.push(Diagnostic::new(
            NON_STRING_KEY_MSG,
            vec![Field::new("invalid", FieldValue::Array(pairs))],
        ));
    }

    Sweetened {
        fields,
        diagnostics,
    }
}

/// Join positional arguments with single spaces, like a print statement
pub fn render_message(args: &[Arg]) -> String {
    match args {
        [] => String::new(),
        [Arg::Str(s)] => s.clone(),
        _ => {
            let mut out = String::with_capacity(args.len() * 8);
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{}", arg);
            }
            out
        }
    }
}

/// Substitute `{}` placeholders in `template` with `args`, in order.
///
/// `{{` and `}}` produce literal braces. Placeholders left without an
/// argument stay as `{}`; surplus arguments are appended space separated.
/// An empty argument list returns the template verbatim.
pub fn render_template(template: &str, args: &[Arg]) -> String {
    if args.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) => {
                chars.next();
                out.push('{');
            }
            ('}', Some('}')) => {
                chars.next();
                out.push('}');
            }
            ('{', Some('}')) => {
                chars.next();
                match remaining.next() {
                    Some(arg) => {
                        let _ = write!(out, "{}", arg);
                    }
                    None => out.push_str("{}"),
                }
            }
            (other, _) => out.push(other),
        }
    }

    for arg in remaining {
        out.push(' ');
        let _ = write!(out, "{}", arg);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestError(&'static str);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for TestError {}

    #[test]
    fn test_key_value_pairs_in_order() {
        let args: Vec<Arg> = vec!["key1".into(), "v1".into(), "key2".into(), "v2".into()];
        let out = sweeten(&args);

        assert_eq!(
            out.fields,
            vec![Field::new("key1", "v1"), Field::new("key2", "v2")]
        );
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_prebuilt_fields_pass_through() {
        let args = vec![
            Arg::field("status", 200),
            "path".into(),
            "/health".into(),
            Arg::field("cached", true),
        ];
        let out = sweeten(&args);

        assert_eq!(
            out.fields,
            vec![
                Field::new("status", 200),
                Field::new("path", "/health"),
                Field::new("cached", true),
            ]
        );
    }

    #[test]
    fn test_dangling_key() {
        let args: Vec<Arg> = vec!["a".into(), 1.into(), "b".into(), 2.into(), "orphan".into()];
        let out = sweeten(&args);

        assert_eq!(out.fields, vec![Field::new("a", 1), Field::new("b", 2)]);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].message, ODD_NUMBER_MSG);
        assert_eq!(out.diagnostics[0].fields, vec![Field::new("ignored", "orphan")]);
    }

    #[test]
    fn test_second_error_is_diagnosed_not_kept() {
        let args = vec![
            Arg::error(TestError("first")),
            "attempt".into(),
            3.into(),
            Arg::error(TestError("second")),
        ];
        let out = sweeten(&args);

        assert_eq!(
            out.fields,
            vec![Field::new("error", "first"), Field::new("attempt", 3)]
        );
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].message, MULTIPLE_ERRORS_MSG);
        assert_eq!(out.diagnostics[0].fields, vec![Field::new("error", "second")]);
    }

    #[test]
    fn test_non_string_keys_aggregate_into_one_diagnostic() {
        let args: Vec<Arg> = vec![
            1.into(),
            "one".into(),
            "ok".into(),
            true.into(),
            2.into(),
            "two".into(),
        ];
        let out = sweeten(&args);

        assert_eq!(out.fields, vec![Field::new("ok", true)]);
        assert_eq!(out.diagnostics.len(), 1);

        let diagnostic = &out.diagnostics[0];
        assert_eq!(diagnostic.message, NON_STRING_KEY_MSG);
        assert_eq!(diagnostic.fields[0].key, "invalid");

        let json = diagnostic.fields[0].value.to_json_value();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[0]["position"], 0);
        assert_eq!(json[0]["key"], 1);
        assert_eq!(json[0]["value"], "one");
        assert_eq!(json[1]["position"], 4);
    }

    #[test]
    fn test_empty_args() {
        assert_eq!(sweeten(&[]), Sweetened::default());
    }

    #[test]
    fn test_render_message_space_joined() {
        let args: Vec<Arg> = vec!["retry".into(), 3.into(), "of".into(), 5.into()];
        assert_eq!(render_message(&args), "retry 3 of 5");
        assert_eq!(render_message(&[Arg::from("alone")]), "alone");
        assert_eq!(render_message(&[]), "");
    }

    #[test]
    fn test_render_template() {
        let args: Vec<Arg> = vec!["alice".into(), 42.into()];
        assert_eq!(
            render_template("user {} has {} items", &args),
            "user alice has 42 items"
        );
        assert_eq!(render_template("{{literal}} {}", &[Arg::from("x")]), "{literal} x");
        assert_eq!(render_template("{} and {}", &[Arg::from("only")]), "only and {}");
        assert_eq!(render_template("{}", &[Arg::from("a"), Arg::from("b")]), "a b");
        assert_eq!(render_template("no args {}", &[]), "no args {}");
    }
}
