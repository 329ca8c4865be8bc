//! Typed view over a top-level package definition.

use serde::Serialize;

use crate::lookup::TopLevelForm;
use crate::reader::Sexp;

/// The value of a tracked list-valued field.
///
/// # Examples
///
/// ```
/// use committer_sexp::definition::FieldValue;
///
/// assert!(FieldValue::Absent.entries().is_empty());
/// let value = FieldValue::Entries(vec!["zlib".into()]);
/// assert_eq!(value.entries(), ["zlib".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    /// The field does not occur in the definition.
    Absent,
    /// A recognised list shape, reduced to entry names.
    Entries(Vec<String>),
    /// The field occurs but its value has an unrecognised shape.
    Opaque(String),
}

impl FieldValue {
    /// Entry names used for comparison. An absent field has no entries; an
    /// opaque value counts as one entry holding its printed form.
    pub fn entries(&self) -> Vec<String> {
        match self {
            FieldValue::Absent => Vec::new(),
            FieldValue::Entries(entries) => entries.clone(),
            FieldValue::Opaque(text) => vec![text.clone()],
        }
    }

    fn from_sexp(value: &Sexp) -> Self {
        let Sexp::List(items) = value else {
            return FieldValue::Opaque(value.to_string());
        };
        match items.as_slice() {
            [] => FieldValue::Entries(Vec::new()),
            [Sexp::Symbol(head), rest @ ..] if head == "list" => {
                FieldValue::Entries(rest.iter().map(entry_name).collect())
            }
            [Sexp::Symbol(head), Sexp::List(inner)] if head == "quasiquote" || head == "quote" => {
                FieldValue::Entries(inner.iter().map(labeled_entry).collect())
            }
            _ => FieldValue::Opaque(value.to_string()),
        }
    }
}

/// A tracked field and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedField {
    /// Field name, e.g. `native-inputs`.
    pub name: String,
    /// What the definition holds for it.
    pub value: FieldValue,
}

/// A top-level definition with the accessors commit messages need.
///
/// # Examples
///
/// ```
/// use committer_sexp::definition::{Definition, FieldValue};
/// use committer_sexp::lookup::surrounding_form;
///
/// let src = "(define-public foo\n  (package\n    (version \"1.2\")\n    (inputs (list zlib))))\n";
/// let form = surrounding_form(src, 3).unwrap().unwrap();
/// let def = Definition::from_form(form, "version", &["inputs".to_string()]);
/// assert_eq!(def.name.as_deref(), Some("foo"));
/// assert_eq!(def.version.as_deref(), Some("1.2"));
/// assert_eq!(def.field("inputs"), &FieldValue::Entries(vec!["zlib".into()]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// The defined variable name.
    pub name: Option<String>,
    /// Version string, from the first `(version X)` found depth-first.
    pub version: Option<String>,
    /// Tracked list-valued fields, in configuration order.
    pub fields: Vec<TrackedField>,
    /// First line of the form.
    pub start_line: usize,
    /// Last line of the form.
    pub end_line: usize,
    #[serde(skip)]
    form: Sexp,
}

static ABSENT: FieldValue = FieldValue::Absent;

impl Definition {
    /// Build the typed view of `form`.
    pub fn from_form(form: TopLevelForm, version_field: &str, tracked_fields: &[String]) -> Self {
        let TopLevelForm {
            start_line,
            end_line,
            sexp,
        } = form;
        let name = definition_name(&sexp);
        let version = find_field(&sexp, version_field).map(atom_text);
        let fields = tracked_fields
            .iter()
            .map(|field| TrackedField {
                name: field.clone(),
                value: find_field(&sexp, field)
                    .map(FieldValue::from_sexp)
                    .unwrap_or(FieldValue::Absent),
            })
            .collect();
        Self {
            name,
            version,
            fields,
            start_line,
            end_line,
            form: sexp,
        }
    }

    /// The value of a tracked field; untracked fields read as absent.
    pub fn field(&self, name: &str) -> &FieldValue {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
            .unwrap_or(&ABSENT)
    }

    /// Whether both definitions are the same form, structurally.
    pub fn same_form(&self, other: &Definition) -> bool {
        self.form == other.form
    }

    /// The underlying form.
    pub fn form(&self) -> &Sexp {
        &self.form
    }
}

fn definition_name(form: &Sexp) -> Option<String> {
    let Sexp::List(items) = form else {
        return None;
    };
    match items.get(1)? {
        Sexp::Symbol(name) => Some(name.clone()),
        // (define (proc args ...) ...)
        Sexp::List(signature) => signature.first()?.as_symbol().map(str::to_string),
        _ => None,
    }
}

/// Depth-first, pre-order search for a `(field value ...)` sub-form.
fn find_field<'a>(sexp: &'a Sexp, field: &str) -> Option<&'a Sexp> {
    let (Sexp::List(items) | Sexp::Vector(items)) = sexp else {
        return None;
    };
    if let [Sexp::Symbol(head), value, ..] = items.as_slice() {
        if head == field && matches!(sexp, Sexp::List(_)) {
            return Some(value);
        }
    }
    items.iter().find_map(|item| find_field(item, field))
}

fn atom_text(value: &Sexp) -> String {
    match value {
        Sexp::Str(s) | Sexp::Symbol(s) => s.clone(),
        other => other.to_string(),
    }
}

fn entry_name(entry: &Sexp) -> String {
    match entry {
        Sexp::Symbol(s) | Sexp::Str(s) => s.clone(),
        Sexp::List(items) => match items.as_slice() {
            [Sexp::Symbol(head), inner] if head == "unquote" => entry_name(inner),
            _ => entry.to_string(),
        },
        Sexp::Vector(_) => entry.to_string(),
    }
}

/// Old-style `("label" ,package)` entries are named after the package.
fn labeled_entry(entry: &Sexp) -> String {
    match entry {
        Sexp::List(items) => match items.as_slice() {
            [Sexp::Str(_), package, ..] => entry_name(package),
            _ => entry_name(entry),
        },
        _ => entry_name(entry),
    }
}
