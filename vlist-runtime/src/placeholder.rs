use std::collections::BTreeMap;

use serde_json::Value;

/// How a profiled field renders while its real value is still loading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaceholderMode {
    /// Mask every character, keeping the profiled field's average length.
    #[default]
    Masked,
    /// Emit nothing; the host renders a skeleton box sized from the profiled length.
    Skeleton,
    Blank,
    /// A short fixed run of dots, independent of the field's length.
    Dots,
    /// A plausible value for the inferred `FieldType` (e.g. `user@example.com` for Email).
    Realistic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Email,
    Url,
    Number,
    Date,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldProfile {
    pub field_type: FieldType,
    pub min_len: usize,
    pub max_len: usize,
    pub avg_len: f64,
}

impl FieldProfile {
    fn from_samples(field_type: FieldType, lens: &[usize]) -> Self {
        let min_len = lens.iter().copied().min().unwrap_or(0);
        let max_len = lens.iter().copied().max().unwrap_or(0);
        let avg_len = if lens.is_empty() {
            0.0
        } else {
            lens.iter().sum::<usize>() as f64 / lens.len() as f64
        };
        Self {
            field_type,
            min_len,
            max_len,
            avg_len,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaceholderOptions {
    pub sample_size: usize,
    pub mode: PlaceholderMode,
}

impl Default for PlaceholderOptions {
    fn default() -> Self {
        Self {
            sample_size: 10,
            mode: PlaceholderMode::Masked,
        }
    }
}

/// Profiles a handful of real items and generates placeholder rows shaped like them.
///
/// Profiling operates over a caller-supplied "field view" — a `serde_json::Value`-shaped
/// accessor — so this crate has no dependency on the caller's actual item type `T`.
#[derive(Debug, Default)]
pub struct PlaceholderGenerator {
    options: PlaceholderOptions,
    fields: BTreeMap<String, FieldProfile>,
}

impl PlaceholderGenerator {
    pub fn new(options: PlaceholderOptions) -> Self {
        Self {
            options,
            fields: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &PlaceholderOptions {
        &self.options
    }

    pub fn set_mode(&mut self, mode: PlaceholderMode) {
        self.options.mode = mode;
    }

    pub fn field(&self, name: &str) -> Option<&FieldProfile> {
        self.fields.get(name)
    }

    /// Profiles up to `sample_size` items. Only object-shaped items contribute fields; anything
    /// else is ignored (this generator cannot placeholder a dataset with no object shape).
    pub fn profile(&mut self, samples: &[Value]) {
        let mut per_field: BTreeMap<String, (Vec<usize>, Vec<FieldType>)> = BTreeMap::new();
        for sample in samples.iter().take(self.options.sample_size) {
            let Value::Object(map) = sample else {
                continue;
            };
            for (key, value) in map {
                let (lens, types) = per_field.entry(key.clone()).or_default();
                lens.push(display_len(value));
                types.push(infer_field_type(value));
            }
        }

        self.fields.clear();
        for (name, (lens, types)) in per_field {
            let field_type = dominant_type(&types);
            self.fields
                .insert(name, FieldProfile::from_samples(field_type, &lens));
        }
    }

    /// Generates a placeholder row for `index`, stamped with a stable, session-unique ID and the
    /// reserved `is_placeholder` flag.
    pub fn generate(&self, index: usize) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), Value::String(placeholder_id(index)));
        obj.insert("is_placeholder".to_string(), Value::Bool(true));
        for (name, profile) in &self.fields {
            obj.insert(name.clone(), self.render_field(profile));
        }
        Value::Object(obj)
    }

    fn render_field(&self, profile: &FieldProfile) -> Value {
        match self.options.mode {
            PlaceholderMode::Blank => Value::String(String::new()),
            PlaceholderMode::Dots => Value::String("...".to_string()),
            PlaceholderMode::Skeleton => {
                Value::String(format!("skeleton:{}", profile.avg_len.round() as usize))
            }
            PlaceholderMode::Masked => {
                let len = profile.avg_len.round().max(1.0) as usize;
                Value::String("\u{2593}".repeat(len))
            }
            PlaceholderMode::Realistic => Value::String(realistic_value(profile)),
        }
    }
}

/// Stable, session-scoped placeholder ID. Unique per coordinator session because the coordinator
/// resets its placeholder generator (and thus this counter's meaning) on every full reset.
pub fn placeholder_id(index: usize) -> String {
    format!("__placeholder_{index}")
}

fn display_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        Value::Number(n) => n.to_string().len(),
        Value::Bool(b) => if *b { 4 } else { 5 },
        _ => 0,
    }
}

fn infer_field_type(value: &Value) -> FieldType {
    let Value::String(s) = value else {
        return match value {
            Value::Number(_) => FieldType::Number,
            _ => FieldType::Unknown,
        };
    };
    if s.contains('@') && !s.chars().any(char::is_whitespace) {
        FieldType::Email
    } else if s.contains("://") {
        FieldType::Url
    } else if s.parse::<f64>().is_ok() {
        FieldType::Number
    } else if looks_like_rfc3339_date(s) {
        FieldType::Date
    } else {
        FieldType::Text
    }
}

fn looks_like_rfc3339_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[0..4].iter().all(u8::is_ascii_digit)
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

fn dominant_type(types: &[FieldType]) -> FieldType {
    let mut counts: BTreeMap<&'static str, (FieldType, usize)> = BTreeMap::new();
    for t in types {
        let key = match t {
            FieldType::Text => "text",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Unknown => "unknown",
        };
        counts.entry(key).or_insert((*t, 0)).1 += 1;
    }
    counts
        .into_values()
        .max_by_key(|(_, count)| *count)
        .map(|(t, _)| t)
        .unwrap_or(FieldType::Unknown)
}

fn realistic_value(profile: &FieldProfile) -> String {
    match profile.field_type {
        FieldType::Email => "user@example.com".to_string(),
        FieldType::Url => "https://example.com".to_string(),
        FieldType::Number => "0".to_string(),
        FieldType::Date => "2000-01-01".to_string(),
        FieldType::Text | FieldType::Unknown => {
            let len = profile.avg_len.round().max(1.0) as usize;
            "Lorem ipsum dolor sit amet consectetur"
                .chars()
                .cycle()
                .take(len)
                .collect()
        }
    }
}
