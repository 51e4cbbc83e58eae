//! Update masks for partial resource updates.
//!
//! A [`FieldMask`] lists the field paths a PATCH is allowed to touch. Nested
//! fields use dotted paths (`address.locality`). Applying a mask to a payload
//! keeps only the masked fields; everything else in the payload is dropped
//! before it reaches the wire.

use std::fmt;

use serde_json::{Map, Value};

/// An ordered, de-duplicated list of field paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMask {
    paths: Vec<String>,
}

impl FieldMask {
    /// Creates a mask from field paths. Blank paths are ignored, duplicates
    /// keep their first position.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mask = Self::default();
        for path in paths {
            mask.push(path.as_ref());
        }
        mask
    }

    /// Parses the comma separated wire form (`primaryPhone,websiteUri`).
    pub fn parse(value: &str) -> Self {
        Self::new(value.split(','))
    }

    /// Adds a path if it is not already present.
    pub fn push(&mut self, path: &str) {
        let path = path.trim();
        if !path.is_empty() && !self.contains(path) {
            self.paths.push(path.to_string());
        }
    }

    /// Builder form of [`FieldMask::push`].
    pub fn with_path(mut self, path: &str) -> Self {
        self.push(path);
        self
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// The comma separated form used in the `updateMask` query parameter.
    pub fn to_query(&self) -> String {
        self.paths.join(",")
    }

    /// Returns a copy of `payload` restricted to the masked paths.
    ///
    /// Masked paths missing from the payload are simply absent from the
    /// result.
    pub fn apply(&self, payload: &Map<String, Value>) -> Map<String, Value> {
        let mut selected = Map::new();
        for path in &self.paths {
            let segments: Vec<&str> = path.split('.').collect();
            if let Some(value) = lookup(payload, &segments) {
                insert(&mut selected, &segments, value.clone());
            }
        }
        selected
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

impl<S: AsRef<str>> FromIterator<S> for FieldMask {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

fn lookup<'a>(source: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let value = source.get(*first)?;
    if rest.is_empty() {
        return Some(value);
    }
    match value {
        Value::Object(child) => lookup(child, rest),
        _ => None,
    }
}

fn insert(target: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        target.insert((*first).to_string(), value);
        return;
    }
    let child = target
        .entry((*first).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(child) = child {
        insert(child, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn only_masked_fields_survive() {
        let mask = FieldMask::new(["phone"]);
        let payload = object(json!({"phone": "555-0100", "website": "http://x"}));

        let selected = mask.apply(&payload);
        assert_eq!(Value::Object(selected), json!({"phone": "555-0100"}));
    }

    #[test]
    fn nested_paths_are_selected() {
        let mask = FieldMask::parse("address.locality,primaryPhone");
        let payload = object(json!({
            "address": {"locality": "Springfield", "postalCode": "62701"},
            "primaryPhone": "555-0100",
            "websiteUri": "https://example.com"
        }));

        let selected = mask.apply(&payload);
        assert_eq!(
            Value::Object(selected),
            json!({"address": {"locality": "Springfield"}, "primaryPhone": "555-0100"})
        );
    }

    #[test]
    fn masked_path_missing_from_payload_is_skipped() {
        let mask = FieldMask::new(["websiteUri"]);
        let payload = object(json!({"primaryPhone": "555-0100"}));
        assert!(mask.apply(&payload).is_empty());
    }

    #[test]
    fn parse_trims_and_dedups() {
        let mask = FieldMask::parse(" regularHours , primaryPhone,regularHours,, ");
        assert_eq!(mask.paths(), ["regularHours", "primaryPhone"]);
        assert_eq!(mask.to_query(), "regularHours,primaryPhone");
        assert_eq!(mask.to_string(), "regularHours,primaryPhone");
    }

    #[test]
    fn empty_mask() {
        let mask: FieldMask = Vec::<String>::new().into_iter().collect();
        assert!(mask.is_empty());
        assert_eq!(mask.to_query(), "");
    }
}
