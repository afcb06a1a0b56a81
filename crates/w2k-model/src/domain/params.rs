use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::ParamValue;

/// One option of a [`Parameters`] set.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Option name as it appears on the command line (e.g. `-red`).
    key: String,
    /// Value associated with the option.
    value: ParamValue,
}

impl Param {
    /// Create a new option entry.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the option name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the value.
    pub fn value(&self) -> &ParamValue {
        &self.value
    }
}

impl<K, V> From<(K, V)> for Param
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Ordered mapping from option name to value.
///
/// Keys are unique and keep their first insertion position, like a dictionary.
/// Serialized as a JSON object whose member order is the mapping order.
/// Neither names nor values are validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(Vec<Param>);

impl Parameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all options in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.0.iter()
    }

    /// Get the value of an option.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.iter().find(|p| p.key() == key).map(|p| p.value())
    }

    /// Insert an option or replace the value of an existing one.
    ///
    /// A replaced option keeps its original position.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|p| p.key == key) {
            Some(existing) => existing.value = value,
            None => self.0.push(Param { key, value }),
        }
        self
    }

    /// Builder-style variant of [`Parameters::insert`].
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.insert(key, value);
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut out = Parameters::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

impl Serialize for Parameters {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for p in &self.0 {
            map.serialize_entry(&p.key, &p.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = Parameters;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of option names to values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = Parameters::new();
                while let Some((key, value)) = access.next_entry::<String, ParamValue>()? {
                    out.insert(key, value);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces_in_place() {
        let mut params = Parameters::new();
        params.insert("-red", "3");
        params.insert("-prec", "2");
        params.insert("-red", "4");

        let keys: Vec<_> = params.iter().map(|p| p.key()).collect();
        assert_eq!(keys, ["-red", "-prec"]);
        assert_eq!(params.get("-red"), Some(&ParamValue::Text("4".into())));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn deserialize_preserves_document_order() {
        let json = r#"{"-red": "3", "-prec": "2", "-hdlo": true, "-fermit": "0.002"}"#;
        let params: Parameters = serde_json::from_str(json).unwrap();

        let keys: Vec<_> = params.iter().map(|p| p.key()).collect();
        assert_eq!(keys, ["-red", "-prec", "-hdlo", "-fermit"]);
        assert_eq!(params.get("-hdlo"), Some(&ParamValue::Flag(true)));
    }

    #[test]
    fn serialize_as_ordered_object() {
        let params = Parameters::new().with("-i", "100").with("-ec", "0.000001");
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"-i":"100","-ec":"0.000001"}"#);
    }

    #[test]
    fn empty_object_is_empty_set() {
        let params: Parameters = serde_json::from_str("{}").unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn collect_from_pairs() {
        let params: Parameters = [("-a", ParamValue::Flag(true)), ("-b", "x".into())]
            .into_iter()
            .collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("-b").and_then(|v| v.as_text()), Some("x"));
    }
}
