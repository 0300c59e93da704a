use serde::Deserialize;

/// One package as described by the AUR RPC interface.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteRecord {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "URL", default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub license: Vec<String>,
}

/// The RPC envelope. `results` is an object, a list, or an error message
/// depending on `type`, so it is kept untyped until the shape is known.
#[derive(Deserialize, Debug)]
pub(crate) struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub results: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// The error message if this is an error envelope.
    pub fn error_message(&self) -> Option<String> {
        if self.kind != "error" {
            return None;
        }
        let message = self
            .error
            .clone()
            .or_else(|| self.results.as_str().map(str::to_string))
            .unwrap_or_else(|| "unknown error".to_string());
        Some(message)
    }

    /// Records carried by a non-error envelope.
    pub fn into_records(self) -> serde_json::Result<Vec<RemoteRecord>> {
        match self.results {
            serde_json::Value::Null => Ok(Vec::new()),
            value @ serde_json::Value::Array(_) => serde_json::from_value(value),
            value => Ok(vec![serde_json::from_value(value)?]),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}
