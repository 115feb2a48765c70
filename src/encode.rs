//! Output encodings
//!
//! Every model in this crate derives `Serialize`, so any of them can be written
//! as JSON, XML or bincode. `Size` only reports the bincode length, which is a
//! cheap way to compare how heavy two models are.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CovxError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Xml,
    Binary,
    Size,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
            OutputFormat::Binary => "binary",
            OutputFormat::Size => "size",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    Text(String),
    Bytes(Vec<u8>),
}

impl Encoded {
    pub fn len(&self) -> usize {
        match self {
            Encoded::Text(s) => s.len(),
            Encoded::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn encode<T: Serialize>(value: &T, format: OutputFormat, pretty: bool) -> Result<Encoded> {
    let err = |message: String| CovxError::Encode {
        format: format.to_string(),
        message,
    };

    match format {
        OutputFormat::Json => {
            let text = if pretty {
                serde_json::to_string_pretty(value)
            } else {
                serde_json::to_string(value)
            };
            text.map(Encoded::Text).map_err(|e| err(e.to_string()))
        }
        OutputFormat::Xml => {
            let mut text = String::new();
            let mut ser = quick_xml::se::Serializer::new(&mut text);
            if pretty {
                ser.indent(' ', 2);
            }
            value.serialize(ser).map_err(|e| err(e.to_string()))?;
            Ok(Encoded::Text(text))
        }
        OutputFormat::Binary => bincode::serialize(value)
            .map(Encoded::Bytes)
            .map_err(|e| err(e.to_string())),
        OutputFormat::Size => bincode::serialized_size(value)
            .map(|size| Encoded::Text(format!("{} bytes", size)))
            .map_err(|e| err(e.to_string())),
    }
}

pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| CovxError::MalformedInput(e.to_string()))
}

pub fn decode_binary<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| CovxError::MalformedInput(e.to_string()))
}
