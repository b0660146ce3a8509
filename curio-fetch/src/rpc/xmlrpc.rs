//! XML-RPC over HTTP.
//!
//! Values map onto JSON: `int`/`i4`/`i8` and `double` become numbers,
//! `boolean` a bool, `array` an array, `struct` an object and `nil` null.
//! `string`, `base64` and `dateTime.iso8601` all come back as strings, as
//! does a `<value>` with no type element.

use super::RpcClient;
use crate::error::FetchError;
use async_trait::async_trait;
use curio_model::xml::{XmlElement, parse_document};
use quick_xml::escape::escape;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Number, Value};
use tracing::debug;
use url::Url;

/// Encodes a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(param, &mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn encode_value(value: &Value, out: &mut String) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str("<boolean>");
            out.push(if *b { '1' } else { '0' });
            out.push_str("</boolean>");
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => out.push_str(&format!("<int>{i}</int>")),
            None => out.push_str(&format!("<double>{}</double>", n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(item, out);
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                encode_value(member, out);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

/// Decodes a `methodResponse` document into its single result value.
pub fn decode_response(text: &str) -> Result<Value, FetchError> {
    let root = parse_document(text)?;
    if root.name != "methodResponse" {
        return Err(FetchError::Protocol(format!(
            "expected methodResponse, found {}",
            root.name
        )));
    }
    if let Some(fault) = root.child("fault") {
        let value = fault
            .child("value")
            .map(decode_value)
            .transpose()?
            .unwrap_or(Value::Null);
        return Err(FetchError::Fault {
            code: value.get("faultCode").and_then(Value::as_i64).unwrap_or_default(),
            message: value
                .get("faultString")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }
    let value = root
        .child("params")
        .and_then(|p| p.child("param"))
        .and_then(|p| p.child("value"))
        .ok_or_else(|| FetchError::Protocol("response has no value".into()))?;
    decode_value(value)
}

fn decode_value(value: &XmlElement) -> Result<Value, FetchError> {
    let Some(typed) = value.elements().next() else {
        return Ok(Value::String(value.text()));
    };
    let text = || typed.text().trim().to_string();
    Ok(match typed.name.as_str() {
        "int" | "i4" | "i8" => {
            let n = text()
                .parse::<i64>()
                .map_err(|e| FetchError::Protocol(format!("bad integer: {e}")))?;
            Value::Number(n.into())
        }
        "double" => {
            let f = text()
                .parse::<f64>()
                .map_err(|e| FetchError::Protocol(format!("bad double: {e}")))?;
            Number::from_f64(f).map_or(Value::Null, Value::Number)
        }
        "boolean" => Value::Bool(matches!(text().as_str(), "1" | "true")),
        "string" | "dateTime.iso8601" => Value::String(typed.text()),
        "base64" => Value::String(text().split_whitespace().collect()),
        "nil" => Value::Null,
        "array" => {
            let items = typed
                .child("data")
                .map(|data| {
                    data.children_named("value")
                        .map(decode_value)
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();
            Value::Array(items)
        }
        "struct" => {
            let mut members = Map::new();
            for member in typed.children_named("member") {
                let name = member.child("name").map(XmlElement::text).unwrap_or_default();
                let value = match member.child("value") {
                    Some(v) => decode_value(v)?,
                    None => Value::Null,
                };
                members.insert(name, value);
            }
            Value::Object(members)
        }
        other => return Err(FetchError::Protocol(format!("unknown value type {other}"))),
    })
}

/// XML-RPC client for one endpoint.
#[derive(Debug, Clone)]
pub struct XmlRpcClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl XmlRpcClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: crate::http::client(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RpcClient for XmlRpcClient {
    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, FetchError> {
        debug!(endpoint = %self.endpoint, method, "xml-rpc call");
        let body = encode_call(method, params);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        decode_response(&text)
    }
}
