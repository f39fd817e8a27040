//! XML-RPC value model and JSON interop.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Map, Number, Value as JsonValue};
// self
use crate::_prelude::*;

/// Struct payload keyed by member name.
pub type RpcStruct = BTreeMap<String, RpcValue>;

/// One XML-RPC value.
#[derive(Clone, Debug, PartialEq)]
pub enum RpcValue {
	/// `<nil/>`
	Nil,
	/// `<boolean>`
	Bool(bool),
	/// `<int>`, `<i4>`, or `<i8>`
	Int(i64),
	/// `<double>`
	Double(f64),
	/// `<string>` or untyped text
	String(String),
	/// `<dateTime.iso8601>`, kept verbatim
	DateTime(String),
	/// `<base64>`, decoded
	Base64(Vec<u8>),
	/// `<array>`
	Array(Vec<RpcValue>),
	/// `<struct>`
	Struct(RpcStruct),
}
impl RpcValue {
	/// Borrows the elements when this is an array.
	pub fn as_array(&self) -> Option<&[RpcValue]> {
		match self {
			Self::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Borrows the members when this is a struct.
	pub fn as_struct(&self) -> Option<&RpcStruct> {
		match self {
			Self::Struct(members) => Some(members),
			_ => None,
		}
	}

	/// Borrows the text when this is a string.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(text) => Some(text),
			_ => None,
		}
	}

	/// Converts into a JSON value for the REST façade.
	///
	/// Base64 payloads become standard base64 text and date-times their ISO-8601 text;
	/// non-finite doubles become `null`.
	pub fn into_json(self) -> JsonValue {
		match self {
			Self::Nil => JsonValue::Null,
			Self::Bool(value) => JsonValue::Bool(value),
			Self::Int(value) => JsonValue::Number(value.into()),
			Self::Double(value) => Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number),
			Self::String(text) | Self::DateTime(text) => JsonValue::String(text),
			Self::Base64(bytes) => JsonValue::String(STANDARD.encode(bytes)),
			Self::Array(items) => JsonValue::Array(items.into_iter().map(Self::into_json).collect()),
			Self::Struct(members) => JsonValue::Object(
				members.into_iter().map(|(name, value)| (name, value.into_json())).collect(),
			),
		}
	}
}
impl From<JsonValue> for RpcValue {
	fn from(value: JsonValue) -> Self {
		match value {
			JsonValue::Null => Self::Nil,
			JsonValue::Bool(value) => Self::Bool(value),
			JsonValue::Number(number) => match number.as_i64() {
				Some(int) => Self::Int(int),
				None => Self::Double(number.as_f64().unwrap_or(f64::NAN)),
			},
			JsonValue::String(text) => Self::String(text),
			JsonValue::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
			JsonValue::Object(members) => Self::Struct(struct_from_json(members)),
		}
	}
}
impl From<RpcValue> for JsonValue {
	fn from(value: RpcValue) -> Self {
		value.into_json()
	}
}
impl From<RpcStruct> for RpcValue {
	fn from(members: RpcStruct) -> Self {
		Self::Struct(members)
	}
}
impl From<&str> for RpcValue {
	fn from(text: &str) -> Self {
		Self::String(text.to_owned())
	}
}
impl From<String> for RpcValue {
	fn from(text: String) -> Self {
		Self::String(text)
	}
}
impl From<bool> for RpcValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i64> for RpcValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

/// Converts a JSON object into struct members.
pub fn struct_from_json(members: Map<String, JsonValue>) -> RpcStruct {
	members.into_iter().map(|(name, value)| (name, RpcValue::from(value))).collect()
}

/// Builds struct members from `(name, value)` pairs.
pub fn rpc_struct<I, K, V>(members: I) -> RpcStruct
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<RpcValue>,
{
	members.into_iter().map(|(name, value)| (name.into(), value.into())).collect()
}
