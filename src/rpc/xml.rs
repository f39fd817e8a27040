//! XML-RPC wire codec: request encoding and response decoding.
//!
//! Decoding is a small recursive-descent walk over `quick-xml` events. Element names are
//! compared by local name, so namespaced extension types such as `<ex:nil/>` and `<ex:i8>`
//! are accepted alongside the standard ones.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use quick_xml::{
	Reader,
	escape::escape,
	events::{BytesEnd, BytesStart, Event},
};
// self
use crate::{
	_prelude::*,
	error::ProtocolError,
	rpc::{RpcFault, RpcStruct, RpcValue},
};

/// Renders a `<methodCall>` document.
///
/// XML-RPC has no spelling for NaN or infinities, so a non-finite [`RpcValue::Double`]
/// anywhere in `params` is [`Error::InvalidInput`].
pub fn encode_call(method: &str, params: &[RpcValue]) -> Result<String> {
	let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");

	out.push_str(&escape(method));
	out.push_str("</methodName><params>");

	for param in params {
		out.push_str("<param>");
		write_value(&mut out, param)?;
		out.push_str("</param>");
	}

	out.push_str("</params></methodCall>\n");

	Ok(out)
}

/// Parses a `<methodResponse>` document into its result or fault.
pub fn decode_response(body: &str) -> Result<Result<RpcValue, RpcFault>, ProtocolError> {
	let mut cursor = Cursor::new(body);

	if !cursor.open("methodResponse")? {
		return Err(ProtocolError::structure("methodResponse is empty"));
	}

	let outcome = match cursor.structural()? {
		Event::Start(tag) if is_start(&tag, "params") => Ok(cursor.params()?),
		Event::Empty(tag) if is_start(&tag, "params") => Ok(RpcValue::Nil),
		Event::Start(tag) if is_start(&tag, "fault") => {
			if !cursor.open("value")? {
				return Err(ProtocolError::structure("fault carries no value"));
			}

			let value = cursor.value()?;

			cursor.close("fault")?;

			Err(fault_from(value)?)
		},
		other => return Err(unexpected("params", &other)),
	};

	cursor.close("methodResponse")?;

	Ok(outcome)
}

fn write_value(out: &mut String, value: &RpcValue) -> Result<()> {
	out.push_str("<value>");

	match value {
		RpcValue::Nil => out.push_str("<nil/>"),
		RpcValue::Bool(flag) => out.push_str(if *flag {
			"<boolean>1</boolean>"
		} else {
			"<boolean>0</boolean>"
		}),
		RpcValue::Int(int) => {
			let tag = if i32::try_from(*int).is_ok() { "int" } else { "i8" };

			out.push_str(&format!("<{tag}>{int}</{tag}>"));
		},
		RpcValue::Double(double) => {
			if !double.is_finite() {
				return Err(Error::InvalidInput {
					reason: format!("{double} cannot be sent as an XML-RPC double"),
				});
			}

			out.push_str(&format!("<double>{double}</double>"));
		},
		RpcValue::String(text) => {
			out.push_str("<string>");
			out.push_str(&escape(text.as_str()));
			out.push_str("</string>");
		},
		RpcValue::DateTime(text) => {
			out.push_str("<dateTime.iso8601>");
			out.push_str(&escape(text.as_str()));
			out.push_str("</dateTime.iso8601>");
		},
		RpcValue::Base64(bytes) => {
			out.push_str("<base64>");
			out.push_str(&STANDARD.encode(bytes));
			out.push_str("</base64>");
		},
		RpcValue::Array(items) => {
			out.push_str("<array><data>");

			for item in items {
				write_value(out, item)?;
			}

			out.push_str("</data></array>");
		},
		RpcValue::Struct(members) => {
			out.push_str("<struct>");

			for (name, member) in members {
				out.push_str("<member><name>");
				out.push_str(&escape(name.as_str()));
				out.push_str("</name>");
				write_value(out, member)?;
				out.push_str("</member>");
			}

			out.push_str("</struct>");
		},
	}

	out.push_str("</value>");

	Ok(())
}

fn fault_from(value: RpcValue) -> Result<RpcFault, ProtocolError> {
	let RpcValue::Struct(mut members) = value else {
		return Err(ProtocolError::structure("fault value is not a struct"));
	};
	let code = match members.remove("faultCode") {
		Some(RpcValue::Int(code)) => code,
		Some(RpcValue::String(raw)) =>
			raw.trim().parse().map_err(|_| ProtocolError::Scalar { kind: "int", raw })?,
		_ => return Err(ProtocolError::structure("fault lacks an integer faultCode")),
	};
	let message = match members.remove("faultString") {
		Some(RpcValue::String(message)) => message,
		None => String::new(),
		_ => return Err(ProtocolError::structure("faultString is not a string")),
	};

	Ok(RpcFault { code, message })
}

struct Cursor<'a> {
	reader: Reader<&'a [u8]>,
}
impl<'a> Cursor<'a> {
	fn new(body: &'a str) -> Self {
		Self { reader: Reader::from_str(body) }
	}

	/// Next event, skipping prolog and comment noise.
	fn raw(&mut self) -> Result<Event<'a>, ProtocolError> {
		loop {
			match self.reader.read_event()? {
				Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
				event => return Ok(event),
			}
		}
	}

	/// Next structural event; whitespace between elements is skipped.
	fn structural(&mut self) -> Result<Event<'a>, ProtocolError> {
		loop {
			match self.raw()? {
				Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => continue,
				event => return Ok(event),
			}
		}
	}

	/// Consumes `<name>`; returns `false` when the element is self-closing.
	fn open(&mut self, name: &str) -> Result<bool, ProtocolError> {
		match self.structural()? {
			Event::Start(tag) if is_start(&tag, name) => Ok(true),
			Event::Empty(tag) if is_start(&tag, name) => Ok(false),
			other => Err(unexpected(name, &other)),
		}
	}

	fn close(&mut self, name: &str) -> Result<(), ProtocolError> {
		match self.structural()? {
			Event::End(tag) if is_end(&tag, name) => Ok(()),
			other => Err(unexpected(&format!("/{name}"), &other)),
		}
	}

	/// Collects character data up to `</name>`.
	fn text(&mut self, name: &str) -> Result<String, ProtocolError> {
		let mut buf = String::new();

		loop {
			match self.raw()? {
				Event::Text(text) => buf.push_str(&text.unescape()?),
				Event::CData(data) => buf.push_str(&String::from_utf8_lossy(&data)),
				Event::End(tag) if is_end(&tag, name) => return Ok(buf),
				other => return Err(unexpected(&format!("/{name}"), &other)),
			}
		}
	}

	/// Parses the contents of `<params>` up to and including `</params>`.
	fn params(&mut self) -> Result<RpcValue, ProtocolError> {
		let value = match self.structural()? {
			Event::End(tag) if is_end(&tag, "params") => return Ok(RpcValue::Nil),
			Event::Start(tag) if is_start(&tag, "param") => {
				let value =
					if self.open("value")? { self.value()? } else { RpcValue::String(String::new()) };

				self.close("param")?;

				value
			},
			other => return Err(unexpected("param", &other)),
		};

		self.close("params")?;

		Ok(value)
	}

	/// Parses the contents of `<value>` up to and including `</value>`.
	fn value(&mut self) -> Result<RpcValue, ProtocolError> {
		let mut untyped = String::new();

		loop {
			match self.raw()? {
				Event::Text(text) => untyped.push_str(&text.unescape()?),
				Event::CData(data) => untyped.push_str(&String::from_utf8_lossy(&data)),
				Event::End(tag) if is_end(&tag, "value") => return Ok(RpcValue::String(untyped)),
				Event::Start(tag) if untyped.trim().is_empty() => {
					let value = self.typed(&local_name(&tag))?;

					self.close("value")?;

					return Ok(value);
				},
				Event::Empty(tag) if untyped.trim().is_empty() => {
					let value = empty_typed(&local_name(&tag))?;

					self.close("value")?;

					return Ok(value);
				},
				other => return Err(unexpected("value content", &other)),
			}
		}
	}

	fn typed(&mut self, kind: &str) -> Result<RpcValue, ProtocolError> {
		let value = match kind {
			"int" | "i4" | "i8" => {
				let raw = self.text(kind)?;

				RpcValue::Int(raw.trim().parse().map_err(|_| ProtocolError::Scalar { kind: "int", raw })?)
			},
			"boolean" => {
				let raw = self.text(kind)?;

				match raw.trim() {
					"1" => RpcValue::Bool(true),
					"0" => RpcValue::Bool(false),
					_ => return Err(ProtocolError::Scalar { kind: "boolean", raw }),
				}
			},
			"double" => {
				let raw = self.text(kind)?;

				RpcValue::Double(
					raw.trim().parse().map_err(|_| ProtocolError::Scalar { kind: "double", raw })?,
				)
			},
			"string" => RpcValue::String(self.text(kind)?),
			"dateTime.iso8601" => RpcValue::DateTime(self.text(kind)?.trim().to_owned()),
			"base64" => {
				let raw = self.text(kind)?;
				let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

				RpcValue::Base64(
					STANDARD.decode(compact).map_err(|_| ProtocolError::Scalar { kind: "base64", raw })?,
				)
			},
			"nil" => {
				self.close(kind)?;

				RpcValue::Nil
			},
			"array" => self.array()?,
			"struct" => self.structure()?,
			other => return Err(ProtocolError::structure(format!("unsupported value type <{other}>"))),
		};

		Ok(value)
	}

	fn array(&mut self) -> Result<RpcValue, ProtocolError> {
		let mut items = Vec::new();

		if self.open("data")? {
			loop {
				match self.structural()? {
					Event::Start(tag) if is_start(&tag, "value") => items.push(self.value()?),
					Event::Empty(tag) if is_start(&tag, "value") =>
						items.push(RpcValue::String(String::new())),
					Event::End(tag) if is_end(&tag, "data") => break,
					other => return Err(unexpected("value", &other)),
				}
			}
		}

		self.close("array")?;

		Ok(RpcValue::Array(items))
	}

	fn structure(&mut self) -> Result<RpcValue, ProtocolError> {
		let mut members = RpcStruct::new();

		loop {
			match self.structural()? {
				Event::Start(tag) if is_start(&tag, "member") => {
					let name = if self.open("name")? { self.text("name")? } else { String::new() };
					let value =
						if self.open("value")? { self.value()? } else { RpcValue::String(String::new()) };

					self.close("member")?;
					members.insert(name, value);
				},
				Event::End(tag) if is_end(&tag, "struct") => break,
				other => return Err(unexpected("member", &other)),
			}
		}

		Ok(RpcValue::Struct(members))
	}
}

fn empty_typed(kind: &str) -> Result<RpcValue, ProtocolError> {
	match kind {
		"nil" => Ok(RpcValue::Nil),
		"string" => Ok(RpcValue::String(String::new())),
		"base64" => Ok(RpcValue::Base64(Vec::new())),
		"array" => Ok(RpcValue::Array(Vec::new())),
		"struct" => Ok(RpcValue::Struct(RpcStruct::new())),
		other => Err(ProtocolError::structure(format!("<{other}/> cannot be empty"))),
	}
}

fn local_name(tag: &BytesStart) -> String {
	String::from_utf8_lossy(tag.local_name().as_ref()).into_owned()
}

fn is_start(tag: &BytesStart, name: &str) -> bool {
	tag.local_name().as_ref() == name.as_bytes()
}

fn is_end(tag: &BytesEnd, name: &str) -> bool {
	tag.local_name().as_ref() == name.as_bytes()
}

fn unexpected(expected: &str, found: &Event) -> ProtocolError {
	let found = match found {
		Event::Start(tag) => format!("<{}>", String::from_utf8_lossy(tag.name().as_ref())),
		Event::Empty(tag) => format!("<{}/>", String::from_utf8_lossy(tag.name().as_ref())),
		Event::End(tag) => format!("</{}>", String::from_utf8_lossy(tag.name().as_ref())),
		Event::Text(_) | Event::CData(_) => "character data".into(),
		Event::Eof => "end of document".into(),
		_ => "markup".into(),
	};

	ProtocolError::structure(format!("expected <{expected}>, found {found}"))
}
