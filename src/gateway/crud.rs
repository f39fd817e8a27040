//! Search/add/update/delete conventions layered on [`Gateway::invoke`].

// self
use crate::{
	_prelude::*,
	auth::{AccountKey, ObjectType},
	error::ProtocolError,
	gateway::Gateway,
	rpc::{Operation, RpcMethod, RpcStruct, RpcValue},
};

const PROPERTY_OBJECT: &str = "property";

impl Gateway {
	/// Lists the `object` records matching `filter`.
	pub async fn search(
		&self,
		account: &AccountKey,
		object: &ObjectType,
		filter: RpcStruct,
	) -> Result<Vec<RpcValue>> {
		let method = RpcMethod::new(object.clone(), Operation::Search);

		match self.invoke(account, &method, filter.into(), None).await? {
			RpcValue::Array(records) => Ok(records),
			_ => Err(ProtocolError::UnexpectedResult {
				method: method.to_string(),
				expected: "an array of records",
			}
			.into()),
		}
	}

	/// Returns the first `object` record matching `filter`.
	///
	/// An empty result is [`Error::NotFound`].
	pub async fn find_one(
		&self,
		account: &AccountKey,
		object: &ObjectType,
		filter: RpcStruct,
	) -> Result<RpcValue> {
		self.search(account, object, filter)
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| Error::NotFound { object: object.to_string() })
	}

	/// Creates an `object` record.
	///
	/// The upstream reports invalid payloads as faults; those surface as
	/// [`Error::InvalidInput`] carrying the fault string.
	pub async fn add(
		&self,
		account: &AccountKey,
		object: &ObjectType,
		record: RpcStruct,
	) -> Result<RpcValue> {
		let method = RpcMethod::new(object.clone(), Operation::Add);

		self.invoke(account, &method, record.into(), None).await.map_err(|e| match e {
			Error::UpstreamFault(fault) => Error::InvalidInput { reason: fault.message },
			e => e,
		})
	}

	/// Applies `set` to every `object` record matching `filter`.
	///
	/// Members of `set` that are nil mean "leave unchanged" and are dropped. A `set` with
	/// nothing left is rejected without contacting the upstream. On the wire the changes come
	/// first and the filter second.
	pub async fn update(
		&self,
		account: &AccountKey,
		object: &ObjectType,
		filter: RpcStruct,
		mut set: RpcStruct,
	) -> Result<RpcValue> {
		set.retain(|_, value| !matches!(value, RpcValue::Nil));

		if set.is_empty() {
			return Err(Error::InvalidInput { reason: "No fields to update provided".into() });
		}

		let method = RpcMethod::new(object.clone(), Operation::Update);

		self.invoke(account, &method, set.into(), Some(filter.into())).await
	}

	/// Removes every `object` record matching `filter`.
	pub async fn delete(
		&self,
		account: &AccountKey,
		object: &ObjectType,
		filter: RpcStruct,
	) -> Result<RpcValue> {
		let method = RpcMethod::new(object.clone(), Operation::Delete);

		self.invoke(account, &method, filter.into(), None).await
	}

	/// Lists the property descriptors the upstream exposes for every object module.
	pub async fn properties(&self, account: &AccountKey) -> Result<Vec<RpcValue>> {
		let object = ObjectType::new(PROPERTY_OBJECT)
			.map_err(|e| Error::InvalidInput { reason: e.to_string() })?;

		self.search(account, &object, RpcStruct::new()).await
	}
}
