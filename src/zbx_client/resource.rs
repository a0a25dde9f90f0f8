use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::Result;
use crate::error::ZbxError;

use super::descriptor::ResourceDescriptor;
use super::fields::{self, Fields, into_fields, parse_id};
use super::models::Mutation;
use super::session::Session;

/// CRUD, lookup and reconciliation for one object type.
///
/// Every call is a single JSON-RPC round trip except the composite ones
/// (`get_or_create`, `update`, `create_or_update`), which issue their steps
/// sequentially and are not atomic: two callers racing on the same natural
/// key may both create.
#[derive(Clone)]
pub struct Resource {
    session: Arc<Session>,
    descriptor: ResourceDescriptor,
}

impl Resource {
    #[must_use]
    pub const fn new(session: Arc<Session>, descriptor: ResourceDescriptor) -> Self {
        Self {
            session,
            descriptor,
        }
    }

    #[must_use]
    pub const fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub(crate) fn session(&self) -> &Session {
        &self.session
    }

    /// Create one object, filling unset fields from the type defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `fields` is not an object or the server rejects the call.
    pub async fn create(&self, fields: Value) -> Result<Mutation> {
        debug!(method = %self.descriptor.method("create"), "create");
        let fields = fields::merge_defaults(self.descriptor.default_fields(), into_fields(fields)?);
        let result = self
            .session
            .call(&self.descriptor.method("create"), json!([fields]))
            .await?;
        self.parse_mutation(result)
    }

    /// Delete objects by surrogate id.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the call.
    pub async fn delete(&self, ids: &[u64]) -> Result<Mutation> {
        debug!(method = %self.descriptor.method("delete"), ?ids, "delete");
        let result = self
            .session
            .call(&self.descriptor.method("delete"), id_list(ids))
            .await?;
        self.parse_mutation(result)
    }

    /// Resolve the surrogate id of the object named by the natural key in
    /// `fields`, narrowed by any scope fields present. `None` when nothing
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::MissingIdentifier`] when the natural key is absent,
    /// and transport or API errors as-is.
    pub async fn get_id(&self, fields: Value) -> Result<Option<u64>> {
        let fields = into_fields(fields)?;
        let identify = self.descriptor.identify_field;
        let name = fields
            .get(identify)
            .filter(|value| !value.is_null())
            .ok_or_else(|| ZbxError::MissingIdentifier {
                field: identify.to_string(),
            })?;

        let mut filter = Map::new();
        filter.insert(identify.to_string(), name.clone());
        for scope in self.descriptor.scope_fields {
            if let Some(value) = fields.get(*scope).filter(|value| !value.is_null()) {
                filter.insert((*scope).to_string(), value.clone());
            }
        }

        let id_field = self.descriptor.id_field();
        let rows: Vec<Fields> = self
            .session
            .call(
                &self.descriptor.method("get"),
                json!({ "filter": filter, "output": [id_field, identify] }),
            )
            .await?;

        rows.iter()
            .find(|row| row.get(identify).is_some_and(|v| fields::same_scalar(v, name)))
            .map(|row| self.row_id(row))
            .transpose()
    }

    /// Return the id of the object with this natural key, creating it first
    /// if it does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`Resource::get_id`] and [`Resource::create`].
    pub async fn get_or_create(&self, fields: Value) -> Result<u64> {
        let lookup = self.lookup_fields(&fields)?;
        if let Some(id) = self.get_id(lookup).await? {
            return Ok(id);
        }
        let created = self.create(fields).await?;
        created.id().ok_or_else(|| {
            ZbxError::InvalidField {
                field: "result",
                message: format!("expected a single created id, got {created:?}"),
            }
            .into()
        })
    }

    /// Update an object, skipping the write when the stored values already
    /// match `fields` (unless `force`).
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::MissingIdentifier`] when the id field is absent or
    /// not numeric, and transport or API errors as-is.
    pub async fn update(&self, fields: Value, force: bool) -> Result<Mutation> {
        let fields = into_fields(fields)?;
        let id = self.required_id(&fields)?;

        if !force {
            let stored = self.fetch_by_id(id).await?;
            if stored
                .iter()
                .find(|row| self.row_id(row).is_ok_and(|row_id| row_id == id))
                .is_some_and(|row| fields::matches(row, &fields))
            {
                debug!(
                    method = %self.descriptor.method("update"),
                    id,
                    "stored object already matches, skipping update"
                );
                return Ok(Mutation::Id(id));
            }
        }

        let result = self
            .session
            .call(&self.descriptor.method("update"), json!([fields]))
            .await?;
        self.parse_mutation(result)
    }

    /// Update the object if its natural key resolves, create it otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`Resource::get_id`], [`Resource::update`] and [`Resource::create`].
    pub async fn create_or_update(&self, fields: Value) -> Result<Mutation> {
        let lookup = self.lookup_fields(&fields)?;
        match self.get_id(lookup).await? {
            Some(id) => {
                let mut fields = into_fields(fields)?;
                fields.insert(
                    self.descriptor.id_field().into_owned(),
                    Value::String(id.to_string()),
                );
                self.update(Value::Object(fields), false).await
            }
            None => self.create(fields).await,
        }
    }

    /// Fetch every object whose id equals the id in `fields`.
    ///
    /// # Errors
    ///
    /// Returns [`ZbxError::MissingIdentifier`] when the id field is absent,
    /// and transport or API errors as-is.
    pub async fn dump_by_id(&self, fields: Value) -> Result<Vec<Fields>> {
        let fields = into_fields(fields)?;
        let id = self.required_id(&fields)?;
        self.fetch_by_id(id).await
    }

    /// Map natural key to surrogate id for every object of this type.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is, or
    /// [`ZbxError::InvalidField`] when a row carries a non-numeric id.
    pub async fn all(&self) -> Result<BTreeMap<String, u64>> {
        let rows: Vec<Fields> = self
            .session
            .call(&self.descriptor.method("get"), json!({ "output": "extend" }))
            .await?;

        let identify = self.descriptor.identify_field;
        let mut out = BTreeMap::new();
        for row in &rows {
            let Some(name) = row.get(identify).and_then(Value::as_str) else {
                continue;
            };
            out.insert(name.to_string(), self.row_id(row)?);
        }
        Ok(out)
    }

    /// Fetch full objects matching the natural key in `fields`, or every
    /// object when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn get_full_data(&self, fields: Value) -> Result<Vec<Fields>> {
        let fields = into_fields(fields)?;
        let identify = self.descriptor.identify_field;
        let mut params = Map::new();
        if let Some(name) = fields.get(identify).filter(|value| !value.is_null()) {
            params.insert("filter".to_string(), json!({ identify: name }));
        }
        params.insert("output".to_string(), json!("extend"));
        self.session
            .call(&self.descriptor.method("get"), Value::Object(params))
            .await
    }

    /// `<prefix>.get` with caller-built params.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn get_raw(&self, params: Value) -> Result<Value> {
        self.session.call(&self.descriptor.method("get"), params).await
    }

    /// `<prefix>.create` with caller-built params; no defaults applied.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn create_raw(&self, params: Value) -> Result<Value> {
        self.session
            .call(&self.descriptor.method("create"), params)
            .await
    }

    /// `<prefix>.update` with caller-built params; no change detection.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn update_raw(&self, params: Value) -> Result<Value> {
        self.session
            .call(&self.descriptor.method("update"), params)
            .await
    }

    /// `<prefix>.delete` with caller-built params.
    ///
    /// # Errors
    ///
    /// Returns transport and API errors as-is.
    pub async fn delete_raw(&self, params: Value) -> Result<Value> {
        self.session
            .call(&self.descriptor.method("delete"), params)
            .await
    }

    pub(crate) async fn fetch_by_id(&self, id: u64) -> Result<Vec<Fields>> {
        let id_field = self.descriptor.id_field();
        self.session
            .call(
                &self.descriptor.method("get"),
                json!({
                    "filter": { id_field.to_string(): id.to_string() },
                    "output": "extend",
                }),
            )
            .await
    }

    pub(crate) fn required_id(&self, fields: &Fields) -> Result<u64> {
        let id_field = self.descriptor.id_field();
        fields
            .get(&*id_field)
            .and_then(parse_id)
            .ok_or_else(|| {
                ZbxError::MissingIdentifier {
                    field: id_field.into_owned(),
                }
                .into()
            })
    }

    pub(crate) fn row_id(&self, row: &Fields) -> Result<u64> {
        let id_field = self.descriptor.id_field();
        row.get(&*id_field).and_then(parse_id).ok_or_else(|| {
            ZbxError::InvalidField {
                field: "result",
                message: format!("row without a numeric {id_field}"),
            }
            .into()
        })
    }

    /// Natural key plus scope fields, the subset of `fields` used for lookups.
    fn lookup_fields(&self, fields: &Value) -> Result<Value> {
        let source = fields.as_object().ok_or_else(|| ZbxError::InvalidParams {
            message: format!("expected a JSON object, got {fields}"),
        })?;
        let lookup: Fields = std::iter::once(self.descriptor.identify_field)
            .chain(self.descriptor.scope_fields.iter().copied())
            .filter_map(|key| source.get(key).map(|v| (key.to_string(), v.clone())))
            .collect();
        Ok(Value::Object(lookup))
    }

    pub(crate) fn parse_mutation(&self, result: Value) -> Result<Mutation> {
        parse_mutation(result, &self.descriptor.ids_field())
    }
}

pub(crate) fn id_list(ids: &[u64]) -> Value {
    Value::Array(ids.iter().map(|id| Value::String(id.to_string())).collect())
}

/// Interpret the `{"<ids_field>": [...]}` answer of a write call.
pub(crate) fn parse_mutation(result: Value, ids_field: &str) -> Result<Mutation> {
    match result {
        Value::Bool(flag) => Ok(Mutation::Success(flag)),
        Value::Object(map) if map.is_empty() => Ok(Mutation::Success(false)),
        Value::Object(map) => {
            let ids = map.get(ids_field).and_then(Value::as_array).ok_or_else(|| {
                ZbxError::InvalidField {
                    field: "result",
                    message: format!("expected {ids_field} in write response"),
                }
            })?;
            match ids.as_slice() {
                [] => Ok(Mutation::Success(false)),
                [single] => parse_id(single).map(Mutation::Id).ok_or_else(|| {
                    ZbxError::InvalidField {
                        field: "result",
                        message: format!("non-numeric id {single} in {ids_field}"),
                    }
                    .into()
                }),
                _ => Ok(Mutation::Success(true)),
            }
        }
        other => Err(ZbxError::InvalidField {
            field: "result",
            message: format!("unexpected write response {other}"),
        }
        .into()),
    }
}
