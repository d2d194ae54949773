//! Executor
//!
//! Runs a compiled [`Chain`] against the Crossbar transport. Each call maps
//! its parent [`Link`] to the next one according to the class's
//! [`AccessorKind`]; the terminal link is then read, persisted or removed.
//! Raw content links are downloaded or uploaded as bytes instead.

use super::compiler::{Call, Chain, Param};
use super::registry::{class_def, AccessorKind, ClassDef};
use crate::crossbar::envelope::RawContent;
use crate::crossbar::error::Error;
use crate::crossbar::http::CrossbarHttp;
use reqwest::Method;
use serde_json::Value;

/// Addressable single resource
#[derive(Debug, Clone, PartialEq)]
pub struct EntityHandle {
    pub path: String,
    pub id: Option<String>,
    /// Fixed verb for action endpoints
    pub method: Option<Method>,
    /// Body accumulated before persisting
    pub body: Value,
}

impl EntityHandle {
    /// URL path of the record itself
    pub fn location(&self) -> String {
        match &self.id {
            Some(id) => join_path(&self.path, &urlencoding::encode(id)),
            None => self.path.clone(),
        }
    }
}

/// List endpoint with its query
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionHandle {
    pub path: String,
    pub query: Vec<(String, String)>,
}

/// Intermediate result of running part of a chain
#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    Root,
    Entity(EntityHandle),
    Collection(CollectionHandle),
    /// Plain data; ends the chain
    Value(Value),
    /// Content endpoint of a record; ends the chain
    Raw(String),
}

impl Link {
    fn describe(&self) -> &'static str {
        match self {
            Link::Root => "nothing",
            Link::Entity(_) => "a record",
            Link::Collection(_) => "a list",
            Link::Value(_) => "plain data",
            Link::Raw(_) => "raw content",
        }
    }
}

fn join_path(base: &str, segment: &str) -> String {
    match (base.is_empty(), segment.is_empty()) {
        (_, true) => base.to_string(),
        (true, false) => segment.to_string(),
        (false, false) => format!("{}/{}", base, segment),
    }
}

/// Encode one id or argument as a URL path segment.
///
/// An empty or dot segment would address the parent resource instead.
fn path_segment(raw: &str) -> Result<String, Error> {
    match raw {
        "" => Err(Error::MissingField("id")),
        "." | ".." => Err(Error::Descriptor(format!("`{}` is not a usable id", raw))),
        _ => Ok(urlencoding::encode(raw).into_owned()),
    }
}

/// Render an argument for a URL or query string
fn arg_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First argument as query pairs (`{"status": "waiting"}` -> `status=waiting`)
fn args_query(args: &[Value]) -> Vec<(String, String)> {
    args.first()
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), arg_string(value)))
                .collect()
        })
        .unwrap_or_default()
}

/// Shallow merge of `payload` into `body`
fn merge(body: &mut Value, payload: &Value) {
    match (body, payload) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        (target, source) => *target = source.clone(),
    }
}

pub struct Executor<'a> {
    http: &'a CrossbarHttp,
    token: Option<&'a str>,
}

impl<'a> Executor<'a> {
    pub fn new(http: &'a CrossbarHttp, token: Option<&'a str>) -> Self {
        Self { http, token }
    }

    /// Run every call of the chain and return the terminal link
    pub async fn resolve(&self, chain: &Chain) -> Result<Link, Error> {
        let mut link = Link::Root;
        for call in &chain.calls {
            link = self.step(link, call).await?;
        }
        Ok(link)
    }

    /// Read mode: fetch the terminal resource, or pass plain data through
    pub async fn read(&self, chain: &Chain) -> Result<Value, Error> {
        match self.resolve(chain).await? {
            Link::Value(value) => Ok(value),
            Link::Entity(entity) => Ok(self.http.get(&entity.location(), &[], self.token).await?.data),
            Link::Collection(collection) => Ok(self
                .http
                .get(&collection.path, &collection.query, self.token)
                .await?
                .data),
            Link::Root => Err(Error::Descriptor("nothing to read".to_string())),
            Link::Raw(_) => Err(Error::Descriptor(
                "raw content is downloaded, not read as JSON".to_string(),
            )),
        }
    }

    /// Download the terminal raw content undecoded
    pub async fn download(&self, chain: &Chain) -> Result<RawContent, Error> {
        match self.resolve(chain).await? {
            Link::Raw(path) => self.http.get_raw(&path, self.token).await,
            other => Err(not_raw(chain, &other)),
        }
    }

    /// Upload `bytes` as the terminal raw content. Returns the stored record
    /// when the reply carries an `id`.
    pub async fn upload(
        &self,
        chain: &Chain,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Option<Value>, Error> {
        let path = match self.resolve(chain).await? {
            Link::Raw(path) => path,
            other => return Err(not_raw(chain, &other)),
        };

        let reply = self.http.post_raw(&path, bytes, content_type, self.token).await?;
        Ok(reply.data.get("id").is_some().then_some(reply.data))
    }

    /// Mutate mode: merge the payload into the terminal entity and persist it.
    ///
    /// An entity with an id is updated (`POST`), one without is created
    /// (`PUT` on the collection); actions use their own verb. Returns the
    /// stored record when it carries an `id`.
    pub async fn mutate(&self, chain: &Chain, payload: &Value) -> Result<Option<Value>, Error> {
        let mut entity = match self.resolve(chain).await? {
            Link::Entity(entity) => entity,
            other => return Err(not_persistable(chain, &other)),
        };

        merge(&mut entity.body, payload);

        let method = entity.method.clone().unwrap_or(if entity.id.is_some() {
            Method::POST
        } else {
            Method::PUT
        });

        let reply = self
            .http
            .send(method, &entity.location(), &[], Some(&entity.body), self.token)
            .await?;

        if reply.data.get("id").is_some() {
            Ok(Some(reply.data))
        } else {
            Ok(None)
        }
    }

    /// Delete mode: remove the terminal entity, discarding the response body
    pub async fn delete(&self, chain: &Chain) -> Result<(), Error> {
        let entity = match self.resolve(chain).await? {
            Link::Entity(entity) => entity,
            other => return Err(not_persistable(chain, &other)),
        };

        if entity.id.is_none() {
            return Err(Error::MissingField("id"));
        }

        self.http.delete(&entity.location(), self.token).await?;
        Ok(())
    }

    async fn step(&self, parent: Link, call: &Call) -> Result<Link, Error> {
        let def = class_def(call.class)
            .ok_or_else(|| Error::Descriptor(format!("`{}` is not registered", call.class)))?;

        let base = match &parent {
            Link::Root if def.root => String::new(),
            Link::Root => {
                return Err(Error::Descriptor(format!("`{}` cannot start a descriptor", call.class)))
            }
            _ if def.root => {
                return Err(Error::Descriptor(format!("`{}` must start a descriptor", call.class)))
            }
            Link::Entity(entity) => entity.location(),
            Link::Collection(collection) => collection.path.clone(),
            Link::Value(_) | Link::Raw(_) => {
                return Err(Error::Descriptor(format!(
                    "`{}` cannot follow {}",
                    call.class,
                    parent.describe()
                )))
            }
        };
        let path = join_path(&base, &def.segment);

        match def.kind {
            AccessorKind::Entity => entity(def, path, &call.param).map(Link::Entity),
            AccessorKind::Action => action(def, path, &call.param).map(Link::Entity),
            AccessorKind::Collection => {
                let (path, query) = match &call.param {
                    Param::None => (path, Vec::new()),
                    Param::Id(id) => (join_path(&path, &path_segment(id)?), Vec::new()),
                    Param::Filters(filters) => (path, filters.clone()),
                    Param::Args(args) => (path, args_query(args)),
                };
                Ok(Link::Collection(CollectionHandle { path, query }))
            }
            AccessorKind::Fetch => {
                let query = match &call.param {
                    Param::Filters(filters) => filters.clone(),
                    Param::Args(args) => args_query(args),
                    Param::None => Vec::new(),
                    Param::Id(_) => {
                        return Err(Error::Descriptor(format!(
                            "`{}` returns plain data and takes no id",
                            call.class
                        )))
                    }
                };
                let reply = self.http.get(&path, &query, self.token).await?;
                Ok(Link::Value(reply.data))
            }
            AccessorKind::Path => {
                let path = match &call.param {
                    Param::Args(args) => args.iter().try_fold(path, |path, arg| {
                        Ok::<_, Error>(join_path(&path, &path_segment(&arg_string(arg))?))
                    })?,
                    Param::Id(id) => join_path(&path, &path_segment(id)?),
                    Param::None | Param::Filters(_) => path,
                };
                let reply = self.http.get(&path, &[], self.token).await?;
                Ok(Link::Value(reply.data))
            }
            AccessorKind::Raw => {
                if call.param != Param::None {
                    return Err(Error::Descriptor(format!("`{}` takes no parameters", call.class)));
                }
                match &parent {
                    Link::Entity(entity) if entity.id.is_some() => Ok(Link::Raw(path)),
                    Link::Entity(_) => Err(Error::MissingField("id")),
                    other => Err(Error::Descriptor(format!(
                        "`{}` cannot follow {}",
                        call.class,
                        other.describe()
                    ))),
                }
            }
        }
    }
}

fn entity(def: &ClassDef, path: String, param: &Param) -> Result<EntityHandle, Error> {
    let id = match param {
        Param::None => None,
        Param::Id(id) => Some(id.clone()),
        // Positional args address the record
        Param::Args(args) => args.first().map(arg_string),
        Param::Filters(_) => {
            return Err(Error::Descriptor(format!(
                "`{}` addresses a single record and takes no filters",
                def.class
            )))
        }
    };

    if let Some(id) = &id {
        path_segment(id)?;
    }

    Ok(EntityHandle {
        path,
        id,
        method: None,
        body: Value::Object(Default::default()),
    })
}

fn action(def: &ClassDef, path: String, param: &Param) -> Result<EntityHandle, Error> {
    let method = def
        .method
        .as_deref()
        .map(|m| Method::from_bytes(m.as_bytes()))
        .transpose()
        .map_err(|_| Error::Descriptor(format!("`{}` has an invalid verb", def.class)))?;

    let (id, body) = match param {
        Param::Args(args) => (None, args.first().cloned().unwrap_or(Value::Null)),
        Param::Id(id) => (Some(id.clone()), Value::Object(Default::default())),
        Param::None | Param::Filters(_) => (None, Value::Object(Default::default())),
    };
    if let Some(id) = &id {
        path_segment(id)?;
    }

    Ok(EntityHandle {
        path,
        id,
        method,
        body,
    })
}

fn not_persistable(chain: &Chain, link: &Link) -> Error {
    let terminal = chain
        .calls
        .last()
        .map(|c| c.class.as_str())
        .unwrap_or("<empty>");
    Error::Descriptor(format!(
        "`{}` yields {} and cannot be used in {:?} mode",
        terminal,
        link.describe(),
        chain.mode
    ))
}

fn not_raw(chain: &Chain, link: &Link) -> Error {
    let terminal = chain
        .calls
        .last()
        .map(|c| c.class.as_str())
        .unwrap_or("<empty>");
    Error::Descriptor(format!("`{}` yields {}, not raw content", terminal, link.describe()))
}
