//! # In-Process Backend
//!
//! [`MemoryServer`] is a tiny REST backend for one collection. It runs as a tokio task and
//! processes requests sequentially, so its store needs no lock: the task owns it. Clients
//! reach it through a [`MemoryDispatcher`], which only holds the sending half of an
//! unbounded channel and therefore never blocks.
//!
//! Routes, relative to the collection URL:
//!
//! | Request | Response |
//! |---------|----------|
//! | `GET /` | `200` with every record, in insertion order |
//! | `POST /` | `201` with the stored record; `id` is assigned by the server |
//! | `GET /<id>` | `200` with the record, or `404` |
//! | `PUT /<id>` | `200` with the replaced record, or `404` |
//! | `DELETE /<id>` | `204`, or `404` |
//!
//! Bodies that are not JSON objects get `400`; unknown paths `404`; other methods `405`.
//!
//! Latency can be configured per method. It delays the completion on its own task, so a
//! slow response never holds up the requests queued behind it.
//!
//! The run loop ends once every [`MemoryDispatcher`] clone has been dropped.

use crate::transport::{Completion, Dispatcher, RawResponse, TransportRequest};
use http::{Method, StatusCode};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type Envelope = (TransportRequest, Completion);

/// Sending half of a [`MemoryServer`].
#[derive(Clone)]
pub struct MemoryDispatcher {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl Dispatcher for MemoryDispatcher {
    fn dispatch(&self, request: TransportRequest, completion: Completion) {
        if self.sender.send((request, completion)).is_err() {
            // The completion came back inside the error and is dropped with it, which
            // rejects the operation as abandoned.
            warn!("Memory server has shut down");
        }
    }
}

/// In-process REST backend for a single collection.
pub struct MemoryServer {
    receiver: mpsc::UnboundedReceiver<Envelope>,
    collection_url: String,
    records: Vec<(String, Value)>,
    next_id: u64,
    latency: HashMap<Method, Duration>,
}

impl MemoryServer {
    /// Creates a server for `collection_url` (e.g. `/api/users`) and its dispatcher.
    pub fn new(collection_url: impl Into<String>) -> (Self, MemoryDispatcher) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let server = Self {
            receiver,
            collection_url: collection_url.into().trim_end_matches('/').to_string(),
            records: Vec::new(),
            next_id: 1,
            latency: HashMap::new(),
        };
        (server, MemoryDispatcher { sender })
    }

    /// Delays every response to `method` by `delay`.
    pub fn with_latency(mut self, method: Method, delay: Duration) -> Self {
        self.latency.insert(method, delay);
        self
    }

    /// Pre-populates the store. Records without an `id` are assigned one; a record whose
    /// `id` is already stored replaces the earlier one in place.
    pub fn with_records(mut self, records: impl IntoIterator<Item = Value>) -> Self {
        for record in records {
            if let Value::Object(fields) = record {
                self.insert(fields);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Runs the request loop until every dispatcher is dropped.
    pub async fn run(mut self) {
        info!(collection = %self.collection_url, size = self.records.len(), "Memory server started");

        while let Some((request, completion)) = self.receiver.recv().await {
            let response = self.handle(&request);
            debug!(
                method = %request.method,
                url = %request.url,
                status = response.status.as_u16(),
                "Handled"
            );
            match self.latency.get(&request.method).copied() {
                Some(delay) if !delay.is_zero() => {
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        completion.resolve(response);
                    });
                }
                _ => {
                    completion.resolve(response);
                }
            }
        }

        info!(collection = %self.collection_url, size = self.records.len(), "Shutdown");
    }

    fn handle(&mut self, request: &TransportRequest) -> RawResponse {
        let Some(rest) = request.url.strip_prefix(self.collection_url.as_str()) else {
            return not_found(&request.url);
        };
        match rest {
            "" | "/" => match request.method {
                Method::GET => {
                    let all: Vec<&Value> = self.records.iter().map(|(_, v)| v).collect();
                    RawResponse::json(StatusCode::OK, &all)
                }
                Method::POST => self.create(request),
                _ => method_not_allowed(&request.method),
            },
            member => match member.strip_prefix('/') {
                Some(id) if !id.is_empty() && !id.contains('/') => self.member(request, id),
                _ => not_found(&request.url),
            },
        }
    }

    fn create(&mut self, request: &TransportRequest) -> RawResponse {
        let fields = match parse_object(request) {
            Ok(fields) => fields,
            Err(response) => return response,
        };
        if fields.get("id").is_some_and(|id| !id.is_null()) {
            return bad_request("id is assigned by the server");
        }
        let record = self.insert(fields);
        info!(collection = %self.collection_url, size = self.records.len(), "Created");
        RawResponse::json(StatusCode::CREATED, &record)
    }

    fn member(&mut self, request: &TransportRequest, id: &str) -> RawResponse {
        let Some(index) = self.records.iter().position(|(key, _)| key == id) else {
            return not_found(&request.url);
        };
        match request.method {
            Method::GET => RawResponse::json(StatusCode::OK, &self.records[index].1),
            Method::PUT => {
                let mut fields = match parse_object(request) {
                    Ok(fields) => fields,
                    Err(response) => return response,
                };
                let stored_id = self.records[index].1.get("id").cloned().unwrap_or(Value::Null);
                fields.insert("id".to_string(), stored_id);
                let record = Value::Object(fields);
                self.records[index].1 = record.clone();
                info!(collection = %self.collection_url, %id, "Updated");
                RawResponse::json(StatusCode::OK, &record)
            }
            Method::DELETE => {
                self.records.remove(index);
                info!(collection = %self.collection_url, %id, size = self.records.len(), "Deleted");
                RawResponse::empty(StatusCode::NO_CONTENT)
            }
            _ => method_not_allowed(&request.method),
        }
    }

    fn insert(&mut self, mut fields: Map<String, Value>) -> Value {
        let id = match fields.get("id") {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                let id = Value::from(self.next_id);
                self.next_id = self.next_id.saturating_add(1);
                fields.insert("id".to_string(), id.clone());
                id
            }
        };
        if let Some(n) = id.as_u64() {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }
        let key = render_id(&id);
        let record = Value::Object(fields);
        match self.records.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, stored)) => {
                warn!(collection = %self.collection_url, id = %key, "Replacing record with duplicate id");
                *stored = record.clone();
            }
            None => self.records.push((key, record.clone())),
        }
        record
    }
}

fn render_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_object(request: &TransportRequest) -> Result<Map<String, Value>, RawResponse> {
    let body = request
        .body
        .as_ref()
        .ok_or_else(|| bad_request("missing body"))?;
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(bad_request("body must be a JSON object")),
        Err(e) => Err(bad_request(&e.to_string())),
    }
}

fn bad_request(message: &str) -> RawResponse {
    RawResponse::json(StatusCode::BAD_REQUEST, &json!({ "error": message }))
}

fn not_found(url: &str) -> RawResponse {
    RawResponse::json(StatusCode::NOT_FOUND, &json!({ "error": format!("{url} not found") }))
}

fn method_not_allowed(method: &Method) -> RawResponse {
    RawResponse::json(
        StatusCode::METHOD_NOT_ALLOWED,
        &json!({ "error": format!("{method} not allowed") }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: Value) -> TransportRequest {
        TransportRequest::new(Method::POST, "/items").with_body(serde_json::to_vec(&body).unwrap())
    }

    #[test]
    fn assigns_increasing_ids() {
        let (mut server, _dispatcher) = MemoryServer::new("/items");

        let first = server.handle(&post(json!({"name": "a"})));
        let second = server.handle(&post(json!({"name": "b", "id": null})));

        assert_eq!(first.status, StatusCode::CREATED);
        let first: Value = serde_json::from_slice(&first.body).unwrap();
        let second: Value = serde_json::from_slice(&second.body).unwrap();
        assert_eq!(first["id"], json!(1));
        assert_eq!(second["id"], json!(2));
        assert_eq!(server.len(), 2);
    }

    #[test]
    fn seeded_ids_advance_counter() {
        let (server, _dispatcher) = MemoryServer::new("/items");
        let mut server = server.with_records([json!({"id": 7, "name": "seed"})]);

        let created = server.handle(&post(json!({"name": "next"})));
        let created: Value = serde_json::from_slice(&created.body).unwrap();
        assert_eq!(created["id"], json!(8));
    }

    #[test]
    fn seeding_the_largest_id_does_not_overflow() {
        let (server, _dispatcher) = MemoryServer::new("/items");
        let server = server.with_records([json!({"id": u64::MAX, "name": "last"})]);

        assert_eq!(server.len(), 1);
        assert_eq!(server.next_id, u64::MAX);
    }

    #[test]
    fn duplicate_seeded_ids_replace_in_place() {
        let (server, _dispatcher) = MemoryServer::new("/items");
        let mut server = server.with_records([
            json!({"id": 1, "name": "first"}),
            json!({"id": 2, "name": "second"}),
            json!({"id": 1, "name": "again"}),
        ]);

        assert_eq!(server.len(), 2);
        let all = server.handle(&TransportRequest::new(Method::GET, "/items"));
        let all: Value = serde_json::from_slice(&all.body).unwrap();
        assert_eq!(all, json!([{"id": 1, "name": "again"}, {"id": 2, "name": "second"}]));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let (mut server, _dispatcher) = MemoryServer::new("/items");
        server.handle(&post(json!({"name": "a"})));

        let deleted = server.handle(&TransportRequest::new(Method::DELETE, "/items/1"));
        let fetched = server.handle(&TransportRequest::new(Method::GET, "/items/1"));

        assert_eq!(deleted.status, StatusCode::NO_CONTENT);
        assert_eq!(fetched.status, StatusCode::NOT_FOUND);
        assert!(server.is_empty());
    }

    #[test]
    fn rejects_bad_bodies_and_routes() {
        let (mut server, _dispatcher) = MemoryServer::new("/items");

        let not_object = server.handle(&post(json!([1, 2])));
        let client_id = server.handle(&post(json!({"id": 5})));
        let wrong_route = server.handle(&TransportRequest::new(Method::GET, "/other"));
        let wrong_method = server.handle(&TransportRequest::new(Method::PATCH, "/items"));

        assert_eq!(not_object.status, StatusCode::BAD_REQUEST);
        assert_eq!(client_id.status, StatusCode::BAD_REQUEST);
        assert_eq!(wrong_route.status, StatusCode::NOT_FOUND);
        assert_eq!(wrong_method.status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
