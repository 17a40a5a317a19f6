//! Scripted transport for pipeline and cache tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use comicshelf_api_models::TokenPair;

use crate::error::TransportError;
use crate::session::CredentialStore;
use crate::transport::{HttpRequest, HttpResponse, Transport};

enum Scripted {
    Respond(HttpResponse, u32),
    Timeout,
}

/// Replays queued responses and records every request it receives.
///
/// Responses queued with [`ScriptedTransport::push_for`] are served to
/// requests whose path ends with the given suffix; everything else is
/// served from the shared FIFO. A response is picked when the request
/// arrives and delivered after yielding, so concurrent calls interleave.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    queue: RefCell<VecDeque<Scripted>>,
    by_path: RefCell<HashMap<String, VecDeque<Scripted>>>,
    requests: RefCell<Vec<HttpRequest>>,
    hook: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, status: u16, body: &str) {
        self.queue
            .borrow_mut()
            .push_back(Scripted::Respond(HttpResponse::new(status, body), 1));
    }

    /// Queue a response that takes `yields` scheduler turns to arrive.
    pub(crate) fn push_slow(&self, status: u16, body: &str, yields: u32) {
        self.queue
            .borrow_mut()
            .push_back(Scripted::Respond(HttpResponse::new(status, body), yields));
    }

    pub(crate) fn push_timeout(&self) {
        self.queue.borrow_mut().push_back(Scripted::Timeout);
    }

    pub(crate) fn push_for(&self, path: &str, status: u16, body: &str) {
        self.by_path
            .borrow_mut()
            .entry(path.to_string())
            .or_default()
            .push_back(Scripted::Respond(HttpResponse::new(status, body), 1));
    }

    /// Run `hook` when the next request arrives, before it is answered.
    pub(crate) fn on_next_dispatch(&self, hook: impl FnOnce() + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn count_for(&self, path: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| path_of(&request.url).ends_with(path))
            .count()
    }

    fn next_for(&self, url: &str) -> Option<Scripted> {
        let path = path_of(url);
        let routed = self
            .by_path
            .borrow_mut()
            .iter_mut()
            .find(|(suffix, queue)| path.ends_with(suffix.as_str()) && !queue.is_empty())
            .and_then(|(_, queue)| queue.pop_front());
        routed.or_else(|| self.queue.borrow_mut().pop_front())
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.requests.borrow_mut().push(request);
        let hook = self.hook.borrow_mut().take();
        if let Some(hook) = hook {
            hook();
        }
        let scripted = self.next_for(&url);
        match scripted {
            Some(Scripted::Respond(response, yields)) => {
                for _ in 0..yields {
                    tokio::task::yield_now().await;
                }
                Ok(response)
            }
            Some(Scripted::Timeout) => {
                tokio::task::yield_now().await;
                Err(TransportError::Timeout)
            }
            None => Err(TransportError::Other(format!("no scripted response for {url}"))),
        }
    }
}

fn path_of(url: &str) -> String {
    url::Url::parse(url).map_or_else(|_| url.to_string(), |parsed| parsed.path().to_string())
}

pub(crate) fn signed_in_store(access: &str, refresh: &str) -> Rc<CredentialStore> {
    let store = CredentialStore::in_memory();
    store.establish(TokenPair {
        access: access.to_string(),
        refresh: refresh.to_string(),
    });
    Rc::new(store)
}

pub(crate) fn item_json(id: u64) -> String {
    format!(
        r#"{{"id":{id},"traditional_chinese_title":"作品{id}","japanese_title":"作品{id}","status_japan":"ongoing"}}"#
    )
}

pub(crate) fn entry_json(entry_id: u64, item_id: u64) -> String {
    format!(
        r#"{{"id":{entry_id},"item":{item},"added_at":"2024-05-01T12:00:00Z"}}"#,
        item = item_json(item_id)
    )
}

pub(crate) fn collection_page(entries: &[(u64, u64)]) -> String {
    let results: Vec<String> = entries
        .iter()
        .map(|(entry_id, item_id)| entry_json(*entry_id, *item_id))
        .collect();
    format!(
        r#"{{"count":{},"next":null,"previous":null,"results":[{}]}}"#,
        entries.len(),
        results.join(",")
    )
}
