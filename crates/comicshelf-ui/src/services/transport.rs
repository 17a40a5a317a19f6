//! `gloo-net` transport with an abort-based timeout.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use comicshelf_client::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use gloo_net::http::{Method as BrowserMethod, Request};
use gloo_timers::callback::Timeout;
use web_sys::AbortController;

/// Browser `fetch` transport; aborts the request once `timeout` elapses.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlooTransport {
    timeout: Duration,
}

impl GlooTransport {
    pub(crate) const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let controller = AbortController::new()
            .map_err(|err| TransportError::Other(format!("abort controller: {err:?}")))?;
        let timed_out = Rc::new(Cell::new(false));
        let millis = u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX);
        // Dropping the handle cancels the timer, so it lives until the body is read.
        let _timer = {
            let controller = controller.clone();
            let timed_out = Rc::clone(&timed_out);
            Timeout::new(millis, move || {
                timed_out.set(true);
                controller.abort();
            })
        };

        let method = match request.method {
            Method::Get => BrowserMethod::GET,
            Method::Post => BrowserMethod::POST,
            Method::Delete => BrowserMethod::DELETE,
        };
        let signal = controller.signal();
        let mut builder = Request::new(&request.url)
            .method(method)
            .abort_signal(Some(&signal));
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(js_sys::Uint8Array::from(body.as_slice()));
        }

        let classify = |err: gloo_net::Error| {
            if timed_out.get() {
                TransportError::Timeout
            } else {
                TransportError::Connect(err.to_string())
            }
        };
        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.binary().await.map_err(classify)?;
        Ok(HttpResponse::new(status, body))
    }
}
