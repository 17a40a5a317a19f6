//! Command handlers grouped by concern.

pub(crate) mod auth;
pub(crate) mod collection;
pub(crate) mod items;

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;
    use std::time::Duration;

    use comicshelf_api_models::TokenPair;
    use comicshelf_client::CredentialStore;
    use httpmock::MockServer;
    use serde_json::{Value, json};

    use crate::client::{AppContext, ClientSettings};

    pub(crate) fn settings_for(server: &MockServer) -> ClientSettings {
        ClientSettings {
            api_url: server.url("/api"),
            timeout: Duration::from_secs(5),
            session_file: None,
        }
    }

    pub(crate) fn anonymous_context(server: &MockServer) -> (AppContext, Rc<CredentialStore>) {
        let store = Rc::new(CredentialStore::in_memory());
        let ctx = AppContext::with_credentials(&settings_for(server), Rc::clone(&store))
            .expect("context");
        (ctx, store)
    }

    pub(crate) fn signed_in_context(server: &MockServer) -> (AppContext, Rc<CredentialStore>) {
        let (ctx, store) = anonymous_context(server);
        store.establish(TokenPair {
            access: "access-1".to_string(),
            refresh: "refresh-1".to_string(),
        });
        (ctx, store)
    }

    pub(crate) fn item_json(id: u64) -> Value {
        json!({
            "id": id,
            "traditional_chinese_title": format!("作品 {id}"),
            "japanese_title": format!("作品 {id} (JP)"),
            "status_japan": "completed",
            "first_published_year": 2015
        })
    }

    pub(crate) fn collection_json(entries: &[(u64, u64)]) -> Value {
        let results: Vec<Value> = entries
            .iter()
            .map(|(entry, item)| {
                json!({"id": entry, "item": item_json(*item), "added_at": "2025-03-01T10:00:00Z"})
            })
            .collect();
        json!({"count": results.len(), "next": null, "previous": null, "results": results})
    }
}
