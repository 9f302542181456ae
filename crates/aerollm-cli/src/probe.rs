//! Endpoint discovery.
//!
//! Pings `GET {base_url}/models` on the configured OpenAI-compatible
//! endpoint and, if it answers, lists the model ids it serves.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Raw shape of the `/models` JSON response.
#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

/// Ask the endpoint which models it serves.
///
/// Returns `Err(reason)` when the endpoint is offline, rejects the
/// credential, or answers with something other than a model list.
pub fn fetch_models(base_url: &str, api_key: Option<&str>) -> Result<Vec<String>, String> {
    let url = format!("{}/models", base_url.trim_end_matches('/'));
    let client = reqwest::blocking::Client::new();
    let mut request = client.get(&url);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }
    let response = request
        .send()
        .map_err(|e| format!("endpoint unreachable at {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("endpoint returned HTTP {}", response.status()));
    }

    let body = response
        .text()
        .map_err(|e| format!("failed to read model list: {}", e))?;
    parse_model_list(&body)
}

fn parse_model_list(body: &str) -> Result<Vec<String>, String> {
    let list: ModelList =
        serde_json::from_str(body).map_err(|e| format!("failed to parse model list: {}", e))?;
    Ok(list.data.into_iter().map(|m| m.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_openai_model_list() {
        let body = r#"{"object":"list","data":[{"id":"llama3","object":"model","owned_by":"library"},{"id":"mistral","object":"model"}]}"#;
        assert_eq!(parse_model_list(body).unwrap(), vec!["llama3", "mistral"]);
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_model_list(r#"{"models":[{"name":"llama3"}]}"#).is_err());
        assert!(parse_model_list("<html>").is_err());
    }

    #[test]
    fn unreachable_endpoint_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let err = fetch_models(&format!("http://{addr}/v1"), None).unwrap_err();
        assert!(err.contains("unreachable"));
    }
}
