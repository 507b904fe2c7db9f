use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{Credentials, DailyRecord, Event, Symptom, SymptomOrder, SymptomRecord, User};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Sucesso!";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend has no valid session for us
    #[error("Sessão expirada ou inexistente, faça login novamente")]
    Unauthorized,

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Erro ao tentar {action}: resposta inválida do servidor")]
    InvalidBody {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Falha de comunicação com o servidor: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endereço do servidor inválido: {0}")]
    InvalidUrl(String),

    #[error("Falha ao gravar a sessão: {0}")]
    Session(#[from] std::io::Error),
}

/// Successful response: the `data` payload and the user-facing message
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub data: Value,
    pub message: String,
}

impl Envelope {
    pub fn into_data<T: DeserializeOwned>(self, action: &str) -> Result<T, ApiError> {
        serde_json::from_value(self.data).map_err(|source| ApiError::InvalidBody {
            action: action.to_string(),
            source,
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Interpret a backend response.
///
/// 200 yields `data` when it is truthy (the whole body otherwise) and
/// `message`, defaulting to "Sucesso!". 401 is always `Unauthorized`, even
/// with an unreadable body. Other statuses carry the body's `error` or
/// "Erro ao tentar {action}".
pub fn parse_envelope(status: u16, body: &str, action: &str) -> Result<Envelope, ApiError> {
    if status == StatusCode::UNAUTHORIZED.as_u16() {
        return Err(ApiError::Unauthorized);
    }

    let json: Value = serde_json::from_str(body).map_err(|source| ApiError::InvalidBody {
        action: action.to_string(),
        source,
    })?;

    if status == StatusCode::OK.as_u16() {
        let message = json
            .get("message")
            .filter(|m| is_truthy(m))
            .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
            .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
        let data = match json.get("data") {
            Some(data) if is_truthy(data) => data.clone(),
            _ => json,
        };
        return Ok(Envelope { data, message });
    }

    let message = json
        .get("error")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Erro ao tentar {}", action));
    Err(ApiError::Status { status, message })
}

/// Body of `/update-symptom-order`
pub fn symptom_order_body(order: &[SymptomOrder]) -> Value {
    json!({ "symptoms_order": order })
}

/// Blocking client for the symptom-tracking backend.
///
/// Authentication is cookie based; when a session file is configured the
/// cookies for the base URL are written there after login and restored on
/// construction.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    url: Url,
    client: Client,
    jar: Arc<Jar>,
    session_file: Option<PathBuf>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::build(base_url, None)
    }

    pub fn with_session_file(base_url: &str, session_file: PathBuf) -> Result<Self, ApiError> {
        Self::build(base_url, Some(session_file))
    }

    fn build(base_url: &str, session_file: Option<PathBuf>) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = Url::parse(&base_url).map_err(|_| ApiError::InvalidUrl(base_url.clone()))?;
        let jar = Arc::new(Jar::default());

        if let Some(path) = &session_file {
            if let Ok(stored) = fs::read_to_string(path) {
                let restored = restore_cookies(&jar, &url, &stored);
                debug!(target: "api", "Restored {} session cookies from {}", restored, path.display());
            }
        }

        let client = Client::builder().cookie_provider(jar.clone()).build()?;

        Ok(Self {
            base_url,
            url,
            client,
            jar,
            session_file,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cookie header currently sent to the backend, if any
    pub fn session_cookies(&self) -> Option<String> {
        self.jar
            .cookies(&self.url)
            .and_then(|header| header.to_str().ok().map(str::to_string))
    }

    fn save_session(&self) -> Result<(), ApiError> {
        let Some(path) = &self.session_file else {
            return Ok(());
        };
        match self.session_cookies() {
            Some(cookies) => fs::write(path, cookies)?,
            None => debug!(target: "api", "No cookies to persist"),
        }
        Ok(())
    }

    fn clear_session(&self) -> Result<(), ApiError> {
        if let Some(path) = &self.session_file {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        action: &str,
    ) -> Result<Envelope, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        info!(target: "api", "{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;

        let result = parse_envelope(status, &text, action);
        if let Err(e) = &result {
            warn!(target: "api", "{} failed: {}", path, e);
        }
        result
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, "buscar dados")?
            .into_data("buscar dados")
    }

    fn send_message(&self, method: Method, path: &str, body: Option<&Value>) -> Result<String, ApiError> {
        let action = if method == Method::POST {
            "inserir dados"
        } else if method == Method::PUT {
            "editar dados"
        } else if method == Method::DELETE {
            "excluir dados"
        } else {
            "manipular dados"
        };
        Ok(self.request(method, path, body, action)?.message)
    }

    // Session

    pub fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let body = json!(credentials);
        let envelope = self.request(Method::POST, "/login", Some(&body), "fazer login")?;
        self.save_session()?;
        Ok(envelope.message)
    }

    pub fn logout(&self) -> Result<String, ApiError> {
        let message = self.request(Method::POST, "/logout", None, "deslogar")?.message;
        self.clear_session()?;
        Ok(message)
    }

    /// `Ok(false)` when the backend rejects the session
    pub fn auth_status(&self) -> Result<bool, ApiError> {
        match self.request(Method::GET, "/auth/status", None, "verificar sessão") {
            Ok(_) => Ok(true),
            Err(ApiError::Unauthorized) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // User

    pub fn get_user(&self) -> Result<User, ApiError> {
        self.get("/get-user")
    }

    pub fn add_user(&self, user: &Value) -> Result<String, ApiError> {
        self.send_message(Method::POST, "/add-user", Some(user))
    }

    pub fn update_user(&self, user: &Value) -> Result<String, ApiError> {
        self.send_message(Method::PUT, "/update-user", Some(user))
    }

    // Symptoms

    pub fn get_symptoms(&self) -> Result<Vec<Symptom>, ApiError> {
        self.get("/get-symptoms")
    }

    pub fn add_symptom(&self, symptom: &Value) -> Result<String, ApiError> {
        self.send_message(Method::POST, "/add-symptom", Some(symptom))
    }

    pub fn update_symptom(&self, id: i64, symptom: &Value) -> Result<String, ApiError> {
        self.send_message(Method::PUT, &format!("/update-symptom/{}", id), Some(symptom))
    }

    pub fn delete_symptom(&self, id: i64) -> Result<String, ApiError> {
        self.send_message(Method::DELETE, &format!("/delete-symptom/{}", id), None)
    }

    pub fn update_symptom_order(&self, order: &[SymptomOrder]) -> Result<String, ApiError> {
        let body = symptom_order_body(order);
        self.send_message(Method::PUT, "/update-symptom-order", Some(&body))
    }

    // Records

    pub fn get_records(&self) -> Result<Vec<DailyRecord>, ApiError> {
        self.get("/get-records")
    }

    pub fn get_records_by_symptom(&self, symptom_id: i64) -> Result<Vec<SymptomRecord>, ApiError> {
        self.get(&format!("/get-records-by-symptom/{}", symptom_id))
    }

    pub fn add_record(&self, record: &Value) -> Result<String, ApiError> {
        self.send_message(Method::POST, "/add-record", Some(record))
    }

    pub fn add_batch_records(&self, batch: &Value) -> Result<String, ApiError> {
        self.send_message(Method::POST, "/add-batch-records", Some(batch))
    }

    pub fn update_record(&self, id: i64, record: &Value) -> Result<String, ApiError> {
        self.send_message(Method::PUT, &format!("/update-record/{}", id), Some(record))
    }

    pub fn delete_record(&self, id: i64) -> Result<String, ApiError> {
        self.send_message(Method::DELETE, &format!("/delete-record/{}", id), None)
    }

    /// `date` is `yyyy-mm-dd`
    pub fn delete_records_date(&self, date: &str) -> Result<String, ApiError> {
        self.send_message(Method::DELETE, &format!("/delete-records-date/{}", date), None)
    }

    // Events

    pub fn get_events(&self) -> Result<Vec<Event>, ApiError> {
        self.get("/get-events")
    }

    pub fn add_event(&self, event: &Value) -> Result<String, ApiError> {
        self.send_message(Method::POST, "/add-event", Some(event))
    }

    pub fn update_event(&self, id: i64, event: &Value) -> Result<String, ApiError> {
        self.send_message(Method::PUT, &format!("/update-event/{}", id), Some(event))
    }

    pub fn delete_event(&self, id: i64) -> Result<String, ApiError> {
        self.send_message(Method::DELETE, &format!("/delete-event/{}", id), None)
    }
}

/// Feed a stored `Cookie` header ("a=1; b=2") back into the jar
fn restore_cookies(jar: &Jar, url: &Url, stored: &str) -> usize {
    let mut restored = 0;
    for pair in stored.split(';').map(str::trim).filter(|p| p.contains('=')) {
        jar.add_cookie_str(pair, url);
        restored += 1;
    }
    restored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_uses_data_and_message() {
        let env = parse_envelope(200, r#"{"data": [1, 2], "message": "Registro inserido"}"#, "buscar dados")
            .unwrap();
        assert_eq!(env.data, json!([1, 2]));
        assert_eq!(env.message, "Registro inserido");
    }

    #[test]
    fn test_ok_without_data_returns_body() {
        let env = parse_envelope(200, r#"{"id": 7}"#, "buscar dados").unwrap();
        assert_eq!(env.data, json!({"id": 7}));
        assert_eq!(env.message, DEFAULT_SUCCESS_MESSAGE);

        // An empty array is still data
        let env = parse_envelope(200, r#"{"data": []}"#, "buscar dados").unwrap();
        assert_eq!(env.data, json!([]));

        // ...but null or 0 is not
        let env = parse_envelope(200, r#"{"data": null, "ok": true}"#, "buscar dados").unwrap();
        assert_eq!(env.data, json!({"data": null, "ok": true}));
    }

    #[test]
    fn test_unauthorized() {
        assert!(matches!(
            parse_envelope(401, "not json", "buscar dados"),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_error_status_messages() {
        match parse_envelope(400, r#"{"error": "Sintoma já existe"}"#, "inserir dados") {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Sintoma já existe");
            }
            other => panic!("unexpected {:?}", other),
        }
        match parse_envelope(500, "{}", "excluir dados") {
            Err(ApiError::Status { message, .. }) => assert_eq!(message, "Erro ao tentar excluir dados"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_body() {
        let err = parse_envelope(200, "<html>", "buscar dados").unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody { .. }));
        assert_eq!(err.to_string(), "Erro ao tentar buscar dados: resposta inválida do servidor");
    }

    #[test]
    fn test_into_data_typed() {
        let env = parse_envelope(200, r#"{"data": [{"id": 1, "name": "fadiga"}]}"#, "buscar dados").unwrap();
        let symptoms: Vec<Symptom> = env.into_data("buscar dados").unwrap();
        assert_eq!(symptoms[0].name, "fadiga");
    }

    #[test]
    fn test_session_restored_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        fs::write(&path, "connect.sid=abc123; theme=dark").unwrap();

        let client = ApiClient::with_session_file("http://localhost:3000/", path).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        let cookies = client.session_cookies().unwrap();
        assert!(cookies.contains("connect.sid=abc123"));
        assert!(cookies.contains("theme=dark"));
    }

    #[test]
    fn test_symptom_order_body() {
        let order = vec![
            SymptomOrder {
                id: "2".to_string(),
                order: "1".to_string(),
            },
            SymptomOrder {
                id: "1".to_string(),
                order: "2".to_string(),
            },
        ];
        assert_eq!(
            symptom_order_body(&order),
            json!({"symptoms_order": [{"id": "2", "order": "1"}, {"id": "1", "order": "2"}]})
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiError::InvalidUrl(_))));
    }
}
