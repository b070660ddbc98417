//! Postal-code (CEP) lookup against a ViaCEP-compatible endpoint.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use configs::AddressLookupConfig;

use crate::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

#[async_trait]
pub trait AddressProvider: Send + Sync {
    async fn lookup(&self, postal_code: &str) -> Result<Address, ServiceError>;
}

/// Strip punctuation and require exactly eight digits (`01310-100` → `01310100`).
pub fn normalize_postal_code(raw: &str) -> Result<String, ServiceError> {
    let digits: String = raw.chars().filter(|c| !matches!(c, '-' | '.' | ' ')).collect();
    if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::Validation(format!("invalid postal code: {raw}")));
    }
    Ok(digits)
}

#[derive(Debug, Deserialize)]
struct ViaCepBody {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
}

impl ViaCepBody {
    /// ViaCEP answers 200 with `{"erro": true}` (or `"true"`) for unknown codes.
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }
}

pub struct ViaCepClient {
    http: reqwest::Client,
    base_url: String,
    cache: Cache<String, Address>,
}

impl ViaCepClient {
    pub fn new(cfg: &AddressLookupConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        let cache = Cache::builder()
            .max_capacity(cfg.cache_capacity)
            .time_to_live(Duration::from_secs(cfg.cache_ttl_secs))
            .build();
        Ok(Self { http, base_url: cfg.base_url.trim_end_matches('/').to_string(), cache })
    }

    async fn fetch(&self, cep: &str) -> Result<Address, ServiceError> {
        let url = format!("{}/{}/json/", self.base_url, cep);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(format!("address lookup: {e}")))?;
        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(ServiceError::Validation(format!("invalid postal code: {cep}")));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| ServiceError::Upstream(format!("address lookup: {e}")))?;
        let body: ViaCepBody = resp
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("address lookup: {e}")))?;
        if body.is_error() {
            return Err(ServiceError::not_found("postal code"));
        }
        Ok(Address {
            postal_code: if body.cep.is_empty() { cep.to_string() } else { body.cep.replace('-', "") },
            street: body.logradouro,
            neighborhood: body.bairro,
            city: body.localidade,
            state: body.uf,
        })
    }
}

#[async_trait]
impl AddressProvider for ViaCepClient {
    #[instrument(skip(self))]
    async fn lookup(&self, postal_code: &str) -> Result<Address, ServiceError> {
        let cep = normalize_postal_code(postal_code)?;
        if let Some(hit) = self.cache.get(&cep).await {
            debug!(cep = %cep, "address cache hit");
            return Ok(hit);
        }
        match self.fetch(&cep).await {
            Ok(addr) => {
                self.cache.insert(cep, addr.clone()).await;
                Ok(addr)
            }
            Err(e) => {
                if matches!(e, ServiceError::Upstream(_)) {
                    warn!(cep = %cep, error = %e, "address provider unavailable");
                }
                Err(e)
            }
        }
    }
}

/// Fixed address book for tests and offline demo mode.
#[derive(Default)]
pub struct StaticAddressProvider {
    entries: HashMap<String, Address>,
}

impl StaticAddressProvider {
    pub fn with(mut self, addr: Address) -> Self {
        self.entries.insert(addr.postal_code.clone(), addr);
        self
    }
}

#[async_trait]
impl AddressProvider for StaticAddressProvider {
    async fn lookup(&self, postal_code: &str) -> Result<Address, ServiceError> {
        let cep = normalize_postal_code(postal_code)?;
        self.entries.get(&cep).cloned().ok_or_else(|| ServiceError::not_found("postal code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_eight_digits() {
        assert_eq!(normalize_postal_code("01310-100").unwrap(), "01310100");
        assert_eq!(normalize_postal_code(" 13.083-970 ").unwrap(), "13083970");
        assert!(normalize_postal_code("1310-100").is_err());
        assert!(normalize_postal_code("0131O100").is_err());
    }

    #[test]
    fn viacep_error_flag_variants() {
        let b: ViaCepBody = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert!(b.is_error());
        let b: ViaCepBody = serde_json::from_str(r#"{"erro": "true"}"#).unwrap();
        assert!(b.is_error());
        let b: ViaCepBody = serde_json::from_str(
            r#"{"cep":"01310-100","logradouro":"Avenida Paulista","bairro":"Bela Vista","localidade":"São Paulo","uf":"SP"}"#,
        )
        .unwrap();
        assert!(!b.is_error());
        assert_eq!(b.localidade, "São Paulo");
    }

    #[tokio::test]
    async fn static_provider_normalizes_input() {
        let p = StaticAddressProvider::default().with(Address {
            postal_code: "01310100".into(),
            street: "Avenida Paulista".into(),
            neighborhood: "Bela Vista".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
        });
        assert_eq!(p.lookup("01310-100").await.unwrap().state, "SP");
        assert!(matches!(p.lookup("99999-999").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(p.lookup("abc").await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn unreachable_provider_is_upstream_error() {
        let client = ViaCepClient::new(&AddressLookupConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 1,
            cache_ttl_secs: 60,
            cache_capacity: 10,
        })
        .unwrap();
        assert!(matches!(client.lookup("01310100").await, Err(ServiceError::Upstream(_))));
    }
}
