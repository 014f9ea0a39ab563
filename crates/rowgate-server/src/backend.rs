//! Spreadsheet backend construction at process start.

use std::sync::Arc;

use rowgate_sheets::{
    GoogleSheetsStore, InMemorySheetStore, ServiceAccountKey, SheetStore, SheetsError,
    UnavailableStore,
};

use crate::config::{SheetsBackend, SheetsConfig};

/// Builds the configured store, failing on any credential or setup problem.
pub fn build_store(cfg: &SheetsConfig) -> Result<Arc<dyn SheetStore>, SheetsError> {
    match cfg.backend {
        SheetsBackend::Memory => {
            let sheets = std::iter::once(cfg.default_sheet.clone())
                .chain(cfg.memory_sheets.iter().cloned());
            Ok(Arc::new(InMemorySheetStore::with_sheets(sheets)))
        }
        SheetsBackend::Google => {
            let key = load_key(cfg)?;
            let spreadsheet_id = cfg.spreadsheet_id.clone().unwrap_or_default();
            let store = GoogleSheetsStore::builder(spreadsheet_id, key)
                .base_url(cfg.api_base_url.clone())
                .timeout(cfg.request_timeout())
                .build()?;
            Ok(Arc::new(store))
        }
    }
}

/// Builds the store, applying `require_credentials` on failure.
///
/// With `require_credentials = false` a failed backend is replaced by an
/// [`UnavailableStore`] so the server still starts and every row operation
/// reports the startup failure.
pub fn init_store(cfg: &SheetsConfig) -> Result<Arc<dyn SheetStore>, SheetsError> {
    match build_store(cfg) {
        Ok(store) => {
            tracing::info!(
                backend = store.backend_name(),
                default_sheet = %cfg.default_sheet,
                "Spreadsheet backend initialized"
            );
            Ok(store)
        }
        Err(e) if cfg.require_credentials => {
            tracing::error!(error = %e, "Spreadsheet backend initialization failed");
            Err(e)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                "Spreadsheet backend initialization failed, row operations will be rejected"
            );
            Ok(Arc::new(UnavailableStore::new(e.to_string())))
        }
    }
}

fn load_key(cfg: &SheetsConfig) -> Result<ServiceAccountKey, SheetsError> {
    if let Some(json) = cfg
        .credentials_json
        .as_deref()
        .filter(|json| !json.trim().is_empty())
    {
        return ServiceAccountKey::from_json(json);
    }
    if let Some(path) = cfg.credentials_file.as_ref() {
        return ServiceAccountKey::from_file(path);
    }
    Err(SheetsError::credentials(
        "no service account key configured (set GOOGLE_CREDENTIALS or GOOGLE_APPLICATION_CREDENTIALS)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google_without_key() -> SheetsConfig {
        SheetsConfig {
            spreadsheet_id: Some("sheet-123".into()),
            ..SheetsConfig::default()
        }
    }

    #[test]
    fn missing_key_fails_when_required() {
        let err = init_store(&google_without_key()).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_CREDENTIALS"));
    }

    #[test]
    fn missing_key_degrades_when_not_required() {
        let cfg = SheetsConfig {
            require_credentials: false,
            ..google_without_key()
        };
        let store = init_store(&cfg).unwrap();
        assert_eq!(store.backend_name(), "unavailable");
        assert!(!store.is_available());
    }

    #[test]
    fn malformed_inline_key_is_reported() {
        let cfg = SheetsConfig {
            credentials_json: Some("{\"type\": \"service_account\"".into()),
            ..google_without_key()
        };
        let err = build_store(&cfg).unwrap_err();
        assert!(matches!(err, SheetsError::Credentials { .. }));
    }

    #[tokio::test]
    async fn memory_backend_creates_configured_sheets() {
        let cfg = SheetsConfig {
            backend: SheetsBackend::Memory,
            memory_sheets: vec!["Leads".into()],
            ..SheetsConfig::default()
        };
        let store = build_store(&cfg).unwrap();
        assert_eq!(store.backend_name(), "memory");

        let range = rowgate_sheets::A1Range::open_rows(
            "Leads",
            1,
            rowgate_sheets::Column::A,
            rowgate_sheets::Column::Z,
        )
        .unwrap();
        assert!(store.read_rows(&range).await.unwrap().is_empty());
    }
}
