use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, Settings};
use crate::llm::openai::OpenAiCompatProvider;
use crate::llm::provider::LanguageModel;
use crate::qa::pipeline::QaPipeline;
use crate::store::documents::DocumentStore;
use crate::store::history::HistoryStore;

#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub documents: DocumentStore,
    pub history: HistoryStore,
    pub pipeline: QaPipeline,
    #[allow(dead_code)]
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths);

        let documents = DocumentStore::new(&paths).await?;
        let history = HistoryStore::new(&paths).await?;

        let llm: Arc<dyn LanguageModel> =
            Arc::new(OpenAiCompatProvider::from_settings(&settings.model)?);
        let pipeline = QaPipeline::new(documents.clone(), history.clone(), llm, &settings);

        let started_at = Utc::now();

        Ok(Arc::new(AppState {
            paths,
            settings,
            documents,
            history,
            pipeline,
            started_at,
        }))
    }
}
