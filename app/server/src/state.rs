use std::sync::Arc;

use anyhow::Result;
use inspectra::vector::VectorStore;
use inspectra::{
    AppConfig, ChatService, ConversationStore, EvaluationService, HttpTextGenerator,
    RegexIntentDetector, ReportStore,
};

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
    pub evaluations: Arc<EvaluationService>,
    pub vectors: Arc<VectorStore>,
    pub list_limit: usize,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let conversations = ConversationStore::new(config.conversations_dir())?;
        let reports = ReportStore::new(config.reports_dir(), config.reports.download_base.clone())?;
        let evaluations = EvaluationService::new(config.evaluations_dir())?;
        let generator = Arc::new(HttpTextGenerator::new(&config.llm)?);
        let chat = ChatService::new(
            conversations,
            reports,
            generator,
            Box::new(RegexIntentDetector),
        );

        Ok(Self {
            chat: Arc::new(chat),
            evaluations: Arc::new(evaluations),
            vectors: Arc::new(VectorStore::new()),
            list_limit: config.reports.list_limit,
        })
    }
}
