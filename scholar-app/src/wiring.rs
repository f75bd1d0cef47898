use anyhow::Result;
use scholar_common::{QuestionCount, StudyPreferences};
use scholar_config::ScholarConfig;
use scholar_llm::generator_from_config;
use scholar_study::{SessionState, StudyDesk};
use scholar_web::{PaperSearch, SerpApiScholar, WebFetcher};
use std::{sync::Arc, time::Duration};

/// Build the desk from config. Services without a credential are left out;
/// the desk reports that to the user when they are needed.
pub fn build_desk(cfg: &ScholarConfig) -> Result<StudyDesk> {
    let search: Option<Arc<dyn PaperSearch>> = match cfg.search_api_key() {
        Some(key) => Some(Arc::new(SerpApiScholar::new(
            &cfg.search.endpoint,
            key.to_string(),
            cfg.search.engine.clone(),
        )?)),
        None => {
            tracing::warn!("search.credentials.missing");
            None
        }
    };

    let fetcher = WebFetcher::new(
        Duration::from_secs(cfg.fetch.timeout_secs),
        cfg.fetch.user_agent.clone(),
    )?;
    let generator = generator_from_config(cfg)?;

    tracing::info!(
        search = search.is_some(),
        generator = generator.is_some(),
        summary_model = %cfg.llm.summary_model,
        study_model = %cfg.llm.study_model,
        "app.wired"
    );
    Ok(StudyDesk::new(search, Arc::new(fetcher), generator))
}

pub fn initial_session(cfg: &ScholarConfig, topic: Option<String>) -> Result<SessionState> {
    let preferences = StudyPreferences {
        question_count: QuestionCount::new(cfg.study.default_question_count)?,
        ..StudyPreferences::default()
    };
    let topic = topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| cfg.study.default_topic.clone());
    Ok(SessionState::new(topic, preferences))
}
