//! Chat turn orchestration.
//!
//! One turn: detect report intent, get the specialist response from the LLM
//! (canned fallback when it is down), persist the exchange, then run report
//! generation when the detector fired and fold the download links into the
//! reply. Report failures degrade the reply text instead of failing the
//! turn.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::analysis::AnalysisExtractor;
use crate::conversation::ConversationStore;
use crate::intent::{extract_formats, IntentDetector};
use crate::llm::TextGenerator;
use crate::report::{ReportManifest, ReportRequest, ReportStore};
use crate::specialist::{fallback_response, system_prompt};
use crate::types::{ChatMessage, MessageRole, SpecialistType};

const CONTEXT_WINDOW_MESSAGES: usize = 5;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatOutcome {
    pub conversation_id: String,
    pub response: String,
    pub report_generated: bool,
    pub report_downloads: Option<ReportManifest>,
    pub timestamp: String,
}

pub struct ChatService {
    conversations: ConversationStore,
    reports: ReportStore,
    generator: Arc<dyn TextGenerator>,
    extractor: AnalysisExtractor,
    detector: Box<dyn IntentDetector>,
}

impl ChatService {
    pub fn new(
        conversations: ConversationStore,
        reports: ReportStore,
        generator: Arc<dyn TextGenerator>,
        detector: Box<dyn IntentDetector>,
    ) -> Self {
        let extractor = AnalysisExtractor::new(generator.clone());
        Self {
            conversations,
            reports,
            generator,
            extractor,
            detector,
        }
    }

    pub fn reports(&self) -> &ReportStore {
        &self.reports
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub async fn process_message(
        &self,
        specialist: SpecialistType,
        user_message: &str,
        user_email: &str,
        user_name: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Result<ChatOutcome> {
        let decision = self.detector.detect(user_message);
        let conversation_id = conversation_id
            .map(str::to_string)
            .unwrap_or_else(ConversationStore::new_conversation_id);

        let mut conversation = self.conversations.load_or_create(
            &conversation_id,
            specialist,
            user_email,
            user_name,
        )?;

        let agent_response = self
            .agent_response(
                specialist,
                user_message,
                &conversation.messages,
                decision.is_report_request,
            )
            .await;

        conversation.push(ChatMessage::now(MessageRole::User, user_message));
        conversation.push(ChatMessage::now(
            MessageRole::Assistant,
            agent_response.as_str(),
        ));
        self.conversations.save(&conversation)?;

        let mut response = agent_response;
        let mut report_generated = false;
        let mut report_downloads = None;

        if decision.is_report_request {
            tracing::info!(
                specialist = specialist.as_wire(),
                conversation_id = %conversation_id,
                "Report request detected in chat turn"
            );

            let analysis = self
                .extractor
                .extract(specialist, &conversation.assistant_responses())
                .await;
            let formats = extract_formats(user_message);
            let customer_request = decision.context.as_deref().unwrap_or(user_message);

            match self.reports.generate(&ReportRequest {
                specialist,
                analysis: &analysis,
                messages: &conversation.messages,
                customer_request,
                user_email,
                user_name,
                formats: &formats,
            }) {
                Ok(outcome) => {
                    response.push_str("\n\n");
                    response.push_str(&report_message(&outcome.manifest));
                    report_generated = true;
                    report_downloads = Some(outcome.manifest);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Report generation failed");
                    response.push_str(&format!(
                        "\n\nI encountered an issue generating the report: {}. \
                         Please try again or contact support.",
                        e
                    ));
                }
            }
        }

        Ok(ChatOutcome {
            conversation_id,
            response,
            report_generated,
            report_downloads,
            timestamp: Utc::now().to_rfc3339(),
        })
    }

    /// Generate a report for an existing conversation outside a chat turn.
    /// Fails when the conversation is unknown.
    pub async fn generate_report_for_conversation(
        &self,
        conversation_id: &str,
        customer_request: &str,
        formats: &[crate::types::ReportFormat],
    ) -> Result<crate::report::GenerationOutcome> {
        let conversation = self.conversations.load(conversation_id)?;
        let analysis = self
            .extractor
            .extract(
                conversation.specialist_type,
                &conversation.assistant_responses(),
            )
            .await;

        self.reports.generate(&ReportRequest {
            specialist: conversation.specialist_type,
            analysis: &analysis,
            messages: &conversation.messages,
            customer_request,
            user_email: &conversation.user_email,
            user_name: conversation.user_name.as_deref(),
            formats,
        })
    }

    async fn agent_response(
        &self,
        specialist: SpecialistType,
        user_message: &str,
        history: &[ChatMessage],
        is_report_request: bool,
    ) -> String {
        let context = conversation_context(history);
        let prompt = if context.is_empty() {
            format!("User: {}\n\nAssistant:", user_message)
        } else {
            format!("{}\n\nUser: {}\n\nAssistant:", context, user_message)
        };

        let system = system_prompt(specialist, is_report_request);
        match self.generator.generate(&prompt, Some(&system)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    specialist = specialist.as_wire(),
                    error = %e,
                    "LLM unavailable, using canned specialist response"
                );
                fallback_response(specialist, is_report_request)
            }
        }
    }
}

/// Last few turns rendered as "Role: content" lines for the LLM prompt.
fn conversation_context(history: &[ChatMessage]) -> String {
    let start = history.len().saturating_sub(CONTEXT_WINDOW_MESSAGES);
    history[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.title(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// User-facing summary of a generated report with its download links.
fn report_message(manifest: &ReportManifest) -> String {
    let mut message = String::from(
        "**Report Generated Successfully**\n\n\
         I've created a comprehensive report based on our conversation. \
         Your report is available in the following formats:\n\n",
    );

    for (format, path) in &manifest.files {
        let filename = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        let link = manifest
            .download_links
            .get(format)
            .cloned()
            .unwrap_or_else(|| path.clone());
        message.push_str(&format!(
            "- **{}**: [{}]({})\n",
            format.to_uppercase(),
            filename,
            link
        ));
    }

    message.push_str(
        "\n**What's included in your report:**\n\
         - Executive summary of our consultation\n\
         - Detailed findings and analysis\n\
         - Risk assessment\n\
         - Recommendations and action items\n\
         - Next steps and follow-up plan\n\n\
         You can download the report in your preferred format using the links above.",
    );
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::RegexIntentDetector;
    use crate::llm::testing::ScriptedGenerator;
    use tempfile::TempDir;

    fn service(tmp: &TempDir, generator: ScriptedGenerator) -> ChatService {
        let conversations = ConversationStore::new(tmp.path().join("conversations")).unwrap();
        let reports =
            ReportStore::new(tmp.path().join("reports"), "/api/reports/download").unwrap();
        ChatService::new(
            conversations,
            reports,
            Arc::new(generator),
            Box::new(RegexIntentDetector),
        )
    }

    #[tokio::test]
    async fn plain_question_gets_response_without_report() {
        let tmp = TempDir::new().unwrap();
        let service = service(
            &tmp,
            ScriptedGenerator::new(vec![Ok("CUI is most likely under wet insulation.".into())]),
        );

        let outcome = service
            .process_message(
                SpecialistType::CorrosionEngineer,
                "Where does CUI usually start?",
                "jane.doe@example.com",
                None,
                None,
            )
            .await
            .unwrap();

        assert!(!outcome.report_generated);
        assert!(outcome.report_downloads.is_none());
        assert_eq!(outcome.response, "CUI is most likely under wet insulation.");

        let conversation = service.conversations().load(&outcome.conversation_id).unwrap();
        assert_eq!(conversation.message_count, 2);
        assert_eq!(conversation.messages[0].role, MessageRole::User);
        assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn llm_outage_uses_canned_response() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp, ScriptedGenerator::always_failing());

        let outcome = service
            .process_message(
                SpecialistType::SubseaEngineer,
                "How do I assess this flange?",
                "a@b.com",
                Some("A"),
                None,
            )
            .await
            .unwrap();

        assert!(!outcome.response.is_empty());
        assert!(!outcome.report_generated);
    }

    #[tokio::test]
    async fn report_request_generates_and_links_downloads() {
        let tmp = TempDir::new().unwrap();
        // First call answers the chat turn, second structures the analysis.
        let service = service(
            &tmp,
            ScriptedGenerator::new(vec![
                Ok("We identified severe pitting on the shell.".into()),
                Err("llm down".into()),
            ]),
        );

        let outcome = service
            .process_message(
                SpecialistType::CorrosionEngineer,
                "Please generate a report on the shell corrosion as pdf",
                "jane.doe@example.com",
                None,
                None,
            )
            .await
            .unwrap();

        assert!(outcome.report_generated);
        let manifest = outcome.report_downloads.unwrap();
        assert_eq!(manifest.files.len(), 1);
        assert!(manifest.files.contains_key("pdf"));
        assert!(outcome.response.contains("Report Generated Successfully"));
        assert!(outcome.response.contains("/api/reports/download/pdf/"));
    }

    #[tokio::test]
    async fn conversation_continues_under_same_id() {
        let tmp = TempDir::new().unwrap();
        let service = service(
            &tmp,
            ScriptedGenerator::new(vec![Ok("First answer.".into()), Ok("Second answer.".into())]),
        );

        let first = service
            .process_message(
                SpecialistType::MethodsSpecialist,
                "Question one",
                "a@b.com",
                None,
                None,
            )
            .await
            .unwrap();
        let second = service
            .process_message(
                SpecialistType::MethodsSpecialist,
                "Question two",
                "a@b.com",
                None,
                Some(&first.conversation_id),
            )
            .await
            .unwrap();

        assert_eq!(first.conversation_id, second.conversation_id);
        let conversation = service.conversations().load(&second.conversation_id).unwrap();
        assert_eq!(conversation.message_count, 4);
    }
}
