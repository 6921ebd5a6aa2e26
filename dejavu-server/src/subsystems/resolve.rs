//! Answer resolution — reuse a stored answer or generate a fresh one.
//!
//! With duplicates present, the earliest-created match wins and its stored
//! answer is reused. Without duplicates, the text-generation collaborator is
//! invoked; a generation failure is recovered locally with a visible
//! placeholder answer and is never propagated as a crash.

use dejavu_core::models::StoredQuestion;
use dejavu_core::AnswerGenerator;

/// Placeholder persisted when the generation collaborator fails.
pub const GENERATION_FAILED_ANSWER: &str = "An error occurred while generating the answer.";

/// Placeholder when the matching stored question has no recorded answer.
pub const NO_STORED_ANSWER: &str = "No answer was recorded for the matching question.";

/// Resolve the answer for a new question given the scan result.
///
/// Returns `(answer, is_duplicate)`.
pub async fn resolve(
    question: &str,
    duplicates: &[StoredQuestion],
    generator: &dyn AnswerGenerator,
    max_tokens: u32,
) -> (String, bool) {
    if let Some(first) = duplicates.first() {
        let answer = first
            .answer
            .clone()
            .unwrap_or_else(|| NO_STORED_ANSWER.to_string());
        return (answer, true);
    }

    match generator.generate(question, max_tokens).await {
        Ok(answer) => (answer, false),
        Err(e) => {
            tracing::warn!(error = %e, "Answer generation failed — substituting placeholder");
            (GENERATION_FAILED_ANSWER.to_string(), false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use dejavu_core::GenerationError;
    use uuid::Uuid;

    struct StaticGenerator(&'static str);

    #[async_trait]
    impl AnswerGenerator for StaticGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _max_tokens: u32,
        ) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl AnswerGenerator for FailingGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _max_tokens: u32,
        ) -> Result<String, GenerationError> {
            Err(GenerationError::Api {
                code: 500,
                message: "upstream exploded".to_string(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn question(text: &str, answer: Option<&str>) -> StoredQuestion {
        StoredQuestion {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            question_text: text.to_string(),
            is_duplicate: false,
            answer: answer.map(|a| a.to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_first_duplicate_answer_wins() {
        let duplicates = vec![
            question("q1", Some("X")),
            question("q2", Some("Z")),
        ];

        let (answer, is_duplicate) =
            resolve("new question", &duplicates, &StaticGenerator("unused"), 150).await;

        assert_eq!(answer, "X");
        assert!(is_duplicate);
    }

    #[tokio::test]
    async fn test_no_duplicates_invokes_generator() {
        let (answer, is_duplicate) = resolve("new question", &[], &StaticGenerator("Y"), 150).await;

        assert_eq!(answer, "Y");
        assert!(!is_duplicate);
    }

    #[tokio::test]
    async fn test_generation_failure_yields_placeholder_not_crash() {
        let (answer, is_duplicate) = resolve("new question", &[], &FailingGenerator, 150).await;

        assert_eq!(answer, GENERATION_FAILED_ANSWER);
        assert!(!is_duplicate);
    }

    #[tokio::test]
    async fn test_duplicate_without_stored_answer_uses_placeholder() {
        let duplicates = vec![question("q1", None)];

        let (answer, is_duplicate) =
            resolve("new question", &duplicates, &StaticGenerator("unused"), 150).await;

        assert_eq!(answer, NO_STORED_ANSWER);
        assert!(is_duplicate);
    }
}
