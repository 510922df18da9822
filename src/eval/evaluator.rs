//! LLM-as-judge grading of agent answers

use async_trait::async_trait;

use super::harness::Evaluator;
use crate::agents::AgentContext;
use crate::llm::{ChatClient, Message};

const GRADER_PROMPT: &str = "You are grading an answer to a retrieval question. \
Compare the response with the reference and rate it from 1 to 10, where 10 \
means every fact of the reference is present and correct, 5 means roughly half \
of the facts are present, and 1 means the response is unrelated or wrong. \
Reply with the integer score only.";

/// Asks a chat model to grade each response
pub struct LlmEvaluator {
    client: ChatClient,
}

impl LlmEvaluator {
    pub fn new(ctx: &AgentContext) -> anyhow::Result<Self> {
        let client = ChatClient::new(
            ctx.credentials.base_url.clone(),
            ctx.credentials.api_key.clone(),
            ctx.models.evaluator_model.clone(),
        )?
        .with_temperature(0.0)
        .with_max_tokens(8);

        Ok(Self { client })
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn score(&self, question: &str, reference: &str, response: &str) -> anyhow::Result<f64> {
        let messages = vec![
            Message::system(GRADER_PROMPT),
            Message::user(format!(
                "Question: {}\n\nReference: {}\n\nResponse: {}",
                question, reference, response
            )),
        ];

        let reply = self.client.complete(&messages).await?;
        parse_score(&reply)
            .ok_or_else(|| anyhow::anyhow!("Evaluator returned no score: {:?}", reply))
    }
}

/// Default evaluator factory
pub fn build(ctx: &AgentContext) -> anyhow::Result<Box<dyn Evaluator>> {
    Ok(Box::new(LlmEvaluator::new(ctx)?))
}

/// First number in the reply, clamped to 0..=10
pub fn parse_score(reply: &str) -> Option<f64> {
    let start = reply.find(|c: char| c.is_ascii_digit())?;
    let number: String = reply[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    number
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .map(|score| score.clamp(0.0, 10.0))
}
