//! Reference agent: a single chat completion over the whole context

use async_trait::async_trait;

use super::types::{Agent, AgentContext};
use crate::llm::{ChatClient, Message};

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that answers questions \
using only the information in the provided document. Quote the relevant facts \
precisely and answer concisely.";

/// Answers by sending the full haystack to the configured model
pub struct BaselineAgent {
    client: ChatClient,
}

impl BaselineAgent {
    pub fn new(ctx: &AgentContext) -> anyhow::Result<Self> {
        let client = ChatClient::new(
            ctx.credentials.base_url.clone(),
            ctx.credentials.api_key.clone(),
            ctx.models.agent_model.clone(),
        )?
        .with_temperature(0.0)
        .with_max_tokens(300);

        Ok(Self { client })
    }

    fn prompt(context: &str, question: &str) -> Vec<Message> {
        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "<document>\n{}\n</document>\n\n{}\nDon't give information outside the document or repeat your findings.",
                context, question
            )),
        ]
    }
}

#[async_trait]
impl Agent for BaselineAgent {
    async fn respond(&self, context: &str, question: &str) -> anyhow::Result<String> {
        let answer = self.client.complete(&Self::prompt(context, question)).await?;
        Ok(answer)
    }
}

/// Registry entry point
pub fn build(ctx: &AgentContext) -> anyhow::Result<Box<dyn Agent>> {
    Ok(Box::new(BaselineAgent::new(ctx)?))
}
