use chrono::Utc;

use crate::analytics::{FeedbackEntry, Rating};
use crate::assistant::Confidence;
use crate::state::Context;

/// Rate an answer you received
#[poise::command(slash_command)]
pub async fn feedback(
    ctx: Context<'_>,
    #[description = "Was the answer helpful?"] rating: Rating,
    #[description = "The question you asked"] question: String,
    #[description = "The answer you got (optional)"] answer: Option<String>,
    #[description = "Confidence shown with the answer"] confidence: Option<ConfidenceChoice>,
) -> Result<(), anyhow::Error> {
    let entry = FeedbackEntry {
        message_id: ctx.id().to_string(),
        conversation_id: ctx.channel_id().to_string(),
        question,
        answer: answer.unwrap_or_default(),
        feedback: rating,
        confidence: confidence.map(Confidence::from).unwrap_or(Confidence::High),
        timestamp: Utc::now(),
    };
    ctx.data().analytics.lock().await.log_feedback(entry);

    let reply = match rating {
        Rating::Positive => "Thanks, glad it helped.",
        Rating::Negative => "Thanks, this question will be reviewed.",
    };
    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ConfidenceChoice {
    #[name = "high"]
    High,
    #[name = "low"]
    Low,
}

impl From<ConfidenceChoice> for Confidence {
    fn from(c: ConfidenceChoice) -> Self {
        match c {
            ConfidenceChoice::High => Confidence::High,
            ConfidenceChoice::Low => Confidence::Low,
        }
    }
}
