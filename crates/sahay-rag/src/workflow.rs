//! End-to-end query pipeline: a classifier decision routes each question to
//! the grounded responder or to a canned escalation reply.
//!
//! Every step contributes a [`StateUpdate`] that is folded into an immutable
//! [`ConversationState`]; no step mutates what an earlier one decided. A
//! query makes exactly one pass and exactly one of the two handlers runs.

use anyhow::anyhow;
use serde::Serialize;

use crate::classifier::Classifier;
use crate::error::PipelineError;
use crate::escalation;
use crate::responder::RagResponder;
use crate::types::Category;

/// A fully processed query: the routing decision plus the final answer.
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub question: String,
    pub category: Category,
    pub answer: String,
}

/// One step's contribution to the conversation state.
#[derive(Debug, Clone)]
pub enum StateUpdate {
    Classified(Category),
    Answered(String),
}

/// Accumulated state for a single query's pass through the pipeline.
///
/// Built once from the question, then extended by folding updates with
/// [`ConversationState::apply`]. Converts into an [`Exchange`] only when
/// both the category and the answer are present.
#[derive(Debug, Clone)]
pub struct ConversationState {
    question: String,
    category: Option<Category>,
    answer: Option<String>,
}

impl ConversationState {
    pub fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
            category: None,
            answer: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Fold one update into the state, consuming the previous value.
    pub fn apply(self, update: StateUpdate) -> Self {
        match update {
            StateUpdate::Classified(category) => Self {
                category: Some(category),
                ..self
            },
            StateUpdate::Answered(answer) => Self {
                answer: Some(answer),
                ..self
            },
        }
    }

    /// The completed exchange, or `None` while a step is still missing.
    pub fn into_exchange(self) -> Option<Exchange> {
        Some(Exchange {
            question: self.question,
            category: self.category?,
            answer: self.answer?,
        })
    }
}

/// Where a classified query goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    RagResponder,
    Escalation,
}

/// Map a category onto its handler. Product questions get a grounded answer
/// from the knowledge base; returns and general questions get a fixed
/// hand-off message without touching the index.
pub fn route(category: Category) -> Route {
    match category {
        Category::Products => Route::RagResponder,
        Category::Returns | Category::General => Route::Escalation,
    }
}

pub struct SupportWorkflow {
    classifier: Classifier,
    responder: RagResponder,
}

impl SupportWorkflow {
    pub fn new(classifier: Classifier, responder: RagResponder) -> Self {
        Self {
            classifier,
            responder,
        }
    }

    /// Run one question through classify, route and answer.
    pub async fn run(&self, question: &str) -> Result<Exchange, PipelineError> {
        let state = ConversationState::new(question);

        let category = self.classifier.classify(state.question()).await?;
        let state = state.apply(StateUpdate::Classified(category));

        let route = route(category);
        tracing::info!(category = %category, route = ?route, "Routed query");

        let update = match route {
            Route::RagResponder => {
                let answer = self.responder.respond(state.question()).await?;
                StateUpdate::Answered(answer)
            }
            Route::Escalation => StateUpdate::Answered(escalation::respond(category).to_string()),
        };
        let state = state.apply(update);

        let exchange = state.into_exchange().ok_or_else(|| {
            PipelineError::Generation(anyhow!("pipeline finished without an answer"))
        })?;
        tracing::info!(
            category = %exchange.category,
            answer_len = exchange.answer.len(),
            "Answered query"
        );
        Ok(exchange)
    }
}
