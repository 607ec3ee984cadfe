//! HTTP server for the support chatbot: the chat page, the query endpoint
//! and a health probe.

use std::sync::Arc;

use axum::{
    extract::State as AxumState,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use sahay_rag::{
    Category, Classifier, GenerationOptions, LanceStore, RagResponder, Retriever, SemanticIndex,
    SupportConfig, SupportWorkflow,
};

const CHAT_PAGE: &str = include_str!("../static/index.html");

#[derive(Debug, Deserialize)]
struct QueryRequest {
    question: String,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    question: String,
    category: Category,
    answer: String,
}

#[derive(Clone)]
struct AppState {
    workflow: Arc<SupportWorkflow>,
    index: Arc<dyn SemanticIndex>,
}

async fn chat_page() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn handle_query(
    AxumState(state): AxumState<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, (StatusCode, String)> {
    tracing::info!("📨 Received query: {}", payload.question);

    let exchange = state
        .workflow
        .run(&payload.question)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(QueryResponse {
        question: exchange.question,
        category: exchange.category,
        answer: exchange.answer,
    }))
}

async fn health(
    AxumState(state): AxumState<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let chunks = state
        .index
        .count()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "indexed_chunks": chunks,
    })))
}

/// Assemble the pipeline from the config and serve it over HTTP.
pub async fn serve(config: SupportConfig, bind: &str) -> anyhow::Result<()> {
    let model = sahay_rag::llm::from_config(&config.model)?;
    let embeddings = sahay_rag::embeddings::from_config(&config.embedding)?;
    let index: Arc<dyn SemanticIndex> =
        Arc::new(LanceStore::new(&config.index_dir(), config.embedding.dimension).await?);

    let options = GenerationOptions::deterministic(config.model.max_output_tokens);
    let classifier = Classifier::new(Arc::clone(&model), options.clone());
    let retriever = Retriever::new(embeddings, Arc::clone(&index), config.retrieval.top_k);
    let responder = RagResponder::new(retriever, model, options);

    let state = AppState {
        workflow: Arc::new(SupportWorkflow::new(classifier, responder)),
        index,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(chat_page))
        .route("/health", get(health))
        .route("/query", post(handle_query))
        .layer(cors)
        .with_state(state);

    tracing::info!("🚀 Support chatbot listening on http://{}", bind);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
