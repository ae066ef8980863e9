use std::sync::Arc;

use ql_core::{Category, DEFAULT_LIST_LIMIT, Distribution, Engine, Memory};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

/// MCP front end. Every tool serializes through the one engine mutex; the
/// status line lives beside it so the ticker can rotate it without
/// contending with tool calls.
#[derive(Clone)]
pub struct QlServer {
    engine: Arc<Mutex<Engine>>,
    status: Arc<RwLock<String>>,
    tool_router: ToolRouter<Self>,
}

impl QlServer {
    pub fn new(mut engine: Engine) -> Self {
        let status = engine.status_line();
        Self {
            engine: Arc::new(Mutex::new(engine)),
            status: Arc::new(RwLock::new(status)),
            tool_router: Self::tool_router(),
        }
    }

    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }

    pub fn status(&self) -> Arc<RwLock<String>> {
        Arc::clone(&self.status)
    }
}

fn json_result(value: &impl serde::Serialize) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )]))
}

fn breakdown_json(breakdown: &Distribution) -> serde_json::Value {
    breakdown
        .iter()
        .map(|(c, s)| (c.as_str().to_string(), serde_json::json!(s)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn memories_json(found: &[&Memory]) -> serde_json::Value {
    serde_json::json!({
        "count": found.len(),
        "memories": found,
    })
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, McpError> {
    if value.trim().is_empty() {
        return Err(McpError::invalid_params(format!("{field} must not be empty"), None));
    }
    Ok(value)
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct WordRequest {
    /// Draw the word again for the current hour even if one exists today
    regenerate: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UnlockRequest {
    /// The guess; compared case-insensitively after trimming
    guess: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MemoryAddRequest {
    /// Memory text
    content: String,
    /// Optional tags; duplicates are dropped
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MemoryListRequest {
    /// Maximum number of memories to return (default 10)
    limit: Option<usize>,
    /// Only memories carrying this tag
    tag: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MemorySearchRequest {
    /// Substring matched against content and tags, case-insensitively
    query: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PoemRequest {
    /// Emotion to compose for (default "love")
    emotion: Option<String>,
    /// Return the classical poetry matrix instead of composing
    matrix: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FavoriteRequest {
    /// Index into the generated poems, 0 being the newest
    index: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ChatRequest {
    /// Message for the companion
    message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TextRequest {
    /// Text to analyze
    text: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TrainRequest {
    /// Example text
    text: String,
    /// Expected category: romantic, intellectual, emotional, creative or spiritual
    category: String,
}

#[tool_router]
impl QlServer {
    #[tool(description = "Return the full persisted state document as JSON.")]
    async fn ql_state(&self) -> Result<CallToolResult, McpError> {
        let engine = self.engine.lock().await;
        json_result(engine.snapshot())
    }

    #[tool(
        description = "Show today's quantum lock: the hint, all hints for the word, attempts used and the unlock streak. Set regenerate to draw the word again."
    )]
    async fn ql_word(
        &self,
        Parameters(req): Parameters<WordRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut engine = self.engine.lock().await;
        if req.regenerate.unwrap_or(false) {
            engine.generate_todays_word();
        } else {
            engine.ensure_todays_word();
        }
        let lock = &engine.snapshot().quantum_lock;
        json_result(&serde_json::json!({
            "hint": lock.todays_hint,
            "hints": engine.reveal_hint(),
            "attempts": lock.attempts,
            "max_attempts": lock.max_attempts,
            "locked_out": lock.is_locked_out(),
            "unlock_streak": lock.unlock_streak,
        }))
    }

    #[tool(
        description = "Guess today's word. A correct guess opens the chamber; too many misses lock the puzzle until tomorrow."
    )]
    async fn ql_unlock(
        &self,
        Parameters(req): Parameters<UnlockRequest>,
    ) -> Result<CallToolResult, McpError> {
        let guess = require_text("guess", &req.guess)?;
        let mut engine = self.engine.lock().await;
        let outcome = engine.attempt_unlock(guess);
        let chamber = outcome.success().then(|| engine.chamber());
        json_result(&serde_json::json!({
            "outcome": outcome,
            "chamber": chamber,
        }))
    }

    #[tool(description = "Store a memory with optional tags.")]
    async fn ql_memory_add(
        &self,
        Parameters(req): Parameters<MemoryAddRequest>,
    ) -> Result<CallToolResult, McpError> {
        let content = require_text("content", &req.content)?;
        let mut engine = self.engine.lock().await;
        let memory = engine.add_memory(content, req.tags.unwrap_or_default());
        json_result(&memory)
    }

    #[tool(description = "List memories, most recent first, optionally filtered by tag.")]
    async fn ql_memory_list(
        &self,
        Parameters(req): Parameters<MemoryListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let engine = self.engine.lock().await;
        let found = engine.list_memories(
            req.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            req.tag.as_deref(),
        );
        json_result(&memories_json(&found))
    }

    #[tool(description = "Search memories by content or tag, case-insensitively.")]
    async fn ql_memory_search(
        &self,
        Parameters(req): Parameters<MemorySearchRequest>,
    ) -> Result<CallToolResult, McpError> {
        let engine = self.engine.lock().await;
        let found = engine.search_memories(&req.query);
        json_result(&memories_json(&found))
    }

    #[tool(
        description = "Compose an AI poem for an emotion, or with matrix=true return one classical poem per category."
    )]
    async fn ql_poem(
        &self,
        Parameters(req): Parameters<PoemRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut engine = self.engine.lock().await;
        if req.matrix.unwrap_or(false) {
            return json_result(&engine.poetry_matrix());
        }
        let emotion = req
            .emotion
            .as_deref()
            .unwrap_or(ql_core::poetry::DEFAULT_EMOTION);
        json_result(&engine.generate_ai_poem(emotion))
    }

    #[tool(description = "Add a generated poem to favorites by index (0 is the newest).")]
    async fn ql_favorite(
        &self,
        Parameters(req): Parameters<FavoriteRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut engine = self.engine.lock().await;
        let added = engine.favorite_generated(req.index).ok_or_else(|| {
            McpError::invalid_params(format!("no generated poem at index {}", req.index), None)
        })?;
        json_result(&serde_json::json!({
            "added": added,
            "favorites": engine.snapshot().poetry.favorites.len(),
        }))
    }

    #[tool(
        description = "Send a message to the AI companion. The reply arrives after a short simulated thinking delay."
    )]
    async fn ql_chat(
        &self,
        Parameters(req): Parameters<ChatRequest>,
    ) -> Result<CallToolResult, McpError> {
        let message = require_text("message", &req.message)?;
        let delay = {
            let mut engine = self.engine.lock().await;
            if !engine.begin_chat(message) {
                return Err(McpError::invalid_params(
                    "the companion is still answering the previous message",
                    None,
                ));
            }
            engine.chat_delay()
        };
        // other tools may run while the companion "thinks"
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut engine = self.engine.lock().await;
        let reply = engine.complete_chat(message);
        json_result(&serde_json::json!({
            "reply": reply,
            "emotional_intelligence": engine.snapshot().ai.emotional_intelligence,
        }))
    }

    #[tool(description = "Generate fresh predictions for each of the next seven days.")]
    async fn ql_predict(&self) -> Result<CallToolResult, McpError> {
        let mut engine = self.engine.lock().await;
        let predictions = engine.generate_predictions().to_vec();
        json_result(&predictions)
    }

    #[tool(
        description = "Classify text into romantic, intellectual, emotional, creative and spiritual scores, with the weighted prediction and resonance label."
    )]
    async fn ql_classify(
        &self,
        Parameters(req): Parameters<TextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let engine = self.engine.lock().await;
        let resonance = engine.resonance(&req.text);
        let prediction = engine.predict_emotion(&req.text);
        json_result(&serde_json::json!({
            "resonance": resonance.label,
            "emoji": resonance.emoji,
            "emotion": prediction.label(),
            "confidence": prediction.confidence,
            "breakdown": breakdown_json(&resonance.breakdown),
        }))
    }

    #[tool(description = "Train the emotion classifier with a labelled example.")]
    async fn ql_train(
        &self,
        Parameters(req): Parameters<TrainRequest>,
    ) -> Result<CallToolResult, McpError> {
        let expected: Category = req
            .category
            .parse()
            .map_err(|e: String| McpError::invalid_params(e, None))?;
        let mut engine = self.engine.lock().await;
        let before = engine.train(&req.text, expected);
        json_result(&serde_json::json!({
            "predicted": before.label(),
            "expected": expected,
            "weight": engine.classifier().weight(expected),
            "training_records": engine.classifier().training_data().len(),
        }))
    }

    #[tool(description = "Flush the state document to the primary and fallback stores.")]
    async fn ql_save(&self) -> Result<CallToolResult, McpError> {
        let saved = self.engine.lock().await.save();
        json_result(&serde_json::json!({ "saved": saved }))
    }

    #[tool(
        description = "Dashboard: days together, intimacy, entanglement, coherence, attempts remaining, moon phase and the current status line."
    )]
    async fn ql_dashboard(&self) -> Result<CallToolResult, McpError> {
        let status = self.status.read().await.clone();
        let engine = self.engine.lock().await;
        json_result(&serde_json::json!({
            "dashboard": engine.dashboard(),
            "metrics": engine.snapshot().metrics,
            "status": status,
            "thinking": engine.is_thinking(),
        }))
    }
}

#[tool_handler]
impl ServerHandler for QlServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Quantum Love: a daily word puzzle, a memory bank, poetry and a companion chat for two people.\n\n\
                 - ql_word shows today's hint; ql_unlock takes a guess. Misses are limited per day.\n\
                 - ql_memory_add / ql_memory_list / ql_memory_search manage shared memories.\n\
                 - ql_poem composes or browses poems; ql_favorite keeps one.\n\
                 - ql_chat talks to the companion; replies arrive after a short delay.\n\
                 - ql_classify and ql_train work the emotion classifier.\n\
                 - ql_dashboard and ql_state report the current state. Changes are saved as they happen."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::{ContentTables, EngineConfig, FixedClock, MemoryStateStore};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn make_server() -> QlServer {
        let engine = Engine::with_rng(
            EngineConfig::default().without_chat_delay(),
            ContentTables::builtin(),
            Box::new(MemoryStateStore::new()),
            Box::new(FixedClock::at("2026-02-11T03:15:00+05:00").unwrap()),
            SmallRng::seed_from_u64(11),
        );
        QlServer::new(engine)
    }

    fn text_from_result(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| match &c.raw {
                RawContent::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    fn parse_result(result: &CallToolResult) -> serde_json::Value {
        let text = text_from_result(result);
        serde_json::from_str(&text).expect("handler should return valid JSON")
    }

    async fn todays_word(server: &QlServer) -> String {
        server.engine.lock().await.snapshot().quantum_lock.todays_word.clone()
    }

    #[test]
    fn test_tool_registration() {
        let server = make_server();
        let info = server.get_info();
        assert!(info.instructions.is_some());
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_ql_state_fresh() {
        let server = make_server();
        let json = parse_result(&server.ql_state().await.unwrap());
        assert_eq!(json["system"]["totalVisits"], 1);
        assert_eq!(json["quantumLock"]["maxAttempts"], 5);
        assert!(!json["quantumLock"]["todaysWord"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ql_word_reports_hint() {
        let server = make_server();
        let json = parse_result(
            &server
                .ql_word(Parameters(WordRequest { regenerate: None }))
                .await
                .unwrap(),
        );
        assert!(json["hint"].as_str().unwrap().contains("Quantum state:"));
        assert_eq!(json["attempts"], 0);
        assert_eq!(json["locked_out"], false);
    }

    #[tokio::test]
    async fn test_ql_unlock_correct_opens_chamber() {
        let server = make_server();
        let word = todays_word(&server).await;
        let json = parse_result(
            &server
                .ql_unlock(Parameters(UnlockRequest {
                    guess: format!("  {}  ", word.to_uppercase()),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(json["outcome"]["status"], "unlocked");
        assert_eq!(json["outcome"]["streak"], 1);
        assert!(json["chamber"]["message"].is_string());
    }

    #[tokio::test]
    async fn test_ql_unlock_locks_after_max_misses() {
        let server = make_server();
        let mut last = serde_json::Value::Null;
        for _ in 0..5 {
            last = parse_result(
                &server
                    .ql_unlock(Parameters(UnlockRequest {
                        guess: "definitely-not-the-word".into(),
                    }))
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(last["outcome"]["status"], "locked");
        assert_eq!(last["outcome"]["attempts"], 5);
        assert!(last["chamber"].is_null());

        // the right word no longer helps today
        let word = todays_word(&server).await;
        let json = parse_result(
            &server
                .ql_unlock(Parameters(UnlockRequest { guess: word }))
                .await
                .unwrap(),
        );
        assert_eq!(json["outcome"]["status"], "locked");
        assert_eq!(json["outcome"]["attempts"], 5);
    }

    #[tokio::test]
    async fn test_ql_unlock_blank_rejected() {
        let server = make_server();
        let err = server
            .ql_unlock(Parameters(UnlockRequest { guess: "   ".into() }))
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_memory_add_list_search() {
        let server = make_server();
        server
            .ql_memory_add(Parameters(MemoryAddRequest {
                content: "Our first dance, pure joy".into(),
                tags: Some(vec!["dance".into(), "dance".into()]),
            }))
            .await
            .unwrap();
        server
            .ql_memory_add(Parameters(MemoryAddRequest {
                content: "Rainy afternoon".into(),
                tags: None,
            }))
            .await
            .unwrap();

        let listed = parse_result(
            &server
                .ql_memory_list(Parameters(MemoryListRequest {
                    limit: None,
                    tag: Some("dance".into()),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(listed["count"], 1);
        assert_eq!(listed["memories"][0]["tags"].as_array().unwrap().len(), 1);

        let found = parse_result(
            &server
                .ql_memory_search(Parameters(MemorySearchRequest {
                    query: "RAINY".into(),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(found["count"], 1);
        assert_eq!(found["memories"][0]["content"], "Rainy afternoon");
    }

    #[tokio::test]
    async fn test_memory_add_blank_rejected() {
        let server = make_server();
        let result = server
            .ql_memory_add(Parameters(MemoryAddRequest {
                content: "".into(),
                tags: None,
            }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_chat_records_both_turns() {
        let server = make_server();
        let json = parse_result(
            &server
                .ql_chat(Parameters(ChatRequest {
                    message: "hello there".into(),
                }))
                .await
                .unwrap(),
        );
        assert!(!json["reply"].as_str().unwrap().is_empty());

        let engine = server.engine.lock().await;
        assert!(!engine.is_thinking());
        let history = &engine.snapshot().ai.conversation_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hello there");
    }

    #[tokio::test]
    async fn test_chat_rejected_while_thinking() {
        let server = make_server();
        assert!(server.engine.lock().await.begin_chat("first"));

        let result = server
            .ql_chat(Parameters(ChatRequest {
                message: "second".into(),
            }))
            .await;
        assert!(result.is_err());

        let mut engine = server.engine.lock().await;
        engine.complete_chat("first");
        let roles: Vec<ql_core::Role> = engine
            .snapshot()
            .ai
            .conversation_history
            .iter()
            .map(|t| t.role)
            .collect();
        assert_eq!(roles, [ql_core::Role::User, ql_core::Role::Ai]);
    }

    #[tokio::test]
    async fn test_poem_then_favorite() {
        let server = make_server();
        let poem = parse_result(
            &server
                .ql_poem(Parameters(PoemRequest {
                    emotion: Some("joy".into()),
                    matrix: None,
                }))
                .await
                .unwrap(),
        );
        assert!(poem["era"].as_str().unwrap().starts_with("AI-"));

        let fav = parse_result(
            &server
                .ql_favorite(Parameters(FavoriteRequest { index: 0 }))
                .await
                .unwrap(),
        );
        assert_eq!(fav["added"], true);
        assert_eq!(fav["favorites"], 1);

        let again = parse_result(
            &server
                .ql_favorite(Parameters(FavoriteRequest { index: 0 }))
                .await
                .unwrap(),
        );
        assert_eq!(again["added"], false);

        assert!(
            server
                .ql_favorite(Parameters(FavoriteRequest { index: 9 }))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_poem_matrix() {
        let server = make_server();
        let json = parse_result(
            &server
                .ql_poem(Parameters(PoemRequest {
                    emotion: None,
                    matrix: Some(true),
                }))
                .await
                .unwrap(),
        );
        let eras: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["era"].as_str().unwrap())
            .collect();
        assert_eq!(eras, ["ghalib", "faiz", "quantum"]);
    }

    #[tokio::test]
    async fn test_predict_week() {
        let server = make_server();
        let json = parse_result(&server.ql_predict().await.unwrap());
        let days = json.as_array().unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0]["date"], "2026-02-11");
    }

    #[tokio::test]
    async fn test_classify_and_train() {
        let server = make_server();
        let json = parse_result(
            &server
                .ql_classify(Parameters(TextRequest {
                    text: "I love your heart".into(),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(json["emotion"], "romantic");
        assert!(json["breakdown"]["romantic"].as_f64().unwrap() > 0.0);

        let trained = parse_result(
            &server
                .ql_train(Parameters(TrainRequest {
                    text: "I love your heart".into(),
                    category: "Spiritual".into(),
                }))
                .await
                .unwrap(),
        );
        assert_eq!(trained["expected"], "spiritual");
        assert_eq!(trained["training_records"], 1);
    }

    #[tokio::test]
    async fn test_train_unknown_category_rejected() {
        let server = make_server();
        let result = server
            .ql_train(Parameters(TrainRequest {
                text: "anything".into(),
                category: "grumpy".into(),
            }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_and_dashboard() {
        let server = make_server();
        let saved = parse_result(&server.ql_save().await.unwrap());
        assert_eq!(saved["saved"], true);

        let json = parse_result(&server.ql_dashboard().await.unwrap());
        assert_eq!(json["dashboard"]["attempts_remaining"], 5);
        assert!(json["dashboard"]["moon"]["name"].is_string());
        assert!(!json["status"].as_str().unwrap().is_empty());
        assert_eq!(json["thinking"], false);
    }
}
