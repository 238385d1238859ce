use kubeagent::agent::routing::{DEFAULT_REFUSAL, NO_ANSWER};
use kubeagent::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const NAMESPACES: &str = "NAME                STATUS   AGE\ndefault             Active   41d\nopenshift-console   Active   41d\n";

/// Counts calls and returns a fixed table.
struct CountingNamespaces {
    calls: Arc<AtomicUsize>,
}

impl Tool for CountingNamespaces {
    fn definition(&self) -> ToolDef {
        ToolDef::new(
            "get_namespaces",
            "List namespaces",
            json!({"type": "object", "properties": {}}),
        )
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, _arguments: &'a str) -> ToolFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(NAMESPACES.to_string()) })
    }
}

struct Hang;

impl Tool for Hang {
    fn definition(&self) -> ToolDef {
        ToolDef::new("hang", "Never returns", json!({"type": "object", "properties": {}}))
    }

    fn execute<'a>(&'a self, _ctx: &'a ToolContext, _arguments: &'a str) -> ToolFuture<'a> {
        Box::pin(async {
            std::future::pending::<()>().await;
            Ok(String::new())
        })
    }
}

struct Fixture {
    engine: Arc<ScriptedEngine>,
    router: RoutingAgent,
    namespace_calls: Arc<AtomicUsize>,
}

fn fixture(engine: ScriptedEngine, retrieval_rounds: u32) -> Fixture {
    let engine = Arc::new(engine);
    let namespace_calls = Arc::new(AtomicUsize::new(0));

    let knowledge = SubAgentTool::new(
        ToolSpec::builder("knowledge_agent")
            .purpose("Answer general OpenShift questions")
            .when_to_use("Conceptual or how-to questions")
            .when_not_to_use("Questions about the live cluster"),
        SubAgent::new(
            AgentConfig::new("knowledge", "You explain OpenShift."),
            ToolSet::new(),
            engine.clone(),
        ),
    );
    let retrieval = SubAgentTool::new(
        ToolSpec::builder("retrieval_agent")
            .purpose("Fetch live state from the connected cluster")
            .when_to_use("Questions about objects that exist right now")
            .when_not_to_use("Conceptual questions"),
        SubAgent::new(
            AgentConfig::new("retrieval", "You inspect the live cluster.")
                .with_max_rounds(retrieval_rounds),
            ToolSet::new()
                .with(CountingNamespaces {
                    calls: namespace_calls.clone(),
                })
                .with(Hang),
            engine.clone(),
        ),
    );

    let router = RoutingAgent::new(AgentConfig::new("router", "Route questions."), engine.clone())
        .with_sub_agent(knowledge)
        .with_sub_agent(retrieval);

    Fixture {
        engine,
        router,
        namespace_calls,
    }
}

#[tokio::test]
async fn weather_question_is_refused_without_delegation() {
    let refused = Arc::new(Mutex::new(Vec::new()));
    let seen = refused.clone();
    let f = fixture(ScriptedEngine::new(), 10);
    let router = f.router.with_event_handler(Arc::new(EventObserver::new(move |event| {
        if let AgentEvent::QueryRefused { query, .. } = event {
            seen.lock().unwrap().push(query.to_string());
        }
    })));

    let answer = router
        .run("What's the weather today?", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.outcome, Outcome::Refused);
    assert_eq!(answer.answer, DEFAULT_REFUSAL);
    assert_eq!(f.engine.turns_for("router"), 0);
    assert_eq!(f.engine.turns_for("knowledge"), 0);
    assert_eq!(f.engine.turns_for("retrieval"), 0);
    assert_eq!(answer.usage.requests, 0);
    assert_eq!(*refused.lock().unwrap(), vec!["What's the weather today?".to_string()]);
}

#[tokio::test]
async fn namespace_listing_reaches_user_unmodified() {
    let engine = ScriptedEngine::new()
        .script(
            "router",
            [
                ScriptStep::call("retrieval_agent", json!({"original_query": "list all namespaces"})),
                ScriptStep::final_answer("There are two namespaces."),
            ],
        )
        .script(
            "retrieval",
            [
                ScriptStep::call("get_namespaces", json!({})),
                ScriptStep::EchoLastToolResult,
            ],
        );
    let f = fixture(engine, 10);

    let answer = f
        .router
        .run("list all namespaces", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.outcome, Outcome::Answered);
    assert_eq!(answer.answer, NAMESPACES);
    assert_eq!(f.namespace_calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.engine.turns_for("knowledge"), 0);
}

#[tokio::test]
async fn rewritten_query_is_not_forwarded() {
    let engine = ScriptedEngine::new()
        .script(
            "router",
            [
                ScriptStep::call("knowledge_agent", json!({"original_query": "routes?"})),
                ScriptStep::final_answer("done"),
            ],
        )
        .script("knowledge", [ScriptStep::final_answer("A route exposes a service.")]);
    let f = fixture(engine, 10);

    f.router
        .run("How do OpenShift routes work?", CancellationToken::new())
        .await
        .unwrap();

    let history = &f.engine.histories_for("knowledge")[0];
    let user = history.iter().find(|m| m.role == kubeagent::MessageRole::User).unwrap();
    assert_eq!(user.content.as_deref(), Some("How do OpenShift routes work?"));
}

#[tokio::test]
async fn answers_from_several_agents_are_joined_in_order() {
    let engine = ScriptedEngine::new()
        .script(
            "router",
            [
                ScriptStep::calls([
                    ("knowledge_agent", json!({})),
                    ("retrieval_agent", json!({})),
                ]),
                ScriptStep::final_answer("summary that must not be used"),
            ],
        )
        .script("knowledge", [ScriptStep::final_answer("Namespaces isolate workloads.")])
        .script(
            "retrieval",
            [
                ScriptStep::call("get_namespaces", json!({})),
                ScriptStep::EchoLastToolResult,
            ],
        );
    let f = fixture(engine, 10);

    let answer = f
        .router
        .run("what are namespaces and which ones exist?", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        answer.answer,
        format!("Namespaces isolate workloads.\n\n{NAMESPACES}")
    );
}

#[tokio::test]
async fn usage_covers_router_and_sub_agents() {
    let engine = ScriptedEngine::new()
        .script(
            "router",
            [
                ScriptStep::call("retrieval_agent", json!({})),
                ScriptStep::final_answer("done"),
            ],
        )
        .script(
            "retrieval",
            [
                ScriptStep::call("get_namespaces", json!({})),
                ScriptStep::EchoLastToolResult,
            ],
        )
        .with_usage_per_turn(100, 10);
    let f = fixture(engine, 10);

    let answer = f
        .router
        .run("list all namespaces", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.usage.requests, 4);
    assert_eq!(answer.usage.prompt_tokens, 400);
    assert_eq!(answer.usage.completion_tokens, 40);
    assert_eq!(answer.usage.tool_calls, 2);
    assert!(answer.usage.to_string().contains("requests: 4"));
}

#[tokio::test]
async fn exhausted_sub_agent_reports_inconclusive_analysis() {
    let engine = ScriptedEngine::new()
        .script(
            "router",
            [
                ScriptStep::call("retrieval_agent", json!({})),
                ScriptStep::final_answer("done"),
            ],
        )
        .then_repeat("retrieval", ScriptStep::call("get_namespaces", json!({})));
    let f = fixture(engine, 2);

    let answer = f
        .router
        .run("why is my pod crashing?", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.outcome, Outcome::Inconclusive);
    assert!(answer.answer.starts_with("Inconclusive analysis"));
    assert!(answer.answer.contains("'retrieval'"));
    assert_eq!(f.namespace_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn router_round_limit_is_stated_after_delegated_answers() {
    const POD: &str = "A pod is a group of containers.";
    let engine = Arc::new(
        ScriptedEngine::new()
            .then_repeat("router", ScriptStep::call("knowledge_agent", json!({})))
            .then_repeat("knowledge", ScriptStep::final_answer(POD)),
    );
    let knowledge = SubAgentTool::new(
        ToolSpec::builder("knowledge_agent")
            .purpose("Answer general OpenShift questions")
            .when_to_use("Conceptual or how-to questions")
            .when_not_to_use("Questions about the live cluster"),
        SubAgent::new(
            AgentConfig::new("knowledge", "You explain OpenShift."),
            ToolSet::new(),
            engine.clone(),
        ),
    );
    let router = RoutingAgent::new(
        AgentConfig::new("router", "Route questions.").with_max_rounds(3),
        engine.clone(),
    )
    .with_sub_agent(knowledge);

    let answer = router
        .run("what is a pod?", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.outcome, Outcome::Inconclusive);
    assert_eq!(engine.turns_for("knowledge"), 3);
    let (delegated, tail) = answer.answer.rsplit_once("\n\n").unwrap();
    assert_eq!(delegated, [POD; 3].join("\n\n"));
    assert!(tail.starts_with("Inconclusive analysis"), "{tail}");
    assert!(tail.contains("'router'"));
}

#[tokio::test]
async fn failed_delegation_is_kept_beside_successful_one() {
    let engine = ScriptedEngine::new()
        .script(
            "router",
            [
                ScriptStep::call("knowledge_agent", json!({})),
                ScriptStep::call("retrieval_agent", json!({})),
                ScriptStep::final_answer("done"),
            ],
        )
        .script("knowledge", [ScriptStep::Fail("HTTP 503".into())])
        .script(
            "retrieval",
            [
                ScriptStep::call("get_namespaces", json!({})),
                ScriptStep::EchoLastToolResult,
            ],
        );
    let f = fixture(engine, 10);

    let answer = f
        .router
        .run("list all namespaces", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.outcome, Outcome::Answered);
    let (failure, listing) = answer.answer.split_once("\n\n").unwrap();
    assert!(failure.starts_with("Error: reasoning engine failed: HTTP 503"), "{failure}");
    assert!(answer.answer.ends_with(NAMESPACES));
    assert!(!listing.is_empty());
}

#[tokio::test]
async fn failed_sub_agent_falls_back_to_router_answer() {
    let engine = ScriptedEngine::new()
        .script(
            "router",
            [
                ScriptStep::call("knowledge_agent", json!({})),
                ScriptStep::EchoLastToolResult,
            ],
        )
        .script("knowledge", [ScriptStep::Fail("HTTP 503".into())]);
    let f = fixture(engine, 10);

    let answer = f
        .router
        .run("what is a pod?", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.outcome, Outcome::Answered);
    assert!(answer.answer.starts_with("Error: reasoning engine failed: HTTP 503"));
}

#[tokio::test]
async fn router_engine_failure_is_reported_in_answer() {
    let engine = ScriptedEngine::new().script("router", [ScriptStep::Fail("HTTP 401".into())]);
    let f = fixture(engine, 10);

    let answer = f
        .router
        .run("list pods", CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(answer.outcome, Outcome::Failed(_)));
    assert_eq!(answer.answer, "Error: reasoning engine failed: HTTP 401");
}

#[tokio::test]
async fn router_refusal_and_empty_answers() {
    let engine = ScriptedEngine::new().script("router", [ScriptStep::final_answer(DEFAULT_REFUSAL)]);
    let f = fixture(engine, 10);
    let answer = f
        .router
        .run("what is the cluster weather?", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(answer.outcome, Outcome::Refused);

    let no_calls = ScriptStep::calls(Vec::<(String, serde_json::Value)>::new());
    let engine = ScriptedEngine::new().script("router", [no_calls]);
    let f = fixture(engine.with_usage_per_turn(5, 5), 10);
    let answer = f
        .router
        .run("list pods", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(answer.answer, NO_ANSWER);
}

#[tokio::test]
async fn cancellation_aborts_nested_tool() {
    let engine = ScriptedEngine::new()
        .script("router", [ScriptStep::call("retrieval_agent", json!({}))])
        .script("retrieval", [ScriptStep::call("hang", json!({}))]);
    let f = fixture(engine, 10);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = f.router.run("list pods", cancel).await.unwrap_err();
    assert!(err.is_cancelled());
}
