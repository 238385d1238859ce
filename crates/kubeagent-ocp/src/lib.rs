//! OpenShift and Kubernetes question-answering assistant built on kubeagent.
//!
//! A question goes to a routing agent that delegates to three sub-agents:
//! `knowledge` for how-to and documentation questions, `retrieval` for the
//! live state of the connected cluster (through `oc` and `kube-health`), and
//! `metrics` for Prometheus questions (through a metrics similarity service).
//!
//! # Library usage
//!
//! ```ignore
//! use kubeagent_ocp::AssistConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = AssistConfig::from_env()?;
//! let router = config.build_router(config.build_engine()?)?;
//! let answer = router.run("list all namespaces", CancellationToken::new()).await?;
//! println!("{answer}\n\n{}", answer.usage);
//! ```
//!
//! Or register the tools on your own [`ToolSet`](kubeagent::tools::core::ToolSet):
//!
//! ```ignore
//! use kubeagent_ocp::{ClusterToolsExt, MetricsToolsExt};
//!
//! let tools = ToolSet::new()
//!     .with_cluster_tools(executor)
//!     .with_metrics_tools(metrics_client);
//! ```
//!
//! # Binary
//!
//! ```sh
//! OPENROUTER_KEY=... kubeagent "why is my pod crashing in namespace shop?"
//! ```

pub mod config;
pub mod prompt;
pub mod tools;

pub use config::AssistConfig;
pub use prompt::REFUSAL_MESSAGE;
pub use tools::{ClusterToolsExt, MetricsToolsExt};
