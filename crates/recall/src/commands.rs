// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand definitions and their execution against [`Services`].
//!
//! Every command produces a JSON value; `main` prints it to stdout.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use recall_core::RecallError;
use recall_memory::{MessageKind, NewMessage};
use serde::Serialize;
use serde_json::{Value, json};

use crate::services::Services;

/// Operations that need the store and the providers.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Consolidate a piece of text into the owner's memories.
    Remember {
        #[arg(long)]
        owner: String,
        content: String,
    },
    /// List the memories most similar to a text.
    Similar {
        #[arg(long)]
        owner: String,
        #[arg(long, default_value_t = 3)]
        top_n: usize,
        text: String,
    },
    /// List every memory of an owner, oldest first.
    Memories {
        #[arg(long)]
        owner: String,
    },
    /// Append a message to a conversation.
    Message {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        conversation: String,
        #[arg(long)]
        kind: MessageKind,
        /// RFC 3339 timestamp; defaults to now.
        #[arg(long)]
        timestamp: Option<DateTime<Utc>>,
        text: String,
    },
    /// Hybrid search over the owner's conversation messages.
    Search {
        #[arg(long)]
        owner: String,
        /// Expand each hit to its surrounding messages.
        #[arg(long)]
        context: bool,
        query: String,
    },
    /// Show the messages around one message.
    Context {
        #[arg(long)]
        owner: String,
        message_id: String,
    },
    /// Summarize one conversation.
    Summarize {
        #[arg(long)]
        owner: String,
        conversation_id: String,
    },
    /// Semantic response cache.
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Delete the least important memories beyond capacity.
    Prune {
        #[arg(long)]
        owner: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Store a response for a query.
    Save {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        query: String,
        #[arg(long)]
        response: String,
    },
    /// Look up the cached response for a query.
    Lookup {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        query: String,
    },
}

/// Run `command` and return its JSON output.
pub async fn execute(services: &Services, command: Command) -> Result<Value, RecallError> {
    match command {
        Command::Remember { owner, content } => {
            to_json(&services.memory.remember(&owner, &content).await?)
        }
        Command::Similar {
            owner,
            top_n,
            text,
        } => to_json(&services.memory.find_related(&owner, &text, top_n).await?),
        Command::Memories { owner } => to_json(&services.memory.memories(&owner).await?),
        Command::Message {
            owner,
            conversation,
            kind,
            timestamp,
            text,
        } => {
            let receipt = services
                .conversations
                .add_message(NewMessage {
                    owner_id: owner,
                    conversation_id: conversation,
                    kind,
                    text,
                    timestamp,
                })
                .await?;
            to_json(&receipt)
        }
        Command::Search {
            owner,
            context: true,
            query,
        } => to_json(
            &services
                .conversations
                .search_with_context(&owner, &query)
                .await?,
        ),
        Command::Search { owner, query, .. } => {
            to_json(&services.conversations.search(&owner, &query).await?)
        }
        Command::Context { owner, message_id } => {
            match services
                .conversations
                .context_around(&owner, &message_id)
                .await?
            {
                Some(messages) => to_json(&messages),
                None => Err(RecallError::Validation(format!(
                    "message {message_id} not found"
                ))),
            }
        }
        Command::Summarize {
            owner,
            conversation_id,
        } => {
            let summary = services
                .conversations
                .summarize(&owner, &conversation_id)
                .await?;
            Ok(json!({ "conversation_id": conversation_id, "summary": summary }))
        }
        Command::Cache(CacheCommand::Save {
            owner,
            query,
            response,
        }) => to_json(&services.cache.save(&owner, &query, &response, None).await?),
        Command::Cache(CacheCommand::Lookup { owner, query }) => {
            to_json(&services.cache.lookup(&owner, &query).await?)
        }
        Command::Prune { owner } => {
            let pruned = services.memory.prune_memories(&owner).await?;
            Ok(json!({ "owner_id": owner, "pruned": pruned }))
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, RecallError> {
    serde_json::to_value(value)
        .map_err(|e| RecallError::Internal(format!("failed to serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use recall_test_utils::TestHarness;

    use super::*;

    async fn services(responses: &[&str]) -> Services {
        let harness = TestHarness::builder()
            .with_mock_responses(responses.iter().copied())
            .build()
            .await
            .unwrap();
        Services::assemble(
            harness.store.clone(),
            harness.embedder.clone(),
            harness.generator.clone(),
            &harness.config,
        )
    }

    #[tokio::test]
    async fn remember_then_repeat_reports_reinforcement() {
        let services = services(&["6", "a fact"]).await;
        let remember = || Command::Remember {
            owner: "u1".into(),
            content: "the sky was green today".into(),
        };

        let first = execute(&services, remember()).await.unwrap();
        assert_eq!(first["status"], "created");
        assert_eq!(first["pruned"], 0);

        let second = execute(&services, remember()).await.unwrap();
        assert_eq!(second["status"], "reinforced");
        assert_eq!(second["node_id"], first["node_id"]);

        let listed = execute(&services, Command::Memories { owner: "u1".into() })
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["access_count"], 1);
        assert!(listed[0].get("embedding").is_none());
    }

    #[tokio::test]
    async fn cache_round_trip_through_commands() {
        let services = services(&[]).await;
        let saved = execute(
            &services,
            Command::Cache(CacheCommand::Save {
                owner: "u1".into(),
                query: "what is the capital of France".into(),
                response: "Paris".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(saved["response"], "Paris");

        let hit = execute(
            &services,
            Command::Cache(CacheCommand::Lookup {
                owner: "u1".into(),
                query: "what is the capital of France".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(hit["outcome"], "hit");
        assert_eq!(hit["response"], "Paris");

        let miss = execute(
            &services,
            Command::Cache(CacheCommand::Lookup {
                owner: "u2".into(),
                query: "what is the capital of France".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(miss["outcome"], "miss");
    }

    #[tokio::test]
    async fn unknown_message_context_is_a_validation_error() {
        let services = services(&[]).await;
        let err = execute(
            &services,
            Command::Context {
                owner: "u1".into(),
                message_id: "does-not-exist".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RecallError::Validation(_)));
    }

    #[tokio::test]
    async fn message_and_search_report_hits() {
        let services = services(&[]).await;
        let receipt = execute(
            &services,
            Command::Message {
                owner: "u1".into(),
                conversation: "c1".into(),
                kind: MessageKind::Ai,
                timestamp: None,
                text: "Lisbon is sunny in June".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(receipt["message"]["kind"], "ai");
        assert!(receipt["memory"].is_null());

        let found = execute(
            &services,
            Command::Search {
                owner: "u1".into(),
                context: false,
                query: "Lisbon is sunny in June".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(found["outcome"], "found");
        assert_eq!(found["hits"][0]["message"]["text"], "Lisbon is sunny in June");

        let windows = execute(
            &services,
            Command::Search {
                owner: "u1".into(),
                context: true,
                query: "Lisbon is sunny in June".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(windows["outcome"], "found");
    }

    #[tokio::test]
    async fn prune_reports_count() {
        let services = services(&[]).await;
        let out = execute(&services, Command::Prune { owner: "u1".into() })
            .await
            .unwrap();
        assert_eq!(out["pruned"], 0);
    }
}
