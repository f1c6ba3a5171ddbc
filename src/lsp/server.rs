//! Main LSP server implementation

use super::code_action::{self, comment_edit, ExplainArgs};
use super::document::DocumentStore;
use crate::agent::ChatAgent;
use crate::commands::{select_code, ExplainCommand};
use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tower_lsp::jsonrpc::{Error as JsonRpcError, Result as JsonRpcResult};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

/// The LSP backend
#[derive(Clone)]
pub struct TwinLspBackend {
    client: Client,
    documents: Arc<DocumentStore>,
    agent: Arc<ChatAgent>,
}

impl TwinLspBackend {
    pub fn new(client: Client, agent: Arc<ChatAgent>) -> Self {
        Self {
            client,
            documents: Arc::new(DocumentStore::new()),
            agent,
        }
    }

    async fn run_explain(&self, command: ExplainCommand, args: ExplainArgs) -> Option<String> {
        match plan_explain(&self.documents, &self.agent, command, args).await {
            ExplainAction::NotOpen(uri) => {
                self.client
                    .show_message(MessageType::WARNING, format!("{} is not open", uri))
                    .await;
                None
            }
            ExplainAction::ShowError(reply) => {
                self.client.show_message(MessageType::ERROR, &reply).await;
                Some(reply)
            }
            ExplainAction::Show(reply) => {
                self.client.log_message(MessageType::INFO, &reply).await;
                self.client.show_message(MessageType::INFO, &reply).await;
                Some(reply)
            }
            ExplainAction::InsertComment { reply, edit } => {
                match self.client.apply_edit(edit).await {
                    Ok(response) if !response.applied => {
                        tracing::warn!(
                            "Editor rejected comment insert: {}",
                            response.failure_reason.unwrap_or_default()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!("Failed to apply comment edit: {}", e),
                }
                Some(reply)
            }
        }
    }
}

/// What the editor should be told once an explain command has run
#[derive(Debug, Clone, PartialEq)]
pub enum ExplainAction {
    /// The command named a document the server is not tracking
    NotOpen(Url),
    /// The model request failed or ran out of tool-calling budget
    ShowError(String),
    /// Show the explanation
    Show(String),
    /// Insert the explanation above the selection
    InsertComment { reply: String, edit: WorkspaceEdit },
}

/// Ask the agent about the target code and decide how to present the reply
pub async fn plan_explain(
    documents: &DocumentStore,
    agent: &ChatAgent,
    command: ExplainCommand,
    args: ExplainArgs,
) -> ExplainAction {
    let Some(doc) = documents.get(&args.uri) else {
        return ExplainAction::NotOpen(args.uri);
    };

    let selection = args
        .range
        .and_then(|r| doc.get_range(&r))
        .unwrap_or_default();
    let code = select_code(&selection, &doc.content);
    let prompt = command.prompt(code, &doc.language_id, &doc.file_name());

    tracing::info!("Running {} on {}", command.id(), doc.file_name());
    let outcome = agent.answer(&prompt).await;

    if outcome.is_error() {
        return ExplainAction::ShowError(outcome.reply);
    }

    match command {
        ExplainCommand::Explain => ExplainAction::Show(outcome.reply),
        ExplainCommand::ExplainAsComment => {
            let edit = comment_edit(&doc, args.range, &outcome.reply);
            ExplainAction::InsertComment {
                reply: outcome.reply,
                edit,
            }
        }
    }
}

/// Directory the tools should work in, from the initialize request
fn workspace_root_from(params: &InitializeParams) -> Option<PathBuf> {
    let folder_uri = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|f| f.uri.clone());

    #[allow(deprecated)]
    let uri = folder_uri.or_else(|| params.root_uri.clone())?;
    uri.to_file_path().ok()
}

#[tower_lsp::async_trait]
impl LanguageServer for TwinLspBackend {
    async fn initialize(&self, params: InitializeParams) -> JsonRpcResult<InitializeResult> {
        match workspace_root_from(&params) {
            Some(root) => self.agent.workspace_root().set(root),
            None => tracing::warn!("Client opened no workspace; file tools are disabled"),
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: ExplainCommand::ALL
                        .iter()
                        .map(|c| c.id().to_string())
                        .collect(),
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "twin".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("LSP server initialized");
        self.client
            .log_message(MessageType::INFO, "twin LSP server ready")
            .await;
    }

    async fn shutdown(&self) -> JsonRpcResult<()> {
        tracing::info!("LSP server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.documents.open(params);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.documents.change(params);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.close(params);
    }

    async fn code_action(
        &self,
        params: CodeActionParams,
    ) -> JsonRpcResult<Option<CodeActionResponse>> {
        Ok(code_action::handle_code_action(&self.documents, params))
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> JsonRpcResult<Option<Value>> {
        let Some(command) = ExplainCommand::from_id(&params.command) else {
            tracing::warn!("Unknown command {}", params.command);
            return Err(JsonRpcError::method_not_found());
        };
        let args =
            ExplainArgs::from_arguments(params.arguments).map_err(JsonRpcError::invalid_params)?;

        let reply = self.run_explain(command, args).await;
        Ok(reply.map(Value::String))
    }
}

/// Run the LSP server on stdio
pub async fn run_lsp_server(agent: Arc<ChatAgent>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| TwinLspBackend::new(client, agent));

    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
