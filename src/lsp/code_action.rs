//! Code actions and the edits behind them

use super::document::{Document, DocumentStore};
use crate::commands::{format_as_comment, leading_indent, ExplainCommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_lsp::lsp_types::*;

/// Arguments carried by both explain commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainArgs {
    pub uri: Url,
    #[serde(default)]
    pub range: Option<Range>,
}

impl ExplainArgs {
    /// Parse the first `workspace/executeCommand` argument
    pub fn from_arguments(arguments: Vec<serde_json::Value>) -> Result<Self, String> {
        let first = arguments
            .into_iter()
            .next()
            .ok_or_else(|| "missing command arguments".to_string())?;
        serde_json::from_value(first).map_err(|e| format!("invalid command arguments: {}", e))
    }
}

/// Offer both explain commands on any range of an open document
pub fn handle_code_action(
    documents: &Arc<DocumentStore>,
    params: CodeActionParams,
) -> Option<CodeActionResponse> {
    let uri = params.text_document.uri;
    documents.get(&uri)?;

    let args = ExplainArgs {
        uri,
        range: Some(params.range),
    };
    let argument = serde_json::to_value(&args).ok()?;

    let actions = ExplainCommand::ALL
        .into_iter()
        .map(|command| {
            CodeActionOrCommand::CodeAction(CodeAction {
                title: command.title().to_string(),
                kind: Some(match command {
                    ExplainCommand::Explain => CodeActionKind::EMPTY,
                    ExplainCommand::ExplainAsComment => CodeActionKind::REFACTOR,
                }),
                command: Some(Command {
                    title: command.title().to_string(),
                    command: command.id().to_string(),
                    arguments: Some(vec![argument.clone()]),
                }),
                ..Default::default()
            })
        })
        .collect();

    Some(actions)
}

/// Edit inserting `explanation` as a comment on the line above the selection
pub fn comment_edit(doc: &Document, range: Option<Range>, explanation: &str) -> WorkspaceEdit {
    let line = range.map(|r| r.start.line).unwrap_or(0);
    let indent = doc
        .get_line(line as usize)
        .map(leading_indent)
        .unwrap_or("");
    let new_text = format_as_comment(explanation, &doc.language_id, indent);
    let at = Position::new(line, 0);

    let mut changes = HashMap::new();
    changes.insert(
        doc.uri.clone(),
        vec![TextEdit {
            range: Range::new(at, at),
            new_text,
        }],
    );

    WorkspaceEdit {
        changes: Some(changes),
        document_changes: None,
        change_annotations: None,
    }
}
