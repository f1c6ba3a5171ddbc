//! Document management for the LSP server

use dashmap::DashMap;
use tower_lsp::lsp_types::*;

/// Manages open documents
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
}

/// A tracked document
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    pub language_id: String,
    pub version: i32,
    pub content: String,
}

impl Document {
    /// Get the content of a specific line (0-indexed)
    pub fn get_line(&self, line: usize) -> Option<&str> {
        self.content.lines().nth(line)
    }

    /// Last path segment of the URI
    pub fn file_name(&self) -> String {
        self.uri
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.uri.to_string())
    }

    /// Get content in a range
    ///
    /// Character offsets are treated as char indices and clamped to the line.
    pub fn get_range(&self, range: &Range) -> Option<String> {
        let lines: Vec<&str> = self.content.lines().collect();
        let start_line = range.start.line as usize;

        if start_line >= lines.len() {
            return None;
        }

        let end_line = (range.end.line as usize).min(lines.len() - 1);
        let start_char = range.start.character as usize;
        let end_char = range.end.character as usize;

        if start_line == end_line {
            return Some(char_slice(lines[start_line], start_char, end_char).to_string());
        }

        let mut result = String::new();
        result.push_str(char_slice(lines[start_line], start_char, usize::MAX));
        result.push('\n');
        for line in lines.iter().take(end_line).skip(start_line + 1) {
            result.push_str(line);
            result.push('\n');
        }
        result.push_str(char_slice(lines[end_line], 0, end_char));
        Some(result)
    }
}

fn char_slice(line: &str, start: usize, end: usize) -> &str {
    let byte_at = |idx: usize| {
        line.char_indices()
            .nth(idx)
            .map(|(b, _)| b)
            .unwrap_or(line.len())
    };
    let start = byte_at(start);
    let end = byte_at(end).max(start);
    &line[start..end]
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    pub fn open(&self, params: DidOpenTextDocumentParams) {
        let doc = Document {
            uri: params.text_document.uri.clone(),
            language_id: params.text_document.language_id,
            version: params.text_document.version,
            content: params.text_document.text,
        };
        self.documents.insert(params.text_document.uri, doc);
    }

    pub fn change(&self, params: DidChangeTextDocumentParams) {
        if let Some(mut doc) = self.documents.get_mut(&params.text_document.uri) {
            doc.version = params.text_document.version;
            // Full sync: the last change carries the whole text
            if let Some(change) = params.content_changes.into_iter().last() {
                doc.content = change.text;
            }
        }
    }

    pub fn close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
    }

    pub fn get(&self, uri: &Url) -> Option<Document> {
        self.documents.get(uri).map(|d| d.clone())
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
