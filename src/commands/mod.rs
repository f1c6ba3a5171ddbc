//! Editor commands: explain code, or explain it into a source comment

/// Commands the editor can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainCommand {
    /// Explain the selection (or the whole file) and show the answer
    Explain,
    /// Explain the selection and insert the answer above it as a comment
    ExplainAsComment,
}

impl ExplainCommand {
    pub const ALL: [ExplainCommand; 2] = [ExplainCommand::Explain, ExplainCommand::ExplainAsComment];

    pub fn id(&self) -> &'static str {
        match self {
            ExplainCommand::Explain => "twin.explain",
            ExplainCommand::ExplainAsComment => "twin.explainAsComment",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ExplainCommand::Explain => "Twin: Explain code",
            ExplainCommand::ExplainAsComment => "Twin: Explain as comment",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Prompt sent to the model for this command
    pub fn prompt(&self, code: &str, language: &str, file_name: &str) -> String {
        let prompt = build_explain_prompt(code, language, file_name);
        match self {
            ExplainCommand::Explain => prompt,
            ExplainCommand::ExplainAsComment => format!(
                "{}\n\nKeep the explanation short and plain text; it will be inserted into the file as a code comment.",
                prompt
            ),
        }
    }
}

/// The code to explain: the selection, or the whole document when nothing is selected
pub fn select_code<'a>(selection: &'a str, document: &'a str) -> &'a str {
    if selection.trim().is_empty() {
        document
    } else {
        selection
    }
}

pub fn build_explain_prompt(code: &str, language: &str, file_name: &str) -> String {
    format!(
        "Explain the following {language} code from `{file_name}`:\n\n```{language}\n{code}\n```",
        language = language,
        file_name = file_name,
        code = code.trim_end()
    )
}

/// How a language writes comments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentStyle {
    Line(&'static str),
    Block(&'static str, &'static str),
}

fn comment_style(language_id: &str) -> CommentStyle {
    match language_id.to_ascii_lowercase().as_str() {
        "python" | "shellscript" | "bash" | "sh" | "zsh" | "ruby" | "perl" | "r" | "yaml"
        | "toml" | "dockerfile" | "makefile" | "powershell" | "elixir" | "julia" | "nim"
        | "coffeescript" | "cmake" | "properties" => CommentStyle::Line("#"),
        "sql" | "lua" | "haskell" | "ada" | "elm" | "purescript" => CommentStyle::Line("--"),
        "clojure" | "lisp" | "scheme" | "racket" | "commonlisp" | "asm" | "ini" => {
            CommentStyle::Line(";")
        }
        "latex" | "tex" | "bibtex" | "matlab" | "erlang" | "prolog" => CommentStyle::Line("%"),
        "html" | "xml" | "xsl" | "svg" | "vue-html" | "markdown" => {
            CommentStyle::Block("<!--", "-->")
        }
        "css" | "scss" | "less" => CommentStyle::Block("/*", "*/"),
        _ => CommentStyle::Line("//"),
    }
}

/// Render `text` as a comment in `language_id`, every line prefixed with `indent`
///
/// The result ends with a newline so it can be inserted at the start of a line.
pub fn format_as_comment(text: &str, language_id: &str, indent: &str) -> String {
    let lines: Vec<&str> = text.trim().lines().map(str::trim_end).collect();
    let mut out = String::new();

    match comment_style(language_id) {
        CommentStyle::Line(marker) => {
            for line in lines {
                if line.is_empty() {
                    out.push_str(&format!("{}{}\n", indent, marker));
                } else {
                    out.push_str(&format!("{}{} {}\n", indent, marker, line));
                }
            }
        }
        CommentStyle::Block(open, close) => {
            // a closer inside the text would end the comment early
            let broken_close = close
                .chars()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!("{}{}\n", indent, open));
            for line in lines {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("{}{}\n", indent, line.replace(close, &broken_close)));
                }
            }
            out.push_str(&format!("{}{}\n", indent, close));
        }
    }

    out
}

/// Leading whitespace of `line`
pub fn leading_indent(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}
