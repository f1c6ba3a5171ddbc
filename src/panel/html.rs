//! The chat panel page

/// Page served at `/`
///
/// Talks to `/api/history` and `/api/message` using the panel message
/// protocol.
pub fn render_panel_html() -> &'static str {
    PANEL_HTML
}

const PANEL_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Twin Chat</title>
<script src="https://cdn.jsdelivr.net/npm/marked/marked.min.js"></script>
<link rel="stylesheet"
      href="https://cdn.jsdelivr.net/npm/highlight.js@11.9.0/styles/github-dark.min.css">
<script src="https://cdn.jsdelivr.net/npm/highlight.js@11.9.0/lib/highlight.min.js"></script>
<style>
html, body { height: 100%; margin: 0; }
body {
    font-family: Arial, sans-serif;
    display: flex;
    flex-direction: column;
    padding: 10px;
    box-sizing: border-box;
    background: #1e1e1e;
    color: #ddd;
}
#chat {
    flex: 1;
    border: 1px solid #444;
    padding: 10px;
    overflow-y: auto;
    margin-bottom: 8px;
}
.message { margin-bottom: 12px; }
.thinking { opacity: 0.6; font-style: italic; }
pre {
    position: relative;
    background: #0d1117;
    padding: 8px;
    border-radius: 6px;
    overflow-x: auto;
}
code { font-family: Consolas, monospace; }
.copy-btn {
    position: absolute;
    top: 4px;
    right: 4px;
    font-size: 11px;
    cursor: pointer;
}
#input { width: 100%; padding: 8px; box-sizing: border-box; }
</style>
</head>
<body>
<h3>Twin Chat</h3>
<div id="chat"></div>
<input id="input" placeholder="Ask Twin..." autofocus />
<script>
const chat = document.getElementById('chat');
const input = document.getElementById('input');

function addCopyButtons(root) {
    root.querySelectorAll('pre').forEach(pre => {
        const btn = document.createElement('button');
        btn.className = 'copy-btn';
        btn.textContent = 'Copy';
        btn.addEventListener('click', () => {
            const code = pre.querySelector('code');
            navigator.clipboard.writeText(code ? code.innerText : pre.innerText);
            btn.textContent = 'Copied';
            setTimeout(() => { btn.textContent = 'Copy'; }, 1500);
        });
        pre.appendChild(btn);
    });
}

function renderMessage(role, text) {
    const div = document.createElement('div');
    div.className = 'message';
    div.innerHTML = '<b>' + role + ':</b><br>' + marked.parse(text);
    chat.appendChild(div);
    div.querySelectorAll('pre code').forEach(block => hljs.highlightElement(block));
    addCopyButtons(div);
    chat.scrollTop = chat.scrollHeight;
    return div;
}

function showThinking() {
    const div = document.createElement('div');
    div.className = 'message thinking';
    div.textContent = 'Twin is thinking...';
    chat.appendChild(div);
    chat.scrollTop = chat.scrollHeight;
    return div;
}

function handle(msg) {
    if (!msg) return;
    if (msg.type === 'loadHistory') {
        chat.innerHTML = '';
        msg.history.forEach(m => renderMessage(m.role, m.text));
    }
    if (msg.type === 'groqResponse') {
        renderMessage('Twin', msg.text);
    }
}

async function send(text) {
    renderMessage('You', text);
    const placeholder = showThinking();
    try {
        const res = await fetch('/api/message', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ type: 'userPrompt', text })
        });
        placeholder.remove();
        if (res.status === 200) {
            handle(await res.json());
        }
    } catch (err) {
        placeholder.remove();
        renderMessage('Twin', 'Error: ' + err);
    }
}

input.addEventListener('keydown', (e) => {
    if (e.key === 'Enter' && input.value.trim()) {
        const text = input.value.trim();
        input.value = '';
        send(text);
    }
});

fetch('/api/history').then(res => res.json()).then(handle);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_wires_protocol() {
        let html = render_panel_html();
        assert!(html.contains("marked.parse"));
        assert!(html.contains("hljs.highlightElement"));
        assert!(html.contains("'userPrompt'"));
        assert!(html.contains("'loadHistory'"));
        assert!(html.contains("'groqResponse'"));
        assert!(html.contains("thinking"));
    }
}
