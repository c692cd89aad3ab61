// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The viewer shell: the HTML page that frames rendered output.
//!
//! A shell holds two `%s` placeholders, filled with the error box and the
//! rendered output in that order. `%%` stands for a literal percent sign.
//! Before filling, every `%` next to a digit is doubled so CSS such as
//! `width: 100%` in a hand-written shell is left alone.

/// Shell used when no external shell is configured.
pub const DEFAULT_SHELL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Template Viewer</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 0; padding: 1rem; }
        form { display: flex; gap: 0.5rem; margin-bottom: 1rem; }
        form input, form textarea { font-family: monospace; }
        #file-path { flex: 1; }
        #data { flex: 2; height: 2.2rem; }
        #output { width: 100%; border-top: 1px solid #ccc; padding-top: 1rem; }
    </style>
</head>
<body>
    <form method="get" action="/">
        <input id="file-path" name="filePath" placeholder="path/to/template.html">
        <textarea id="data" name="data" placeholder='{"name": "value"}'></textarea>
        <button type="submit">Render</button>
    </form>
    %s
    <div id="output">%s</div>
    <script>
    (function() {
        const params = new URLSearchParams(window.location.search);
        document.getElementById('file-path').value = params.get('filePath') || '';
        document.getElementById('data').value = params.get('data') || '{}';

        function connect() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            const ws = new WebSocket(protocol + '//' + window.location.host + '/ws');
            ws.onmessage = function(event) {
                console.log('[template-viewer] ' + event.data + ', reloading...');
                window.location.reload();
            };
            ws.onclose = function() {
                setTimeout(connect, 1000);
            };
        }
        connect();
    })();
    </script>
</body>
</html>
"#;

/// Builds the full page from a shell, an optional error message and the output.
pub fn render_page(shell: &str, error: Option<&str>, output: &str) -> String {
    let error_box = error.map(error_box).unwrap_or_default();
    fill(&escape_percent(shell), [&error_box, output])
}

/// Formats an error message as the red inline box. The message is escaped.
pub fn error_box(message: &str) -> String {
    format!(
        r#"<p id="error-box" style="color: red; border: red solid 2px;">{}</p>"#,
        html_escape(message)
    )
}

/// Doubles every `%` that has a digit on either side.
pub fn escape_percent(shell: &str) -> String {
    let chars: Vec<char> = shell.chars().collect();
    let mut result = String::with_capacity(shell.len());
    for (i, &c) in chars.iter().enumerate() {
        result.push(c);
        if c != '%' {
            continue;
        }
        let before = i > 0 && chars[i - 1].is_ascii_digit();
        let after = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
        if before || after {
            result.push('%');
        }
    }
    result
}

/// Substitutes `%s` placeholders in order and collapses `%%` to `%`.
///
/// Placeholders beyond the supplied arguments are left as they are.
fn fill(shell: &str, args: [&str; 2]) -> String {
    let mut result = String::with_capacity(shell.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut args = args.iter();
    let mut chars = shell.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                result.push('%');
            }
            Some('s') => {
                chars.next();
                match args.next() {
                    Some(arg) => result.push_str(arg),
                    None => result.push_str("%s"),
                }
            }
            _ => result.push('%'),
        }
    }
    result
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
