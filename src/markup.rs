use crate::config::{EmbedConfig, EmbedType};

const FRAME_NAME: &str = "bi-embed-frame";

/// Renders the self-submitting embed fragment. Never fails: an invalid
/// token degrades to a placeholder so the sink always receives markup.
pub fn render_embed_markup(embed_token: &str, config: &EmbedConfig) -> String {
    let token = embed_token.trim();
    if token.is_empty() {
        tracing::warn!("embed token blank after trimming; rendering placeholder fragment");
        return error_fragment();
    }

    format!(
        r#"<iframe id="{frame}" name="{frame}" src="about:blank" sandbox="allow-scripts allow-same-origin allow-forms allow-popups" style="position:absolute;top:0;left:0;width:100%;height:100%;border:0;"></iframe>
<script>
(function () {{
    function submitEmbed() {{
        var form = document.createElement('form');
        form.method = 'POST';
        form.action = '{action}';
        form.target = '{frame}';
        var field = document.createElement('input');
        field.type = 'hidden';
        field.name = 'embedToken';
        field.value = '{token}';
        form.appendChild(field);
        document.body.appendChild(form);
        form.submit();
        setTimeout(function () {{ form.remove(); }}, 1000);
    }}
    if (document.readyState === 'loading') {{
        document.addEventListener('DOMContentLoaded', submitEmbed);
    }} else {{
        submitEmbed();
    }}
}})();
</script>"#,
        frame = FRAME_NAME,
        action = embed_url(config),
        token = escape_js_single_quoted(token),
    )
}

fn error_fragment() -> String {
    r#"<div class="bi-embed-error">Dashboard embed unavailable.</div>"#.to_string()
}

fn embed_url(config: &EmbedConfig) -> String {
    match config.embed_type {
        EmbedType::Dashboard => format!("{}/embed/pages/{}", config.content_base, config.embed_id),
        EmbedType::Card => format!("{}/embed/cards/{}", config.content_base, config.embed_id),
    }
}

/// Escapes a value for inclusion inside a single-quoted literal in an
/// inline script. The token is treated as untrusted text: backslash and
/// apostrophe would break out of the literal, `<` could close the
/// script element.
pub fn escape_js_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '<' => out.push_str("\\x3c"),
            _ => out.push(ch),
        }
    }
    out
}
