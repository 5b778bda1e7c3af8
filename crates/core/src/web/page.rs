use std::fmt::Write;

use serde_json::Value;

use crate::{FriendRecord, LookupOutcome};

const STYLE: &str = "body{font-family:sans-serif;max-width:40rem;margin:2rem auto;padding:0 1rem}\
.error{color:#b00020}\
li{margin:.25rem 0}";

/// Renders the lookup page for `outcome`. An empty outcome gives the bare form.
pub fn render(outcome: &LookupOutcome) -> String {
    let mut html = String::with_capacity(1024);
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Roblox Friend Finder</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<h1>Roblox Friend Finder</h1>\n");
    html.push_str("<form method=\"post\" action=\"/\">\n");
    html.push_str("<label for=\"user_id\">Roblox user ID</label>\n");
    let _ = writeln!(
        html,
        "<input id=\"user_id\" name=\"user_id\" value=\"{}\" inputmode=\"numeric\">",
        escape(&outcome.user_id)
    );
    html.push_str("<button type=\"submit\">Find friends</button>\n</form>\n");

    if let Some(error) = &outcome.error {
        let _ = writeln!(html, "<p class=\"error\">{}</p>", escape(error));
    }

    if !outcome.friends.is_empty() {
        let _ = writeln!(
            html,
            "<h2>{} friend{}</h2>\n<ul>",
            outcome.friends.len(),
            if outcome.friends.len() == 1 { "" } else { "s" }
        );
        for friend in &outcome.friends {
            let _ = writeln!(html, "<li>{}</li>", escape(&friend_label(friend)));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Human readable label for a friend record. Falls back to the raw JSON when
/// the record has none of the usual fields.
pub fn friend_label(friend: &FriendRecord) -> String {
    let text = |key: &str| {
        friend
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    };
    let id = friend.get("id").filter(|id| !id.is_null()).map(|id| match id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    });

    match (text("displayName"), text("name"), id) {
        (None, None, None) => friend.to_string(),
        (display, name, id) => {
            let mut label = String::new();
            if let Some(display) = display.or(name) {
                label.push_str(display);
            }
            if let (Some(name), Some(_)) = (name, display) {
                let _ = write!(label, " (@{name})");
            }
            if let Some(id) = id {
                if !label.is_empty() {
                    label.push(' ');
                }
                let _ = write!(label, "#{id}");
            }
            label
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
