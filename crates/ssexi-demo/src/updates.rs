//! Update frames emitted on each tick of the push stream.
//!
//! Every tick refreshes the timestamp, counter and todo list. Every fifth
//! tick also assigns `counterValue` and runs a log statement; every tenth
//! tick changes the page background.

use rand::seq::IndexedRandom;
use serde_json::{Value, json};

/// Background colors picked from on every tenth tick.
pub const COLORS: &[&str] = &["lightblue", "lightgreen", "lightcoral", "lightyellow"];

/// Frames for tick number `count` (starting at 1).
pub fn tick_frames(count: u64, timestamp: i64, todos: &[String]) -> Vec<Value> {
    let items: String = todos
        .iter()
        .map(|todo| format!("<li>{}</li>", escape_html(todo)))
        .collect();

    let mut frames = vec![
        json!({ "html": { "timestamp": format!("<div id=\"timestamp\">Current Time: {timestamp}</div>") } }),
        json!({ "html": { "counter": format!("<div id=\"counter\">Count: {count}</div>") } }),
        json!({ "html": { "todos": format!("<ul id=\"todos\">{items}</ul>") } }),
    ];

    if count % 5 == 0 {
        frames.push(json!({ "js": { "counterValue": count } }));
        frames.push(json!({ "js": { "exec": format!("console.log('Counter reached {count}!');") } }));
    }

    if count % 10 == 0 {
        let color = COLORS.choose(&mut rand::rng()).copied().unwrap_or(COLORS[0]);
        frames.push(json!({
            "js": { "exec": format!("document.body.style.backgroundColor = '{color}';") }
        }));
    }

    frames
}

/// Escape text for inclusion in markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_tick_has_three_fragments() {
        let frames = tick_frames(1, 1_700_000_000, &["milk".to_string()]);
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames[0]["html"]["timestamp"],
            "<div id=\"timestamp\">Current Time: 1700000000</div>"
        );
        assert_eq!(frames[1]["html"]["counter"], "<div id=\"counter\">Count: 1</div>");
        assert_eq!(frames[2]["html"]["todos"], "<ul id=\"todos\"><li>milk</li></ul>");
    }

    #[test]
    fn fifth_tick_sets_variable_and_logs() {
        let frames = tick_frames(5, 0, &[]);
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[3]["js"]["counterValue"], 5);
        assert_eq!(frames[4]["js"]["exec"], "console.log('Counter reached 5!');");
    }

    #[test]
    fn tenth_tick_changes_color() {
        let frames = tick_frames(10, 0, &[]);
        assert_eq!(frames.len(), 6);
        let exec = frames[5]["js"]["exec"].as_str().unwrap();
        assert!(exec.starts_with("document.body.style.backgroundColor = '"));
        assert!(COLORS.iter().any(|c| exec.contains(c)));
    }

    #[test]
    fn todo_text_is_escaped() {
        let frames = tick_frames(1, 0, &["<b>&</b>".to_string()]);
        assert_eq!(
            frames[2]["html"]["todos"],
            "<ul id=\"todos\"><li>&lt;b&gt;&amp;&lt;/b&gt;</li></ul>"
        );
    }
}
