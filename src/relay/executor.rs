use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;

/// The opaque task executor behind the relay.
///
/// Agent/orchestrator frameworks live entirely behind this seam: the relay
/// hands over a vibe name and prompt, receives intermediate status payloads on
/// the updates channel, and gets a loosely-shaped result value back.
#[async_trait::async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        vibe: &str,
        prompt: &str,
        updates: mpsc::UnboundedSender<Value>,
    ) -> Result<Value>;
}

/// Stand-in executor: echoes the prompt back as the result after one status
/// update. Used by the binary until a real orchestrator is wired in, and by
/// the tests.
pub struct EchoExecutor;

#[async_trait::async_trait]
impl TaskExecutor for EchoExecutor {
    async fn execute(
        &self,
        vibe: &str,
        prompt: &str,
        updates: mpsc::UnboundedSender<Value>,
    ) -> Result<Value> {
        let _ = updates.send(serde_json::json!({
            "stage": "processing",
            "vibe": vibe,
        }));
        Ok(serde_json::json!({ "output": prompt }))
    }
}

/// Extract the final text from an executor result.
///
/// Upstream frameworks disagree on where the answer lives, so the precedence
/// is fixed here, at the collaborator boundary, and nowhere else:
/// `output` > `result` > `content` > `text` > `message`, then the value
/// itself when it is a bare string.
pub fn extract_final_text(result: &Value) -> Option<String> {
    const FIELDS: [&str; 5] = ["output", "result", "content", "text", "message"];

    for field in FIELDS {
        if let Some(text) = result.get(field).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }
    result.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn precedence_is_output_first() {
        let value = json!({"result": "second", "output": "first"});
        assert_eq!(extract_final_text(&value), Some("first".to_string()));
    }

    #[test]
    fn falls_through_to_later_fields() {
        assert_eq!(
            extract_final_text(&json!({"message": "only this"})),
            Some("only this".to_string())
        );
        assert_eq!(
            extract_final_text(&json!({"content": "c", "text": "t"})),
            Some("c".to_string())
        );
    }

    #[test]
    fn bare_string_is_its_own_text() {
        assert_eq!(
            extract_final_text(&json!("just a string")),
            Some("just a string".to_string())
        );
    }

    #[test]
    fn non_string_fields_are_skipped() {
        assert_eq!(extract_final_text(&json!({"output": 42})), None);
        assert_eq!(extract_final_text(&json!({})), None);
    }
}
