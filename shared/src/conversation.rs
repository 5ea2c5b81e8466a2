use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a conversation, in the shape chat-completion APIs expect.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_serialization_user() {
        let turn = Turn::user("hello");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn test_turn_serialization_system() {
        let turn = Turn::system("be helpful");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be helpful"}"#);
    }

    #[test]
    fn test_turn_deserialization_assistant() {
        let turn: Turn =
            serde_json::from_str(r#"{"role":"assistant","content":"Math at 9:30."}"#).unwrap();
        assert_eq!(turn, Turn::assistant("Math at 9:30."));
    }

    #[test]
    fn test_turn_deserialization_ignores_extra_fields() {
        let turn: Turn = serde_json::from_str(
            r#"{"role":"assistant","content":"hi","data_for_context":[]}"#,
        )
        .unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "hi");
    }

    #[test]
    fn test_role_rejects_unknown_value() {
        let result: Result<Role, _> = serde_json::from_str(r#""moderator""#);
        assert!(result.is_err());
    }
}
