use serde::Serialize;
use table_cache::Record;

/// Sample User row for testing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub email: String,
    pub age: u32,
}

impl User {
    pub fn new(user_name: &str, email: &str, age: u32) -> Self {
        Self {
            user_name: user_name.to_string(),
            email: email.to_string(),
            age,
        }
    }

    pub fn to_record(&self) -> Record {
        match serde_json::to_value(self).unwrap() {
            serde_json::Value::Object(record) => record,
            other => panic!("user serialized to a non-object: {other}"),
        }
    }
}

/// Builds a user record
pub fn user(user_name: &str, email: &str) -> Record {
    User::new(user_name, email, 30).to_record()
}

/// The sample users table
#[allow(dead_code)]
pub fn users() -> Vec<Record> {
    vec![
        user("alice", "alice@example.com"),
        user("bob", "bob@example.com"),
        user("carol", "carol@example.com"),
    ]
}
