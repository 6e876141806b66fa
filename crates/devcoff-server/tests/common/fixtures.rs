use devcoff_primitives::TicketSubmission;
use rstest::*;
use serde_json::{json, Value};

/// Request body as sent by the upload page, with `publicOutput = {foo: 1}`.
#[fixture]
pub fn submission_body() -> Value {
    json!({
        "proof": {
            "proof": {
                "pi_a": ["1", "2", "1"],
                "pi_b": [["1", "2"], ["3", "4"], ["1", "0"]],
                "pi_c": ["5", "6", "1"],
                "protocol": "groth16",
                "curve": "bn128"
            },
            "publicOutput": {"foo": 1}
        },
        "name": "Ada Lovelace",
        "email": "ada@example.com"
    })
}

#[fixture]
pub fn invite_body(submission_body: Value) -> Value {
    let mut body = submission_body;
    body["isInviting"] = json!(true);
    body
}

#[fixture]
pub fn submission(submission_body: Value) -> TicketSubmission {
    serde_json::from_value(submission_body).unwrap()
}
