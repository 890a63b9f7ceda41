//! Network protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire.
//! Field and tag names are camelCase.

use quizroom_core::{ErrorKind, MemberView, Quiz, QuizDraft, RoomSnapshot};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A request from a client, tagged with an id the reply will carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    pub id: u64,
    pub request: Request,
}

/// The four client-initiated operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        durable_identity_id: String,
        #[serde(default)]
        display_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quiz: Option<QuizDraft>,
    },

    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_code: String,
        durable_identity_id: String,
        #[serde(default)]
        display_name: String,
    },

    /// Uses the room and identity bound to the sending connection
    LeaveRoom,

    #[serde(rename_all = "camelCase")]
    PlayerVoted {
        room_code: String,
        durable_identity_id: String,
        chosen_option_id: String,
    },
}

impl Request {
    /// Operation name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Request::CreateRoom { .. } => "createRoom",
            Request::JoinRoom { .. } => "joinRoom",
            Request::LeaveRoom => "leaveRoom",
            Request::PlayerVoted { .. } => "playerVoted",
        }
    }
}

/// Response to exactly one request, sent to the requesting connection only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberView>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<Quiz>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl Reply {
    /// Reply to a successful create: room code and members
    pub fn created(snapshot: RoomSnapshot) -> Self {
        Self {
            success: true,
            room_code: Some(snapshot.code),
            members: Some(snapshot.members),
            ..Default::default()
        }
    }

    /// Reply carrying the room's members and quiz
    pub fn room(snapshot: RoomSnapshot) -> Self {
        Self {
            success: true,
            members: Some(snapshot.members),
            quiz: snapshot.quiz,
            ..Default::default()
        }
    }

    /// Bare acknowledgement
    pub fn ack() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Typed failure with a message for the player
    pub fn failure(err: &quizroom_core::Error) -> Self {
        Self {
            success: false,
            message: Some(err.to_string()),
            error: Some(err.kind()),
            ..Default::default()
        }
    }

    /// Turn an unsuccessful reply into [`Error::Rejected`]
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(Error::Rejected {
            kind: self.error.unwrap_or(ErrorKind::Validation),
            message: self
                .message
                .unwrap_or_else(|| "Request rejected".to_string()),
        })
    }
}

/// Messages from the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Reply to the request with the same id
    Reply { id: u64, reply: Reply },

    /// Membership or tallies changed (broadcast to the room)
    RoomUpdate {
        members: Vec<MemberView>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quiz: Option<Quiz>,
    },

    /// The host ended the session; discard local room state
    RoomClosed,
}

impl ServerFrame {
    pub fn room_update(snapshot: &RoomSnapshot) -> Self {
        ServerFrame::RoomUpdate {
            members: snapshot.members.clone(),
            quiz: snapshot.quiz.clone(),
        }
    }
}

/// Members and quiz of a room, as last seen by a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomState {
    pub members: Vec<MemberView>,
    pub quiz: Option<Quiz>,
}

impl RoomState {
    /// The positionally-first member
    pub fn host(&self) -> Option<&MemberView> {
        self.members.first()
    }
}

impl From<Reply> for RoomState {
    fn from(reply: Reply) -> Self {
        Self {
            members: reply.members.unwrap_or_default(),
            quiz: reply.quiz,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizroom_core::AlternativeDraft;
    use serde_json::json;

    #[test]
    fn test_create_request_wire_shape() {
        let frame = ClientFrame {
            id: 7,
            request: Request::CreateRoom {
                durable_identity_id: "abc".into(),
                display_name: "Alice".into(),
                quiz: Some(QuizDraft::new(
                    "Q?",
                    vec![AlternativeDraft::new("opt-1", "Yes")],
                )),
            },
        };

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "request": {
                    "type": "createRoom",
                    "durableIdentityId": "abc",
                    "displayName": "Alice",
                    "quiz": {
                        "question": "Q?",
                        "alternatives": [{ "id": "opt-1", "text": "Yes" }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_parse_client_requests() {
        let leave: ClientFrame =
            serde_json::from_str(r#"{"id":1,"request":{"type":"leaveRoom"}}"#).unwrap();
        assert_eq!(leave.request, Request::LeaveRoom);

        let vote: ClientFrame = serde_json::from_str(
            r#"{"id":2,"request":{"type":"playerVoted","roomCode":"ab12c","durableIdentityId":"p2","chosenOptionId":"opt-2"}}"#,
        )
        .unwrap();
        assert_eq!(vote.request.name(), "playerVoted");

        // Display name may be omitted
        let join: ClientFrame = serde_json::from_str(
            r#"{"id":3,"request":{"type":"joinRoom","roomCode":"AB12C","durableIdentityId":"p2"}}"#,
        )
        .unwrap();
        assert!(matches!(
            join.request,
            Request::JoinRoom { ref display_name, .. } if display_name.is_empty()
        ));
    }

    #[test]
    fn test_failure_reply_shape() {
        let reply = Reply::failure(&quizroom_core::Error::RoomNotFound("AB12C".into()));
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!("roomNotFound"));
        assert!(value.get("members").is_none());

        let err = reply.into_result().unwrap_err();
        assert_eq!(err.rejection_kind(), Some(ErrorKind::RoomNotFound));
    }

    #[test]
    fn test_room_closed_has_no_payload() {
        let value = serde_json::to_value(ServerFrame::RoomClosed).unwrap();
        assert_eq!(value, json!({ "type": "roomClosed" }));
    }
}
