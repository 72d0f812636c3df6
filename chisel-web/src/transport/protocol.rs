//! Channel protocol - JSON messages exchanged with the pose service
//!
//! Every message is an envelope `{"event": <name>, "data": <payload>}`.

use crate::bridge::Landmark;
use crate::exercise::Exercise;
use serde::{Deserialize, Serialize};

/// Client -> server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    SelectExercise { exercise: Exercise },
    /// Data URL of an encoded camera frame
    VideoFrame { frame: String },
    EndWorkout,
}

/// Server -> client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Update(RepUpdate),
    WorkoutSummary(WorkoutSummary),
    ExerciseSelected { exercise: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepUpdate {
    pub rep_count: u32,
    #[serde(default)]
    pub feedback: String,
    /// Empty when no pose was detected in the frame
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepQuality {
    Full,
    Good,
    Partial,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepRecord {
    pub rep_id: u32,
    pub quality: RepQuality,
    /// 0-100
    pub score: f32,
    /// Seconds
    pub duration: f32,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutSummary {
    pub total_reps: u32,
    pub avg_score: f32,
    pub avg_duration: f32,
    pub full_reps: u32,
    pub good_reps: u32,
    pub partial_reps: u32,
    pub poor_reps: u32,
    /// Most frequent issues with their counts
    pub common_issues: Vec<(String, u32)>,
    pub reps_data: Vec<RepRecord>,
}

/// Connection state shown to the user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Feedback line as displayed: issues separated by bullets
pub fn format_feedback(feedback: &str) -> String {
    let trimmed = feedback.trim();
    if trimmed.is_empty() {
        "Good job!".to_string()
    } else {
        trimmed.replace(',', " •")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_envelope() {
        let select = ClientMessage::SelectExercise {
            exercise: Exercise::Squats,
        };
        assert_eq!(
            select.to_json().unwrap(),
            r#"{"event":"select_exercise","data":{"exercise":"squats"}}"#
        );
        assert_eq!(
            ClientMessage::EndWorkout.to_json().unwrap(),
            r#"{"event":"end_workout"}"#
        );
    }

    #[test]
    fn test_update_parse() {
        let msg = ServerMessage::from_json(
            r#"{"event":"update","data":{"rep_count":3,"feedback":"go lower, too fast",
                "landmarks":[{"x":0.5,"y":0.25,"visibility":0.9}]}}"#,
        )
        .unwrap();
        let ServerMessage::Update(update) = msg else {
            panic!("expected update");
        };
        assert_eq!(update.rep_count, 3);
        assert_eq!(update.landmarks.len(), 1);
        assert_eq!(update.landmarks[0].z, None);
    }

    #[test]
    fn test_summary_parse_ignores_extra_rep_fields() {
        let msg = ServerMessage::from_json(
            r#"{"event":"workout_summary","data":{
                "total_reps":2,"full_reps":1,"good_reps":0,"partial_reps":1,"poor_reps":0,
                "avg_score":82.5,"avg_duration":1.75,
                "common_issues":[["go lower",1]],
                "reps_data":[
                  {"rep_id":1,"quality":"full","score":95,"duration":1.5,"flags":[],"start_time":10.0},
                  {"rep_id":2,"quality":"partial","score":70,"duration":2.0,"flags":["go lower"]}
                ]}}"#,
        )
        .unwrap();
        let ServerMessage::WorkoutSummary(summary) = msg else {
            panic!("expected summary");
        };
        assert_eq!(summary.total_reps, 2);
        assert_eq!(summary.common_issues, vec![("go lower".to_string(), 1)]);
        assert_eq!(summary.reps_data[1].quality, RepQuality::Partial);
        assert_eq!(summary.reps_data[0].score, 95.0);
    }

    #[test]
    fn test_summary_without_reps() {
        let msg = ServerMessage::from_json(
            r#"{"event":"workout_summary","data":{"total_reps":0,"reps_data":[]}}"#,
        )
        .unwrap();
        assert_eq!(msg, ServerMessage::WorkoutSummary(WorkoutSummary::default()));
    }

    #[test]
    fn test_error_and_unknown_events() {
        assert_eq!(
            ServerMessage::from_json(r#"{"event":"error","data":{"message":"Invalid exercise"}}"#)
                .unwrap(),
            ServerMessage::Error {
                message: "Invalid exercise".into()
            }
        );
        assert!(ServerMessage::from_json(r#"{"event":"pong","data":{}}"#).is_err());
    }

    #[test]
    fn test_format_feedback() {
        assert_eq!(format_feedback(""), "Good job!");
        assert_eq!(format_feedback("go lower, too fast"), "go lower • too fast");
    }
}
