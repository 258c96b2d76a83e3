use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::Language;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub text: String,
    pub detected_language: Language,
    pub status: AnnouncementStatus,
    pub priority: i32,
    pub is_active: bool,
    pub error_message: Option<String>,
    pub email_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnnouncementStatus {
    pub const ALL: [AnnouncementStatus; 4] = [
        AnnouncementStatus::Pending,
        AnnouncementStatus::Processing,
        AnnouncementStatus::Completed,
        AnnouncementStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementStatus::Pending => "pending",
            AnnouncementStatus::Processing => "processing",
            AnnouncementStatus::Completed => "completed",
            AnnouncementStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AnnouncementStatus::Pending),
            "processing" => Some(AnnouncementStatus::Processing),
            "completed" => Some(AnnouncementStatus::Completed),
            "failed" => Some(AnnouncementStatus::Failed),
            _ => None,
        }
    }

    /// Whether the pipeline may move a record from `self` to `next`.
    ///
    /// Every pipeline run (first run, retry or reprocess) starts by entering
    /// `processing`. Returning to `pending` is only possible through
    /// resubmission, never through this check.
    pub fn can_transition_to(&self, next: AnnouncementStatus) -> bool {
        use AnnouncementStatus::*;
        match next {
            Pending => false,
            Processing => true,
            Completed => *self == Processing,
            Failed => matches!(self, Pending | Processing | Failed),
        }
    }

    /// Statuses a record may be in for a move to `next` to be accepted.
    pub fn predecessors(next: AnnouncementStatus) -> Vec<AnnouncementStatus> {
        Self::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }

    /// Display readiness rank; `None` means the status is never shown on a board.
    pub fn display_rank(&self) -> Option<u8> {
        match self {
            AnnouncementStatus::Completed => Some(0),
            AnnouncementStatus::Processing => Some(1),
            AnnouncementStatus::Pending => Some(2),
            AnnouncementStatus::Failed => None,
        }
    }
}

impl Announcement {
    /// Sort key for board ordering: readiness, then priority, then recency.
    pub fn display_key(&self) -> Option<(u8, Reverse<i32>, Reverse<DateTime<Utc>>)> {
        self.status
            .display_rank()
            .map(|rank| (rank, Reverse(self.priority), Reverse(self.created_at)))
    }
}

/// Orders display candidates and keeps the first `limit`.
///
/// Inactive and failed announcements are dropped.
pub fn rank_for_display(announcements: Vec<Announcement>, limit: usize) -> Vec<Announcement> {
    let mut visible: Vec<_> = announcements
        .into_iter()
        .filter(|a| a.is_active)
        .filter_map(|a| a.display_key().map(|key| (key, a)))
        .collect();
    visible.sort_by(|(a, _), (b, _)| a.cmp(b));
    visible.into_iter().take(limit).map(|(_, a)| a).collect()
}

pub const DEFAULT_PRIORITY: i32 = 5;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAnnouncementRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,
    #[validate(range(min = 1, max = 10))]
    pub priority: Option<i32>,
    /// Declared source language; detected by the pipeline when absent.
    pub language: Option<Language>,
    pub is_active: Option<bool>,
}

fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Text is required".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn announcement(status: AnnouncementStatus, priority: i32, age_minutes: i64) -> Announcement {
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        Announcement {
            id: Uuid::new_v4(),
            text: "Platform change".to_string(),
            detected_language: Language::English,
            status,
            priority,
            is_active: true,
            error_message: None,
            email_sent: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_status_transitions_only_move_forward() {
        use AnnouncementStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
    }

    #[test]
    fn test_predecessors_follow_transitions() {
        use AnnouncementStatus::*;
        assert_eq!(AnnouncementStatus::predecessors(Completed), vec![Processing]);
        assert_eq!(AnnouncementStatus::predecessors(Failed), vec![Pending, Processing, Failed]);
        assert_eq!(AnnouncementStatus::predecessors(Processing).len(), 4);
        assert!(AnnouncementStatus::predecessors(Pending).is_empty());
    }

    #[test]
    fn test_display_order_readiness_then_priority_then_recency() {
        let pending_high = announcement(AnnouncementStatus::Pending, 10, 0);
        let completed_low = announcement(AnnouncementStatus::Completed, 1, 30);
        let completed_high_old = announcement(AnnouncementStatus::Completed, 8, 60);
        let completed_high_new = announcement(AnnouncementStatus::Completed, 8, 5);
        let processing = announcement(AnnouncementStatus::Processing, 5, 1);
        let failed = announcement(AnnouncementStatus::Failed, 10, 0);

        let ranked = rank_for_display(
            vec![
                pending_high.clone(),
                completed_low.clone(),
                failed,
                completed_high_old.clone(),
                processing.clone(),
                completed_high_new.clone(),
            ],
            10,
        );

        let ids: Vec<Uuid> = ranked.iter().map(|a| a.id).collect();
        assert_eq!(
            ids,
            vec![
                completed_high_new.id,
                completed_high_old.id,
                completed_low.id,
                processing.id,
                pending_high.id,
            ]
        );
    }

    #[test]
    fn test_display_excludes_inactive_and_caps_count() {
        let mut inactive = announcement(AnnouncementStatus::Completed, 10, 0);
        inactive.is_active = false;
        let mut all = vec![inactive];
        for i in 0..15 {
            all.push(announcement(AnnouncementStatus::Completed, 5, i));
        }
        let ranked = rank_for_display(all, 10);
        assert_eq!(ranked.len(), 10);
        assert!(ranked.iter().all(|a| a.is_active));
    }

    #[test]
    fn test_blank_text_fails_validation() {
        let request = CreateAnnouncementRequest {
            text: "   \n".to_string(),
            priority: None,
            language: None,
            is_active: None,
        };
        assert!(request.validate().is_err());

        let request = CreateAnnouncementRequest {
            text: "Train 12301 delayed".to_string(),
            priority: Some(11),
            language: None,
            is_active: None,
        };
        assert!(request.validate().is_err());
    }
}
