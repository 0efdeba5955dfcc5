// lustre/src/model/returns.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
  Requested,
  Approved,
  PickupScheduled,
  PickedUp,
  Received,
  Inspected,
  Refunded,
  Rejected,
}

impl ReturnStatus {
  pub const ALL: [ReturnStatus; 8] = [
    ReturnStatus::Requested,
    ReturnStatus::Approved,
    ReturnStatus::PickupScheduled,
    ReturnStatus::PickedUp,
    ReturnStatus::Received,
    ReturnStatus::Inspected,
    ReturnStatus::Refunded,
    ReturnStatus::Rejected,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ReturnStatus::Requested => "requested",
      ReturnStatus::Approved => "approved",
      ReturnStatus::PickupScheduled => "pickup_scheduled",
      ReturnStatus::PickedUp => "picked_up",
      ReturnStatus::Received => "received",
      ReturnStatus::Inspected => "inspected",
      ReturnStatus::Refunded => "refunded",
      ReturnStatus::Rejected => "rejected",
    }
  }

  pub fn legal_predecessors(self) -> &'static [ReturnStatus] {
    use ReturnStatus::*;
    match self {
      Requested => &[],
      // Rejected -> Approved is the top-role override.
      Approved => &[Requested, Rejected],
      PickupScheduled => &[Approved],
      PickedUp => &[PickupScheduled],
      Received => &[PickedUp],
      Inspected => &[Received],
      Refunded => &[Inspected],
      Rejected => &[Requested, Inspected],
    }
  }

  pub fn can_transition_to(self, target: ReturnStatus) -> bool {
    target.legal_predecessors().contains(&self)
  }

  /// `rejected -> approved` needs the override permission on top of the usual one.
  pub fn is_override(self, target: ReturnStatus) -> bool {
    self == ReturnStatus::Rejected && target == ReturnStatus::Approved
  }

  /// The item is physically back with us, so stock may be returned to inventory.
  pub fn allows_restock(self) -> bool {
    matches!(self, ReturnStatus::Received | ReturnStatus::Inspected)
  }

  /// Whether a request in this status still occupies its order's single return slot.
  pub fn occupies_order(self) -> bool {
    self != ReturnStatus::Rejected
  }
}

impl fmt::Display for ReturnStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ReturnStatus {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ReturnStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| UnknownVariant::new("return status", s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
  Damaged,
  WrongItem,
  SizeIssue,
  QualityIssue,
  NotAsDescribed,
  Other,
}

impl IssueType {
  pub fn as_str(&self) -> &'static str {
    match self {
      IssueType::Damaged => "damaged",
      IssueType::WrongItem => "wrong_item",
      IssueType::SizeIssue => "size_issue",
      IssueType::QualityIssue => "quality_issue",
      IssueType::NotAsDescribed => "not_as_described",
      IssueType::Other => "other",
    }
  }
}

impl fmt::Display for IssueType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for IssueType {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "damaged" => Ok(IssueType::Damaged),
      "wrong_item" => Ok(IssueType::WrongItem),
      "size_issue" => Ok(IssueType::SizeIssue),
      "quality_issue" => Ok(IssueType::QualityIssue),
      "not_as_described" => Ok(IssueType::NotAsDescribed),
      "other" => Ok(IssueType::Other),
      other => Err(UnknownVariant::new("issue type", other)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
  pub id: Uuid,
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub reason: String,
  pub issue_type: IssueType,
  pub evidence_photos: Vec<String>,
  pub video_link: Option<String>,
  pub status: ReturnStatus,
  pub admin_notes: Option<String>,
  /// Shown to the customer when the request is rejected.
  pub rejection_reason: Option<String>,
  /// Reverse-pickup waybill.
  pub tracking_number: Option<String>,
  pub restocked: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub returned_at: Option<DateTime<Utc>>,
  pub refunded_at: Option<DateTime<Utc>>,
}

impl ReturnRequest {
  pub fn append_note(&mut self, note: &str) {
    let note = note.trim();
    if note.is_empty() {
      return;
    }
    self.admin_notes = Some(match self.admin_notes.take() {
      Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
      _ => note.to_string(),
    });
  }
}

#[derive(Debug, Clone)]
pub struct NewReturnRequest {
  pub order_id: Uuid,
  pub user_id: Uuid,
  pub reason: String,
  pub issue_type: IssueType,
  pub evidence_photos: Vec<String>,
  pub video_link: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn forward_chain_is_linear() {
    use ReturnStatus::*;
    let chain = [Requested, Approved, PickupScheduled, PickedUp, Received, Inspected, Refunded];
    for pair in chain.windows(2) {
      assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
    }
    assert!(!Requested.can_transition_to(Refunded));
    assert!(!Approved.can_transition_to(Received));
    assert!(!Refunded.can_transition_to(Rejected));
  }

  #[test]
  fn only_rejected_to_approved_is_an_override() {
    assert!(ReturnStatus::Rejected.is_override(ReturnStatus::Approved));
    assert!(!ReturnStatus::Requested.is_override(ReturnStatus::Approved));
  }

  #[test]
  fn notes_accumulate_line_by_line() {
    let now = Utc::now();
    let mut request = ReturnRequest {
      id: Uuid::new_v4(),
      order_id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      reason: "clasp broken".into(),
      issue_type: IssueType::Damaged,
      evidence_photos: vec![],
      video_link: None,
      status: ReturnStatus::Requested,
      admin_notes: None,
      rejection_reason: None,
      tracking_number: None,
      restocked: false,
      created_at: now,
      updated_at: now,
      returned_at: None,
      refunded_at: None,
    };
    request.append_note("  ");
    assert_eq!(request.admin_notes, None);
    request.append_note("photos checked");
    request.append_note("approved for pickup");
    assert_eq!(request.admin_notes.as_deref(), Some("photos checked\napproved for pickup"));
  }
}
